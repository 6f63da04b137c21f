//! The tools the agent may call during a turn:
//! - Calculator: arithmetic expression evaluation
//! - Date offset: calendar date N days from today
//! - Weather: live conditions via Weatherstack
//! - Text analysis: counts and keyword sentiment

pub mod calculator;
pub mod datetime;
pub mod text;
pub mod weather;

pub use calculator::CalculateTool;
pub use datetime::DateOffsetTool;
pub use text::AnalyzeTextTool;
pub use weather::WeatherTool;

use crate::config::WeatherConfig;
use crate::error::Result;
use crate::tool::ToolRegistry;

/// Registry with all four standard tools.
pub fn standard_toolkit(weather: &WeatherConfig) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(CalculateTool);
    registry.register(DateOffsetTool);
    registry.register(WeatherTool::from_config(weather)?);
    registry.register(AnalyzeTextTool);
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_toolkit_registers_all_tools() {
        let registry = standard_toolkit(&WeatherConfig {
            api_key: Some("test".into()),
            ..WeatherConfig::default()
        })
        .unwrap();

        assert_eq!(
            registry.names(),
            vec!["analyze_text", "calculate", "current_weather", "date_offset"]
        );
    }
}
