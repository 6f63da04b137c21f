//! Live weather tool backed by the Weatherstack current-conditions API.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::WeatherConfig;
use crate::error::{MnemoError, Result};
use crate::tool::Tool;

pub struct WeatherTool {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl WeatherTool {
    pub fn from_config(cfg: &WeatherConfig) -> Result<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .ok_or_else(|| MnemoError::Credential("Weatherstack API key".into()))?;
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(20))
                .build()
                .map_err(|err| MnemoError::ToolInvocation {
                    name: "current_weather".into(),
                    source: Box::new(err),
                })?,
            api_key,
            endpoint: cfg.endpoint.clone(),
        })
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "current_weather"
    }

    fn description(&self) -> &str {
        "Fetch live current weather for a city. Expects {\"city\": string, \"country\": optional string}."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "city": {"type": "string", "description": "City name, e.g. \"Chandigarh\""},
                "country": {"type": "string", "description": "Optional country hint, e.g. \"India\""}
            },
            "required": ["city"]
        }))
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let city = input
            .get("city")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();
        if city.is_empty() {
            return Ok(json!({ "error": "city is required" }));
        }

        let query = match input.get("country").and_then(Value::as_str) {
            Some(country) if !country.trim().is_empty() => format!("{city}, {}", country.trim()),
            _ => city.to_string(),
        };

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("access_key", self.api_key.as_str()), ("query", &query)])
            .send()
            .await
            .map_err(|err| MnemoError::ToolInvocation {
                name: self.name().into(),
                source: Box::new(err),
            })?;

        let data: Value = response
            .json()
            .await
            .map_err(|err| MnemoError::ToolInvocation {
                name: self.name().into(),
                source: Box::new(err),
            })?;

        Ok(trim_response(data))
    }
}

/// Keep only the fields the agent needs for interpretation. Weatherstack
/// reports errors in-band via an `error` object, even with HTTP 200.
fn trim_response(data: Value) -> Value {
    if let Some(error) = data.get("error") {
        return json!({ "error": error.clone() });
    }

    let (Some(location), Some(current)) = (data.get("location"), data.get("current")) else {
        return json!({ "error": "unexpected Weatherstack response (missing `location` or `current`)" });
    };

    json!({
        "location": {
            "name": location.get("name"),
            "region": location.get("region"),
            "country": location.get("country"),
            "localtime": location.get("localtime"),
        },
        "current": {
            "observation_time": current.get("observation_time"),
            "temperature": current.get("temperature"),
            "feelslike": current.get("feelslike"),
            "weather_descriptions": current.get("weather_descriptions"),
            "wind_speed": current.get("wind_speed"),
            "wind_dir": current.get("wind_dir"),
            "humidity": current.get("humidity"),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_to_interpretation_fields() {
        let raw = json!({
            "location": {"name": "Gurugram", "region": "Haryana", "country": "India",
                         "localtime": "2026-08-25 10:00", "lat": "28.46", "lon": "77.03"},
            "current": {"observation_time": "04:30 AM", "temperature": 31, "feelslike": 36,
                        "weather_descriptions": ["Haze"], "wind_speed": 9, "wind_dir": "NW",
                        "humidity": 70, "uv_index": 7, "pressure": 1004}
        });
        let trimmed = trim_response(raw);

        assert_eq!(trimmed["location"]["name"], "Gurugram");
        assert_eq!(trimmed["current"]["temperature"], 31);
        assert!(trimmed["current"].get("uv_index").is_none());
    }

    #[test]
    fn passes_through_in_band_errors() {
        let raw = json!({"success": false, "error": {"code": 101, "type": "invalid_access_key"}});
        let trimmed = trim_response(raw);
        assert_eq!(trimmed["error"]["code"], 101);
    }

    #[test]
    fn missing_sections_are_an_error() {
        let trimmed = trim_response(json!({"location": {"name": "X"}}));
        assert!(trimmed["error"].as_str().unwrap().contains("missing"));
    }

    #[tokio::test]
    async fn blank_city_is_an_error_payload() {
        let tool = WeatherTool::from_config(&WeatherConfig {
            api_key: Some("test".into()),
            ..WeatherConfig::default()
        })
        .unwrap();
        let result = tool.call(json!({"city": "  "})).await.unwrap();
        assert!(result["error"].as_str().unwrap().contains("required"));
    }
}
