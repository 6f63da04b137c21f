use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MnemoError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            endpoint: default_gemini_endpoint(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-flash-lite".into()
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_top_p() -> f32 {
    0.9
}

fn default_top_k() -> u32 {
    40
}

fn default_max_output_tokens() -> u32 {
    512
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_weather_endpoint")]
    pub endpoint: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_weather_endpoint(),
        }
    }
}

fn default_weather_endpoint() -> String {
    "https://api.weatherstack.com/current".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_memory_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_memory_endpoint(),
            user_id: default_user_id(),
        }
    }
}

fn default_memory_endpoint() -> String {
    "https://api.mem0.ai".into()
}

fn default_user_id() -> String {
    "default_user".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            context_window: default_context_window(),
        }
    }
}

fn default_max_steps() -> usize {
    6
}

fn default_context_window() -> usize {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_directory")]
    pub directory: String,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            filter: default_log_filter(),
        }
    }
}

fn default_log_directory() -> String {
    "logs".into()
}

fn default_log_filter() -> String {
    "info,mnemo=debug".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let cfg: Self = toml::from_str(&raw)
            .map_err(|err| MnemoError::Config(format!("failed to parse configuration: {err}")))?;
        Ok(cfg)
    }

    /// Load from a TOML file when present, then apply `MNEMO_*` environment
    /// overrides. A missing file falls back to defaults so credentials can
    /// come entirely from the environment.
    pub fn from_env_or_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut cfg = if path.as_ref().exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };

        if let Ok(key) = env::var("MNEMO_GEMINI_API_KEY") {
            cfg.model.api_key = Some(key);
        }
        if let Ok(endpoint) = env::var("MNEMO_GEMINI_ENDPOINT") {
            cfg.model.endpoint = endpoint;
        }
        if let Ok(model) = env::var("MNEMO_MODEL") {
            cfg.model.model = model;
        }
        if let Ok(key) = env::var("MNEMO_WEATHER_API_KEY") {
            cfg.weather.api_key = Some(key);
        }
        if let Ok(key) = env::var("MNEMO_MEM0_API_KEY") {
            cfg.memory.api_key = Some(key);
        }
        if let Ok(endpoint) = env::var("MNEMO_MEM0_ENDPOINT") {
            cfg.memory.endpoint = endpoint;
        }
        if let Ok(user) = env::var("MNEMO_USER_ID") {
            cfg.memory.user_id = user;
        }
        if let Ok(dir) = env::var("MNEMO_LOG_DIR") {
            cfg.logging.directory = dir;
        }
        if let Ok(filter) = env::var("MNEMO_LOG_FILTER") {
            cfg.logging.filter = filter;
        }
        Ok(cfg)
    }

    /// All three hosted services need a key before the app may start.
    pub fn validate(&self) -> Result<()> {
        if self.model.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(MnemoError::Credential(
                "Gemini API key (set [model].api_key or MNEMO_GEMINI_API_KEY)".into(),
            ));
        }
        if self.weather.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(MnemoError::Credential(
                "Weatherstack API key (set [weather].api_key or MNEMO_WEATHER_API_KEY)".into(),
            ));
        }
        if self.memory.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(MnemoError::Credential(
                "Mem0 API key (set [memory].api_key or MNEMO_MEM0_API_KEY)".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_and_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[model]\napi_key='k1'\nmodel='gemini-2.5-flash'\n[weather]\napi_key='k2'\n[memory]\napi_key='k3'\nuser_id='alice'"
        )
        .unwrap();

        env::set_var("MNEMO_MODEL", "gemini-2.0-pro");
        let cfg = AppConfig::from_env_or_file(file.path()).unwrap();
        env::remove_var("MNEMO_MODEL");

        assert_eq!(cfg.model.model, "gemini-2.0-pro");
        assert_eq!(cfg.memory.user_id, "alice");
        assert_eq!(cfg.model.temperature, 0.2);
        assert_eq!(cfg.model.max_output_tokens, 512);
        cfg.validate().unwrap();
    }

    #[test]
    fn missing_credentials_fail_validation() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[model]\napi_key='k1'").unwrap();

        let cfg = AppConfig::from_file(file.path()).unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, MnemoError::Credential(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = AppConfig::from_env_or_file("definitely-not-here.toml").unwrap();
        assert_eq!(cfg.memory.user_id, "default_user");
        assert_eq!(cfg.agent.max_steps, 6);
        assert!(cfg.validate().is_err());
    }
}
