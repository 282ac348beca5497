use classify_core::{
    config::{deserialize_log_level, load_configuration, LabelsConfig, LogLevel, ModelConfig},
    PREDICT_ROUTE,
};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    pub model: ModelConfig,
    pub remote: RemoteConfig,
    #[serde(default)]
    pub labels: Option<LabelsConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl RemoteConfig {
    pub fn get_endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), PREDICT_ROUTE)
    }
}

pub fn get_configuration() -> Result<Config, config::ConfigError> {
    load_configuration::<Config>("BENCH")
}
