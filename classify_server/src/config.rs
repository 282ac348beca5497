use classify_core::config::{
    deserialize_log_level, load_configuration, LabelsConfig, LogLevel, ModelConfig, Validatable,
};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    pub server: ServerConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub labels: Option<LabelsConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl ServerConfig {
    pub fn get_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let config = load_configuration::<Config>("APP")?;

    if let Err(e) = config.model.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        return Err(config::ConfigError::Message(e));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
log_level: info
server:
  host: 0.0.0.0
  port: 8000
model:
  model_dir: models
  onnx_file: resnet18.quant.onnx
  num_instances: 2
labels:
  labels_dir: labels
  labels_file: imagenet_classes.txt
"#;
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.get_address(), "0.0.0.0:8000");
        assert_eq!(config.server.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.model.num_instances, 2);
        assert_eq!(
            config.labels.unwrap().get_path(),
            std::path::PathBuf::from("labels/imagenet_classes.txt")
        );
    }
}
