use serde::{de::DeserializeOwned, Deserialize};
use std::path::PathBuf;

pub trait Validatable {
    fn get_path(&self) -> PathBuf;

    fn validate(&self) -> Result<(), String> {
        if !self.get_path().exists() {
            return Err(format!("File not found: {:?}", self.get_path()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    pub model_dir: PathBuf,
    pub onnx_file: String,
    #[serde(default = "default_input_name")]
    pub input_name: String,
    #[serde(default = "default_output_name")]
    pub output_name: String,
    #[serde(default = "default_model_instances")]
    pub num_instances: usize,
    #[serde(default)]
    pub intra_threads: Option<usize>,
}

fn default_input_name() -> String {
    "input".to_string()
}

fn default_output_name() -> String {
    "output".to_string()
}

fn default_model_instances() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl ModelConfig {
    /// Weights stored next to the graph as `<file>.data`. A model exported this
    /// way is not self-contained and fails to load once copied alone.
    pub fn external_data_path(&self) -> Option<PathBuf> {
        let mut data_file = self.get_path().into_os_string();
        data_file.push(".data");
        let data_file = PathBuf::from(data_file);
        data_file.exists().then_some(data_file)
    }
}

impl Validatable for ModelConfig {
    fn get_path(&self) -> PathBuf {
        self.model_dir.join(&self.onnx_file)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LabelsConfig {
    pub labels_dir: PathBuf,
    pub labels_file: String,
}

impl Validatable for LabelsConfig {
    fn get_path(&self) -> PathBuf {
        self.labels_dir.join(&self.labels_file)
    }
}

pub fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Debug,
    Info,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            other => Err(format!(
                "{} is not a supported minimum log level. Use either `debug` or `info`.",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

/// Layers `configuration/base.yaml`, `configuration/{APP_ENVIRONMENT}.yaml`
/// and `{env_prefix}_*` environment variables (`__` separates nested keys).
pub fn load_configuration<T: DeserializeOwned>(env_prefix: &str) -> Result<T, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {}", e))
    })?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(
            config::File::from(
                configuration_directory.join(format!("{}.yaml", environment.as_str())),
            )
            .required(false),
        )
        .add_source(
            config::Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(LogLevel::try_from("DEBUG".to_string()), Ok(LogLevel::Debug));
        assert_eq!(LogLevel::try_from("info".to_string()), Ok(LogLevel::Info));
        assert!(LogLevel::try_from("trace".to_string()).is_err());
    }

    #[test]
    fn test_parse_environment() {
        assert_eq!(
            Environment::try_from("Production".to_string()),
            Ok(Environment::Production)
        );
        assert!(Environment::try_from("staging".to_string()).is_err());
    }

    #[test]
    fn test_model_path_and_validation() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ModelConfig {
            model_dir: dir.path().to_path_buf(),
            onnx_file: "resnet18.quant.onnx".to_string(),
            input_name: default_input_name(),
            output_name: default_output_name(),
            num_instances: 1,
            intra_threads: None,
        };

        assert_eq!(cfg.get_path(), dir.path().join("resnet18.quant.onnx"));
        assert!(cfg.validate().is_err());
        assert_eq!(cfg.external_data_path(), None);

        std::fs::write(cfg.get_path(), b"onnx").unwrap();
        std::fs::write(dir.path().join("resnet18.quant.onnx.data"), b"weights").unwrap();

        assert!(cfg.validate().is_ok());
        assert_eq!(
            cfg.external_data_path(),
            Some(dir.path().join("resnet18.quant.onnx.data"))
        );
    }
}
