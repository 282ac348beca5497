use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifyError {
    #[error("Error decoding image: {0}")]
    ImageDecode(String),
    #[error("Model output is empty")]
    EmptyOutput,
    #[error("Inference failed: {0}")]
    InferenceExecution(String),
    #[error("Failed to load model: {0}")]
    ModelLoad(String),
}
