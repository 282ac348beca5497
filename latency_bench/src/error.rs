use crate::model_handle::ModelStatus;
use classify_core::ClassifyError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BenchError {
    #[error("Image could not be read: {0}")]
    ImageDecode(String),
    #[error("Model is not ready ({0})")]
    ModelNotReady(ModelStatus),
    #[error("Local inference failed: {0}")]
    InferenceExecution(String),
    #[error("Model returned an empty output vector")]
    EmptyOutput,
    #[error("Remote inference failed: {0}")]
    RemoteInference(String),
    #[error("No image selected. Use `open <path>` first")]
    NoImageSelected,
}

impl From<ClassifyError> for BenchError {
    fn from(err: ClassifyError) -> Self {
        match err {
            ClassifyError::ImageDecode(msg) => BenchError::ImageDecode(msg),
            ClassifyError::EmptyOutput => BenchError::EmptyOutput,
            ClassifyError::InferenceExecution(msg) => BenchError::InferenceExecution(msg),
            ClassifyError::ModelLoad(_) => BenchError::ModelNotReady(ModelStatus::Failed),
        }
    }
}
