use crate::{
    config::{ModelConfig, Validatable},
    tensor::InputTensor,
    ClassifyError,
};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use std::{fmt::Display, sync::Mutex};

/// Something that turns one preprocessed input into one raw score per class.
///
/// Implementations must not carry state from one call to the next.
pub trait Classifier: Send + Sync + 'static {
    fn run(&self, input: &InputTensor) -> Result<Vec<f32>, ClassifyError>;
}

/// ONNX Runtime session bound to the model's declared input and output names.
pub struct OrtClassifier {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

fn model_load_error(e: impl Display) -> ClassifyError {
    ClassifyError::ModelLoad(e.to_string())
}

fn inference_error(context: &str, e: impl Display) -> ClassifyError {
    ClassifyError::InferenceExecution(format!("{}: {}", context, e))
}

impl OrtClassifier {
    pub fn from_config(model_config: &ModelConfig) -> Result<Self, ClassifyError> {
        model_config.validate().map_err(ClassifyError::ModelLoad)?;
        if let Some(data_file) = model_config.external_data_path() {
            tracing::warn!(
                "Model references external weights in {:?}; keep it next to the graph",
                data_file
            );
        }

        let mut builder = Session::builder()
            .map_err(model_load_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(model_load_error)?;
        if let Some(threads) = model_config.intra_threads {
            builder = builder
                .with_intra_threads(threads)
                .map_err(model_load_error)?;
        }
        let session = builder
            .commit_from_file(model_config.get_path())
            .map_err(model_load_error)?;

        if !session
            .inputs
            .iter()
            .any(|input| input.name == model_config.input_name)
        {
            return Err(ClassifyError::ModelLoad(format!(
                "model has no input named `{}`",
                model_config.input_name
            )));
        }
        if !session
            .outputs
            .iter()
            .any(|output| output.name == model_config.output_name)
        {
            return Err(ClassifyError::ModelLoad(format!(
                "model has no output named `{}`",
                model_config.output_name
            )));
        }

        tracing::info!("Loaded ONNX model from {:?}", model_config.get_path());

        Ok(Self {
            session: Mutex::new(session),
            input_name: model_config.input_name.clone(),
            output_name: model_config.output_name.clone(),
        })
    }
}

impl Classifier for OrtClassifier {
    fn run(&self, input: &InputTensor) -> Result<Vec<f32>, ClassifyError> {
        let mut session = self
            .session
            .lock()
            .map_err(|e| inference_error("session mutex poisoned", e))?;

        let tensor_ref = TensorRef::from_array_view(input.view())
            .map_err(|e| inference_error("failed to build tensor", e))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => tensor_ref])
            .map_err(|e| inference_error("inference failed", e))?;

        let (_, data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| inference_error("failed to extract tensor", e))?;

        Ok(data.to_vec())
    }
}
