pub mod config;
pub mod decode;
pub mod labels;
pub mod session;
pub mod tensor;
pub mod wire;

mod error;

pub use decode::{argmax, softmax};
pub use error::ClassifyError;
pub use labels::LabelSet;
pub use session::{Classifier, OrtClassifier};
pub use tensor::{decode_image, preprocess, InputTensor, INPUT_SIZE};
pub use wire::{PredictResponse, PREDICT_ROUTE, SERVER_MODE, UPLOAD_FIELD};
