use async_trait::async_trait;
use bytes::Bytes;
use classify_core::ClassifyError;

/// Top-1 class of one uploaded image, with its softmax probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub class_id: u32,
    pub probability: f32,
}

#[async_trait]
pub trait ModelService: Send + Sync + 'static {
    async fn predict(&self, image_data: Bytes) -> Result<Prediction, ClassifyError>;
}
