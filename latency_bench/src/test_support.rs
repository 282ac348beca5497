use crate::model_handle::ModelHandle;
use classify_core::{Classifier, ClassifyError, InputTensor};
use image::{DynamicImage, ImageBuffer, Rgb};
use std::{
    io::Cursor,
    sync::atomic::{AtomicUsize, Ordering},
};

/// Returns the same scores for every input and counts its calls.
pub struct FixedClassifier {
    scores: Vec<f32>,
    pub calls: AtomicUsize,
}

impl FixedClassifier {
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Classifier for FixedClassifier {
    fn run(&self, _input: &InputTensor) -> Result<Vec<f32>, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.scores.clone())
    }
}

/// Scores derived from the input: the mean of each channel plane.
pub struct ChannelMeanClassifier;

impl Classifier for ChannelMeanClassifier {
    fn run(&self, input: &InputTensor) -> Result<Vec<f32>, ClassifyError> {
        let values: Vec<f32> = input.view().iter().copied().collect();
        let plane = values.len() / 3;
        Ok(values
            .chunks(plane)
            .map(|channel| channel.iter().sum::<f32>() / plane as f32)
            .collect())
    }
}

pub struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn run(&self, _input: &InputTensor) -> Result<Vec<f32>, ClassifyError> {
        Err(ClassifyError::InferenceExecution("kernel crashed".to_string()))
    }
}

pub fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(width, height, Rgb(rgb)))
}

pub fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let mut image_data: Vec<u8> = Vec::new();
    solid_image(width, height, rgb)
        .write_to(&mut Cursor::new(&mut image_data), image::ImageFormat::Png)
        .unwrap();
    image_data
}

pub async fn ready_handle<C: Classifier>(classifier: C) -> ModelHandle<C> {
    let handle = ModelHandle::new();
    handle
        .spawn_load(move || Ok(classifier))
        .unwrap()
        .await
        .unwrap();
    handle
}
