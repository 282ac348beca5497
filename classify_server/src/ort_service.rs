use crate::model_service::{ModelService, Prediction};
use async_trait::async_trait;
use bytes::Bytes;
use classify_core::{
    argmax, config::ModelConfig, decode_image, preprocess, softmax, Classifier, ClassifyError,
    OrtClassifier,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Pool of classifier instances served round-robin from the blocking pool.
pub struct OrtModelService<C = OrtClassifier> {
    sessions: Arc<Vec<Arc<C>>>,
    counter: Arc<AtomicUsize>,
}

impl<C> Clone for OrtModelService<C> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            counter: self.counter.clone(),
        }
    }
}

impl OrtModelService<OrtClassifier> {
    pub fn new(model_config: &ModelConfig) -> Result<Self, ClassifyError> {
        let num_instances = model_config.num_instances.max(1);
        let sessions = (0..num_instances)
            .map(|_| OrtClassifier::from_config(model_config))
            .collect::<Result<Vec<_>, ClassifyError>>()?;

        tracing::info!("Created {} ONNX sessions", num_instances);

        Self::from_classifiers(sessions)
    }
}

impl<C: Classifier> OrtModelService<C> {
    pub fn from_classifiers(classifiers: Vec<C>) -> Result<Self, ClassifyError> {
        if classifiers.is_empty() {
            return Err(ClassifyError::ModelLoad(
                "at least one session is required".to_string(),
            ));
        }

        Ok(Self {
            sessions: Arc::new(classifiers.into_iter().map(Arc::new).collect()),
            counter: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn next_session(&self) -> Arc<C> {
        let index = self.counter.fetch_add(1, Ordering::Relaxed) % self.sessions.len();
        tracing::debug!("Handling request with session {}", index);
        self.sessions[index].clone()
    }
}

/// Decode, preprocess, run, then softmax and keep the top-1 class.
pub fn classify_image<C: Classifier>(
    classifier: &C,
    image_data: &[u8],
) -> Result<Prediction, ClassifyError> {
    let image = decode_image(image_data)?;
    let input = preprocess(&image)?;
    let logits = classifier.run(&input)?;

    let probabilities = softmax(&logits);
    let (index, probability) = argmax(&probabilities)?;
    let class_id = u32::try_from(index).map_err(|_| {
        ClassifyError::InferenceExecution(format!("class index {} is out of range", index))
    })?;

    Ok(Prediction {
        class_id,
        probability,
    })
}

#[async_trait]
impl<C: Classifier> ModelService for OrtModelService<C> {
    async fn predict(&self, image_data: Bytes) -> Result<Prediction, ClassifyError> {
        let session = self.next_session();

        tokio::task::spawn_blocking(move || classify_image(session.as_ref(), &image_data))
            .await
            .map_err(|e| {
                ClassifyError::InferenceExecution(format!("inference task failed: {}", e))
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classify_core::InputTensor;
    use image::{ImageBuffer, Rgb};
    use std::io::Cursor;

    struct CountingClassifier {
        scores: Vec<f32>,
        calls: AtomicUsize,
    }

    impl CountingClassifier {
        fn new(scores: Vec<f32>) -> Self {
            Self {
                scores,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Classifier for CountingClassifier {
        fn run(&self, _input: &InputTensor) -> Result<Vec<f32>, ClassifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.scores.clone())
        }
    }

    fn png_bytes() -> Bytes {
        let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(64, 48, Rgb([255, 0, 0]));
        let mut image_data: Vec<u8> = Vec::new();
        img.write_to(&mut Cursor::new(&mut image_data), image::ImageFormat::Png)
            .unwrap();
        Bytes::from(image_data)
    }

    #[test]
    fn test_classify_image_applies_softmax() {
        let classifier = CountingClassifier::new(vec![1.0, 3.0, 2.0]);
        let prediction = classify_image(&classifier, &png_bytes()).unwrap();

        let expected = 3.0f32.exp() / (1.0f32.exp() + 3.0f32.exp() + 2.0f32.exp());
        assert_eq!(prediction.class_id, 1);
        assert!((prediction.probability - expected).abs() < 1e-6);
    }

    #[test]
    fn test_classify_image_rejects_garbage() {
        let classifier = CountingClassifier::new(vec![1.0]);
        let result = classify_image(&classifier, b"definitely not an image");

        assert!(matches!(result, Err(ClassifyError::ImageDecode(_))));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_output() {
        let classifier = CountingClassifier::new(vec![]);
        assert_eq!(
            classify_image(&classifier, &png_bytes()),
            Err(ClassifyError::EmptyOutput)
        );
    }

    #[tokio::test]
    async fn test_sessions_are_used_round_robin() {
        let service = OrtModelService::from_classifiers(vec![
            CountingClassifier::new(vec![0.0, 1.0]),
            CountingClassifier::new(vec![0.0, 1.0]),
        ])
        .unwrap();

        for _ in 0..5 {
            service.predict(png_bytes()).await.unwrap();
        }

        let calls: Vec<usize> = service
            .sessions
            .iter()
            .map(|session| session.calls.load(Ordering::SeqCst))
            .collect();
        assert_eq!(calls, vec![3, 2]);
    }

    #[test]
    fn test_empty_pool_is_rejected() {
        let result = OrtModelService::<CountingClassifier>::from_classifiers(vec![]);
        assert!(matches!(result, Err(ClassifyError::ModelLoad(_))));
    }
}
