use crate::{
    error::BenchError,
    latency::{elapsed_ms, LatencyMeasurement},
    model_handle::ModelHandle,
};
use classify_core::{argmax, preprocess, Classifier, InputTensor};
use image::DynamicImage;
use std::time::Instant;
use tracing::instrument;

/// Outcome of the in-process path. `score` is the raw max logit, not a
/// probability.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalPrediction {
    pub class_id: u32,
    pub score: f32,
    pub latency: LatencyMeasurement,
}

pub struct LocalRunner<C> {
    model: ModelHandle<C>,
}

impl<C> Clone for LocalRunner<C> {
    fn clone(&self) -> Self {
        Self {
            model: self.model.clone(),
        }
    }
}

impl<C: Classifier> LocalRunner<C> {
    pub fn new(model: ModelHandle<C>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &ModelHandle<C> {
        &self.model
    }

    pub fn run(&self, input: &InputTensor) -> Result<Vec<f32>, BenchError> {
        let classifier = self.model.ready()?;
        Ok(classifier.run(input)?)
    }

    /// Preprocess, run and decode one image. Only the model call is timed.
    #[instrument(skip_all)]
    pub fn classify(&self, image: &DynamicImage) -> Result<LocalPrediction, BenchError> {
        let classifier = self.model.ready()?;
        let input = preprocess(image)?;

        let start = Instant::now();
        let output = classifier.run(&input)?;
        let total_ms = elapsed_ms(start);

        let (index, score) = argmax(&output)?;
        let class_id = u32::try_from(index).map_err(|_| {
            BenchError::InferenceExecution(format!("class index {} is out of range", index))
        })?;

        tracing::debug!(
            "Local prediction: class_id={}, score={:.4}, latency={:.2}ms",
            class_id,
            score,
            total_ms
        );

        Ok(LocalPrediction {
            class_id,
            score,
            latency: LatencyMeasurement::local(total_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model_handle::ModelStatus,
        test_support::{
            ready_handle, solid_image, ChannelMeanClassifier, FailingClassifier, FixedClassifier,
        },
    };
    use classify_core::ClassifyError;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_classify_decodes_first_max() {
        let handle = ready_handle(FixedClassifier::new(vec![0.1, 0.9, 0.9, 0.3])).await;
        let runner = LocalRunner::new(handle);

        let prediction = runner.classify(&solid_image(50, 80, [9, 9, 9])).unwrap();

        assert_eq!(prediction.class_id, 1);
        assert_eq!(prediction.score, 0.9);
        assert_eq!(prediction.latency.network_ms(), 0.0);
        assert!(prediction.latency.total_ms >= 0.0);
    }

    #[test]
    fn test_not_ready_skips_preprocessing() {
        let runner = LocalRunner::new(ModelHandle::<FixedClassifier>::new());

        // a zero-sized image would fail preprocessing if it were attempted
        let result = runner.classify(&solid_image(0, 0, [0, 0, 0]));
        assert_eq!(
            result,
            Err(BenchError::ModelNotReady(ModelStatus::Uninitialized))
        );
    }

    #[tokio::test]
    async fn test_failed_model_refuses_to_run() {
        let handle = ModelHandle::<FixedClassifier>::new();
        handle
            .spawn_load(|| Err(ClassifyError::ModelLoad("missing file".to_string())))
            .unwrap()
            .await
            .unwrap();
        let runner = LocalRunner::new(handle);

        let result = runner.classify(&solid_image(0, 0, [0, 0, 0]));
        assert_eq!(result, Err(BenchError::ModelNotReady(ModelStatus::Failed)));
    }

    #[tokio::test]
    async fn test_repeated_runs_are_identical() {
        let runner = LocalRunner::new(ready_handle(ChannelMeanClassifier).await);
        let input = preprocess(&solid_image(300, 200, [40, 120, 200])).unwrap();

        let first = runner.run(&input).unwrap();
        let second = runner.run(&input).unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_each_classify_invokes_model_once() {
        let handle = ready_handle(FixedClassifier::new(vec![1.0, 0.0])).await;
        let runner = LocalRunner::new(handle.clone());

        runner.classify(&solid_image(10, 10, [1, 1, 1])).unwrap();
        runner.classify(&solid_image(10, 10, [1, 1, 1])).unwrap();

        assert_eq!(handle.ready().unwrap().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_execution_error_is_surfaced() {
        let runner = LocalRunner::new(ready_handle(FailingClassifier).await);

        let result = runner.classify(&solid_image(10, 10, [1, 1, 1]));
        assert!(matches!(result, Err(BenchError::InferenceExecution(_))));
    }

    #[tokio::test]
    async fn test_empty_output_is_surfaced() {
        let runner = LocalRunner::new(ready_handle(FixedClassifier::new(vec![])).await);

        let result = runner.classify(&solid_image(10, 10, [1, 1, 1]));
        assert_eq!(result, Err(BenchError::EmptyOutput));
    }

    #[tokio::test]
    async fn test_zero_sized_image_with_ready_model() {
        let runner = LocalRunner::new(ready_handle(FixedClassifier::new(vec![1.0])).await);

        let result = runner.classify(&solid_image(0, 0, [0, 0, 0]));
        assert!(matches!(result, Err(BenchError::ImageDecode(_))));
    }
}
