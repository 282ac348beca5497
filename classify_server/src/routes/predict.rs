use crate::{model_service::ModelService, server::SharedState};
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use classify_core::{ClassifyError, PredictResponse, PREDICT_ROUTE, SERVER_MODE, UPLOAD_FIELD};
use serde_json::json;
use std::time::Instant;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Malformed upload: {0}")]
    Upload(String),
    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),
    #[error("Missing `file` field in the upload")]
    MissingFile,
    #[error("Image could not be decoded: {0}")]
    ImageDecode(String),
    #[error("Inference failed: {0}")]
    Inference(String),
}

impl PredictError {
    pub fn status(&self) -> StatusCode {
        match self {
            PredictError::Upload(_) | PredictError::MissingFile | PredictError::ImageDecode(_) => {
                StatusCode::BAD_REQUEST
            }
            PredictError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            PredictError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MultipartError> for PredictError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            PredictError::PayloadTooLarge(err.body_text())
        } else {
            PredictError::Upload(err.body_text())
        }
    }
}

impl From<ClassifyError> for PredictError {
    fn from(err: ClassifyError) -> Self {
        match err {
            ClassifyError::ImageDecode(msg) => PredictError::ImageDecode(msg),
            other => PredictError::Inference(other.to_string()),
        }
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn read_upload(multipart: &mut Multipart) -> Result<Bytes, PredictError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            return Ok(field.bytes().await?);
        }
    }
    Err(PredictError::MissingFile)
}

#[instrument(skip_all)]
pub async fn predict<M: ModelService>(
    State(state): State<SharedState<M>>,
    mut multipart: Multipart,
) -> Result<Json<PredictResponse>, PredictError> {
    state.metrics.record_request(PREDICT_ROUTE);

    let result = run_prediction(&state, &mut multipart).await;
    if let Err(e) = &result {
        tracing::warn!("Prediction request failed: {}", e);
        state.metrics.record_failure(PREDICT_ROUTE, e.status().as_u16());
    }
    result.map(Json)
}

async fn run_prediction<M: ModelService>(
    state: &SharedState<M>,
    multipart: &mut Multipart,
) -> Result<PredictResponse, PredictError> {
    let image_data = read_upload(multipart).await?;

    let start = Instant::now();
    let prediction = state.model_service.predict(image_data).await?;
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

    state
        .metrics
        .record_prediction_duration(latency_ms, PREDICT_ROUTE);
    tracing::debug!(
        "Prediction: class_id={}, probability={:.4}, latency={:.2}ms",
        prediction.class_id,
        prediction.probability,
        latency_ms
    );

    Ok(PredictResponse {
        class_id: prediction.class_id,
        probability: prediction.probability,
        latency_ms,
        mode: Some(SERVER_MODE.to_string()),
        label: state.labels.get(prediction.class_id).map(str::to_string),
    })
}
