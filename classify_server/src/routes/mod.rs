mod health;
mod metrics;
mod predict;

use crate::{model_service::ModelService, server::SharedState};
use axum::{routing::get, routing::post, Router};
use classify_core::PREDICT_ROUTE;

pub use predict::PredictError;

pub fn api_routes<M: ModelService>() -> Router<SharedState<M>> {
    Router::new()
        .route(PREDICT_ROUTE, post(predict::predict::<M>))
        .route("/health", get(health::healthcheck))
        .route("/metrics", get(metrics::metrics_handler::<M>))
}
