use crate::{
    config::Config, model_service::ModelService, routes::api_routes, telemetry::Metrics,
};
use axum::{extract::DefaultBodyLimit, Router};
use axum_otel_metrics::HttpMetricsLayerBuilder;
use classify_core::LabelSet;
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, sync::broadcast::Receiver, task::JoinHandle};

pub struct SharedState<M> {
    pub model_service: Arc<M>,
    pub labels: Arc<LabelSet>,
    pub metrics: Arc<Metrics>,
}

impl<M> Clone for SharedState<M> {
    fn clone(&self) -> Self {
        Self {
            model_service: self.model_service.clone(),
            labels: self.labels.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

pub fn build_router<M: ModelService>(
    model_service: M,
    labels: LabelSet,
    max_upload_bytes: usize,
) -> anyhow::Result<Router> {
    let metrics = Arc::new(Metrics::new()?);
    let metrics_layer = HttpMetricsLayerBuilder::new().build();

    let app_state = SharedState {
        model_service: Arc::new(model_service),
        labels: Arc::new(labels),
        metrics,
    };

    Ok(Router::new()
        .merge(api_routes::<M>())
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(metrics_layer))
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new<M: ModelService>(
        model_service: M,
        labels: LabelSet,
        config: &Config,
    ) -> anyhow::Result<Self> {
        let router = build_router(model_service, labels, config.server.max_upload_bytes)?;
        let listener = TcpListener::bind(config.server.get_address()).await?;

        Ok(Self { router, listener })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn run(self, mut shutdown_rx: Receiver<()>) -> JoinHandle<anyhow::Result<()>> {
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!("Starting prediction server on {}", addr);
        }

        tokio::spawn(async move {
            axum::serve(self.listener, self.router)
                .with_graceful_shutdown(async move {
                    shutdown_rx.recv().await.ok();
                })
                .await?;
            tracing::info!("Prediction server stopped");
            Ok(())
        })
    }
}
