use crate::error::BenchError;
use classify_core::{Classifier, ClassifyError};
use parking_lot::RwLock;
use std::{fmt, sync::Arc};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    Uninitialized,
    Loading,
    Ready,
    Failed,
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModelStatus::Uninitialized => "not loaded",
            ModelStatus::Loading => "loading",
            ModelStatus::Ready => "ready",
            ModelStatus::Failed => "load failed",
        };
        f.write_str(s)
    }
}

enum ModelState<C> {
    Uninitialized,
    Loading,
    Ready(Arc<C>),
    Failed(String),
}

fn status_of<C>(state: &ModelState<C>) -> ModelStatus {
    match state {
        ModelState::Uninitialized => ModelStatus::Uninitialized,
        ModelState::Loading => ModelStatus::Loading,
        ModelState::Ready(_) => ModelStatus::Ready,
        ModelState::Failed(_) => ModelStatus::Failed,
    }
}

/// Lifecycle of the locally loaded model: `Uninitialized -> Loading -> Ready | Failed`.
///
/// Loading happens at most once per handle and a failure is final.
pub struct ModelHandle<C> {
    state: Arc<RwLock<ModelState<C>>>,
}

impl<C> Clone for ModelHandle<C> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<C: Classifier> Default for ModelHandle<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Classifier> ModelHandle<C> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ModelState::Uninitialized)),
        }
    }

    pub fn status(&self) -> ModelStatus {
        status_of(&self.state.read())
    }

    pub fn failure(&self) -> Option<String> {
        match &*self.state.read() {
            ModelState::Failed(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    pub fn ready(&self) -> Result<Arc<C>, BenchError> {
        match &*self.state.read() {
            ModelState::Ready(classifier) => Ok(classifier.clone()),
            other => Err(BenchError::ModelNotReady(status_of(other))),
        }
    }

    /// Moves to `Loading` and runs `loader` on the blocking pool.
    ///
    /// Returns `None` when a load was already started on this handle.
    pub fn spawn_load<F>(&self, loader: F) -> Option<JoinHandle<ModelStatus>>
    where
        F: FnOnce() -> Result<C, ClassifyError> + Send + 'static,
    {
        if !self.begin_loading() {
            tracing::warn!("Model load already attempted ({}), ignoring", self.status());
            return None;
        }

        tracing::info!("Loading model in the background");
        let handle = self.clone();
        Some(tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(loader).await.unwrap_or_else(|e| {
                Err(ClassifyError::ModelLoad(format!("loader task failed: {}", e)))
            });
            handle.finish_loading(result)
        }))
    }

    fn begin_loading(&self) -> bool {
        let mut state = self.state.write();
        if matches!(*state, ModelState::Uninitialized) {
            *state = ModelState::Loading;
            true
        } else {
            false
        }
    }

    fn finish_loading(&self, result: Result<C, ClassifyError>) -> ModelStatus {
        let mut state = self.state.write();
        if !matches!(*state, ModelState::Loading) {
            return status_of(&state);
        }

        match result {
            Ok(classifier) => {
                tracing::info!("Model loaded and ready");
                *state = ModelState::Ready(Arc::new(classifier));
                ModelStatus::Ready
            }
            Err(e) => {
                tracing::error!("Model load failed: {}", e);
                *state = ModelState::Failed(e.to_string());
                ModelStatus::Failed
            }
        }
    }
}
