use crate::{
    error::BenchError, local::LocalPrediction, model_handle::ModelStatus,
    remote::RemotePrediction, selection::SelectedImage,
};
use std::sync::Arc;

pub type RunId = u64;

/// What one inference path currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum Panel<T> {
    Idle,
    Pending { run_id: RunId },
    Done { run_id: RunId, result: T },
    Failed { error: BenchError },
}

impl<T> Panel<T> {
    fn is_pending(&self, id: RunId) -> bool {
        matches!(self, Panel::Pending { run_id } if *run_id == id)
    }

    fn settle(run_id: RunId, result: Result<T, BenchError>) -> Self {
        match result {
            Ok(result) => Panel::Done { run_id, result },
            Err(error) => Panel::Failed { error },
        }
    }

    pub fn result(&self) -> Option<&T> {
        match self {
            Panel::Done { result, .. } => Some(result),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub image: Option<Arc<SelectedImage>>,
    pub selection_error: Option<BenchError>,
    pub model: ModelStatus,
    pub local: Panel<LocalPrediction>,
    pub remote: Panel<RemotePrediction>,
    next_run_id: RunId,
}

impl AppState {
    pub fn new(model: ModelStatus) -> Self {
        Self {
            image: None,
            selection_error: None,
            model,
            local: Panel::Idle,
            remote: Panel::Idle,
            next_run_id: 1,
        }
    }

    fn next_run(&mut self) -> RunId {
        let run_id = self.next_run_id;
        self.next_run_id += 1;
        run_id
    }
}

#[derive(Debug)]
pub enum Command {
    ModelStatusChanged(ModelStatus),
    ImageSelected(SelectedImage),
    ImageRejected(BenchError),
    RunLocal,
    RunRemote,
    LocalFinished {
        run_id: RunId,
        result: Result<LocalPrediction, BenchError>,
    },
    RemoteFinished {
        run_id: RunId,
        result: Result<RemotePrediction, BenchError>,
    },
    ShowSummary,
    ShowStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Selection,
    Local,
    Remote,
    Summary,
    Status,
}

#[derive(Debug)]
pub enum Effect {
    RunLocal {
        run_id: RunId,
        image: Arc<SelectedImage>,
    },
    RunRemote {
        run_id: RunId,
        image: Arc<SelectedImage>,
    },
    Render(View),
}

/// Applies one command. Never performs I/O: inference and rendering are
/// returned as effects for the driver to execute.
pub fn handle(mut state: AppState, command: Command) -> (AppState, Vec<Effect>) {
    let effects = match command {
        Command::ModelStatusChanged(status) => {
            state.model = status;
            vec![Effect::Render(View::Status)]
        }
        Command::ImageSelected(image) => {
            state.image = Some(Arc::new(image));
            state.selection_error = None;
            state.local = Panel::Idle;
            state.remote = Panel::Idle;
            vec![Effect::Render(View::Selection)]
        }
        Command::ImageRejected(error) => {
            state.image = None;
            state.selection_error = Some(error);
            state.local = Panel::Idle;
            state.remote = Panel::Idle;
            vec![Effect::Render(View::Selection)]
        }
        Command::RunLocal => match state.image.clone() {
            None => {
                state.local = Panel::Failed {
                    error: BenchError::NoImageSelected,
                };
                vec![Effect::Render(View::Local)]
            }
            Some(_) if state.model != ModelStatus::Ready => {
                state.local = Panel::Failed {
                    error: BenchError::ModelNotReady(state.model),
                };
                vec![Effect::Render(View::Local)]
            }
            Some(image) => {
                let run_id = state.next_run();
                state.local = Panel::Pending { run_id };
                vec![
                    Effect::Render(View::Local),
                    Effect::RunLocal { run_id, image },
                ]
            }
        },
        Command::RunRemote => match state.image.clone() {
            None => {
                state.remote = Panel::Failed {
                    error: BenchError::NoImageSelected,
                };
                vec![Effect::Render(View::Remote)]
            }
            Some(image) => {
                let run_id = state.next_run();
                state.remote = Panel::Pending { run_id };
                vec![
                    Effect::Render(View::Remote),
                    Effect::RunRemote { run_id, image },
                ]
            }
        },
        Command::LocalFinished { run_id, result } => {
            if state.local.is_pending(run_id) {
                state.local = Panel::settle(run_id, result);
                vec![Effect::Render(View::Local)]
            } else {
                tracing::debug!("Discarding stale local result of run {}", run_id);
                vec![]
            }
        }
        Command::RemoteFinished { run_id, result } => {
            if state.remote.is_pending(run_id) {
                state.remote = Panel::settle(run_id, result);
                vec![Effect::Render(View::Remote)]
            } else {
                tracing::debug!("Discarding stale remote result of run {}", run_id);
                vec![]
            }
        }
        Command::ShowSummary => vec![Effect::Render(View::Summary)],
        Command::ShowStatus => vec![Effect::Render(View::Status)],
    };

    (state, effects)
}
