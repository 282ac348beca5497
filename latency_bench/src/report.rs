use crate::{
    dispatch::{AppState, Panel, View},
    local::LocalPrediction,
    model_handle::ModelStatus,
    remote::RemotePrediction,
};
use classify_core::LabelSet;

pub struct Reporter {
    labels: LabelSet,
}

impl Reporter {
    pub fn new(labels: LabelSet) -> Self {
        Self { labels }
    }

    pub fn render(&self, view: View, state: &AppState) -> String {
        match view {
            View::Selection => render_selection(state),
            View::Local => self.render_local(state),
            View::Remote => self.render_remote(state),
            View::Summary => render_summary(state),
            View::Status => render_status(state),
        }
    }

    fn render_local(&self, state: &AppState) -> String {
        match &state.local {
            Panel::Idle => format!("[local] {}", model_banner(state.model)),
            Panel::Pending { .. } => "[local] Processing...".to_string(),
            Panel::Done { result, .. } => self.format_local(result),
            Panel::Failed { error } => format!("[local] Error: {}", error),
        }
    }

    fn render_remote(&self, state: &AppState) -> String {
        match &state.remote {
            Panel::Idle => "[remote] Idle".to_string(),
            Panel::Pending { .. } => "[remote] Requesting...".to_string(),
            Panel::Done { result, .. } => self.format_remote(result),
            Panel::Failed { error } => format!("[remote] Error: {}", error),
        }
    }

    pub fn format_local(&self, prediction: &LocalPrediction) -> String {
        format!(
            "[local] class id: {}\n        score: {:.4}\n        latency: {:.2} ms\n        (network: 0 ms)",
            self.labels.describe(prediction.class_id),
            prediction.score,
            prediction.latency.total_ms,
        )
    }

    pub fn format_remote(&self, prediction: &RemotePrediction) -> String {
        let class = match (self.labels.get(prediction.class_id), &prediction.label) {
            (None, Some(label)) => format!("{} ({})", prediction.class_id, label),
            _ => self.labels.describe(prediction.class_id),
        };

        let split = format!(
            "(network: {:.2} ms + server inference: {:.2} ms)",
            prediction.latency.network_ms(),
            prediction.latency.inference_ms()
        );

        format!(
            "[remote] class id: {}\n         probability: {:.4}\n         total latency: {:.2} ms\n         {}",
            class, prediction.probability, prediction.latency.total_ms, split,
        )
    }
}

fn model_banner(status: ModelStatus) -> &'static str {
    match status {
        ModelStatus::Uninitialized => "Model not loaded",
        ModelStatus::Loading => "Loading model...",
        ModelStatus::Ready => "Model loaded (ready)",
        ModelStatus::Failed => "Model load failed",
    }
}

fn render_selection(state: &AppState) -> String {
    match (&state.image, &state.selection_error) {
        (Some(image), _) => {
            let (width, height) = image.dimensions();
            format!(
                "[image] {} ({}x{}, {} bytes)",
                image.name,
                width,
                height,
                image.bytes.len()
            )
        }
        (None, Some(error)) => format!("[image] Error: {}", error),
        (None, None) => "[image] No image selected".to_string(),
    }
}

fn render_summary(state: &AppState) -> String {
    let (Some(local), Some(remote)) = (state.local.result(), state.remote.result()) else {
        return "[summary] Run both `local` and `remote` on the current image to compare".to_string();
    };

    let local_ms = local.latency.total_ms;
    let remote_ms = remote.latency.total_ms;
    let agreement = if local.class_id == remote.class_id {
        "agree"
    } else {
        "disagree"
    };

    let verdict = if local_ms == remote_ms {
        "both paths took the same time".to_string()
    } else {
        let (faster, fast_ms, slow_ms) = if local_ms < remote_ms {
            ("local", local_ms, remote_ms)
        } else {
            ("remote", remote_ms, local_ms)
        };
        if fast_ms > 0.0 {
            format!(
                "{} is faster by {:.2} ms ({:.2}x)",
                faster,
                slow_ms - fast_ms,
                slow_ms / fast_ms
            )
        } else {
            format!("{} is faster by {:.2} ms", faster, slow_ms - fast_ms)
        }
    };

    format!(
        "[summary] local {:.2} ms vs remote {:.2} ms: {}\n          top-1 class ids {} ({} / {})",
        local_ms, remote_ms, verdict, agreement, local.class_id, remote.class_id
    )
}

fn panel_state<T>(panel: &Panel<T>) -> &'static str {
    match panel {
        Panel::Idle => "idle",
        Panel::Pending { .. } => "running",
        Panel::Done { .. } => "done",
        Panel::Failed { .. } => "failed",
    }
}

fn render_status(state: &AppState) -> String {
    let image = state
        .image
        .as_ref()
        .map(|image| image.name.as_str())
        .unwrap_or("none");

    format!(
        "[status] model: {} | image: {} | local: {} | remote: {}",
        state.model,
        image,
        panel_state(&state.local),
        panel_state(&state.remote)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dispatch::{handle, Command, Effect},
        error::BenchError,
        latency::LatencyMeasurement,
        selection::SelectedImage,
        test_support::solid_png,
    };

    fn local_prediction(total_ms: f64) -> LocalPrediction {
        LocalPrediction {
            class_id: 1,
            score: 9.87654,
            latency: LatencyMeasurement::local(total_ms),
        }
    }

    fn remote_prediction(total_ms: f64, class_id: u32) -> RemotePrediction {
        RemotePrediction {
            class_id,
            probability: 0.82,
            label: Some("goldfish".to_string()),
            latency: LatencyMeasurement::remote(total_ms, 15.0),
        }
    }

    fn finished_state(local: LocalPrediction, remote: RemotePrediction) -> AppState {
        let image = SelectedImage::from_bytes("fish.png", solid_png(4, 4, [0, 0, 255])).unwrap();
        let (state, _) = handle(AppState::new(ModelStatus::Ready), Command::ImageSelected(image));

        let (state, effects) = handle(state, Command::RunLocal);
        let Some(Effect::RunLocal { run_id, .. }) = effects.last() else {
            panic!("local run did not start");
        };
        let (state, _) = handle(
            state,
            Command::LocalFinished {
                run_id: *run_id,
                result: Ok(local),
            },
        );

        let (state, effects) = handle(state, Command::RunRemote);
        let Some(Effect::RunRemote { run_id, .. }) = effects.last() else {
            panic!("remote run did not start");
        };
        let (state, _) = handle(
            state,
            Command::RemoteFinished {
                run_id: *run_id,
                result: Ok(remote),
            },
        );
        state
    }

    #[test]
    fn test_format_local() {
        let reporter = Reporter::new(LabelSet::new(vec!["tench".into(), "goldfish".into()]));
        let text = reporter.format_local(&local_prediction(12.346));

        assert!(text.contains("class id: 1 (goldfish)"));
        assert!(text.contains("score: 9.8765"));
        assert!(text.contains("latency: 12.35 ms"));
        assert!(text.contains("(network: 0 ms)"));
    }

    #[test]
    fn test_format_remote_split() {
        let reporter = Reporter::new(LabelSet::default());
        let text = reporter.format_remote(&remote_prediction(40.0, 7));

        assert!(text.contains("class id: 7 (goldfish)"));
        assert!(text.contains("probability: 0.8200"));
        assert!(text.contains("total latency: 40.00 ms"));
        assert!(text.contains("(network: 25.00 ms + server inference: 15.00 ms)"));
    }

    #[test]
    fn test_negative_network_is_shown() {
        let reporter = Reporter::new(LabelSet::default());
        let text = reporter.format_remote(&remote_prediction(14.0, 7));

        assert!(text.contains("(network: -1.00 ms + server inference: 15.00 ms)"));
    }

    #[test]
    fn test_summary_picks_faster_path() {
        let state = finished_state(local_prediction(10.0), remote_prediction(40.0, 1));
        let text = render_summary(&state);

        assert!(text.contains("local is faster by 30.00 ms (4.00x)"));
        assert!(text.contains("top-1 class ids agree"));

        let state = finished_state(local_prediction(50.0), remote_prediction(40.0, 2));
        let text = render_summary(&state);

        assert!(text.contains("remote is faster by 10.00 ms (1.25x)"));
        assert!(text.contains("top-1 class ids disagree (1 / 2)"));
    }

    #[test]
    fn test_summary_needs_both_paths() {
        let text = render_summary(&AppState::new(ModelStatus::Ready));
        assert!(text.contains("Run both"));
    }

    #[test]
    fn test_panel_rendering() {
        let reporter = Reporter::new(LabelSet::default());
        let mut state = AppState::new(ModelStatus::Loading);

        assert_eq!(reporter.render(View::Local, &state), "[local] Loading model...");
        assert_eq!(reporter.render(View::Selection, &state), "[image] No image selected");

        state.remote = Panel::Failed {
            error: BenchError::RemoteInference("server returned 500".to_string()),
        };
        assert_eq!(
            reporter.render(View::Remote, &state),
            "[remote] Error: Remote inference failed: server returned 500"
        );
        assert_eq!(
            reporter.render(View::Status, &state),
            "[status] model: loading | image: none | local: idle | remote: failed"
        );
    }
}
