use crate::{
    config::Config,
    dispatch::{handle, AppState, Command, Effect},
    error::BenchError,
    input::{UserInput, HELP},
    local::LocalRunner,
    model_handle::{ModelHandle, ModelStatus},
    remote::RemoteClient,
    report::Reporter,
    selection::SelectedImage,
};
use classify_core::{Classifier, LabelSet, OrtClassifier};
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    signal,
    sync::mpsc::{self, UnboundedSender},
    task::JoinHandle,
};

pub async fn start_app(config: Config, initial_image: Option<PathBuf>) -> anyhow::Result<()> {
    let labels = LabelSet::from_config(config.labels.as_ref());

    let model = ModelHandle::<OrtClassifier>::new();
    let model_config = config.model.clone();
    let model_load = model.spawn_load(move || OrtClassifier::from_config(&model_config));

    let remote = RemoteClient::new(&config.remote)?;
    tracing::info!("Remote predictions go to {}", remote.endpoint());

    let bench = Bench::new(LocalRunner::new(model), remote, Reporter::new(labels));
    let stdin = BufReader::new(tokio::io::stdin());

    bench
        .run(stdin, std::io::stdout(), model_load, initial_image)
        .await
}

/// Interactive driver: turns input lines into commands, feeds them through
/// `dispatch::handle` and executes the resulting effects.
pub struct Bench<C> {
    local: LocalRunner<C>,
    remote: RemoteClient,
    reporter: Reporter,
}

impl<C: Classifier> Bench<C> {
    pub fn new(local: LocalRunner<C>, remote: RemoteClient, reporter: Reporter) -> Self {
        Self {
            local,
            remote,
            reporter,
        }
    }

    /// Runs until `quit`, a shutdown signal, or the end of `input`. At the end
    /// of input the runs still in flight are awaited first.
    pub async fn run<R, W>(
        self,
        input: R,
        mut out: W,
        model_load: Option<JoinHandle<ModelStatus>>,
        initial_image: Option<PathBuf>,
    ) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Command>();
        let mut state = AppState::new(self.local.model().status());
        let mut lines = input.lines();
        let mut input_closed = false;
        let mut in_flight = 0usize;

        if let Some(model_load) = model_load {
            let tx = tx.clone();
            let model = self.local.model().clone();
            tokio::spawn(async move {
                match model_load.await {
                    Ok(status) => {
                        if let Some(reason) = model.failure() {
                            tracing::warn!("Local inference disabled: {}", reason);
                        }
                        let _ = tx.send(Command::ModelStatusChanged(status));
                    }
                    Err(e) => tracing::error!("Model load task failed: {}", e),
                }
            });
        }

        writeln!(out, "{}", HELP)?;
        if let Some(path) = initial_image {
            let (next, effects) = handle(state, select_image(&path).await);
            state = next;
            for effect in effects {
                in_flight += self.execute(effect, &state, &tx, &mut out)?;
            }
        }

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            if input_closed && in_flight == 0 {
                break;
            }

            let command = tokio::select! {
                line = lines.next_line(), if !input_closed => {
                    let Some(line) = line? else {
                        input_closed = true;
                        continue;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match line.parse::<UserInput>() {
                        Ok(UserInput::Quit) => break,
                        Ok(UserInput::Help) => {
                            writeln!(out, "{}", HELP)?;
                            continue;
                        }
                        Ok(UserInput::Open(path)) => select_image(&path).await,
                        Ok(UserInput::Local) => Command::RunLocal,
                        Ok(UserInput::Remote) => Command::RunRemote,
                        Ok(UserInput::Summary) => Command::ShowSummary,
                        Ok(UserInput::Status) => Command::ShowStatus,
                        Err(e) => {
                            writeln!(out, "{}", e)?;
                            continue;
                        }
                    }
                }
                Some(command) = rx.recv() => {
                    if matches!(command, Command::LocalFinished { .. } | Command::RemoteFinished { .. }) {
                        in_flight = in_flight.saturating_sub(1);
                    }
                    command
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received, exiting");
                    break;
                }
            };

            let (next, effects) = handle(state, command);
            state = next;
            for effect in effects {
                in_flight += self.execute(effect, &state, &tx, &mut out)?;
            }
            out.flush()?;
        }

        Ok(())
    }

    /// Returns the number of background runs the effect started.
    fn execute<W: Write>(
        &self,
        effect: Effect,
        state: &AppState,
        tx: &UnboundedSender<Command>,
        out: &mut W,
    ) -> std::io::Result<usize> {
        match effect {
            Effect::Render(view) => {
                writeln!(out, "{}", self.reporter.render(view, state))?;
                Ok(0)
            }
            Effect::RunLocal { run_id, image } => {
                let runner = self.local.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = tokio::task::spawn_blocking(move || runner.classify(&image.image))
                        .await
                        .unwrap_or_else(|e| {
                            Err(BenchError::InferenceExecution(format!(
                                "inference task failed: {}",
                                e
                            )))
                        });
                    let _ = tx.send(Command::LocalFinished { run_id, result });
                });
                Ok(1)
            }
            Effect::RunRemote { run_id, image } => {
                let client = self.remote.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = client.classify(&image).await;
                    let _ = tx.send(Command::RemoteFinished { run_id, result });
                });
                Ok(1)
            }
        }
    }
}

async fn select_image(path: &Path) -> Command {
    match SelectedImage::open(path).await {
        Ok(image) => Command::ImageSelected(image),
        Err(e) => {
            tracing::warn!("Failed to open {:?}: {}", path, e);
            Command::ImageRejected(e)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
