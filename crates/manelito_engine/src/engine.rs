use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use engine_logging::{engine_error, engine_warn};
use manelito_core::{normalize_input, PersistTarget, SessionId};
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::fetch::ChannelProgressSink;
use crate::persist::{write_as, write_temp, PersistSettings};
use crate::pipeline::ScrapePipeline;
use crate::{EngineEvent, Reachability, ScrapeError};

enum EngineCommand {
    Probe { session_id: SessionId, url: String },
    Fetch { session_id: SessionId, url: String },
    WriteTemp { session_id: SessionId, html: String },
    WriteAs {
        session_id: SessionId,
        path: PathBuf,
        html: String,
    },
}

/// The worker thread is gone; no further events will arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("engine worker has stopped")]
pub struct EngineStopped;

/// Runs pipeline steps on a background tokio runtime and reports back over a channel.
///
/// Events of one session arrive in order: every progress event precedes its
/// `FetchCompleted`.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    shutdown: CancellationToken,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let shutdown = CancellationToken::new();
        let pipeline = ScrapePipeline::new(&config);
        let persist = config.persist;
        let worker_shutdown = shutdown.clone();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    engine_error!("Could not start engine runtime: {}", err);
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                let pipeline = pipeline.clone();
                let persist = persist.clone();
                let event_tx = event_tx.clone();
                let cancel = worker_shutdown.child_token();
                runtime.spawn(async move {
                    handle_command(&pipeline, &persist, command, event_tx, cancel).await;
                });
            }
        });

        Self {
            cmd_tx,
            event_rx,
            shutdown,
        }
    }

    pub fn probe(&self, session_id: SessionId, url: impl Into<String>) {
        self.send(EngineCommand::Probe {
            session_id,
            url: url.into(),
        });
    }

    pub fn fetch(&self, session_id: SessionId, url: impl Into<String>) {
        self.send(EngineCommand::Fetch {
            session_id,
            url: url.into(),
        });
    }

    pub fn write_temp(&self, session_id: SessionId, html: String) {
        self.send(EngineCommand::WriteTemp { session_id, html });
    }

    pub fn write_as(&self, session_id: SessionId, path: PathBuf, html: String) {
        self.send(EngineCommand::WriteAs {
            session_id,
            path,
            html,
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// `Ok(None)` when nothing arrived within `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineStopped> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineStopped),
        }
    }

    /// Cancels in-flight fetches; later fetches fail as cancelled.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            engine_warn!("Engine worker is gone; command dropped");
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_command(
    pipeline: &ScrapePipeline,
    persist: &PersistSettings,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
    cancel: CancellationToken,
) {
    let event = match command {
        EngineCommand::Probe { session_id, url } => {
            let reachability = match normalize_input(&url) {
                Ok(url) => pipeline.probe(&url).await,
                Err(rejection) => Reachability::unreachable(rejection.to_string()),
            };
            EngineEvent::ProbeCompleted {
                session_id,
                reachability,
            }
        }
        EngineCommand::Fetch { session_id, url } => {
            let sink = ChannelProgressSink::new(event_tx.clone());
            let result = pipeline
                .fetch_and_normalize(session_id, &url, &sink, &cancel)
                .await;
            EngineEvent::FetchCompleted { session_id, result }
        }
        EngineCommand::WriteTemp { session_id, html } => {
            let settings = persist.clone();
            let scope = settings.temp_scope(session_id);
            let result = run_blocking(move || write_temp(&settings, &html, scope)).await;
            EngineEvent::PersistCompleted {
                session_id,
                target: PersistTarget::Temp,
                result,
            }
        }
        EngineCommand::WriteAs {
            session_id,
            path,
            html,
        } => {
            let result = run_blocking(move || write_as(&html, &path)).await;
            EngineEvent::PersistCompleted {
                session_id,
                target: PersistTarget::SaveAs,
                result,
            }
        }
    };
    let _ = event_tx.send(event);
}

async fn run_blocking<F>(write: F) -> Result<PathBuf, String>
where
    F: FnOnce() -> Result<PathBuf, crate::PersistError> + Send + 'static,
{
    match tokio::task::spawn_blocking(write).await {
        Ok(result) => result.map_err(|err| ScrapeError::from(err).to_string()),
        Err(join_err) => Err(format!("write task failed: {join_err}")),
    }
}
