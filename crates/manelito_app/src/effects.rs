use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use manelito_core::{Effect, Msg, PageSnapshot};
use manelito_engine::{EngineConfig, EngineEvent, EngineHandle, EngineStopped, ScrapeOutcome};

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: EngineHandle::new(config),
        }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ProbeHost { session_id, url } => {
                    engine_info!("ProbeHost session_id={} url={}", session_id, url);
                    self.engine.probe(session_id, url);
                }
                Effect::FetchPage { session_id, url } => {
                    engine_info!("FetchPage session_id={} url={}", session_id, url);
                    self.engine.fetch(session_id, url);
                }
                Effect::WriteTemp { session_id, html } => {
                    engine_debug!("WriteTemp session_id={} bytes={}", session_id, html.len());
                    self.engine.write_temp(session_id, html);
                }
                Effect::WriteAs {
                    session_id,
                    path,
                    html,
                } => {
                    engine_debug!("WriteAs session_id={} path={:?}", session_id, path);
                    self.engine.write_as(session_id, path, html);
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn next_msg(&self, timeout: Duration) -> Result<Option<Msg>, EngineStopped> {
        Ok(self.engine.recv_timeout(timeout)?.map(to_msg))
    }

    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}

fn to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Progress(progress) => Msg::FetchProgress {
            session_id: progress.session_id,
            percent: progress.percent,
        },
        EngineEvent::ProbeCompleted {
            session_id,
            reachability,
        } => Msg::ProbeCompleted {
            session_id,
            reachable: reachability.reachable,
            detail: reachability.detail,
        },
        EngineEvent::FetchCompleted { session_id, result } => Msg::FetchCompleted {
            session_id,
            result: match result {
                Ok(outcome) => Ok(snapshot(outcome)),
                Err(err) => {
                    engine_warn!("Session {} fetch failed: {}", session_id, err);
                    Err(err.to_string())
                }
            },
        },
        EngineEvent::PersistCompleted {
            session_id,
            target,
            result,
        } => {
            if let Err(err) = &result {
                engine_warn!("Session {} {:?} write failed: {}", session_id, target, err);
            }
            Msg::PersistCompleted {
                session_id,
                target,
                result,
            }
        }
    }
}

fn snapshot(outcome: ScrapeOutcome) -> PageSnapshot {
    PageSnapshot {
        source_url: outcome.source_url,
        final_url: outcome.document.final_url,
        title: outcome.document.title,
        html: outcome.html,
        fetched_utc: outcome.fetched_utc,
    }
}
