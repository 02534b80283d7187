use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use engine_logging::{engine_info, LogDestination};
use manelito_core::FetchFailurePolicy;
use manelito_engine::{EngineConfig, FetchSettings, PersistSettings, ProbeSettings};
use serde::{Deserialize, Serialize};

/// Settings read from the optional RON file; every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub probe_timeout_ms: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: Option<String>,
    /// Overrides `<local app data>/Temp`.
    pub temp_dir: Option<PathBuf>,
    pub session_scoped_temp: bool,
    /// Keep scraping disabled after a fetch error until a reset.
    pub lock_out_after_fetch_error: bool,
    pub log_destination: LogDestination,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        let probe = ProbeSettings::default();
        Self {
            connect_timeout_ms: millis(fetch.connect_timeout),
            request_timeout_ms: millis(fetch.request_timeout),
            probe_timeout_ms: millis(probe.timeout),
            redirect_limit: fetch.redirect_limit,
            max_bytes: fetch.max_bytes,
            user_agent: None,
            temp_dir: None,
            session_scoped_temp: false,
            lock_out_after_fetch_error: false,
            log_destination: LogDestination::Terminal,
            log_file: PathBuf::from("engine.log"),
        }
    }
}

impl AppConfig {
    pub fn failure_policy(&self) -> FetchFailurePolicy {
        if self.lock_out_after_fetch_error {
            FetchFailurePolicy::LockOut
        } else {
            FetchFailurePolicy::Retryable
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        let mut fetch = FetchSettings {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_bytes,
            ..FetchSettings::default()
        };
        if let Some(agent) = &self.user_agent {
            fetch.user_agent = agent.clone();
        }

        let mut persist = PersistSettings {
            session_scoped_temp: self.session_scoped_temp,
            ..PersistSettings::default()
        };
        if let Some(dir) = &self.temp_dir {
            persist.temp_dir = dir.clone();
        }

        EngineConfig {
            fetch,
            probe: ProbeSettings {
                timeout: Duration::from_millis(self.probe_timeout_ms),
            },
            persist,
            fetched_utc: Arc::new(|| Utc::now().to_rfc3339()),
        }
    }
}

/// Reads `path` when given; otherwise the defaults apply.
pub fn load(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: AppConfig = ron::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    engine_info!("Loaded config from {:?}", path);
    Ok(config)
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
