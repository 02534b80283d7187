use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::fetch::FetchSettings;
use crate::persist::PersistSettings;
use crate::probe::ProbeSettings;

pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Clone)]
pub struct EngineConfig {
    pub fetch: FetchSettings,
    pub probe: ProbeSettings,
    pub persist: PersistSettings,
    /// Produces the `fetched_utc` stamp of each outcome.
    pub fetched_utc: Clock,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch: FetchSettings::default(),
            probe: ProbeSettings::default(),
            persist: PersistSettings::default(),
            fetched_utc: Arc::new(unix_seconds),
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("fetch", &self.fetch)
            .field("probe", &self.probe)
            .field("persist", &self.persist)
            .finish_non_exhaustive()
    }
}

fn unix_seconds() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("@{secs}")
}
