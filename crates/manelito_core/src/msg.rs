use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the URL input box.
    InputChanged(String),
    /// User clicked the scrape button; acts as "Reset" once a page is held.
    ScrapeClicked,
    /// User dismissed the current failure.
    FailureAcknowledged,
    /// Explicit reset; also lifts a fetch-failure lock-out.
    ResetClicked,
    /// User asked to open the page in the default viewer.
    OpenClicked,
    /// User picked a destination in the save dialog.
    SaveAsChosen(PathBuf),
    /// Engine finished the reachability probe.
    ProbeCompleted {
        session_id: crate::SessionId,
        reachable: bool,
        detail: Option<String>,
    },
    /// Engine progress for the fetch.
    FetchProgress {
        session_id: crate::SessionId,
        percent: u8,
    },
    /// Engine finished fetching and normalizing.
    FetchCompleted {
        session_id: crate::SessionId,
        result: Result<crate::PageSnapshot, String>,
    },
    /// Engine finished a write.
    PersistCompleted {
        session_id: crate::SessionId,
        target: crate::PersistTarget,
        result: Result<PathBuf, String>,
    },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
