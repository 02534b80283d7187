use std::path::PathBuf;

use crate::url_input::{InputRejection, NormalizedUrl};
use crate::view_model::AppViewModel;

pub type SessionId = u64;

pub const INVALID_INPUT_MESSAGE: &str = "Please enter a valid URL";
pub const UNREACHABLE_HOST_MESSAGE: &str =
    "The host could not be reached. Please check the URL and your connection";
pub const FETCH_ERROR_MESSAGE: &str = "An error has occurred. Please check if your input is correct.";
pub const PERSISTENCE_ERROR_MESSAGE: &str = "The page could not be written to disk";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Validating,
    Fetching,
    Normalized,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    UnreachableHost,
    FetchError,
    PersistenceError,
}

impl ErrorKind {
    pub fn user_message(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => INVALID_INPUT_MESSAGE,
            ErrorKind::UnreachableHost => UNREACHABLE_HOST_MESSAGE,
            ErrorKind::FetchError => FETCH_ERROR_MESSAGE,
            ErrorKind::PersistenceError => PERSISTENCE_ERROR_MESSAGE,
        }
    }
}

/// What happens to the scrape action after a fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchFailurePolicy {
    /// The next scrape may start straight away.
    #[default]
    Retryable,
    /// Scraping stays disabled until an explicit reset.
    LockOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFailure {
    pub kind: ErrorKind,
    /// User-facing text.
    pub message: String,
    /// Underlying cause, for logs and details views.
    pub detail: Option<String>,
}

/// A successfully scraped and normalized page, as held by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub source_url: String,
    pub final_url: String,
    pub title: Option<String>,
    pub html: String,
    pub fetched_utc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    input: String,
    session: SessionState,
    session_id: SessionId,
    target: Option<NormalizedUrl>,
    progress: u8,
    page: Option<PageSnapshot>,
    failure: Option<SessionFailure>,
    persist_failure: Option<SessionFailure>,
    last_temp_path: Option<PathBuf>,
    last_saved_path: Option<PathBuf>,
    save_completed: bool,
    scrape_locked: bool,
    policy: FetchFailurePolicy,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: FetchFailurePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn page(&self) -> Option<&PageSnapshot> {
        self.page.as_ref()
    }

    pub fn failure(&self) -> Option<&SessionFailure> {
        self.failure.as_ref()
    }

    pub fn persist_failure(&self) -> Option<&SessionFailure> {
        self.persist_failure.as_ref()
    }

    pub fn is_scrape_locked(&self) -> bool {
        self.scrape_locked
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel::from_state(self)
    }

    /// Returns whether the state changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn is_current(&self, session_id: SessionId) -> bool {
        self.session_id == session_id
    }

    pub(crate) fn set_input(&mut self, text: String) {
        if self.input != text {
            self.input = text;
            self.mark_dirty();
        }
    }

    /// Opens a new session id and enters `Validating`.
    pub(crate) fn begin_validation(&mut self, target: NormalizedUrl) -> SessionId {
        self.session_id += 1;
        self.session = SessionState::Validating;
        self.target = Some(target);
        self.progress = 0;
        self.page = None;
        self.failure = None;
        self.clear_persist_outcome();
        self.mark_dirty();
        self.session_id
    }

    pub(crate) fn target(&self) -> Option<&NormalizedUrl> {
        self.target.as_ref()
    }

    pub(crate) fn begin_fetch(&mut self) {
        self.session = SessionState::Fetching;
        self.progress = 0;
        self.mark_dirty();
    }

    /// Progress never moves backwards within a session.
    pub(crate) fn apply_progress(&mut self, percent: u8) {
        let clamped = percent.min(100);
        if clamped > self.progress {
            self.progress = clamped;
            self.mark_dirty();
        }
    }

    pub(crate) fn complete(&mut self, page: PageSnapshot) {
        self.session = SessionState::Normalized;
        self.progress = 100;
        self.page = Some(page);
        self.mark_dirty();
    }

    pub(crate) fn reject_input(&mut self, rejection: &InputRejection) {
        // Rejected input never opens a session; nothing is in flight.
        self.session = SessionState::Failed;
        self.target = None;
        self.page = None;
        self.failure = Some(SessionFailure {
            kind: ErrorKind::InvalidInput,
            message: ErrorKind::InvalidInput.user_message().to_string(),
            detail: Some(rejection.to_string()),
        });
        self.mark_dirty();
    }

    pub(crate) fn fail(&mut self, kind: ErrorKind, detail: Option<String>) {
        if kind == ErrorKind::FetchError && self.policy == FetchFailurePolicy::LockOut {
            self.scrape_locked = true;
        }
        self.session = SessionState::Failed;
        self.page = None;
        self.failure = Some(SessionFailure {
            kind,
            message: kind.user_message().to_string(),
            detail,
        });
        self.mark_dirty();
    }

    pub(crate) fn acknowledge_failure(&mut self) {
        if self.session == SessionState::Failed {
            self.session = SessionState::Idle;
            self.failure = None;
            self.target = None;
            self.progress = 0;
            self.mark_dirty();
        }
    }

    /// Back to a blank `Idle` session. Clears any lock-out.
    pub(crate) fn reset(&mut self) {
        // The id is kept so that late events from the old session stay stale.
        self.session = SessionState::Idle;
        self.input.clear();
        self.target = None;
        self.progress = 0;
        self.page = None;
        self.failure = None;
        self.clear_persist_outcome();
        self.scrape_locked = false;
        self.mark_dirty();
    }

    pub(crate) fn record_temp_written(&mut self, path: PathBuf) {
        self.persist_failure = None;
        self.last_temp_path = Some(path);
        self.mark_dirty();
    }

    pub(crate) fn record_saved(&mut self, path: PathBuf) {
        self.persist_failure = None;
        self.last_saved_path = Some(path);
        self.save_completed = true;
        self.mark_dirty();
    }

    pub(crate) fn record_persist_failure(&mut self, detail: String) {
        self.persist_failure = Some(SessionFailure {
            kind: ErrorKind::PersistenceError,
            message: ErrorKind::PersistenceError.user_message().to_string(),
            detail: Some(detail),
        });
        self.mark_dirty();
    }

    fn clear_persist_outcome(&mut self) {
        self.persist_failure = None;
        self.last_temp_path = None;
        self.last_saved_path = None;
        self.save_completed = false;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    // Accessors used by the view model.
    pub(crate) fn progress(&self) -> u8 {
        self.progress
    }

    pub(crate) fn last_temp_path(&self) -> Option<&PathBuf> {
        self.last_temp_path.as_ref()
    }

    pub(crate) fn last_saved_path(&self) -> Option<&PathBuf> {
        self.last_saved_path.as_ref()
    }

    pub(crate) fn save_completed(&self) -> bool {
        self.save_completed
    }

    pub(crate) fn target_text(&self) -> Option<&str> {
        self.target.as_ref().map(NormalizedUrl::as_str)
    }
}
