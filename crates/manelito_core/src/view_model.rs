use std::path::PathBuf;

use crate::{AppState, SessionState};

pub const STATUS_AWAITING: &str = "Status: Awaiting orders...";
pub const STATUS_VALIDATING: &str = "Status: Checking host...";
pub const STATUS_FETCHING: &str = "Status: Scraping...";
pub const STATUS_FINISHED: &str = "Status: Scraping finished";
pub const SCRAPE_BUTTON_START: &str = "Scrap!";
pub const SCRAPE_BUTTON_RESET: &str = "Reset";

/// Everything a presentation layer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub session: SessionState,
    pub input: String,
    pub input_read_only: bool,
    pub status_text: String,
    pub progress: u8,
    pub progress_visible: bool,
    pub scrape_button_label: &'static str,
    pub scrape_enabled: bool,
    pub open_visible: bool,
    pub save_visible: bool,
    pub error_message: Option<String>,
    pub page_title: Option<String>,
    pub target_url: Option<String>,
    pub last_temp_path: Option<PathBuf>,
    pub last_saved_path: Option<PathBuf>,
}

impl AppViewModel {
    pub(crate) fn from_state(state: &AppState) -> Self {
        let session = state.session();
        let holding_page = session == SessionState::Normalized;

        let status_text = match session {
            SessionState::Idle => STATUS_AWAITING.to_string(),
            SessionState::Validating => STATUS_VALIDATING.to_string(),
            SessionState::Fetching => STATUS_FETCHING.to_string(),
            // A completed Save As returns the label to its resting text.
            SessionState::Normalized if state.save_completed() => STATUS_AWAITING.to_string(),
            SessionState::Normalized => STATUS_FINISHED.to_string(),
            SessionState::Failed => state
                .failure()
                .map(|failure| failure.message.clone())
                .unwrap_or_else(|| STATUS_AWAITING.to_string()),
        };

        let error_message = state
            .failure()
            .or(state.persist_failure())
            .map(|failure| match &failure.detail {
                Some(detail) => format!("{} ({detail})", failure.message),
                None => failure.message.clone(),
            });

        Self {
            session,
            input: state.input().to_string(),
            input_read_only: !matches!(session, SessionState::Idle | SessionState::Failed),
            status_text,
            progress: state.progress(),
            progress_visible: matches!(
                session,
                SessionState::Fetching | SessionState::Normalized
            ),
            scrape_button_label: if holding_page {
                SCRAPE_BUTTON_RESET
            } else {
                SCRAPE_BUTTON_START
            },
            scrape_enabled: !state.is_scrape_locked()
                && !matches!(session, SessionState::Validating | SessionState::Fetching),
            open_visible: holding_page,
            save_visible: holding_page && !state.save_completed(),
            error_message,
            page_title: state.page().and_then(|page| page.title.clone()),
            target_url: state.target_text().map(str::to_string),
            last_temp_path: state.last_temp_path().cloned(),
            last_saved_path: state.last_saved_path().cloned(),
        }
    }
}
