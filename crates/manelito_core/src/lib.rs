//! Scraper core: pure session state machine, URL input rules and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod url_input;
mod view_model;

pub use effect::{Effect, PersistTarget};
pub use msg::Msg;
pub use state::{
    AppState, ErrorKind, FetchFailurePolicy, PageSnapshot, SessionFailure, SessionId,
    SessionState, FETCH_ERROR_MESSAGE, INVALID_INPUT_MESSAGE, PERSISTENCE_ERROR_MESSAGE,
    UNREACHABLE_HOST_MESSAGE,
};
pub use update::update;
pub use url_input::{normalize_input, InputRejection, NormalizedUrl};
pub use view_model::{
    AppViewModel, SCRAPE_BUTTON_RESET, SCRAPE_BUTTON_START, STATUS_AWAITING, STATUS_FINISHED,
};
