use crate::{
    normalize_input, AppState, Effect, ErrorKind, Msg, PersistTarget, SessionState,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(text) => {
            // The input is read-only while a page is held or a scrape is in flight.
            if matches!(
                state.session(),
                SessionState::Idle | SessionState::Failed
            ) {
                state.set_input(text);
            }
            Vec::new()
        }
        Msg::ScrapeClicked => match state.session() {
            SessionState::Idle | SessionState::Failed => start_scrape(&mut state),
            SessionState::Normalized => {
                state.reset();
                Vec::new()
            }
            SessionState::Validating | SessionState::Fetching => Vec::new(),
        },
        Msg::FailureAcknowledged => {
            state.acknowledge_failure();
            Vec::new()
        }
        Msg::ResetClicked => {
            if !matches!(
                state.session(),
                SessionState::Validating | SessionState::Fetching
            ) {
                state.reset();
            }
            Vec::new()
        }
        Msg::OpenClicked => match (state.session(), state.page()) {
            (SessionState::Normalized, Some(page)) => vec![Effect::WriteTemp {
                session_id: state.session_id(),
                html: page.html.clone(),
            }],
            _ => Vec::new(),
        },
        Msg::SaveAsChosen(path) => match (state.session(), state.page()) {
            (SessionState::Normalized, Some(page)) => vec![Effect::WriteAs {
                session_id: state.session_id(),
                path,
                html: page.html.clone(),
            }],
            _ => Vec::new(),
        },
        Msg::ProbeCompleted {
            session_id,
            reachable,
            detail,
        } => {
            if !state.is_current(session_id) || state.session() != SessionState::Validating {
                return (state, Vec::new());
            }
            if !reachable {
                state.fail(ErrorKind::UnreachableHost, detail);
                return (state, Vec::new());
            }
            let url = state
                .target()
                .map(|target| target.as_str().to_string())
                .unwrap_or_default();
            state.begin_fetch();
            vec![Effect::FetchPage { session_id, url }]
        }
        Msg::FetchProgress {
            session_id,
            percent,
        } => {
            if state.is_current(session_id) && state.session() == SessionState::Fetching {
                state.apply_progress(percent);
            }
            Vec::new()
        }
        Msg::FetchCompleted { session_id, result } => {
            if state.is_current(session_id) && state.session() == SessionState::Fetching {
                match result {
                    Ok(page) => state.complete(page),
                    Err(detail) => state.fail(ErrorKind::FetchError, Some(detail)),
                }
            }
            Vec::new()
        }
        Msg::PersistCompleted {
            session_id,
            target,
            result,
        } => {
            if state.is_current(session_id) && state.session() == SessionState::Normalized {
                match (target, result) {
                    (PersistTarget::Temp, Ok(path)) => state.record_temp_written(path),
                    (PersistTarget::SaveAs, Ok(path)) => state.record_saved(path),
                    (_, Err(detail)) => state.record_persist_failure(detail),
                }
            }
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn start_scrape(state: &mut AppState) -> Vec<Effect> {
    if state.is_scrape_locked() {
        return Vec::new();
    }
    match normalize_input(state.input()) {
        Ok(target) => {
            let url = target.as_str().to_string();
            let session_id = state.begin_validation(target);
            vec![Effect::ProbeHost { session_id, url }]
        }
        Err(rejection) => {
            state.reject_input(&rejection);
            Vec::new()
        }
    }
}
