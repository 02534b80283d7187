use manelito_core::SessionId;

use crate::fetch::ProgressSink;
use crate::{EngineEvent, ScrapeProgress, Stage};

/// Stage boundaries on the 0..=100 scale.
pub(crate) const CONNECTED: u8 = 10;
pub(crate) const DOWNLOADED: u8 = 70;
pub(crate) const DECODED: u8 = 80;
pub(crate) const PARSED: u8 = 90;
pub(crate) const COMPLETE: u8 = 100;

/// Emits percentages for one fetch, dropping any value below the last one sent.
pub(crate) struct ProgressTracker<'a> {
    sink: &'a dyn ProgressSink,
    session_id: SessionId,
    last: Option<u8>,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(sink: &'a dyn ProgressSink, session_id: SessionId) -> Self {
        Self {
            sink,
            session_id,
            last: None,
        }
    }

    pub(crate) fn report(&mut self, stage: Stage, percent: u8) {
        let percent = percent.min(COMPLETE);
        if self.last.is_some_and(|last| percent <= last) {
            return;
        }
        self.last = Some(percent);
        self.sink.emit(EngineEvent::Progress(ScrapeProgress {
            session_id: self.session_id,
            stage,
            percent,
        }));
    }

    /// Maps downloaded bytes onto the span between `CONNECTED` and `DOWNLOADED`.
    pub(crate) fn report_download(&mut self, received: u64, expected: Option<u64>) {
        let Some(expected) = expected.filter(|len| *len > 0) else {
            return;
        };
        let span = u64::from(DOWNLOADED - CONNECTED);
        let done = received.min(expected) * span / expected;
        self.report(Stage::Downloading, CONNECTED + done as u8);
    }
}
