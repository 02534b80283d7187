use std::fmt;
use std::path::PathBuf;

use manelito_core::{ErrorKind, InputRejection, PersistTarget, SessionId};

use crate::persist::PersistError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connecting,
    Downloading,
    Decoding,
    Parsing,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeProgress {
    pub session_id: SessionId,
    pub stage: Stage,
    /// 0..=100, never decreasing within one fetch.
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reachability {
    pub reachable: bool,
    pub detail: Option<String>,
}

impl Reachability {
    pub(crate) fn reachable() -> Self {
        Self {
            reachable: true,
            detail: None,
        }
    }

    pub(crate) fn unreachable(detail: impl Into<String>) -> Self {
        Self {
            reachable: false,
            detail: Some(detail.into()),
        }
    }
}

/// A fetched, decoded and parsed page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub source_url: String,
    pub final_url: String,
    pub redirect_count: usize,
    pub content_type: Option<String>,
    pub encoding_label: String,
    pub title: Option<String>,
    pub element_count: usize,
    /// Decoded source markup, before canonicalization.
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeOutcome {
    pub source_url: String,
    pub document: Document,
    /// Canonical serialization of `document`.
    pub html: String,
    pub fetched_utc: String,
}

#[derive(Debug, Clone)]
pub enum EngineEvent {
    Progress(ScrapeProgress),
    ProbeCompleted {
        session_id: SessionId,
        reachability: Reachability,
    },
    FetchCompleted {
        session_id: SessionId,
        result: Result<ScrapeOutcome, FetchError>,
    },
    PersistCompleted {
        session_id: SessionId,
        target: PersistTarget,
        result: Result<PathBuf, String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Decode,
    Cancelled,
    /// DNS resolution or the TCP/TLS handshake failed.
    Connect,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Decode => write!(f, "decode error"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Connect => write!(f, "connection failed"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Everything a scrape can fail with, as seen by the caller.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("invalid input: {0}")]
    InvalidInput(InputRejection),
    #[error("host {host} is unreachable: {detail}")]
    UnreachableHost { host: String, detail: String },
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("persistence failed: {0}")]
    Persist(#[from] PersistError),
}

impl ScrapeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScrapeError::InvalidInput(_) => ErrorKind::InvalidInput,
            ScrapeError::UnreachableHost { .. } => ErrorKind::UnreachableHost,
            ScrapeError::Fetch(_) => ErrorKind::FetchError,
            ScrapeError::Persist(_) => ErrorKind::PersistenceError,
        }
    }
}
