use std::path::PathBuf;

use crate::SessionId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Probe the host of an already-normalized URL.
    ProbeHost { session_id: SessionId, url: String },
    /// Fetch and normalize the page.
    FetchPage { session_id: SessionId, url: String },
    /// Write the canonical HTML to the temp location for viewing.
    WriteTemp { session_id: SessionId, html: String },
    /// Write the canonical HTML to a user-chosen path.
    WriteAs {
        session_id: SessionId,
        path: PathBuf,
        html: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistTarget {
    Temp,
    SaveAs,
}
