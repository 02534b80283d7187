//! Scraper engine: reachability probe, fetch, canonical HTML and persistence.
mod canonical;
mod config;
mod decode;
mod engine;
mod fetch;
mod persist;
mod pipeline;
mod probe;
mod progress;
mod types;

pub use canonical::{canonicalize, canonicalize_html, structural_outline, ElementShape};
pub use config::{Clock, EngineConfig};
pub use decode::{decode_html, DecodeError, DecodedHtml};
pub use engine::{EngineHandle, EngineStopped};
pub use fetch::{ChannelProgressSink, FetchSettings, Fetcher, ProgressSink, ReqwestFetcher};
pub use persist::{
    default_temp_dir, ensure_output_dir, write_as, write_temp, AtomicFileWriter, PersistError,
    PersistSettings, TempScope, SAVE_EXTENSION, TEMP_FILE_NAME,
};
pub use pipeline::ScrapePipeline;
pub use probe::{Probe, ProbeError, ProbeSettings, TcpProbe};
pub use types::{
    Document, EngineEvent, FailureKind, FetchError, Reachability, ScrapeError, ScrapeOutcome,
    ScrapeProgress, Stage,
};
pub use tokio_util::sync::CancellationToken;
