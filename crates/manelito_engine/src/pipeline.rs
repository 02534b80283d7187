use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};
use manelito_core::{normalize_input, NormalizedUrl, SessionId};
use tokio_util::sync::CancellationToken;

use crate::canonical::canonicalize;
use crate::config::{Clock, EngineConfig};
use crate::fetch::{Fetcher, ProgressSink, ReqwestFetcher};
use crate::probe::{Probe, TcpProbe};
use crate::{FailureKind, FetchError, ScrapeError, ScrapeOutcome};

/// Validate → fetch → normalize for one scrape. Holds no per-scrape state,
/// so one pipeline serves any number of concurrent sessions.
#[derive(Clone)]
pub struct ScrapePipeline {
    probe: Arc<dyn Probe>,
    fetcher: Arc<dyn Fetcher>,
    fetched_utc: Clock,
}

impl ScrapePipeline {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_parts(
            Arc::new(TcpProbe::new(config.probe.clone())),
            Arc::new(ReqwestFetcher::new(config.fetch.clone())),
            config.fetched_utc.clone(),
        )
    }

    pub fn with_parts(probe: Arc<dyn Probe>, fetcher: Arc<dyn Fetcher>, fetched_utc: Clock) -> Self {
        Self {
            probe,
            fetcher,
            fetched_utc,
        }
    }

    /// Normalizes the input and probes the host. Rejected input never touches the network.
    pub async fn validate(&self, raw: &str) -> Result<NormalizedUrl, ScrapeError> {
        let url = normalize_input(raw).map_err(|rejection| {
            engine_info!("Rejected input {:?}: {}", raw, rejection);
            ScrapeError::InvalidInput(rejection)
        })?;

        let reachability = self.probe.probe(&url).await;
        if !reachability.reachable {
            return Err(ScrapeError::UnreachableHost {
                host: url.host().to_string(),
                detail: reachability.detail.unwrap_or_default(),
            });
        }
        Ok(url)
    }

    pub async fn probe(&self, url: &NormalizedUrl) -> crate::Reachability {
        self.probe.probe(url).await
    }

    /// Fetches and canonicalizes. Cancellation is checked at the fetch boundary.
    pub async fn fetch_and_normalize(
        &self,
        session_id: SessionId,
        url: &str,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ScrapeOutcome, FetchError> {
        let document = tokio::select! {
            result = self.fetcher.fetch(session_id, url, sink) => result,
            _ = cancel.cancelled() => Err(FetchError::new(FailureKind::Cancelled, "scrape cancelled")),
        }
        .inspect_err(|err| engine_warn!("Session {} fetch of {} failed: {}", session_id, url, err))?;

        let html = canonicalize(&document);
        Ok(ScrapeOutcome {
            source_url: url.to_string(),
            document,
            html,
            fetched_utc: (self.fetched_utc)(),
        })
    }

    /// The whole pipeline: progress goes to `sink`, the outcome is returned.
    pub async fn scrape(
        &self,
        session_id: SessionId,
        raw: &str,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ScrapeOutcome, ScrapeError> {
        let url = self.validate(raw).await?;
        let outcome = self
            .fetch_and_normalize(session_id, url.as_str(), sink, cancel)
            .await?;
        engine_info!(
            "Session {} scraped {} ({} bytes canonical)",
            session_id,
            outcome.source_url,
            outcome.html.len()
        );
        Ok(outcome)
    }
}
