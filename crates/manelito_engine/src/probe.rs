use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use engine_logging::{engine_debug, engine_warn};
use manelito_core::NormalizedUrl;
use tokio::net::{lookup_host, TcpStream};
use url::Host;

use crate::Reachability;

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    /// Upper bound for resolution plus connection.
    pub timeout: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("url has no host")]
    MissingHost,
    #[error("could not resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },
    #[error("{host} resolved to no addresses")]
    NoAddress { host: String },
    #[error("no reply within {0:?}")]
    Timeout(Duration),
    #[error("connection to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Host liveness check run before any fetch.
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    /// Never fails: every error is logged and reported as unreachable.
    async fn probe(&self, url: &NormalizedUrl) -> Reachability;
}

/// Resolves the host and opens a TCP connection to the URL's port.
///
/// ICMP echo needs raw sockets, so a completed handshake stands in for an echo reply.
#[derive(Debug, Clone, Default)]
pub struct TcpProbe {
    settings: ProbeSettings,
}

impl TcpProbe {
    pub fn new(settings: ProbeSettings) -> Self {
        Self { settings }
    }

    async fn connect_any(&self, url: &NormalizedUrl) -> Result<SocketAddr, ProbeError> {
        let port = url.port();
        let addrs: Vec<SocketAddr> = match url.url().host() {
            Some(Host::Ipv4(ip)) => vec![SocketAddr::new(ip.into(), port)],
            Some(Host::Ipv6(ip)) => vec![SocketAddr::new(ip.into(), port)],
            Some(Host::Domain(domain)) => lookup_host((domain, port))
                .await
                .map_err(|source| ProbeError::Resolve {
                    host: domain.to_string(),
                    source,
                })?
                .collect(),
            None => return Err(ProbeError::MissingHost),
        };

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(_) => return Ok(addr),
                Err(source) => last_error = Some(ProbeError::Connect { addr, source }),
            }
        }
        Err(last_error.unwrap_or_else(|| ProbeError::NoAddress {
            host: url.host().to_string(),
        }))
    }
}

#[async_trait::async_trait]
impl Probe for TcpProbe {
    async fn probe(&self, url: &NormalizedUrl) -> Reachability {
        let timeout = self.settings.timeout;
        let outcome = match tokio::time::timeout(timeout, self.connect_any(url)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(timeout)),
        };

        match outcome {
            Ok(addr) => {
                engine_debug!("Host {} answered on {}", url.host(), addr);
                Reachability::reachable()
            }
            Err(err) => {
                engine_warn!("Reachability probe for {} failed: {}", url, err);
                Reachability::unreachable(err.to_string())
            }
        }
    }
}
