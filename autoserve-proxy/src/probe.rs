//! Readiness probes for the supervised proxy.

use std::time::Duration;

use log::trace;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Upper bound on a single probe attempt
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// How the supervisor learns that the proxy accepts connections.
///
/// The first successful check is the readiness signal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReadinessProbe {
    /// Caddy's admin API on the address rendered for this start.
    ///
    /// The address is private to one start, so a foreign listener never
    /// passes for the supervised process.
    #[default]
    Admin,
    /// Any HTTP response from `url`
    Http { url: String },
    /// A TCP connect to `addr` (`host:port`)
    Tcp { addr: String },
}

impl ReadinessProbe {
    /// One probe attempt, bounded by [`PROBE_TIMEOUT`].
    ///
    /// `admin_address` is the endpoint written into the current config.
    pub async fn check(&self, client: &reqwest::Client, admin_address: &str) -> bool {
        match self {
            Self::Admin => http_responds(client, &admin_url(admin_address)).await,
            Self::Http { url } => http_responds(client, url).await,
            Self::Tcp { addr } => matches!(
                timeout(PROBE_TIMEOUT, TcpStream::connect(addr.as_str())).await,
                Ok(Ok(_))
            ),
        }
    }
}

/// Caddy answers here once the config has been loaded
fn admin_url(admin_address: &str) -> String {
    format!("http://{admin_address}/config/")
}

async fn http_responds(client: &reqwest::Client, url: &str) -> bool {
    match client.get(url).timeout(PROBE_TIMEOUT).send().await {
        Ok(resp) => {
            trace!("[proxy] Readiness probe {url} -> {}", resp.status());
            true
        }
        Err(e) => {
            trace!("[proxy] Readiness probe {url} failed: {e}");
            false
        }
    }
}
