//! Address detection for the record content.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;

use crate::error::{CoreError, CoreResult};

/// Resolves the address a new record should point at
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// `prefer_public` asks the public detection endpoints first; otherwise
    /// the local interface address is used directly.
    async fn resolve(&self, prefer_public: bool) -> CoreResult<IpAddr>;
}

/// How an endpoint returns the address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Plain text body containing only the address
    Text,
    /// JSON object with the address under this field
    JsonField(String),
}

/// A public IP detection service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpEndpoint {
    pub url: String,
    pub format: ResponseFormat,
}

impl IpEndpoint {
    pub fn text(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: ResponseFormat::Text,
        }
    }

    pub fn json(url: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: ResponseFormat::JsonField(field.into()),
        }
    }
}

/// Options for [`HttpIpResolver`]
#[derive(Debug, Clone)]
pub struct IpResolverOptions {
    /// Tried in order; the first valid answer wins
    pub endpoints: Vec<IpEndpoint>,
    /// Per-endpoint request timeout
    pub timeout: Duration,
    /// Use the local interface address when every endpoint fails
    pub fallback_to_local: bool,
}

impl Default for IpResolverOptions {
    fn default() -> Self {
        Self {
            endpoints: vec![
                IpEndpoint::text("https://api.ipify.org"),
                IpEndpoint::json("https://api.myip.com", "ip"),
                IpEndpoint::text("https://ifconfig.me/ip"),
            ],
            timeout: Duration::from_secs(5),
            fallback_to_local: true,
        }
    }
}

/// Public endpoints over HTTP, local interface via a routing lookup
pub struct HttpIpResolver {
    client: reqwest::Client,
    options: IpResolverOptions,
}

impl HttpIpResolver {
    pub fn new(options: IpResolverOptions) -> CoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!("autoserve/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CoreError::IpResolution(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, options })
    }

    async fn query(&self, endpoint: &IpEndpoint) -> Result<IpAddr, String> {
        let response = self
            .client
            .get(&endpoint.url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status().as_u16()));
        }
        let body = response.text().await.map_err(|e| e.to_string())?;
        parse_address(&body, &endpoint.format)
    }

    /// Tries every endpoint in order.
    pub async fn public_ip(&self) -> CoreResult<IpAddr> {
        let mut failures = Vec::new();
        for endpoint in &self.options.endpoints {
            match self.query(endpoint).await {
                Ok(ip) => {
                    log::debug!("public IP {ip} from {}", endpoint.url);
                    return Ok(ip);
                }
                Err(e) => {
                    log::debug!("IP endpoint {} failed: {e}", endpoint.url);
                    failures.push(format!("{}: {e}", endpoint.url));
                }
            }
        }
        Err(CoreError::IpResolution(if failures.is_empty() {
            "no public IP endpoints configured".to_string()
        } else {
            format!("all public IP endpoints failed ({})", failures.join("; "))
        }))
    }
}

#[async_trait]
impl IpResolver for HttpIpResolver {
    async fn resolve(&self, prefer_public: bool) -> CoreResult<IpAddr> {
        if !prefer_public {
            return local_ip().await;
        }
        match self.public_ip().await {
            Ok(ip) => Ok(ip),
            Err(e) if self.options.fallback_to_local => {
                log::warn!("{e}; falling back to the local interface address");
                local_ip().await
            }
            Err(e) => Err(e),
        }
    }
}

/// Extracts an address from an endpoint response body.
pub fn parse_address(body: &str, format: &ResponseFormat) -> Result<IpAddr, String> {
    let raw = match format {
        ResponseFormat::Text => body.trim().to_string(),
        ResponseFormat::JsonField(field) => {
            let value: serde_json::Value =
                serde_json::from_str(body).map_err(|e| format!("invalid JSON: {e}"))?;
            value
                .get(field)
                .and_then(serde_json::Value::as_str)
                .map(|s| s.trim().to_string())
                .ok_or_else(|| format!("missing '{field}' field"))?
        }
    };
    raw.parse::<IpAddr>()
        .map_err(|_| format!("'{raw}' is not an IP address"))
}

/// Address of the interface that routes to the outside world.
///
/// Connecting a UDP socket sends no packets; it only asks the kernel which
/// source address it would use.
pub async fn local_ip() -> CoreResult<IpAddr> {
    let probe = SocketAddr::from((Ipv4Addr::new(10, 255, 255, 255), 1));
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .await
        .map_err(|e| CoreError::IpResolution(format!("failed to open UDP socket: {e}")))?;
    socket
        .connect(probe)
        .await
        .map_err(|e| CoreError::IpResolution(format!("no route for local address lookup: {e}")))?;
    let ip = socket
        .local_addr()
        .map_err(|e| CoreError::IpResolution(e.to_string()))?
        .ip();
    if ip.is_unspecified() {
        return Err(CoreError::IpResolution(
            "no local interface address available".to_string(),
        ));
    }
    Ok(ip)
}
