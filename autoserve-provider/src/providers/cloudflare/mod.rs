//! Cloudflare DNS Provider

mod error;
mod http;
mod provider;
mod types;

use reqwest::{Client, RequestBuilder};

use crate::error::Result;
use crate::providers::common::{create_http_client, normalize_domain_name};

pub(crate) use types::{CloudflareDnsRecord, CloudflareResponse, CloudflareZone};

pub(crate) const CF_API_BASE: &str = "https://api.cloudflare.com/client/v4";
/// Cloudflare DNS Records API 单页最大记录数
pub(crate) const MAX_PAGE_SIZE_RECORDS: u32 = 100;
/// 翻页上限，防止服务端 `result_info` 异常导致死循环
pub(crate) const MAX_PAGES: u32 = 1000;

/// Cloudflare 认证方式
#[derive(Clone)]
pub enum CloudflareAuth {
    /// Scoped API token, sent as `Authorization: Bearer ...`.
    ApiToken(String),
    /// Legacy global API key, sent as `X-Auth-Email` + `X-Auth-Key`.
    GlobalKey { email: String, api_key: String },
}

impl CloudflareAuth {
    pub(crate) fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Self::ApiToken(token) => builder.bearer_auth(token),
            Self::GlobalKey { email, api_key } => builder
                .header("X-Auth-Email", email)
                .header("X-Auth-Key", api_key),
        }
    }
}

impl std::fmt::Debug for CloudflareAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use crate::utils::log_sanitizer::mask_secret;
        match self {
            Self::ApiToken(token) => f.debug_tuple("ApiToken").field(&mask_secret(token)).finish(),
            Self::GlobalKey { email, api_key } => f
                .debug_struct("GlobalKey")
                .field("email", email)
                .field("api_key", &mask_secret(api_key))
                .finish(),
        }
    }
}

/// How a failed create is recognized as a name conflict.
///
/// Cloudflare reports duplicates with HTTP 400 and one of the 8105x codes on
/// most plans, and with HTTP 409 on some newer endpoints. Both are listed so
/// the check is explicit rather than a substring match on the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictDetection {
    pub http_statuses: Vec<u16>,
    pub error_codes: Vec<String>,
}

impl Default for ConflictDetection {
    fn default() -> Self {
        Self {
            http_statuses: vec![409],
            error_codes: ["81053", "81054", "81055", "81056", "81057", "81058"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

impl ConflictDetection {
    pub(crate) fn matches(&self, http_status: Option<u16>, code: Option<&str>) -> bool {
        http_status.is_some_and(|s| self.http_statuses.contains(&s))
            || code.is_some_and(|c| self.error_codes.iter().any(|known| known == c))
    }
}

/// Cloudflare DNS Provider
pub struct CloudflareProvider {
    pub(crate) client: Client,
    pub(crate) auth: CloudflareAuth,
    pub(crate) zone_id: String,
    pub(crate) base_domain: String,
    pub(crate) api_base: String,
    pub(crate) conflicts: ConflictDetection,
}

impl CloudflareProvider {
    /// Creates a client bound to one zone and its base domain.
    pub fn new(auth: CloudflareAuth, zone_id: impl Into<String>, base_domain: &str) -> Result<Self> {
        Ok(Self {
            client: create_http_client("cloudflare")?,
            auth,
            zone_id: zone_id.into(),
            base_domain: normalize_domain_name(base_domain),
            api_base: CF_API_BASE.to_string(),
            conflicts: ConflictDetection::default(),
        })
    }

    /// Points the client at another API root (mock servers, API gateways).
    #[must_use]
    pub fn with_base_url(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides how name conflicts are recognized.
    #[must_use]
    pub fn with_conflict_detection(mut self, conflicts: ConflictDetection) -> Self {
        self.conflicts = conflicts;
        self
    }

    /// Configured zone id.
    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }
}

impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("auth", &self.auth)
            .field("zone_id", &self.zone_id)
            .field("base_domain", &self.base_domain)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}
