//! Registrar settings, read once by the caller and passed down.

use autoserve_provider::validation::MAX_ID_LEN;
use autoserve_provider::{normalize_domain_name, CloudflareAuth, CloudflareProvider};

use crate::error::{CoreError, CoreResult};

pub const ENV_EMAIL: &str = "CLOUDFLARE_EMAIL";
pub const ENV_API_KEY: &str = "CLOUDFLARE_API_KEY";
pub const ENV_API_TOKEN: &str = "CLOUDFLARE_API_TOKEN";
pub const ENV_ZONE_ID: &str = "CLOUDFLARE_ZONE_ID";
pub const ENV_BASE_DOMAIN: &str = "BASE_DOMAIN";
pub const ENV_API_BASE: &str = "CLOUDFLARE_API_BASE";

/// Everything needed to talk to the registrar
#[derive(Debug, Clone)]
pub struct RegistrarSettings {
    pub auth: CloudflareAuth,
    pub zone_id: String,
    /// Normalized (lowercase, no trailing dot)
    pub base_domain: String,
    /// Overrides the public API root
    pub api_base: Option<String>,
}

impl RegistrarSettings {
    /// Builds settings from a variable lookup.
    ///
    /// `CLOUDFLARE_API_TOKEN` takes precedence over the email/key pair. All
    /// missing variables are reported in one error.
    pub fn from_lookup<F>(lookup: F) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut missing = Vec::new();

        let auth = match get(ENV_API_TOKEN) {
            Some(token) => Some(CloudflareAuth::ApiToken(token)),
            None => match (get(ENV_EMAIL), get(ENV_API_KEY)) {
                (Some(email), Some(api_key)) => Some(CloudflareAuth::GlobalKey { email, api_key }),
                (email, api_key) => {
                    if email.is_none() {
                        missing.push(ENV_EMAIL);
                    }
                    if api_key.is_none() {
                        missing.push(ENV_API_KEY);
                    }
                    None
                }
            },
        };
        let zone_id = get(ENV_ZONE_ID);
        if zone_id.is_none() {
            missing.push(ENV_ZONE_ID);
        }
        let base_domain = get(ENV_BASE_DOMAIN).map(|d| normalize_domain_name(&d));
        if base_domain.is_none() {
            missing.push(ENV_BASE_DOMAIN);
        }

        let (Some(auth), Some(zone_id), Some(base_domain)) = (auth, zone_id, base_domain) else {
            return Err(CoreError::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        };

        if zone_id.len() > MAX_ID_LEN {
            return Err(CoreError::Config(format!(
                "{ENV_ZONE_ID} must not exceed {MAX_ID_LEN} characters"
            )));
        }
        if base_domain.is_empty() || !base_domain.contains('.') {
            return Err(CoreError::Config(format!(
                "{ENV_BASE_DOMAIN} '{base_domain}' is not a domain name"
            )));
        }

        Ok(Self {
            auth,
            zone_id,
            base_domain,
            api_base: get(ENV_API_BASE),
        })
    }

    /// Reads the process environment.
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates the registrar client these settings describe.
    pub fn build_registrar(&self) -> CoreResult<CloudflareProvider> {
        let provider = CloudflareProvider::new(self.auth.clone(), &self.zone_id, &self.base_domain)?;
        Ok(match &self.api_base {
            Some(base) => provider.with_base_url(base),
            None => provider,
        })
    }
}
