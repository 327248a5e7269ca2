//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

// Re-export library error type
pub use autoserve_provider::ProviderError;

/// Core layer error type
///
/// Provider errors are classified into this taxonomy at the boundary (see the
/// `From<ProviderError>` impl); the original provider error is kept inside the
/// variant so the raw upstream message stays available.
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Input rejected before or by the registrar
    #[error("Validation error: {0}")]
    Validation(String),

    /// Credentials missing, invalid, or lacking permission
    #[error("Authentication failed: {0}")]
    Auth(ProviderError),

    /// Record or zone does not exist
    #[error("Not found: {0}")]
    NotFound(ProviderError),

    /// The record name is already taken
    #[error("Record name already taken: {name}")]
    Conflict {
        name: String,
        raw_message: Option<String>,
    },

    /// Registrar rate limit hit
    #[error("Rate limited: {0}")]
    RateLimited(ProviderError),

    /// Connect failure, timeout or gateway error
    #[error("Transient network error: {0}")]
    TransientNetwork(ProviderError),

    /// Could not determine an address to publish
    #[error("IP resolution failed: {0}")]
    IpResolution(String),

    /// Every allocation attempt ran into a conflict
    #[error("Gave up after {attempts} attempts, last error: {last}")]
    ExhaustedRetries { attempts: u32, last: Box<CoreError> },

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider error with no more specific classification (quota, parse, unknown)
    #[error("{0}")]
    Provider(ProviderError),
}

impl From<ProviderError> for CoreError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::InvalidParameter { .. } | ProviderError::UnsupportedRecordType { .. } => {
                Self::Validation(err.to_string())
            }
            ProviderError::InvalidCredentials { .. } | ProviderError::PermissionDenied { .. } => {
                Self::Auth(err)
            }
            ProviderError::RecordNotFound { .. } | ProviderError::ZoneNotFound { .. } => {
                Self::NotFound(err)
            }
            ProviderError::RecordExists {
                record_name,
                raw_message,
                ..
            } => Self::Conflict {
                name: record_name,
                raw_message,
            },
            ProviderError::RateLimited { .. } => Self::RateLimited(err),
            ProviderError::NetworkError { .. } | ProviderError::Timeout { .. } => {
                Self::TransientNetwork(err)
            }
            ProviderError::QuotaExceeded { .. }
            | ProviderError::ParseError { .. }
            | ProviderError::Unknown { .. } => Self::Provider(err),
        }
    }
}

impl CoreError {
    /// Taxonomy name shown to users alongside the message.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::Auth(_) => "AuthError",
            Self::NotFound(_) => "NotFoundError",
            Self::Conflict { .. } => "ConflictError",
            Self::RateLimited(_) => "RateLimitError",
            Self::TransientNetwork(_) => "TransientNetworkError",
            Self::IpResolution(_) => "IPResolutionError",
            Self::ExhaustedRetries { .. } => "ExhaustedRetriesError",
            Self::Config(_) => "ConfigError",
            Self::Provider(_) => "ProviderError",
        }
    }

    /// Whether it is expected behavior (user input, resource does not exist, etc.) is used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added. **
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::Validation(_)
            | Self::Auth(_)
            | Self::NotFound(_)
            | Self::Conflict { .. }
            | Self::Config(_) => true,
            Self::ExhaustedRetries { last, .. } => last.is_expected(),
            Self::Provider(e) => e.is_expected(),
            _ => false,
        }
    }

    /// Transient failures worth another attempt with backoff.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::TransientNetwork(_))
    }

    /// `Retry-After` hint in seconds, when the registrar sent one.
    #[must_use]
    pub const fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited(ProviderError::RateLimited { retry_after, .. }) => *retry_after,
            _ => None,
        }
    }

    /// Raw upstream response text, when available.
    #[must_use]
    pub fn raw_message(&self) -> Option<&str> {
        match self {
            Self::Auth(e)
            | Self::NotFound(e)
            | Self::RateLimited(e)
            | Self::TransientNetwork(e)
            | Self::Provider(e) => e.raw_message(),
            Self::Conflict { raw_message, .. } => raw_message.as_deref(),
            Self::ExhaustedRetries { last, .. } => last.raw_message(),
            _ => None,
        }
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
