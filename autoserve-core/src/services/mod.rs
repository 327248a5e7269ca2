//! 业务逻辑服务层

mod dns_service;

pub use dns_service::DnsService;

use crate::ownership::OwnershipPolicy;
use crate::retry::RetryPolicy;

/// Default bound on allocation attempts when auto-generated names collide
pub const DEFAULT_MAX_CONFLICT_ATTEMPTS: u32 = 5;

/// Options for [`DnsService`]
///
/// Built once by the caller and passed in at construction.
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Backoff for rate limits and transient network failures
    pub retry: RetryPolicy,
    /// Allocation attempts for auto-generated labels (user labels never retry)
    pub max_conflict_attempts: u32,
    /// `None` picks a policy from the registrar's capabilities
    pub ownership: Option<OwnershipPolicy>,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            max_conflict_attempts: DEFAULT_MAX_CONFLICT_ATTEMPTS,
            ownership: None,
        }
    }
}
