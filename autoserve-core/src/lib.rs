//! autoserve Core Library
//!
//! Business logic behind the `autoserve dns` commands and the ephemeral record
//! created by `autoserve serve --with-dns`:
//!
//! - Ownership tagging (which records this tool created)
//! - Subdomain allocation and IP detection
//! - The DNS record lifecycle (create / list / delete / cleanup) with bounded
//!   retries and conflict handling
//!
//! Storage is the registrar itself; nothing is persisted locally.

pub mod allocator;
pub mod error;
pub mod ip;
pub mod ownership;
pub mod retry;
pub mod services;
pub mod settings;
pub mod types;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use ip::{HttpIpResolver, IpResolver, IpResolverOptions};
pub use ownership::OwnershipPolicy;
pub use retry::RetryPolicy;
pub use services::{DnsService, LifecycleOptions};
pub use settings::RegistrarSettings;
