//! # autoserve-provider
//!
//! Registrar client used by autoserve to publish short-lived DNS records that
//! point a subdomain at a machine.
//!
//! ## Supported Registrars
//!
//! | Registrar | Feature Flag | Auth Method |
//! |-----------|-------------|-------------|
//! | [Cloudflare](https://www.cloudflare.com/) | `cloudflare` | Bearer Token or Global API Key |
//!
//! ## Feature Flags
//!
//! - **`cloudflare`** *(default)*: enable the Cloudflare v4 client.
//! - **`rustls`** *(default)*: use rustls for TLS.
//! - **`native-tls`**: use the platform's native TLS implementation.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use autoserve_provider::{
//!     CloudflareAuth, CloudflareProvider, DnsRegistrar, NewDnsRecord, RecordFilter,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registrar = CloudflareProvider::new(
//!         CloudflareAuth::ApiToken("your-token".to_string()),
//!         "023e105f4ecef8ad9ca31a8372d0c353",
//!         "example.com",
//!     )?;
//!
//!     let ip = "203.0.113.7".parse()?;
//!     let record = registrar
//!         .create_record(&NewDnsRecord::address("demo.example.com", ip, true, 1))
//!         .await?;
//!     println!("{} -> {}", record.name, record.content);
//!
//!     for r in registrar.list_records(&RecordFilter::default()).await? {
//!         println!("{} {} {}", r.name, r.record_type, r.content);
//!     }
//!
//!     registrar.delete_record(&record.id).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, ProviderError>`](ProviderError). Inputs are
//! validated before any request is sent. The client never retries on its own:
//!
//! - [`ProviderError::RecordExists`]: the name is taken
//! - [`ProviderError::RateLimited`]: HTTP 429, carries the `Retry-After` hint
//! - [`ProviderError::NetworkError`] / [`ProviderError::Timeout`]: transient transport failures

mod error;
mod http_client;
mod providers;
mod traits;
mod types;
mod utils;
pub mod validation;

// Re-export error types
pub use error::{ProviderError, Result};

// Re-export core trait only (internal traits are not exported)
pub use traits::DnsRegistrar;

// Re-export types
pub use types::{DnsRecord, DnsRecordType, NewDnsRecord, RecordFilter, RegistrarCapabilities, Zone};

// Re-export utils module
pub use utils::{datetime, log_sanitizer};

// Name helpers shared with higher layers
pub use providers::common::{normalize_domain_name, qualify};

#[cfg(feature = "cloudflare")]
pub use providers::{CloudflareAuth, CloudflareProvider, ConflictDetection};
