//! Reverse-proxy supervision for autoserve
//!
//! 渲染 Caddy 配置，启动并监管 Caddy 子进程：等待就绪、捕获 stderr，
//! 在任何退出路径上终止进程并删除配置文件。
//!
//! ```rust,no_run
//! use autoserve_proxy::{ProxyConfig, ProxySupervisor, SslMode, SupervisorOptions};
//! # async fn demo() -> autoserve_proxy::ProxyResult<()> {
//! let config = ProxyConfig::new(8000, "demo.example.com", SslMode::Full);
//! let mut supervisor = ProxySupervisor::new(SupervisorOptions::default())?;
//! supervisor
//!     .run_until(&config, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod probe;
mod supervisor;

pub use config::{ProxyConfig, SslMode, ADMIN_HOST};
pub use error::{ProxyError, ProxyResult};
pub use probe::{ReadinessProbe, PROBE_TIMEOUT};
pub use supervisor::{ProcessState, ProxySupervisor, SupervisorOptions, CONFIG_PLACEHOLDER};
