//! Subcommand implementations.
//!
//! Each command receives its parsed arguments and reads its configuration
//! once; errors go back to `main` untouched so their kind can be reported.

pub mod dns;
pub mod serve;

use std::sync::Arc;

use anyhow::Context;
use autoserve_core::{
    DnsService, HttpIpResolver, IpResolverOptions, LifecycleOptions, RegistrarSettings,
};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;

/// Builds the lifecycle manager from the process environment.
pub fn dns_service() -> anyhow::Result<DnsService> {
    let settings = RegistrarSettings::from_env()?;
    tracing::debug!(
        "Registrar: zone {} for {}",
        settings.zone_id,
        settings.base_domain
    );
    let registrar = Arc::new(settings.build_registrar()?);
    let resolver = Arc::new(HttpIpResolver::new(IpResolverOptions::default())?);
    Ok(DnsService::new(
        registrar,
        resolver,
        LifecycleOptions::default(),
    ))
}

/// Ctrl-C / SIGTERM latch.
///
/// The OS handlers are registered by [`Shutdown::install`] itself, so a
/// signal that arrives before anyone waits is still observed instead of
/// taking the default action and killing the process.
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn install() -> anyhow::Result<Self> {
        let mut interrupt =
            signal(SignalKind::interrupt()).context("failed to listen for Ctrl-C")?;
        let mut terminate =
            signal(SignalKind::terminate()).context("failed to listen for SIGTERM")?;

        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            tokio::select! {
                _ = interrupt.recv() => tracing::info!("Received Ctrl-C"),
                _ = terminate.recv() => tracing::info!("Received SIGTERM"),
            }
            let _ = tx.send(true);
        });
        Ok(Self { rx })
    }

    /// Whether a signal has already arrived
    pub fn requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once a signal has arrived (immediately if one already has)
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|requested| *requested).await.is_err() {
            // 发送端只会在置位后退出
            std::future::pending::<()>().await;
        }
    }
}
