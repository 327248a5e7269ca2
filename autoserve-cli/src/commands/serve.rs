//! `autoserve serve`
//!
//! Composition order: install the signal latch, bind the file server, create
//! the session record (`--with-dns`), run Caddy (`--with-caddy`) until
//! shutdown, then tear down in reverse. The record and the proxy are released
//! on every exit path, including a signal during record creation or Caddy
//! startup.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use autoserve_core::types::{CreateRecordRequest, DnsRecord};
use autoserve_core::CoreError;
use autoserve_proxy::{ProxyConfig, ProxySupervisor, SupervisorOptions};
use tokio::net::TcpListener;
use tokio::sync::watch;

use super::Shutdown;
use crate::cli::ServeArgs;
use crate::file_server::{self, FileServerOptions, DEFAULT_PORT_TRIES, DEFAULT_START_PORT};

pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    if args.with_caddy && args.domain.is_none() && !args.with_dns {
        return Err(CoreError::Validation(
            "--with-caddy needs --domain or --with-dns".to_string(),
        )
        .into());
    }
    let shutdown = Shutdown::install()?;

    let root = std::fs::canonicalize(&args.path)
        .ok()
        .filter(|p| p.is_dir())
        .ok_or_else(|| {
            CoreError::Validation(format!("{} is not a directory", args.path.display()))
        })?;

    let port = if args.port == 0 {
        file_server::find_free_port(DEFAULT_START_PORT, DEFAULT_PORT_TRIES).ok_or_else(|| {
            CoreError::Validation(format!(
                "no free port in {DEFAULT_START_PORT}..{}",
                DEFAULT_START_PORT + DEFAULT_PORT_TRIES
            ))
        })?
    } else {
        args.port
    };
    let addr = SocketAddr::new(args.host, port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    // 先建 DNS 记录，后续任何失败都要删除它
    let session_dns = if args.with_dns {
        let service = super::dns_service()?;
        let request = CreateRecordRequest {
            subdomain: args.subdomain.clone(),
            ip: args.ip,
            prefer_public: !args.local_ip,
            ..CreateRecordRequest::default()
        };
        let outcome = service.create_record(request).await?;
        println!("Created DNS record: {}", outcome.managed.record.name);
        Some((service, outcome.managed.record))
    } else {
        None
    };

    let record = session_dns.as_ref().map(|(_, record)| record);
    let result = if shutdown.requested() {
        tracing::info!("Shutdown requested before serving started");
        Ok(())
    } else {
        serve_until_shutdown(&args, root, listener, record, &shutdown).await
    };

    if let Some((service, record)) = &session_dns {
        match service.delete_record(&record.id).await {
            Ok(_) => println!("Cleaned up DNS record {}", record.name),
            Err(e) => {
                tracing::error!("Failed to delete DNS record {}: {e}", record.name);
                eprintln!(
                    "Failed to clean up DNS record {} ({}); remove it with `autoserve dns delete {}`",
                    record.name, record.id, record.id
                );
                if result.is_ok() {
                    return Err(e.into());
                }
            }
        }
    }
    result
}

async fn serve_until_shutdown(
    args: &ServeArgs,
    root: std::path::PathBuf,
    listener: TcpListener,
    record: Option<&DnsRecord>,
    shutdown: &Shutdown,
) -> anyhow::Result<()> {
    let local = listener.local_addr()?;
    let router = file_server::router(FileServerOptions {
        root: root.clone(),
        directory_listing: !args.no_directory_listing,
    });

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.changed().await;
            })
            .await
    });

    println!("Serving {} on http://{local}/", root.display());
    let domain = args
        .domain
        .clone()
        .or_else(|| record.map(|r| r.name.clone()));

    let result = match (args.with_caddy, domain) {
        (true, Some(domain)) => {
            let mut config = ProxyConfig::new(local.port(), domain.as_str(), args.ssl_mode);
            if let Some(path) = &args.access_log {
                config = config.with_log_path(path);
            }
            let mut options = SupervisorOptions {
                program: args.caddy_bin.clone(),
                startup_timeout: Duration::from_secs(args.caddy_timeout),
                ..SupervisorOptions::default()
            };
            if let Some(dir) = &args.caddy_config_dir {
                options.config_dir.clone_from(dir);
            }

            let mut supervisor = ProxySupervisor::new(options)?;
            println!("Public URL: https://{domain}/ (ssl mode {})", args.ssl_mode);
            println!("Press Ctrl-C to stop");
            supervisor
                .run_until(&config, shutdown.wait())
                .await
                .map_err(anyhow::Error::from)
        }
        (_, domain) => {
            if let Some(domain) = domain {
                println!("Public URL: http://{domain}/ (no proxy)");
            }
            println!("Press Ctrl-C to stop");
            shutdown.wait().await;
            Ok(())
        }
    };

    let _ = stop_tx.send(true);
    match server.await {
        Ok(Ok(())) => tracing::info!("File server stopped"),
        Ok(Err(e)) => tracing::warn!("File server error: {e}"),
        Err(e) => tracing::warn!("File server task failed: {e}"),
    }
    result
}
