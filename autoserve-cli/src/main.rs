//! autoserve entry point
//!
//! Serves a local directory over HTTP(S) and provisions a public DNS name for
//! it. Subcommands:
//!
//! - `serve`: file server, optionally behind a supervised Caddy and a
//!   session-scoped DNS record
//! - `dns create|list|delete|cleanup`: manage records in the configured zone
//!
//! Exit code 0 on success, 1 on any surfaced error. Errors are printed with
//! their kind and, when the registrar sent one, the raw upstream message.

mod cli;
mod commands;
mod file_server;

use std::process::ExitCode;

use autoserve_core::CoreError;
use autoserve_proxy::ProxyError;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Serve(args) => commands::serve::run(args).await,
        Command::Dns(command) => commands::dns::run(command).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; stdout is reserved for command output.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str()));
    for noisy in ["hyper=warn", "reqwest=warn"] {
        if let Ok(directive) = noisy.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .init();
}

/// Taxonomy name for the error at the root of `err`
fn error_kind(err: &anyhow::Error) -> &'static str {
    if let Some(core) = err.downcast_ref::<CoreError>() {
        core.kind()
    } else if let Some(proxy) = err.downcast_ref::<ProxyError>() {
        proxy.kind()
    } else {
        "Error"
    }
}

fn report(err: &anyhow::Error) {
    let kind = error_kind(err);
    tracing::debug!("{kind}: {err:?}");
    eprintln!("Error [{kind}]: {err:#}");

    if let Some(raw) = err.downcast_ref::<CoreError>().and_then(CoreError::raw_message) {
        eprintln!("  upstream: {raw}");
    }
    if let Some(stderr) = err
        .downcast_ref::<ProxyError>()
        .and_then(ProxyError::stderr)
        .filter(|s| !s.is_empty())
    {
        eprintln!("  proxy stderr:");
        for line in stderr.lines() {
            eprintln!("    {line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_found_through_context() {
        let err = anyhow::Error::from(CoreError::Conflict {
            name: "demo.example.com".to_string(),
            raw_message: Some("An identical record already exists.".to_string()),
        })
        .context("dns create failed");
        assert_eq!(error_kind(&err), "ConflictError");

        let err = anyhow::Error::from(ProxyError::ProcessExited {
            exit_code: Some(1),
            stderr: String::new(),
        });
        assert_eq!(error_kind(&err), "ProcessExitedError");

        assert_eq!(error_kind(&anyhow::anyhow!("plain")), "Error");
    }
}
