//! Binary crate for the `weather-status` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Logging setup and signal handling
//! - Interactive configuration

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use weather_core::{ShutdownTrigger, shutdown};

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cmd = cli::Cli::parse();
    init_tracing(cmd.debug);

    let (trigger, shutdown) = shutdown::channel();
    tokio::spawn(watch_signals(trigger));

    match cmd.run(shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<weather_core::Error>() {
            Some(core) if core.is_cancelled() => {
                warn!(stage = %core.stage(), "interrupted");
                ExitCode::from(130)
            }
            Some(core) => {
                error!(stage = %core.stage(), "{err:#}");
                ExitCode::FAILURE
            }
            None => {
                error!("{err:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn init_tracing(debug: bool) {
    let default = if debug {
        "info,weather_core=debug,weather_status=debug,protocol=debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(unix)]
async fn watch_signals(trigger: ShutdownTrigger) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!("failed to install SIGTERM handler: {e}");
            let _ = tokio::signal::ctrl_c().await;
            trigger.trigger();
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }

    warn!("shutdown signal received, cancelling");
    trigger.trigger();
}

#[cfg(not(unix))]
async fn watch_signals(trigger: ShutdownTrigger) {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("shutdown signal received, cancelling");
        trigger.trigger();
    }
}
