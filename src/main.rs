//! DRBD Shutdown Guard
//!
//! Installs a systemd unit that forces DRBD resources to secondary during
//! shutdown, and implements the stop action of that unit.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drbd_shutdown_guard::config::GuardConfig;
use drbd_shutdown_guard::error::Result;
use drbd_shutdown_guard::guard::ShutdownGuard;
use drbd_shutdown_guard::install::Installer;
use drbd_shutdown_guard::systemd::Systemctl;

/// DRBD Shutdown Guard - keep suspended DRBD resources from blocking shutdown
#[derive(Parser)]
#[command(name = "drbd-shutdown-guard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Optional configuration file overriding the default layout
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install and start the shutdown guard service
    Install,

    /// Force all DRBD resources to secondary (run by the service on stop)
    Execute,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level);

    tracing::info!(
        "Running drbd-shutdown-guard version {}",
        env!("CARGO_PKG_VERSION")
    );

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let result = match cli.command {
        Commands::Install => run_install(cli.config, &cancel).await,
        Commands::Execute => run_execute(cli.config, &cancel).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging
fn init_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Cancel all pending operations on SIGINT or SIGTERM
async fn cancel_on_signal(cancel: CancellationToken) {
    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            cancel.cancel();
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Received interrupt, cancelling");
        }
        _ = terminate.recv() => {
            tracing::warn!("Received SIGTERM, cancelling");
        }
    }
    cancel.cancel();
}

/// Install the service unit
async fn run_install(config_path: Option<PathBuf>, cancel: &CancellationToken) -> Result<()> {
    let config = GuardConfig::load(config_path.as_deref())?;

    let installer = Installer::new(config, Arc::new(Systemctl::new()));
    installer.install(cancel).await
}

/// Demote every DRBD resource
async fn run_execute(config_path: Option<PathBuf>, cancel: &CancellationToken) -> Result<()> {
    let config = GuardConfig::load(config_path.as_deref())?;

    let guard = ShutdownGuard::from_config(&config)?;
    guard.execute(cancel).await
}
