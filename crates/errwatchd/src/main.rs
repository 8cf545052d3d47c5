//! errwatchd — the errwatch daemon.
//!
//! Assembles the sidecar: config, header set, prober, webhook notifier,
//! and the poll-and-notify scheduler. Runs until SIGINT/SIGTERM, then
//! drains in-flight check invocations before exiting.
//!
//! # Usage
//!
//! ```text
//! ERRWATCH_COOKIE=... ERRWATCH_WEBHOOK_ENDPOINT=/hooks/abc \
//!     errwatchd run --config errwatch.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use errwatch_core::{builtin_checks, Config, HeaderSet};
use errwatch_notify::{Notifier, WebhookNotifier};
use errwatch_probe::Prober;
use errwatch_scheduler::{CheckRunner, Scheduler};

#[derive(Parser)]
#[command(name = "errwatchd", about = "Cluster endpoint error watcher")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the poll-and-notify loop until interrupted.
    Run {
        /// Path to the errwatch.toml config file.
        #[arg(long, default_value = "errwatch.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,errwatch=debug,errwatchd=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run { config } => run(config).await,
    }
}

async fn run(config_path: PathBuf) -> anyhow::Result<()> {
    // Configuration errors are fatal: the scheduler never starts.
    let config = Config::load(&config_path)?;
    info!(
        host = %config.target.host,
        clusters = config.target.clusters.len(),
        interval_secs = config.target.interval_secs,
        "configuration loaded"
    );

    let headers = HeaderSet::new(&config.target.user_id, &config.cookie);
    let prober = Prober::new(&config.http)?;
    let notifier: Arc<dyn Notifier> = Arc::new(WebhookNotifier::new(
        &config.webhook.base_url,
        &config.webhook.endpoint,
    )?);

    let runner = Arc::new(CheckRunner::new(
        prober,
        notifier,
        config.target.host.clone(),
        config.target.clusters.clone(),
        headers,
        config.webhook.mention.clone(),
        Duration::from_secs(config.http.probe_timeout_secs),
    ));
    let scheduler = Scheduler::new(
        runner,
        builtin_checks(),
        Duration::from_secs(config.target.interval_secs),
        Duration::from_secs(config.http.invocation_timeout_secs),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received, draining");
        let _ = shutdown_tx.send(true);
    });

    scheduler.run(shutdown_rx).await;
    info!("errwatchd stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut terminate =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}
