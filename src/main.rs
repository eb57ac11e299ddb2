use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hostwatch::{unix_now, CycleOutcome, Monitor, PrintNotifier, Scheduler, Settings};

#[derive(Parser, Debug)]
#[command(name = "hostwatch")]
#[command(about = "Watch process and weather thresholds and push debounced alerts to a webhook")]
struct Args {
    /// Path to a TOML config file (default: ./hostwatch.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run one alert cycle and exit
    #[arg(long, conflicts_with = "report")]
    once: bool,

    /// Send one weather report and exit
    #[arg(long)]
    report: bool,

    /// Webhook URL, overriding the config file and environment
    #[arg(long)]
    webhook_url: Option<String>,

    /// Rate-limit state file, overriding the config file and environment
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Print notifications as JSON instead of calling the webhook
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(url) = args.webhook_url {
        settings.webhook_url = url;
    }
    if let Some(path) = args.state_file {
        settings.state_file = path;
    }
    settings.validate().context("invalid configuration")?;

    let monitor = if args.dry_run {
        Monitor::with_notifier(&settings, PrintNotifier::new())?
    } else {
        Monitor::from_settings(&settings)?
    };

    if args.once {
        log_outcome("alert cycle", monitor.run_cycle(unix_now()).await);
        return Ok(());
    }

    if args.report {
        if !monitor.has_reporter() {
            warn!("no regions configured; nothing to report");
        }
        log_outcome("weather report", monitor.run_report().await);
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown requested, finishing current tick");
        let _ = shutdown_tx.send(true);
    });

    Scheduler::from_settings(monitor, &settings)
        .run(shutdown_rx)
        .await;

    Ok(())
}

fn log_outcome(what: &str, outcome: CycleOutcome) {
    match outcome {
        CycleOutcome::Quiet => info!("{}: nothing to send", what),
        CycleOutcome::Suppressed { remaining } => {
            info!("{}: suppressed, {:.0}s of cooldown left", what, remaining)
        }
        CycleOutcome::Delivered => info!("{}: delivered", what),
        CycleOutcome::DeliveryFailed { persisted } => {
            warn!("{}: delivery failed (state recorded: {})", what, persisted)
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        _ => {
            warn!("failed to install signal handlers, falling back to Ctrl-C");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = sigint.recv() => info!("received SIGINT"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("received Ctrl-C");
    }
}
