//! padel-watch — Binary Entrypoint
//! Checks the 4PADEL listing once (or on an interval with `--watch`) and
//! notifies about tournaments that were not listed before.
//!
//! Exit status: 0 no change, 10 new tournaments, 1 hard failure, 2 usage.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use padel_watch::bootstrap::{apply_overrides, build_watcher, Overrides};
use padel_watch::config::AppConfig;
use padel_watch::watcher::{EXIT_FAILURE, EXIT_NO_CHANGE};
use padel_watch::{init_tracing, metrics, scheduler};

/// Notifier for new P100/P250 tournaments on 4PADEL
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Record the current listing as already seen, without notifying
    #[arg(long)]
    init: bool,

    /// Keep checking on an interval until Ctrl-C
    #[arg(long)]
    watch: bool,

    /// Minutes between checks in watch mode [default: from config, 15]
    #[arg(long)]
    interval: Option<u64>,

    /// Only log what would be notified; do not save state
    #[arg(long)]
    dry_run: bool,

    /// Send emails in addition to desktop notifications
    #[arg(long)]
    email: bool,

    /// Send one digest email per run instead of one per tournament
    #[arg(long)]
    batch_email: bool,

    /// Config file [default: $PADEL_WATCH_CONFIG or config/padel_watch.toml]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Expose Prometheus metrics on this address (e.g. 127.0.0.1:9187)
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env if present; no-op otherwise.
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    init_tracing(args.log_json);

    match run(args).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(error = %format!("{e:#}"), "padel-watch failed");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<u8> {
    let mut cfg = AppConfig::load(args.config.as_deref())?;
    apply_overrides(
        &mut cfg,
        Overrides {
            email: args.email,
            batch_email: args.batch_email,
        },
    );
    if let Some(minutes) = args.interval {
        cfg.watch.interval_minutes = minutes;
    }
    if let Some(addr) = args.metrics_addr {
        metrics::install_exporter(addr)?;
    }

    let watcher = build_watcher(&cfg, args.dry_run)?;

    if args.init {
        let report = watcher.initialize().await?;
        if report.empty_scrape.is_some() {
            warn!("nothing scraped; state left untouched");
            return Ok(EXIT_FAILURE);
        }
        info!(tournaments = report.baseline, tiers = %cfg.filter.tiers_label(), "state initialized");
        return Ok(EXIT_NO_CHANGE);
    }

    if !args.watch {
        let report = watcher.check_once().await?;
        if report.partial_dispatch_failure() {
            warn!(failures = report.dispatch_failures.len(), "some notifications were not delivered");
        }
        return Ok(report.status().exit_code());
    }

    info!(
        minutes = cfg.interval().as_secs() / 60,
        "watching; press Ctrl-C to stop"
    );
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    let summary = scheduler::watch(&watcher, cfg.interval(), shutdown).await?;
    info!(
        runs = summary.runs,
        failed = summary.failed_runs,
        notified = summary.notified,
        "watch stopped"
    );
    Ok(EXIT_NO_CHANGE)
}
