// src/scheduler.rs
use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::watcher::{RunError, Watcher};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub runs: u64,
    pub failed_runs: u64,
    pub notified: u64,
}

/// Run `check_once` now and then every `period` until `shutdown` resolves.
/// Shutdown is only observed between runs, so a run in progress finishes.
/// Transient failures are logged and retried next tick; corrupt state ends
/// the loop with the error.
pub async fn watch<F>(watcher: &Watcher, period: Duration, shutdown: F) -> Result<WatchSummary, RunError>
where
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut summary = WatchSummary::default();
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        summary.runs += 1;
        match watcher.check_once().await {
            Ok(report) => {
                summary.notified += report.additions.len() as u64;
                tracing::info!(
                    target: "watch",
                    new = report.additions.len(),
                    dispatch_failures = report.dispatch_failures.len(),
                    empty_scrape = report.empty_scrape.is_some(),
                    "watch tick"
                );
            }
            Err(e) if e.needs_intervention() => {
                tracing::error!(target: "watch", error = %e, "stopping watch");
                return Err(e);
            }
            Err(e) => {
                summary.failed_runs += 1;
                tracing::warn!(target: "watch", error = %e, "watch tick failed");
            }
        }
    }
    Ok(summary)
}
