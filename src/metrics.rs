// src/metrics.rs
use std::net::SocketAddr;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up before the first run).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("padel_runs_total", "Completed check runs.");
        describe_counter!(
            "padel_run_failures_total",
            "Runs aborted by a scrape, state or save error."
        );
        describe_counter!(
            "padel_new_tournaments_total",
            "Tournaments reported as new."
        );
        describe_counter!(
            "padel_dispatch_failures_total",
            "Failed notification deliveries."
        );
        describe_counter!(
            "padel_records_skipped_total",
            "Scraped rows dropped as malformed."
        );
        describe_counter!(
            "padel_empty_scrape_total",
            "Runs that kept the previous state because the scrape came back empty."
        );
        describe_gauge!("padel_snapshot_size", "Tournaments in the committed snapshot.");
        describe_gauge!("padel_last_run_ts", "Unix ts of the last completed run.");
    });
}

pub(crate) fn record_run(new: usize, dispatch_failures: usize, skipped: usize, snapshot: usize) {
    counter!("padel_runs_total").increment(1);
    counter!("padel_new_tournaments_total").increment(new as u64);
    counter!("padel_dispatch_failures_total").increment(dispatch_failures as u64);
    counter!("padel_records_skipped_total").increment(skipped as u64);
    gauge!("padel_snapshot_size").set(snapshot as f64);
    gauge!("padel_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
}

pub(crate) fn record_empty_scrape() {
    counter!("padel_runs_total").increment(1);
    counter!("padel_empty_scrape_total").increment(1);
}

pub(crate) fn record_failure() {
    counter!("padel_run_failures_total").increment(1);
}

/// Install the Prometheus recorder with its own HTTP listener on `addr`.
/// Must be called from inside a Tokio runtime.
pub fn install_exporter(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("prometheus exporter on {addr}: {e}"))?;
    ensure_described();
    tracing::info!(%addr, "metrics exporter listening");
    Ok(())
}
