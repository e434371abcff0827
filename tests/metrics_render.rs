// tests/metrics_render.rs
#![cfg(feature = "strict-metrics")]
use metrics_exporter_prometheus::PrometheusBuilder;
use padel_watch::scrape::StaticScraper;
use padel_watch::state::MemoryStateStore;
use padel_watch::{Normalizer, NotifierMux, RawRecord, RunOptions, Watcher};

#[tokio::test]
async fn run_counters_are_rendered() {
    // Install before building the watcher so descriptions land on this recorder.
    let handle = PrometheusBuilder::new().install_recorder().expect("recorder");

    let row = RawRecord::new()
        .with("niveau", "P100")
        .with("club", "4PADEL Marville")
        .with("nom", "P100 Soirée")
        .with("date", "09/01/2026")
        .with("heure", "19h00");
    let w = Watcher::new(
        Box::new(StaticScraper::new(vec![row, RawRecord::new().with("club", "x")])),
        Box::new(MemoryStateStore::new()),
        Normalizer::default(),
        NotifierMux::default(),
        RunOptions::default(),
    );
    w.check_once().await.expect("run");

    let out = handle.render();
    assert!(out.contains("padel_runs_total 1"));
    assert!(out.contains("padel_new_tournaments_total 1"));
    assert!(out.contains("padel_records_skipped_total 1"));
    assert!(out.contains("padel_snapshot_size 1"));
}
