// tests/csv_scraper.rs
use std::path::PathBuf;
use std::time::Duration;

use padel_watch::scrape::{CsvScraper, RefreshCommand};
use padel_watch::{Normalizer, ScrapeError, Scraper, TierFilter};

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/tournois_4padel.csv")
}

fn p100_p250() -> Normalizer {
    Normalizer::new(
        TierFilter::new(["P100", "P250"]),
        Box::new(padel_watch::record::ClubDateTimeName),
    )
}

#[tokio::test]
async fn fixture_normalizes_to_three_sorted_records() {
    let rows = CsvScraper::new(fixture()).scrape().await.unwrap();
    assert_eq!(rows.len(), 7);

    let n = p100_p250().normalize(rows);
    // Empty club plus the truncated last row.
    assert_eq!(n.skipped_malformed, 2);
    assert_eq!(n.filtered_tier, 1);
    assert_eq!(n.duplicates, 1);

    let clubs: Vec<_> = n.records.iter().map(|r| r.club.as_str()).collect();
    assert_eq!(clubs, vec!["4PADEL Lille", "4PADEL Marville", "4PADEL Bordeaux"]);

    let lille = &n.records[0];
    assert_eq!(lille.tier, "P100");
    assert_eq!(lille.heure, "17:00");
    assert_eq!(
        lille.key.parts().to_vec(),
        vec!["4PADEL Lille", "08/01/2026", "17:00", "P100 Mixte"]
    );
    assert_eq!(n.records[1].details.as_deref(), Some("Soirée - Ouvert à tous"));
    assert!(n.records[1].is_evening());
}

#[tokio::test]
async fn missing_csv_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = CsvScraper::new(dir.path().join("absent.csv"))
        .scrape()
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::MissingOutput(_)));
}

#[tokio::test]
async fn header_only_csv_is_an_empty_scrape() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t.csv");
    std::fs::write(&path, "niveau,club,nom,date,heure\n").unwrap();
    assert!(CsvScraper::new(&path).scrape().await.unwrap().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn refresh_command_writes_the_csv_first() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh.csv");
    let script = format!(
        "printf 'niveau,club,nom,date,heure\\nP100,4PADEL Nice,P100 Nuit,01/03/2026,21h00\\n' > '{}'",
        path.display()
    );
    let argv = vec!["sh".to_string(), "-c".to_string(), script];
    let refresh = RefreshCommand::from_argv(&argv, Duration::from_secs(10));

    let rows = CsvScraper::new(&path)
        .with_refresh(refresh)
        .scrape()
        .await
        .unwrap();
    let n = p100_p250().normalize(rows);
    assert_eq!(n.records.len(), 1);
    assert_eq!(n.records[0].heure, "21:00");
}

#[cfg(unix)]
#[tokio::test]
async fn failing_refresh_aborts_the_scrape() {
    let refresh = RefreshCommand::from_argv(&["false".to_string()], Duration::from_secs(10));
    let err = CsvScraper::new(fixture())
        .with_refresh(refresh)
        .scrape()
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::Refresh { .. }), "{err}");
}

#[cfg(unix)]
#[tokio::test]
async fn slow_refresh_times_out() {
    let argv = vec!["sleep".to_string(), "5".to_string()];
    let refresh = RefreshCommand::from_argv(&argv, Duration::from_millis(100));
    let err = CsvScraper::new(fixture())
        .with_refresh(refresh)
        .scrape()
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::RefreshTimeout { .. }), "{err}");
}
