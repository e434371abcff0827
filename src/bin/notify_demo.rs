//! Sends one synthetic tournament through the configured channels, to check
//! desktop/email/webhook setup without touching state.

use padel_watch::bootstrap::{apply_overrides, build_normalizer, build_notifier, Overrides};
use padel_watch::config::AppConfig;
use padel_watch::RawRecord;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let mut cfg = AppConfig::load(None)?;
    let email = std::env::args().any(|a| a == "--email");
    apply_overrides(
        &mut cfg,
        Overrides {
            email,
            ..Overrides::default()
        },
    );

    let demo = RawRecord::new()
        .with("niveau", "P100")
        .with("club", "4PADEL Démo")
        .with("nom", "P100 Soirée (test)")
        .with("date", &chrono::Local::now().format("%d/%m/%Y").to_string())
        .with("heure", "20h00");

    let normalizer = build_normalizer(&cfg)?;
    let Some(record) = normalizer.canonicalize(&demo) else {
        anyhow::bail!("demo record did not normalize");
    };

    let mux = build_notifier(&cfg, false);
    let failures = mux.dispatch(std::slice::from_ref(&record)).await;
    for f in &failures {
        eprintln!("{}: {}", f.channel, f.error);
    }

    println!("notify-demo done ({} failure(s))", failures.len());
    Ok(())
}
