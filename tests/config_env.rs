// tests/config_env.rs
use std::{env, fs, path::PathBuf, time::Duration};

use padel_watch::config::AppConfig;

const VARS: &[&str] = &[
    "PADEL_WATCH_CONFIG",
    "PADEL_STATE_PATH",
    "PADEL_CSV_PATH",
    "PADEL_TIERS",
    "PADEL_INTERVAL_MINUTES",
    "SLACK_WEBHOOK_URL",
];

fn clear_env() {
    for v in VARS {
        env::remove_var(v);
    }
}

#[test]
fn full_toml_parses() {
    let cfg = AppConfig::from_toml_str(
        r#"
[source]
csv_path = "data/t.csv"
refresh_command = ["python3", "4padel.py"]

[filter]
tiers = ["p100"]
identity = "source_url"

[state]
path = "data/state.json"
keep_removed = true

[notify]
desktop = false
webhook_url = "https://hooks.example/x"
webhook_flavor = "discord"

[watch]
interval_minutes = 5
"#,
    )
    .unwrap();

    assert_eq!(cfg.source.csv_path, PathBuf::from("data/t.csv"));
    assert_eq!(cfg.source.refresh_command, vec!["python3", "4padel.py"]);
    assert_eq!(cfg.filter.tiers_label(), "P100");
    assert!(cfg.state.keep_removed);
    assert!(!cfg.notify.desktop);
    assert_eq!(cfg.interval(), Duration::from_secs(300));
}

#[test]
fn unknown_flavor_is_rejected() {
    let err = AppConfig::from_toml_str("[notify]\nwebhook_flavor = \"teams\"\n");
    assert!(err.is_err());
}

#[serial_test::serial]
#[test]
fn load_falls_back_then_env_wins() {
    clear_env();
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    // 1) Nothing on disk: built-in defaults.
    let cfg = AppConfig::load(None).unwrap();
    assert_eq!(cfg, AppConfig::default());

    // 2) config/padel_watch.toml is picked up.
    fs::create_dir_all("config").unwrap();
    fs::write("config/padel_watch.toml", "[watch]\ninterval_minutes = 30\n").unwrap();
    assert_eq!(AppConfig::load(None).unwrap().watch.interval_minutes, 30);

    // 3) Env overrides win over the file.
    env::set_var("PADEL_INTERVAL_MINUTES", "7");
    env::set_var("PADEL_TIERS", "P250, ,p500");
    env::set_var("PADEL_STATE_PATH", "elsewhere.json");
    let cfg = AppConfig::load(None).unwrap();
    assert_eq!(cfg.watch.interval_minutes, 7);
    assert_eq!(cfg.filter.tiers_label(), "P250/P500");
    assert_eq!(cfg.state.path, PathBuf::from("elsewhere.json"));

    // 4) Bad number is an error, not a silent default.
    env::set_var("PADEL_INTERVAL_MINUTES", "soon");
    assert!(AppConfig::load(None).is_err());

    clear_env();
    env::set_current_dir(old).unwrap();
}

#[serial_test::serial]
#[test]
fn explicit_or_env_path_must_exist() {
    clear_env();
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("nope.toml");
    assert!(AppConfig::load(Some(missing.as_path())).is_err());

    env::set_var("PADEL_WATCH_CONFIG", &missing);
    assert!(AppConfig::load(None).is_err());

    let present = tmp.path().join("cfg.toml");
    fs::write(&present, "[filter]\ntiers = []\n").unwrap();
    env::set_var("PADEL_WATCH_CONFIG", &present);
    assert_eq!(AppConfig::load(None).unwrap().filter.tiers_label(), "tous niveaux");

    clear_env();
}

#[serial_test::serial]
#[test]
fn blank_webhook_env_is_ignored() {
    clear_env();
    env::set_var("SLACK_WEBHOOK_URL", "  ");
    let mut cfg = AppConfig::default();
    cfg.apply_env().unwrap();
    assert_eq!(cfg.notify.webhook_url, None);

    env::set_var("SLACK_WEBHOOK_URL", "https://hooks.slack.com/services/x");
    cfg.apply_env().unwrap();
    assert!(cfg.notify.webhook_url.is_some());
    clear_env();
}
