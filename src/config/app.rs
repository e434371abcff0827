// src/config/app.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::normalize::TierFilter;
use crate::notify::email::DEFAULT_EMAIL_CONFIG_PATH;
use crate::notify::WebhookFlavor;
use crate::scrape::csv_source::DEFAULT_CSV_PATH;
use crate::state::file::DEFAULT_STATE_PATH;

pub const DEFAULT_CONFIG_PATH: &str = "config/padel_watch.toml";
pub const ENV_CONFIG_PATH: &str = "PADEL_WATCH_CONFIG";
pub const ENV_STATE_PATH: &str = "PADEL_STATE_PATH";
pub const ENV_CSV_PATH: &str = "PADEL_CSV_PATH";
pub const ENV_TIERS: &str = "PADEL_TIERS";
pub const ENV_INTERVAL_MINUTES: &str = "PADEL_INTERVAL_MINUTES";
pub const ENV_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";

pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

pub const DEFAULT_PAGE_URL: &str = "https://www.4padel.fr/tournois";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub csv_path: PathBuf,
    /// argv of the program that refreshes `csv_path`; empty = read as-is.
    pub refresh_command: Vec<String>,
    pub refresh_timeout_secs: u64,
    /// Upper bound for the whole scrape step.
    pub scrape_timeout_secs: u64,
    pub page_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            refresh_command: Vec::new(),
            refresh_timeout_secs: 180,
            scrape_timeout_secs: 300,
            page_url: DEFAULT_PAGE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Empty list = every tier.
    pub tiers: Vec<String>,
    /// "club_date_time_name" | "source_url"
    pub identity: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            tiers: vec!["P100".into(), "P250".into()],
            identity: "club_date_time_name".into(),
        }
    }
}

impl FilterConfig {
    pub fn tier_filter(&self) -> TierFilter {
        TierFilter::new(&self.tiers)
    }

    /// "P100/P250", or "tous niveaux" without a filter.
    pub fn tiers_label(&self) -> String {
        let f = self.tier_filter();
        let label = f.tiers().collect::<Vec<_>>().join("/");
        if label.is_empty() {
            "tous niveaux".to_string()
        } else {
            label
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub path: PathBuf,
    /// Keep keys that disappeared from the listing instead of forgetting them.
    pub keep_removed: bool,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STATE_PATH),
            keep_removed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub desktop: bool,
    pub email: bool,
    pub batch_email: bool,
    pub email_config: PathBuf,
    pub webhook_url: Option<String>,
    pub webhook_flavor: WebhookFlavor,
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            desktop: true,
            email: false,
            batch_email: false,
            email_config: PathBuf::from(DEFAULT_EMAIL_CONFIG_PATH),
            webhook_url: None,
            webhook_flavor: WebhookFlavor::Slack,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub interval_minutes: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 15,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub filter: FilterConfig,
    pub state: StateConfig,
    pub notify: NotifyConfig,
    pub watch: WatchConfig,
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Resolve the config file, then apply env overrides:
    /// 1) `explicit` (must exist)
    /// 2) $PADEL_WATCH_CONFIG (must exist)
    /// 3) config/padel_watch.toml if present, else built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from);
        let mut cfg = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(p) if p.exists() => Self::load_from(&p)?,
            Some(p) => return Err(anyhow!("config file {} does not exist", p.display())),
            None => {
                let p = PathBuf::from(DEFAULT_CONFIG_PATH);
                if p.exists() {
                    Self::load_from(&p)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(p) = std::env::var(ENV_STATE_PATH) {
            self.state.path = PathBuf::from(p);
        }
        if let Ok(p) = std::env::var(ENV_CSV_PATH) {
            self.source.csv_path = PathBuf::from(p);
        }
        if let Ok(t) = std::env::var(ENV_TIERS) {
            self.filter.tiers = t
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Ok(m) = std::env::var(ENV_INTERVAL_MINUTES) {
            self.watch.interval_minutes = m
                .trim()
                .parse()
                .with_context(|| format!("{ENV_INTERVAL_MINUTES}={m} is not a number"))?;
        }
        if let Ok(u) = std::env::var(ENV_WEBHOOK_URL) {
            if !u.trim().is_empty() {
                self.notify.webhook_url = Some(u);
            }
        }
        Ok(())
    }

    /// Watch interval, clamped to one minute ..= one week.
    pub fn interval(&self) -> Duration {
        let minutes = self.watch.interval_minutes.clamp(1, MAX_INTERVAL_MINUTES);
        Duration::from_secs(minutes.saturating_mul(60))
    }
}
