// src/bootstrap.rs
//! Wires config into a ready-to-run [`Watcher`].

use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::normalize::Normalizer;
use crate::notify::{
    DesktopNotifier, EmailConfig, EmailNotifier, LogNotifier, Notifier, NotifierMux,
    WebhookNotifier,
};
use crate::record::key_strategy_by_name;
use crate::scrape::{CsvScraper, RefreshCommand};
use crate::state::FileStateStore;
use crate::watcher::{RunOptions, Watcher};

/// Per-invocation switches layered over the config file. Dry-run is not one
/// of them: it picks the channels and the save policy, see [`build_watcher`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub email: bool,
    pub batch_email: bool,
}

pub fn apply_overrides(cfg: &mut AppConfig, o: Overrides) {
    if o.email || o.batch_email {
        cfg.notify.email = true;
    }
    if o.batch_email {
        cfg.notify.batch_email = true;
    }
}

pub fn build_normalizer(cfg: &AppConfig) -> Result<Normalizer> {
    let keys = key_strategy_by_name(&cfg.filter.identity)
        .ok_or_else(|| anyhow!("unknown identity strategy '{}'", cfg.filter.identity))?;
    Ok(Normalizer::new(cfg.filter.tier_filter(), keys))
}

/// Channels per config. A broken email config disables email with a warning
/// rather than failing the run.
pub fn build_notifier(cfg: &AppConfig, dry_run: bool) -> NotifierMux {
    let timeout = Duration::from_secs(cfg.notify.timeout_secs.max(1));
    if dry_run {
        let log_only: Vec<Box<dyn Notifier>> = vec![Box::new(LogNotifier)];
        return NotifierMux::new(log_only).with_timeout(timeout);
    }

    let mut channels: Vec<Box<dyn Notifier>> = Vec::new();
    if cfg.notify.desktop {
        channels.push(Box::new(DesktopNotifier::default()));
    }
    if cfg.notify.email {
        let built = EmailConfig::load_from_file(&cfg.notify.email_config).and_then(|ec| {
            EmailNotifier::from_config(
                &ec,
                &cfg.source.page_url,
                &cfg.filter.tiers_label(),
                cfg.notify.batch_email,
            )
        });
        match built {
            Ok(n) => channels.push(Box::new(n)),
            Err(e) => warn!(error = %format!("{e:#}"), "email not configured, channel disabled"),
        }
    }
    if let Some(url) = cfg.notify.webhook_url.as_ref().filter(|u| !u.trim().is_empty()) {
        channels.push(Box::new(WebhookNotifier::new(
            url.clone(),
            cfg.notify.webhook_flavor,
        )));
    }

    let mux = NotifierMux::new(channels).with_timeout(timeout);
    info!(channels = ?mux.channel_names(), "notification channels ready");
    mux
}

pub fn build_watcher(cfg: &AppConfig, dry_run: bool) -> Result<Watcher> {
    let refresh = RefreshCommand::from_argv(
        &cfg.source.refresh_command,
        Duration::from_secs(cfg.source.refresh_timeout_secs.max(1)),
    );
    let scraper = CsvScraper::new(&cfg.source.csv_path).with_refresh(refresh);
    let store = FileStateStore::new(&cfg.state.path);

    let opts = RunOptions {
        dry_run,
        keep_removed: cfg.state.keep_removed,
        scrape_timeout: Duration::from_secs(cfg.source.scrape_timeout_secs.max(1)),
    };

    Ok(Watcher::new(
        Box::new(scraper),
        Box::new(store),
        build_normalizer(cfg)?,
        build_notifier(cfg, dry_run),
        opts,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_email_implies_email() {
        let mut cfg = AppConfig::default();
        apply_overrides(
            &mut cfg,
            Overrides {
                batch_email: true,
                ..Overrides::default()
            },
        );
        assert!(cfg.notify.email && cfg.notify.batch_email);
    }

    #[test]
    fn no_overrides_leave_config_untouched() {
        let mut cfg = AppConfig::default();
        apply_overrides(&mut cfg, Overrides::default());
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn dry_run_only_logs() {
        let mut cfg = AppConfig::default();
        cfg.notify.email = true;
        assert_eq!(build_notifier(&cfg, true).channel_names(), vec!["log"]);
    }

    #[test]
    fn unknown_identity_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.filter.identity = "fuzzy".into();
        assert!(build_normalizer(&cfg).is_err());
    }
}
