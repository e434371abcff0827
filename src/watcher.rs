// src/watcher.rs
//! One check run: load → scrape → normalize → diff → notify → commit.
//!
//! Durable state is only touched by the final save, so dropping a run before
//! that point leaves the store as it was. The save itself is rename-based and
//! either lands in full or not at all.

use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::delta::{compare, Comparison, EmptyScrapeWarning};
use crate::metrics;
use crate::normalize::{Normalized, Normalizer};
use crate::notify::{DispatchFailure, NotifierMux};
use crate::record::{IdentityKey, RawRecord, TournamentRecord};
use crate::scrape::{ScrapeError, Scraper};
use crate::state::{StateError, StateSnapshot, StateStore};

pub const EXIT_NO_CHANGE: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_NOTIFIED: u8 = 10;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("scrape failed: {0}")]
    Scrape(#[from] ScrapeError),

    #[error(transparent)]
    State(#[from] StateError),
}

impl RunError {
    /// Corrupt state needs a human; retrying will not help.
    pub fn needs_intervention(&self) -> bool {
        matches!(self, RunError::State(e) if e.is_corrupt())
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Compute and log, but do not commit the new snapshot.
    pub dry_run: bool,
    pub keep_removed: bool,
    pub scrape_timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            keep_removed: false,
            scrape_timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    NoChange,
    Notified,
}

impl RunStatus {
    pub fn exit_code(self) -> u8 {
        match self {
            RunStatus::NoChange => EXIT_NO_CHANGE,
            RunStatus::Notified => EXIT_NOTIFIED,
        }
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub additions: Vec<TournamentRecord>,
    pub removals: Vec<IdentityKey>,
    pub dispatch_failures: Vec<DispatchFailure>,
    pub skipped_malformed: usize,
    pub filtered_tier: usize,
    pub duplicates: usize,
    /// Set when the scrape came back empty and the previous state was kept.
    pub empty_scrape: Option<EmptyScrapeWarning>,
    /// The new snapshot is durable (or nothing needed saving).
    pub committed: bool,
    pub snapshot_size: usize,
}

impl RunReport {
    pub fn status(&self) -> RunStatus {
        if self.additions.is_empty() {
            RunStatus::NoChange
        } else {
            RunStatus::Notified
        }
    }

    pub fn partial_dispatch_failure(&self) -> bool {
        !self.dispatch_failures.is_empty()
    }

    fn counts_from(n: &Normalized) -> Self {
        Self {
            skipped_malformed: n.skipped_malformed,
            filtered_tier: n.filtered_tier,
            duplicates: n.duplicates,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct InitReport {
    pub baseline: usize,
    pub skipped_malformed: usize,
    pub empty_scrape: Option<EmptyScrapeWarning>,
}

/// Everything a run needs, passed in explicitly so tests can swap the
/// scraper, store and channels.
pub struct Watcher {
    scraper: Box<dyn Scraper>,
    store: Box<dyn StateStore>,
    normalizer: Normalizer,
    notifier: NotifierMux,
    opts: RunOptions,
}

impl Watcher {
    pub fn new(
        scraper: Box<dyn Scraper>,
        store: Box<dyn StateStore>,
        normalizer: Normalizer,
        notifier: NotifierMux,
        opts: RunOptions,
    ) -> Self {
        metrics::ensure_described();
        Self {
            scraper,
            store,
            normalizer,
            notifier,
            opts,
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.opts
    }

    async fn scrape(&self) -> Result<Vec<RawRecord>, ScrapeError> {
        match tokio::time::timeout(self.opts.scrape_timeout, self.scraper.scrape()).await {
            Ok(res) => res,
            Err(_) => Err(ScrapeError::Timeout(self.opts.scrape_timeout)),
        }
    }

    fn normalize(&self, raw: Vec<RawRecord>) -> Normalized {
        let scraped = raw.len();
        let n = self.normalizer.normalize(raw);
        info!(
            target: "run",
            scraped,
            kept = n.records.len(),
            skipped = n.skipped_malformed,
            filtered = n.filtered_tier,
            duplicates = n.duplicates,
            "normalized"
        );
        n
    }

    /// One full check. Hard failures (scrape, corrupt/unreadable state,
    /// save) come back as `Err`; dispatch failures are in the report.
    pub async fn check_once(&self) -> Result<RunReport, RunError> {
        let res = self.check_once_inner().await;
        if res.is_err() {
            metrics::record_failure();
        }
        res
    }

    async fn check_once_inner(&self) -> Result<RunReport, RunError> {
        // Load first: corrupt state aborts before anything else happens.
        let previous = self.store.load().await?;
        let raw = self.scrape().await?;
        let normalized = self.normalize(raw);
        let mut report = RunReport::counts_from(&normalized);
        let current = normalized.records;

        let delta = match compare(&previous, &current) {
            Comparison::EmptyScrape(w) => {
                warn!(target: "run", previous = w.previous, "{w}");
                metrics::record_empty_scrape();
                report.empty_scrape = Some(w);
                report.committed = true;
                report.snapshot_size = previous.len();
                return Ok(report);
            }
            Comparison::Changes(delta) => delta,
        };

        if delta.additions.is_empty() {
            info!(target: "run", "no new tournaments");
        } else {
            info!(target: "run", count = delta.additions.len(), "new tournaments");
            for r in &delta.additions {
                info!(target: "run", key = %r.key, "new: {}", r.headline());
            }
        }
        if !delta.removals.is_empty() {
            info!(target: "run", count = delta.removals.len(), "no longer listed");
        }

        // Dispatch failures never block the commit.
        report.dispatch_failures = self.notifier.dispatch(&delta.additions).await;

        let next = StateSnapshot::advance(&previous, &current, &delta, self.opts.keep_removed);
        if self.opts.dry_run {
            info!(target: "run", entries = next.len(), "dry run, state not saved");
        } else if next != previous {
            self.store.save(&next).await?;
            info!(target: "run", entries = next.len(), location = %self.store.location(), "state committed");
            report.committed = true;
        } else {
            report.committed = true;
        }

        metrics::record_run(
            delta.additions.len(),
            report.dispatch_failures.len(),
            report.skipped_malformed,
            next.len(),
        );
        report.snapshot_size = next.len();
        report.additions = delta.additions;
        report.removals = delta.removals;
        Ok(report)
    }

    /// Baseline: commit what is listed right now without notifying. Does not
    /// read the previous state, so it also recovers from a corrupt file.
    /// An empty scrape is never committed as a baseline.
    pub async fn initialize(&self) -> Result<InitReport, RunError> {
        let raw = self.scrape().await?;
        let normalized = self.normalize(raw);
        let mut report = InitReport {
            skipped_malformed: normalized.skipped_malformed,
            ..InitReport::default()
        };

        if normalized.records.is_empty() {
            let w = EmptyScrapeWarning { previous: 0 };
            warn!(target: "run", "scrape returned no tournaments; baseline not written");
            report.empty_scrape = Some(w);
            return Ok(report);
        }

        let snapshot = StateSnapshot::from_records(normalized.records);
        report.baseline = snapshot.len();
        if self.opts.dry_run {
            info!(target: "run", entries = snapshot.len(), "dry run, baseline not saved");
            return Ok(report);
        }
        self.store.save(&snapshot).await?;
        info!(target: "run", entries = snapshot.len(), location = %self.store.location(), "state initialized");
        Ok(report)
    }
}
