// src/scrape/mod.rs
pub mod csv_source;

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::record::RawRecord;

pub use csv_source::{CsvScraper, RefreshCommand};

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("refresh command `{command}` failed: {reason}")]
    Refresh { command: String, reason: String },

    #[error("refresh command `{command}` timed out after {timeout:?}")]
    RefreshTimeout { command: String, timeout: Duration },

    #[error("scraper output {0} not found")]
    MissingOutput(PathBuf),

    #[error("reading scraper output {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("scrape timed out after {0:?}")]
    Timeout(Duration),
}

/// Where raw tournament rows come from.
#[async_trait::async_trait]
pub trait Scraper: Send + Sync {
    async fn scrape(&self) -> Result<Vec<RawRecord>, ScrapeError>;
    fn name(&self) -> &'static str;
}

/// Fixed rows; handy for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct StaticScraper {
    pub rows: Vec<RawRecord>,
}

impl StaticScraper {
    pub fn new(rows: Vec<RawRecord>) -> Self {
        Self { rows }
    }
}

#[async_trait::async_trait]
impl Scraper for StaticScraper {
    async fn scrape(&self) -> Result<Vec<RawRecord>, ScrapeError> {
        Ok(self.rows.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
