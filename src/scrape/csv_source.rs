// src/scrape/csv_source.rs
//! Reads the CSV written by the browser scraper, optionally running that
//! scraper first.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::{ScrapeError, Scraper};
use crate::record::RawRecord;

pub const DEFAULT_CSV_PATH: &str = "tournois_4padel.csv";

/// External program that refreshes the CSV (e.g. `python3 4padel.py`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshCommand {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl RefreshCommand {
    /// `None` for an empty argv.
    pub fn from_argv(argv: &[String], timeout: Duration) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
        })
    }

    fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    async fn run(&self) -> Result<(), ScrapeError> {
        let command = self.display();
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ScrapeError::Refresh {
                command: command.clone(),
                reason: e.to_string(),
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(res) => res.map_err(|e| ScrapeError::Refresh {
                command: command.clone(),
                reason: e.to_string(),
            })?,
            Err(_) => {
                return Err(ScrapeError::RefreshTimeout {
                    command,
                    timeout: self.timeout,
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!(target: "scrape", output = %stdout.trim(), "refresh stdout");
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScrapeError::Refresh {
                command,
                reason: format!("{} {}", output.status, stderr.trim()),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CsvScraper {
    csv_path: PathBuf,
    refresh: Option<RefreshCommand>,
}

impl CsvScraper {
    pub fn new(csv_path: impl Into<PathBuf>) -> Self {
        Self {
            csv_path: csv_path.into(),
            refresh: None,
        }
    }

    pub fn with_refresh(mut self, refresh: Option<RefreshCommand>) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

/// Parse CSV text with a header row into raw records. Columns are kept as-is;
/// the normalizer resolves names. Short rows simply lack the trailing
/// columns, so the normalizer drops them as malformed instead of the whole
/// scrape failing.
pub fn parse_csv(content: &str) -> Result<Vec<RawRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let headers = reader.headers()?.clone();

    let mut out = Vec::new();
    for row in reader.records() {
        let row = row?;
        let fields: BTreeMap<String, String> = headers
            .iter()
            .zip(row.iter())
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        out.push(RawRecord { fields });
    }
    Ok(out)
}

#[async_trait::async_trait]
impl Scraper for CsvScraper {
    async fn scrape(&self) -> Result<Vec<RawRecord>, ScrapeError> {
        if let Some(refresh) = &self.refresh {
            let t0 = std::time::Instant::now();
            refresh.run().await?;
            tracing::info!(
                target: "scrape",
                command = %refresh.display(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "refresh finished"
            );
        }

        let content = match tokio::fs::read_to_string(&self.csv_path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ScrapeError::MissingOutput(self.csv_path.clone()))
            }
            Err(e) => {
                return Err(ScrapeError::Unreadable {
                    path: self.csv_path.clone(),
                    reason: e.to_string(),
                })
            }
        };

        parse_csv(&content).map_err(|e| ScrapeError::Unreadable {
            path: self.csv_path.clone(),
            reason: e.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_rows_and_tolerates_short_lines() {
        let csv = "niveau,club,nom,date,heure\nP100,Club A,Soirée,09/01/2026,17:00\nP250,Club B\n";
        let rows = parse_csv(csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].field(&["club"]), Some("Club A"));
        assert_eq!(rows[1].field(&["nom"]), None);
    }

    #[test]
    fn empty_argv_means_no_refresh() {
        assert!(RefreshCommand::from_argv(&[], Duration::from_secs(1)).is_none());
        let cmd = RefreshCommand::from_argv(
            &["python3".to_string(), "4padel.py".to_string()],
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(cmd.display(), "python3 4padel.py");
    }
}
