// src/state/file.rs
//! JSON file store with rename-based commits.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{StateError, StateSnapshot, StateStore};
use crate::record::TournamentRecord;

pub const DEFAULT_STATE_PATH: &str = ".padel_state.json";
pub const STATE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    version: u32,
    saved_at: DateTime<Utc>,
    tournaments: Vec<TournamentRecord>,
}

#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn corrupt(&self, reason: impl ToString) -> StateError {
        StateError::Corrupt {
            location: self.location(),
            reason: reason.to_string(),
        }
    }

    fn save_err(&self, source: io::Error) -> StateError {
        StateError::Save {
            location: self.location(),
            source,
        }
    }

    /// Accepts the versioned envelope and the bare `[[club, date, heure, nom], ...]`
    /// list written by the earlier tool.
    fn decode(&self, bytes: &[u8]) -> Result<StateSnapshot, StateError> {
        let value: serde_json::Value = serde_json::from_slice(bytes).map_err(|e| self.corrupt(e))?;

        if value.is_array() {
            let keys: Vec<Vec<String>> = serde_json::from_value(value).map_err(|e| self.corrupt(e))?;
            let mut records = Vec::with_capacity(keys.len());
            for parts in keys {
                let arity = parts.len();
                let record = TournamentRecord::from_legacy_key(parts)
                    .ok_or_else(|| self.corrupt(format!("legacy key with {arity} fields, expected 4")))?;
                records.push(record);
            }
            tracing::info!(count = records.len(), "loaded legacy state format");
            return Ok(StateSnapshot::from_records(records));
        }

        let persisted: PersistedState = serde_json::from_value(value).map_err(|e| self.corrupt(e))?;
        if persisted.version != STATE_FORMAT_VERSION {
            return Err(self.corrupt(format!(
                "unsupported state version {} (expected {STATE_FORMAT_VERSION})",
                persisted.version
            )));
        }
        if let Some(blank) = persisted.tournaments.iter().find(|r| r.key.is_blank()) {
            return Err(self.corrupt(format!("blank identity key for '{}'", blank.nom)));
        }
        Ok(StateSnapshot::from_records(persisted.tournaments))
    }

    fn encode(snapshot: &StateSnapshot) -> Result<Vec<u8>, serde_json::Error> {
        let persisted = PersistedState {
            version: STATE_FORMAT_VERSION,
            saved_at: Utc::now(),
            tournaments: snapshot.records().into_iter().cloned().collect(),
        };
        serde_json::to_vec_pretty(&persisted)
    }

    /// First half of a save: the full payload lands in the temp file and is
    /// flushed to disk. The live file is untouched.
    pub(crate) async fn write_temp(&self, bytes: &[u8]) -> io::Result<PathBuf> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }
        let tmp = self.tmp_path();
        let mut f = fs::File::create(&tmp).await?;
        f.write_all(bytes).await?;
        f.sync_all().await?;
        Ok(tmp)
    }

    /// Second half: swap the temp file into place.
    pub(crate) async fn commit(&self, tmp: &Path) -> io::Result<()> {
        fs::rename(tmp, &self.path).await?;
        // Persist the directory entry too; not every platform allows opening a dir.
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if let Ok(d) = fs::File::open(dir).await {
                if let Err(e) = d.sync_all().await {
                    tracing::debug!(error = %e, "state dir fsync skipped");
                }
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> Result<StateSnapshot, StateError> {
        match fs::read(&self.path).await {
            Ok(bytes) => self.decode(&bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no state yet, starting empty");
                Ok(StateSnapshot::new())
            }
            Err(source) => Err(StateError::Read {
                location: self.location(),
                source,
            }),
        }
    }

    async fn save(&self, snapshot: &StateSnapshot) -> Result<(), StateError> {
        let bytes = Self::encode(snapshot).map_err(|e| self.save_err(io::Error::other(e)))?;

        let tmp = match self.write_temp(&bytes).await {
            Ok(tmp) => tmp,
            Err(e) => {
                let _ = fs::remove_file(self.tmp_path()).await;
                return Err(self.save_err(e));
            }
        };
        if let Err(e) = self.commit(&tmp).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(self.save_err(e));
        }

        tracing::debug!(path = %self.path.display(), entries = snapshot.len(), "state committed");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
