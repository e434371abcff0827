// src/state/mod.rs
//! The previously-seen snapshot and the stores that persist it.
//!
//! A snapshot is read once per run and replaced wholesale at the end of a
//! successful run. Stores never merge or patch. Nothing here locks: two runs
//! against the same store can both read the same snapshot, notify twice and
//! the later save wins. Callers keep runs from overlapping.

pub mod file;
pub mod memory;

use std::collections::HashMap;

use thiserror::Error;

use crate::delta::Delta;
use crate::record::{IdentityKey, TournamentRecord};

pub use file::FileStateStore;
pub use memory::MemoryStateStore;

#[derive(Debug, Error)]
pub enum StateError {
    /// Persisted state exists but cannot be understood. Never treated as empty.
    #[error("state at {location} is corrupt: {reason}")]
    Corrupt { location: String, reason: String },

    #[error("reading state from {location}: {source}")]
    Read {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// The new snapshot was not durably committed; the previous one is intact.
    #[error("saving state to {location}: {source}")]
    Save {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

impl StateError {
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StateError::Corrupt { .. })
    }
}

/// Keys seen as of the last successful run, each with enough of the record to
/// print it again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    entries: HashMap<IdentityKey, TournamentRecord>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later records with an already-present key replace earlier ones.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = TournamentRecord>,
    {
        let entries = records.into_iter().map(|r| (r.key.clone(), r)).collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&TournamentRecord> {
        self.entries.get(key)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<&IdentityKey> {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        keys
    }

    /// Records sorted by key; this is the on-disk order.
    pub fn records(&self) -> Vec<&TournamentRecord> {
        let mut records: Vec<_> = self.entries.values().collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        records
    }

    /// The snapshot to commit after a run: `previous` minus `delta.removals`
    /// plus every record of `current` (fresh payload wins). With
    /// `keep_removed`, removed keys are retained instead.
    pub fn advance(
        previous: &StateSnapshot,
        current: &[TournamentRecord],
        delta: &Delta,
        keep_removed: bool,
    ) -> StateSnapshot {
        let mut entries = previous.entries.clone();
        if !keep_removed {
            for key in &delta.removals {
                entries.remove(key);
            }
        }
        for record in current {
            entries.insert(record.key.clone(), record.clone());
        }
        StateSnapshot { entries }
    }
}

/// Durable home of the snapshot. Implementations must make `save` all or
/// nothing: after a failed or interrupted save, `load` returns the old
/// snapshot in full.
#[async_trait::async_trait]
pub trait StateStore: Send + Sync {
    /// Empty snapshot only when nothing was ever persisted.
    async fn load(&self) -> Result<StateSnapshot, StateError>;

    async fn save(&self, snapshot: &StateSnapshot) -> Result<(), StateError>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}
