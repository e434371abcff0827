// src/delta.rs
//! # Delta Engine
//! Set difference between the stored snapshot and a fresh scrape, by
//! identity key only. Pure; no fuzzy matching.
//!
//! Ordering: additions keep the order of `current` (the normalizer's
//! chronological order), removals are sorted by key.

use std::collections::HashSet;

use thiserror::Error;

use crate::record::{IdentityKey, TournamentRecord};
use crate::state::StateSnapshot;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    pub additions: Vec<TournamentRecord>,
    pub removals: Vec<IdentityKey>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }
}

/// A scrape that yielded nothing while the snapshot still remembers
/// tournaments. Almost always a broken scrape, not a wiped listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("scrape returned no tournaments while {previous} are remembered; keeping previous state")]
pub struct EmptyScrapeWarning {
    pub previous: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    Changes(Delta),
    EmptyScrape(EmptyScrapeWarning),
}

/// O(|previous| + |current|) hash-set difference.
pub fn diff(previous: &StateSnapshot, current: &[TournamentRecord]) -> Delta {
    let additions = current
        .iter()
        .filter(|r| !previous.contains(&r.key))
        .cloned()
        .collect();

    let current_keys: HashSet<&IdentityKey> = current.iter().map(|r| &r.key).collect();
    let removals = previous
        .keys()
        .into_iter()
        .filter(|k| !current_keys.contains(k))
        .cloned()
        .collect();

    Delta {
        additions,
        removals,
    }
}

/// [`diff`] behind the empty-scrape guard.
pub fn compare(previous: &StateSnapshot, current: &[TournamentRecord]) -> Comparison {
    if current.is_empty() && !previous.is_empty() {
        return Comparison::EmptyScrape(EmptyScrapeWarning {
            previous: previous.len(),
        });
    }
    Comparison::Changes(diff(previous, current))
}
