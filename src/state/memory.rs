// src/state/memory.rs
use std::sync::{Arc, Mutex, PoisonError};

use super::{StateError, StateSnapshot, StateStore};

/// In-process store. Clones share the same slot, so a test can keep a handle
/// and inspect what a run committed.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    slot: Arc<Mutex<Option<StateSnapshot>>>,
    saves: Arc<Mutex<usize>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: StateSnapshot) -> Self {
        let store = Self::new();
        *store.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
        store
    }

    /// What is currently committed, if anything.
    pub fn committed(&self) -> Option<StateSnapshot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<StateSnapshot, StateError> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_default())
    }

    async fn save(&self, snapshot: &StateSnapshot) -> Result<(), StateError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
