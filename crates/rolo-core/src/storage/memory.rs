//! In-memory persistence
//!
//! Handy for tests and for embedding the store without touching disk.
//! Clones share the same slot, so a test can keep one handle and give
//! another to the store.

use std::cell::RefCell;
use std::rc::Rc;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::persistence::{PersistedState, Persistence};

#[derive(Debug, Default)]
struct Slot {
    state: Option<PersistedState>,
    saves: usize,
    fail_with: Option<String>,
}

/// Persistence that keeps the last saved state in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    slot: Rc<RefCell<Slot>>,
}

impl MemoryPersistence {
    /// Empty backend: `load` returns `None`
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-populated with saved state
    pub fn with_state(state: PersistedState) -> Self {
        let backend = Self::default();
        backend.slot.borrow_mut().state = Some(state);
        backend
    }

    /// Last saved state
    pub fn stored(&self) -> Option<PersistedState> {
        self.slot.borrow().state.clone()
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.slot.borrow().saves
    }

    /// Make subsequent saves fail with `reason`; `None` restores normal saves
    pub fn set_failure(&self, reason: Option<&str>) {
        self.slot.borrow_mut().fail_with = reason.map(str::to_string);
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self) -> StorageResult<Option<PersistedState>> {
        Ok(self.slot.borrow().state.clone())
    }

    fn save(&mut self, state: &PersistedState) -> StorageResult<()> {
        let mut slot = self.slot.borrow_mut();
        if let Some(reason) = &slot.fail_with {
            return Err(StorageError::Rejected(reason.clone()));
        }
        slot.state = Some(state.clone());
        slot.saves += 1;
        Ok(())
    }
}
