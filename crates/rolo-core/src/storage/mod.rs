//! Storage layer
//!
//! The contact store only needs a load/save contract. Two backends ship:
//!
//! - **JSON file**: the default, one pretty-printed document in the data dir
//! - **Memory**: a shared in-process slot for tests and embedding
//!
//! Only the contact list is stored. Selection and search text are
//! session state and start fresh on every launch.

pub mod error;
pub mod memory;
pub mod persistence;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryPersistence;
pub use persistence::{JsonFilePersistence, PersistedState, Persistence};
