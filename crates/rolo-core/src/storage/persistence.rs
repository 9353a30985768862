//! Contact persistence
//!
//! The store talks to durable storage through the [`Persistence`] trait.
//! [`JsonFilePersistence`] keeps the address book as a JSON document and
//! uses atomic writes (write to temp file, then rename) to prevent corruption.
//!
//! Storage location: `~/.local/share/rolo/` (configurable via `Config`)
//!
//! Files:
//! - `contacts.json` - The persisted contact list

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::Contact;
use crate::storage::error::{StorageError, StorageResult};

/// The serializable subset of store state
///
/// Selection and search text are session-only and never written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

impl PersistedState {
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self { contacts }
    }
}

/// Durable storage backend for the contact store
pub trait Persistence {
    /// Load previously saved state
    ///
    /// Returns `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> StorageResult<Option<PersistedState>>;

    /// Replace the saved state
    fn save(&mut self, state: &PersistedState) -> StorageResult<()>;
}

/// Persistence backed by a JSON file in the data directory
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    /// Create a persistence handler writing to an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a persistence handler for the configured data directory
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.contacts_path())
    }

    /// Path of the contacts file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unreadable contacts file is moved
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "contacts.json".into());
        name.push(".corrupt.backup");
        self.path.with_file_name(name)
    }

    /// Move an unparseable file out of the way so the next start is clean
    fn quarantine(&self, details: String) -> StorageError {
        let backup_path = self.backup_path();
        if let Err(e) = fs::rename(&self.path, &backup_path) {
            warn!("Could not move corrupt contacts file aside: {}", e);
        }
        StorageError::CorruptDocument {
            path: self.path.clone(),
            backup_path,
            details,
        }
    }
}

impl Persistence for JsonFilePersistence {
    fn load(&self) -> StorageResult<Option<PersistedState>> {
        if !self.path.exists() {
            debug!("No contacts file at {:?}", self.path);
            return Ok(None);
        }

        let bytes = fs::read(&self.path).map_err(|e| StorageError::read(self.path.clone(), e))?;

        match serde_json::from_slice::<PersistedState>(&bytes) {
            Ok(state) => {
                info!(
                    "Loaded {} contact(s) from {:?}",
                    state.contacts.len(),
                    self.path
                );
                Ok(Some(state))
            }
            Err(e) => Err(self.quarantine(e.to_string())),
        }
    }

    fn save(&mut self, state: &PersistedState) -> StorageResult<()> {
        let bytes = serde_json::to_vec_pretty(state)?;
        atomic_write(&self.path, &bytes)?;
        debug!("Saved {} contact(s) to {:?}", state.contacts.len(), self.path);
        Ok(())
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// This ensures the target file is never left in a partially-written state.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    // Same directory so the rename stays on one filesystem
    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::write(temp_path.clone(), e))?;
    file.write_all(data)
        .map_err(|e| StorageError::write(temp_path.clone(), e))?;
    file.sync_all()
        .map_err(|e| StorageError::write(temp_path.clone(), e))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::Replace {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContactField;
    use tempfile::TempDir;

    fn test_persistence(temp_dir: &TempDir) -> JsonFilePersistence {
        JsonFilePersistence::new(temp_dir.path().join("contacts.json"))
    }

    fn sample_state() -> PersistedState {
        let mut alice = Contact::new("Alice");
        alice.who = "sister".to_string();
        alice.is_favorite = true;
        let mut email = ContactField::new("Email", "alice@example.com");
        email.is_editing = false;
        alice.fields.push(email);
        PersistedState::new(vec![alice, Contact::new("Bob")])
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let mut persistence = test_persistence(&temp_dir);

        assert!(!persistence.path().exists());
        assert!(persistence.load().unwrap().is_none());

        let state = sample_state();
        persistence.save(&state).unwrap();
        assert!(persistence.path().exists());

        let loaded = persistence.load().unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_save_overwrites_previous_state() {
        let temp_dir = TempDir::new().unwrap();
        let mut persistence = test_persistence(&temp_dir);

        persistence.save(&sample_state()).unwrap();
        persistence.save(&PersistedState::default()).unwrap();

        let loaded = persistence.load().unwrap().unwrap();
        assert!(loaded.contacts.is_empty());
        assert!(!temp_dir.path().join("contacts.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_moved_aside() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = test_persistence(&temp_dir);
        fs::write(persistence.path(), b"{ not json").unwrap();

        let err = persistence.load().unwrap_err();
        assert!(matches!(err, StorageError::CorruptDocument { .. }));

        assert!(!persistence.path().exists());
        assert!(persistence.backup_path().exists());
        assert!(persistence
            .backup_path()
            .ends_with("contacts.json.corrupt.backup"));

        // Next load starts clean
        assert!(persistence.load().unwrap().is_none());
    }

    #[test]
    fn test_missing_contacts_key_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = test_persistence(&temp_dir);
        fs::write(persistence.path(), b"{}").unwrap();

        let loaded = persistence.load().unwrap().unwrap();
        assert!(loaded.contacts.is_empty());
    }

    #[test]
    fn test_unwritable_directory_is_classified() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the data directory should be
        let blocker = temp_dir.path().join("data");
        fs::write(&blocker, b"").unwrap();
        let mut persistence = JsonFilePersistence::new(blocker.join("contacts.json"));

        let err = persistence.save(&sample_state()).unwrap_err();
        assert!(matches!(err, StorageError::CreateDirectory { .. }));
        assert!(err.hint().is_some());
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir
            .path()
            .join("a")
            .join("b")
            .join("c")
            .join("file.txt");

        atomic_write(&nested_path, b"test data").unwrap();

        assert!(nested_path.exists());
        let content = fs::read_to_string(&nested_path).unwrap();
        assert_eq!(content, "test data");
    }

    #[test]
    fn test_from_config_uses_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };

        let persistence = JsonFilePersistence::from_config(&config);
        assert_eq!(persistence.path(), temp_dir.path().join("contacts.json"));
    }
}
