//! Storage errors
//!
//! Failures of the contact file backend, classified so that the CLI and TUI
//! can tell the user what went wrong and what to do about it.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or saving contacts
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Could not create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Permission denied for '{path}'.")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No space left while writing '{path}'.")]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The temp file was written but could not replace the contacts file
    #[error("Could not replace '{to}' with '{from}': {source}")]
    Replace {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Stored contacts could not be parsed; the file was moved aside
    #[error("Contacts file '{path}' is corrupted: {details}. It has been moved to '{backup_path}'.")]
    CorruptDocument {
        path: PathBuf,
        backup_path: PathBuf,
        details: String,
    },

    #[error("Failed to encode contacts: {0}")]
    Encode(#[from] serde_json::Error),

    /// In-memory backend configured to reject writes
    #[error("Save rejected: {0}")]
    Rejected(String),
}

impl StorageError {
    /// Classify a failed read of `path`
    pub fn read(path: PathBuf, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied { path, source },
            _ => StorageError::Read { path, source },
        }
    }

    /// Classify a failed write of `path`
    pub fn write(path: PathBuf, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied { path, source },
            _ if is_out_of_space(&source) => StorageError::DiskFull { path, source },
            _ => StorageError::Write { path, source },
        }
    }

    /// What the user can do about it, when there is something
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            StorageError::DiskFull { .. } => Some("Free up disk space and try again."),
            StorageError::PermissionDenied { .. } | StorageError::CreateDirectory { .. } => {
                Some("Check permissions on the rolo data directory, or point data_dir elsewhere.")
            }
            StorageError::CorruptDocument { .. } => {
                Some("rolo started with an empty address book; entries can be recovered from the backup by hand.")
            }
            _ => None,
        }
    }

    /// Message for the user: the error followed by its hint
    pub fn report(&self) -> String {
        match self.hint() {
            Some(hint) => format!("{} {}", self, hint),
            None => self.to_string(),
        }
    }
}

fn is_out_of_space(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left") || msg.contains("quota exceeded") || msg.contains("disk full")
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
