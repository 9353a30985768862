//! Rolo Core Library
//!
//! This crate provides the core functionality for Rolo, a local-first
//! personal address book: contacts with free-form labelled fields, a
//! favorite flag and a short "who is this" note.
//!
//! # Architecture
//!
//! - **ContactStore**: single owner of all contacts and view state
//! - **Persistence**: best-effort mirror of the contact list (JSON file)
//!
//! All queries are served directly from memory.
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let mut store = ContactStore::open_with_config(&config)?;
//!
//! // Add a contact with a field
//! let alice = store.add_contact("Alice");
//! store.add_field(alice, NewField::new("Email", "alice@example.com"));
//!
//! // Query contacts
//! store.set_search_query("ali");
//! let visible = store.filtered_contacts();
//! ```
//!
//! # Modules
//!
//! - `store`: Contact store (main entry point)
//! - `models`: Contacts, fields and update patches
//! - `filter`: Search and sort helpers for display
//! - `export`: Markdown and PDF rendering
//! - `storage`: Persistence backends
//! - `config`: Application configuration

pub mod config;
pub mod export;
pub mod filter;
pub mod models;
pub mod storage;
pub mod store;

pub use config::Config;
pub use export::{ContactSnapshot, ExportError, ExportField, ExportFormat};
pub use filter::SortDirection;
pub use models::{Contact, ContactField, ContactPatch, FieldPatch, NewField, PLACEHOLDER_LABEL};
pub use storage::{
    JsonFilePersistence, MemoryPersistence, PersistedState, Persistence, StorageError,
};
pub use store::{ContactStore, StoreEvent, SubscriptionId};
