//! Command handlers
//!
//! Contacts and fields are addressed by full UUID or by a unique prefix
//! of one, as printed in list output.

pub mod config;
pub mod contact;
pub mod export;
pub mod field;

use anyhow::{anyhow, bail, Result};
use uuid::Uuid;

use rolo_core::{Contact, ContactStore};

/// Parse a contact ID (supports full UUID or prefix)
pub fn parse_contact_id(id: &str, store: &ContactStore) -> Result<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(id) {
        return match store.contact(uuid) {
            Some(_) => Ok(uuid),
            None => bail!("Contact not found: {}", id),
        };
    }

    let matches = store.find_contacts_by_prefix(id);

    match matches.len() {
        0 => bail!("No contact found matching: {}", id),
        1 => Ok(matches[0].id),
        _ => {
            eprintln!("Multiple contacts match '{}':", id);
            for contact in &matches {
                eprintln!("  {} - {}", contact.id, contact.name);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

/// Parse a field ID within a contact (supports full UUID or prefix)
pub fn parse_field_id(id: &str, contact: &Contact) -> Result<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(id) {
        return match contact.field(uuid) {
            Some(_) => Ok(uuid),
            None => bail!("Field not found: {}", id),
        };
    }

    let prefix = id.to_lowercase();
    let matches: Vec<_> = contact
        .fields
        .iter()
        .filter(|f| f.id.to_string().starts_with(&prefix))
        .collect();

    match matches.len() {
        0 => bail!("No field found matching: {}", id),
        1 => Ok(matches[0].id),
        _ => {
            eprintln!("Multiple fields match '{}':", id);
            for field in &matches {
                eprintln!("  {} - {}", &field.id.to_string()[..8], field.label);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

/// Look up a contact by user-supplied ID
pub fn find_contact<'a>(store: &'a ContactStore, id: &str) -> Result<&'a Contact> {
    let uuid = parse_contact_id(id, store)?;
    store
        .contact(uuid)
        .ok_or_else(|| anyhow!("Contact not found: {}", id))
}

/// Fail if the last mutation could not be written to disk
pub fn ensure_saved(store: &ContactStore) -> Result<()> {
    match store.last_save_error() {
        Some(reason) => bail!("Change applied but not saved: {}", reason),
        None => Ok(()),
    }
}
