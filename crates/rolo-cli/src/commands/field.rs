//! Field command handlers
//!
//! Fields added from the command line are committed right away: they are
//! created through the store (which opens them for editing) and then
//! closed with their final label and value.

use anyhow::{bail, Result};

use rolo_core::filter::visible_fields;
use rolo_core::{ContactStore, FieldPatch, NewField, SortDirection, PLACEHOLDER_LABEL};

use super::{ensure_saved, find_contact, parse_contact_id, parse_field_id};
use crate::output::Output;

/// Reject labels and values the discard rule would throw away
fn validate(label: Option<&str>, value: Option<&str>) -> Result<()> {
    if let Some(label) = label {
        if label.trim().is_empty() {
            bail!("Field label cannot be empty");
        }
        if label.trim().eq_ignore_ascii_case(PLACEHOLDER_LABEL) {
            bail!("'{}' is reserved for unsaved fields; pick another label", PLACEHOLDER_LABEL);
        }
    }
    if let Some(value) = value {
        if value.trim().is_empty() {
            bail!("Field value cannot be empty");
        }
    }
    Ok(())
}

/// Add a field to a contact
pub fn add(
    store: &mut ContactStore,
    contact_id: String,
    label: String,
    value: String,
    output: &Output,
) -> Result<()> {
    validate(Some(&label), Some(&value))?;
    let contact_uuid = parse_contact_id(&contact_id, store)?;

    let Some(field_id) = store.add_field(contact_uuid, NewField::new(label.trim(), value)) else {
        bail!("Contact not found: {}", contact_id);
    };
    store.update_field(
        contact_uuid,
        field_id,
        FieldPatch::default().with_editing(false),
    );
    ensure_saved(store)?;

    output.success(&format!("Added field {} to {}", &field_id.to_string()[..8], contact_id));
    if let Some(field) = store.contact(contact_uuid).and_then(|c| c.field(field_id)) {
        output.print_field(field);
    }
    Ok(())
}

/// List fields of a contact
pub fn list(
    store: &ContactStore,
    contact_id: String,
    search: Option<String>,
    sort: SortDirection,
    output: &Output,
) -> Result<()> {
    let contact = find_contact(store, &contact_id)?;
    let fields = visible_fields(&contact.fields, search.as_deref().unwrap_or(""), sort);

    output.print_fields(contact, &fields);
    Ok(())
}

/// Change a field's label and/or value
pub fn set(
    store: &mut ContactStore,
    contact_id: String,
    field_id: String,
    label: Option<String>,
    value: Option<String>,
    output: &Output,
) -> Result<()> {
    if label.is_none() && value.is_none() {
        bail!("Nothing to change. Pass --label and/or --value.");
    }
    validate(label.as_deref(), value.as_deref())?;

    let contact = find_contact(store, &contact_id)?;
    let contact_uuid = contact.id;
    let field_uuid = parse_field_id(&field_id, contact)?;

    let mut patch = FieldPatch::default();
    if let Some(label) = label {
        patch = patch.with_label(label.trim());
    }
    if let Some(value) = value {
        patch = patch.with_value(value);
    }

    if store.update_field(contact_uuid, field_uuid, patch) {
        ensure_saved(store)?;
        output.success("Field updated");
    } else {
        output.message("Field unchanged.");
    }
    Ok(())
}

/// Remove a field from a contact
pub fn delete(
    store: &mut ContactStore,
    contact_id: String,
    field_id: String,
    output: &Output,
) -> Result<()> {
    let contact = find_contact(store, &contact_id)?;
    let contact_uuid = contact.id;
    let field_uuid = parse_field_id(&field_id, contact)?;

    store.delete_field(contact_uuid, field_uuid);
    ensure_saved(store)?;

    output.success(&format!("Deleted field: {}", &field_uuid.to_string()[..8]));
    Ok(())
}
