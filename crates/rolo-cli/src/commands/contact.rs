//! Contact command handlers

use anyhow::{bail, Result};

use rolo_core::filter::visible_fields;
use rolo_core::{ContactPatch, ContactStore, SortDirection};

use super::{ensure_saved, find_contact, parse_contact_id};
use crate::editor::{confirm, edit_who};
use crate::output::{short_id, Output};

/// Create a new contact
pub fn add(store: &mut ContactStore, name: String, output: &Output) -> Result<()> {
    let name = name.trim().to_string();
    if name.is_empty() {
        bail!("Contact name cannot be empty");
    }

    let id = store.add_contact(name);
    ensure_saved(store)?;

    output.success(&format!("Created contact: {}", id));
    if let Some(contact) = store.contact(id) {
        output.print_contact(contact, &[]);
    }

    Ok(())
}

/// List contacts, optionally filtered by name and favorite flag
pub fn list(
    store: &mut ContactStore,
    search: Option<String>,
    favorites: bool,
    output: &Output,
) -> Result<()> {
    store.set_search_query(search.unwrap_or_default());
    store.set_show_favorites_only(favorites);

    output.print_contacts(&store.filtered_contacts());
    Ok(())
}

/// Show a single contact with its fields
pub fn show(store: &ContactStore, id: String, sort: SortDirection, output: &Output) -> Result<()> {
    let contact = find_contact(store, &id)?;
    let fields = visible_fields(&contact.fields, "", sort);

    output.print_contact(contact, &fields);
    Ok(())
}

/// Rename a contact
pub fn rename(store: &mut ContactStore, id: String, name: String, output: &Output) -> Result<()> {
    let uuid = parse_contact_id(&id, store)?;
    let name = name.trim().to_string();
    if name.is_empty() {
        bail!("Contact name cannot be empty");
    }

    if store.update_contact(uuid, ContactPatch::default().with_name(name.clone())) {
        ensure_saved(store)?;
        output.success(&format!("Renamed contact to '{}'", name));
    } else {
        output.message("Name unchanged.");
    }

    Ok(())
}

/// Delete a contact
pub fn delete(store: &mut ContactStore, id: String, yes: bool, output: &Output) -> Result<()> {
    let contact = find_contact(store, &id)?;
    let uuid = contact.id;

    if !yes && output.should_prompt() {
        println!("Delete contact: {} - {}", short_id(&uuid), contact.name);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.delete_contact(uuid);
    ensure_saved(store)?;

    output.success(&format!("Deleted contact: {}", uuid));
    Ok(())
}

/// Toggle the favorite flag
pub fn favorite(store: &mut ContactStore, id: String, output: &Output) -> Result<()> {
    let uuid = parse_contact_id(&id, store)?;

    store.toggle_favorite(uuid);
    ensure_saved(store)?;

    if let Some(contact) = store.contact(uuid) {
        if contact.is_favorite {
            output.success(&format!("Marked '{}' as favorite", contact.name));
        } else {
            output.success(&format!("Removed '{}' from favorites", contact.name));
        }
    }
    Ok(())
}

/// Set the "who is this" description, opening the editor when no text is given
pub fn who(
    store: &mut ContactStore,
    id: String,
    text: Option<String>,
    output: &Output,
) -> Result<()> {
    let contact = find_contact(store, &id)?;
    let uuid = contact.id;

    let text = match text {
        Some(t) => t,
        None => edit_who(&contact.name, &contact.who)?,
    };

    if store.set_who(uuid, text) {
        ensure_saved(store)?;
        output.success("Description updated");
    } else {
        output.message("Description unchanged.");
    }

    Ok(())
}
