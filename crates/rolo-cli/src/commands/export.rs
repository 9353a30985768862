//! Export command handler

use std::path::PathBuf;

use anyhow::{Context, Result};

use rolo_core::export::export_to_dir;
use rolo_core::{Config, ContactSnapshot, ContactStore, ExportFormat};

use super::find_contact;
use crate::output::Output;

/// Write a contact to Markdown or PDF
pub fn export(
    store: &ContactStore,
    config: &Config,
    contact_id: String,
    format: ExportFormat,
    out: Option<PathBuf>,
    open_after: bool,
    output: &Output,
) -> Result<()> {
    let contact = find_contact(store, &contact_id)?;
    let dir = out.unwrap_or_else(|| config.export_dir.clone());

    let path = export_to_dir(&ContactSnapshot::from(contact), format, &dir)
        .with_context(|| format!("Failed to export '{}'", contact.name))?;

    output.print_path(&path);

    if open_after {
        open::that(&path).with_context(|| format!("Failed to open {:?}", path))?;
    }
    Ok(())
}
