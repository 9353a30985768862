//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use std::path::Path;

use serde::Serialize;

use rolo_core::{Contact, ContactField};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a single contact with all of its fields
    pub fn print_contact(&self, contact: &Contact, fields: &[&ContactField]) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", contact.id);
                println!("Name:     {}", contact.name);
                println!("Favorite: {}", if contact.is_favorite { "yes" } else { "no" });
                if !contact.who.is_empty() {
                    println!("Who:      {}", first_line(&contact.who));
                    for line in contact.who.lines().skip(1) {
                        println!("          {}", line);
                    }
                }

                println!();
                if fields.is_empty() {
                    println!("── No fields ──");
                } else {
                    println!("── Fields ({}) ──", fields.len());
                    for field in fields {
                        println!(
                            "{} | {}: {}",
                            short_id(&field.id),
                            field.label,
                            field.value
                        );
                    }
                }
            }
            OutputFormat::Json => print_json(contact),
            OutputFormat::Quiet => {
                println!("{}", contact.id);
            }
        }
    }

    /// Print a list of contacts
    pub fn print_contacts(&self, contacts: &[&Contact]) {
        match self.format {
            OutputFormat::Human => {
                if contacts.is_empty() {
                    println!("No contacts found.");
                    return;
                }
                for contact in contacts {
                    let star = if contact.is_favorite { "★" } else { " " };
                    let fields_indicator = if contact.fields.is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", contact.fields.len())
                    };
                    println!(
                        "{} | {} {}{} | {}",
                        short_id(&contact.id),
                        star,
                        truncate(&contact.name, 35),
                        fields_indicator,
                        truncate(first_line(&contact.who), 40)
                    );
                }
                println!("\n{} contact(s)", contacts.len());
            }
            OutputFormat::Json => print_json(&contacts),
            OutputFormat::Quiet => {
                for contact in contacts {
                    println!("{}", contact.id);
                }
            }
        }
    }

    /// Print fields of a contact in display order
    pub fn print_fields(&self, contact: &Contact, fields: &[&ContactField]) {
        match self.format {
            OutputFormat::Human => {
                println!("Fields for: {} - {}", short_id(&contact.id), contact.name);
                println!();

                if fields.is_empty() {
                    println!("No fields found.");
                    return;
                }
                for field in fields {
                    println!(
                        "{} | {} | {}: {}",
                        short_id(&field.id),
                        field.created_at.format("%Y-%m-%d %H:%M"),
                        field.label,
                        truncate(&field.value, 50)
                    );
                }
                println!("\n{} field(s)", fields.len());
            }
            OutputFormat::Json => print_json(&fields),
            OutputFormat::Quiet => {
                for field in fields {
                    println!("{}", field.id);
                }
            }
        }
    }

    /// Print a single field
    pub fn print_field(&self, field: &ContactField) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:      {}", field.id);
                println!("Label:   {}", field.label);
                println!("Value:   {}", field.value);
                println!("Created: {}", field.created_at.format("%Y-%m-%d %H:%M"));
            }
            OutputFormat::Json => print_json(field),
            OutputFormat::Quiet => {
                println!("{}", field.id);
            }
        }
    }

    /// Print the location of a written file
    pub fn print_path(&self, path: &Path) {
        match self.format {
            OutputFormat::Human => println!("✓ Exported to {}", path.display()),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"status": "success", "path": path}));
            }
            OutputFormat::Quiet => println!("{}", path.display()),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a non-fatal warning to stderr
    pub fn warn(&self, message: &str) {
        if !self.is_quiet() {
            eprintln!("⚠ {}", message);
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode JSON: {}", e),
    }
}

/// First eight characters of an id, as accepted by prefix lookup
pub fn short_id(id: &uuid::Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("")
}
