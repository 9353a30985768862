//! Interactive editing support
//!
//! Opens $EDITOR for the free-text "who is this" description.

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::process::Command;

/// Marks the instruction lines at the top of the edit buffer
const COMMENT_PREFIX: &str = "#";

/// Open content in the user's preferred editor
///
/// Uses $EDITOR, $VISUAL, or falls back to common editors.
pub fn edit_text(initial_content: &str) -> Result<String> {
    let editor = find_editor()?;

    let temp_path = env::temp_dir().join(format!("rolo_edit_{}.txt", std::process::id()));

    fs::write(&temp_path, initial_content)
        .with_context(|| format!("Failed to create temp file: {:?}", temp_path))?;

    let status = Command::new(&editor)
        .arg(&temp_path)
        .status()
        .with_context(|| format!("Failed to run editor: {}", editor))?;

    if !status.success() {
        let _ = fs::remove_file(&temp_path);
        bail!(
            "Editor '{}' exited with non-zero status. Check that your editor is configured correctly.",
            editor
        );
    }

    let content = fs::read_to_string(&temp_path)
        .with_context(|| format!("Failed to read edited file: {:?}", temp_path))?;

    let _ = fs::remove_file(&temp_path);

    Ok(content)
}

/// Instruction lines placed above the description
fn who_header(name: &str) -> [String; 2] {
    [
        format!("{} Who is {}?", COMMENT_PREFIX, name),
        format!("{} These two lines are ignored", COMMENT_PREFIX),
    ]
}

/// Edit a contact's description, returning the text without instruction lines
pub fn edit_who(name: &str, current: &str) -> Result<String> {
    let header = who_header(name);
    let template = format!("{}\n{}\n\n{}", header[0], header[1], current);
    let edited = edit_text(&template).context("Failed to edit description")?;
    Ok(strip_header(&edited, &header))
}

/// Drop the leading instruction lines and surrounding blank space
///
/// Only lines matching the header are removed; the description itself may
/// start with the comment prefix.
fn strip_header(content: &str, header: &[String]) -> String {
    let mut lines = content.lines().peekable();
    for expected in header {
        match lines.peek() {
            Some(line) if line.trim_end() == expected.trim_end() => {
                lines.next();
            }
            _ => break,
        }
    }
    lines.collect::<Vec<_>>().join("\n").trim().to_string()
}

/// Find the user's preferred editor
fn find_editor() -> Result<String> {
    if let Ok(editor) = env::var("EDITOR") {
        if !editor.is_empty() {
            return Ok(editor);
        }
    }

    if let Ok(visual) = env::var("VISUAL") {
        if !visual.is_empty() {
            return Ok(visual);
        }
    }

    let common_editors = ["nano", "vim", "vi", "emacs", "code", "notepad"];

    for editor in common_editors {
        if command_exists(editor) {
            return Ok(editor.to_string());
        }
    }

    bail!(
        "No editor found. Set $EDITOR environment variable.\n\
         Example: export EDITOR=nano"
    )
}

/// Check if a command exists in PATH
fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
