//! Rolo TUI
//!
//! Terminal user interface for Rolo - a personal address book.
//!
//! ## Layout
//!
//! Two-pane layout:
//! - Left: Contacts (filtered by search and favorites)
//! - Right: Fields of the selected contact, under its "who" description
//!
//! ## Navigation
//!
//! - j/k or ↑/↓: Move selection up/down
//! - g/G: Jump to first/last
//! - Enter or l: Open the highlighted contact
//! - Esc or h: Back to the contact list
//! - q: Quit
//!
//! ## Contacts
//!
//! - a: Add contact
//! - r: Rename
//! - w: Edit "who is this" in $EDITOR
//! - f: Toggle favorite
//! - F: Show favorites only
//! - d: Delete (asks y/n)
//! - x: Export (md/pdf)
//! - /: Search
//!
//! ## Fields
//!
//! - n: New field
//! - Enter/e: Edit field (Tab switches label/value, Enter saves, Esc cancels)
//! - D: Delete field
//! - s: Flip sort order
//! - /: Search fields

mod app;
mod ui;

use std::io::stdout;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use rolo_core::{Config, ContactStore};
use tracing::info;

use app::{ActivePane, App, CommandResult, EditorTask, InputMode, PromptKind};

use crate::editor;
use crate::logging::init_tui_logging;

/// Run the TUI application
pub fn run(config: &Config) -> Result<()> {
    // File-based, only if ROLO_LOG is set
    init_tui_logging(config);

    let mut store = ContactStore::open_with_config(config)?;
    let mut app = App::new(&mut store, config);
    if let Some(warning) = store.take_load_warning() {
        app.set_status(warning);
    }
    info!("Starting TUI with {} contact(s)", store.contact_count());

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_app(&mut terminal, &mut app, &mut store);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    store: &mut ContactStore,
) -> Result<()> {
    loop {
        app.drain_events(store);
        app.check_status_timeout();

        terminal.draw(|frame| ui::draw(frame, app, store))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        // Only handle key press events (not release)
        if key.kind != KeyEventKind::Press {
            continue;
        }

        // If help is showing, any key dismisses it
        if app.show_help {
            app.show_help = false;
            continue;
        }

        if let CommandResult::NeedEditor(task) = handle_key(app, store, key.code, key.modifiers) {
            run_editor_task(terminal, app, store, task)?;
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Dispatch a key press according to the input mode
fn handle_key(
    app: &mut App,
    store: &mut ContactStore,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> CommandResult {
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return CommandResult::Done;
    }

    match app.input_mode {
        InputMode::Normal => return handle_normal_mode(app, store, code),
        InputMode::Filter => handle_filter_mode(app, store, code),
        InputMode::Prompt => handle_prompt_mode(app, store, code),
        InputMode::EditField => handle_editor_mode(app, store, code),
        InputMode::Confirm => handle_confirm_mode(app, store, code),
    }
    CommandResult::Done
}

/// Handle key events in normal mode
fn handle_normal_mode(app: &mut App, store: &mut ContactStore, code: KeyCode) -> CommandResult {
    // Keys shared by both panes
    match code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            return CommandResult::Done;
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.move_up();
            return CommandResult::Done;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.move_down(store);
            return CommandResult::Done;
        }
        KeyCode::Char('g') => {
            app.move_to_first();
            return CommandResult::Done;
        }
        KeyCode::Char('G') => {
            app.move_to_last(store);
            return CommandResult::Done;
        }
        KeyCode::Char('/') => {
            app.enter_filter_mode(store);
            return CommandResult::Done;
        }
        KeyCode::Char('?') => {
            app.toggle_help();
            return CommandResult::Done;
        }
        _ => {}
    }

    match app.active_pane {
        ActivePane::Contacts => match code {
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => app.select_current(store),
            KeyCode::Char('a') => app.begin_prompt(PromptKind::AddContact, store),
            KeyCode::Char('r') => app.begin_prompt(PromptKind::Rename, store),
            KeyCode::Char('x') => app.begin_prompt(PromptKind::Export, store),
            KeyCode::Char('w') => return app.edit_who(store),
            KeyCode::Char('f') => app.toggle_favorite(store),
            KeyCode::Char('F') => app.toggle_favorites_filter(store),
            KeyCode::Char('d') => app.request_delete(store),
            KeyCode::Esc => {
                if !store.contact_search_query().is_empty() {
                    app.clear_filter(store);
                }
            }
            _ => {}
        },
        ActivePane::Fields => match code {
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::Left => app.back(store),
            KeyCode::Char('n') => app.add_field(store),
            KeyCode::Enter | KeyCode::Char('e') => app.edit_current_field(store),
            KeyCode::Char('D') => app.delete_current_field(store),
            KeyCode::Char('s') => app.flip_sort(),
            _ => {}
        },
    }

    CommandResult::Done
}

/// Handle key events in filter mode
fn handle_filter_mode(app: &mut App, store: &mut ContactStore, code: KeyCode) {
    match code {
        // Cancel filter
        KeyCode::Esc => app.clear_filter(store),
        // Confirm filter (stay in filtered view)
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
            app.input.clear();
        }
        KeyCode::Char(c) => {
            app.input.insert(c);
            app.apply_filter_input(store);
        }
        KeyCode::Backspace => {
            app.input.backspace();
            app.apply_filter_input(store);
        }
        KeyCode::Left => app.input.left(),
        KeyCode::Right => app.input.right(),
        _ => {}
    }
}

/// Handle key events while a prompt is open
fn handle_prompt_mode(app: &mut App, store: &mut ContactStore, code: KeyCode) {
    match code {
        KeyCode::Esc => app.exit_input_mode(),
        KeyCode::Enter => app.submit_prompt(store),
        KeyCode::Char(c) => app.input.insert(c),
        KeyCode::Backspace => app.input.backspace(),
        KeyCode::Left => app.input.left(),
        KeyCode::Right => app.input.right(),
        _ => {}
    }
}

/// Handle key events in the field editor
fn handle_editor_mode(app: &mut App, store: &mut ContactStore, code: KeyCode) {
    match code {
        KeyCode::Esc => app.cancel_editor(store),
        KeyCode::Enter => app.save_editor(store),
        KeyCode::Tab | KeyCode::BackTab => {
            if let Some(editor) = app.editor.as_mut() {
                editor.switch_focus();
            }
        }
        code => {
            let Some(editor) = app.editor.as_mut() else {
                return;
            };
            let input = editor.focused_mut();
            match code {
                KeyCode::Char(c) => input.insert(c),
                KeyCode::Backspace => input.backspace(),
                KeyCode::Left => input.left(),
                KeyCode::Right => input.right(),
                _ => {}
            }
        }
    }
}

/// Handle the y/n answer to a delete prompt
fn handle_confirm_mode(app: &mut App, store: &mut ContactStore, code: KeyCode) {
    match code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(store, true),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.confirm_delete(store, false)
        }
        _ => {}
    }
}

/// Leave the terminal for an external editor, then come back
fn run_editor_task<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    store: &mut ContactStore,
    task: EditorTask,
) -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(cursor::Show)?;

    let edited = match &task {
        EditorTask::Who(id) => match store.contact(*id) {
            Some(contact) => Some(editor::edit_who(&contact.name, &contact.who)),
            None => None,
        },
    };

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    terminal.clear()?;

    match (task, edited) {
        (EditorTask::Who(id), Some(Ok(text))) => app.finish_who(store, id, text),
        (_, Some(Err(e))) => app.set_status(format!("Editor failed: {}", e)),
        (_, None) => app.set_status("No contact selected"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolo_core::MemoryPersistence;

    fn setup(names: &[&str]) -> (App, ContactStore) {
        let mut store = ContactStore::open(MemoryPersistence::new()).unwrap();
        for name in names {
            store.add_contact(*name);
        }
        let app = App::new(&mut store, &Config::default());
        (app, store)
    }

    fn press(app: &mut App, store: &mut ContactStore, code: KeyCode) -> CommandResult {
        handle_key(app, store, code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, store: &mut ContactStore, text: &str) {
        for c in text.chars() {
            press(app, store, KeyCode::Char(c));
        }
    }

    fn erase(app: &mut App, store: &mut ContactStore, count: usize) {
        for _ in 0..count {
            press(app, store, KeyCode::Backspace);
        }
    }

    #[test]
    fn test_add_contact_with_keys() {
        let (mut app, mut store) = setup(&[]);

        press(&mut app, &mut store, KeyCode::Char('a'));
        type_text(&mut app, &mut store, "Alice");
        press(&mut app, &mut store, KeyCode::Enter);

        assert_eq!(store.contact_count(), 1);
        assert_eq!(store.contacts()[0].name, "Alice");
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_new_field_flow() {
        let (mut app, mut store) = setup(&["Alice"]);

        press(&mut app, &mut store, KeyCode::Enter);
        press(&mut app, &mut store, KeyCode::Char('n'));
        assert_eq!(app.input_mode, InputMode::EditField);

        // Replace the placeholder label, then fill in the value
        erase(&mut app, &mut store, "New Field".len());
        type_text(&mut app, &mut store, "Email");
        press(&mut app, &mut store, KeyCode::Tab);
        type_text(&mut app, &mut store, "alice@example.com");
        press(&mut app, &mut store, KeyCode::Enter);

        assert_eq!(app.input_mode, InputMode::Normal);
        let field = &store.contacts()[0].fields[0];
        assert_eq!(field.label, "Email");
        assert_eq!(field.value, "alice@example.com");
        assert!(!field.is_editing);
    }

    #[test]
    fn test_escape_discards_placeholder_field() {
        let (mut app, mut store) = setup(&["Alice"]);

        press(&mut app, &mut store, KeyCode::Enter);
        press(&mut app, &mut store, KeyCode::Char('n'));
        press(&mut app, &mut store, KeyCode::Tab);
        type_text(&mut app, &mut store, "typed but not saved");
        press(&mut app, &mut store, KeyCode::Esc);

        assert!(store.contacts()[0].fields.is_empty());
        // Still on the fields pane
        assert_eq!(app.active_pane, ActivePane::Fields);
    }

    #[test]
    fn test_typing_in_editor_does_not_trigger_commands() {
        let (mut app, mut store) = setup(&["Alice"]);

        press(&mut app, &mut store, KeyCode::Enter);
        press(&mut app, &mut store, KeyCode::Char('n'));
        type_text(&mut app, &mut store, "qD");

        assert!(!app.should_quit);
        assert_eq!(app.editor.as_ref().unwrap().label.text, "New FieldqD");
    }

    #[test]
    fn test_delete_contact_with_confirm() {
        let (mut app, mut store) = setup(&["Alice"]);

        press(&mut app, &mut store, KeyCode::Char('d'));
        press(&mut app, &mut store, KeyCode::Char('n'));
        assert_eq!(store.contact_count(), 1);

        press(&mut app, &mut store, KeyCode::Char('d'));
        press(&mut app, &mut store, KeyCode::Char('y'));
        assert_eq!(store.contact_count(), 0);
    }

    #[test]
    fn test_search_in_both_panes() {
        let (mut app, mut store) = setup(&["Alice", "Bob"]);

        press(&mut app, &mut store, KeyCode::Char('/'));
        type_text(&mut app, &mut store, "bo");
        press(&mut app, &mut store, KeyCode::Enter);
        assert_eq!(store.contact_search_query(), "bo");
        assert_eq!(store.filtered_contacts().len(), 1);

        press(&mut app, &mut store, KeyCode::Enter);
        assert_eq!(store.selected_contact().unwrap().name, "Bob");

        press(&mut app, &mut store, KeyCode::Char('/'));
        type_text(&mut app, &mut store, "mail");
        assert_eq!(store.field_search_query(), "mail");
        press(&mut app, &mut store, KeyCode::Esc);
        assert!(store.field_search_query().is_empty());
        // Contact search is untouched
        assert_eq!(store.contact_search_query(), "bo");
    }

    #[test]
    fn test_back_clears_selection() {
        let (mut app, mut store) = setup(&["Alice"]);

        press(&mut app, &mut store, KeyCode::Enter);
        assert!(store.selected_contact_id().is_some());
        press(&mut app, &mut store, KeyCode::Char('h'));
        assert!(store.selected_contact_id().is_none());
        assert_eq!(app.active_pane, ActivePane::Contacts);
    }

    #[test]
    fn test_favorite_keys() {
        let (mut app, mut store) = setup(&["Alice", "Bob"]);

        press(&mut app, &mut store, KeyCode::Char('f'));
        press(&mut app, &mut store, KeyCode::Char('F'));
        assert!(store.show_favorites_only());
        assert_eq!(store.filtered_contacts().len(), 1);
        assert_eq!(store.filtered_contacts()[0].name, "Alice");
    }

    #[test]
    fn test_who_key_requests_editor() {
        let (mut app, mut store) = setup(&["Alice"]);
        let id = store.contacts()[0].id;

        let result = press(&mut app, &mut store, KeyCode::Char('w'));
        assert_eq!(result, CommandResult::NeedEditor(EditorTask::Who(id)));
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, mut store) = setup(&[]);
        handle_key(&mut app, &mut store, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.should_quit);

        let (mut app, mut store) = setup(&[]);
        press(&mut app, &mut store, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
