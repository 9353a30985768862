//! Application state and logic

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use rolo_core::export::export_to_dir;
use rolo_core::{
    Config, Contact, ContactField, ContactPatch, ContactSnapshot, ContactStore, ExportFormat,
    FieldPatch, NewField, SortDirection, StoreEvent, PLACEHOLDER_LABEL,
};
use uuid::Uuid;

/// Input mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Normal navigation mode
    Normal,
    /// Live search in the focused pane (after pressing /)
    Filter,
    /// Single-line prompt (add, rename, export)
    Prompt,
    /// Editing a field's label and value
    EditField,
    /// Waiting for y/n before deleting a contact
    Confirm,
}

/// What a prompt is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    AddContact,
    Rename,
    Export,
}

impl PromptKind {
    pub fn label(self) -> &'static str {
        match self {
            PromptKind::AddContact => "New contact: ",
            PromptKind::Rename => "Rename: ",
            PromptKind::Export => "Export as (md/pdf): ",
        }
    }
}

/// Which pane has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePane {
    Contacts,
    Fields,
}

/// Single-line text buffer with a cursor counted in characters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    pub text: String,
    pub cursor: usize,
}

impl TextInput {
    /// Buffer holding `text` with the cursor at the end
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    fn byte_index(&self) -> usize {
        self.text
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index();
        self.text.insert(at, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index();
            self.text.remove(at);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        if self.cursor < self.text.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}

/// Which buffer of the field editor receives keystrokes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorFocus {
    Label,
    Value,
}

/// An open field editor
#[derive(Debug, Clone)]
pub struct FieldEditor {
    pub contact_id: Uuid,
    pub field_id: Uuid,
    pub label: TextInput,
    pub value: TextInput,
    pub focus: EditorFocus,
}

impl FieldEditor {
    fn new(contact_id: Uuid, field: &ContactField) -> Self {
        Self {
            contact_id,
            field_id: field.id,
            label: TextInput::new(field.label.clone()),
            value: TextInput::new(field.value.clone()),
            focus: EditorFocus::Label,
        }
    }

    /// Buffer under the cursor
    pub fn focused_mut(&mut self) -> &mut TextInput {
        match self.focus {
            EditorFocus::Label => &mut self.label,
            EditorFocus::Value => &mut self.value,
        }
    }

    pub fn switch_focus(&mut self) {
        self.focus = match self.focus {
            EditorFocus::Label => EditorFocus::Value,
            EditorFocus::Value => EditorFocus::Label,
        };
    }

    /// A field may be committed once it has a real label and a value
    pub fn can_save(&self) -> bool {
        !self.label.text.trim().eq_ignore_ascii_case(PLACEHOLDER_LABEL)
            && !self.value.text.trim().is_empty()
    }
}

/// Result of a key press the event loop has to finish
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Nothing left to do
    Done,
    /// Suspend the terminal and open an external editor
    NeedEditor(EditorTask),
}

/// Type of editor task
#[derive(Debug, PartialEq, Eq)]
pub enum EditorTask {
    /// Edit the "who is this" description of a contact
    Who(Uuid),
}

/// Application state
pub struct App {
    /// Whether the app should exit
    pub should_quit: bool,
    /// Current input mode
    pub input_mode: InputMode,
    /// Prompt being answered in `InputMode::Prompt`
    pub prompt: Option<PromptKind>,
    /// Buffer for prompts and search
    pub input: TextInput,
    /// Which pane has focus
    pub active_pane: ActivePane,
    /// Highlighted row in the contact list
    pub contact_index: usize,
    /// Highlighted row in the field list
    pub field_index: usize,
    /// Field ordering by creation time
    pub field_sort: SortDirection,
    /// Open field editor
    pub editor: Option<FieldEditor>,
    /// Contact awaiting delete confirmation
    pub pending_delete: Option<Uuid>,
    /// Status message to display temporarily
    pub status_message: Option<String>,
    /// When the status message was set (for auto-dismiss)
    pub status_message_time: Option<Instant>,
    /// Whether help overlay is visible
    pub show_help: bool,
    /// Where exports are written
    pub export_dir: PathBuf,
    /// Store notifications
    events: Receiver<StoreEvent>,
}

impl App {
    /// Create the app and subscribe it to store notifications
    pub fn new(store: &mut ContactStore, config: &Config) -> Self {
        let (tx, rx) = mpsc::channel();
        store.subscribe(move |event| {
            let _ = tx.send(event.clone());
        });

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            prompt: None,
            input: TextInput::default(),
            active_pane: ActivePane::Contacts,
            contact_index: 0,
            field_index: 0,
            field_sort: config.field_sort,
            editor: None,
            pending_delete: None,
            status_message: None,
            status_message_time: None,
            show_help: false,
            export_dir: config.export_dir.clone(),
            events: rx,
        }
    }

    /// Handle queued store notifications, returning how many there were
    pub fn drain_events(&mut self, store: &ContactStore) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            handled += 1;
            if let StoreEvent::SaveFailed(reason) = event {
                self.set_status(format!("Save failed: {}", reason));
            }
        }
        if handled > 0 {
            self.clamp_selection(store);
        }
        handled
    }

    /// Set a status message (will auto-dismiss after 3 seconds)
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Check and clear expired status message
    pub fn check_status_timeout(&mut self) {
        if let Some(time) = self.status_message_time {
            if time.elapsed() > Duration::from_secs(3) {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    // ==================== Views ====================

    /// Contact under the cursor in the contact list
    pub fn current_contact<'a>(&self, store: &'a ContactStore) -> Option<&'a Contact> {
        store.filtered_contacts().get(self.contact_index).copied()
    }

    /// Contact that contact-level commands act on
    fn target_contact<'a>(&self, store: &'a ContactStore) -> Option<&'a Contact> {
        match self.active_pane {
            ActivePane::Contacts => self.current_contact(store),
            ActivePane::Fields => store.selected_contact(),
        }
    }

    /// Fields of the selected contact in display order
    pub fn visible_fields<'a>(&self, store: &'a ContactStore) -> Vec<&'a ContactField> {
        store.filtered_fields(self.field_sort)
    }

    /// Field under the cursor in the field list
    pub fn current_field<'a>(&self, store: &'a ContactStore) -> Option<&'a ContactField> {
        self.visible_fields(store).get(self.field_index).copied()
    }

    fn clamp_selection(&mut self, store: &ContactStore) {
        let contacts = store.filtered_contacts().len();
        self.contact_index = self.contact_index.min(contacts.saturating_sub(1));

        let fields = self.visible_fields(store).len();
        self.field_index = self.field_index.min(fields.saturating_sub(1));

        if self.active_pane == ActivePane::Fields && store.selected_contact().is_none() {
            self.active_pane = ActivePane::Contacts;
        }
    }

    fn row_count(&self, store: &ContactStore) -> usize {
        match self.active_pane {
            ActivePane::Contacts => store.filtered_contacts().len(),
            ActivePane::Fields => self.visible_fields(store).len(),
        }
    }

    fn index_mut(&mut self) -> &mut usize {
        match self.active_pane {
            ActivePane::Contacts => &mut self.contact_index,
            ActivePane::Fields => &mut self.field_index,
        }
    }

    // ==================== Navigation ====================

    /// Move selection up in the current pane
    pub fn move_up(&mut self) {
        let index = self.index_mut();
        *index = index.saturating_sub(1);
    }

    /// Move selection down in the current pane
    pub fn move_down(&mut self, store: &ContactStore) {
        let last = self.row_count(store).saturating_sub(1);
        let index = self.index_mut();
        if *index < last {
            *index += 1;
        }
    }

    /// Move selection to first item in the current pane
    pub fn move_to_first(&mut self) {
        *self.index_mut() = 0;
    }

    /// Move selection to last item in the current pane
    pub fn move_to_last(&mut self, store: &ContactStore) {
        let last = self.row_count(store).saturating_sub(1);
        *self.index_mut() = last;
    }

    /// Open the highlighted contact in the fields pane
    pub fn select_current(&mut self, store: &mut ContactStore) {
        if let Some(id) = self.current_contact(store).map(|c| c.id) {
            store.set_selected_contact(Some(id));
            store.set_field_search_query("");
            self.field_index = 0;
            self.active_pane = ActivePane::Fields;
        }
    }

    /// Leave the fields pane and clear the selection
    pub fn back(&mut self, store: &mut ContactStore) {
        store.set_selected_contact(None);
        store.set_field_search_query("");
        self.field_index = 0;
        self.active_pane = ActivePane::Contacts;
    }

    fn focus_contact(&mut self, store: &ContactStore, id: Uuid) {
        if let Some(pos) = store.filtered_contacts().iter().position(|c| c.id == id) {
            self.contact_index = pos;
        }
    }

    // ==================== Input modes ====================

    /// Start a prompt; rename and export need a contact to act on
    pub fn begin_prompt(&mut self, kind: PromptKind, store: &ContactStore) {
        let input = match kind {
            PromptKind::AddContact => TextInput::default(),
            PromptKind::Rename | PromptKind::Export => {
                let Some(contact) = self.target_contact(store) else {
                    self.set_status("No contact selected");
                    return;
                };
                if kind == PromptKind::Rename {
                    TextInput::new(contact.name.clone())
                } else {
                    TextInput::new(ExportFormat::Markdown.extension())
                }
            }
        };

        self.input = input;
        self.prompt = Some(kind);
        self.input_mode = InputMode::Prompt;
    }

    /// Apply the prompt's answer
    pub fn submit_prompt(&mut self, store: &mut ContactStore) {
        let Some(kind) = self.prompt else {
            self.exit_input_mode();
            return;
        };
        let text = self.input.text.trim().to_string();
        let target = self.target_contact(store).map(|c| c.id);
        self.exit_input_mode();

        match kind {
            PromptKind::AddContact => {
                if text.is_empty() {
                    self.set_status("Name cannot be empty");
                    return;
                }
                let id = store.add_contact(text.clone());
                self.focus_contact(store, id);
                self.set_status(format!("Added '{}'", text));
            }
            PromptKind::Rename => {
                let Some(id) = target else { return };
                if text.is_empty() {
                    self.set_status("Name cannot be empty");
                } else if store.update_contact(id, ContactPatch::default().with_name(text.clone())) {
                    self.set_status(format!("Renamed to '{}'", text));
                }
            }
            PromptKind::Export => {
                if let Some(id) = target {
                    self.export_contact(store, id, &text);
                }
            }
        }
    }

    /// Enter live search for the focused pane
    pub fn enter_filter_mode(&mut self, store: &ContactStore) {
        let current = match self.active_pane {
            ActivePane::Contacts => store.contact_search_query(),
            ActivePane::Fields => store.field_search_query(),
        };
        self.input = TextInput::new(current);
        self.input_mode = InputMode::Filter;
    }

    /// Push the search buffer into the store
    pub fn apply_filter_input(&mut self, store: &mut ContactStore) {
        match self.active_pane {
            ActivePane::Contacts => {
                store.set_search_query(self.input.text.clone());
                self.contact_index = 0;
            }
            ActivePane::Fields => {
                store.set_field_search_query(self.input.text.clone());
                self.field_index = 0;
            }
        }
    }

    /// Drop the search for the focused pane and leave filter mode
    pub fn clear_filter(&mut self, store: &mut ContactStore) {
        self.input.clear();
        self.apply_filter_input(store);
        self.exit_input_mode();
    }

    /// Exit prompt/filter/confirm mode
    pub fn exit_input_mode(&mut self) {
        self.input_mode = InputMode::Normal;
        self.prompt = None;
        self.pending_delete = None;
        self.input.clear();
    }

    // ==================== Contact commands ====================

    pub fn toggle_favorite(&mut self, store: &mut ContactStore) {
        let Some(contact) = self.target_contact(store) else {
            return;
        };
        let (id, name, was_favorite) = (contact.id, contact.name.clone(), contact.is_favorite);

        store.toggle_favorite(id);
        if was_favorite {
            self.set_status(format!("Removed '{}' from favorites", name));
        } else {
            self.set_status(format!("★ '{}' is a favorite", name));
        }
    }

    pub fn toggle_favorites_filter(&mut self, store: &mut ContactStore) {
        let show = !store.show_favorites_only();
        store.set_show_favorites_only(show);
        self.contact_index = 0;
        self.set_status(if show {
            "Showing favorites"
        } else {
            "Showing all contacts"
        });
    }

    /// Ask before deleting the target contact
    pub fn request_delete(&mut self, store: &ContactStore) {
        if let Some(id) = self.target_contact(store).map(|c| c.id) {
            self.pending_delete = Some(id);
            self.input_mode = InputMode::Confirm;
        }
    }

    /// Answer the delete confirmation
    pub fn confirm_delete(&mut self, store: &mut ContactStore, confirmed: bool) {
        let pending = self.pending_delete.take();
        self.exit_input_mode();

        let Some(id) = pending else { return };
        if !confirmed {
            self.set_status("Delete cancelled");
            return;
        }

        let name = store.contact(id).map(|c| c.name.clone()).unwrap_or_default();
        if store.delete_contact(id) {
            self.set_status(format!("Deleted '{}'", name));
        }
        self.clamp_selection(store);
    }

    /// Request the external editor for the target contact's description
    pub fn edit_who(&mut self, store: &ContactStore) -> CommandResult {
        match self.target_contact(store) {
            Some(contact) => CommandResult::NeedEditor(EditorTask::Who(contact.id)),
            None => CommandResult::Done,
        }
    }

    /// Store the edited description
    pub fn finish_who(&mut self, store: &mut ContactStore, id: Uuid, text: String) {
        if store.set_who(id, text) {
            self.set_status("Description updated");
        } else {
            self.set_status("Description unchanged");
        }
    }

    fn export_contact(&mut self, store: &ContactStore, id: Uuid, format: &str) {
        let format = match format.parse::<ExportFormat>() {
            Ok(f) => f,
            Err(e) => {
                self.set_status(e.to_string());
                return;
            }
        };
        let Some(contact) = store.contact(id) else {
            return;
        };

        match export_to_dir(&ContactSnapshot::from(contact), format, &self.export_dir) {
            Ok(path) => self.set_status(format!("Exported to {}", path.display())),
            Err(e) => self.set_status(format!("Export failed: {}", e)),
        }
    }

    // ==================== Field commands ====================

    /// Add a placeholder field to the selected contact and edit it
    pub fn add_field(&mut self, store: &mut ContactStore) {
        let Some(contact_id) = store.selected_contact().map(|c| c.id) else {
            return;
        };
        if let Some(field_id) = store.add_field(contact_id, NewField::placeholder()) {
            self.open_editor(store, contact_id, field_id);
        }
    }

    /// Open the highlighted field in the editor
    pub fn edit_current_field(&mut self, store: &mut ContactStore) {
        let Some(contact_id) = store.selected_contact().map(|c| c.id) else {
            return;
        };
        let Some((field_id, is_editing)) = self.current_field(store).map(|f| (f.id, f.is_editing))
        else {
            return;
        };

        if !is_editing {
            store.toggle_field_edit(contact_id, field_id);
        }
        self.open_editor(store, contact_id, field_id);
    }

    fn open_editor(&mut self, store: &ContactStore, contact_id: Uuid, field_id: Uuid) {
        match store.contact(contact_id).and_then(|c| c.field(field_id)) {
            Some(field) => {
                self.editor = Some(FieldEditor::new(contact_id, field));
                self.input_mode = InputMode::EditField;
            }
            None => {
                self.set_status("Empty field removed");
                self.clamp_selection(store);
            }
        }
    }

    /// Commit the editor if the field is complete
    pub fn save_editor(&mut self, store: &mut ContactStore) {
        let Some(editor) = &self.editor else {
            return;
        };
        if !editor.can_save() {
            self.set_status(format!(
                "Give the field a label other than '{}' and a value",
                PLACEHOLDER_LABEL
            ));
            return;
        }

        let label = editor.label.text.trim().to_string();
        let patch = FieldPatch::default()
            .with_label(label.clone())
            .with_value(editor.value.text.clone())
            .with_editing(false);
        let (contact_id, field_id) = (editor.contact_id, editor.field_id);

        self.editor = None;
        self.input_mode = InputMode::Normal;
        store.update_field(contact_id, field_id, patch);
        self.set_status(format!("Saved '{}'", label));
    }

    /// Close the editor without saving; empty fields are swept away
    pub fn cancel_editor(&mut self, store: &mut ContactStore) {
        if let Some(editor) = self.editor.take() {
            store.toggle_field_edit(editor.contact_id, editor.field_id);
        }
        self.input_mode = InputMode::Normal;
        self.clamp_selection(store);
    }

    pub fn delete_current_field(&mut self, store: &mut ContactStore) {
        let Some(contact_id) = store.selected_contact().map(|c| c.id) else {
            return;
        };
        if let Some((field_id, label)) = self.current_field(store).map(|f| (f.id, f.label.clone())) {
            store.delete_field(contact_id, field_id);
            self.set_status(format!("Deleted field '{}'", label));
            self.clamp_selection(store);
        }
    }

    pub fn flip_sort(&mut self) {
        self.field_sort = self.field_sort.flip();
        self.field_index = 0;
        self.set_status(match self.field_sort {
            SortDirection::Ascending => "Fields: oldest first",
            SortDirection::Descending => "Fields: newest first",
        });
    }
}
