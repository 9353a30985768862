//! Contact store
//!
//! The `ContactStore` is the single source of truth for the address book.
//! It owns:
//! - the contact list (each contact owning its fields)
//! - session view state: selection, search queries, favorites filter
//!
//! Every mutation of the contact list is mirrored to the configured
//! [`Persistence`] backend. The mirror is best-effort: a failed save is
//! logged and announced to subscribers as [`StoreEvent::SaveFailed`], and the
//! in-memory state stays as it is.
//!
//! Operations addressed by id never fail when the id is unknown. They do
//! nothing and report `false`/`None`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = ContactStore::open(MemoryPersistence::new())?;
//!
//! let alice = store.add_contact("Alice");
//! let email = store.add_field(alice, NewField::new("Email", "alice@example.com"));
//!
//! store.set_search_query("ali");
//! let visible = store.filtered_contacts();
//! ```

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::filter::{self, SortDirection};
use crate::models::{Contact, ContactField, ContactPatch, FieldPatch, NewField};
use crate::storage::{JsonFilePersistence, PersistedState, Persistence, StorageError, StorageResult};

/// Notification sent to subscribers after the store changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Contacts or their fields changed
    ContactsChanged,
    /// The selected contact changed
    SelectionChanged,
    /// A search query or the favorites filter changed
    QueryChanged,
    /// Mirroring contacts to storage failed; memory is unaffected
    SaveFailed(String),
}

/// Handle returned by [`ContactStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&StoreEvent)>;

/// Everything the store holds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    /// Contacts in insertion order
    pub contacts: Vec<Contact>,
    /// Contact shown in the detail view
    pub selected_contact_id: Option<Uuid>,
    /// Filter applied to contact names
    pub contact_search_query: String,
    /// Filter applied to the selected contact's fields
    pub field_search_query: String,
    /// Only list favorites
    pub show_favorites_only: bool,
}

/// Remove every field the discard rule applies to
///
/// Returns how many fields were removed. Order of the survivors is kept.
pub fn purge_discardable_fields(fields: &mut Vec<ContactField>) -> usize {
    let before = fields.len();
    fields.retain(|f| !f.is_discardable());
    before - fields.len()
}

/// Give fresh ids to fields whose id already appeared earlier in the list
fn dedupe_field_ids(fields: &mut [ContactField]) {
    let mut seen = std::collections::HashSet::new();
    for field in fields.iter_mut() {
        if !seen.insert(field.id) {
            let mut id = Uuid::new_v4();
            while seen.contains(&id) {
                id = Uuid::new_v4();
            }
            warn!("Replacing duplicate field id {} with {}", field.id, id);
            field.id = id;
            seen.insert(id);
        }
    }
}

/// In-memory contact store mirrored to a persistence backend
pub struct ContactStore {
    state: StoreState,
    persistence: Box<dyn Persistence>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    last_save_error: Option<String>,
    load_warning: Option<String>,
}

impl ContactStore {
    /// Open the store, loading saved contacts from `persistence`
    ///
    /// A backend with nothing saved yields an empty store.
    pub fn open(persistence: impl Persistence + 'static) -> StorageResult<Self> {
        let contacts = persistence
            .load()?
            .map(|saved| saved.contacts)
            .unwrap_or_default();
        debug!("Opened contact store with {} contact(s)", contacts.len());

        Ok(Self::from_parts(Box::new(persistence), contacts))
    }

    /// Open the store using the JSON file in the configured data directory
    ///
    /// A corrupted file has already been moved aside by the backend; the
    /// store then starts empty and keeps the reason in [`Self::take_load_warning`].
    pub fn open_with_config(config: &Config) -> Result<Self> {
        let persistence = JsonFilePersistence::from_config(config);
        debug!("Opening contacts file {:?}", persistence.path());

        match Self::open(persistence.clone()) {
            Ok(store) => Ok(store),
            Err(e @ StorageError::CorruptDocument { .. }) => {
                warn!("{}", e);
                let mut store = Self::from_parts(Box::new(persistence), Vec::new());
                store.load_warning = Some(e.report());
                Ok(store)
            }
            Err(e) => Err(e).context("Failed to load contacts"),
        }
    }

    fn from_parts(persistence: Box<dyn Persistence>, mut contacts: Vec<Contact>) -> Self {
        for contact in &mut contacts {
            dedupe_field_ids(&mut contact.fields);
        }

        Self {
            state: StoreState {
                contacts,
                ..StoreState::default()
            },
            persistence,
            subscribers: Vec::new(),
            next_subscription: 0,
            last_save_error: None,
            load_warning: None,
        }
    }

    // ==================== Subscriptions ====================

    /// Register a callback invoked after every state change
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&StoreEvent) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback; returns false if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    fn notify(&mut self, event: StoreEvent) {
        for (_, callback) in self.subscribers.iter_mut() {
            callback(&event);
        }
    }

    // ==================== Contact Operations ====================

    /// Add a contact and return its id
    pub fn add_contact(&mut self, name: impl Into<String>) -> Uuid {
        let mut id = Uuid::new_v4();
        while self.contact(id).is_some() {
            id = Uuid::new_v4();
        }

        let contact = Contact::with_id(id, name);
        debug!("Adding contact {} ({})", contact.id, contact.name);
        self.state.contacts.push(contact);
        self.commit();
        id
    }

    /// Merge a patch into a contact
    ///
    /// Returns whether the contact changed. Replacement field lists get
    /// duplicate field ids rewritten so ids stay unique per contact.
    pub fn update_contact(&mut self, id: Uuid, patch: ContactPatch) -> bool {
        let Some(contact) = self.contact_mut(id) else {
            return false;
        };

        let changed = contact.apply(&patch);
        if patch.fields.is_some() {
            dedupe_field_ids(&mut contact.fields);
        }

        if changed {
            self.commit();
        }
        changed
    }

    /// Delete a contact, clearing the selection if it pointed at it
    pub fn delete_contact(&mut self, id: Uuid) -> bool {
        let before = self.state.contacts.len();
        self.state.contacts.retain(|c| c.id != id);
        let removed = self.state.contacts.len() != before;

        let deselected = self.state.selected_contact_id == Some(id);
        if deselected {
            self.state.selected_contact_id = None;
        }

        if removed {
            debug!("Deleted contact {}", id);
            self.commit();
        }
        if deselected {
            self.notify(StoreEvent::SelectionChanged);
        }
        removed
    }

    /// Select a contact for the detail view, or clear the selection
    ///
    /// The id is not validated; readers resolve an unknown id to no contact.
    pub fn set_selected_contact(&mut self, id: Option<Uuid>) {
        if self.state.selected_contact_id != id {
            self.state.selected_contact_id = id;
            self.notify(StoreEvent::SelectionChanged);
        }
    }

    /// Flip the favorite flag
    pub fn toggle_favorite(&mut self, id: Uuid) -> bool {
        let Some(contact) = self.contact_mut(id) else {
            return false;
        };
        contact.is_favorite = !contact.is_favorite;
        self.commit();
        true
    }

    /// Replace the "who is this" description
    pub fn set_who(&mut self, id: Uuid, who: impl Into<String>) -> bool {
        self.update_contact(id, ContactPatch::default().with_who(who))
    }

    /// Set the contact name filter
    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.state.contact_search_query = query.into();
        self.notify(StoreEvent::QueryChanged);
    }

    /// Set the field filter for the detail view
    pub fn set_field_search_query(&mut self, query: impl Into<String>) {
        self.state.field_search_query = query.into();
        self.notify(StoreEvent::QueryChanged);
    }

    /// Restrict the contact list to favorites
    pub fn set_show_favorites_only(&mut self, show: bool) {
        self.state.show_favorites_only = show;
        self.notify(StoreEvent::QueryChanged);
    }

    // ==================== Field Operations ====================

    /// Append a field to a contact
    ///
    /// The field always starts in editing mode, with an id unique within the
    /// contact and a creation time no earlier than any existing field's.
    /// Returns `None` when the contact does not exist.
    pub fn add_field(&mut self, contact_id: Uuid, field: NewField) -> Option<Uuid> {
        let contact = self.contact_mut(contact_id)?;

        let mut id = Uuid::new_v4();
        while contact.field(id).is_some() {
            id = Uuid::new_v4();
        }

        let now = Utc::now();
        let created_at = contact.newest_field_time().map_or(now, |newest| newest.max(now));

        contact.fields.push(ContactField {
            id,
            label: field.label,
            value: field.value,
            created_at,
            is_editing: true,
        });
        debug!("Added field {} to contact {}", id, contact_id);
        self.commit();
        Some(id)
    }

    /// Merge a patch into a field
    pub fn update_field(&mut self, contact_id: Uuid, field_id: Uuid, patch: FieldPatch) -> bool {
        let changed = self
            .contact_mut(contact_id)
            .and_then(|c| c.field_mut(field_id))
            .map(|f| f.apply(&patch))
            .unwrap_or(false);

        if changed {
            self.commit();
        }
        changed
    }

    /// Remove a field from a contact
    pub fn delete_field(&mut self, contact_id: Uuid, field_id: Uuid) -> bool {
        let Some(contact) = self.contact_mut(contact_id) else {
            return false;
        };

        let before = contact.fields.len();
        contact.fields.retain(|f| f.id != field_id);
        let removed = contact.fields.len() != before;

        if removed {
            self.commit();
        }
        removed
    }

    /// Flip a field's edit mode, then sweep the contact's discardable fields
    ///
    /// The sweep covers every field of the contact, including the toggled
    /// one, and runs even if `field_id` is unknown.
    pub fn toggle_field_edit(&mut self, contact_id: Uuid, field_id: Uuid) -> bool {
        let Some(contact) = self.contact_mut(contact_id) else {
            return false;
        };

        let toggled = match contact.field_mut(field_id) {
            Some(field) => {
                field.is_editing = !field.is_editing;
                true
            }
            None => false,
        };

        let purged = purge_discardable_fields(&mut contact.fields);
        if purged > 0 {
            debug!("Discarded {} empty field(s) from contact {}", purged, contact_id);
        }

        let changed = toggled || purged > 0;
        if changed {
            self.commit();
        }
        changed
    }

    // ==================== Queries ====================

    /// All contacts in insertion order
    pub fn contacts(&self) -> &[Contact] {
        &self.state.contacts
    }

    /// Number of contacts
    pub fn contact_count(&self) -> usize {
        self.state.contacts.len()
    }

    /// Get a contact by ID
    pub fn contact(&self, id: Uuid) -> Option<&Contact> {
        self.state.contacts.iter().find(|c| c.id == id)
    }

    fn contact_mut(&mut self, id: Uuid) -> Option<&mut Contact> {
        self.state.contacts.iter_mut().find(|c| c.id == id)
    }

    /// Contacts whose id starts with `prefix`
    pub fn find_contacts_by_prefix(&self, prefix: &str) -> Vec<&Contact> {
        let prefix = prefix.to_lowercase();
        self.state
            .contacts
            .iter()
            .filter(|c| c.id.to_string().starts_with(&prefix))
            .collect()
    }

    /// The whole store state
    pub fn state(&self) -> &StoreState {
        &self.state
    }

    /// Raw selected id, possibly pointing at nothing
    pub fn selected_contact_id(&self) -> Option<Uuid> {
        self.state.selected_contact_id
    }

    /// Selected contact; an id with no matching contact resolves to `None`
    pub fn selected_contact(&self) -> Option<&Contact> {
        self.state.selected_contact_id.and_then(|id| self.contact(id))
    }

    pub fn contact_search_query(&self) -> &str {
        &self.state.contact_search_query
    }

    pub fn field_search_query(&self) -> &str {
        &self.state.field_search_query
    }

    pub fn show_favorites_only(&self) -> bool {
        self.state.show_favorites_only
    }

    /// Contacts matching the name query and favorites filter
    pub fn filtered_contacts(&self) -> Vec<&Contact> {
        filter::filter_contacts(
            &self.state.contacts,
            &self.state.contact_search_query,
            self.state.show_favorites_only,
        )
    }

    /// Fields of the selected contact matching the field query, sorted
    pub fn filtered_fields(&self, direction: SortDirection) -> Vec<&ContactField> {
        match self.selected_contact() {
            Some(contact) => {
                filter::visible_fields(&contact.fields, &self.state.field_search_query, direction)
            }
            None => Vec::new(),
        }
    }

    // ==================== Persistence ====================

    /// The persisted subset of the state
    pub fn snapshot(&self) -> PersistedState {
        PersistedState::new(self.state.contacts.clone())
    }

    /// Message of the most recent failed save, cleared by the next good one
    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    /// Reason the saved contacts could not be loaded, if any (reported once)
    pub fn take_load_warning(&mut self) -> Option<String> {
        self.load_warning.take()
    }

    /// Write the current contacts now, returning the backend's result
    pub fn save_now(&mut self) -> StorageResult<()> {
        let snapshot = self.snapshot();
        let result = self.persistence.save(&snapshot);
        match &result {
            Ok(()) => self.last_save_error = None,
            Err(e) => self.last_save_error = Some(e.report()),
        }
        result
    }

    /// Mirror to storage and tell subscribers the contacts changed
    fn commit(&mut self) {
        let save_result = self.save_now();
        self.notify(StoreEvent::ContactsChanged);

        if let Err(e) = save_result {
            warn!("Failed to save contacts: {}", e);
            self.notify(StoreEvent::SaveFailed(e.report()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryPersistence;
    use chrono::Duration;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn empty_store() -> (ContactStore, MemoryPersistence) {
        let backend = MemoryPersistence::new();
        let store = ContactStore::open(backend.clone()).unwrap();
        (store, backend)
    }

    fn record_events(store: &mut ContactStore) -> Rc<RefCell<Vec<StoreEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        store.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        events
    }

    fn labels(contact: &Contact) -> Vec<&str> {
        contact.fields.iter().map(|f| f.label.as_str()).collect()
    }

    #[test]
    fn test_open_empty_backend() {
        let (store, backend) = empty_store();
        assert_eq!(store.contact_count(), 0);
        assert!(store.selected_contact_id().is_none());
        assert_eq!(backend.save_count(), 0);
    }

    #[test]
    fn test_add_contact_defaults_and_order() {
        let (mut store, backend) = empty_store();

        let ids: Vec<_> = ["Alice", "Bob", "Alice"]
            .iter()
            .map(|name| store.add_contact(*name))
            .collect();

        let names: Vec<_> = store.contacts().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Alice"]);
        assert_ne!(ids[0], ids[2]);

        let alice = store.contact(ids[0]).unwrap();
        assert!(alice.fields.is_empty());
        assert!(!alice.is_favorite);
        assert!(alice.who.is_empty());

        assert_eq!(backend.save_count(), 3);
        assert_eq!(backend.stored().unwrap().contacts.len(), 3);
    }

    #[test]
    fn test_update_contact_merges_patch() {
        let (mut store, _) = empty_store();
        let id = store.add_contact("Alice");

        assert!(store.update_contact(id, ContactPatch::default().with_name("Alicia")));
        assert!(store.update_contact(id, ContactPatch::default().with_who("cousin")));

        let contact = store.contact(id).unwrap();
        assert_eq!(contact.name, "Alicia");
        assert_eq!(contact.who, "cousin");
        assert_eq!(contact.id, id);
    }

    #[test]
    fn test_update_contact_unknown_id_is_noop() {
        let (mut store, backend) = empty_store();
        store.add_contact("Alice");
        let saves = backend.save_count();

        assert!(!store.update_contact(Uuid::new_v4(), ContactPatch::default().with_name("X")));
        assert_eq!(store.contacts()[0].name, "Alice");
        assert_eq!(backend.save_count(), saves);
    }

    #[test]
    fn test_update_contact_fields_dedupes_ids() {
        let (mut store, _) = empty_store();
        let id = store.add_contact("Alice");

        let first = ContactField::new("Email", "a@example.com");
        let mut second = ContactField::new("Phone", "555");
        second.id = first.id;

        store.update_contact(id, ContactPatch::default().with_fields(vec![first.clone(), second]));

        let contact = store.contact(id).unwrap();
        assert_eq!(contact.fields.len(), 2);
        assert_eq!(contact.fields[0].id, first.id);
        assert_ne!(contact.fields[1].id, first.id);
    }

    #[test]
    fn test_delete_contact() {
        let (mut store, backend) = empty_store();
        let alice = store.add_contact("Alice");
        let bob = store.add_contact("Bob");

        assert!(store.delete_contact(alice));
        assert!(store.contact(alice).is_none());
        assert!(store.contact(bob).is_some());
        assert_eq!(backend.stored().unwrap().contacts.len(), 1);

        // Second delete is a harmless no-op
        assert!(!store.delete_contact(alice));
        assert_eq!(store.contact_count(), 1);
    }

    #[test]
    fn test_delete_selected_contact_clears_selection() {
        let (mut store, _) = empty_store();
        let alice = store.add_contact("Alice");
        store.set_selected_contact(Some(alice));
        let events = record_events(&mut store);

        store.delete_contact(alice);

        assert!(store.selected_contact_id().is_none());
        assert!(store.selected_contact().is_none());
        assert_eq!(
            *events.borrow(),
            vec![StoreEvent::ContactsChanged, StoreEvent::SelectionChanged]
        );
    }

    #[test]
    fn test_delete_other_contact_keeps_selection() {
        let (mut store, _) = empty_store();
        let alice = store.add_contact("Alice");
        let bob = store.add_contact("Bob");
        store.set_selected_contact(Some(alice));

        store.delete_contact(bob);
        assert_eq!(store.selected_contact_id(), Some(alice));
    }

    #[test]
    fn test_dangling_selection_resolves_to_none() {
        let (mut store, _) = empty_store();
        store.add_contact("Alice");

        store.set_selected_contact(Some(Uuid::new_v4()));
        assert!(store.selected_contact_id().is_some());
        assert!(store.selected_contact().is_none());
        assert!(store.filtered_fields(SortDirection::Ascending).is_empty());
    }

    #[test]
    fn test_toggle_favorite_is_own_inverse() {
        let (mut store, _) = empty_store();
        let id = store.add_contact("Alice");

        assert!(store.toggle_favorite(id));
        assert!(store.contact(id).unwrap().is_favorite);
        assert!(store.toggle_favorite(id));
        assert!(!store.contact(id).unwrap().is_favorite);

        assert!(!store.toggle_favorite(Uuid::new_v4()));
    }

    #[test]
    fn test_set_who() {
        let (mut store, backend) = empty_store();
        let id = store.add_contact("Alice");

        assert!(store.set_who(id, "climbing partner"));
        assert_eq!(store.contact(id).unwrap().who, "climbing partner");
        assert_eq!(backend.stored().unwrap().contacts[0].who, "climbing partner");

        assert!(!store.set_who(Uuid::new_v4(), "nobody"));
    }

    #[test]
    fn test_view_setters_do_not_persist() {
        let (mut store, backend) = empty_store();
        let id = store.add_contact("Alice");
        let saves = backend.save_count();
        let events = record_events(&mut store);

        store.set_search_query("al");
        store.set_field_search_query("mail");
        store.set_show_favorites_only(true);
        store.set_selected_contact(Some(id));

        assert_eq!(backend.save_count(), saves);
        assert_eq!(store.contact_search_query(), "al");
        assert_eq!(store.field_search_query(), "mail");
        assert!(store.show_favorites_only());
        assert_eq!(
            *events.borrow(),
            vec![
                StoreEvent::QueryChanged,
                StoreEvent::QueryChanged,
                StoreEvent::QueryChanged,
                StoreEvent::SelectionChanged,
            ]
        );
    }

    #[test]
    fn test_add_field_starts_editing() {
        let (mut store, _) = empty_store();
        let id = store.add_contact("Alice");

        let field_id = store.add_field(id, NewField::new("X", "Y")).unwrap();

        let field = store.contact(id).unwrap().field(field_id).unwrap();
        assert!(field.is_editing);
        assert_eq!(field.label, "X");
        assert_eq!(field.value, "Y");
    }

    #[test]
    fn test_add_field_unknown_contact() {
        let (mut store, backend) = empty_store();
        assert!(store.add_field(Uuid::new_v4(), NewField::placeholder()).is_none());
        assert_eq!(backend.save_count(), 0);
    }

    #[test]
    fn test_add_field_created_at_never_goes_backwards() {
        let (mut store, _) = empty_store();
        let id = store.add_contact("Alice");

        // A field stamped in the future, as if the clock was moved back since
        let mut future = ContactField::new("Phone", "555");
        future.created_at = Utc::now() + Duration::hours(1);
        let future_time = future.created_at;
        store.update_contact(id, ContactPatch::default().with_fields(vec![future]));

        let field_id = store.add_field(id, NewField::new("Email", "a@b.c")).unwrap();
        let created = store.contact(id).unwrap().field(field_id).unwrap().created_at;
        assert!(created >= future_time);

        let next_id = store.add_field(id, NewField::new("Web", "x")).unwrap();
        let next = store.contact(id).unwrap().field(next_id).unwrap().created_at;
        assert!(next >= created);
    }

    #[test]
    fn test_update_field() {
        let (mut store, _) = empty_store();
        let id = store.add_contact("Alice");
        let field_id = store.add_field(id, NewField::placeholder()).unwrap();

        let patch = FieldPatch::default()
            .with_label("Email")
            .with_value("alice@example.com")
            .with_editing(false);
        assert!(store.update_field(id, field_id, patch));

        let field = store.contact(id).unwrap().field(field_id).unwrap();
        assert_eq!(field.label, "Email");
        assert_eq!(field.value, "alice@example.com");
        assert!(!field.is_editing);

        assert!(!store.update_field(id, Uuid::new_v4(), FieldPatch::default().with_value("x")));
        assert!(!store.update_field(Uuid::new_v4(), field_id, FieldPatch::default().with_value("x")));
    }

    #[test]
    fn test_delete_field() {
        let (mut store, _) = empty_store();
        let id = store.add_contact("Alice");
        let a = store.add_field(id, NewField::new("A", "1")).unwrap();
        let b = store.add_field(id, NewField::new("B", "2")).unwrap();

        assert!(store.delete_field(id, a));
        let contact = store.contact(id).unwrap();
        assert_eq!(contact.fields.len(), 1);
        assert_eq!(contact.fields[0].id, b);

        assert!(!store.delete_field(id, a));
        assert!(!store.delete_field(Uuid::new_v4(), b));
    }

    #[test]
    fn test_toggle_field_edit_purges_placeholders_across_contact() {
        let (mut store, _) = empty_store();
        let id = store.add_contact("C");
        store.add_field(id, NewField::new("New Field", "")).unwrap();
        let phone = store.add_field(id, NewField::new("Phone", "555-1234")).unwrap();

        assert!(store.toggle_field_edit(id, phone));

        let contact = store.contact(id).unwrap();
        assert_eq!(labels(contact), vec!["Phone"]);
        // Phone started in editing mode and was flipped off
        assert!(!contact.fields[0].is_editing);
    }

    #[test]
    fn test_toggle_field_edit_removes_toggled_field_when_empty() {
        let (mut store, _) = empty_store();
        let id = store.add_contact("Alice");
        let email = store.add_field(id, NewField::new("Email", "  ")).unwrap();

        store.toggle_field_edit(id, email);
        assert!(store.contact(id).unwrap().fields.is_empty());
    }

    #[test]
    fn test_toggle_field_edit_leaves_other_contacts_alone() {
        let (mut store, _) = empty_store();
        let alice = store.add_contact("Alice");
        let bob = store.add_contact("Bob");
        store.add_field(bob, NewField::placeholder()).unwrap();
        let email = store.add_field(alice, NewField::new("Email", "a@b.c")).unwrap();

        store.toggle_field_edit(alice, email);

        assert_eq!(store.contact(bob).unwrap().fields.len(), 1);
    }

    #[test]
    fn test_toggle_field_edit_unknown_field_still_sweeps() {
        let (mut store, _) = empty_store();
        let id = store.add_contact("Alice");
        store.add_field(id, NewField::placeholder()).unwrap();
        store.add_field(id, NewField::new("Email", "a@b.c")).unwrap();

        assert!(store.toggle_field_edit(id, Uuid::new_v4()));
        assert_eq!(labels(store.contact(id).unwrap()), vec!["Email"]);

        // Nothing left to sweep and nothing to toggle
        assert!(!store.toggle_field_edit(id, Uuid::new_v4()));
        assert!(!store.toggle_field_edit(Uuid::new_v4(), Uuid::new_v4()));
    }

    #[test]
    fn test_toggle_field_edit_twice_restores_flag() {
        let (mut store, _) = empty_store();
        let id = store.add_contact("Alice");
        let email = store.add_field(id, NewField::new("Email", "a@b.c")).unwrap();

        store.toggle_field_edit(id, email);
        assert!(!store.contact(id).unwrap().field(email).unwrap().is_editing);
        store.toggle_field_edit(id, email);
        assert!(store.contact(id).unwrap().field(email).unwrap().is_editing);
    }

    #[test]
    fn test_purge_discardable_fields() {
        let mut fields = vec![
            ContactField::new("Email", "a@b.c"),
            ContactField::new("new FIELD", "something"),
            ContactField::new("Phone", ""),
            ContactField::new("Web", "example.com"),
        ];

        assert_eq!(purge_discardable_fields(&mut fields), 2);
        let labels: Vec<_> = fields.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["Email", "Web"]);
        assert_eq!(purge_discardable_fields(&mut fields), 0);
    }

    #[test]
    fn test_filtered_contacts() {
        let (mut store, _) = empty_store();
        let alice = store.add_contact("Alice");
        store.add_contact("Albert");
        store.add_contact("Bob");
        store.toggle_favorite(alice);

        store.set_search_query("AL");
        assert_eq!(store.filtered_contacts().len(), 2);

        store.set_show_favorites_only(true);
        let visible = store.filtered_contacts();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, alice);
    }

    #[test]
    fn test_filtered_fields_is_idempotent_and_non_mutating() {
        let (mut store, _) = empty_store();
        let id = store.add_contact("Alice");
        store.add_field(id, NewField::new("Email", "alice@example.com"));
        store.add_field(id, NewField::new("Phone", "555"));
        store.add_field(id, NewField::new("Work email", "alice@corp.com"));
        store.set_selected_contact(Some(id));
        store.set_field_search_query("EMAIL");

        let before = store.contacts().to_vec();
        let first: Vec<Uuid> = store
            .filtered_fields(SortDirection::Descending)
            .iter()
            .map(|f| f.id)
            .collect();
        let second: Vec<Uuid> = store
            .filtered_fields(SortDirection::Descending)
            .iter()
            .map(|f| f.id)
            .collect();

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(store.contacts(), before.as_slice());
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let (mut store, _) = empty_store();
        let events = Rc::new(RefCell::new(0));
        let counter = events.clone();
        let sub = store.subscribe(move |_| *counter.borrow_mut() += 1);

        store.add_contact("Alice");
        assert_eq!(*events.borrow(), 1);

        assert!(store.unsubscribe(sub));
        assert!(!store.unsubscribe(sub));
        store.add_contact("Bob");
        assert_eq!(*events.borrow(), 1);
    }

    #[test]
    fn test_failed_save_keeps_memory_and_notifies() {
        let (mut store, backend) = empty_store();
        let alice = store.add_contact("Alice");
        backend.set_failure(Some("read-only filesystem"));
        let events = record_events(&mut store);

        store.set_who(alice, "friend");

        assert_eq!(store.contact(alice).unwrap().who, "friend");
        assert!(store.last_save_error().unwrap().contains("read-only"));
        assert_eq!(backend.stored().unwrap().contacts[0].who, "");

        let events = events.borrow();
        assert_eq!(events[0], StoreEvent::ContactsChanged);
        assert!(matches!(&events[1], StoreEvent::SaveFailed(msg) if msg.contains("read-only")));
        drop(events);

        backend.set_failure(None);
        store.save_now().unwrap();
        assert!(store.last_save_error().is_none());
        assert_eq!(backend.stored().unwrap().contacts[0].who, "friend");
    }

    #[test]
    fn test_reopen_restores_contacts_and_resets_view_state() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };

        let original;
        {
            let mut store = ContactStore::open_with_config(&config).unwrap();
            let id = store.add_contact("Alice");
            let field = store.add_field(id, NewField::new("Email", "a@b.c")).unwrap();
            store.update_field(id, field, FieldPatch::default().with_editing(false));
            store.toggle_favorite(id);
            store.set_who(id, "sister");
            store.set_selected_contact(Some(id));
            store.set_search_query("ali");
            store.set_show_favorites_only(true);
            original = store.contacts().to_vec();
        }

        let mut store = ContactStore::open_with_config(&config).unwrap();
        assert_eq!(store.contacts(), original.as_slice());
        assert!(store.selected_contact_id().is_none());
        assert!(store.contact_search_query().is_empty());
        assert!(store.field_search_query().is_empty());
        assert!(!store.show_favorites_only());
        assert!(store.take_load_warning().is_none());
    }

    #[test]
    fn test_open_with_corrupt_file_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };
        std::fs::write(config.contacts_path(), "[[[").unwrap();

        let mut store = ContactStore::open_with_config(&config).unwrap();
        assert_eq!(store.contact_count(), 0);
        let warning = store.take_load_warning().unwrap();
        assert!(warning.contains("corrupted"));
        assert!(warning.contains("recovered from the backup"));
        assert!(store.take_load_warning().is_none());
    }

    #[test]
    fn test_failed_save_reports_hint() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the data directory should be
        let blocker = temp_dir.path().join("data");
        std::fs::write(&blocker, b"").unwrap();
        let config = Config {
            data_dir: blocker,
            ..Config::default()
        };

        let mut store = ContactStore::open_with_config(&config).unwrap();
        let events = record_events(&mut store);
        store.add_contact("Alice");

        let reason = store.last_save_error().unwrap().to_string();
        assert!(reason.contains("Could not create data directory"));
        assert!(reason.contains("Check permissions"));
        assert!(events
            .borrow()
            .iter()
            .any(|e| matches!(e, StoreEvent::SaveFailed(msg) if *msg == reason)));
    }

    #[test]
    fn test_find_contacts_by_prefix() {
        let (mut store, _) = empty_store();
        let id = store.add_contact("Alice");
        store.add_contact("Bob");

        let prefix = &id.to_string()[..8];
        let matches = store.find_contacts_by_prefix(prefix);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, id);

        assert_eq!(store.find_contacts_by_prefix("").len(), 2);
    }
}
