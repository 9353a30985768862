//! Data models for rolo
//!
//! Defines the core data structures: Contact and ContactField, plus the
//! patch types used to merge partial updates into them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Label given to freshly added fields before the user names them.
///
/// Fields still carrying this label (compared case-insensitively) are swept
/// away by the discard rule.
pub const PLACEHOLDER_LABEL: &str = "New Field";

/// A labeled key/value entry attached to a contact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactField {
    /// Identifier, unique within the owning contact
    pub id: Uuid,
    /// Field label ("Email", "Phone", ...)
    pub label: String,
    /// Field value
    pub value: String,
    /// When this field was created (creation order marker)
    pub created_at: DateTime<Utc>,
    /// Whether the field is currently open in an editor
    #[serde(default)]
    pub is_editing: bool,
}

impl ContactField {
    /// Create a new field in editing mode
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            value: value.into(),
            created_at: Utc::now(),
            is_editing: true,
        }
    }

    /// Whether the discard rule removes this field
    ///
    /// A field is discardable when its value is blank after trimming, or when
    /// its label is still the placeholder.
    pub fn is_discardable(&self) -> bool {
        self.value.trim().is_empty()
            || self.label.to_lowercase() == PLACEHOLDER_LABEL.to_lowercase()
    }

    /// Merge a patch into this field, returning whether anything changed
    pub fn apply(&mut self, patch: &FieldPatch) -> bool {
        let mut changed = false;
        if let Some(label) = &patch.label {
            changed |= self.label != *label;
            self.label = label.clone();
        }
        if let Some(value) = &patch.value {
            changed |= self.value != *value;
            self.value = value.clone();
        }
        if let Some(is_editing) = patch.is_editing {
            changed |= self.is_editing != is_editing;
            self.is_editing = is_editing;
        }
        changed
    }
}

/// A person in the address book
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Fields in insertion order
    #[serde(default)]
    pub fields: Vec<ContactField>,
    /// Marked as favorite
    #[serde(default)]
    pub is_favorite: bool,
    /// Who this person is to the user ("college roommate", "dentist")
    #[serde(default)]
    pub who: String,
}

impl Contact {
    /// Create a new contact with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Create a contact with a specific ID (for loading from storage)
    pub fn with_id(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            fields: Vec::new(),
            is_favorite: false,
            who: String::new(),
        }
    }

    /// Get a field by ID
    pub fn field(&self, id: Uuid) -> Option<&ContactField> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Get a mutable field by ID
    pub fn field_mut(&mut self, id: Uuid) -> Option<&mut ContactField> {
        self.fields.iter_mut().find(|f| f.id == id)
    }

    /// Latest creation time among this contact's fields
    pub fn newest_field_time(&self) -> Option<DateTime<Utc>> {
        self.fields.iter().map(|f| f.created_at).max()
    }

    /// Merge a patch into this contact, returning whether anything changed
    ///
    /// The id is never touched.
    pub fn apply(&mut self, patch: &ContactPatch) -> bool {
        let mut changed = false;
        if let Some(name) = &patch.name {
            changed |= self.name != *name;
            self.name = name.clone();
        }
        if let Some(who) = &patch.who {
            changed |= self.who != *who;
            self.who = who.clone();
        }
        if let Some(is_favorite) = patch.is_favorite {
            changed |= self.is_favorite != is_favorite;
            self.is_favorite = is_favorite;
        }
        if let Some(fields) = &patch.fields {
            changed |= self.fields != *fields;
            self.fields = fields.clone();
        }
        changed
    }
}

/// Partial update for a contact
///
/// `None` members leave the contact unchanged; `Some` members overwrite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub who: Option<String>,
    pub is_favorite: Option<bool>,
    pub fields: Option<Vec<ContactField>>,
}

impl ContactPatch {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_who(mut self, who: impl Into<String>) -> Self {
        self.who = Some(who.into());
        self
    }

    pub fn with_favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = Some(is_favorite);
        self
    }

    pub fn with_fields(mut self, fields: Vec<ContactField>) -> Self {
        self.fields = Some(fields);
        self
    }

    /// True when the patch would not change anything
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.who.is_none()
            && self.is_favorite.is_none()
            && self.fields.is_none()
    }
}

/// Partial update for a field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    pub label: Option<String>,
    pub value: Option<String>,
    pub is_editing: Option<bool>,
}

impl FieldPatch {
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_editing(mut self, is_editing: bool) -> Self {
        self.is_editing = Some(is_editing);
        self
    }

    /// True when the patch would not change anything
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.value.is_none() && self.is_editing.is_none()
    }
}

/// Input for adding a field; id, timestamp and edit flag are assigned by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewField {
    pub label: String,
    pub value: String,
}

impl NewField {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// The blank field the UI adds before the user names it
    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER_LABEL, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_new() {
        let contact = Contact::new("Alice");
        assert_eq!(contact.name, "Alice");
        assert!(contact.fields.is_empty());
        assert!(!contact.is_favorite);
        assert!(contact.who.is_empty());
    }

    #[test]
    fn test_contact_with_id() {
        let id = Uuid::new_v4();
        let contact = Contact::with_id(id, "Bob");
        assert_eq!(contact.id, id);
        assert_eq!(contact.name, "Bob");
    }

    #[test]
    fn test_field_new_starts_editing() {
        let field = ContactField::new("Email", "a@example.com");
        assert!(field.is_editing);
        assert_eq!(field.label, "Email");
    }

    #[test]
    fn test_field_discardable() {
        assert!(ContactField::new("Email", "").is_discardable());
        assert!(ContactField::new("Email", "   \t").is_discardable());
        assert!(ContactField::new("New Field", "x").is_discardable());
        assert!(ContactField::new("NEW FIELD", "x").is_discardable());
        assert!(ContactField::new("new field", "x").is_discardable());

        assert!(!ContactField::new("Email", "a@example.com").is_discardable());
        // Only an exact placeholder match counts
        assert!(!ContactField::new("New Field 2", "x").is_discardable());
        assert!(!ContactField::new(" New Field", "x").is_discardable());
    }

    #[test]
    fn test_contact_patch_merges_present_members() {
        let mut contact = Contact::new("Alice");
        contact.who = "neighbour".to_string();

        let changed = contact.apply(&ContactPatch::default().with_name("Alicia"));
        assert!(changed);
        assert_eq!(contact.name, "Alicia");
        assert_eq!(contact.who, "neighbour");
        assert!(!contact.is_favorite);

        let changed = contact.apply(&ContactPatch::default().with_favorite(true).with_who(""));
        assert!(changed);
        assert!(contact.is_favorite);
        assert!(contact.who.is_empty());
    }

    #[test]
    fn test_contact_patch_reports_no_change() {
        let mut contact = Contact::new("Alice");
        assert!(!contact.apply(&ContactPatch::default()));
        assert!(!contact.apply(&ContactPatch::default().with_name("Alice")));
    }

    #[test]
    fn test_field_patch() {
        let mut field = ContactField::new("Phone", "555");
        let changed = field.apply(&FieldPatch::default().with_value("556").with_editing(false));
        assert!(changed);
        assert_eq!(field.label, "Phone");
        assert_eq!(field.value, "556");
        assert!(!field.is_editing);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(ContactPatch::default().is_empty());
        assert!(!ContactPatch::default().with_who("x").is_empty());
        assert!(FieldPatch::default().is_empty());
        assert!(!FieldPatch::default().with_editing(true).is_empty());
    }

    #[test]
    fn test_new_field_placeholder() {
        let field = NewField::placeholder();
        assert_eq!(field.label, PLACEHOLDER_LABEL);
        assert!(field.value.is_empty());
    }

    #[test]
    fn test_contact_serialization() {
        let mut contact = Contact::new("Alice");
        contact.fields.push(ContactField::new("Email", "a@example.com"));
        contact.is_favorite = true;
        let json = serde_json::to_string(&contact).unwrap();
        let deserialized: Contact = serde_json::from_str(&json).unwrap();
        assert_eq!(contact, deserialized);
    }

    #[test]
    fn test_contact_deserializes_with_missing_optional_members() {
        let json = r#"{"id":"6f1c6f4e-4b8a-4f43-9a53-3f4b0c6f2a11","name":"Carol"}"#;
        let contact: Contact = serde_json::from_str(json).unwrap();
        assert_eq!(contact.name, "Carol");
        assert!(contact.fields.is_empty());
        assert!(!contact.is_favorite);
        assert!(contact.who.is_empty());
    }
}
