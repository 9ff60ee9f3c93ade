//! Note domain record.
//!
//! # Responsibility
//! - Define the record stored in the note tree: identity, title, formatted
//!   content and tree links.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `children` and `parent_id` are owned by `NoteTree`; a detached `Note`
//!   value only mirrors them.

use crate::model::attributed_text::AttributedText;
use uuid::Uuid;

/// Stable identifier of one note.
pub type NoteId = Uuid;

/// Title used when a note is saved with a blank title.
pub const UNTITLED_NOTE_TITLE: &str = "Untitled Note";

/// One node of the note tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: AttributedText,
    /// Ordered child ids.
    pub children: Vec<NoteId>,
    /// `None` for root-level notes.
    pub parent_id: Option<NoteId>,
}

impl Note {
    /// Creates a detached root-level note with a generated id.
    pub fn new(title: impl Into<String>, content: AttributedText) -> Self {
        Self::with_id(Uuid::new_v4(), title, content)
    }

    /// Creates a detached note with a caller-provided id.
    ///
    /// Used when loading persisted records whose identity already exists.
    pub fn with_id(id: NoteId, title: impl Into<String>, content: AttributedText) -> Self {
        Self {
            id,
            title: title.into(),
            content,
            children: Vec::new(),
            parent_id: None,
        }
    }

    /// Returns the plain text of the note content.
    pub fn plain_text(&self) -> &str {
        self.content.text()
    }
}
