//! Domain model for formatted notes.
//!
//! # Responsibility
//! - Define the attributed-text representation and its style runs.
//! - Define note records and the arena tree that holds them.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.
//! - Attributed text values are immutable; edits return new values.

pub mod attributed_text;
pub mod note;
pub mod note_tree;
pub mod run;
pub mod selection;
pub mod style;
pub mod utf16;
