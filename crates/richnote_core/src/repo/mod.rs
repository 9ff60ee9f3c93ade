//! Repository layer for note persistence.
//!
//! # Responsibility
//! - Define the data access contract the note service depends on.
//! - Isolate SQLite query details from tree orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod note_repo;
