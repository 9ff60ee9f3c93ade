//! Core domain logic for Richnote.
//! Rich-text note content, formatting sessions and the persisted note tree.

pub mod codec;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;

pub use codec::{decode, decode_with_default, encode, try_decode, CodecError, CODEC_VERSION};
pub use config::{CoreConfig, EditorConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{
    default_log_level, init_from_config, init_logging, logging_status, LoggingError,
};
pub use model::attributed_text::{AttributedText, TextError};
pub use model::note::{Note, NoteId, UNTITLED_NOTE_TITLE};
pub use model::note_tree::{NoteTree, TreeError};
pub use model::run::StyleRun;
pub use model::selection::Selection;
pub use model::style::{Rgba, StyleAttributes, DEFAULT_FONT_SIZE};
pub use repo::note_repo::{
    open_note_store, NoteRepository, RepoError, RepoResult, SqliteNoteRepository, StoreOrigin,
    StoredNote,
};
pub use service::note_service::{NoteService, NoteServiceError, NoteSummary};
pub use session::{FormatAction, FormatOutcome, FormattingSession, FormattingState, ToggleState};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
