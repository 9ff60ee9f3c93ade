//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist note rows (title, encoded content, tree position).
//! - Load every stored row for tree reconstruction at startup.
//!
//! # Invariants
//! - Content is stored as opaque codec bytes; this layer never decodes it.
//! - `sort_order` reflects the position of a note among its siblings.
//! - Multi-row writes run in one immediate transaction.

use crate::db::migrations::latest_version;
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::note::NoteId;
use log::{error, warn};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(NoteId),
    /// Persisted data cannot be converted to a valid row.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "stored note not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "note repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "note repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "note repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One persisted note row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredNote {
    pub id: NoteId,
    pub parent_id: Option<NoteId>,
    pub title: String,
    /// Codec bytes of the note content.
    pub content: Vec<u8>,
    /// Position among siblings.
    pub sort_order: i64,
}

/// Repository interface for note rows.
pub trait NoteRepository {
    /// Returns every readable row ordered by `sort_order` then `created_at`.
    ///
    /// Rows that cannot be parsed are logged and skipped.
    fn load_all(&self) -> RepoResult<Vec<StoredNote>>;
    /// Number of stored rows, readable or not.
    fn count_notes(&self) -> RepoResult<usize>;
    /// Inserts `note` or overwrites the row with the same id.
    fn upsert_note(&self, note: &StoredNote) -> RepoResult<()>;
    /// Deletes the given rows in one transaction, returning the number removed.
    fn delete_notes(&self, ids: &[NoteId]) -> RepoResult<usize>;
    /// Rewrites `sort_order` of `ordered_ids` to their slice positions.
    ///
    /// # Errors
    /// - `NotFound` when any id has no stored row; nothing is written.
    fn update_sort_orders(&self, ordered_ids: &[NoteId]) -> RepoResult<()>;
}

/// Backing of a connection returned by [`open_note_store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOrigin {
    File,
    /// The file could not be opened or has an unusable schema; notes live
    /// in memory for this process only.
    InMemoryFallback,
}

/// Opens the note store at `path`, ready for [`SqliteNoteRepository`].
///
/// A file that is not a database, is newer than this build, or lacks the
/// notes schema is logged and replaced by an empty in-memory store. The file
/// itself is left untouched.
///
/// # Errors
/// - Only when the in-memory fallback cannot be opened either.
pub fn open_note_store(path: impl AsRef<Path>) -> RepoResult<(Connection, StoreOrigin)> {
    let opened = open_db(path.as_ref())
        .map_err(RepoError::from)
        .and_then(|conn| ensure_connection_ready(&conn).map(|()| conn));
    match opened {
        Ok(conn) => Ok((conn, StoreOrigin::File)),
        Err(err) => {
            error!(
                "event=notes_load module=repo status=error fallback=memory error={}",
                err
            );
            Ok((open_db_in_memory()?, StoreOrigin::InMemoryFallback))
        }
    }
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` on schema drift.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn load_all(&self) -> RepoResult<Vec<StoredNote>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, parent_id, title, content, sort_order
             FROM notes
             ORDER BY sort_order ASC, created_at ASC, id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        let mut skipped = 0usize;
        while let Some(row) = rows.next()? {
            match parse_note_row(row) {
                Ok(note) => notes.push(note),
                Err(err) => {
                    skipped += 1;
                    warn!(
                        "event=notes_load module=repo status=skipped row={} error={}",
                        notes.len() + skipped,
                        err
                    );
                }
            }
        }
        Ok(notes)
    }

    fn count_notes(&self) -> RepoResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("invalid note count {count}")))
    }

    fn upsert_note(&self, note: &StoredNote) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO notes (id, parent_id, title, content, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                parent_id = excluded.parent_id,
                title = excluded.title,
                content = excluded.content,
                sort_order = excluded.sort_order,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                note.id.to_string(),
                note.parent_id.map(|id| id.to_string()),
                note.title.as_str(),
                note.content.as_slice(),
                note.sort_order,
            ],
        )?;
        Ok(())
    }

    fn delete_notes(&self, ids: &[NoteId]) -> RepoResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM notes WHERE id = ?1;")?;
            for id in ids {
                removed += stmt.execute([id.to_string()])?;
            }
        }
        tx.commit()?;
        Ok(removed)
    }

    fn update_sort_orders(&self, ordered_ids: &[NoteId]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        {
            let mut stmt = tx.prepare(
                "UPDATE notes
                 SET sort_order = ?1, updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?2;",
            )?;
            for (index, id) in ordered_ids.iter().enumerate() {
                let position = i64::try_from(index).map_err(|_| {
                    RepoError::InvalidData(format!("sort order overflow at {index}"))
                })?;
                if stmt.execute(params![position, id.to_string()])? == 0 {
                    // Dropping `tx` without commit rolls back earlier rows.
                    return Err(RepoError::NotFound(*id));
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<StoredNote> {
    let id_text: String = row.get("id")?;
    let parent_text: Option<String> = row.get("parent_id")?;
    Ok(StoredNote {
        id: parse_uuid(&id_text, "notes.id")?,
        parent_id: parent_text
            .as_deref()
            .map(|value| parse_uuid(value, "notes.parent_id"))
            .transpose()?,
        title: row.get("title")?,
        content: row.get("content")?,
        sort_order: row.get("sort_order")?,
    })
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "notes")? {
        return Err(RepoError::MissingRequiredTable("notes"));
    }
    for column in ["id", "parent_id", "title", "content", "sort_order"] {
        if !table_has_column(conn, "notes", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "notes",
                column,
            });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::{NoteRepository, RepoError, SqliteNoteRepository, StoredNote};
    use crate::db::open_db_in_memory;
    use rusqlite::Connection;
    use uuid::Uuid;

    fn row(parent_id: Option<Uuid>, title: &str, sort_order: i64) -> StoredNote {
        StoredNote {
            id: Uuid::new_v4(),
            parent_id,
            title: title.to_string(),
            content: title.as_bytes().to_vec(),
            sort_order,
        }
    }

    #[test]
    fn try_new_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteNoteRepository::try_new(&conn).err().unwrap();
        assert!(matches!(
            err,
            RepoError::UninitializedConnection {
                actual_version: 0,
                ..
            }
        ));
    }

    #[test]
    fn load_all_skips_unreadable_rows() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteNoteRepository::try_new(&conn).unwrap();
        let good = row(None, "good", 0);
        repo.upsert_note(&good).unwrap();
        conn.execute(
            "INSERT INTO notes (id, title, content) VALUES ('not-a-uuid', 'bad', x'');",
            [],
        )
        .unwrap();

        assert_eq!(repo.load_all().unwrap(), vec![good]);
        assert_eq!(repo.count_notes().unwrap(), 2);
    }

    #[test]
    fn upsert_overwrites_existing_row() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteNoteRepository::try_new(&conn).unwrap();
        let mut note = row(None, "draft", 0);
        repo.upsert_note(&note).unwrap();
        note.title = "final".to_string();
        repo.upsert_note(&note).unwrap();

        assert_eq!(repo.load_all().unwrap(), vec![note]);
    }

    #[test]
    fn deleting_parent_cascades_to_children() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteNoteRepository::try_new(&conn).unwrap();
        let parent = row(None, "parent", 0);
        let child = row(Some(parent.id), "child", 0);
        repo.upsert_note(&parent).unwrap();
        repo.upsert_note(&child).unwrap();

        assert_eq!(repo.delete_notes(&[parent.id]).unwrap(), 1);
        assert!(repo.load_all().unwrap().is_empty());
    }

    #[test]
    fn update_sort_orders_rolls_back_on_unknown_id() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteNoteRepository::try_new(&conn).unwrap();
        let a = row(None, "a", 0);
        let b = row(None, "b", 1);
        repo.upsert_note(&a).unwrap();
        repo.upsert_note(&b).unwrap();

        let missing = Uuid::new_v4();
        let err = repo.update_sort_orders(&[b.id, missing]).unwrap_err();
        assert!(matches!(err, RepoError::NotFound(id) if id == missing));

        let titles: Vec<_> = repo.load_all().unwrap().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["a", "b"]);

        repo.update_sort_orders(&[b.id, a.id]).unwrap();
        let titles: Vec<_> = repo.load_all().unwrap().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["b", "a"]);
    }
}
