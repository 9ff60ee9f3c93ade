//! Note use-case service.
//!
//! # Responsibility
//! - Own the in-memory note tree and keep it in step with storage.
//! - Expose add/update/delete mutations and formatting session hand-off.
//! - Derive list previews for the note outline.
//!
//! # Invariants
//! - A mutation is visible in the tree only after its rows are persisted.
//! - A failed load never blocks startup; it yields an empty collection.
//! - Log events carry ids and counts, never note text.

use crate::codec::{self, CodecError};
use crate::config::EditorConfig;
use crate::model::attributed_text::{AttributedText, TextError};
use crate::model::note::{Note, NoteId, UNTITLED_NOTE_TITLE};
use crate::model::note_tree::{NoteTree, TreeError};
use crate::model::run::StyleRun;
use crate::model::style::StyleAttributes;
use crate::model::utf16;
use crate::repo::note_repo::{NoteRepository, RepoError, StoredNote};
use crate::session::FormattingSession;
use log::{error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PREVIEW_MAX_CHARS: usize = 100;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// New notes require a non-blank title.
    InvalidTitle,
    /// Target note (or requested parent) does not exist.
    NotFound(NoteId),
    /// Structural mutation rejected by the tree.
    Tree(TreeError),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Content cannot be encoded for storage.
    Codec(CodecError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "note title cannot be blank"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::Tree(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Tree(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::InvalidTitle | Self::NotFound(_) => None,
        }
    }
}

impl From<TreeError> for NoteServiceError {
    fn from(value: TreeError) -> Self {
        match value {
            TreeError::NotFound(id) | TreeError::ParentNotFound(id) => Self::NotFound(id),
            other => Self::Tree(other),
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<CodecError> for NoteServiceError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

impl From<TextError> for NoteServiceError {
    fn from(value: TextError) -> Self {
        Self::Codec(value.into())
    }
}

/// One line of the note outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSummary {
    pub id: NoteId,
    pub title: String,
    /// Nesting depth; roots are 0.
    pub depth: usize,
    /// Whitespace-collapsed start of the plain text.
    pub preview: String,
}

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
    tree: NoteTree,
    editor: EditorConfig,
}

impl<R: NoteRepository> NoteService<R> {
    /// Loads every stored note into a tree.
    ///
    /// Storage failures are logged and produce an empty collection.
    /// Unreadable content blobs load as empty text. Notes whose parent is
    /// missing (or unreachable from a root) are re-rooted.
    pub fn load(repo: R, editor: EditorConfig) -> Self {
        let rows = match repo.load_all() {
            Ok(rows) => rows,
            Err(err) => {
                error!(
                    "event=notes_load module=service status=error error={}",
                    err
                );
                Vec::new()
            }
        };
        let row_count = rows.len();
        let (tree, rerooted) = build_tree(rows, &editor.default_style);
        info!(
            "event=notes_load module=service status=ok rows={} loaded={} rerooted={}",
            row_count,
            tree.len(),
            rerooted
        );
        Self { repo, tree, editor }
    }

    pub fn tree(&self) -> &NoteTree {
        &self.tree
    }

    pub fn editor_config(&self) -> &EditorConfig {
        &self.editor
    }

    pub fn find_by_id(&self, id: NoteId) -> Option<&Note> {
        self.tree.find_by_id(id)
    }

    /// Seeds example notes when both the tree and storage are empty.
    ///
    /// Returns `true` when notes were seeded. Unreadable rows count as
    /// stored notes, so a partly corrupt store is never seeded again.
    pub fn bootstrap_if_empty(&mut self) -> Result<bool, NoteServiceError> {
        if !self.tree.is_empty() {
            return Ok(false);
        }
        let stored = self.repo.count_notes()?;
        if stored > 0 {
            info!(
                "event=notes_bootstrap module=service status=skipped stored_rows={}",
                stored
            );
            return Ok(false);
        }

        let base = self.editor.default_style;
        let welcome = self.add_note(
            "Welcome to Richnote",
            styled(
                &[
                    ("This is your ", base),
                    ("first", base.with_bold(true)),
                    (" note!", base),
                ],
                base,
            )?,
            None,
        )?;
        self.add_note(
            "Nested notes",
            styled(
                &[
                    ("Notes can hold ", base),
                    ("child", base.with_italic(true)),
                    (" notes.", base),
                ],
                base,
            )?,
            Some(welcome),
        )?;
        self.add_note(
            "Rust Practice",
            styled(
                &[
                    ("Learning Rust is ", base),
                    ("fun", base.with_bold(true).with_italic(true)),
                    ("!", base),
                ],
                base,
            )?,
            None,
        )?;

        info!(
            "event=notes_bootstrap module=service status=ok seeded={}",
            self.tree.len()
        );
        Ok(true)
    }

    /// Creates a note as the last child of `parent_id` (or as a root).
    ///
    /// # Errors
    /// - `InvalidTitle` for a blank title.
    /// - `NotFound` when `parent_id` is unknown.
    pub fn add_note(
        &mut self,
        title: impl Into<String>,
        content: AttributedText,
        parent_id: Option<NoteId>,
    ) -> Result<NoteId, NoteServiceError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(NoteServiceError::InvalidTitle);
        }
        let siblings = match parent_id {
            None => self.tree.roots().len(),
            Some(parent) => self
                .tree
                .children_of(Some(parent))
                .ok_or(NoteServiceError::NotFound(parent))?
                .len(),
        };

        let note = Note::new(title, content);
        self.repo.upsert_note(&StoredNote {
            id: note.id,
            parent_id,
            title: note.title.clone(),
            content: codec::encode(&note.content)?,
            sort_order: to_sort_order(siblings),
        })?;
        let id = self.tree.append_child(parent_id, note)?;

        info!(
            "event=note_add module=service status=ok note_id={} parent_id={:?}",
            id, parent_id
        );
        Ok(id)
    }

    /// Replaces title, content and child order of an existing note.
    ///
    /// A blank title is saved as `"Untitled Note"`. The tree is restored
    /// when persistence fails.
    ///
    /// # Errors
    /// - `NotFound` when `note.id` is unknown.
    /// - `Tree` when `note.children` is not a reordering of the stored list.
    pub fn update_note(&mut self, mut note: Note) -> Result<&Note, NoteServiceError> {
        let id = note.id;
        let previous = self
            .tree
            .find_by_id(id)
            .cloned()
            .ok_or(NoteServiceError::NotFound(id))?;
        if note.title.trim().is_empty() {
            note.title = UNTITLED_NOTE_TITLE.to_string();
        }
        let content = codec::encode(&note.content)?;
        let reordered = note.children != previous.children;

        self.tree.replace(id, note)?;
        let row = StoredNote {
            id,
            parent_id: previous.parent_id,
            title: self
                .tree
                .find_by_id(id)
                .map_or_else(String::new, |stored| stored.title.clone()),
            content,
            sort_order: self.sibling_position(previous.parent_id, id),
        };
        let persisted = self.repo.upsert_note(&row).and_then(|()| {
            match (reordered, self.tree.children_of(Some(id))) {
                (true, Some(children)) => self.repo.update_sort_orders(children),
                _ => Ok(()),
            }
        });
        if let Err(err) = persisted {
            error!(
                "event=note_update module=service status=error note_id={} error={}",
                id, err
            );
            if let Err(restore_err) = self.tree.replace(id, previous) {
                warn!(
                    "event=note_update module=service status=rollback_failed note_id={} error={}",
                    id, restore_err
                );
            }
            return Err(err.into());
        }

        info!(
            "event=note_update module=service status=ok note_id={} reordered={}",
            id, reordered
        );
        self.tree
            .find_by_id(id)
            .ok_or(NoteServiceError::NotFound(id))
    }

    /// Publishes edited content for one note.
    pub fn save_content(
        &mut self,
        id: NoteId,
        content: AttributedText,
    ) -> Result<&Note, NoteServiceError> {
        let mut note = self
            .tree
            .find_by_id(id)
            .cloned()
            .ok_or(NoteServiceError::NotFound(id))?;
        note.content = content;
        self.update_note(note)
    }

    /// Deletes a note and its whole subtree, returning the number removed.
    pub fn delete_note(&mut self, id: NoteId) -> Result<usize, NoteServiceError> {
        let ids = self
            .tree
            .subtree_ids(id)
            .ok_or(NoteServiceError::NotFound(id))?;
        let deleted_rows = self.repo.delete_notes(&ids)?;
        let removed = self.tree.remove_subtree(id)?;

        info!(
            "event=note_delete module=service status=ok note_id={} removed={} deleted_rows={}",
            id,
            removed.len(),
            deleted_rows
        );
        Ok(removed.len())
    }

    /// Opens a formatting session over the stored content of `id`.
    pub fn open_session(&self, id: NoteId) -> Result<FormattingSession, NoteServiceError> {
        let note = self
            .tree
            .find_by_id(id)
            .ok_or(NoteServiceError::NotFound(id))?;
        Ok(FormattingSession::new(
            note.content.clone(),
            self.editor.clone(),
        ))
    }

    /// Lists every note depth-first with its preview.
    pub fn outline(&self) -> Vec<NoteSummary> {
        self.tree
            .walk()
            .into_iter()
            .map(|(depth, note)| NoteSummary {
                id: note.id,
                title: note.title.clone(),
                depth,
                preview: derive_preview(note.plain_text()),
            })
            .collect()
    }

    fn sibling_position(&self, parent_id: Option<NoteId>, id: NoteId) -> i64 {
        self.tree
            .children_of(parent_id)
            .and_then(|siblings| siblings.iter().position(|sibling| *sibling == id))
            .map_or(0, to_sort_order)
    }
}

/// Collapses whitespace runs and keeps the first 100 chars of `text`.
pub fn derive_preview(text: &str) -> String {
    let normalized = WHITESPACE_RE.replace_all(text, " ");
    normalized.trim().chars().take(PREVIEW_MAX_CHARS).collect()
}

fn to_sort_order(position: usize) -> i64 {
    i64::try_from(position).unwrap_or(i64::MAX)
}

fn styled(
    segments: &[(&str, StyleAttributes)],
    fallback: StyleAttributes,
) -> Result<AttributedText, TextError> {
    let mut text = String::new();
    let mut runs = Vec::with_capacity(segments.len());
    let mut cursor = 0;
    for (segment, style) in segments {
        let end = cursor + utf16::len(segment);
        if end > cursor {
            runs.push(StyleRun::new(cursor..end, *style));
        }
        text.push_str(segment);
        cursor = end;
    }
    if runs.is_empty() {
        return Ok(AttributedText::from_plain_text(text, fallback));
    }
    AttributedText::from_runs(text, runs)
}

fn build_tree(rows: Vec<StoredNote>, default_style: &StyleAttributes) -> (NoteTree, usize) {
    let known: HashSet<NoteId> = rows.iter().map(|row| row.id).collect();
    let mut pending: HashMap<Option<NoteId>, Vec<StoredNote>> = HashMap::new();
    let mut rerooted = 0;
    for mut row in rows {
        if row.parent_id.is_some_and(|parent| !known.contains(&parent)) {
            row.parent_id = None;
            rerooted += 1;
        }
        pending.entry(row.parent_id).or_default().push(row);
    }

    let mut tree = NoteTree::new();
    let mut queue = VecDeque::from([None]);
    loop {
        while let Some(parent_id) = queue.pop_front() {
            for row in pending.remove(&parent_id).unwrap_or_default() {
                let note = Note::with_id(
                    row.id,
                    row.title,
                    codec::decode_with_default(&row.content, default_style),
                );
                match tree.append_child(parent_id, note) {
                    Ok(id) => queue.push_back(Some(id)),
                    Err(err) => warn!(
                        "event=notes_load module=service status=skipped note_id={} error={}",
                        row.id, err
                    ),
                }
            }
        }

        // Rows left here only reference each other through parent cycles.
        let Some(row) = take_unreachable(&mut pending) else {
            break;
        };
        rerooted += 1;
        pending.entry(None).or_default().push(row);
        queue.push_back(None);
    }
    (tree, rerooted)
}

fn take_unreachable(pending: &mut HashMap<Option<NoteId>, Vec<StoredNote>>) -> Option<StoredNote> {
    let (parent_id, index) = pending
        .iter()
        .flat_map(|(parent_id, rows)| {
            rows.iter()
                .enumerate()
                .map(move |(index, row)| (*parent_id, index, row.sort_order, row.id))
        })
        .min_by_key(|(_, _, sort_order, id)| (*sort_order, *id))
        .map(|(parent_id, index, _, _)| (parent_id, index))?;

    let rows = pending.get_mut(&parent_id)?;
    let mut row = rows.remove(index);
    if rows.is_empty() {
        pending.remove(&parent_id);
    }
    row.parent_id = None;
    Some(row)
}
