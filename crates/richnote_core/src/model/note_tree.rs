//! In-memory note tree arena.
//!
//! # Responsibility
//! - Hold every note record keyed by id, with children as ordered id lists.
//! - Provide the structural mutations consumed by the note service.
//!
//! # Invariants
//! - Every id in `roots` or in a `children` list refers to a stored note.
//! - A note appears in exactly one children list, or in `roots` when its
//!   `parent_id` is `None`.
//! - Removing a note removes its whole subtree.

use crate::model::note::{Note, NoteId};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from note tree mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Target note does not exist.
    NotFound(NoteId),
    /// Requested parent does not exist.
    ParentNotFound(NoteId),
    /// A note with this id is already stored.
    DuplicateId(NoteId),
    /// Replacement children are not a reordering of the current children.
    ChildrenMismatch(NoteId),
}

impl Display for TreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent note not found: {id}"),
            Self::DuplicateId(id) => write!(f, "note already exists: {id}"),
            Self::ChildrenMismatch(id) => {
                write!(f, "children of note {id} can only be reordered")
            }
        }
    }
}

impl Error for TreeError {}

/// Arena of notes addressed by id.
#[derive(Debug, Clone, Default)]
pub struct NoteTree {
    nodes: HashMap<NoteId, Note>,
    roots: Vec<NoteId>,
}

impl NoteTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NoteId] {
        &self.roots
    }

    pub fn find_by_id(&self, id: NoteId) -> Option<&Note> {
        self.nodes.get(&id)
    }

    /// Ordered child ids of `id`, or root ids when `id` is `None`.
    pub fn children_of(&self, id: Option<NoteId>) -> Option<&[NoteId]> {
        match id {
            None => Some(&self.roots),
            Some(id) => self.nodes.get(&id).map(|note| note.children.as_slice()),
        }
    }

    /// Attaches `note` as the last child of `parent_id` (or as a root).
    ///
    /// The stored record takes its `parent_id` from the call and starts with
    /// no children; the caller's `children` field is ignored.
    ///
    /// # Errors
    /// - `DuplicateId` when `note.id` is already stored.
    /// - `ParentNotFound` when `parent_id` is unknown.
    pub fn append_child(
        &mut self,
        parent_id: Option<NoteId>,
        mut note: Note,
    ) -> Result<NoteId, TreeError> {
        let id = note.id;
        if self.nodes.contains_key(&id) {
            return Err(TreeError::DuplicateId(id));
        }
        match parent_id {
            Some(parent) => self
                .nodes
                .get_mut(&parent)
                .ok_or(TreeError::ParentNotFound(parent))?
                .children
                .push(id),
            None => self.roots.push(id),
        }
        note.parent_id = parent_id;
        note.children.clear();
        self.nodes.insert(id, note);
        Ok(id)
    }

    /// Replaces title, content and child order of an existing note.
    ///
    /// The tree position (`parent_id`) is kept from the stored record.
    ///
    /// # Errors
    /// - `NotFound` when `id` is unknown.
    /// - `ChildrenMismatch` when `note.children` adds or drops a child.
    pub fn replace(&mut self, id: NoteId, note: Note) -> Result<&Note, TreeError> {
        let stored = self.nodes.get_mut(&id).ok_or(TreeError::NotFound(id))?;
        if !is_permutation(&stored.children, &note.children) {
            return Err(TreeError::ChildrenMismatch(id));
        }
        stored.title = note.title;
        stored.content = note.content;
        stored.children = note.children;
        Ok(&*stored)
    }

    /// Ids of `id` and all its descendants in depth-first order, or `None`
    /// when `id` is unknown.
    pub fn subtree_ids(&self, id: NoteId) -> Option<Vec<NoteId>> {
        self.nodes.get(&id)?;
        let mut ids = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(note) = self.nodes.get(&current) {
                stack.extend(note.children.iter().rev().copied());
                ids.push(current);
            }
        }
        Some(ids)
    }

    /// Removes `id` and all its descendants, returning removed notes in
    /// depth-first order (the target first).
    ///
    /// # Errors
    /// - `NotFound` when `id` is unknown.
    pub fn remove_subtree(&mut self, id: NoteId) -> Result<Vec<Note>, TreeError> {
        let parent_id = self
            .nodes
            .get(&id)
            .ok_or(TreeError::NotFound(id))?
            .parent_id;
        match parent_id.and_then(|parent| self.nodes.get_mut(&parent)) {
            Some(parent) => parent.children.retain(|child| *child != id),
            None => self.roots.retain(|root| *root != id),
        }

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(note) = self.nodes.remove(&current) {
                stack.extend(note.children.iter().rev().copied());
                removed.push(note);
            }
        }
        Ok(removed)
    }

    /// Visits every note depth-first in child order, with its depth.
    pub fn walk(&self) -> Vec<(usize, &Note)> {
        let mut visited = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, NoteId)> =
            self.roots.iter().rev().map(|id| (0, *id)).collect();
        while let Some((depth, id)) = stack.pop() {
            if let Some(note) = self.nodes.get(&id) {
                stack.extend(note.children.iter().rev().map(|child| (depth + 1, *child)));
                visited.push((depth, note));
            }
        }
        visited
    }
}

fn is_permutation(current: &[NoteId], proposed: &[NoteId]) -> bool {
    if current.len() != proposed.len() {
        return false;
    }
    let current: HashSet<_> = current.iter().collect();
    let proposed: HashSet<_> = proposed.iter().collect();
    current == proposed
}

#[cfg(test)]
mod tests {
    use super::{NoteTree, TreeError};
    use crate::model::attributed_text::AttributedText;
    use crate::model::note::Note;
    use crate::model::style::StyleAttributes;

    fn note(title: &str) -> Note {
        Note::new(
            title,
            AttributedText::from_plain_text(title, StyleAttributes::default()),
        )
    }

    #[test]
    fn append_child_links_parent_and_child() {
        let mut tree = NoteTree::new();
        let root = tree.append_child(None, note("root")).unwrap();
        let child = tree.append_child(Some(root), note("child")).unwrap();

        assert_eq!(tree.roots(), &[root]);
        assert_eq!(tree.children_of(Some(root)).unwrap(), &[child]);
        assert_eq!(tree.find_by_id(child).unwrap().parent_id, Some(root));
    }

    #[test]
    fn append_child_rejects_unknown_parent_and_duplicates() {
        let mut tree = NoteTree::new();
        let orphan = note("orphan");
        let missing = note("missing").id;
        assert_eq!(
            tree.append_child(Some(missing), orphan.clone()).unwrap_err(),
            TreeError::ParentNotFound(missing)
        );

        tree.append_child(None, orphan.clone()).unwrap();
        assert_eq!(
            tree.append_child(None, orphan.clone()).unwrap_err(),
            TreeError::DuplicateId(orphan.id)
        );
    }

    #[test]
    fn replace_rejects_foreign_children() {
        let mut tree = NoteTree::new();
        let root = tree.append_child(None, note("root")).unwrap();
        let mut updated = tree.find_by_id(root).unwrap().clone();
        updated.children.push(note("stray").id);
        assert_eq!(
            tree.replace(root, updated).unwrap_err(),
            TreeError::ChildrenMismatch(root)
        );
    }

    #[test]
    fn remove_subtree_matches_subtree_ids() {
        let mut tree = NoteTree::new();
        let root = tree.append_child(None, note("root")).unwrap();
        let keep = tree.append_child(None, note("keep")).unwrap();
        let child = tree.append_child(Some(root), note("child")).unwrap();
        let grandchild = tree.append_child(Some(child), note("grandchild")).unwrap();

        let ids = tree.subtree_ids(root).unwrap();
        assert_eq!(ids, vec![root, child, grandchild]);

        let removed: Vec<_> = tree
            .remove_subtree(root)
            .unwrap()
            .into_iter()
            .map(|note| note.id)
            .collect();
        assert_eq!(removed, ids);
        assert_eq!(tree.roots(), &[keep]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.remove_subtree(root).unwrap_err(), TreeError::NotFound(root));
    }

    #[test]
    fn walk_is_depth_first_in_child_order() {
        let mut tree = NoteTree::new();
        let a = tree.append_child(None, note("a")).unwrap();
        let b = tree.append_child(None, note("b")).unwrap();
        let a1 = tree.append_child(Some(a), note("a1")).unwrap();
        let a1x = tree.append_child(Some(a1), note("a1x")).unwrap();
        let a2 = tree.append_child(Some(a), note("a2")).unwrap();

        let order: Vec<_> = tree
            .walk()
            .into_iter()
            .map(|(depth, note)| (depth, note.id))
            .collect();
        assert_eq!(order, vec![(0, a), (1, a1), (2, a1x), (1, a2), (0, b)]);
    }
}
