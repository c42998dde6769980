//! Tree Model
//!
//! Read-only derived views over flat folder/note collections, plus pure
//! mutations that return a new model instead of touching the input.
//!
//! # Architecture
//!
//! - **Flat collections**: `folders` and `notes` are the only state
//! - **Derived hierarchy**: children are found by filtering on
//!   `parent_id`/`folder_id` on every read, so no second source of truth exists
//! - **Effective parent**: a pointer naming a folder absent from the model is
//!   read as root, which keeps orphans visible instead of silently dropping them
//! - **Pure mutations**: every `apply_*` clones and returns a new model, which
//!   makes optimistic-update-then-rollback a matter of keeping the old value
//!
//! Scans are O(n) per level, which is fine at note-collection scale.

mod mutations;
mod view;


pub use view::{FolderNode, TreeView};

use crate::models::{Folder, ItemKind, ItemRef, Note, SiblingGroup, TreeSnapshot};
use crate::ordering;
use std::collections::HashSet;

/// Default bound on folder nesting walked by recursive derivations
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Normalized folder/note collections with derived tree views
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeModel {
    folders: Vec<Folder>,
    notes: Vec<Note>,
    max_depth: usize,
}

impl Default for TreeModel {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl TreeModel {
    pub fn new(folders: Vec<Folder>, notes: Vec<Note>) -> Self {
        Self {
            folders,
            notes,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn from_snapshot(snapshot: TreeSnapshot) -> Self {
        Self::new(snapshot.folders, snapshot.notes)
    }

    /// Override the recursion bound used by [`Self::recursive_note_count`] and
    /// [`Self::build_tree`]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn to_snapshot(&self) -> TreeSnapshot {
        TreeSnapshot::new(self.folders.clone(), self.notes.clone())
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn folder(&self, id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn contains(&self, item: &ItemRef) -> bool {
        match item.kind {
            ItemKind::Folder => self.folder(&item.id).is_some(),
            ItemKind::Note => self.note(&item.id).is_some(),
        }
    }

    /// Resolve a bare id to a typed reference (folders win on id clashes)
    pub fn resolve(&self, id: &str) -> Option<ItemRef> {
        if self.folder(id).is_some() {
            Some(ItemRef::folder(id))
        } else if self.note(id).is_some() {
            Some(ItemRef::note(id))
        } else {
            None
        }
    }

    /// Parent pointer exactly as stored (may name a missing folder)
    pub fn stored_parent_of(&self, item: &ItemRef) -> Option<&str> {
        match item.kind {
            ItemKind::Folder => self.folder(&item.id).and_then(|f| f.parent_id.as_deref()),
            ItemKind::Note => self.note(&item.id).and_then(|n| n.folder_id.as_deref()),
        }
    }

    /// Parent used for display and sibling grouping: a pointer to a folder
    /// that does not exist falls back to root
    pub fn effective_parent_of(&self, item: &ItemRef) -> Option<&str> {
        self.stored_parent_of(item)
            .filter(|parent_id| self.folder(parent_id).is_some())
    }

    /// Sibling group the item currently belongs to (`None` if unknown)
    pub fn sibling_group_of(&self, item: &ItemRef) -> Option<SiblingGroup> {
        if !self.contains(item) {
            return None;
        }
        Some(SiblingGroup::new(
            item.kind,
            self.effective_parent_of(item).map(str::to_string),
        ))
    }

    /// Folders whose effective parent is `parent_id`, ordered by position
    pub fn child_folders_of(&self, parent_id: Option<&str>) -> Vec<&Folder> {
        let known = self.folder_ids();
        let mut children: Vec<&Folder> = self
            .folders
            .iter()
            .filter(|f| effective(f.parent_id.as_deref(), &known) == parent_id)
            .collect();
        ordering::sort_by_position(&mut children, |f| f.position);
        children
    }

    /// Notes whose effective folder is `folder_id`, ordered by position
    pub fn child_notes_of(&self, folder_id: Option<&str>) -> Vec<&Note> {
        let known = self.folder_ids();
        let mut children: Vec<&Note> = self
            .notes
            .iter()
            .filter(|n| effective(n.folder_id.as_deref(), &known) == folder_id)
            .collect();
        ordering::sort_by_position(&mut children, |n| n.position);
        children
    }

    /// Ordered ids of a sibling group
    pub fn group_ids(&self, group: &SiblingGroup) -> Vec<String> {
        let parent = group.parent.as_deref();
        match group.kind {
            ItemKind::Folder => self
                .child_folders_of(parent)
                .into_iter()
                .map(|f| f.id.clone())
                .collect(),
            ItemKind::Note => self
                .child_notes_of(parent)
                .into_iter()
                .map(|n| n.id.clone())
                .collect(),
        }
    }

    /// True if `folder_id` is a (strict) descendant of `ancestor_id`
    ///
    /// Walks the stored `parent_id` chain upward from `folder_id`. A visited
    /// set stops the walk on cyclic input, in which case the answer is `false`,
    /// so `is_descendant_of(x, x)` is always `false`.
    pub fn is_descendant_of(&self, folder_id: &str, ancestor_id: &str) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = match self.folder(folder_id) {
            Some(folder) => folder,
            None => return false,
        };
        visited.insert(current.id.as_str());

        for _ in 0..self.max_depth.max(self.folders.len()) {
            let parent_id = match current.parent_id.as_deref() {
                Some(parent_id) => parent_id,
                None => return false,
            };
            if visited.contains(parent_id) {
                tracing::debug!(
                    "Cycle detected while walking ancestors of folder '{}'",
                    folder_id
                );
                return false;
            }
            if parent_id == ancestor_id {
                return true;
            }
            visited.insert(parent_id);
            current = match self.folder(parent_id) {
                Some(parent) => parent,
                None => return false,
            };
        }

        false
    }

    /// Notes directly in the folder plus, recursively, in all child folders
    ///
    /// Terminates on inconsistent links: each folder is counted once and the
    /// walk stops at `max_depth`.
    pub fn recursive_note_count(&self, folder_id: &str) -> usize {
        if self.folder(folder_id).is_none() {
            return 0;
        }
        let mut visited = HashSet::new();
        self.count_notes(folder_id, 0, &mut visited)
    }

    fn count_notes<'a>(
        &'a self,
        folder_id: &'a str,
        depth: usize,
        visited: &mut HashSet<&'a str>,
    ) -> usize {
        if depth >= self.max_depth || !visited.insert(folder_id) {
            return 0;
        }
        let direct = self
            .notes
            .iter()
            .filter(|n| n.folder_id.as_deref() == Some(folder_id))
            .count();
        let nested: usize = self
            .folders
            .iter()
            .filter(|f| f.parent_id.as_deref() == Some(folder_id))
            .map(|f| self.count_notes(&f.id, depth + 1, visited))
            .sum();
        direct + nested
    }

    /// Ids of `folder_id` and every folder below it (cycle-safe)
    pub fn subtree_folder_ids(&self, folder_id: &str) -> HashSet<String> {
        let mut found: HashSet<String> = HashSet::new();
        let mut stack = vec![folder_id.to_string()];
        while let Some(id) = stack.pop() {
            if !found.insert(id.clone()) {
                continue;
            }
            stack.extend(
                self.folders
                    .iter()
                    .filter(|f| f.parent_id.as_deref() == Some(id.as_str()))
                    .map(|f| f.id.clone()),
            );
        }
        found
    }

    fn folder_ids(&self) -> HashSet<&str> {
        self.folders.iter().map(|f| f.id.as_str()).collect()
    }
}

/// Stored parent if it names a known folder, otherwise root
fn effective<'a>(parent_id: Option<&'a str>, known: &HashSet<&str>) -> Option<&'a str> {
    parent_id.filter(|id| known.contains(id))
}
