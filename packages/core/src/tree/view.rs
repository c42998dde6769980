//! Nested tree view derived from the flat collections

use super::TreeModel;
use crate::models::{Folder, Note};
use crate::ordering;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A folder with its ordered children and recursive note count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderNode {
    pub folder: Folder,
    pub note_count: usize,
    pub folders: Vec<FolderNode>,
    pub notes: Vec<Note>,
}

/// Root-level view: root folders (recursively) plus root notes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeView {
    pub folders: Vec<FolderNode>,
    pub notes: Vec<Note>,
}

impl TreeView {
    /// Depth-first (pre-order) list of every folder id in display order
    pub fn folder_ids(&self) -> Vec<&str> {
        fn walk<'a>(nodes: &'a [FolderNode], out: &mut Vec<&'a str>) {
            for node in nodes {
                out.push(node.folder.id.as_str());
                walk(&node.folders, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.folders, &mut out);
        out
    }
}

impl TreeModel {
    /// Build the nested view used for rendering
    ///
    /// Children are indexed once by effective parent, so the build is linear.
    /// Folders unreachable from root (caught in a parent cycle) are shown at
    /// root after the regular root folders; the walk stops at `max_depth`.
    pub fn build_tree(&self) -> TreeView {
        let known: HashSet<&str> = self.folders.iter().map(|f| f.id.as_str()).collect();

        let mut folders_by_parent: HashMap<Option<&str>, Vec<&Folder>> = HashMap::new();
        for folder in &self.folders {
            let parent = folder.parent_id.as_deref().filter(|id| known.contains(id));
            folders_by_parent.entry(parent).or_default().push(folder);
        }
        let mut notes_by_folder: HashMap<Option<&str>, Vec<&Note>> = HashMap::new();
        for note in &self.notes {
            let parent = note.folder_id.as_deref().filter(|id| known.contains(id));
            notes_by_folder.entry(parent).or_default().push(note);
        }
        for children in folders_by_parent.values_mut() {
            ordering::sort_by_position(children, |f| f.position);
        }
        for children in notes_by_folder.values_mut() {
            ordering::sort_by_position(children, |n| n.position);
        }

        let index = ChildIndex {
            folders: folders_by_parent,
            notes: notes_by_folder,
            max_depth: self.max_depth,
        };
        let mut visited = HashSet::new();
        let mut folders = index.build_level(None, 0, &mut visited);

        let mut stranded: Vec<&Folder> = self
            .folders
            .iter()
            .filter(|f| !visited.contains(f.id.as_str()) && self.on_parent_cycle(f, &known))
            .collect();
        ordering::sort_by_position(&mut stranded, |f| f.position);
        for folder in stranded {
            // an earlier stranded folder may have pulled this one in
            if !visited.insert(folder.id.as_str()) {
                continue;
            }
            tracing::warn!(
                "Folder {} is not reachable from root (parent cycle); showing it at root",
                folder.id
            );
            folders.push(index.build_node(folder, 0, &mut visited));
        }

        TreeView {
            folders,
            notes: index.notes_of(None),
        }
    }

    /// True when walking up from `folder` comes back to `folder`
    fn on_parent_cycle(&self, folder: &Folder, known: &HashSet<&str>) -> bool {
        let mut seen = HashSet::new();
        let mut current = folder.parent_id.as_deref().filter(|id| known.contains(id));
        while let Some(id) = current {
            if id == folder.id {
                return true;
            }
            if !seen.insert(id) {
                return false;
            }
            current = self
                .folder(id)
                .and_then(|f| f.parent_id.as_deref())
                .filter(|id| known.contains(id));
        }
        false
    }
}

struct ChildIndex<'a> {
    folders: HashMap<Option<&'a str>, Vec<&'a Folder>>,
    notes: HashMap<Option<&'a str>, Vec<&'a Note>>,
    max_depth: usize,
}

impl<'a> ChildIndex<'a> {
    fn notes_of(&self, parent: Option<&'a str>) -> Vec<Note> {
        self.notes
            .get(&parent)
            .map(|notes| notes.iter().map(|n| (*n).clone()).collect())
            .unwrap_or_default()
    }

    fn build_level(
        &self,
        parent: Option<&'a str>,
        depth: usize,
        visited: &mut HashSet<&'a str>,
    ) -> Vec<FolderNode> {
        if depth >= self.max_depth {
            tracing::warn!("Folder tree exceeds max depth {}; truncating", self.max_depth);
            return Vec::new();
        }
        let Some(children) = self.folders.get(&parent) else {
            return Vec::new();
        };

        let mut level = Vec::with_capacity(children.len());
        for &folder in children.iter() {
            if !visited.insert(folder.id.as_str()) {
                continue;
            }
            level.push(self.build_node(folder, depth, visited));
        }
        level
    }

    /// `folder` must already be marked visited
    fn build_node(
        &self,
        folder: &'a Folder,
        depth: usize,
        visited: &mut HashSet<&'a str>,
    ) -> FolderNode {
        let folders = self.build_level(Some(folder.id.as_str()), depth + 1, visited);
        let notes = self.notes_of(Some(folder.id.as_str()));
        let note_count = notes.len() + folders.iter().map(|f| f.note_count).sum::<usize>();
        FolderNode {
            folder: folder.clone(),
            note_count,
            folders,
            notes,
        }
    }
}
