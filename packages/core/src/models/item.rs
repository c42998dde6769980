//! Item handles shared by the tree model, drag sessions and persistence

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which flat collection an item lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    Folder,
    Note,
}

impl ItemKind {
    /// Collection name used by the persistence collaborator (`"folders"` / `"notes"`)
    pub fn collection(&self) -> &'static str {
        match self {
            ItemKind::Folder => "folders",
            ItemKind::Note => "notes",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Folder => write!(f, "folder"),
            ItemKind::Note => write!(f, "note"),
        }
    }
}

/// A typed reference to a folder or note
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRef {
    pub kind: ItemKind,
    pub id: String,
}

impl ItemRef {
    pub fn folder(id: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Folder,
            id: id.into(),
        }
    }

    pub fn note(id: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Note,
            id: id.into(),
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.id)
    }
}

/// Key of a sibling group: all folders sharing a `parent_id`, or all notes
/// sharing a `folder_id`. Folders and notes never share a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiblingGroup {
    pub kind: ItemKind,
    /// Owning folder (`None` = root)
    pub parent: Option<String>,
}

impl SiblingGroup {
    pub fn new(kind: ItemKind, parent: Option<String>) -> Self {
        Self { kind, parent }
    }

    pub fn root(kind: ItemKind) -> Self {
        Self { kind, parent: None }
    }
}

/// Explicit new parent carried by a [`PositionUpdate`] whose item changed group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum ParentTarget {
    Root,
    Folder(String),
}

impl ParentTarget {
    pub fn from_parent_id(parent_id: Option<&str>) -> Self {
        match parent_id {
            Some(id) => ParentTarget::Folder(id.to_string()),
            None => ParentTarget::Root,
        }
    }

    pub fn as_parent_id(&self) -> Option<&str> {
        match self {
            ParentTarget::Root => None,
            ParentTarget::Folder(id) => Some(id.as_str()),
        }
    }
}

/// One entry of a batched reorder persisted through
/// [`crate::dispatcher::TreePersistence::reorder`]
///
/// `parent_id` is only present for the item that changed sibling group;
/// neighbours whose positions shifted during compaction carry `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionUpdate {
    pub id: String,
    pub position: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ParentTarget>,
}

impl PositionUpdate {
    pub fn new(id: impl Into<String>, position: i64) -> Self {
        Self {
            id: id.into(),
            position,
            parent_id: None,
        }
    }

    pub fn with_parent(mut self, parent: ParentTarget) -> Self {
        self.parent_id = Some(parent);
        self
    }
}
