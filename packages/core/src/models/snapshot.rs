//! Authoritative tree snapshot

use super::{Folder, Note};
use serde::{Deserialize, Serialize};

/// The `{folders, notes}` payload a server-side loader supplies at mount time
/// and again after every revalidation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSnapshot {
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl TreeSnapshot {
    pub fn new(folders: Vec<Folder>, notes: Vec<Note>) -> Self {
        Self { folders, notes }
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.notes.is_empty()
    }
}
