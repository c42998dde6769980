//! Note model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A note in the tree. Notes never have children.
///
/// `folder_id = None` means the note lives at root. A `folder_id` that names a
/// folder missing from the model is displayed at root as well (see
/// [`crate::tree::TreeModel::effective_parent_of`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub folder_id: Option<String>,

    #[serde(default)]
    pub position: i64,

    /// Shared publicly (toggled from the tree context menu)
    #[serde(default)]
    pub is_public: bool,

    /// Pinned to the favorites list
    #[serde(default)]
    pub is_favorite: bool,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Note {
    /// Create a note with an explicit id
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        folder_id: Option<String>,
        position: i64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            folder_id,
            position,
            is_public: false,
            is_favorite: false,
            created_at: Utc::now(),
        }
    }

    /// Create a note with an auto-generated UUID
    pub fn with_generated_id(title: impl Into<String>, folder_id: Option<String>, position: i64) -> Self {
        Self::new(Uuid::new_v4().to_string(), title, folder_id, position)
    }

    pub fn is_root(&self) -> bool {
        self.folder_id.is_none()
    }
}
