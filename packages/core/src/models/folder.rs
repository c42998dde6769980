//! Folder model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A folder in the note tree.
///
/// # Fields
///
/// - `id`: Unique, stable identifier
/// - `name`: Display name
/// - `parent_id`: Owning folder (`None` for a root folder)
/// - `position`: Order within the sibling group; only relative order matters
/// - `created_at`: Creation timestamp
///
/// The parent graph must be acyclic. [`crate::tree::TreeModel`] enforces this
/// for every mutation it applies, and tolerates cyclic input when reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub position: i64,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Folder {
    /// Create a folder with an explicit id
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        parent_id: Option<String>,
        position: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id,
            position,
            created_at: Utc::now(),
        }
    }

    /// Create a folder with an auto-generated UUID
    pub fn with_generated_id(name: impl Into<String>, parent_id: Option<String>, position: i64) -> Self {
        Self::new(Uuid::new_v4().to_string(), name, parent_id, position)
    }

    /// True when the folder sits at the top level
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
