//! Error Types
//!
//! Algorithmic decisions (drop resolution) never fail: an invalid drop is a
//! no-op. These errors cover the remaining failure surfaces: API misuse
//! against the tree model and invalid configuration. Persistence failures
//! live next to the collaborator contract in [`crate::dispatcher`].

use crate::models::ItemKind;
use thiserror::Error;

/// Tree model operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Referenced item does not exist
    #[error("{kind} not found: {id}")]
    ItemNotFound { kind: ItemKind, id: String },

    /// Id is not known as either a folder or a note
    #[error("Unknown item: {id}")]
    UnknownItem { id: String },

    /// Target folder for a create/move does not exist
    #[error("Invalid parent folder: {parent_id}")]
    InvalidParent { parent_id: String },

    /// Mutation would make a folder its own ancestor
    #[error("Circular reference detected: {context}")]
    CircularReference { context: String },

    /// Name/title rejected
    #[error("Invalid name: {0}")]
    InvalidName(String),
}

impl TreeError {
    pub fn item_not_found(kind: ItemKind, id: impl Into<String>) -> Self {
        Self::ItemNotFound { kind, id: id.into() }
    }

    pub fn unknown_item(id: impl Into<String>) -> Self {
        Self::UnknownItem { id: id.into() }
    }

    pub fn invalid_parent(parent_id: impl Into<String>) -> Self {
        Self::InvalidParent {
            parent_id: parent_id.into(),
        }
    }

    pub fn circular_reference(context: impl Into<String>) -> Self {
        Self::CircularReference {
            context: context.into(),
        }
    }

    pub fn invalid_name(msg: impl Into<String>) -> Self {
        Self::InvalidName(msg.into())
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, TreeError>;
