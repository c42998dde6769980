//! Data Models
//!
//! This module contains the flat data structures the tree engine works over:
//!
//! - `Folder` - A named container; `parent_id = None` means a root folder
//! - `Note` - A leaf entry; `folder_id = None` means the note lives at root
//! - `ItemKind` / `ItemRef` - Typed handles used by drag sessions and mutations
//! - `TreeSnapshot` - The authoritative `{folders, notes}` payload loaded from the backend
//! - `PositionUpdate` - The per-item delta handed to the persistence collaborator
//!
//! There is no stored tree structure. Parent/child relationships are derived
//! on demand by [`crate::tree::TreeModel`] from the parent pointers held here.

mod folder;
mod item;
mod note;
mod snapshot;

pub use folder::Folder;
pub use item::{ItemKind, ItemRef, ParentTarget, PositionUpdate, SiblingGroup};
pub use note::Note;
pub use snapshot::TreeSnapshot;
