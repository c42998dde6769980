//! NoteTree Core
//!
//! Tree engine behind a note-taking file explorer: folders and notes kept as
//! flat collections, ordered within sibling groups, and rearranged by drag and
//! drop with optimistic updates and asynchronous persistence.
//!
//! # Architecture
//!
//! - **Flat state, derived tree**: parent pointers plus dense positions are the
//!   only stored structure; nesting and counts are recomputed on read
//! - **Pure decisions**: the drop resolver never fails and never mutates;
//!   invalid drops resolve to a no-op
//! - **Single writer**: only the dispatcher changes the shared tree, and the
//!   persistence collaborator is injected behind an async trait
//!
//! # Modules
//!
//! - [`models`] - Folder, Note and the identifiers shared across modules
//! - [`ordering`] - Dense per-group positions
//! - [`tree`] - Tree model, derived views and pure mutations
//! - [`drag`] - Drag session state machine and geometry
//! - [`resolver`] - Collision classification and drop resolution
//! - [`dispatcher`] - Optimistic application, persistence and rollback
//! - [`explorer`] - Facade wiring the above for a host UI

pub mod config;
pub mod dispatcher;
pub mod drag;
pub mod error;
pub mod explorer;
pub mod models;
pub mod ordering;
pub mod resolver;
pub mod tree;

// Re-export commonly used types
pub use config::ExplorerConfig;
pub use dispatcher::{
    MutationDispatcher, PersistJob, PersistRequest, PersistenceError, RecordingPersistence,
    TreeEvent, TreePersistence,
};
pub use drag::{
    Collision, DragEvent, DragFrame, DragMachine, DragSession, DragState, DropBranch, Point, Rect,
};
pub use error::{ConfigError, TreeError};
pub use explorer::{DragEnd, FileExplorer};
pub use models::*;
pub use resolver::{DropOutcome, DropResolution, DropResolver, DropTarget, NoOpReason, TreeMutation};
pub use tree::{FolderNode, TreeModel, TreeView};
