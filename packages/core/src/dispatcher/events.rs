//! Tree Events
//!
//! Broadcast by the [`MutationDispatcher`](super::MutationDispatcher) over a
//! tokio broadcast channel so hosts can re-render, show failures, or navigate
//! without coupling to the dispatcher.
//!
//! # Event Flow
//!
//! 1. A drop resolves to a mutation, applied optimistically -> `MutationApplied`
//! 2. The persistence call completes -> `PersistSucceeded` or `PersistFailed`
//! 3. A failed call whose state was not superseded is undone -> `RolledBack`
//! 4. The host delivers an authoritative snapshot -> `Resynced`

use crate::resolver::TreeMutation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TreeEvent {
    /// Optimistic state now reflects `mutation`
    MutationApplied {
        mutation: TreeMutation,
        generation: u64,
    },

    PersistSucceeded { generation: u64 },

    /// `superseded` is set when later mutations or a resync landed before the
    /// failure came back, in which case the state was left alone and the host
    /// should revalidate
    PersistFailed {
        generation: u64,
        error: String,
        superseded: bool,
    },

    /// Optimistic state restored to what it was before the failed mutation
    RolledBack { generation: u64 },

    /// Optimistic state replaced by an authoritative snapshot
    Resynced { generation: u64 },

    /// A note was created locally; hosts navigate to it
    NoteCreated { id: String },
}

impl TreeEvent {
    /// Short name for logs
    pub fn event_type(&self) -> &'static str {
        match self {
            TreeEvent::MutationApplied { .. } => "mutation:applied",
            TreeEvent::PersistSucceeded { .. } => "persist:succeeded",
            TreeEvent::PersistFailed { .. } => "persist:failed",
            TreeEvent::RolledBack { .. } => "tree:rolled-back",
            TreeEvent::Resynced { .. } => "tree:resynced",
            TreeEvent::NoteCreated { .. } => "note:created",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemRef;

    #[test]
    fn test_event_serialization_is_flat() {
        let event = TreeEvent::MutationApplied {
            mutation: TreeMutation::MoveToRoot {
                item: ItemRef::note("n1"),
            },
            generation: 3,
        };
        let parsed: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(parsed["type"], "mutationApplied");
        assert_eq!(parsed["generation"], 3);
        assert_eq!(parsed["mutation"]["type"], "moveToRoot");
    }

    #[test]
    fn test_event_type_names() {
        let event = TreeEvent::NoteCreated { id: "n1".into() };
        assert_eq!(event.event_type(), "note:created");
    }
}
