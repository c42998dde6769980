//! Collision/Drop Resolver
//!
//! Given the collisions reported for the current frame, picks exactly one drop
//! target, classifies the drop, and turns it into a [`TreeMutation`] (or a
//! no-op). Nothing here fails: an invalid drop is an expected outcome of
//! imprecise dragging and resolves to [`DropOutcome::NoOp`].
//!
//! # Priority
//!
//! 1. **Root zone**: geometric containment wins over every collision.
//! 2. **Folder body**: a collision in the folder drop namespace reparents. A
//!    dragged folder's own body is skipped unless nothing else collides.
//! 3. **Sibling**: nearest sortable item by center distance reorders.
//! 4. **Nothing**: no mutation.
//!
//! The same classification runs at drag-over (hinting) and at drag-end.

mod namespace;

pub use namespace::{DroppableId, DroppableNamespace};

use crate::drag::{Collision, DragSession, DropBranch, Point};
use crate::models::{ItemKind, ItemRef, SiblingGroup};
use crate::ordering;
use crate::tree::TreeModel;
use serde::{Deserialize, Serialize};

/// The single target chosen for a frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum DropTarget {
    RootZone,
    /// Folder body, already resolved back to the plain folder id
    FolderBody(String),
    /// Sortable item id
    Sibling(String),
}

/// A mutation the dispatcher applies to the tree model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TreeMutation {
    /// Clear the parent pointer and append to the root group
    MoveToRoot { item: ItemRef },
    /// Set the parent pointer to `folder_id` and append to its group
    #[serde(rename_all = "camelCase")]
    MoveToFolder { item: ItemRef, folder_id: String },
    /// Rewrite one sibling group to `ordered_ids`
    #[serde(rename_all = "camelCase")]
    Reorder {
        item: ItemRef,
        group: SiblingGroup,
        ordered_ids: Vec<String>,
    },
}

impl TreeMutation {
    pub fn item(&self) -> &ItemRef {
        match self {
            TreeMutation::MoveToRoot { item }
            | TreeMutation::MoveToFolder { item, .. }
            | TreeMutation::Reorder { item, .. } => item,
        }
    }

    /// Terminal drag branch this mutation corresponds to
    pub fn branch(&self) -> DropBranch {
        match self {
            TreeMutation::MoveToRoot { .. } => DropBranch::RootDrop,
            TreeMutation::MoveToFolder { .. } => DropBranch::Reparenting,
            TreeMutation::Reorder { .. } => DropBranch::Reordering,
        }
    }
}

/// Why a drop produced no mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoOpReason {
    /// Dropped in empty space
    NoTarget,
    /// Dropped on itself
    SelfTarget,
    /// Target folder is already the direct parent
    AlreadyInParent,
    /// Target folder is a descendant of the dragged folder
    WouldCreateCycle,
    /// Root-zone drop of an item that is already at root
    AlreadyAtRoot,
    /// Sibling target is of another kind or in another group
    DifferentGroup,
    /// Dragged item is not in the model
    UnknownItem,
    /// Target id is not in the model
    UnknownTarget,
    /// Reorder would leave the order as it is
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum DropOutcome {
    Mutate { mutation: TreeMutation },
    NoOp { reason: NoOpReason },
}

impl DropOutcome {
    fn no_op(reason: NoOpReason) -> Self {
        DropOutcome::NoOp { reason }
    }

    fn mutate(mutation: TreeMutation) -> Self {
        DropOutcome::Mutate { mutation }
    }

    pub fn mutation(&self) -> Option<&TreeMutation> {
        match self {
            DropOutcome::Mutate { mutation } => Some(mutation),
            DropOutcome::NoOp { .. } => None,
        }
    }

    pub fn is_no_op(&self) -> bool {
        matches!(self, DropOutcome::NoOp { .. })
    }
}

/// Classification plus outcome of one drop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropResolution {
    pub target: Option<DropTarget>,
    pub outcome: DropOutcome,
}

impl DropResolution {
    /// Terminal branch of the drag machine (`None` for a no-op)
    pub fn branch(&self) -> Option<DropBranch> {
        self.outcome.mutation().map(TreeMutation::branch)
    }
}

/// Stateless drop resolver bound to a droppable namespace
#[derive(Debug, Clone, Default)]
pub struct DropResolver {
    namespace: DroppableNamespace,
}

impl DropResolver {
    pub fn new(namespace: DroppableNamespace) -> Self {
        Self { namespace }
    }

    pub fn namespace(&self) -> &DroppableNamespace {
        &self.namespace
    }

    /// Pick the single target for this frame, by priority
    pub fn classify(&self, session: &DragSession, collisions: &[Collision]) -> Option<DropTarget> {
        if session.is_over_root_zone {
            return Some(DropTarget::RootZone);
        }

        let center = session.dragged_center();
        let active_folder = (session.active.kind == ItemKind::Folder).then_some(session.active.id.as_str());

        // The dragged folder's own body sits under the pointer for most of the
        // drag; it only counts when nothing else collides
        let mut over_own_body = false;
        let mut bodies = Vec::new();
        let mut items = Vec::new();
        for collision in collisions {
            match self.namespace.parse(&collision.id) {
                DroppableId::FolderBody(folder_id) if Some(folder_id) == active_folder => {
                    over_own_body = true;
                }
                DroppableId::FolderBody(folder_id) => bodies.push((folder_id, collision)),
                DroppableId::Item(item_id) => items.push((item_id, collision)),
                DroppableId::RootZone => {}
            }
        }

        if let Some(folder_id) = pick_nearest(&bodies, center, None) {
            return Some(DropTarget::FolderBody(folder_id.to_string()));
        }

        let active_id = session.active.id.as_str();
        match pick_nearest(&items, center, Some(active_id)) {
            Some(item_id) => Some(DropTarget::Sibling(item_id.to_string())),
            None if over_own_body => Some(DropTarget::FolderBody(active_id.to_string())),
            None => None,
        }
    }

    /// Classify the frame and resolve it against the tree
    pub fn resolve(
        &self,
        session: &DragSession,
        collisions: &[Collision],
        tree: &TreeModel,
    ) -> DropResolution {
        let target = self.classify(session, collisions);
        let outcome = match &target {
            Some(target) => resolve_target(&session.active, target, tree),
            None => DropOutcome::no_op(NoOpReason::NoTarget),
        };

        match &outcome {
            DropOutcome::Mutate { mutation } => {
                tracing::debug!("Drop of {} resolved to {:?}", session.active, mutation.branch())
            }
            DropOutcome::NoOp { reason } => {
                tracing::debug!("Drop of {} is a no-op: {:?}", session.active, reason)
            }
        }

        DropResolution { target, outcome }
    }

    /// Droppable id of the current hint target, for drag-over feedback
    pub fn hint(&self, session: &DragSession, collisions: &[Collision]) -> Option<String> {
        self.classify(session, collisions).map(|target| match target {
            DropTarget::RootZone => self.namespace.root_zone_id().to_string(),
            DropTarget::FolderBody(id) => self.namespace.folder_drop_id(&id),
            DropTarget::Sibling(id) => id,
        })
    }
}

/// Nearest candidate by center distance; candidates without bounds rank
/// after measured ones and keep report order. `avoid` is only chosen when it
/// is the sole candidate.
fn pick_nearest<'a>(
    candidates: &[(&'a str, &Collision)],
    center: Point,
    avoid: Option<&str>,
) -> Option<&'a str> {
    let distance = |collision: &Collision| {
        collision
            .rect
            .map(|rect| rect.center().distance_to(center))
            .unwrap_or(f64::INFINITY)
    };

    let mut best: Option<(&'a str, f64)> = None;
    let mut fallback: Option<&'a str> = None;
    for &(id, collision) in candidates {
        if Some(id) == avoid {
            fallback.get_or_insert(id);
            continue;
        }
        let d = distance(collision);
        match best {
            Some((_, best_d)) if best_d <= d => {}
            _ => best = Some((id, d)),
        }
    }
    best.map(|(id, _)| id).or(fallback)
}

/// Apply the resolution rules for an already classified target
pub fn resolve_target(active: &ItemRef, target: &DropTarget, tree: &TreeModel) -> DropOutcome {
    if !tree.contains(active) {
        return DropOutcome::no_op(NoOpReason::UnknownItem);
    }

    match target {
        DropTarget::RootZone => resolve_root_drop(active, tree),
        DropTarget::FolderBody(folder_id) => resolve_reparent(active, folder_id, tree),
        DropTarget::Sibling(sibling_id) => resolve_reorder(active, sibling_id, tree),
    }
}

fn resolve_root_drop(active: &ItemRef, tree: &TreeModel) -> DropOutcome {
    if tree.stored_parent_of(active).is_none() {
        return DropOutcome::no_op(NoOpReason::AlreadyAtRoot);
    }
    DropOutcome::mutate(TreeMutation::MoveToRoot {
        item: active.clone(),
    })
}

fn resolve_reparent(active: &ItemRef, folder_id: &str, tree: &TreeModel) -> DropOutcome {
    if active.kind == ItemKind::Folder && active.id == folder_id {
        return DropOutcome::no_op(NoOpReason::SelfTarget);
    }
    if tree.folder(folder_id).is_none() {
        return DropOutcome::no_op(NoOpReason::UnknownTarget);
    }
    if tree.stored_parent_of(active) == Some(folder_id) {
        return DropOutcome::no_op(NoOpReason::AlreadyInParent);
    }
    if active.kind == ItemKind::Folder && tree.is_descendant_of(folder_id, &active.id) {
        return DropOutcome::no_op(NoOpReason::WouldCreateCycle);
    }
    DropOutcome::mutate(TreeMutation::MoveToFolder {
        item: active.clone(),
        folder_id: folder_id.to_string(),
    })
}

fn resolve_reorder(active: &ItemRef, sibling_id: &str, tree: &TreeModel) -> DropOutcome {
    if sibling_id == active.id {
        return DropOutcome::no_op(NoOpReason::SelfTarget);
    }
    let Some(sibling) = tree.resolve(sibling_id) else {
        return DropOutcome::no_op(NoOpReason::UnknownTarget);
    };

    // A nested note dropped on a root-level item goes to root
    if active.kind == ItemKind::Note
        && tree.effective_parent_of(active).is_some()
        && tree.effective_parent_of(&sibling).is_none()
    {
        return DropOutcome::mutate(TreeMutation::MoveToRoot {
            item: active.clone(),
        });
    }

    let (Some(group), Some(sibling_group)) =
        (tree.sibling_group_of(active), tree.sibling_group_of(&sibling))
    else {
        return DropOutcome::no_op(NoOpReason::UnknownTarget);
    };
    if group != sibling_group {
        return DropOutcome::no_op(NoOpReason::DifferentGroup);
    }

    let ids = tree.group_ids(&group);
    let (Some(from), Some(to)) = (
        ids.iter().position(|id| *id == active.id),
        ids.iter().position(|id| id == sibling_id),
    ) else {
        return DropOutcome::no_op(NoOpReason::DifferentGroup);
    };

    let ordered_ids = ordering::array_move(&ids, from, to);
    if ordered_ids == ids {
        return DropOutcome::no_op(NoOpReason::Unchanged);
    }

    DropOutcome::mutate(TreeMutation::Reorder {
        item: active.clone(),
        group,
        ordered_ids,
    })
}
