//! Mutation Dispatcher
//!
//! Applies resolved drops to the shared tree model and hands the minimal
//! persistence delta to the injected [`TreePersistence`] collaborator.
//!
//! # Architecture
//!
//! - **Optimistic first**: [`MutationDispatcher::dispatch`] applies the
//!   mutation synchronously under the state lock, so the next drag already
//!   sees the new order. Persistence runs afterwards as a [`PersistJob`].
//! - **Minimal delta**: root drops persist as a single parent move carrying the
//!   appended position, so local and stored order agree; reparents
//!   and reorders persist as one batched position update per resolution.
//! - **Generations**: every change to the shared state bumps a counter. A job
//!   remembers the generation its mutation produced plus the model before it.
//!   On failure the previous model is restored only if nothing else changed
//!   the state in between; otherwise the failure is reported as superseded and
//!   the next authoritative snapshot reconciles.
//! - **Events**: state changes are broadcast as [`TreeEvent`]s.
//!
//! # Examples
//!
//! ```no_run
//! # use notetree_core::dispatcher::{MutationDispatcher, RecordingPersistence};
//! # use notetree_core::config::ExplorerConfig;
//! # use notetree_core::models::ItemRef;
//! # use notetree_core::resolver::TreeMutation;
//! # use notetree_core::tree::TreeModel;
//! # use std::sync::Arc;
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let mutation = TreeMutation::MoveToRoot { item: ItemRef::note("n1") };
//! let dispatcher = MutationDispatcher::new(
//!     TreeModel::default(),
//!     Arc::new(RecordingPersistence::new()),
//!     &ExplorerConfig::default(),
//! );
//! if let Some(job) = dispatcher.dispatch(&mutation) {
//!     dispatcher.persist(job).await?;
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod events;
mod memory;

#[cfg(test)]
mod dispatcher_test;

pub use error::PersistenceError;
pub use events::TreeEvent;
pub use memory::RecordingPersistence;

use crate::config::ExplorerConfig;
use crate::error::Result;
use crate::models::{ItemKind, PositionUpdate, TreeSnapshot};
use crate::ordering;
use crate::resolver::TreeMutation;
use crate::tree::TreeModel;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Storage collaborator for tree changes
///
/// Implementations must be safe to call from spawned tasks.
#[async_trait]
pub trait TreePersistence: Send + Sync {
    /// Persist new positions for items of one kind. An entry with a
    /// `parent_id` also moves that item to the given parent.
    async fn reorder(
        &self,
        items: Vec<PositionUpdate>,
        kind: ItemKind,
    ) -> std::result::Result<(), PersistenceError>;

    /// Persist a parent change (`None` = root) together with the position the
    /// item takes in its new sibling group
    async fn move_item(
        &self,
        item_id: &str,
        kind: ItemKind,
        new_parent_id: Option<&str>,
        position: i64,
    ) -> std::result::Result<(), PersistenceError>;
}

/// The persistence call a mutation needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PersistRequest {
    #[serde(rename_all = "camelCase")]
    Move {
        id: String,
        kind: ItemKind,
        new_parent_id: Option<String>,
        position: i64,
    },
    Reorder {
        kind: ItemKind,
        items: Vec<PositionUpdate>,
    },
}

impl PersistRequest {
    pub fn kind(&self) -> ItemKind {
        match self {
            PersistRequest::Move { kind, .. } | PersistRequest::Reorder { kind, .. } => *kind,
        }
    }

    /// One-line summary for logs
    pub fn describe(&self) -> String {
        match self {
            PersistRequest::Move {
                id,
                kind,
                new_parent_id,
                position,
            } => format!(
                "move {} '{}' to {} at {}",
                kind,
                id,
                new_parent_id.as_deref().unwrap_or("root"),
                position
            ),
            PersistRequest::Reorder { kind, items } => {
                format!("reorder of {} {} position(s)", items.len(), kind)
            }
        }
    }
}

/// Pending persistence for one optimistic mutation
#[derive(Debug, Clone)]
pub struct PersistJob {
    pub request: PersistRequest,
    /// Model as it was before the mutation
    pub previous: TreeModel,
    /// Generation the mutation produced
    pub generation: u64,
}

#[derive(Debug)]
struct TreeState {
    model: TreeModel,
    generation: u64,
}

/// Owner of the optimistic tree state
///
/// Cloning is cheap and shares the state, the collaborator and the event
/// channel, so a clone can be moved into a spawned persistence task.
#[derive(Clone)]
pub struct MutationDispatcher {
    state: Arc<RwLock<TreeState>>,
    persistence: Arc<dyn TreePersistence>,
    event_tx: broadcast::Sender<TreeEvent>,
    rollback_on_failure: bool,
    max_depth: usize,
}

impl std::fmt::Debug for MutationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationDispatcher")
            .field("generation", &self.generation())
            .field("rollback_on_failure", &self.rollback_on_failure)
            .finish_non_exhaustive()
    }
}

impl MutationDispatcher {
    pub fn new(
        model: TreeModel,
        persistence: Arc<dyn TreePersistence>,
        config: &ExplorerConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity.max(1));
        Self {
            state: Arc::new(RwLock::new(TreeState {
                model: model.with_max_depth(config.max_depth),
                generation: 0,
            })),
            persistence,
            event_tx,
            rollback_on_failure: config.rollback_on_failure,
            max_depth: config.max_depth,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TreeEvent> {
        self.event_tx.subscribe()
    }

    /// Latest optimistic state
    pub fn snapshot(&self) -> TreeModel {
        self.read_state().model.clone()
    }

    pub fn generation(&self) -> u64 {
        self.read_state().generation
    }

    /// Apply `mutation` optimistically and return the job that persists it
    ///
    /// Returns `None` when the mutation no longer applies to the current state
    /// (an item vanished through a resync between resolution and dispatch).
    pub fn dispatch(&self, mutation: &TreeMutation) -> Option<PersistJob> {
        let mut state = self.write_state();
        let (next, request) = match plan(&state.model, mutation) {
            Ok(planned) => planned,
            Err(e) => {
                tracing::warn!("Dropping stale mutation for {}: {}", mutation.item(), e);
                return None;
            }
        };

        let previous = std::mem::replace(&mut state.model, next);
        state.generation += 1;
        let generation = state.generation;
        drop(state);

        tracing::info!(
            "Applied {:?} for {} (generation {})",
            mutation.branch(),
            mutation.item(),
            generation
        );
        self.emit(TreeEvent::MutationApplied {
            mutation: mutation.clone(),
            generation,
        });

        Some(PersistJob {
            request,
            previous,
            generation,
        })
    }

    /// Run the persistence call for `job`
    ///
    /// # Errors
    ///
    /// Returns the collaborator's error after broadcasting it and applying the
    /// rollback policy.
    pub async fn persist(&self, job: PersistJob) -> std::result::Result<(), PersistenceError> {
        let result = match &job.request {
            PersistRequest::Move {
                id,
                kind,
                new_parent_id,
                position,
            } => {
                self.persistence
                    .move_item(id, *kind, new_parent_id.as_deref(), *position)
                    .await
            }
            PersistRequest::Reorder { kind, items } => {
                self.persistence.reorder(items.clone(), *kind).await
            }
        };

        match result {
            Ok(()) => {
                tracing::debug!("Persisted {}", job.request.describe());
                self.emit(TreeEvent::PersistSucceeded {
                    generation: job.generation,
                });
                Ok(())
            }
            Err(e) => {
                self.handle_failure(job, &e);
                Err(e)
            }
        }
    }

    /// Persist on the tokio runtime without waiting
    pub fn spawn(&self, job: PersistJob) -> JoinHandle<std::result::Result<(), PersistenceError>> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.persist(job).await })
    }

    /// Replace the optimistic state with an authoritative snapshot
    pub fn resync(&self, snapshot: TreeSnapshot) {
        let model = TreeModel::from_snapshot(snapshot).with_max_depth(self.max_depth);
        let mut state = self.write_state();
        state.model = model;
        state.generation += 1;
        let generation = state.generation;
        drop(state);

        tracing::info!("Tree resynced (generation {})", generation);
        self.emit(TreeEvent::Resynced { generation });
    }

    /// Apply a local edit that has no drag counterpart (create, rename, ...)
    pub(crate) fn apply_local<T>(
        &self,
        edit: impl FnOnce(&TreeModel) -> Result<(TreeModel, T)>,
    ) -> Result<T> {
        let mut state = self.write_state();
        let (next, output) = edit(&state.model)?;
        state.model = next;
        state.generation += 1;
        Ok(output)
    }

    pub(crate) fn emit(&self, event: TreeEvent) {
        let _ = self.event_tx.send(event);
    }

    fn handle_failure(&self, job: PersistJob, error: &PersistenceError) {
        let mut state = self.write_state();
        let superseded = state.generation != job.generation;
        tracing::warn!(
            "Failed to persist {} (generation {}): {}",
            job.request.describe(),
            job.generation,
            error
        );

        let restored = if self.rollback_on_failure && !superseded {
            state.model = job.previous;
            state.generation += 1;
            Some(state.generation)
        } else {
            None
        };
        drop(state);

        self.emit(TreeEvent::PersistFailed {
            generation: job.generation,
            error: error.to_string(),
            superseded,
        });
        if let Some(generation) = restored {
            tracing::warn!("Rolled back generation {}", job.generation);
            self.emit(TreeEvent::RolledBack { generation });
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, TreeState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, TreeState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Next model plus the persistence delta for a mutation
fn plan(model: &TreeModel, mutation: &TreeMutation) -> Result<(TreeModel, PersistRequest)> {
    match mutation {
        TreeMutation::MoveToRoot { item } => {
            let (next, position) = model.apply_append_to_root(item)?;
            Ok((
                next,
                PersistRequest::Move {
                    id: item.id.clone(),
                    kind: item.kind,
                    new_parent_id: None,
                    position,
                },
            ))
        }
        TreeMutation::MoveToFolder { item, folder_id } => {
            let (next, items) = model.apply_move(item, Some(folder_id.as_str()), None)?;
            Ok((
                next,
                PersistRequest::Reorder {
                    kind: item.kind,
                    items,
                },
            ))
        }
        TreeMutation::Reorder {
            item,
            group,
            ordered_ids,
        } => {
            if model.sibling_group_of(item).as_ref() != Some(group) {
                return Err(crate::error::TreeError::item_not_found(item.kind, item.id.clone()));
            }
            let next = model.apply_reorder(group, ordered_ids);
            let items = ordering::position_updates(&next.group_ids(group));
            Ok((
                next,
                PersistRequest::Reorder {
                    kind: group.kind,
                    items,
                },
            ))
        }
    }
}
