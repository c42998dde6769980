//! File Explorer
//!
//! Front door for a host UI: owns the drag machine, the drop resolver and the
//! mutation dispatcher, and exposes the local create/rename/delete/flag edits
//! a file explorer offers next to drag and drop.
//!
//! # Drag Flow
//!
//! 1. [`FileExplorer::drag_start`] checks the id against the current tree and
//!    opens a session
//! 2. [`FileExplorer::drag_move`] recomputes root-zone containment and the
//!    visual hint; the tree is untouched
//! 3. [`FileExplorer::drag_end`] resolves the drop against the latest
//!    optimistic tree and dispatches the mutation, returning the
//!    [`PersistJob`] for the host to run (or [`FileExplorer::drag_end_and_spawn`])
//! 4. [`FileExplorer::drag_cancel`] resets without resolving anything

use crate::config::ExplorerConfig;
use crate::dispatcher::{MutationDispatcher, PersistJob, PersistenceError, TreeEvent, TreePersistence};
use crate::drag::{
    DragEvent, DragFrame, DragMachine, DragSession, DragState, DropBranch, Point, Rect,
};
use crate::error::{ConfigError, Result, TreeError};
use crate::models::{Folder, ItemRef, TreeSnapshot};
use crate::resolver::{DropResolution, DropResolver, DroppableNamespace};
use crate::tree::{TreeModel, TreeView};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Result of a completed drag
#[derive(Debug, Clone)]
pub struct DragEnd {
    pub resolution: DropResolution,
    /// Persistence still owed for the applied mutation (`None` for a no-op)
    pub job: Option<PersistJob>,
}

impl DragEnd {
    pub fn is_no_op(&self) -> bool {
        self.job.is_none()
    }
}

pub struct FileExplorer {
    config: ExplorerConfig,
    machine: DragMachine,
    resolver: DropResolver,
    dispatcher: MutationDispatcher,
}

impl FileExplorer {
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `config` fails validation.
    pub fn new(
        snapshot: TreeSnapshot,
        persistence: Arc<dyn TreePersistence>,
        config: ExplorerConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(snapshot, persistence, config))
    }

    /// Explorer with [`ExplorerConfig::default`], which always validates
    pub fn with_defaults(snapshot: TreeSnapshot, persistence: Arc<dyn TreePersistence>) -> Self {
        Self::build(snapshot, persistence, ExplorerConfig::default())
    }

    fn build(
        snapshot: TreeSnapshot,
        persistence: Arc<dyn TreePersistence>,
        config: ExplorerConfig,
    ) -> Self {
        let model = TreeModel::from_snapshot(snapshot);
        tracing::info!(
            "File explorer loaded {} folder(s) and {} note(s)",
            model.folders().len(),
            model.notes().len()
        );

        Self {
            resolver: DropResolver::new(DroppableNamespace::from_config(&config)),
            dispatcher: MutationDispatcher::new(model, persistence, &config),
            machine: DragMachine::new(),
            config,
        }
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &MutationDispatcher {
        &self.dispatcher
    }

    pub fn namespace(&self) -> &DroppableNamespace {
        self.resolver.namespace()
    }

    pub fn drag_state(&self) -> DragState {
        self.machine.state()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.machine.session()
    }

    /// Terminal branch of the most recent drag (`None` after a no-op or cancel)
    pub fn last_outcome(&self) -> Option<DropBranch> {
        self.machine.last_outcome()
    }

    /// Latest optimistic tree
    pub fn tree(&self) -> TreeModel {
        self.dispatcher.snapshot()
    }

    /// Nested view of the latest optimistic tree
    pub fn view(&self) -> TreeView {
        self.dispatcher.snapshot().build_tree()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TreeEvent> {
        self.dispatcher.subscribe()
    }

    /// Replace the optimistic tree with an authoritative snapshot
    pub fn resync(&mut self, snapshot: TreeSnapshot) {
        self.dispatcher.resync(snapshot);
        self.cancel_if_vanished();
    }

    /// Begin dragging `active_id` (a folder or note id)
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownItem`] when the id is in neither collection.
    pub fn drag_start(
        &mut self,
        active_id: &str,
        pointer: Point,
        rect: Option<Rect>,
    ) -> Result<ItemRef> {
        let active = self
            .dispatcher
            .snapshot()
            .resolve(active_id)
            .ok_or_else(|| TreeError::unknown_item(active_id))?;
        self.machine.start(active.clone(), pointer, rect);
        Ok(active)
    }

    /// Pointer-move tick; returns the droppable id currently hinted
    pub fn drag_move(&mut self, frame: &DragFrame) -> Option<String> {
        let hint = {
            let session = self.machine.update(frame)?;
            self.resolver.hint(session, &frame.collisions)
        };
        self.machine.set_hint(hint.clone());
        hint
    }

    /// Pointer-up: resolve and dispatch. `None` when no drag was active.
    pub fn drag_end(&mut self, frame: &DragFrame) -> Option<DragEnd> {
        let session = self.machine.finish(frame)?;
        let tree = self.dispatcher.snapshot();
        let resolution = self.resolver.resolve(&session, &frame.collisions, &tree);

        let job = resolution
            .outcome
            .mutation()
            .and_then(|mutation| self.dispatcher.dispatch(mutation));
        self.machine
            .record_outcome(job.as_ref().and_then(|_| resolution.branch()));

        Some(DragEnd { resolution, job })
    }

    /// [`Self::drag_end`] with persistence spawned on the tokio runtime
    pub fn drag_end_and_spawn(
        &mut self,
        frame: &DragFrame,
    ) -> Option<(DropResolution, Option<JoinHandle<std::result::Result<(), PersistenceError>>>)> {
        let DragEnd { resolution, job } = self.drag_end(frame)?;
        let handle = job.map(|job| self.dispatcher.spawn(job));
        Some((resolution, handle))
    }

    /// Abort the active drag; returns whether one was active
    pub fn drag_cancel(&mut self) -> bool {
        self.machine.cancel()
    }

    /// Route a raw pointer-layer event
    ///
    /// Returns the completed drag for `End`, `None` otherwise.
    pub fn handle(&mut self, event: DragEvent) -> Result<Option<DragEnd>> {
        match event {
            DragEvent::Start {
                active_id,
                pointer,
                rect,
            } => {
                self.drag_start(&active_id, pointer, rect)?;
                Ok(None)
            }
            DragEvent::Move(frame) => {
                self.drag_move(&frame);
                Ok(None)
            }
            DragEvent::End(frame) => Ok(self.drag_end(&frame)),
            DragEvent::Cancel => {
                self.drag_cancel();
                Ok(None)
            }
        }
    }

    pub fn create_folder(&mut self, name: &str, parent_id: Option<&str>) -> Result<Folder> {
        let folder = self
            .dispatcher
            .apply_local(|tree| tree.apply_create_folder(name, parent_id))?;
        tracing::info!("Created folder '{}' ({})", folder.name, folder.id);
        Ok(folder)
    }

    /// Create a note and announce it with [`TreeEvent::NoteCreated`]
    ///
    /// Returns the new note's id.
    pub fn create_note(&mut self, title: &str, folder_id: Option<&str>) -> Result<String> {
        let note = self
            .dispatcher
            .apply_local(|tree| tree.apply_create_note(title, folder_id))?;
        tracing::info!("Created note '{}' ({})", note.title, note.id);
        self.dispatcher
            .emit(TreeEvent::NoteCreated { id: note.id.clone() });
        Ok(note.id)
    }

    pub fn rename(&mut self, item: &ItemRef, name: &str) -> Result<()> {
        self.dispatcher
            .apply_local(|tree| Ok((tree.apply_rename(item, name)?, ())))
    }

    /// Delete an item; folders take their whole subtree with them
    ///
    /// Returns every removed item. A drag of a removed item is cancelled.
    pub fn delete(&mut self, item: &ItemRef) -> Result<Vec<ItemRef>> {
        let removed = self.dispatcher.apply_local(|tree| tree.apply_delete(item))?;
        tracing::info!("Deleted {} ({} item(s) removed)", item, removed.len());
        self.cancel_if_vanished();
        Ok(removed)
    }

    pub fn set_public(&mut self, note_id: &str, is_public: bool) -> Result<()> {
        self.dispatcher
            .apply_local(|tree| Ok((tree.apply_set_public(note_id, is_public)?, ())))
    }

    pub fn set_favorite(&mut self, note_id: &str, is_favorite: bool) -> Result<()> {
        self.dispatcher
            .apply_local(|tree| Ok((tree.apply_set_favorite(note_id, is_favorite)?, ())))
    }

    fn cancel_if_vanished(&mut self) {
        let vanished = self
            .machine
            .session()
            .map(|session| !self.dispatcher.snapshot().contains(&session.active))
            .unwrap_or(false);
        if vanished {
            tracing::debug!("Dragged item left the tree; cancelling drag");
            self.machine.cancel();
        }
    }
}
