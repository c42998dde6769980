//! Drag Session State Machine
//!
//! Tracks one pointer drag from pointer-down to pointer-up.
//!
//! # State Machine
//!
//! ```text
//! Idle -> Dragging -> Idle
//!             |
//!             +-> recorded branch: Reparenting | Reordering | RootDrop
//! ```
//!
//! - **Idle**: no active drag; initial state and the state after every end/cancel.
//! - **Dragging**: entered on [`DragMachine::start`]. Every [`DragMachine::update`]
//!   moves the pointer to `origin + delta` and recomputes `is_over_root_zone`
//!   with [`pointer_in_zone`]. The root zone sits outside the sortable list's
//!   collision surface, so it is detected geometrically, not via collisions.
//! - **Terminal branch**: [`DragMachine::finish`] hands the session to the drop
//!   resolver and the machine returns to `Idle`; the branch taken is recorded
//!   with [`DragMachine::record_outcome`].
//!
//! # Invariants
//!
//! 1. A new drag always starts a fresh session; nothing carries across sessions.
//! 2. [`DragMachine::cancel`] is a pure reset and never produces a session to resolve.
//! 3. The machine never touches the tree model; drag-over only updates the
//!    session's visual hint.

mod geometry;

pub use geometry::{pointer_in_zone, Point, Rect};

use crate::models::ItemRef;
use serde::{Deserialize, Serialize};

/// Lifecycle state of the drag machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DragState {
    Idle,
    Dragging,
}

/// Terminal branch a finished drag went through
///
/// Never held as a [`DragState`]: the machine is back in `Idle` as soon as
/// the session is handed over, and the branch is recorded afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DropBranch {
    Reparenting,
    Reordering,
    RootDrop,
}

/// One droppable reported as colliding with the dragged item this frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collision {
    /// Droppable identity (sortable item id, or a namespaced folder body id)
    pub id: String,
    /// Measured bounds, when the collision layer reports them
    #[serde(default)]
    pub rect: Option<Rect>,
}

impl Collision {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rect: None,
        }
    }

    pub fn with_rect(id: impl Into<String>, rect: Rect) -> Self {
        Self {
            id: id.into(),
            rect: Some(rect),
        }
    }
}

/// Pointer data for one drag-move / drag-end tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragFrame {
    /// Cumulative pointer delta since drag start
    #[serde(default)]
    pub delta: Point,
    #[serde(default)]
    pub collisions: Vec<Collision>,
    /// Current bounds of the root drop zone, if it is mounted
    #[serde(default)]
    pub root_zone: Option<Rect>,
}

impl DragFrame {
    pub fn new(delta: Point) -> Self {
        Self {
            delta,
            ..Self::default()
        }
    }

    pub fn with_collision(mut self, collision: Collision) -> Self {
        self.collisions.push(collision);
        self
    }

    pub fn with_root_zone(mut self, zone: Rect) -> Self {
        self.root_zone = Some(zone);
        self
    }
}

/// Raw drag input, as delivered by the host's pointer layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DragEvent {
    Start {
        #[serde(rename = "activeId")]
        active_id: String,
        pointer: Point,
        #[serde(default)]
        rect: Option<Rect>,
    },
    Move(DragFrame),
    End(DragFrame),
    Cancel,
}

/// Ephemeral state of one active drag
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub active: ItemRef,
    /// Pointer position at drag start
    pub origin: Point,
    /// Cumulative delta from `origin`
    pub delta: Point,
    pub pointer_position: Point,
    /// Bounds of the dragged item at drag start
    pub active_rect: Option<Rect>,
    pub is_over_root_zone: bool,
    /// Target the item would drop on right now (visual feedback only)
    pub hint: Option<String>,
}

impl DragSession {
    fn new(active: ItemRef, origin: Point, active_rect: Option<Rect>) -> Self {
        Self {
            active,
            origin,
            delta: Point::default(),
            pointer_position: origin,
            active_rect,
            is_over_root_zone: false,
            hint: None,
        }
    }

    /// Center of the dragged item's current rectangle, or the pointer when
    /// the item was never measured
    pub fn dragged_center(&self) -> Point {
        self.active_rect
            .map(|rect| rect.translate(self.delta).center())
            .unwrap_or(self.pointer_position)
    }

    fn apply_frame(&mut self, frame: &DragFrame) {
        self.delta = frame.delta;
        self.pointer_position = self.origin.offset(frame.delta);
        self.is_over_root_zone = pointer_in_zone(self.pointer_position, frame.root_zone.as_ref());
    }
}

/// Drag lifecycle driver
#[derive(Debug, Clone)]
pub struct DragMachine {
    state: DragState,
    session: Option<DragSession>,
    last_outcome: Option<DropBranch>,
}

impl Default for DragMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl DragMachine {
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
            session: None,
            last_outcome: None,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state == DragState::Dragging
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Terminal branch taken by the most recent drag (`None` for a no-op or cancel)
    pub fn last_outcome(&self) -> Option<DropBranch> {
        self.last_outcome
    }

    /// Enter `Dragging` with a fresh session
    pub fn start(&mut self, active: ItemRef, pointer: Point, active_rect: Option<Rect>) {
        if let Some(previous) = self.session.take() {
            tracing::debug!("Drag of {} replaced by a new drag", previous.active);
        }
        tracing::debug!("Drag started: {}", active);
        self.session = Some(DragSession::new(active, pointer, active_rect));
        self.state = DragState::Dragging;
        self.last_outcome = None;
    }

    /// Pointer-move tick. Ignored while idle.
    pub fn update(&mut self, frame: &DragFrame) -> Option<&DragSession> {
        let session = self.session.as_mut()?;
        session.apply_frame(frame);
        Some(session)
    }

    /// Record the drop target currently under the dragged item
    pub fn set_hint(&mut self, hint: Option<String>) {
        if let Some(session) = self.session.as_mut() {
            session.hint = hint;
        }
    }

    /// Pointer-up: apply the final frame and hand over the session for
    /// resolution. The machine is back in `Idle` afterwards.
    pub fn finish(&mut self, frame: &DragFrame) -> Option<DragSession> {
        let mut session = self.session.take()?;
        session.apply_frame(frame);
        self.state = DragState::Idle;
        Some(session)
    }

    /// Note which terminal branch the finished drag went through
    pub fn record_outcome(&mut self, outcome: Option<DropBranch>) {
        if let Some(branch) = outcome {
            tracing::debug!("Drag resolved through {:?}", branch);
        }
        self.last_outcome = outcome;
    }

    /// Abort the drag (escape key, drop outside any surface). Returns whether
    /// a drag was active.
    pub fn cancel(&mut self) -> bool {
        let was_dragging = self.session.take().is_some();
        if was_dragging {
            tracing::debug!("Drag cancelled");
        }
        self.state = DragState::Idle;
        self.last_outcome = None;
        was_dragging
    }
}
