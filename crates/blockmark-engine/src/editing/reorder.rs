//! Drag reorder: the state machine behind moving blocks within a document.
//!
//! The engine owns no rendering state. The presentation layer reports
//! discrete gesture events (`begin`, `update_target`, `commit`, `cancel`)
//! and reads the resulting state and document back; nothing here outlives
//! a gesture. A gesture walks `Idle → Armed → Targeting` and every exit
//! path lands back on `Idle`.

use crate::models::{BlockId, Document};

use super::commands::Outcome;

/// Which side of the anchor block a drop lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    After,
}

/// A resolved drop position: a block outside the dragged selection and the
/// side of it to insert at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    pub anchor: BlockId,
    pub placement: Placement,
}

/// Gesture state. The selection is held in document order from the moment
/// the gesture arms.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Armed {
        selection: Vec<BlockId>,
    },
    Targeting {
        selection: Vec<BlockId>,
        target: DropTarget,
    },
}

#[derive(Debug, Default)]
pub struct ReorderEngine {
    state: DragState,
}

impl ReorderEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, DragState::Idle)
    }

    /// The dragged ids in document order; empty when no gesture is active.
    pub fn selection(&self) -> &[BlockId] {
        match &self.state {
            DragState::Idle => &[],
            DragState::Armed { selection } | DragState::Targeting { selection, .. } => selection,
        }
    }

    pub fn target(&self) -> Option<DropTarget> {
        match &self.state {
            DragState::Targeting { target, .. } => Some(*target),
            _ => None,
        }
    }

    /// Arm a gesture for `selection`. Ids that do not resolve are dropped
    /// and the rest are normalized to document order; an empty result
    /// leaves the engine idle. A gesture already in flight is discarded.
    pub fn begin(&mut self, document: &Document, selection: &[BlockId]) {
        if self.is_active() {
            tracing::debug!(target: "blockmark::reorder", "gesture restarted mid-flight");
        }
        let ordered: Vec<BlockId> = document
            .selection_indices(selection)
            .into_iter()
            .filter_map(|index| document.get(index))
            .map(|block| block.id)
            .collect();
        if ordered.is_empty() {
            tracing::debug!(target: "blockmark::reorder", "empty selection, staying idle");
            self.state = DragState::Idle;
            return;
        }
        tracing::debug!(
            target: "blockmark::reorder",
            blocks = ordered.len(),
            "drag armed"
        );
        self.state = DragState::Armed { selection: ordered };
    }

    /// Report the pointer over `hovered`, `fraction` of the way down its
    /// extent. The upper half biases to before, the lower half to after.
    /// Targets inside the dragged selection and unknown ids are rejected
    /// silently: the previous target, if any, stands.
    pub fn update_target(&mut self, document: &Document, hovered: BlockId, fraction: f32) {
        let selection = match &self.state {
            DragState::Idle => {
                tracing::trace!(target: "blockmark::reorder", "target update while idle ignored");
                return;
            }
            DragState::Armed { selection } | DragState::Targeting { selection, .. } => selection,
        };
        if selection.contains(&hovered) {
            tracing::trace!(target: "blockmark::reorder", "self target rejected");
            return;
        }
        if document.index_of(hovered).is_none() {
            tracing::trace!(target: "blockmark::reorder", "unknown target ignored");
            return;
        }
        let placement = if fraction < 0.5 {
            Placement::Before
        } else {
            Placement::After
        };
        let selection = selection.clone();
        self.state = DragState::Targeting {
            selection,
            target: DropTarget {
                anchor: hovered,
                placement,
            },
        };
    }

    /// Drop the selection at the current target. Without a resolved target
    /// the document is left untouched. Always returns to idle.
    pub fn commit(&mut self, document: &mut Document) -> Outcome {
        let state = std::mem::take(&mut self.state);
        let DragState::Targeting { selection, target } = state else {
            tracing::debug!(target: "blockmark::reorder", "commit without target");
            return Outcome::NoOp;
        };
        let outcome = move_selection(document, &selection, target);
        tracing::debug!(
            target: "blockmark::reorder",
            blocks = selection.len(),
            outcome = ?outcome,
            "drag committed"
        );
        outcome
    }

    /// Abandon the gesture without touching the document.
    pub fn cancel(&mut self) {
        if self.is_active() {
            tracing::debug!(target: "blockmark::reorder", "drag cancelled");
        }
        self.state = DragState::Idle;
    }
}

/// Splice `selection` out of the document and reinsert it as one group at
/// `target`. The insertion index is computed after removal, so a target
/// past the selection does not land off by the group's length.
fn move_selection(document: &mut Document, selection: &[BlockId], target: DropTarget) -> Outcome {
    if selection.contains(&target.anchor) || document.index_of(target.anchor).is_none() {
        return Outcome::NoOp;
    }
    let indices = document.selection_indices(selection);
    if indices.is_empty() {
        return Outcome::NoOp;
    }
    let mut moved = Vec::with_capacity(indices.len());
    for &index in indices.iter().rev() {
        moved.push(document.remove(index));
    }
    moved.reverse();
    // The anchor is outside the selection, so it survived the removal.
    let insert_at = match document.index_of(target.anchor) {
        Some(index) => match target.placement {
            Placement::Before => index,
            Placement::After => index + 1,
        },
        None => document.len(),
    };
    for (offset, block) in moved.into_iter().enumerate() {
        document.insert(insert_at + offset, block);
    }
    Outcome::Applied
}

/// The handle shown for a selection: the topmost selected block's, or none
/// when nothing in the selection resolves.
pub fn visible_handle_for(document: &Document, selection: &[BlockId]) -> Option<BlockId> {
    document
        .selection_indices(selection)
        .first()
        .and_then(|&index| document.get(index))
        .map(|block| block.id)
}
