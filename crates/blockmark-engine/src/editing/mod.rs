//! Editing operations over the block document: commands and drag reorder.

pub mod commands;
pub mod reorder;

pub use commands::{Cmd, Outcome};
pub use reorder::{visible_handle_for, DragState, DropTarget, Placement, ReorderEngine};
