pub mod editing;
pub mod io;
pub mod models;
pub mod parsing;
pub mod writer;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::{Cmd, DragState, DropTarget, Outcome, Placement, ReorderEngine};
pub use io::*;
pub use models::{Block, BlockId, BlockKind, Document, InlineRun, Marks, MAX_INDENT};
pub use parsing::parse_markdown;
pub use writer::to_markdown;
