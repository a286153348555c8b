pub mod block;
pub mod document;
pub mod inline;

pub use block::{Block, BlockId, BlockKind, MAX_INDENT};
pub use document::Document;
pub use inline::{InlineRun, Marks};
