use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::inline::InlineRun;

/// Maximum nesting depth a block may carry. Indent and outdent clamp to
/// `0..=MAX_INDENT`, and the importer caps recovered depths at the same bound.
pub const MAX_INDENT: u8 = 8;

/// Stable identity for a single block.
///
/// Ids are minted once (at import or duplication) and survive every reorder
/// and conversion; selections and drag payloads refer to blocks exclusively
/// through these ids, never through positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(Uuid);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of block types, with type-specific attributes carried as
/// variant payload so a block can never hold attributes that are meaningless
/// for its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    Paragraph,
    /// `level` is 1 through 6.
    Heading { level: u8 },
    Bullet,
    Number,
    Task { checked: bool },
    Quote,
    /// `language` is a free-text fence tag; `None` for untagged fences.
    Code { language: Option<String> },
    Divider,
}

impl BlockKind {
    /// List-type blocks group into emergent lists at export time and stay
    /// adjacent in emitted markdown; everything else is separated by a blank
    /// line.
    pub fn is_list(&self) -> bool {
        matches!(self, BlockKind::Bullet | BlockKind::Number | BlockKind::Task { .. })
    }

    /// True when both values are the same variant, ignoring payload. Used for
    /// the homogeneous-selection check on batch conversion.
    pub fn same_type(&self, other: &BlockKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Short stable name for logs and the CLI block listing.
    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::Heading { .. } => "heading",
            BlockKind::Bullet => "bullet",
            BlockKind::Number => "number",
            BlockKind::Task { .. } => "task",
            BlockKind::Quote => "quote",
            BlockKind::Code { .. } => "code",
            BlockKind::Divider => "divider",
        }
    }
}

/// The atomic unit of content: one typed, indentable record in the flat
/// sequence. Blocks never own other blocks; list and quote structure is
/// recovered from consecutive `kind`/`indent` runs at export time.
///
/// ```
/// use blockmark_engine::models::{Block, BlockKind};
///
/// let block = Block::bullet("milk", 1);
/// assert_eq!(block.kind, BlockKind::Bullet);
/// assert_eq!(block.indent, 1);
/// assert_eq!(block.text(), "milk");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    /// Nesting depth in `0..=MAX_INDENT`. Meaningful for list-type blocks and
    /// quotes; carried (and preserved) for the rest.
    pub indent: u8,
    /// Styled text runs. For `Code` blocks this is a single plain run holding
    /// the literal fence body.
    pub content: Vec<InlineRun>,
}

impl Block {
    pub fn new(kind: BlockKind) -> Self {
        Self {
            id: BlockId::new(),
            kind,
            indent: 0,
            content: Vec::new(),
        }
    }

    pub fn with_content(kind: BlockKind, indent: u8, content: Vec<InlineRun>) -> Self {
        Self {
            id: BlockId::new(),
            kind,
            indent: indent.min(MAX_INDENT),
            content,
        }
    }

    pub fn paragraph(text: &str) -> Self {
        Self::with_content(BlockKind::Paragraph, 0, InlineRun::plain_runs(text))
    }

    /// `level` outside `1..=6` is clamped into range.
    pub fn heading(level: u8, text: &str) -> Self {
        Self::with_content(
            BlockKind::Heading {
                level: level.clamp(1, 6),
            },
            0,
            InlineRun::plain_runs(text),
        )
    }

    pub fn bullet(text: &str, indent: u8) -> Self {
        Self::with_content(BlockKind::Bullet, indent, InlineRun::plain_runs(text))
    }

    pub fn number(text: &str, indent: u8) -> Self {
        Self::with_content(BlockKind::Number, indent, InlineRun::plain_runs(text))
    }

    pub fn task(checked: bool, text: &str, indent: u8) -> Self {
        Self::with_content(BlockKind::Task { checked }, indent, InlineRun::plain_runs(text))
    }

    pub fn quote(text: &str, indent: u8) -> Self {
        Self::with_content(BlockKind::Quote, indent, InlineRun::plain_runs(text))
    }

    pub fn code(language: Option<&str>, body: &str) -> Self {
        Self::with_content(
            BlockKind::Code {
                language: language.map(str::to_string),
            },
            0,
            InlineRun::plain_runs(body),
        )
    }

    pub fn divider() -> Self {
        Self::new(BlockKind::Divider)
    }

    /// Concatenated run text with marks stripped.
    pub fn text(&self) -> String {
        self.content.iter().map(|run| run.text.as_str()).collect()
    }

    /// Copy with a fresh id and identical attributes and content.
    pub fn duplicate(&self) -> Self {
        Self {
            id: BlockId::new(),
            ..self.clone()
        }
    }
}
