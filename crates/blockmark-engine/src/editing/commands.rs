//! Block commands: the edits the presentation layer invokes on a selection.
//!
//! Commands address blocks by id, so a selection stays valid across moves
//! and concurrent edits within the same event tick. Ids that no longer
//! resolve are skipped rather than treated as errors; a command that ends
//! up touching nothing reports [`Outcome::NoOp`].

use crate::models::{Block, BlockId, BlockKind, Document, MAX_INDENT};

/// A block-level edit. Selections may hold ids in any order; commands
/// operate in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    Delete {
        selection: Vec<BlockId>,
    },
    Duplicate {
        selection: Vec<BlockId>,
    },
    /// Set every selected block's type. Selections spanning more than one
    /// block must be type-uniform; heterogeneous batch conversion is
    /// rejected.
    Convert {
        selection: Vec<BlockId>,
        to: BlockKind,
    },
    Indent {
        selection: Vec<BlockId>,
    },
    Outdent {
        selection: Vec<BlockId>,
    },
    /// Flip the checked state of a single task block.
    ToggleTask {
        id: BlockId,
    },
}

impl Cmd {
    fn label(&self) -> &'static str {
        match self {
            Cmd::Delete { .. } => "delete",
            Cmd::Duplicate { .. } => "duplicate",
            Cmd::Convert { .. } => "convert",
            Cmd::Indent { .. } => "indent",
            Cmd::Outdent { .. } => "outdent",
            Cmd::ToggleTask { .. } => "toggle_task",
        }
    }
}

/// What applying a command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The document changed.
    Applied,
    /// Nothing to do: empty resolution, or every target already at the
    /// requested state or bound.
    NoOp,
    /// The command does not apply to the addressed blocks.
    Rejected,
}

impl Document {
    /// Apply a block command and report what happened.
    pub fn apply(&mut self, cmd: Cmd) -> Outcome {
        let label = cmd.label();
        let outcome = match cmd {
            Cmd::Delete { selection } => delete(self, &selection),
            Cmd::Duplicate { selection } => duplicate(self, &selection),
            Cmd::Convert { selection, to } => convert(self, &selection, to),
            Cmd::Indent { selection } => shift_indent(self, &selection, 1),
            Cmd::Outdent { selection } => shift_indent(self, &selection, -1),
            Cmd::ToggleTask { id } => toggle_task(self, id),
        };
        tracing::debug!(
            target: "blockmark::commands",
            command = label,
            outcome = ?outcome,
            "command applied"
        );
        outcome
    }
}

/// Selection ids that still resolve, deduplicated, in document order.
fn resolve_ordered(document: &Document, selection: &[BlockId]) -> Vec<BlockId> {
    document
        .selection_indices(selection)
        .into_iter()
        .filter_map(|index| document.get(index))
        .map(|block| block.id)
        .collect()
}

fn delete(document: &mut Document, selection: &[BlockId]) -> Outcome {
    let mut indices = document.selection_indices(selection);
    if indices.is_empty() {
        return Outcome::NoOp;
    }
    // Bottom-up so earlier indices stay valid while removing.
    while let Some(index) = indices.pop() {
        document.remove(index);
    }
    Outcome::Applied
}

fn duplicate(document: &mut Document, selection: &[BlockId]) -> Outcome {
    let indices = document.selection_indices(selection);
    let Some(&last) = indices.last() else {
        return Outcome::NoOp;
    };
    let copies: Vec<Block> = indices
        .iter()
        .filter_map(|&index| document.get(index))
        .map(Block::duplicate)
        .collect();
    for (offset, copy) in copies.into_iter().enumerate() {
        document.insert(last + 1 + offset, copy);
    }
    Outcome::Applied
}

fn convert(document: &mut Document, selection: &[BlockId], to: BlockKind) -> Outcome {
    let ids = resolve_ordered(document, selection);
    if ids.is_empty() {
        return Outcome::NoOp;
    }
    if ids.len() > 1 {
        let kinds: Vec<BlockKind> = ids
            .iter()
            .filter_map(|id| document.block(*id))
            .map(|block| block.kind.clone())
            .collect();
        let uniform = kinds.windows(2).all(|pair| pair[0].same_type(&pair[1]));
        if !uniform {
            return Outcome::Rejected;
        }
    }
    let to = normalize_kind(to);
    let mut changed = false;
    for id in ids {
        if let Some(block) = document.block_mut(id)
            && block.kind != to
        {
            block.kind = to.clone();
            changed = true;
        }
    }
    if changed { Outcome::Applied } else { Outcome::NoOp }
}

/// Conversion targets carry their attributes; out-of-range heading levels
/// are pulled back into 1..=6 rather than rejected.
fn normalize_kind(kind: BlockKind) -> BlockKind {
    match kind {
        BlockKind::Heading { level } => BlockKind::Heading {
            level: level.clamp(1, 6),
        },
        other => other,
    }
}

fn shift_indent(document: &mut Document, selection: &[BlockId], delta: i8) -> Outcome {
    let ids = resolve_ordered(document, selection);
    if ids.is_empty() {
        return Outcome::NoOp;
    }
    let mut changed = false;
    for id in ids {
        if let Some(block) = document.block_mut(id) {
            let next = if delta > 0 {
                block.indent.saturating_add(1).min(MAX_INDENT)
            } else {
                block.indent.saturating_sub(1)
            };
            if next != block.indent {
                block.indent = next;
                changed = true;
            }
        }
    }
    if changed { Outcome::Applied } else { Outcome::NoOp }
}

fn toggle_task(document: &mut Document, id: BlockId) -> Outcome {
    let Some(block) = document.block_mut(id) else {
        return Outcome::NoOp;
    };
    match &mut block.kind {
        BlockKind::Task { checked } => {
            *checked = !*checked;
            Outcome::Applied
        }
        _ => Outcome::Rejected,
    }
}
