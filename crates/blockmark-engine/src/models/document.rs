use serde::{Deserialize, Serialize};

use crate::models::block::{Block, BlockId};

/// An ordered sequence of blocks; insertion order is presentation order.
///
/// A document is created by the importer (or built directly), mutated in
/// place by the command layer and the reorder engine, and serialized back to
/// markdown by the exporter. There is exactly one writer at a time; nothing
/// here is shared across threads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    /// Position of a block in the sequence, or `None` when the id is not
    /// present (already deleted, or from another document).
    pub fn index_of(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|block| block.id == id)
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|block| block.id == id)
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|block| block.id == id)
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn insert(&mut self, index: usize, block: Block) {
        self.blocks.insert(index, block);
    }

    pub fn remove(&mut self, index: usize) -> Block {
        self.blocks.remove(index)
    }

    /// Resolve a selection of ids to document positions: sorted ascending,
    /// deduplicated, with unknown ids silently dropped. Both the command
    /// layer and the reorder engine work from this so a selection behaves the
    /// same regardless of the order the ids were gathered in.
    pub fn selection_indices(&self, selection: &[BlockId]) -> Vec<usize> {
        let mut indices: Vec<usize> = selection
            .iter()
            .filter_map(|&id| self.index_of(id))
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}
