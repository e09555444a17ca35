//! Read-only copy of an arena's bookkeeping
//!
//! Diagnostics and tests inspect allocator state through this type instead
//! of borrowing the live arena.

use alloc::vec::Vec;

use super::{bitmap::BuddyBitmap, buddy_block::BuddyBlock};

/// Free lists and state tables of every order, captured at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaSnapshot {
    pub max_order: usize,
    /// Free list contents per order, most recently freed first
    pub free_lists: Vec<Vec<usize>>,
    /// Per order: block is whole and listed as free
    pub free_bits: Vec<BuddyBitmap>,
    /// Per order: block is allocated at exactly that order
    pub allocated_bits: Vec<BuddyBitmap>,
}

impl ArenaSnapshot {
    /// Every free block, lowest order first
    pub fn free_blocks(&self) -> impl Iterator<Item = BuddyBlock> + '_ {
        self.free_lists
            .iter()
            .enumerate()
            .flat_map(|(order, list)| {
                list.iter()
                    .map(move |&addr| BuddyBlock::new(order, addr))
            })
    }

    /// Every allocated block, lowest order first
    pub fn allocated_blocks(&self) -> impl Iterator<Item = BuddyBlock> + '_ {
        self.allocated_bits
            .iter()
            .enumerate()
            .flat_map(|(order, bits)| {
                bits.iter()
                    .enumerate()
                    .filter(|&(_, allocated)| allocated)
                    .map(move |(index, _)| BuddyBlock::new(order, index << order))
            })
    }

    pub fn free_block_count(&self) -> usize {
        self.free_lists.iter().map(Vec::len).sum()
    }

    /// Whether the free lists agree with the free bits and no two blocks
    /// (free or allocated) overlap
    pub fn is_consistent(&self) -> bool {
        for (order, list) in self.free_lists.iter().enumerate() {
            let bits = &self.free_bits[order];
            if bits.count_ones() != list.len() {
                return false;
            }
            if list.iter().any(|&addr| !bits.get(addr >> order)) {
                return false;
            }
            // Two free buddies should have been merged.
            if order < self.max_order {
                let buddy_free =
                    |&addr: &usize| bits.get(BuddyBlock::new(order, addr).buddy_index());
                if list.iter().any(buddy_free) {
                    return false;
                }
            }
        }

        let mut blocks: Vec<BuddyBlock> = self
            .free_blocks()
            .chain(self.allocated_blocks())
            .collect();
        blocks.sort();
        blocks.windows(2).all(|pair| !pair[0].overlaps(&pair[1]))
    }
}
