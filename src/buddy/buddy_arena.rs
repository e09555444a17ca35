//! Buddy allocator over one fixed-size arena
//!
//! Blocks are split on demand by recursing one order up, and coalesced on
//! release by walking up while the buddy is free. Each order keeps a LIFO
//! free list plus two state tables:
//! - `free`: the block is whole and sits in this order's free list
//! - `allocated`: the block was handed out at exactly this order
//!
//! A block with neither flag is either split or covered by a larger block.

use alloc::vec;
use alloc::vec::Vec;

use crate::{is_aligned, BuddyError, BuddyResult};

#[cfg(feature = "log")]
use log::{debug, error, trace, warn};

use super::{
    bitmap::BuddyBitmap,
    buddy_block::{BuddyBlock, DEFAULT_ORDER, MAX_SUPPORTED_ORDER},
    node_pool::NodePool,
    pooled_list::{PooledStack, PooledStackIter},
    snapshot::ArenaSnapshot,
};

/// Bookkeeping for a single order
#[derive(Debug, Clone)]
struct OrderLevel {
    free_list: PooledStack,
    free: BuddyBitmap,
    allocated: BuddyBitmap,
}

impl OrderLevel {
    fn new(num_blocks: usize) -> Self {
        Self {
            free_list: PooledStack::new(),
            free: BuddyBitmap::new(num_blocks, false),
            allocated: BuddyBitmap::new(num_blocks, false),
        }
    }
}

/// Power-of-two buddy allocator owning its arena
///
/// Addresses are offsets into the arena, in `0..2^max_order`.
#[derive(Debug, Clone)]
pub struct BuddyArena {
    max_order: usize,
    arena: Vec<u8>,
    levels: Vec<OrderLevel>,
    pool: NodePool,
}

impl BuddyArena {
    /// Create an arena of `2^max_order` units with the whole arena free
    pub fn new(max_order: usize) -> BuddyResult<Self> {
        if max_order > MAX_SUPPORTED_ORDER {
            error!(
                "buddy arena: order {} exceeds maximum supported order {}",
                max_order, MAX_SUPPORTED_ORDER
            );
            return Err(BuddyError::InvalidOrder);
        }
        Ok(Self::build(max_order))
    }

    fn build(max_order: usize) -> Self {
        let arena_size = 1usize << max_order;
        let levels = (0..=max_order)
            .map(|order| OrderLevel::new(arena_size >> order))
            .collect();

        let mut arena = Self {
            max_order,
            arena: vec![0; arena_size],
            levels,
            pool: NodePool::with_capacity(max_order + 1),
        };
        arena.seed();
        debug!(
            "buddy arena: created with max order {} ({} units)",
            max_order, arena_size
        );
        arena
    }

    /// The whole arena starts as the single free top-order block.
    fn seed(&mut self) {
        let top = &mut self.levels[self.max_order];
        top.free.set(0);
        top.free_list.push(&mut self.pool, 0);
    }

    /// Drop every allocation and return to the freshly built state
    pub fn reset(&mut self) {
        for level in &mut self.levels {
            level.free_list.clear(&mut self.pool);
            level.free.fill(false);
            level.allocated.fill(false);
        }
        self.pool.reset();
        self.arena.fill(0);
        self.seed();
        debug!("buddy arena: reset (max order {})", self.max_order);
    }

    pub fn max_order(&self) -> usize {
        self.max_order
    }

    /// Arena size in units
    pub fn arena_size(&self) -> usize {
        self.arena.len()
    }

    pub fn arena(&self) -> &[u8] {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut [u8] {
        &mut self.arena
    }

    /// Allocate a block of `2^order` units and return its address
    pub fn order_malloc(&mut self, order: usize) -> BuddyResult<usize> {
        if order > self.max_order {
            error!(
                "buddy arena: order {} exceeds max order {}",
                order, self.max_order
            );
            return Err(BuddyError::InvalidOrder);
        }

        match self.take_block(order) {
            Ok(addr) => {
                self.levels[order].allocated.set(addr >> order);
                Ok(addr)
            }
            Err(BuddyError::NoMemory) => {
                warn!(
                    "buddy arena: out of memory for order {} ({} units)",
                    order,
                    1usize << order
                );
                #[cfg(feature = "tracking")]
                super::stats::MemoryStatsReporter::print_alloc_failure_stats(
                    &self.stats(),
                    order,
                    self.max_order,
                );
                Err(BuddyError::NoMemory)
            }
            Err(e) => Err(e),
        }
    }

    /// Pop a free block of `order`, splitting a larger one if needed
    ///
    /// Nothing is mutated unless a block is found.
    fn take_block(&mut self, order: usize) -> BuddyResult<usize> {
        let level = &mut self.levels[order];
        if let Some(addr) = level.free_list.peek(&self.pool) {
            let index = addr >> order;
            if !level.free.get(index) {
                error!(
                    "buddy arena: listed block {:#x} at order {} is not marked free",
                    addr, order
                );
                return Err(BuddyError::Corrupted);
            }
            level.free_list.pop(&mut self.pool);
            level.free.clear(index);
            return Ok(addr);
        }

        if order == self.max_order {
            return Err(BuddyError::NoMemory);
        }

        let parent = BuddyBlock::new(order + 1, self.take_block(order + 1)?);
        let (lower, upper) = parent.split();

        let level = &mut self.levels[order];
        level.free.set(upper.index());
        level.free_list.push(&mut self.pool, upper.addr);
        trace!(
            "buddy arena: split {:#x}/{} -> keep {:#x}, free {:#x}",
            parent.addr,
            parent.order,
            lower.addr,
            upper.addr
        );
        Ok(lower.addr)
    }

    /// Allocate exactly the block at `addr` of `2^order` units
    ///
    /// The block must be free, on its own or inside a larger free block.
    pub fn order_malloc_at(&mut self, addr: usize, order: usize) -> BuddyResult<usize> {
        self.check_block(addr, order)?;

        let Some(found) = (order..=self.max_order)
            .map(|o| BuddyBlock::new(o, addr & !((1usize << o) - 1)))
            .find(|block| self.levels[block.order].free.get(block.index()))
        else {
            warn!(
                "buddy arena: no free block contains {:#x} at order {}",
                addr, order
            );
            return Err(BuddyError::NoMemory);
        };

        let level = &mut self.levels[found.order];
        if !level.free_list.remove(&mut self.pool, found.addr) {
            error!(
                "buddy arena: block {:#x} at order {} is marked free but not listed",
                found.addr, found.order
            );
            return Err(BuddyError::Corrupted);
        }
        level.free.clear(found.index());

        let mut current = found;
        while current.order > order {
            let (lower, upper) = current.split();
            let (keep, spare) = if upper.contains(addr) {
                (upper, lower)
            } else {
                (lower, upper)
            };
            let level = &mut self.levels[spare.order];
            level.free.set(spare.index());
            level.free_list.push(&mut self.pool, spare.addr);
            current = keep;
        }

        self.levels[order].allocated.set(current.index());
        Ok(addr)
    }

    /// Release the block at `addr` previously allocated at `order`
    ///
    /// With `clear`, the block's bytes are zeroed before it is merged back.
    pub fn order_free(&mut self, addr: usize, order: usize, clear: bool) -> BuddyResult {
        self.check_block(addr, order)?;

        let block = BuddyBlock::new(order, addr);
        if !self.levels[order].allocated.get(block.index()) {
            error!(
                "buddy arena: block {:#x} is not allocated at order {}",
                addr, order
            );
            return Err(BuddyError::NotAllocated);
        }
        self.check_merge_chain(block)?;
        self.levels[order].allocated.clear(block.index());

        if clear {
            self.arena[addr..addr + block.size()].fill(0);
        }
        self.release_block(block);
        Ok(())
    }

    /// Every buddy the merge walk of `block` would absorb must be listed
    fn check_merge_chain(&self, mut block: BuddyBlock) -> BuddyResult {
        while block.order < self.max_order {
            let level = &self.levels[block.order];
            if !level.free.get(block.buddy_index()) {
                break;
            }
            let buddy = block.buddy();
            if !level.free_list.contains(&self.pool, buddy.addr) {
                error!(
                    "buddy arena: free buddy {:#x} missing from order {} list",
                    buddy.addr, buddy.order
                );
                return Err(BuddyError::Corrupted);
            }
            block = block.parent();
        }
        Ok(())
    }

    /// Merge `block` with free buddies as far up as possible, then list it
    ///
    /// The merge chain must have passed `check_merge_chain`.
    fn release_block(&mut self, block: BuddyBlock) {
        if block.order < self.max_order {
            let level = &mut self.levels[block.order];
            if level.free.get(block.buddy_index()) {
                let buddy = block.buddy();
                level.free.clear(buddy.index());
                level.free_list.remove(&mut self.pool, buddy.addr);
                trace!(
                    "buddy arena: merge {:#x} + {:#x} at order {}",
                    block.addr,
                    buddy.addr,
                    block.order
                );
                return self.release_block(block.parent());
            }
        }

        let level = &mut self.levels[block.order];
        level.free.set(block.index());
        level.free_list.push(&mut self.pool, block.addr);
    }

    /// Reject orders, addresses and alignments that name no block
    fn check_block(&self, addr: usize, order: usize) -> BuddyResult {
        if order > self.max_order {
            error!(
                "buddy arena: order {} exceeds max order {}",
                order, self.max_order
            );
            return Err(BuddyError::InvalidOrder);
        }
        if addr >= self.arena_size() {
            error!(
                "buddy arena: address {:#x} outside arena [0, {:#x})",
                addr,
                self.arena_size()
            );
            return Err(BuddyError::OutOfBounds);
        }
        if !is_aligned(addr, 1 << order) {
            error!(
                "buddy arena: address {:#x} is not aligned for order {}",
                addr, order
            );
            return Err(BuddyError::Misaligned);
        }
        Ok(())
    }

    fn names_block(&self, addr: usize, order: usize) -> bool {
        order <= self.max_order && addr < self.arena_size() && is_aligned(addr, 1 << order)
    }

    /// Free block addresses of `order`, most recently freed first
    ///
    /// Empty for orders past the top.
    pub fn free_blocks(&self, order: usize) -> PooledStackIter<'_> {
        match self.levels.get(order) {
            Some(level) => level.free_list.iter(&self.pool),
            None => PooledStackIter::empty(&self.pool),
        }
    }

    /// Number of free blocks of `order` (0 for orders past the top)
    pub fn order_block_count(&self, order: usize) -> usize {
        self.levels
            .get(order)
            .map_or(0, |level| level.free_list.len())
    }

    /// Whether `addr` is a free block of exactly `order`
    pub fn is_free(&self, addr: usize, order: usize) -> bool {
        self.names_block(addr, order) && self.levels[order].free.get(addr >> order)
    }

    /// Whether `addr` is currently allocated at exactly `order`
    pub fn is_allocated(&self, addr: usize, order: usize) -> bool {
        self.names_block(addr, order) && self.levels[order].allocated.get(addr >> order)
    }

    /// Units held by free blocks
    pub fn free_units(&self) -> usize {
        self.levels
            .iter()
            .enumerate()
            .map(|(order, level)| level.free_list.len() << order)
            .sum()
    }

    /// Units held by allocated blocks
    pub fn used_units(&self) -> usize {
        self.arena_size() - self.free_units()
    }

    /// Copy of every free list and state table
    pub fn snapshot(&self) -> ArenaSnapshot {
        ArenaSnapshot {
            max_order: self.max_order,
            free_lists: (0..=self.max_order)
                .map(|order| self.free_blocks(order).collect())
                .collect(),
            free_bits: self.levels.iter().map(|l| l.free.clone()).collect(),
            allocated_bits: self.levels.iter().map(|l| l.allocated.clone()).collect(),
        }
    }

    #[cfg(feature = "tracking")]
    pub fn stats(&self) -> super::stats::BuddyStats {
        let mut stats = super::stats::BuddyStats::new();
        stats.total_units = self.arena_size();
        for (order, level) in self.levels.iter().enumerate() {
            stats.free_blocks_by_order[order] = level.free_list.len();
        }
        stats.free_units = self.free_units();
        stats.used_units = self.used_units();
        stats
    }
}

impl Default for BuddyArena {
    fn default() -> Self {
        Self::build(DEFAULT_ORDER)
    }
}
