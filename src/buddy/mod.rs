//! Buddy arena module
//!
//! This module provides the buddy system over a single arena:
//! - Per-order LIFO free lists backed by a shared node pool
//! - Per-order state bitmaps
//! - Recursive split on allocation, coalescing on release
//! - Read-only snapshots and optional statistics

pub mod bitmap;
pub mod buddy_arena;
pub mod buddy_block;
pub mod node_pool;
pub mod pooled_list;
pub mod snapshot;
#[cfg(feature = "tracking")]
pub mod stats;

pub use bitmap::BuddyBitmap;
pub use buddy_arena::BuddyArena;
pub use buddy_block::{BuddyBlock, DEFAULT_ORDER, MAX_SUPPORTED_ORDER};
pub use node_pool::{ListNode, NodePool};
pub use pooled_list::{PooledStack, PooledStackIter};
pub use snapshot::ArenaSnapshot;
#[cfg(feature = "tracking")]
pub use stats::BuddyStats;
