//! Buddy Arena Allocator
//!
//! A power-of-two buddy allocator over one fixed-size arena, featuring:
//! - Allocation by order, splitting larger free blocks on demand
//! - Coalescing of free buddies on release
//! - Per-order LIFO free lists and state bitmaps
//! - An optional spinlock wrapper for shared use

#![no_std]

extern crate alloc;

use core::fmt;

// Logging support - conditionally import log crate
#[cfg(feature = "log")]
extern crate log;

// Stub macros when log is disabled - these become no-ops
#[cfg(not(feature = "log"))]
macro_rules! error {
    ($($arg:tt)*) => {};
}
#[cfg(not(feature = "log"))]
macro_rules! warn {
    ($($arg:tt)*) => {};
}
#[cfg(not(feature = "log"))]
#[allow(unused_macros)]
macro_rules! info {
    ($($arg:tt)*) => {};
}
#[cfg(not(feature = "log"))]
macro_rules! debug {
    ($($arg:tt)*) => {};
}
#[cfg(not(feature = "log"))]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

/// The error type used by the buddy arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuddyError {
    /// No free block of the requested order, even after splitting.
    NoMemory,
    /// Order larger than the arena's maximum order.
    InvalidOrder,
    /// Address outside the arena.
    OutOfBounds,
    /// Address not aligned to the block size of its order.
    Misaligned,
    /// Release of a block that is not allocated at the given order.
    NotAllocated,
    /// Free list and state table disagree.
    Corrupted,
}

impl fmt::Display for BuddyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            BuddyError::NoMemory => "no free block of the requested order",
            BuddyError::InvalidOrder => "order out of range",
            BuddyError::OutOfBounds => "address outside the arena",
            BuddyError::Misaligned => "address not aligned to its block size",
            BuddyError::NotAllocated => "block is not allocated at this order",
            BuddyError::Corrupted => "free list and state table disagree",
        };
        f.write_str(msg)
    }
}

/// A [`Result`] type with [`BuddyError`] as the error type.
pub type BuddyResult<T = ()> = Result<T, BuddyError>;

/// Checks whether the address has the demanded alignment.
///
/// Equivalent to `addr % align == 0`, but the alignment must be a power of two.
#[inline]
const fn is_aligned(base_addr: usize, align: usize) -> bool {
    base_addr & (align - 1) == 0
}

pub mod buddy;
#[cfg(feature = "tracking")]
pub use buddy::BuddyStats;
pub use buddy::{ArenaSnapshot, BuddyArena, BuddyBlock, DEFAULT_ORDER, MAX_SUPPORTED_ORDER};

pub mod locked;
pub use locked::LockedBuddyArena;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_is_aligned() {
        assert!(is_aligned(0, 8));
        assert!(is_aligned(16, 8));
        assert!(!is_aligned(12, 8));
        assert!(is_aligned(7, 1));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            BuddyError::NotAllocated.to_string(),
            "block is not allocated at this order"
        );
        assert_eq!(
            BuddyError::NoMemory.to_string(),
            "no free block of the requested order"
        );
    }
}
