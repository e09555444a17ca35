//! Shared buddy arena behind a spinlock.
//!
//! The arena itself is single-threaded (`&mut self` everywhere). This wrapper
//! puts one lock around the whole arena so it can live in a `static` and be
//! used through `&self`.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::{ArenaSnapshot, BuddyArena, BuddyError, BuddyResult};
use kspin::SpinNoIrq;

#[cfg(feature = "log")]
use log::error;

/// Buddy arena guarded by a single IRQ-safe spinlock
pub struct LockedBuddyArena {
    inner: SpinNoIrq<Option<BuddyArena>>,
    initialized: AtomicBool,
}

impl LockedBuddyArena {
    pub const fn new() -> Self {
        Self {
            inner: SpinNoIrq::new(None),
            initialized: AtomicBool::new(false),
        }
    }

    /// Build the arena; calling again replaces it with a fresh one
    pub fn init(&self, max_order: usize) -> BuddyResult {
        let arena = BuddyArena::new(max_order)?;
        *self.inner.lock() = Some(arena);
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Run `f` on the arena while holding the lock
    ///
    /// Returns `None` before `init`.
    pub fn with<R>(&self, f: impl FnOnce(&mut BuddyArena) -> R) -> Option<R> {
        self.inner.lock().as_mut().map(f)
    }

    pub fn order_malloc(&self, order: usize) -> BuddyResult<usize> {
        self.with(|arena| arena.order_malloc(order))
            .unwrap_or_else(|| {
                error!("locked buddy arena: allocation before init");
                Err(BuddyError::NoMemory)
            })
    }

    pub fn order_malloc_at(&self, addr: usize, order: usize) -> BuddyResult<usize> {
        self.with(|arena| arena.order_malloc_at(addr, order))
            .unwrap_or_else(|| {
                error!("locked buddy arena: allocation before init");
                Err(BuddyError::NoMemory)
            })
    }

    pub fn order_free(&self, addr: usize, order: usize, clear: bool) -> BuddyResult {
        self.with(|arena| arena.order_free(addr, order, clear))
            .unwrap_or_else(|| {
                error!("locked buddy arena: release of {:#x} before init", addr);
                Err(BuddyError::NotAllocated)
            })
    }

    pub fn snapshot(&self) -> Option<ArenaSnapshot> {
        self.with(|arena| arena.snapshot())
    }
}

impl Default for LockedBuddyArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialized_arena_rejects_calls() {
        let arena = LockedBuddyArena::new();
        assert!(!arena.is_initialized());
        assert_eq!(arena.order_malloc(0), Err(BuddyError::NoMemory));
        assert_eq!(arena.order_free(0, 0, true), Err(BuddyError::NotAllocated));
        assert!(arena.snapshot().is_none());
    }

    #[test]
    fn test_locked_round_trip() {
        static ARENA: LockedBuddyArena = LockedBuddyArena::new();
        ARENA.init(6).unwrap();
        assert!(ARENA.is_initialized());

        let before = ARENA.snapshot().unwrap();
        let addr = ARENA.order_malloc(2).unwrap();
        assert_eq!(ARENA.with(|a| a.is_allocated(addr, 2)), Some(true));
        ARENA.order_free(addr, 2, true).unwrap();
        assert_eq!(ARENA.snapshot().unwrap(), before);
    }

    #[test]
    fn test_init_rejects_bad_order() {
        let arena = LockedBuddyArena::new();
        assert_eq!(arena.init(64), Err(BuddyError::InvalidOrder));
        assert!(!arena.is_initialized());
    }
}
