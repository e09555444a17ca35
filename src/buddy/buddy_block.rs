//! Buddy block metadata
//!
//! Represents a block of the arena by its order and start address.

/// Largest order an arena may be built with
pub const MAX_SUPPORTED_ORDER: usize = 28; // 256MiB arena

/// Order used by `BuddyArena::default()` (512-unit arena)
pub const DEFAULT_ORDER: usize = 9;

/// A block of `2^order` units starting at `addr`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuddyBlock {
    pub order: usize,
    pub addr: usize,
}

impl BuddyBlock {
    pub const fn new(order: usize, addr: usize) -> Self {
        Self { order, addr }
    }

    /// Size of the block in units
    pub const fn size(&self) -> usize {
        1 << self.order
    }

    /// Block number at this order
    pub const fn index(&self) -> usize {
        self.addr >> self.order
    }

    /// Index of the other half of the parent block
    pub const fn buddy_index(&self) -> usize {
        self.index() ^ 1
    }

    /// The buddy is the other half of the parent block at the next higher order.
    /// For a block at order k with address A, its buddy is at A ^ 2^k.
    pub const fn buddy(&self) -> Self {
        Self::new(self.order, self.addr ^ self.size())
    }

    /// The block of the next order containing this one
    pub const fn parent(&self) -> Self {
        let order = self.order + 1;
        Self::new(order, self.addr & !((1 << order) - 1))
    }

    /// Split into `(lower, upper)` halves one order down
    pub const fn split(&self) -> (Self, Self) {
        let order = self.order - 1;
        (
            Self::new(order, self.addr),
            Self::new(order, self.addr | (1 << order)),
        )
    }

    /// Whether `addr` lies inside this block
    pub const fn contains(&self, addr: usize) -> bool {
        addr >= self.addr && addr - self.addr < self.size()
    }

    /// Whether two blocks share any unit
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.addr < other.addr + other.size() && other.addr < self.addr + self.size()
    }
}

impl PartialOrd for BuddyBlock {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BuddyBlock {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.addr
            .cmp(&other.addr)
            .then(self.order.cmp(&other.order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buddy_and_parent() {
        let block = BuddyBlock::new(3, 8);
        assert_eq!(block.index(), 1);
        assert_eq!(block.buddy_index(), 0);
        assert_eq!(block.buddy(), BuddyBlock::new(3, 0));
        assert_eq!(block.parent(), BuddyBlock::new(4, 0));
        assert_eq!(block.buddy().parent(), block.parent());

        let high = BuddyBlock::new(1, 14);
        assert_eq!(high.buddy(), BuddyBlock::new(1, 12));
        assert_eq!(high.parent(), BuddyBlock::new(2, 12));
    }

    #[test]
    fn test_split() {
        let (lower, upper) = BuddyBlock::new(4, 32).split();
        assert_eq!(lower, BuddyBlock::new(3, 32));
        assert_eq!(upper, BuddyBlock::new(3, 40));
        assert_eq!(lower.buddy(), upper);
    }

    #[test]
    fn test_contains_and_overlaps() {
        let block = BuddyBlock::new(2, 8);
        assert!(block.contains(8));
        assert!(block.contains(11));
        assert!(!block.contains(12));
        assert!(!block.contains(7));

        assert!(block.overlaps(&BuddyBlock::new(3, 8)));
        assert!(block.overlaps(&BuddyBlock::new(0, 9)));
        assert!(!block.overlaps(&BuddyBlock::new(2, 12)));
        assert!(!block.overlaps(&BuddyBlock::new(3, 0)));
    }
}
