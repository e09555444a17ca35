//! Free list of one order, backed by the shared node pool
//!
//! The list is a LIFO stack: the address pushed last is the one popped
//! first. Only `head` and `len` live here; the nodes belong to the pool.

#[cfg(feature = "log")]
use log::error;

use super::node_pool::NodePool;

/// LIFO list of block addresses drawing nodes from a [`NodePool`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PooledStack {
    head: Option<usize>,
    len: usize,
}

impl PooledStack {
    pub const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    /// Push `addr` onto the front of the list
    pub fn push(&mut self, pool: &mut NodePool, addr: usize) {
        let idx = pool.alloc_node(addr, self.head);
        self.head = Some(idx);
        self.len += 1;
    }

    /// Most recently pushed address, without removing it
    pub fn peek(&self, pool: &NodePool) -> Option<usize> {
        self.head
            .and_then(|idx| pool.get_node(idx))
            .map(|node| node.addr)
    }

    /// Pop the most recently pushed address
    pub fn pop(&mut self, pool: &mut NodePool) -> Option<usize> {
        let head_idx = self.head?;
        let Some(node) = pool.get_node(head_idx).copied() else {
            error!("free list head {} is corrupted", head_idx);
            return None;
        };

        self.head = node.next;
        self.len -= 1;
        pool.dealloc_node(head_idx);
        Some(node.addr)
    }

    /// Find the slot holding `addr`
    ///
    /// Returns `(node_idx, prev_idx)`, `prev_idx` being `None` at the head.
    fn find(&self, pool: &NodePool, addr: usize) -> Option<(usize, Option<usize>)> {
        let mut prev_idx = None;
        let mut current_idx = self.head;
        let mut visited = 0;

        while let Some(idx) = current_idx {
            if visited > self.len {
                error!("potential cycle detected in free list");
                return None;
            }
            let node = pool.get_node(idx)?;
            if node.addr == addr {
                return Some((idx, prev_idx));
            }
            prev_idx = current_idx;
            current_idx = node.next;
            visited += 1;
        }
        None
    }

    pub fn contains(&self, pool: &NodePool, addr: usize) -> bool {
        self.find(pool, addr).is_some()
    }

    /// Unlink `addr` from anywhere in the list
    ///
    /// Returns `false` if the address was not listed.
    pub fn remove(&mut self, pool: &mut NodePool, addr: usize) -> bool {
        let Some((node_idx, prev_idx)) = self.find(pool, addr) else {
            return false;
        };
        let next_idx = pool.get_node(node_idx).and_then(|n| n.next);

        match prev_idx {
            Some(prev) => {
                if let Some(prev_node) = pool.get_node_mut(prev) {
                    prev_node.next = next_idx;
                }
            }
            None => self.head = next_idx,
        }

        pool.dealloc_node(node_idx);
        self.len -= 1;
        true
    }

    /// Remove every entry, returning its nodes to the pool
    pub fn clear(&mut self, pool: &mut NodePool) {
        while self.pop(pool).is_some() {}
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Iterate from the most recently pushed address
    pub fn iter<'a>(&self, pool: &'a NodePool) -> PooledStackIter<'a> {
        PooledStackIter {
            pool,
            current: self.head,
        }
    }
}

/// Iterator over a [`PooledStack`]
pub struct PooledStackIter<'a> {
    pool: &'a NodePool,
    current: Option<usize>,
}

impl<'a> PooledStackIter<'a> {
    /// Iterator that yields nothing
    pub fn empty(pool: &'a NodePool) -> Self {
        Self {
            pool,
            current: None,
        }
    }
}

impl Iterator for PooledStackIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.pool.get_node(self.current?)?;
        self.current = node.next;
        Some(node.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn test_push_pop_is_lifo() {
        let mut pool = NodePool::new();
        let mut list = PooledStack::new();

        assert!(list.is_empty());
        assert_eq!(list.pop(&mut pool), None);

        list.push(&mut pool, 0x100);
        list.push(&mut pool, 0x200);
        list.push(&mut pool, 0x300);
        assert_eq!(list.len(), 3);
        assert_eq!(list.peek(&pool), Some(0x300));

        assert_eq!(list.pop(&mut pool), Some(0x300));
        assert_eq!(list.pop(&mut pool), Some(0x200));
        assert_eq!(list.len(), 1);
        assert_eq!(pool.allocated_node_count(), 1);

        list.clear(&mut pool);
        assert!(list.is_empty());
        assert_eq!(list.peek(&pool), None);
        assert_eq!(pool.allocated_node_count(), 0);
    }

    #[test]
    fn test_remove_from_middle() {
        let mut pool = NodePool::new();
        let mut list = PooledStack::new();
        for addr in [0x10, 0x20, 0x30, 0x40] {
            list.push(&mut pool, addr);
        }

        assert!(list.remove(&mut pool, 0x30));
        assert!(!list.remove(&mut pool, 0x30));
        assert!(!list.contains(&pool, 0x30));
        assert_eq!(list.len(), 3);

        let items: Vec<_> = list.iter(&pool).collect();
        assert_eq!(items, [0x40, 0x20, 0x10]);
    }

    #[test]
    fn test_remove_head_and_tail() {
        let mut pool = NodePool::new();
        let mut list = PooledStack::new();
        for addr in [1, 2, 3] {
            list.push(&mut pool, addr);
        }

        assert!(list.remove(&mut pool, 3));
        assert!(list.remove(&mut pool, 1));
        assert_eq!(list.iter(&pool).collect::<Vec<_>>(), [2]);
        assert_eq!(list.pop(&mut pool), Some(2));
        assert!(list.is_empty());
    }

    #[test]
    fn test_lists_share_pool() {
        let mut pool = NodePool::new();
        let mut low = PooledStack::new();
        let mut high = PooledStack::new();

        low.push(&mut pool, 0);
        high.push(&mut pool, 256);
        low.push(&mut pool, 8);
        assert_eq!(pool.allocated_node_count(), 3);

        assert_eq!(high.pop(&mut pool), Some(256));
        assert_eq!(low.iter(&pool).collect::<Vec<_>>(), [8, 0]);
        assert_eq!(pool.free_node_count(), 1);
    }
}
