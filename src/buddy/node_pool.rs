//! Shared node pool for the per-order free lists
//!
//! Every free list in an arena draws its nodes from one pool of slots.
//! Nodes are addressed by slot index, so a list is just a chain of indices
//! and no node graph is shared between owners.

use alloc::vec::Vec;

/// Slot in the node pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListNode {
    /// Block address stored in this node
    pub addr: usize,
    /// Next slot in the owning list (or in the pool's free chain)
    pub next: Option<usize>,
}

/// Index-based node pool shared by all orders
///
/// Released slots are chained through `next` and reused before the
/// backing vector grows.
#[derive(Debug, Default, Clone)]
pub struct NodePool {
    nodes: Vec<ListNode>,
    /// Head of the chain of unused slots
    free_head: Option<usize>,
    free_nodes: usize,
}

impl NodePool {
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free_head: None,
            free_nodes: 0,
        }
    }

    /// Create a pool with room for `capacity` nodes before reallocating
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    /// Take a slot, initialised with `addr` and `next`
    pub fn alloc_node(&mut self, addr: usize, next: Option<usize>) -> usize {
        match self.free_head {
            Some(idx) => {
                self.free_head = self.nodes[idx].next;
                self.free_nodes -= 1;
                self.nodes[idx] = ListNode { addr, next };
                idx
            }
            None => {
                self.nodes.push(ListNode { addr, next });
                self.nodes.len() - 1
            }
        }
    }

    /// Return a slot to the pool
    ///
    /// The slot must already be unlinked from its list.
    pub fn dealloc_node(&mut self, idx: usize) {
        self.nodes[idx] = ListNode {
            addr: 0,
            next: self.free_head,
        };
        self.free_head = Some(idx);
        self.free_nodes += 1;
    }

    pub fn get_node(&self, idx: usize) -> Option<&ListNode> {
        self.nodes.get(idx)
    }

    pub fn get_node_mut(&mut self, idx: usize) -> Option<&mut ListNode> {
        self.nodes.get_mut(idx)
    }

    /// Drop every slot, live or not
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.free_head = None;
        self.free_nodes = 0;
    }

    /// Slots ever created
    pub fn total_node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Slots waiting for reuse
    pub fn free_node_count(&self) -> usize {
        self.free_nodes
    }

    /// Slots currently linked into some list
    pub fn allocated_node_count(&self) -> usize {
        self.nodes.len() - self.free_nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_dealloc_reuses_slots() {
        let mut pool = NodePool::with_capacity(4);

        let a = pool.alloc_node(0x10, None);
        let b = pool.alloc_node(0x20, Some(a));
        assert_eq!(pool.total_node_count(), 2);
        assert_eq!(pool.allocated_node_count(), 2);
        assert_eq!(pool.get_node(b).unwrap().next, Some(a));

        pool.dealloc_node(a);
        assert_eq!(pool.free_node_count(), 1);
        assert_eq!(pool.allocated_node_count(), 1);

        // The released slot comes back before the pool grows.
        let c = pool.alloc_node(0x30, None);
        assert_eq!(c, a);
        assert_eq!(pool.total_node_count(), 2);
        assert_eq!(pool.get_node(c).unwrap().addr, 0x30);
    }

    #[test]
    fn test_node_access() {
        let mut pool = NodePool::new();
        let idx = pool.alloc_node(0, None);

        if let Some(node) = pool.get_node_mut(idx) {
            node.addr = 0x1000;
        }
        assert_eq!(pool.get_node(idx).unwrap().addr, 0x1000);
        assert!(pool.get_node(idx + 1).is_none());
    }

    #[test]
    fn test_reset_drops_every_slot() {
        let mut pool = NodePool::new();
        let idx1 = pool.alloc_node(1, None);
        let _idx2 = pool.alloc_node(2, None);
        pool.dealloc_node(idx1);
        assert_eq!(pool.free_node_count(), 1);
        assert_eq!(pool.allocated_node_count(), 1);

        pool.reset();
        assert_eq!(pool.total_node_count(), 0);
        assert_eq!(pool.free_node_count(), 0);
        assert_eq!(pool.alloc_node(3, None), 0);
    }
}
