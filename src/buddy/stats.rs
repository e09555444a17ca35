//! Statistics and failure reporting for the buddy arena
//!
//! Only compiled with the `tracking` feature.

use super::buddy_block::MAX_SUPPORTED_ORDER;

/// Buddy arena statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuddyStats {
    pub total_units: usize,
    pub free_units: usize,
    pub used_units: usize,
    pub free_blocks_by_order: [usize; MAX_SUPPORTED_ORDER + 1],
}

impl Default for BuddyStats {
    fn default() -> Self {
        Self::new()
    }
}

impl BuddyStats {
    pub const fn new() -> Self {
        Self {
            total_units: 0,
            free_units: 0,
            used_units: 0,
            free_blocks_by_order: [0; MAX_SUPPORTED_ORDER + 1],
        }
    }
}

/// Detailed memory statistics reporter
pub struct MemoryStatsReporter;

impl MemoryStatsReporter {
    /// Log the arena state after an allocation of `request_order` failed
    #[allow(unused_variables)]
    pub fn print_alloc_failure_stats(stats: &BuddyStats, request_order: usize, max_order: usize) {
        #[cfg(feature = "log")]
        use log::error;

        error!("========================================");
        error!(
            "Request: order {} ({} units), max order {}",
            request_order,
            1usize << request_order,
            max_order
        );
        error!("  Total units: {}", stats.total_units);
        error!("  Free units: {}", stats.free_units);
        error!("  Used units: {}", stats.used_units);
        error!("  Free blocks by order:");
        for order in (0..=max_order).rev() {
            let count = stats.free_blocks_by_order[order];
            if count > 0 {
                error!(
                    "    Order {}: {} blocks ({} units each, {} units total)",
                    order,
                    count,
                    1usize << order,
                    count << order
                );
            }
        }
        error!("========================================");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let stats = BuddyStats::default();
        assert_eq!(stats, BuddyStats::new());
        assert_eq!(stats.total_units, 0);
        assert!(stats.free_blocks_by_order.iter().all(|&n| n == 0));
    }

    #[test]
    fn test_failure_report_covers_every_order() {
        let mut stats = BuddyStats::new();
        stats.total_units = 16;
        stats.used_units = 12;
        stats.free_units = 4;
        stats.free_blocks_by_order[2] = 1;
        MemoryStatsReporter::print_alloc_failure_stats(&stats, 3, 4);
        MemoryStatsReporter::print_alloc_failure_stats(&stats, 0, MAX_SUPPORTED_ORDER);
    }
}
