/*!
 * Heap Traits
 * Allocation and space-accounting abstractions
 */

use super::types::*;
use crate::core::types::{Address, Cell, Size};

/// Heap allocator interface
pub trait Allocator {
    /// Whether a block of `size` bytes could be allotted right now
    fn can_allot_p(&self, size: Size) -> bool;

    /// Allot a block of at least `size` bytes, `None` when no free block fits
    fn allot(&mut self, size: Size) -> Option<Address>;

    /// Allot with an error describing the shortfall
    fn try_allot(&mut self, size: Size) -> HeapResult<Address>;

    /// Return a block to the free list without coalescing
    fn free(&mut self, block: Address);
}

/// Heap space accounting
pub trait HeapInfo {
    fn occupied_space(&self) -> Cell;

    fn free_space(&self) -> Cell;

    fn largest_free_block(&self) -> Cell;

    fn free_block_count(&self) -> Cell;

    /// Snapshot of all counters
    fn stats(&self) -> HeapStats;

    /// Pressure level derived from occupancy
    fn pressure(&self) -> HeapPressure {
        self.stats().memory_pressure()
    }
}
