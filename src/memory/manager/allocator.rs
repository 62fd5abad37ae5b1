/*!
 * Allocation Path
 * Allotting and freeing blocks against the free list
 */

use super::super::types::{HeapError, HeapResult};
use super::FreeListAllocator;
use crate::core::limits::{BLOCK_GRANULARITY, MIN_BLOCK_SIZE};
use crate::core::types::{checked_align, Address, Cell, Size};
use log::{debug, trace};

impl FreeListAllocator {
    /// Whether some free block is at least `size` bytes
    pub fn can_allot_p(&self, size: Size) -> bool {
        self.free_blocks.can_allot_p(size)
    }

    /// Allot a block of at least `size` bytes
    ///
    /// The size is rounded up to the block granularity and includes the
    /// header. Returns `None` when no free block is large enough; the caller
    /// is expected to collect or grow the heap and retry.
    pub fn allot(&mut self, size: Size) -> Option<Address> {
        let size = checked_align(size.max(MIN_BLOCK_SIZE), BLOCK_GRANULARITY)?;

        let Some((block, block_size)) = self.free_blocks.find_free_block(size) else {
            debug!(
                "Allocation of {} bytes failed: largest free block {} bytes, {} bytes free",
                size,
                self.free_blocks.largest_free_block(),
                self.free_blocks.free_space()
            );
            return None;
        };

        let block = self
            .free_blocks
            .split_free_block(&mut self.heap, block, block_size, size);
        self.heap.make_allocated(block, size);

        trace!("Allotted {} bytes at 0x{:x}", size, block);
        Some(block)
    }

    /// Allot a block, reporting the free-space situation on failure
    pub fn try_allot(&mut self, size: Size) -> HeapResult<Address> {
        self.allot(size).ok_or_else(|| HeapError::OutOfMemory {
            requested: size,
            largest_free: self.free_blocks.largest_free_block(),
            free: self.free_blocks.free_space(),
        })
    }

    /// Return a block to the free list
    ///
    /// Neighbouring free blocks are not merged here; the next sweep
    /// coalesces every free run in one pass.
    pub fn free(&mut self, block: Address) {
        debug_assert!(self.contains_p(block), "free of foreign block 0x{:x}", block);
        let header = self.heap.read_header(block);
        debug_assert!(!header.free_p(), "double free of block 0x{:x}", block);

        let size = header.size();
        self.heap.make_free(block, size);
        self.free_blocks.add_to_free_list(block, size);

        trace!("Freed {} bytes at 0x{:x}", size, block);
    }

    pub fn occupied_space(&self) -> Cell {
        self.size - self.free_blocks.free_space()
    }

    pub fn free_space(&self) -> Cell {
        self.free_blocks.free_space()
    }

    pub fn largest_free_block(&self) -> Cell {
        self.free_blocks.largest_free_block()
    }

    pub fn free_block_count(&self) -> Cell {
        self.free_blocks.free_block_count()
    }

    /// Free space recorded after the last construction or sweep
    pub fn high_water_mark(&self) -> Cell {
        self.high_water_mark
    }
}
