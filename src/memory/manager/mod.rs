/*!
 * Free-List Heap
 *
 * Heap-space manager for a single contiguous region of raw storage.
 *
 * ## Layout
 *
 * The region `[start, end)` is tiled by blocks. Each block starts with an
 * in-place header recording its total size and whether it is free, so the
 * only way to find block boundaries is to walk forward by header size.
 *
 * ## Operations
 *
 * - **Allocation**: `allot` rounds to the block granularity and carves the
 *   request out of a segregated free list; failure is an ordinary `None`
 * - **Free**: `free` rewrites the header and indexes the block, without
 *   merging neighbours
 * - **Sweep**: one linear pass that reclaims unmarked blocks, merges every
 *   run of free space and rebuilds the free list
 * - **Compaction**: slides marked blocks down to a dense prefix through a
 *   relocation callback and leaves one trailing free block
 *
 * ## Concurrency
 *
 * None. Every operation expects exclusive access to the region for its
 * whole duration, which `&mut self` enforces.
 */

mod allocator;
mod compact;
mod free_list;
mod storage;
mod sweep;

pub use compact::{standard_sizer, HeapCompactor};
pub use free_list::FreeList;
pub use storage::HeapStorage;

use super::config::HeapConfig;
use super::gc::MarkBits;
use super::traits::{Allocator, HeapInfo};
use super::types::{Block, HeapResult, HeapStats};
use crate::core::limits::BLOCK_GRANULARITY;
use crate::core::types::{is_aligned, Address, Cell, Size};
use log::{debug, info};

/// Free-list allocator over one region
pub struct FreeListAllocator {
    size: Size,
    start: Address,
    end: Address,
    /// Free space right after the last full free-list rebuild
    high_water_mark: Cell,
    free_blocks: FreeList,
    state: MarkBits,
    heap: HeapStorage,
}

impl FreeListAllocator {
    /// Create an allocator over `size` bytes starting at virtual address `start`
    pub fn new(size: Size, start: Address) -> HeapResult<Self> {
        Self::with_config(&HeapConfig::new(size).with_start(start))
    }

    pub fn with_config(config: &HeapConfig) -> HeapResult<Self> {
        config.validate()?;

        let mut allocator = Self {
            size: config.size,
            start: config.start,
            end: config.start + config.size,
            high_water_mark: 0,
            free_blocks: FreeList::new(),
            state: MarkBits::new(config.size, config.start),
            heap: HeapStorage::new(config.start, config.size),
        };
        allocator.initial_free_list(config.occupied);

        info!(
            "Heap initialized: {} bytes at 0x{:x} ({} bytes occupied, {} bytes free)",
            allocator.size,
            allocator.start,
            config.occupied,
            allocator.free_space()
        );
        Ok(allocator)
    }

    /// Reset the region to an allocated prefix of `occupied` bytes followed
    /// by one free block
    ///
    /// Any blocks previously handed out are forgotten; the prefix becomes a
    /// single allocated block.
    pub fn initial_free_list(&mut self, occupied: Size) {
        debug_assert!(occupied <= self.size);
        debug_assert!(
            is_aligned(occupied, BLOCK_GRANULARITY),
            "occupied prefix {} is not a multiple of the block granularity",
            occupied
        );
        if occupied > 0 {
            self.heap.make_allocated(self.start, occupied);
        }
        self.free_blocks
            .initial_free_list(&mut self.heap, self.start, self.end, occupied);
        self.high_water_mark = self.free_blocks.free_space();
        debug!(
            "Free list rebuilt from occupied prefix of {} bytes, high water mark {}",
            occupied, self.high_water_mark
        );
    }

    // =========================================================================
    // Region & block model
    // =========================================================================

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    #[inline]
    pub fn start(&self) -> Address {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Address {
        self.end
    }

    /// Whether `block` lies in `[start, end)`
    ///
    /// A single unsigned compare: addresses below `start` wrap to huge offsets.
    #[inline]
    pub fn contains_p(&self, block: Address) -> bool {
        block.wrapping_sub(self.start) < self.size
    }

    #[inline]
    pub fn first_block(&self) -> Address {
        self.start
    }

    /// One-past-the-end sentinel, never a real block
    #[inline]
    pub fn last_block(&self) -> Address {
        self.end
    }

    /// Decode the header of the block at `block`
    #[inline]
    pub fn block_at(&self, block: Address) -> Block {
        self.heap.read_header(block)
    }

    #[inline]
    pub fn next_block_after(&self, block: Address) -> Address {
        block + self.heap.read_header(block).size()
    }

    /// Next allocated block following `block`, skipping free runs
    pub fn next_allocated_block_after(&self, block: Address) -> Option<Address> {
        self.skip_free_blocks(self.next_block_after(block))
    }

    pub fn first_allocated_block(&self) -> Option<Address> {
        self.skip_free_blocks(self.first_block())
    }

    fn skip_free_blocks(&self, mut block: Address) -> Option<Address> {
        let end = self.last_block();
        while block != end {
            let header = self.heap.read_header(block);
            if !header.free_p() {
                return Some(block);
            }
            block += header.size();
        }
        None
    }

    /// Every block in address order, free or allocated
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks {
            allocator: self,
            scan: self.first_block(),
        }
    }

    /// Allocated blocks in address order
    pub fn allocated_blocks(&self) -> AllocatedBlocks<'_> {
        AllocatedBlocks {
            allocator: self,
            next: self.first_allocated_block(),
        }
    }

    // =========================================================================
    // Collaborators
    // =========================================================================

    pub fn heap(&self) -> &HeapStorage {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut HeapStorage {
        &mut self.heap
    }

    pub fn free_list(&self) -> &FreeList {
        &self.free_blocks
    }

    pub fn state(&self) -> &MarkBits {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut MarkBits {
        &mut self.state
    }

    /// Record the block at `block` as live for the next sweep or compaction
    pub fn mark_block(&mut self, block: Address) {
        let size = self.heap.read_header(block).size();
        self.state.set_marked_p(block, size);
    }

    pub fn clear_marks(&mut self) {
        self.state.clear_mark_bits();
    }

    pub fn compute_forwarding(&mut self) {
        self.state.compute_forwarding();
    }

    /// Post-compaction address of the live block at `block`
    pub fn forward_block(&self, block: Address) -> Address {
        self.state.forward_block(block)
    }

    pub fn stats(&self) -> HeapStats {
        let occupied = self.occupied_space();
        HeapStats {
            start: self.start,
            size: self.size,
            occupied_space: occupied,
            free_space: self.free_space(),
            largest_free_block: self.largest_free_block(),
            free_block_count: self.free_block_count(),
            high_water_mark: self.high_water_mark,
            usage_percentage: occupied as f64 / self.size as f64 * 100.0,
        }
    }
}

/// Iterator over `(address, header)` for every block in the region
pub struct Blocks<'a> {
    allocator: &'a FreeListAllocator,
    scan: Address,
}

impl Iterator for Blocks<'_> {
    type Item = (Address, Block);

    fn next(&mut self) -> Option<Self::Item> {
        if self.scan == self.allocator.last_block() {
            return None;
        }
        let block = self.scan;
        let header = self.allocator.block_at(block);
        self.scan += header.size();
        Some((block, header))
    }
}

/// Iterator over allocated blocks as `(address, size)`
pub struct AllocatedBlocks<'a> {
    allocator: &'a FreeListAllocator,
    next: Option<Address>,
}

impl Iterator for AllocatedBlocks<'_> {
    type Item = (Address, Size);

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.next?;
        let size = self.allocator.block_at(block).size();
        self.next = self.allocator.next_allocated_block_after(block);
        Some((block, size))
    }
}

// Implement trait interfaces
impl Allocator for FreeListAllocator {
    fn can_allot_p(&self, size: Size) -> bool {
        FreeListAllocator::can_allot_p(self, size)
    }

    fn allot(&mut self, size: Size) -> Option<Address> {
        FreeListAllocator::allot(self, size)
    }

    fn try_allot(&mut self, size: Size) -> HeapResult<Address> {
        FreeListAllocator::try_allot(self, size)
    }

    fn free(&mut self, block: Address) {
        FreeListAllocator::free(self, block)
    }
}

impl HeapInfo for FreeListAllocator {
    fn occupied_space(&self) -> Cell {
        FreeListAllocator::occupied_space(self)
    }

    fn free_space(&self) -> Cell {
        FreeListAllocator::free_space(self)
    }

    fn largest_free_block(&self) -> Cell {
        FreeListAllocator::largest_free_block(self)
    }

    fn free_block_count(&self) -> Cell {
        FreeListAllocator::free_block_count(self)
    }

    fn stats(&self) -> HeapStats {
        FreeListAllocator::stats(self)
    }
}

impl Default for FreeListAllocator {
    fn default() -> Self {
        // The default configuration is statically valid
        match Self::with_config(&HeapConfig::default()) {
            Ok(allocator) => allocator,
            Err(e) => unreachable!("default heap configuration rejected: {}", e),
        }
    }
}
