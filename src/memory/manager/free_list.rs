/*!
 * Segregated Free List
 * Index of free blocks over the heap region
 */

use super::storage::HeapStorage;
use crate::core::limits::{BLOCK_GRANULARITY, SMALL_BLOCK_MAX, SMALL_BUCKET_COUNT};
use crate::core::types::{Address, Cell, Size};
use log::debug;
use std::collections::BTreeMap;

/// Segregated free list for the heap region
/// - Small blocks (<1KB): one exact-size bucket per granule multiple, O(1) lookup
/// - Large blocks (>=1KB): O(log n) lookup using BTreeMap keyed by size
///
/// The list does not own memory. It indexes free blocks whose headers live
/// in the arena, and keeps the aggregate free-space counter.
#[derive(Debug)]
pub struct FreeList {
    /// Small free blocks, bucket `i` holds blocks of exactly `i * granularity` bytes
    small_blocks: Vec<Vec<Address>>,

    /// Large free blocks grouped by size
    large_blocks: BTreeMap<Size, Vec<Address>>,

    free_block_count: Cell,
    free_space: Cell,
}

impl FreeList {
    pub fn new() -> Self {
        Self {
            small_blocks: vec![Vec::new(); SMALL_BUCKET_COUNT],
            large_blocks: BTreeMap::new(),
            free_block_count: 0,
            free_space: 0,
        }
    }

    fn small_bucket_index(size: Size) -> Option<usize> {
        if size < SMALL_BLOCK_MAX {
            Some(size / BLOCK_GRANULARITY)
        } else {
            None
        }
    }

    /// Reset to a single free block covering `[start + occupied, end)`
    pub fn initial_free_list(
        &mut self,
        heap: &mut HeapStorage,
        start: Address,
        end: Address,
        occupied: Size,
    ) {
        self.clear_free_list();
        if occupied != end - start {
            let last_block = start + occupied;
            heap.make_free(last_block, end - last_block);
            self.add_to_free_list(last_block, end - last_block);
        }
    }

    pub fn clear_free_list(&mut self) {
        for bucket in &mut self.small_blocks {
            bucket.clear();
        }
        self.large_blocks.clear();
        self.free_block_count = 0;
        self.free_space = 0;
    }

    /// Index a block whose header already says it is free
    pub fn add_to_free_list(&mut self, block: Address, size: Size) {
        match Self::small_bucket_index(size) {
            Some(idx) => self.small_blocks[idx].push(block),
            None => self.large_blocks.entry(size).or_default().push(block),
        }
        self.free_block_count += 1;
        self.free_space += size;
    }

    /// Whether some free block can hold `size` bytes
    pub fn can_allot_p(&self, size: Size) -> bool {
        self.free_block_count > 0 && self.largest_free_block() >= size
    }

    /// Remove and return a free block of at least `size` bytes
    ///
    /// The block's full size is debited from `free_space`; any remainder is
    /// credited back by `split_free_block`.
    pub fn find_free_block(&mut self, size: Size) -> Option<(Address, Size)> {
        if let Some(start_bucket) = Self::small_bucket_index(size) {
            for bucket_idx in start_bucket..self.small_blocks.len() {
                if let Some(block) = self.small_blocks[bucket_idx].pop() {
                    let block_size = bucket_idx * BLOCK_GRANULARITY;
                    self.take(block_size);
                    return Some((block, block_size));
                }
            }
            // Fallthrough to large blocks if no small block fits
        }

        let block_size = *self.large_blocks.range(size..).next()?.0;
        let blocks = self.large_blocks.get_mut(&block_size)?;
        let block = blocks.pop()?;
        if blocks.is_empty() {
            self.large_blocks.remove(&block_size);
        }
        self.take(block_size);
        Some((block, block_size))
    }

    #[inline]
    fn take(&mut self, size: Size) {
        self.free_block_count -= 1;
        self.free_space -= size;
    }

    /// Carve `size` bytes off the front of a block taken by `find_free_block`
    ///
    /// The remainder, if any, is rewritten as a free block and reinserted.
    /// Returns the address of the prefix.
    pub fn split_free_block(
        &mut self,
        heap: &mut HeapStorage,
        block: Address,
        block_size: Size,
        size: Size,
    ) -> Address {
        if block_size != size {
            let split = block + size;
            let remainder = block_size - size;
            heap.make_free(split, remainder);
            self.add_to_free_list(split, remainder);
            debug!(
                "Split free block 0x{:x}: keeping {} bytes, returning {} bytes at 0x{:x}",
                block, size, remainder, split
            );
        }
        block
    }

    #[inline]
    pub fn free_space(&self) -> Cell {
        self.free_space
    }

    #[inline]
    pub fn free_block_count(&self) -> Cell {
        self.free_block_count
    }

    pub fn largest_free_block(&self) -> Cell {
        if let Some((&size, _)) = self.large_blocks.iter().next_back() {
            return size;
        }
        self.small_blocks
            .iter()
            .enumerate()
            .rev()
            .find(|(_, bucket)| !bucket.is_empty())
            .map_or(0, |(idx, _)| idx * BLOCK_GRANULARITY)
    }

    /// All indexed free blocks as `(address, size)` pairs, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (Address, Size)> + '_ {
        let small = self.small_blocks.iter().enumerate().flat_map(|(idx, bucket)| {
            bucket
                .iter()
                .map(move |&block| (block, idx * BLOCK_GRANULARITY))
        });
        let large = self
            .large_blocks
            .iter()
            .flat_map(|(&size, blocks)| blocks.iter().map(move |&block| (block, size)));
        small.chain(large)
    }
}

impl Default for FreeList {
    fn default() -> Self {
        Self::new()
    }
}
