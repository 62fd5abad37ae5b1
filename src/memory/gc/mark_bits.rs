/*!
 * Mark Bits
 * Per-granule liveness bitmap and forwarding table for one region
 */

use crate::core::limits::{BLOCK_GRANULARITY, GRANULES_PER_MARK_WORD};
use crate::core::types::{Address, Size};

/// Liveness side table over a region
///
/// One bit per granule. Marking a block sets every granule it covers, so a
/// prefix popcount over the bitmap gives the number of live bytes below any
/// address. That prefix count is the forwarding table used by compaction.
#[derive(Debug, Clone)]
pub struct MarkBits {
    start: Address,
    size: Size,
    marked: Vec<u64>,
    /// Live granules before each bitmap word, valid after `compute_forwarding`
    forwarding: Vec<usize>,
    forwarding_valid: bool,
}

impl MarkBits {
    pub fn new(size: Size, start: Address) -> Self {
        let granules = size / BLOCK_GRANULARITY;
        let words = granules.div_ceil(GRANULES_PER_MARK_WORD);
        Self {
            start,
            size,
            marked: vec![0; words],
            forwarding: vec![0; words],
            forwarding_valid: false,
        }
    }

    #[inline]
    fn granule(&self, address: Address) -> usize {
        debug_assert!(
            address.wrapping_sub(self.start) < self.size,
            "address 0x{:x} outside marked region",
            address
        );
        (address - self.start) / BLOCK_GRANULARITY
    }

    #[inline]
    fn position(granule: usize) -> (usize, u32) {
        (
            granule / GRANULES_PER_MARK_WORD,
            (granule % GRANULES_PER_MARK_WORD) as u32,
        )
    }

    pub fn clear_mark_bits(&mut self) {
        self.marked.fill(0);
        self.forwarding_valid = false;
    }

    /// Mark the block at `block` spanning `size` bytes as live
    pub fn set_marked_p(&mut self, block: Address, size: Size) {
        let first = self.granule(block);
        let last = first + size / BLOCK_GRANULARITY;
        let mut granule = first;
        while granule < last {
            let (word, bit) = Self::position(granule);
            let run = (GRANULES_PER_MARK_WORD - bit as usize).min(last - granule);
            let mask = if run == GRANULES_PER_MARK_WORD {
                u64::MAX
            } else {
                ((1u64 << run) - 1) << bit
            };
            self.marked[word] |= mask;
            granule += run;
        }
        self.forwarding_valid = false;
    }

    /// Whether the block starting at `block` was found live
    #[inline]
    pub fn marked_p(&self, block: Address) -> bool {
        let (word, bit) = Self::position(self.granule(block));
        self.marked[word] & (1u64 << bit) != 0
    }

    /// Number of live bytes recorded in the bitmap
    pub fn marked_bytes(&self) -> Size {
        self.marked
            .iter()
            .map(|word| word.count_ones() as usize)
            .sum::<usize>()
            * BLOCK_GRANULARITY
    }

    /// Compute the forwarding table from the current marks
    ///
    /// Must run after the trace and before compaction.
    pub fn compute_forwarding(&mut self) {
        let mut accum = 0usize;
        for (forward, word) in self.forwarding.iter_mut().zip(&self.marked) {
            *forward = accum;
            accum += word.count_ones() as usize;
        }
        self.forwarding_valid = true;
    }

    #[inline]
    pub fn forwarding_computed(&self) -> bool {
        self.forwarding_valid
    }

    /// Address the live block at `original` moves to during compaction
    pub fn forward_block(&self, original: Address) -> Address {
        debug_assert!(self.forwarding_valid, "forwarding table is stale");
        let (word, bit) = Self::position(self.granule(original));
        let mask = (1u64 << bit) - 1;
        let live_before = self.forwarding[word] + (self.marked[word] & mask).count_ones() as usize;
        self.start + live_before * BLOCK_GRANULARITY
    }

    /// First marked granule address at or after `address`, if any
    pub fn next_marked_block_after(&self, address: Address) -> Option<Address> {
        self.scan_from(address, true)
    }

    /// First unmarked granule address at or after `address`, if any
    pub fn next_unmarked_block_after(&self, address: Address) -> Option<Address> {
        self.scan_from(address, false)
    }

    fn scan_from(&self, address: Address, want_marked: bool) -> Option<Address> {
        let granules = self.size / BLOCK_GRANULARITY;
        let mut granule = address.checked_sub(self.start)? / BLOCK_GRANULARITY;
        while granule < granules {
            let (word, bit) = Self::position(granule);
            let word_bits = if want_marked {
                self.marked[word]
            } else {
                !self.marked[word]
            };
            let bits = word_bits >> bit;
            if bits != 0 {
                let found = granule + bits.trailing_zeros() as usize;
                return (found < granules).then(|| self.start + found * BLOCK_GRANULARITY);
            }
            granule += GRANULES_PER_MARK_WORD - bit as usize;
        }
        None
    }
}
