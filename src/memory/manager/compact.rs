/*!
 * Compaction
 * Generic block traversal and sliding relocation of live blocks
 */

use super::storage::HeapStorage;
use super::FreeListAllocator;
use crate::core::types::{Address, Size};
use crate::memory::gc::MarkBits;
use crate::monitoring::span_collection;
use log::info;
use std::borrow::Borrow;

/// Size of a block as recorded in its header
pub fn standard_sizer(heap: &HeapStorage, block: Address) -> Size {
    heap.read_header(block).size()
}

/// Visitor that assigns each marked block the next slot of a dense prefix
///
/// For every marked block it calls `iter(heap, forwarding, old, new, size)`
/// and advances the destination cursor by `size`. Unmarked blocks are
/// skipped, which drops them from the compacted layout.
pub struct HeapCompactor<'a, F> {
    state: &'a MarkBits,
    address: Address,
    iter: F,
    live_blocks: usize,
}

impl<'a, F> HeapCompactor<'a, F>
where
    F: FnMut(&mut HeapStorage, &MarkBits, Address, Address, Size),
{
    pub fn new(state: &'a MarkBits, address: Address, iter: F) -> Self {
        Self {
            state,
            address,
            iter,
            live_blocks: 0,
        }
    }

    /// Destination cursor: where the next live block will land
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn live_blocks(&self) -> usize {
        self.live_blocks
    }

    pub fn visit(&mut self, heap: &mut HeapStorage, block: Address, size: Size) {
        if self.state.marked_p(block) {
            (self.iter)(heap, self.state, block, self.address, size);
            self.address += size;
            self.live_blocks += 1;
        }
    }
}

/// Walk `[start, end)` block by block, handing each allocated block to `visitor`
///
/// The size is read with `sizer` before the visitor runs, so a visitor
/// holding `&mut HeapStorage` may move or overwrite the block it is given
/// without losing the position of the next one.
fn walk_allocated_blocks<H, S, V>(
    heap: &mut H,
    start: Address,
    end: Address,
    mut sizer: S,
    mut visitor: V,
) where
    H: Borrow<HeapStorage>,
    S: FnMut(&HeapStorage, Address) -> Size,
    V: FnMut(&mut H, Address, Size),
{
    let mut scan = start;
    while scan != end {
        let storage = <H as Borrow<HeapStorage>>::borrow(heap);
        let size = sizer(storage, scan);
        let allocated = !storage.read_header(scan).free_p();
        let next = scan + size;
        if allocated {
            visitor(heap, scan, size);
        }
        scan = next;
    }
}

impl FreeListAllocator {
    /// Visit every allocated block in address order as `(block, size)`
    pub fn iterate<V>(&self, visitor: V)
    where
        V: FnMut(Address, Size),
    {
        self.iterate_with(visitor, standard_sizer);
    }

    /// Visit every allocated block, measuring each one with `sizer`
    ///
    /// The walk advances by the size `sizer` reports, so it must agree with
    /// the block headers for the walk to stay on block boundaries.
    pub fn iterate_with<V, S>(&self, mut visitor: V, sizer: S)
    where
        V: FnMut(Address, Size),
        S: FnMut(&HeapStorage, Address) -> Size,
    {
        let mut heap = &self.heap;
        walk_allocated_blocks(
            &mut heap,
            self.first_block(),
            self.last_block(),
            sizer,
            |_, block, size| visitor(block, size),
        );
    }

    /// Slide every marked block down to a dense prefix of the region
    ///
    /// `iter(heap, forwarding, old, new, size)` runs once per live block in
    /// address order and must move the block's bytes, header included, from
    /// `old` to `new` (see [`HeapStorage::move_block`]) and fix up any
    /// references it holds. The free list is then reset to one free block
    /// covering everything past the compacted data.
    ///
    /// Forwarding addresses must already be computed with
    /// [`MarkBits::compute_forwarding`]. Mark bits describe the old layout
    /// afterwards and should be cleared before the next trace.
    pub fn compact<F, S>(&mut self, iter: F, sizer: S)
    where
        F: FnMut(&mut HeapStorage, &MarkBits, Address, Address, Size),
        S: FnMut(&HeapStorage, Address) -> Size,
    {
        debug_assert!(
            self.state.forwarding_computed(),
            "compaction requires computed forwarding addresses"
        );
        let span = span_collection("compact", self.size);

        let Self {
            heap,
            state,
            free_blocks,
            start,
            end,
            ..
        } = self;
        let (start, end) = (*start, *end);

        let mut compactor = HeapCompactor::new(&*state, start, iter);
        walk_allocated_blocks(&mut *heap, start, end, sizer, |heap, block, size| {
            compactor.visit(heap, block, size)
        });

        let compacted = compactor.address() - start;
        let live_blocks = compactor.live_blocks();
        free_blocks.initial_free_list(heap, start, end, compacted);

        span.record_outcome(live_blocks, compacted, free_blocks.free_space());
        info!(
            "Compaction complete: {} live blocks packed into {} bytes, {} bytes free",
            live_blocks,
            compacted,
            free_blocks.free_space()
        );
    }

    /// Compact, moving block bytes with [`HeapStorage::move_block`]
    ///
    /// Forwarding is recomputed from the current marks first.
    pub fn compact_in_place(&mut self) {
        self.state.compute_forwarding();
        self.compact(
            |heap, _, old, new, size| heap.move_block(old, new, size),
            standard_sizer,
        );
    }
}
