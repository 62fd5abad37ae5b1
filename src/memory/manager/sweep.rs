/*!
 * Sweep
 * Linear reclamation pass driven by mark bits
 */

use super::FreeListAllocator;
use crate::core::types::{Address, Size};
use crate::monitoring::span_collection;
use log::info;

impl FreeListAllocator {
    /// Reclaim every unmarked block and rebuild the free list
    pub fn sweep(&mut self) {
        self.sweep_with(|_, _| {});
    }

    /// Sweep, calling `visitor(block, size)` once per surviving block in
    /// address order
    ///
    /// Every maximal run of free and unmarked blocks becomes a single free
    /// block. Marked blocks keep their address, size and contents.
    pub fn sweep_with<F>(&mut self, mut visitor: F)
    where
        F: FnMut(Address, Size),
    {
        let span = span_collection("sweep", self.size);
        self.free_blocks.clear_free_list();

        // Start of the last block seen that still matters: either an open
        // free run or the most recent live block
        let mut prev: Option<Address> = None;
        let mut scan = self.first_block();
        let end = self.last_block();
        let mut live_blocks = 0usize;
        let mut live_bytes = 0usize;

        while scan != end {
            let header = self.heap.read_header(scan);
            let size = header.size();

            if header.free_p() {
                match self.open_free_run(prev) {
                    Some((run, run_size)) => self.heap.make_free(run, run_size + size),
                    None => prev = Some(scan),
                }
            } else if self.state.marked_p(scan) {
                if let Some((run, run_size)) = self.open_free_run(prev) {
                    self.free_blocks.add_to_free_list(run, run_size);
                }
                prev = Some(scan);
                live_blocks += 1;
                live_bytes += size;
                visitor(scan, size);
            } else {
                match self.open_free_run(prev) {
                    Some((run, run_size)) => self.heap.make_free(run, run_size + size),
                    None => {
                        self.heap.make_free(scan, size);
                        prev = Some(scan);
                    }
                }
            }

            scan += size;
        }

        if let Some((run, run_size)) = self.open_free_run(prev) {
            self.free_blocks.add_to_free_list(run, run_size);
        }

        self.high_water_mark = self.free_blocks.free_space();

        span.record_outcome(live_blocks, live_bytes, self.high_water_mark);
        info!(
            "Sweep complete: {} live blocks ({} bytes), {} bytes free in {} blocks",
            live_blocks,
            live_bytes,
            self.high_water_mark,
            self.free_blocks.free_block_count()
        );
    }

    /// `(address, size)` of `prev` when it is a free run still being extended
    #[inline]
    fn open_free_run(&self, prev: Option<Address>) -> Option<(Address, Size)> {
        let run = prev?;
        let header = self.heap.read_header(run);
        header.free_p().then(|| (run, header.size()))
    }
}
