/*!
 * Heap Space Library
 * Free-list heap management over a contiguous region: allocation, sweep
 * and sliding compaction
 */

pub mod core;
pub mod memory;
pub mod monitoring;

// Re-exports
pub use memory::{
    standard_sizer, Allocator, Block, FreeListAllocator, HeapCompactor, HeapConfig, HeapError,
    HeapInfo, HeapPressure, HeapResult, HeapStats, HeapStorage, MarkBits,
};
pub use monitoring::init_tracing;
