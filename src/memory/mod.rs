/*!
 * Memory Module
 * Heap-space management, mark bits and compaction
 */

pub mod config;
pub mod gc;
pub mod manager;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use config::HeapConfig;
pub use gc::MarkBits;
pub use manager::{
    standard_sizer, AllocatedBlocks, Blocks, FreeList, FreeListAllocator, HeapCompactor,
    HeapStorage,
};
pub use traits::*;
pub use types::*;
