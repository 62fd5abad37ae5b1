/*!
 * Heap Limits and Constants
 *
 * Centralized location for heap-wide limits, thresholds, and magic numbers.
 *
 * ## Design Philosophy
 * - Values are grouped by domain (block layout, free list, region, pressure)
 * - Performance-critical constants are marked with [PERF]
 * - Layout-critical constants are marked with [LAYOUT]
 */

use super::types::{Address, Size};

// =============================================================================
// BLOCK LAYOUT
// =============================================================================

/// Allocation granularity (16 bytes)
/// Every block size is a multiple of this, and so is every block address
/// relative to the region start.
/// [LAYOUT] Leaves the low header bits free for the block tag
pub const BLOCK_GRANULARITY: Size = 16;

/// Size of the in-place block header (one little-endian u64 word)
/// [LAYOUT]
pub const BLOCK_HEADER_SIZE: Size = 8;

/// Smallest block the allocator hands out
pub const MIN_BLOCK_SIZE: Size = BLOCK_GRANULARITY;

/// Header bit marking a block as free
/// [LAYOUT]
pub const FREE_TAG: u64 = 1;

/// Mask selecting the size bits of a header word
/// [LAYOUT]
pub const SIZE_MASK: u64 = !((BLOCK_GRANULARITY as u64) - 1);

// =============================================================================
// FREE LIST
// =============================================================================

/// Small block threshold for the segregated free list (1KB)
/// Blocks below this size get an exact-size bucket per granule multiple
/// [PERF] O(1) lookup for the most common object sizes
pub const SMALL_BLOCK_MAX: Size = 1024;

/// Number of exact-size small buckets
pub const SMALL_BUCKET_COUNT: usize = SMALL_BLOCK_MAX / BLOCK_GRANULARITY;

// =============================================================================
// MARK BITS
// =============================================================================

/// Granules tracked per mark-bit word
pub const GRANULES_PER_MARK_WORD: usize = 64;

// =============================================================================
// REGION DEFAULTS
// =============================================================================

/// Default region size (16MB)
/// Used when no explicit configuration is supplied
pub const DEFAULT_HEAP_SIZE: Size = 16 * 1024 * 1024;

/// Default region start address
pub const DEFAULT_HEAP_START: Address = 0;

// =============================================================================
// PRESSURE THRESHOLDS
// =============================================================================

/// Occupancy ratio reported as medium pressure
pub const MEDIUM_PRESSURE_RATIO: f64 = 0.60;

/// Occupancy ratio reported as high pressure
pub const HIGH_PRESSURE_RATIO: f64 = 0.80;

/// Occupancy ratio reported as critical pressure
pub const CRITICAL_PRESSURE_RATIO: f64 = 0.95;
