/*!
 * Heap Types
 * Block model, errors and statistics for the heap-space manager
 */

use crate::core::limits::{
    BLOCK_HEADER_SIZE, CRITICAL_PRESSURE_RATIO, FREE_TAG, HIGH_PRESSURE_RATIO,
    MEDIUM_PRESSURE_RATIO, SIZE_MASK,
};
use crate::core::types::{Address, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Heap operation result
pub type HeapResult<T> = Result<T, HeapError>;

/// Heap errors
///
/// Allocation failure on the hot path is reported through `Option` by
/// `allot`; this enum covers the fallible edges around it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeapError {
    #[error("Out of memory: requested {requested} bytes, largest free block {largest_free} bytes ({free} bytes free)")]
    OutOfMemory {
        requested: Size,
        largest_free: Size,
        free: Size,
    },

    #[error("Invalid heap address: 0x{0:x}")]
    InvalidAddress(Address),

    #[error("Payload access out of bounds: block 0x{block:x}, offset {offset}, length {len}, capacity {capacity}")]
    OutOfBounds {
        block: Address,
        offset: Size,
        len: Size,
        capacity: Size,
    },

    #[error("Alignment error: value 0x{value:x}, required alignment {alignment}")]
    Misaligned { value: usize, alignment: usize },

    #[error("Invalid heap configuration: {0}")]
    InvalidConfig(String),
}

/// A block header decoded from the arena
///
/// Every address in the region belongs to exactly one block, and each block
/// starts with a header word holding its total span length and a free tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Allocated { size: Size },
    Free { size: Size },
}

impl Block {
    /// Total span length, header included
    #[inline]
    pub fn size(&self) -> Size {
        match *self {
            Block::Allocated { size } | Block::Free { size } => size,
        }
    }

    #[inline]
    pub fn free_p(&self) -> bool {
        matches!(self, Block::Free { .. })
    }

    /// Bytes available to the client after the header
    #[inline]
    pub fn payload_capacity(&self) -> Size {
        self.size().saturating_sub(BLOCK_HEADER_SIZE)
    }

    /// Encode as a header word: size bits plus the free tag
    #[inline]
    pub fn encode(&self) -> u64 {
        match *self {
            Block::Allocated { size } => size as u64 & SIZE_MASK,
            Block::Free { size } => (size as u64 & SIZE_MASK) | FREE_TAG,
        }
    }

    #[inline]
    pub fn decode(word: u64) -> Self {
        let size = (word & SIZE_MASK) as Size;
        if word & FREE_TAG != 0 {
            Block::Free { size }
        } else {
            Block::Allocated { size }
        }
    }
}

/// Heap statistics snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HeapStats {
    pub start: Address,
    pub size: Size,
    pub occupied_space: Size,
    pub free_space: Size,
    pub largest_free_block: Size,
    pub free_block_count: usize,
    pub high_water_mark: Size,
    pub usage_percentage: f64,
}

impl HeapStats {
    pub fn memory_pressure(&self) -> HeapPressure {
        let ratio = self.usage_percentage / 100.0;
        if ratio >= CRITICAL_PRESSURE_RATIO {
            HeapPressure::Critical
        } else if ratio >= HIGH_PRESSURE_RATIO {
            HeapPressure::High
        } else if ratio >= MEDIUM_PRESSURE_RATIO {
            HeapPressure::Medium
        } else {
            HeapPressure::Low
        }
    }

    /// Share of free space not usable by a single allocation (0.0 - 1.0)
    pub fn fragmentation(&self) -> f64 {
        if self.free_space == 0 {
            0.0
        } else {
            1.0 - self.largest_free_block as f64 / self.free_space as f64
        }
    }

    /// Free space consumed since the last full free-list rebuild
    pub fn growth_since_rebuild(&self) -> Size {
        self.high_water_mark.saturating_sub(self.free_space)
    }
}

/// Heap pressure levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeapPressure {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for HeapPressure {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            HeapPressure::Low => write!(f, "LOW"),
            HeapPressure::Medium => write!(f, "MEDIUM"),
            HeapPressure::High => write!(f, "HIGH"),
            HeapPressure::Critical => write!(f, "CRITICAL"),
        }
    }
}
