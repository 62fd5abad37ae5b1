/*!
 * Heap Configuration
 * Region geometry for a free-list heap
 */

use super::types::{HeapError, HeapResult};
use crate::core::limits::{BLOCK_GRANULARITY, DEFAULT_HEAP_SIZE, DEFAULT_HEAP_START};
use crate::core::types::{is_aligned, Address, Size};
use serde::{Deserialize, Serialize};

/// Heap configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct HeapConfig {
    /// Region length in bytes
    pub size: Size,
    /// Virtual address of the first byte of the region
    pub start: Address,
    /// Bytes at the start of the region already in use (bootstrap data)
    pub occupied: Size,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_HEAP_SIZE,
            start: DEFAULT_HEAP_START,
            occupied: 0,
        }
    }
}

impl HeapConfig {
    pub const fn new(size: Size) -> Self {
        Self {
            size,
            start: DEFAULT_HEAP_START,
            occupied: 0,
        }
    }

    pub const fn with_start(mut self, start: Address) -> Self {
        self.start = start;
        self
    }

    pub const fn with_occupied(mut self, occupied: Size) -> Self {
        self.occupied = occupied;
        self
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> HeapResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| HeapError::InvalidConfig(format!("malformed heap config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Build from environment variables, falling back to defaults
    ///
    /// Environment variables:
    /// - HEAP_SIZE: region length in bytes
    /// - HEAP_START: region start address
    /// - HEAP_OCCUPIED: bootstrap prefix length
    ///
    /// Values are decimal or `0x`-prefixed hex.
    pub fn from_env() -> HeapResult<Self> {
        let defaults = Self::default();
        let config = Self {
            size: env_value("HEAP_SIZE")?.unwrap_or(defaults.size),
            start: env_value("HEAP_START")?.unwrap_or(defaults.start),
            occupied: env_value("HEAP_OCCUPIED")?.unwrap_or(defaults.occupied),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check region geometry
    pub fn validate(&self) -> HeapResult<()> {
        if self.size == 0 {
            return Err(HeapError::InvalidConfig("heap size must be non-zero".into()));
        }
        for value in [self.size, self.start, self.occupied] {
            if !is_aligned(value, BLOCK_GRANULARITY) {
                return Err(HeapError::Misaligned {
                    value,
                    alignment: BLOCK_GRANULARITY,
                });
            }
        }
        if self.occupied > self.size {
            return Err(HeapError::InvalidConfig(format!(
                "occupied prefix {} exceeds heap size {}",
                self.occupied, self.size
            )));
        }
        if self.start.checked_add(self.size).is_none() {
            return Err(HeapError::InvalidConfig(format!(
                "region 0x{:x}+{} overflows the address space",
                self.start, self.size
            )));
        }
        Ok(())
    }
}

fn env_value(key: &str) -> HeapResult<Option<usize>> {
    match std::env::var(key) {
        Ok(raw) => parse_size(&raw)
            .map(Some)
            .ok_or_else(|| HeapError::InvalidConfig(format!("{} is not a valid size: {:?}", key, raw))),
        Err(_) => Ok(None),
    }
}

fn parse_size(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}
