/*!
 * Heap Storage
 * Byte arena backing a region, with in-place block headers
 */

use super::super::types::{Block, HeapError, HeapResult};
use crate::core::limits::BLOCK_HEADER_SIZE;
use crate::core::types::{Address, Size};
use log::trace;

/// Raw storage for one region
///
/// Addresses handed out by the heap are virtual and span `[start, start + len)`.
/// Each block begins with an 8-byte header word; the remaining bytes are the
/// client payload.
#[derive(Debug, Clone)]
pub struct HeapStorage {
    start: Address,
    bytes: Vec<u8>,
}

impl HeapStorage {
    pub fn new(start: Address, size: Size) -> Self {
        Self {
            start,
            bytes: vec![0u8; size],
        }
    }

    #[inline]
    pub fn start(&self) -> Address {
        self.start
    }

    #[inline]
    fn offset(&self, address: Address) -> usize {
        debug_assert!(
            address.wrapping_sub(self.start) < self.bytes.len(),
            "address 0x{:x} outside region",
            address
        );
        address - self.start
    }

    /// Decode the header of the block at `block`
    #[inline]
    pub fn read_header(&self, block: Address) -> Block {
        let offset = self.offset(block);
        let mut word = [0u8; BLOCK_HEADER_SIZE];
        word.copy_from_slice(&self.bytes[offset..offset + BLOCK_HEADER_SIZE]);
        Block::decode(u64::from_le_bytes(word))
    }

    #[inline]
    pub fn write_header(&mut self, block: Address, header: Block) {
        let offset = self.offset(block);
        self.bytes[offset..offset + BLOCK_HEADER_SIZE]
            .copy_from_slice(&header.encode().to_le_bytes());
    }

    /// Rewrite the header at `block` as a free block spanning `size` bytes
    #[inline]
    pub fn make_free(&mut self, block: Address, size: Size) {
        self.write_header(block, Block::Free { size });
    }

    #[inline]
    pub fn make_allocated(&mut self, block: Address, size: Size) {
        self.write_header(block, Block::Allocated { size });
    }

    /// Whether a full header word starting at `block` lies inside the arena
    #[inline]
    fn holds_header(&self, block: Address) -> bool {
        let offset = block.wrapping_sub(self.start);
        offset < self.bytes.len() && self.bytes.len() - offset >= BLOCK_HEADER_SIZE
    }

    fn checked_payload(&self, block: Address, offset: Size, len: Size) -> HeapResult<usize> {
        if !self.holds_header(block) {
            return Err(HeapError::InvalidAddress(block));
        }
        let header = self.read_header(block);
        if header.free_p() {
            return Err(HeapError::InvalidAddress(block));
        }
        let capacity = header.payload_capacity();
        match offset.checked_add(len) {
            Some(end) if end <= capacity => Ok(self.offset(block) + BLOCK_HEADER_SIZE + offset),
            _ => Err(HeapError::OutOfBounds {
                block,
                offset,
                len,
                capacity,
            }),
        }
    }

    /// Payload bytes of an allocated block
    pub fn payload(&self, block: Address) -> HeapResult<&[u8]> {
        let capacity = self.read_checked_capacity(block)?;
        let base = self.checked_payload(block, 0, capacity)?;
        Ok(&self.bytes[base..base + capacity])
    }

    pub fn payload_mut(&mut self, block: Address) -> HeapResult<&mut [u8]> {
        let capacity = self.read_checked_capacity(block)?;
        let base = self.checked_payload(block, 0, capacity)?;
        Ok(&mut self.bytes[base..base + capacity])
    }

    fn read_checked_capacity(&self, block: Address) -> HeapResult<Size> {
        if !self.holds_header(block) {
            return Err(HeapError::InvalidAddress(block));
        }
        Ok(self.read_header(block).payload_capacity())
    }

    /// Write bytes into the payload of an allocated block
    pub fn write_payload(&mut self, block: Address, offset: Size, data: &[u8]) -> HeapResult<()> {
        let base = self.checked_payload(block, offset, data.len())?;
        self.bytes[base..base + data.len()].copy_from_slice(data);

        trace!(
            "Wrote {} bytes to block 0x{:x} at payload offset {}",
            data.len(),
            block,
            offset
        );
        Ok(())
    }

    /// Read bytes from the payload of an allocated block
    pub fn read_payload(&self, block: Address, offset: Size, len: Size) -> HeapResult<Vec<u8>> {
        let base = self.checked_payload(block, offset, len)?;
        Ok(self.bytes[base..base + len].to_vec())
    }

    /// Copy a whole block, header included, from `from` to `to`
    ///
    /// Source and destination may overlap.
    pub fn move_block(&mut self, from: Address, to: Address, size: Size) {
        if from == to {
            return;
        }
        let src = self.offset(from);
        let dst = self.offset(to);
        debug_assert!(src + size <= self.bytes.len() && dst + size <= self.bytes.len());
        self.bytes.copy_within(src..src + size, dst);
        trace!("Moved {} byte block 0x{:x} -> 0x{:x}", size, from, to);
    }
}
