/*!
 * Core Types
 * Common types used across the heap
 */

/// Address type for heap operations
///
/// Addresses are virtual: they live in `[start, end)` of the region they
/// belong to and are translated to arena offsets by the storage layer.
pub type Address = usize;

/// Size type for heap operations
pub type Size = usize;

/// Machine word used for space accounting
pub type Cell = usize;

/// Round `value` up to the next multiple of `alignment` (a power of two)
#[inline]
pub const fn align(value: Size, alignment: Size) -> Size {
    (value + alignment - 1) & !(alignment - 1)
}

/// Checked variant of [`align`]; `None` when rounding overflows
#[inline]
pub const fn checked_align(value: Size, alignment: Size) -> Option<Size> {
    match value.checked_add(alignment - 1) {
        Some(padded) => Some(padded & !(alignment - 1)),
        None => None,
    }
}

/// Whether `value` is a multiple of `alignment` (a power of two)
#[inline]
pub const fn is_aligned(value: Size, alignment: Size) -> bool {
    value & (alignment - 1) == 0
}
