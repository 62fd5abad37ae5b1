/*!
 * Garbage Collection Support
 * Liveness and forwarding side tables consumed by sweep and compaction
 */

pub mod mark_bits;

pub use mark_bits::MarkBits;
