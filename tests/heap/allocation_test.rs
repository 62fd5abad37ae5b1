/*!
 * Allocation Tests
 * allot, free and space accounting through the public API
 */

use heap_space::{Allocator, Block, FreeListAllocator, HeapError, HeapInfo, HeapPressure};
use pretty_assertions::assert_eq;

#[test]
fn test_two_allocations_from_fresh_region() {
    let mut heap = FreeListAllocator::new(256, 0).unwrap();

    let a = heap.allot(32).unwrap();
    let b = heap.allot(64).unwrap();

    assert_eq!(a, 0);
    assert_eq!(b, 32);
    assert_eq!(heap.free_space(), 160);
    assert_eq!(heap.occupied_space(), 96);
}

#[test]
fn test_allot_decreases_free_space_by_rounded_size() {
    let mut heap = FreeListAllocator::new(4096, 0x10000).unwrap();

    for request in [1, 15, 16, 17, 100, 1000, 1500] {
        let before = heap.free_space();
        let block = heap.allot(request).unwrap();
        let size = heap.block_at(block).size();

        assert!(size >= request.max(16));
        assert_eq!(size % 16, 0);
        assert_eq!(before - heap.free_space(), size);
    }
}

#[test]
fn test_can_allot_p_ignores_scattered_free_space() {
    let mut heap = FreeListAllocator::new(256, 0).unwrap();
    let blocks: Vec<_> = (0..8).map(|_| heap.allot(32).unwrap()).collect();
    for block in blocks.iter().step_by(2) {
        heap.free(*block);
    }

    // 128 bytes free in total, but no single block above 32
    assert_eq!(heap.free_space(), 128);
    assert_eq!(heap.largest_free_block(), 32);
    assert!(heap.can_allot_p(32));
    assert!(!heap.can_allot_p(64));
    assert_eq!(heap.allot(64), None);
}

#[test]
fn test_full_region_cannot_allot_anything() {
    let mut heap = FreeListAllocator::new(64, 0).unwrap();
    heap.allot(64).unwrap();

    assert_eq!(heap.free_block_count(), 0);
    assert!(!heap.can_allot_p(0));
    assert!(!heap.can_allot_p(16));
    assert_eq!(heap.allot(0), None);
}

#[test]
fn test_large_blocks_are_found_and_split() {
    let mut heap = FreeListAllocator::new(64 * 1024, 0).unwrap();
    let big = heap.allot(8 * 1024).unwrap();
    let _fence = heap.allot(16).unwrap();
    heap.free(big);

    // Served from the freed 8 KiB block, the rest stays free
    let small = heap.allot(2048).unwrap();
    assert!(small == big || small == big + 8 * 1024 - 2048);
    assert_eq!(heap.free_space(), 64 * 1024 - 16 - 2048);
}

#[test]
fn test_try_allot_through_trait() {
    fn fill<A: Allocator>(allocator: &mut A, size: usize) -> Result<Vec<usize>, HeapError> {
        let mut blocks = Vec::new();
        loop {
            match allocator.try_allot(size) {
                Ok(block) => blocks.push(block),
                Err(HeapError::OutOfMemory { .. }) if !blocks.is_empty() => return Ok(blocks),
                Err(e) => return Err(e),
            }
        }
    }

    let mut heap = FreeListAllocator::new(1024, 0).unwrap();
    let blocks = fill(&mut heap, 100).unwrap();
    assert_eq!(blocks.len(), 1024 / 112);
    assert!(!Allocator::can_allot_p(&heap, 112));
}

#[test]
fn test_stats_and_pressure() {
    let mut heap = FreeListAllocator::new(1024, 0).unwrap();
    assert_eq!(heap.pressure(), HeapPressure::Low);

    heap.allot(1024 - 32).unwrap();
    let stats = heap.stats();
    assert_eq!(stats.free_space, 32);
    assert_eq!(stats.free_block_count, 1);
    assert_eq!(stats.high_water_mark, 1024);
    assert_eq!(stats.growth_since_rebuild(), 992);
    assert_eq!(stats.memory_pressure(), HeapPressure::Critical);
    assert_eq!(stats.fragmentation(), 0.0);
}

#[test]
fn test_payload_survives_neighbour_churn() {
    let mut heap = FreeListAllocator::new(1024, 0).unwrap();
    let keep = heap.allot(64).unwrap();
    heap.heap_mut().write_payload(keep, 0, b"persistent").unwrap();

    for _ in 0..20 {
        let scratch = heap.allot(48).unwrap();
        heap.heap_mut().write_payload(scratch, 0, &[0xAA; 40]).unwrap();
        heap.free(scratch);
    }

    assert_eq!(heap.block_at(keep), Block::Allocated { size: 64 });
    assert_eq!(heap.heap().read_payload(keep, 0, 10).unwrap(), b"persistent");
}

#[test]
fn test_payload_bounds_are_enforced() {
    let mut heap = FreeListAllocator::new(256, 0).unwrap();
    let block = heap.allot(32).unwrap();

    assert!(matches!(
        heap.heap_mut().write_payload(block, 20, &[0; 8]),
        Err(HeapError::OutOfBounds { .. })
    ));
    assert!(heap.heap_mut().write_payload(block, 16, &[0; 8]).is_ok());
}
