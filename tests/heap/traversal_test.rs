/*!
 * Traversal Tests
 * Walking blocks by header size
 */

use heap_space::{Block, FreeListAllocator, HeapConfig};
use pretty_assertions::assert_eq;

#[test]
fn test_next_block_after_walks_the_region() {
    let mut heap = FreeListAllocator::new(256, 0x2000).unwrap();
    let a = heap.allot(32).unwrap();
    let b = heap.allot(64).unwrap();

    assert_eq!(heap.first_block(), a);
    assert_eq!(heap.next_block_after(a), b);
    let rest = heap.next_block_after(b);
    assert_eq!(rest, 0x2060);
    assert_eq!(heap.next_block_after(rest), heap.last_block());
}

#[test]
fn test_allocated_walk_skips_every_free_run() {
    let mut heap = FreeListAllocator::new(512, 0).unwrap();
    let blocks: Vec<_> = (0..8).map(|_| heap.allot(48).unwrap()).collect();
    heap.free(blocks[0]);
    heap.free(blocks[3]);
    heap.free(blocks[4]);

    let mut walked = Vec::new();
    let mut cursor = heap.first_allocated_block();
    while let Some(block) = cursor {
        walked.push(block);
        cursor = heap.next_allocated_block_after(block);
    }

    let expected = vec![blocks[1], blocks[2], blocks[5], blocks[6], blocks[7]];
    assert_eq!(walked, expected);
    assert_eq!(
        heap.allocated_blocks().map(|(block, _)| block).collect::<Vec<_>>(),
        expected
    );
}

#[test]
fn test_iterate_reports_allocated_blocks_only() {
    let config = HeapConfig::new(512).with_start(0x8000).with_occupied(64);
    let mut heap = FreeListAllocator::with_config(&config).unwrap();
    let a = heap.allot(32).unwrap();
    let b = heap.allot(32).unwrap();
    heap.free(a);

    let mut seen = Vec::new();
    heap.iterate(|block, size| seen.push((block, size)));
    assert_eq!(seen, vec![(0x8000, 64), (b, 32)]);
}

#[test]
fn test_contains_p_bounds() {
    let heap = FreeListAllocator::new(256, 0x1000).unwrap();
    assert!(heap.contains_p(heap.start()));
    assert!(heap.contains_p(heap.end() - 16));
    assert!(!heap.contains_p(heap.end()));
    assert!(!heap.contains_p(heap.start() - 16));
}

#[test]
fn test_blocks_cover_fresh_region() {
    let heap = FreeListAllocator::new(1024, 0).unwrap();
    assert_eq!(
        heap.blocks().collect::<Vec<_>>(),
        vec![(0, Block::Free { size: 1024 })]
    );
}
