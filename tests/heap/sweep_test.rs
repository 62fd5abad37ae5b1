/*!
 * Sweep Tests
 * Reclamation and coalescing driven by mark bits
 */

use heap_space::{Block, FreeListAllocator};
use pretty_assertions::assert_eq;

#[test]
fn test_sweep_keeps_non_adjacent_free_blocks_apart() {
    let mut heap = FreeListAllocator::new(256, 0).unwrap();
    let a = heap.allot(32).unwrap();
    let b = heap.allot(64).unwrap();
    heap.free(a);
    heap.mark_block(b);

    heap.sweep();

    assert_eq!(
        heap.blocks().collect::<Vec<_>>(),
        vec![
            (0, Block::Free { size: 32 }),
            (32, Block::Allocated { size: 64 }),
            (96, Block::Free { size: 160 }),
        ]
    );
    assert_eq!(heap.free_block_count(), 2);
    assert_eq!(heap.free_space(), 192);
}

#[test]
fn test_sweep_coalesces_adjacent_freed_blocks() {
    let mut heap = FreeListAllocator::new(256, 0).unwrap();
    let a = heap.allot(32).unwrap();
    let b = heap.allot(32).unwrap();
    let c = heap.allot(32).unwrap();
    heap.free(a);
    heap.free(b);
    assert_eq!(heap.free_block_count(), 3);

    heap.mark_block(c);
    heap.sweep();

    assert_eq!(heap.block_at(a), Block::Free { size: 64 });
    assert_eq!(heap.next_block_after(a), c);
    assert_eq!(heap.free_block_count(), 2);
    assert!(heap.can_allot_p(64));
}

#[test]
fn test_sweep_preserves_marked_payloads() {
    let mut heap = FreeListAllocator::new(1024, 0x4000).unwrap();
    let blocks: Vec<_> = (0..10).map(|_| heap.allot(64).unwrap()).collect();
    for (i, block) in blocks.iter().enumerate() {
        heap.heap_mut().write_payload(*block, 0, &[i as u8; 8]).unwrap();
    }
    let survivors = [blocks[1], blocks[4], blocks[9]];
    for block in survivors {
        heap.mark_block(block);
    }

    let mut visited = Vec::new();
    heap.sweep_with(|block, size| visited.push((block, size)));

    assert_eq!(
        visited,
        survivors.iter().map(|block| (*block, 64)).collect::<Vec<_>>()
    );
    for (i, block) in [(1u8, blocks[1]), (4, blocks[4]), (9, blocks[9])] {
        assert_eq!(heap.heap().read_payload(block, 0, 8).unwrap(), vec![i; 8]);
    }
    assert_eq!(heap.occupied_space(), 3 * 64);
    assert_eq!(heap.high_water_mark(), 1024 - 3 * 64);
}

#[test]
fn test_sweep_on_full_region_of_live_blocks() {
    let mut heap = FreeListAllocator::new(128, 0).unwrap();
    let blocks: Vec<_> = (0..4).map(|_| heap.allot(32).unwrap()).collect();
    for block in &blocks {
        heap.mark_block(*block);
    }

    heap.sweep();

    assert_eq!(heap.free_space(), 0);
    assert_eq!(heap.free_block_count(), 0);
    assert_eq!(heap.allocated_blocks().count(), 4);
}

#[test]
fn test_sweep_then_allot_reuses_reclaimed_space() {
    let mut heap = FreeListAllocator::new(256, 0).unwrap();
    let blocks: Vec<_> = (0..8).map(|_| heap.allot(32).unwrap()).collect();
    heap.mark_block(blocks[7]);
    assert_eq!(heap.allot(16), None);

    heap.sweep();
    heap.clear_marks();

    assert_eq!(heap.largest_free_block(), 224);
    assert_eq!(heap.allot(200), Some(0));
}
