/*!
 * Configuration Tests
 */

use heap_space::{FreeListAllocator, HeapConfig, HeapError};
use pretty_assertions::assert_eq;
use serial_test::serial;

#[test]
fn test_json_config_builds_allocator() {
    let config = HeapConfig::from_json(r#"{"size": 4096, "start": 65536, "occupied": 512}"#).unwrap();
    let heap = FreeListAllocator::with_config(&config).unwrap();

    assert_eq!(heap.start(), 0x10000);
    assert_eq!(heap.end(), 0x10000 + 4096);
    assert_eq!(heap.occupied_space(), 512);
    assert_eq!(heap.first_allocated_block(), Some(0x10000));
}

#[test]
fn test_invalid_geometry_is_rejected() {
    assert!(matches!(
        FreeListAllocator::with_config(&HeapConfig::new(0)),
        Err(HeapError::InvalidConfig(_))
    ));
    assert!(matches!(
        FreeListAllocator::with_config(&HeapConfig::new(256).with_occupied(512)),
        Err(HeapError::InvalidConfig(_))
    ));
    assert_eq!(
        FreeListAllocator::with_config(&HeapConfig::new(256).with_start(8)).err(),
        Some(HeapError::Misaligned {
            value: 8,
            alignment: 16
        })
    );
}

#[test]
#[serial]
fn test_env_config_builds_allocator() {
    std::env::set_var("HEAP_SIZE", "0x800");
    std::env::set_var("HEAP_START", "4096");
    std::env::remove_var("HEAP_OCCUPIED");

    let config = HeapConfig::from_env();

    std::env::remove_var("HEAP_SIZE");
    std::env::remove_var("HEAP_START");

    let heap = FreeListAllocator::with_config(&config.unwrap()).unwrap();
    assert_eq!(heap.size(), 2048);
    assert_eq!(heap.start(), 4096);
    assert_eq!(heap.free_space(), 2048);
}
