//! Cache Model Unit Tests.
//!
//! Verifies the set-associative LRU timing oracle: hit/miss classification,
//! stamp-based victim selection, invalidation, counters, and degenerate
//! geometries.

use rvpipe_core::cache::{Cache, CacheOp};
use rvpipe_core::config::CacheParams;

/// A small deterministic cache.
///
/// 128 bytes, 16-byte blocks, 2 ways:
///   blocks = 8, sets = 4
///   set index = (addr / 16) % 4
///   tag       = addr / 64
fn test_params() -> CacheParams {
    CacheParams {
        size_bytes: 128,
        block_bytes: 16,
        ways: 2,
        miss_latency: 10,
    }
}

// ──────────────────────────────────────────────────────────
// Hit/miss basics
// ──────────────────────────────────────────────────────────

#[test]
fn cold_access_misses() {
    let mut cache = Cache::new(&test_params());
    assert!(!cache.access(0x40, CacheOp::Read), "cold access must miss");
    assert_eq!(cache.misses(), 1);
    assert_eq!(cache.hits(), 0);
}

#[test]
fn warm_access_hits() {
    let mut cache = Cache::new(&test_params());
    cache.access(0x40, CacheOp::Read);
    assert!(cache.access(0x40, CacheOp::Read), "second access must hit");
    assert_eq!(cache.hits(), 1);
    assert_eq!(cache.misses(), 1);
}

#[test]
fn same_block_different_offset_hits() {
    let mut cache = Cache::new(&test_params());
    cache.access(0x40, CacheOp::Read);
    assert!(
        cache.access(0x4c, CacheOp::Read),
        "offset within the 16-byte block must hit"
    );
}

#[test]
fn writes_and_reads_share_placement() {
    // Write-allocate with no dirty state: a write installs the block and a
    // read to it hits.
    let mut cache = Cache::new(&test_params());
    assert!(!cache.access(0x80, CacheOp::Write));
    assert!(cache.access(0x80, CacheOp::Read));
}

// ──────────────────────────────────────────────────────────
// LRU replacement
// ──────────────────────────────────────────────────────────

// Three addresses mapping to set 0 with distinct tags:
//   0x00  -> set 0, tag 0
//   0x40  -> set 0, tag 1
//   0x80  -> set 0, tag 2
const SET0_A: u64 = 0x00;
const SET0_B: u64 = 0x40;
const SET0_C: u64 = 0x80;

#[test]
fn lru_victim_is_least_recent() {
    let mut cache = Cache::new(&test_params());
    cache.access(SET0_A, CacheOp::Read);
    cache.access(SET0_B, CacheOp::Read);

    // Evicts A (oldest stamp).
    assert!(!cache.access(SET0_C, CacheOp::Read));

    assert!(!cache.access(SET0_A, CacheOp::Read), "A was evicted");
    assert!(
        !cache.access(SET0_B, CacheOp::Read),
        "B became LRU once C installed, so the refill of A evicted it"
    );
}

#[test]
fn hit_refreshes_lru_stamp() {
    let mut cache = Cache::new(&test_params());
    cache.access(SET0_A, CacheOp::Read);
    cache.access(SET0_B, CacheOp::Read);

    // Touch A so B becomes the victim.
    cache.access(SET0_A, CacheOp::Read);
    cache.access(SET0_C, CacheOp::Read);

    assert!(cache.access(SET0_A, CacheOp::Read), "A must survive");
    assert!(!cache.access(SET0_B, CacheOp::Read), "B was the victim");
}

#[test]
fn sets_are_independent() {
    let mut cache = Cache::new(&test_params());
    cache.access(0x00, CacheOp::Read); // set 0
    cache.access(0x10, CacheOp::Read); // set 1
    cache.access(0x20, CacheOp::Read); // set 2
    cache.access(0x30, CacheOp::Read); // set 3
    assert!(cache.access(0x00, CacheOp::Read));
    assert!(cache.access(0x10, CacheOp::Read));
    assert!(cache.access(0x20, CacheOp::Read));
    assert!(cache.access(0x30, CacheOp::Read));
}

// ──────────────────────────────────────────────────────────
// Invalidation
// ──────────────────────────────────────────────────────────

#[test]
fn invalidate_then_access_misses_and_counts() {
    let mut cache = Cache::new(&test_params());
    cache.access(0x40, CacheOp::Read);
    let misses_before = cache.misses();

    cache.invalidate(0x40);
    assert!(
        !cache.access(0x40, CacheOp::Read),
        "invalidated block must miss"
    );
    assert_eq!(cache.misses(), misses_before + 1);
}

#[test]
fn invalidate_absent_block_is_harmless() {
    let mut cache = Cache::new(&test_params());
    cache.access(SET0_A, CacheOp::Read);
    cache.invalidate(SET0_B);
    assert!(cache.access(SET0_A, CacheOp::Read), "A must be untouched");
}

#[test]
fn invalidated_way_is_refilled_first() {
    let mut cache = Cache::new(&test_params());
    cache.access(SET0_A, CacheOp::Read);
    cache.access(SET0_B, CacheOp::Read);
    cache.invalidate(SET0_A);

    // C lands in the invalid way; B survives.
    cache.access(SET0_C, CacheOp::Read);
    assert!(cache.access(SET0_B, CacheOp::Read), "B must survive");
    assert!(cache.access(SET0_C, CacheOp::Read));
}

// ──────────────────────────────────────────────────────────
// Degenerate and boundary geometries
// ──────────────────────────────────────────────────────────

#[test]
fn zero_ways_always_misses() {
    let mut cache = Cache::new(&CacheParams {
        size_bytes: 128,
        block_bytes: 16,
        ways: 0,
        miss_latency: 5,
    });
    assert!(!cache.access(0x40, CacheOp::Read));
    assert!(!cache.access(0x40, CacheOp::Read));
    assert_eq!(cache.misses(), 2);
    cache.invalidate(0x40);
}

#[test]
fn undersized_cache_always_misses() {
    // 16 bytes with 16-byte blocks and 2 ways: zero sets.
    let mut cache = Cache::new(&CacheParams {
        size_bytes: 16,
        block_bytes: 16,
        ways: 2,
        miss_latency: 5,
    });
    assert!(!cache.access(0, CacheOp::Read));
    assert!(!cache.access(0, CacheOp::Read));
}

#[test]
fn block_size_one_has_no_offset_bits() {
    let mut cache = Cache::new(&CacheParams {
        size_bytes: 8,
        block_bytes: 1,
        ways: 2,
        miss_latency: 1,
    });
    cache.access(0, CacheOp::Read);
    assert!(
        !cache.access(1, CacheOp::Read),
        "adjacent bytes are distinct blocks when block_bytes == 1"
    );
    assert!(cache.access(0, CacheOp::Read));
}

#[test]
fn single_set_uses_only_tags() {
    // 32 bytes, 16-byte blocks, 2 ways: one set, zero index bits.
    let mut cache = Cache::new(&CacheParams {
        size_bytes: 32,
        block_bytes: 16,
        ways: 2,
        miss_latency: 1,
    });
    cache.access(0x000, CacheOp::Read);
    cache.access(0x100, CacheOp::Read);
    assert!(cache.access(0x000, CacheOp::Read));
    assert!(cache.access(0x100, CacheOp::Read));
    // Third tag evicts the older of the two.
    assert!(!cache.access(0x200, CacheOp::Read));
    assert!(!cache.access(0x000, CacheOp::Read));
}

#[test]
fn miss_latency_is_reported() {
    let cache = Cache::new(&test_params());
    assert_eq!(cache.miss_latency(), 10);
}
