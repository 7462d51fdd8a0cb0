//! Set-Associative LRU Cache Model.
//!
//! The cache is the pipeline's timing oracle: it answers hit or miss for an
//! address and nothing else. No data bytes are stored; only tags, valid
//! bits, and LRU stamps. The cache is write-allocate and keeps no dirty
//! state, so the read/write distinction never changes placement.
//!
//! Replacement uses a monotone stamp counter: every hit or install bumps the
//! counter and timestamps the touched way, and among valid ways the one
//! with the smallest stamp is the victim.

use crate::config::CacheParams;

/// Read/write discriminator for an access. Placement ignores it; it exists
/// so callers state their intent and the trace reads correctly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheOp {
    Read,
    Write,
}

#[derive(Clone, Default)]
struct CacheWay {
    valid: bool,
    tag: u64,
    lru_stamp: u64,
}

/// One cache instance (the controller owns two: I-side and D-side).
pub struct Cache {
    /// Flat way storage, indexed `set * ways + way`.
    entries: Vec<CacheWay>,
    num_sets: usize,
    ways: usize,
    block_bytes: usize,
    clock: u64,
    hits: u64,
    misses: u64,
    miss_latency: u64,
}

impl Cache {
    /// Builds a cache from its configuration. A degenerate geometry (zero
    /// sets or zero ways) leaves the way storage empty; every access then
    /// misses without mutating anything.
    pub fn new(params: &CacheParams) -> Self {
        let num_blocks = if params.block_bytes == 0 {
            0
        } else {
            params.size_bytes / params.block_bytes
        };
        let num_sets = if params.ways == 0 {
            0
        } else {
            num_blocks / params.ways
        };

        Self {
            entries: vec![CacheWay::default(); num_sets * params.ways],
            num_sets,
            ways: params.ways,
            block_bytes: params.block_bytes,
            clock: 0,
            hits: 0,
            misses: 0,
            miss_latency: params.miss_latency,
        }
    }

    /// Splits an address into (set index, tag).
    fn split(&self, addr: u64) -> (usize, u64) {
        let set = ((addr as usize) / self.block_bytes) % self.num_sets;
        let tag = addr / (self.block_bytes * self.num_sets) as u64;
        (set, tag)
    }

    /// Looks up `addr`, updating LRU state and installing the block on a
    /// miss. Returns `true` on hit.
    pub fn access(&mut self, addr: u64, _op: CacheOp) -> bool {
        if self.num_sets == 0 || self.ways == 0 {
            self.misses += 1;
            return false;
        }

        let (set, tag) = self.split(addr);
        let base = set * self.ways;

        for i in 0..self.ways {
            let idx = base + i;
            if self.entries[idx].valid && self.entries[idx].tag == tag {
                self.hits += 1;
                self.clock += 1;
                self.entries[idx].lru_stamp = self.clock;
                return true;
            }
        }

        self.misses += 1;

        // Prefer an invalid way; otherwise evict the smallest stamp.
        let mut victim = 0;
        let mut least = u64::MAX;
        for i in 0..self.ways {
            let idx = base + i;
            if !self.entries[idx].valid {
                victim = i;
                break;
            }
            if self.entries[idx].lru_stamp < least {
                least = self.entries[idx].lru_stamp;
                victim = i;
            }
        }

        self.clock += 1;
        self.entries[base + victim] = CacheWay {
            valid: true,
            tag,
            lru_stamp: self.clock,
        };
        false
    }

    /// Drops the block holding `addr`, if present. The controller uses this
    /// to abandon an in-flight instruction fetch when a taken branch
    /// redirects past it.
    pub fn invalidate(&mut self, addr: u64) {
        if self.num_sets == 0 || self.ways == 0 {
            return;
        }
        let (set, tag) = self.split(addr);
        let base = set * self.ways;
        for i in 0..self.ways {
            let idx = base + i;
            if self.entries[idx].valid && self.entries[idx].tag == tag {
                self.entries[idx].valid = false;
                break;
            }
        }
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Extra freeze cycles the pipeline pays after a miss.
    pub fn miss_latency(&self) -> u64 {
        self.miss_latency
    }
}
