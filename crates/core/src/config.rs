//! Simulator configuration.
//!
//! This module defines the configuration structures for the simulator core:
//! 1. **Defaults:** baseline cache geometry and memory size constants.
//! 2. **Structures:** per-cache parameters and the top-level `SimConfig`.
//! 3. **Validation:** power-of-two checks over cache geometry.
//!
//! Configuration is supplied as JSON (see the CLI's `--config`) or built
//! with `SimConfig::default()`.

use serde::Deserialize;

use crate::common::error::ConfigError;

/// Default configuration constants.
mod defaults {
    /// Default cache size in bytes (1 KiB).
    pub const CACHE_SIZE: usize = 1024;

    /// Default cache block size in bytes.
    pub const CACHE_BLOCK: usize = 16;

    /// Default cache associativity (2-way).
    pub const CACHE_WAYS: usize = 2;

    /// Default miss latency in freeze cycles.
    pub const MISS_LATENCY: u64 = 10;

    /// Default backing-store size (1 MiB). Loads and stores at or beyond
    /// this bound raise the memory exception.
    pub const MEMORY_BYTES: usize = 1 << 20;
}

/// Geometry and timing of one cache.
///
/// `size_bytes`, `block_bytes`, and the derived set count must be positive
/// powers of two (`block_bytes` may be 1); `validate` enforces this.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CacheParams {
    /// Total cache capacity in bytes.
    #[serde(default = "CacheParams::default_size")]
    pub size_bytes: usize,

    /// Block (line) size in bytes.
    #[serde(default = "CacheParams::default_block")]
    pub block_bytes: usize,

    /// Associativity (ways per set).
    #[serde(default = "CacheParams::default_ways")]
    pub ways: usize,

    /// Freeze cycles charged for a miss.
    #[serde(default = "CacheParams::default_miss_latency")]
    pub miss_latency: u64,
}

impl CacheParams {
    fn default_size() -> usize {
        defaults::CACHE_SIZE
    }

    fn default_block() -> usize {
        defaults::CACHE_BLOCK
    }

    fn default_ways() -> usize {
        defaults::CACHE_WAYS
    }

    fn default_miss_latency() -> u64 {
        defaults::MISS_LATENCY
    }

    /// Checks the power-of-two requirements on the geometry.
    pub fn validate(&self, cache: &'static str) -> Result<(), ConfigError> {
        let pow2 = |field: &'static str, value: usize| -> Result<(), ConfigError> {
            if value == 0 || !value.is_power_of_two() {
                return Err(ConfigError::NotPowerOfTwo {
                    field,
                    value: value as u64,
                });
            }
            Ok(())
        };
        pow2("size_bytes", self.size_bytes)?;
        pow2("block_bytes", self.block_bytes)?;
        pow2("ways", self.ways)?;
        let sets = self.size_bytes / self.block_bytes / self.ways;
        if sets == 0 {
            return Err(ConfigError::NoSets { cache });
        }
        pow2("derived set count", sets)?;
        Ok(())
    }
}

impl Default for CacheParams {
    fn default() -> Self {
        Self {
            size_bytes: defaults::CACHE_SIZE,
            block_bytes: defaults::CACHE_BLOCK,
            ways: defaults::CACHE_WAYS,
            miss_latency: defaults::MISS_LATENCY,
        }
    }
}

/// Top-level simulator configuration.
///
/// # Examples
///
/// ```
/// use rvpipe_core::config::SimConfig;
///
/// let json = r#"{
///     "icache": { "size_bytes": 2048, "block_bytes": 16, "ways": 2, "miss_latency": 8 },
///     "dcache": { "size_bytes": 1024, "block_bytes": 16, "ways": 1, "miss_latency": 12 },
///     "memory_bytes": 1048576
/// }"#;
///
/// let config: SimConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.icache.size_bytes, 2048);
/// assert_eq!(config.dcache.miss_latency, 12);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    /// Instruction-cache parameters.
    #[serde(default)]
    pub icache: CacheParams,

    /// Data-cache parameters.
    #[serde(default)]
    pub dcache: CacheParams,

    /// Size of the backing memory store in bytes.
    #[serde(default = "SimConfig::default_memory")]
    pub memory_bytes: usize,
}

impl SimConfig {
    fn default_memory() -> usize {
        defaults::MEMORY_BYTES
    }

    /// Validates both cache geometries.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.icache.validate("icache")?;
        self.dcache.validate("dcache")?;
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            icache: CacheParams::default(),
            dcache: CacheParams::default(),
            memory_bytes: defaults::MEMORY_BYTES,
        }
    }
}
