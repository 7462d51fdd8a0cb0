//! Exception and run-status definitions.
//!
//! This module defines the error surface of the simulator core:
//! 1. **Precise exceptions** raised by the pipeline (out-of-range memory
//!    access, illegal instruction).
//! 2. **Run status** returned by `run_cycles` and `run_till_halt`.
//! 3. **Configuration errors** from validating cache geometry.

use std::fmt;

/// A precise architectural exception.
///
/// Both kinds squash the raising instruction and everything younger,
/// redirect the PC to the handler address, and surface as
/// [`RunStatus::Error`] at the end of the cycle. Older instructions commit
/// normally before the squash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exception {
    /// A memory-stage access targeted an address at or beyond the end of
    /// the backing store. Carries the faulting address and the PC of the
    /// raising instruction.
    MemoryOutOfRange { addr: u32, pc: u32 },

    /// A decode-stage instruction had no legal encoding. Carries the raw
    /// instruction word and its fetch address.
    IllegalInstruction { raw: u32, pc: u32 },
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exception::MemoryOutOfRange { addr, pc } => {
                write!(f, "MemoryOutOfRange(addr={:#x}, pc={:#x})", addr, pc)
            }
            Exception::IllegalInstruction { raw, pc } => {
                write!(f, "IllegalInstruction(raw={:#010x}, pc={:#x})", raw, pc)
            }
        }
    }
}

impl std::error::Error for Exception {}

/// Outcome of `run_cycles` / `run_till_halt`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// The requested number of cycles completed.
    Success,
    /// The halt instruction reached writeback.
    Halt,
    /// A precise exception redirected the pipeline to the handler.
    Error(Exception),
}

impl RunStatus {
    /// True for [`RunStatus::Halt`].
    pub fn is_halt(&self) -> bool {
        matches!(self, RunStatus::Halt)
    }
}

/// A rejected cache or memory configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A geometry field that must be a positive power of two is not.
    NotPowerOfTwo { field: &'static str, value: u64 },
    /// The derived set count (`size / block / ways`) is zero.
    NoSets { cache: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotPowerOfTwo { field, value } => {
                write!(f, "{} must be a positive power of two, got {}", field, value)
            }
            ConfigError::NoSets { cache } => {
                write!(f, "{} geometry yields zero sets", cache)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
