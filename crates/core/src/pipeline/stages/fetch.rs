//! IF stage: read one instruction word.

use crate::mem::MemoryStore;
use crate::pipeline::latches::Instruction;

/// Fetches the word at `pc`. Classification waits for decode; the returned
/// latch carries only the raw encoding and its addresses.
pub fn fetch(pc: u32, mem: &MemoryStore) -> Instruction {
    Instruction::fetched(mem.read_u32(pc), pc)
}
