//! MEM stage: loads and stores against the untimed memory store.

use crate::isa::funct3;
use crate::mem::MemoryStore;
use crate::pipeline::latches::{Instruction, Opcode, Status};

/// Runs the memory-stage semantics on the EX latch.
///
/// Only NORMAL latches touch memory; everything else (including squashed
/// accesses after a memory exception) passes through unchanged. The caller
/// has already bounds-checked `mem_addr`.
pub fn memory(ex_latch: &Instruction, mem: &mut MemoryStore) -> Instruction {
    let mut inst = ex_latch.clone();
    if inst.status != Status::Normal {
        return inst;
    }

    match inst.opcode {
        Opcode::Load => {
            inst.mem_result = match inst.funct3 {
                funct3::LB => mem.read_u8(inst.mem_addr) as i8 as i32 as u32,
                funct3::LH => mem.read_u16(inst.mem_addr) as i16 as i32 as u32,
                funct3::LBU => mem.read_u8(inst.mem_addr) as u32,
                funct3::LHU => mem.read_u16(inst.mem_addr) as u32,
                _ => mem.read_u32(inst.mem_addr),
            };
        }
        Opcode::Store => match inst.funct3 {
            funct3::SB => mem.write_u8(inst.mem_addr, inst.op2_val as u8),
            funct3::SH => mem.write_u16(inst.mem_addr, inst.op2_val as u16),
            _ => mem.write_u32(inst.mem_addr, inst.op2_val),
        },
        _ => {}
    }
    inst
}
