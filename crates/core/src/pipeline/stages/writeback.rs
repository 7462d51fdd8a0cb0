//! WB stage: commit results to the register file.

use crate::common::reg::RegisterFile;
use crate::pipeline::latches::{Instruction, Status};

/// Runs the writeback-stage semantics on the MEM latch.
///
/// Commits `rd` only for NORMAL latches; SQUASHED and BUBBLE latches must
/// not have architectural effect, and `x0` never changes.
pub fn writeback(mem_latch: &Instruction, regs: &mut RegisterFile) -> Instruction {
    let inst = mem_latch.clone();
    if inst.status == Status::Normal && inst.writes_rd && inst.rd != 0 {
        let value = if inst.reads_mem {
            inst.mem_result
        } else {
            inst.alu_result
        };
        regs.write(inst.rd, value);
    }
    inst
}
