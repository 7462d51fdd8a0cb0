//! EX stage: ALU results, link values, and effective addresses.

use crate::isa::{funct3, funct7};
use crate::pipeline::latches::{Instruction, Opcode, Status};

/// Runs the execute-stage semantics on the ID latch.
///
/// Fills `alu_result` for arithmetic producers (including the link value of
/// jumps and the upper-immediate classes) and `mem_addr` for loads and
/// stores. Branch targets were already resolved in decode.
pub fn execute(id_latch: &Instruction) -> Instruction {
    let mut inst = id_latch.clone();
    if inst.status != Status::Normal || inst.is_nop || !inst.is_legal {
        return inst;
    }

    match inst.opcode {
        Opcode::Op => {
            inst.alu_result = alu(inst.funct3, inst.funct7, inst.op1_val, inst.op2_val);
        }
        Opcode::OpImm => {
            // funct7 is immediate bits for everything except the shifts.
            let f7 = if inst.funct3 == funct3::SRL_SRA {
                inst.funct7
            } else {
                funct7::DEFAULT
            };
            inst.alu_result = alu(inst.funct3, f7, inst.op1_val, inst.imm as u32);
        }
        Opcode::Lui => {
            inst.alu_result = inst.imm as u32;
        }
        Opcode::Auipc => {
            inst.alu_result = inst.pc.wrapping_add(inst.imm as u32);
        }
        Opcode::Jal | Opcode::Jalr => {
            inst.alu_result = inst.pc.wrapping_add(4);
        }
        Opcode::Load | Opcode::Store => {
            inst.mem_addr = inst.op1_val.wrapping_add(inst.imm as u32);
        }
        Opcode::Branch | Opcode::System | Opcode::Halt => {}
    }
    inst
}

/// The integer ALU shared by OP and OP-IMM.
fn alu(f3: u32, f7: u32, a: u32, b: u32) -> u32 {
    match f3 {
        funct3::ADD_SUB => {
            if f7 == funct7::SUB {
                a.wrapping_sub(b)
            } else {
                a.wrapping_add(b)
            }
        }
        funct3::SLL => a << (b & 0x1f),
        funct3::SLT => ((a as i32) < (b as i32)) as u32,
        funct3::SLTU => (a < b) as u32,
        funct3::XOR => a ^ b,
        funct3::SRL_SRA => {
            if f7 == funct7::SRA {
                ((a as i32) >> (b & 0x1f)) as u32
            } else {
                a >> (b & 0x1f)
            }
        }
        funct3::OR => a | b,
        funct3::AND => a & b,
        _ => 0,
    }
}
