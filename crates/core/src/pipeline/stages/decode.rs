//! ID stage: classify the fetched word, read operands, and resolve
//! control-flow targets.

use crate::common::reg::RegisterFile;
use crate::common::{HALT_WORD, NOP_WORD};
use crate::isa::{decode as raw_decode, funct3, funct7, opcodes};
use crate::pipeline::latches::{Instruction, Opcode, Status};

/// Decodes the IF latch into a fully classified instruction.
///
/// Sets `opcode`, legality, the read/write activity flags, the initial
/// operand values from the register file, and the sequential `next_pc`.
/// A SPECULATIVE fetch that reaches decode is promoted to NORMAL — by then
/// the control instruction it was fetched under has resolved not-taken.
pub fn decode(if_latch: &Instruction, regs: &RegisterFile) -> Instruction {
    match if_latch.status {
        Status::Idle | Status::Bubble => return Instruction::nop(if_latch.status),
        Status::Squashed => return Instruction::nop(Status::Squashed),
        Status::Normal | Status::Speculative => {}
    }

    let mut inst = if_latch.clone();
    inst.status = Status::Normal;
    inst.next_pc = inst.pc.wrapping_add(4);

    if inst.raw == HALT_WORD {
        inst.opcode = Opcode::Halt;
        inst.is_halt = true;
        inst.is_legal = true;
        return inst;
    }

    let d = raw_decode::decode(inst.raw);
    inst.rs1 = d.rs1;
    inst.rs2 = d.rs2;
    inst.rd = d.rd;
    inst.funct3 = d.funct3;
    inst.funct7 = d.funct7;
    inst.imm = d.imm;
    inst.is_nop = inst.raw == NOP_WORD;

    let legal = classify(&mut inst, d.opcode);
    if !legal {
        // Illegal encodings keep their raw word for the trace but must not
        // read, write, or execute anything.
        inst.is_legal = false;
        inst.reads_rs1 = false;
        inst.reads_rs2 = false;
        inst.writes_rd = false;
        inst.reads_mem = false;
        inst.writes_mem = false;
        inst.does_arith = false;
        return inst;
    }

    inst.is_legal = true;
    if inst.is_nop {
        // The canonical NOP carries no activity.
        inst.reads_rs1 = false;
        inst.writes_rd = false;
        inst.does_arith = false;
        return inst;
    }
    inst.op1_val = regs.read(inst.rs1);
    inst.op2_val = regs.read(inst.rs2);
    inst
}

/// Fills the activity flags for one opcode. Returns false for encodings
/// outside the implemented RV32I subset.
fn classify(inst: &mut Instruction, opcode_bits: u32) -> bool {
    match opcode_bits {
        opcodes::OP_LUI => {
            inst.opcode = Opcode::Lui;
            inst.writes_rd = true;
            inst.does_arith = true;
        }
        opcodes::OP_AUIPC => {
            inst.opcode = Opcode::Auipc;
            inst.writes_rd = true;
            inst.does_arith = true;
        }
        opcodes::OP_JAL => {
            inst.opcode = Opcode::Jal;
            inst.writes_rd = true;
            inst.does_arith = true;
        }
        opcodes::OP_JALR => {
            if inst.funct3 != 0 {
                return false;
            }
            inst.opcode = Opcode::Jalr;
            inst.writes_rd = true;
            inst.does_arith = true;
            inst.reads_rs1 = true;
        }
        opcodes::OP_BRANCH => {
            if !matches!(
                inst.funct3,
                funct3::BEQ | funct3::BNE | funct3::BLT | funct3::BGE | funct3::BLTU | funct3::BGEU
            ) {
                return false;
            }
            inst.opcode = Opcode::Branch;
            inst.reads_rs1 = true;
            inst.reads_rs2 = true;
        }
        opcodes::OP_LOAD => {
            if !matches!(
                inst.funct3,
                funct3::LB | funct3::LH | funct3::LW | funct3::LBU | funct3::LHU
            ) {
                return false;
            }
            inst.opcode = Opcode::Load;
            inst.writes_rd = true;
            inst.reads_mem = true;
            inst.reads_rs1 = true;
        }
        opcodes::OP_STORE => {
            if !matches!(inst.funct3, funct3::SB | funct3::SH | funct3::SW) {
                return false;
            }
            inst.opcode = Opcode::Store;
            inst.writes_mem = true;
            inst.reads_rs1 = true;
            inst.reads_rs2 = true;
        }
        opcodes::OP_IMM => {
            match inst.funct3 {
                funct3::SLL if inst.funct7 != funct7::DEFAULT => return false,
                funct3::SRL_SRA
                    if inst.funct7 != funct7::DEFAULT && inst.funct7 != funct7::SRA =>
                {
                    return false;
                }
                _ => {}
            }
            inst.opcode = Opcode::OpImm;
            inst.writes_rd = true;
            inst.does_arith = true;
            inst.reads_rs1 = true;
        }
        opcodes::OP_REG => {
            let ok = matches!(
                (inst.funct3, inst.funct7),
                (funct3::ADD_SUB, funct7::DEFAULT)
                    | (funct3::ADD_SUB, funct7::SUB)
                    | (funct3::SLL, funct7::DEFAULT)
                    | (funct3::SLT, funct7::DEFAULT)
                    | (funct3::SLTU, funct7::DEFAULT)
                    | (funct3::XOR, funct7::DEFAULT)
                    | (funct3::SRL_SRA, funct7::DEFAULT)
                    | (funct3::SRL_SRA, funct7::SRA)
                    | (funct3::OR, funct7::DEFAULT)
                    | (funct3::AND, funct7::DEFAULT)
            );
            if !ok {
                return false;
            }
            inst.opcode = Opcode::Op;
            inst.writes_rd = true;
            inst.does_arith = true;
            inst.reads_rs1 = true;
            inst.reads_rs2 = true;
        }
        opcodes::OP_SYSTEM => {
            // ECALL/EBREAK decode legal; there is no CSR state in this
            // model, so the class has no architectural effect.
            inst.opcode = Opcode::System;
        }
        _ => return false,
    }
    true
}

/// Recomputes `next_pc` for a control instruction from its (possibly
/// forwarded) operand values. Non-controls come back unchanged.
pub fn resolve_next_pc(id_latch: &Instruction) -> Instruction {
    let mut inst = id_latch.clone();
    if inst.status != Status::Normal {
        return inst;
    }

    let seq = inst.pc.wrapping_add(4);
    inst.next_pc = match inst.opcode {
        Opcode::Jal => inst.pc.wrapping_add(inst.imm as u32),
        Opcode::Jalr => inst.op1_val.wrapping_add(inst.imm as u32) & !1,
        Opcode::Branch => {
            let a = inst.op1_val;
            let b = inst.op2_val;
            let taken = match inst.funct3 {
                funct3::BEQ => a == b,
                funct3::BNE => a != b,
                funct3::BLT => (a as i32) < (b as i32),
                funct3::BGE => (a as i32) >= (b as i32),
                funct3::BLTU => a < b,
                funct3::BGEU => a >= b,
                _ => false,
            };
            if taken {
                inst.pc.wrapping_add(inst.imm as u32)
            } else {
                seq
            }
        }
        _ => inst.next_pc,
    };
    inst
}
