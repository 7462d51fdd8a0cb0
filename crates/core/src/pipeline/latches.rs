//! Pipeline latch value and its classification enums.
//!
//! Every stage latch carries the same `Instruction` value; stages differ in
//! which fields they have filled in, not in type. The controller inspects
//! only the classification flags and the stage outputs listed here — the
//! remaining fields exist for the semantics façade and the trace logger.

use serde::Serialize;

use crate::common::NOP_WORD;

/// Lifecycle state of a latch slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// Slot has never held a real instruction (pipeline fill).
    Idle,
    /// Committed-path instruction.
    Normal,
    /// Fetched under an unresolved control instruction; may be squashed.
    Speculative,
    /// Cancelled by misprediction or exception; must not commit.
    Squashed,
    /// NOP injected to preserve timing.
    Bubble,
}

/// Closed set of instruction classes the controller reasons about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Opcode {
    Load,
    Store,
    Branch,
    Jal,
    Jalr,
    Op,
    OpImm,
    Lui,
    Auipc,
    System,
    Halt,
}

/// One instruction in flight.
#[derive(Clone, Debug)]
pub struct Instruction {
    /// Raw 32-bit encoding.
    pub raw: u32,
    /// Fetch address.
    pub pc: u32,
    /// Architectural next PC (sequential until resolved for controls).
    pub next_pc: u32,
    /// Instruction class.
    pub opcode: Opcode,

    pub rs1: usize,
    pub rs2: usize,
    pub rd: usize,
    pub reads_rs1: bool,
    pub reads_rs2: bool,
    pub writes_rd: bool,
    pub reads_mem: bool,
    pub writes_mem: bool,
    /// True when EX produces a forwardable result in `alu_result`.
    pub does_arith: bool,

    /// First operand, captured at decode and patched by forwarding.
    pub op1_val: u32,
    /// Second operand (store datum for stores).
    pub op2_val: u32,

    /// EX output.
    pub alu_result: u32,
    /// Effective address computed in EX for loads and stores.
    pub mem_addr: u32,
    /// Load result filled in MEM.
    pub mem_result: u32,

    /// Sign-extended immediate.
    pub imm: i32,
    pub funct3: u32,
    pub funct7: u32,

    pub is_nop: bool,
    pub is_halt: bool,
    pub is_legal: bool,
    pub status: Status,
}

impl Instruction {
    /// An architectural NOP in the given lifecycle state.
    pub fn nop(status: Status) -> Self {
        Self {
            raw: NOP_WORD,
            pc: 0,
            next_pc: 0,
            opcode: Opcode::OpImm,
            rs1: 0,
            rs2: 0,
            rd: 0,
            reads_rs1: false,
            reads_rs2: false,
            writes_rd: false,
            reads_mem: false,
            writes_mem: false,
            does_arith: false,
            op1_val: 0,
            op2_val: 0,
            alu_result: 0,
            mem_addr: 0,
            mem_result: 0,
            imm: 0,
            funct3: 0,
            funct7: 0,
            is_nop: true,
            is_halt: false,
            is_legal: true,
            status,
        }
    }

    /// A freshly fetched word, not yet decoded.
    pub fn fetched(raw: u32, pc: u32) -> Self {
        Self {
            raw,
            pc,
            next_pc: pc.wrapping_add(4),
            is_nop: false,
            ..Self::nop(Status::Normal)
        }
    }

    /// True for the control classes that resolve in decode.
    pub fn is_control(&self) -> bool {
        matches!(self.opcode, Opcode::Branch | Opcode::Jal | Opcode::Jalr)
    }

    /// True when the memory stage performs an access for this instruction.
    pub fn touches_mem(&self) -> bool {
        self.reads_mem || self.writes_mem
    }

    /// Copy of this latch with its status replaced.
    pub fn with_status(&self, status: Status) -> Self {
        let mut inst = self.clone();
        inst.status = status;
        inst
    }
}

impl Default for Instruction {
    fn default() -> Self {
        Self::nop(Status::Idle)
    }
}
