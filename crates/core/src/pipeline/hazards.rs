//! Data Hazard Detection and Operand Forwarding.
//!
//! This module implements the logic that keeps the pipeline consistent when
//! instructions depend on results that have not reached the register file:
//! 1. **Hazard Detection:** classifies the stall (if any) required between
//!    the instruction in decode and the one in execute.
//! 2. **Operand Forwarding:** patches decode-stage operand values from the
//!    EX and MEM latch snapshots, newest producer first.
//! 3. **Store-Data Forwarding:** patches a store's datum from a load that
//!    is retiring, which is why a load feeding only a store's data port
//!    never stalls.
//!
//! All functions work on start-of-cycle latch snapshots; nothing here
//! mutates controller state.

use crate::pipeline::latches::{Instruction, Status};

/// Stall classes, in priority order. The first that fires wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hazard {
    /// Branch in decode needs a load result still in execute. Two stall
    /// cycles; counted once in the load-stall statistic.
    LoadBranch,
    /// Consumer in decode needs a load result still in execute. One stall
    /// cycle; counted.
    LoadUse,
    /// Branch in decode needs an ALU result still in execute. One stall
    /// cycle; not load-related, so not counted.
    ArithBranch,
}

/// Decides whether the instruction in decode must stall against the one in
/// execute.
pub fn detect(id: &Instruction, ex: &Instruction) -> Option<Hazard> {
    if id.status != Status::Normal || id.is_nop {
        return None;
    }

    let ex_writes = ex.status == Status::Normal && ex.writes_rd && ex.rd != 0;
    let ex_is_load = ex.reads_mem && ex_writes;
    let ex_is_arith = ex.does_arith && ex_writes;

    let id_is_branch = id.is_control();
    let id_is_store = id.writes_mem && !id.reads_mem;

    let haz1 = id.reads_rs1 && id.rs1 == ex.rd;
    let haz2 = id.reads_rs2 && id.rs2 == ex.rd;

    if ex_is_load && id_is_branch && (haz1 || haz2) {
        return Some(Hazard::LoadBranch);
    }
    if ex_is_load && !id_is_branch && (haz1 || (haz2 && !id_is_store)) {
        return Some(Hazard::LoadUse);
    }
    if ex_is_arith && id_is_branch && (haz1 || haz2) {
        return Some(Hazard::ArithBranch);
    }
    None
}

/// Value a producer latch supplies for register `rs`, if it has one.
///
/// Priority is encoded at the call site: the EX snapshot (newest) is
/// consulted before the MEM snapshot. A load's result is forwardable only
/// from MEM, where it exists.
fn forward_from(producer: &Instruction, rs: usize, allow_load: bool) -> Option<u32> {
    if producer.status != Status::Normal || !producer.writes_rd || producer.rd != rs {
        return None;
    }
    if allow_load && producer.reads_mem {
        return Some(producer.mem_result);
    }
    if producer.does_arith && !producer.reads_mem {
        return Some(producer.alu_result);
    }
    None
}

/// Patches the decode-stage operand values from the EX and MEM snapshots.
///
/// Runs every cycle the instruction sits in decode, including stall cycles:
/// a value captured from a stale producer is overwritten when the true
/// producer reaches a forwardable stage.
pub fn forward_operands(id: &mut Instruction, ex: &Instruction, mem: &Instruction) {
    if id.status != Status::Normal {
        return;
    }

    let (rs1, rs2) = (id.rs1, id.rs2);
    if id.reads_rs1 && rs1 != 0 {
        if let Some(val) = forward_from(ex, rs1, false).or_else(|| forward_from(mem, rs1, true)) {
            id.op1_val = val;
        }
    }
    if id.reads_rs2 && rs2 != 0 {
        if let Some(val) = forward_from(ex, rs2, false).or_else(|| forward_from(mem, rs2, true)) {
            id.op2_val = val;
        }
    }
}

/// Patches a store's datum from a retiring load.
///
/// `ex` is the store about to run its memory stage; `mem` and `wb` are the
/// MEM and WB latch snapshots. The MEM snapshot is the newer source (the
/// load retiring this very cycle); the WB snapshot covers a load that
/// retired one cycle earlier behind a stall.
pub fn forward_store_data(ex: &mut Instruction, mem: &Instruction, wb: &Instruction) {
    if ex.status != Status::Normal || !ex.writes_mem || !ex.reads_rs2 || ex.rs2 == 0 {
        return;
    }
    for producer in [mem, wb] {
        if producer.status == Status::Normal
            && producer.reads_mem
            && producer.writes_rd
            && producer.rd == ex.rs2
        {
            ex.op2_val = producer.mem_result;
            return;
        }
    }
}
