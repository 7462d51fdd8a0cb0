//! Pipeline Controller.
//!
//! This module owns the five stage latches and the global cycle state, and
//! advances them one cycle at a time:
//! 1. **Snapshot discipline:** every tick captures the start-of-cycle latch
//!    values; all hazard, forwarding, and advancement decisions are made
//!    against that snapshot and published at the end of the tick.
//! 2. **Hazard sequencing:** load-use, load-branch, and arith-branch stalls,
//!    operand forwarding, and store-data forwarding.
//! 3. **Cache-driven stalls:** D-miss pipeline freezes and I-miss fetch
//!    bubbles, with miss counters that drain in parallel.
//! 4. **Control flow:** always-not-taken prediction with resolution in
//!    decode, squash of the speculative fetch, and redirect.
//! 5. **Precise exceptions:** out-of-range memory accesses and illegal
//!    instructions squash the raising instruction and everything younger,
//!    then redirect to the handler.

pub mod hazards;
pub mod latches;
pub mod record;
pub mod stages;

use log::{debug, trace};

use crate::cache::{Cache, CacheOp};
use crate::common::error::{Exception, RunStatus};
use crate::common::reg::RegisterFile;
use crate::common::{EXCEPTION_HANDLER, WORD_BYTES};
use crate::config::CacheParams;
use crate::mem::MemoryStore;
use crate::pipeline::hazards::Hazard;
use crate::pipeline::latches::{Instruction, Opcode, Status};
use crate::pipeline::record::{PipeState, SnapshotSink};
use crate::stats::SimStats;

/// The simulator core: architectural state, caches, latches, and the
/// per-cycle scheduling logic. Created by [`Pipeline::new`], advanced by
/// [`Pipeline::tick`] / [`Pipeline::run_cycles`], consumed by
/// [`Pipeline::finalize`].
pub struct Pipeline {
    regs: RegisterFile,
    mem: MemoryStore,
    icache: Cache,
    dcache: Cache,

    if_inst: Instruction,
    id_inst: Instruction,
    ex_inst: Instruction,
    mem_inst: Instruction,
    wb_inst: Instruction,

    /// Address the next fetch will read.
    pc: u32,
    cycle_count: u64,

    load_stall_count: u64,
    i_miss_remaining: u64,
    d_miss_remaining: u64,
    /// Pending second cycle of a two-cycle load-branch stall.
    load_branch_extra: u64,
    /// Set once halt decodes; fetch injects bubbles while the pipe drains.
    fetch_halted: bool,

    dyn_instructions: u64,
    inst_load: u64,
    inst_store: u64,
    inst_branch: u64,
    inst_alu: u64,

    sink: Box<dyn SnapshotSink>,
}

impl Pipeline {
    /// Builds the controller and performs the initial fetch: one I-cache
    /// access at PC 0, the fetched word installed SPECULATIVE in the IF
    /// latch, every other latch IDLE.
    pub fn new(
        i_cfg: &CacheParams,
        d_cfg: &CacheParams,
        mem: MemoryStore,
        sink: Box<dyn SnapshotSink>,
    ) -> Self {
        let mut icache = Cache::new(i_cfg);
        let dcache = Cache::new(d_cfg);

        let mut if_inst = stages::fetch(0, &mem);
        if_inst.status = Status::Speculative;
        let i_miss_remaining = if icache.access(0, CacheOp::Read) {
            0
        } else {
            icache.miss_latency()
        };

        Self {
            regs: RegisterFile::new(),
            mem,
            icache,
            dcache,
            if_inst,
            id_inst: Instruction::nop(Status::Idle),
            ex_inst: Instruction::nop(Status::Idle),
            mem_inst: Instruction::nop(Status::Idle),
            wb_inst: Instruction::nop(Status::Idle),
            pc: WORD_BYTES,
            cycle_count: 0,
            load_stall_count: 0,
            i_miss_remaining,
            d_miss_remaining: 0,
            load_branch_extra: 0,
            fetch_halted: false,
            dyn_instructions: 0,
            inst_load: 0,
            inst_store: 0,
            inst_branch: 0,
            inst_alu: 0,
            sink,
        }
    }

    /// Advances one cycle and emits its snapshot.
    pub fn tick(&mut self) -> RunStatus {
        let cycle = self.cycle_count;
        self.cycle_count += 1;
        let status = self.advance();
        self.emit(cycle);

        if status == RunStatus::Success
            && self.wb_inst.is_halt
            && self.wb_inst.status == Status::Normal
        {
            debug!("halt retired at cycle {}", cycle);
            return RunStatus::Halt;
        }
        status
    }

    /// Runs `n` cycles, or until halt/exception when `n == 0`.
    pub fn run_cycles(&mut self, n: u64) -> RunStatus {
        let mut count = 0;
        while n == 0 || count < n {
            count += 1;
            match self.tick() {
                RunStatus::Success => {}
                done => return done,
            }
        }
        RunStatus::Success
    }

    /// Single-steps until halt or exception.
    pub fn run_till_halt(&mut self) -> RunStatus {
        loop {
            match self.run_cycles(1) {
                RunStatus::Success => {}
                done => return done,
            }
        }
    }

    /// Emits the summary record and returns the final statistics,
    /// destroying the controller.
    pub fn finalize(mut self) -> SimStats {
        let stats = SimStats {
            dynamic_instructions: self.dyn_instructions,
            total_cycles: self.cycle_count,
            ic_hits: self.icache.hits(),
            ic_misses: self.icache.misses(),
            dc_hits: self.dcache.hits(),
            dc_misses: self.dcache.misses(),
            load_stalls: self.load_stall_count,
            inst_load: self.inst_load,
            inst_store: self.inst_store,
            inst_branch: self.inst_branch,
            inst_alu: self.inst_alu,
        };
        self.sink.summary(&stats);
        stats
    }

    /// One cycle of latch movement. The caller emits the snapshot.
    fn advance(&mut self) -> RunStatus {
        let if_p = self.if_inst.clone();
        let id_p = self.id_inst.clone();
        let ex_p = self.ex_inst.clone();
        let mem_p = self.mem_inst.clone();
        let wb_p = self.wb_inst.clone();

        // An outstanding D-miss freezes everything: the missed access holds
        // MEM, younger stages republish, WB drains bubbles. The I-miss
        // counter keeps ticking underneath.
        if self.d_miss_remaining > 0 {
            self.d_miss_remaining -= 1;
            if self.i_miss_remaining > 0 {
                self.i_miss_remaining -= 1;
            }
            self.wb_inst = Instruction::nop(Status::Bubble);
            return RunStatus::Success;
        }

        // Writeback commits first so older results are architecturally
        // visible to this cycle's decode.
        self.wb_inst = stages::writeback(&mem_p, &mut self.regs);
        self.note_retired();

        // The instruction entering MEM faults before it can access anything.
        if ex_p.status == Status::Normal
            && ex_p.touches_mem()
            && ex_p.mem_addr as usize >= self.mem.size()
        {
            let exc = Exception::MemoryOutOfRange {
                addr: ex_p.mem_addr,
                pc: ex_p.pc,
            };
            debug!("memory exception: {}", exc);
            self.mem_inst = ex_p.with_status(Status::Squashed);
            self.ex_inst = Instruction::nop(Status::Squashed);
            self.id_inst = Instruction::nop(Status::Squashed);
            self.enter_exception();
            return RunStatus::Error(exc);
        }

        let mut ex_in = ex_p.clone();
        hazards::forward_store_data(&mut ex_in, &mem_p, &wb_p);
        let new_mem = stages::memory(&ex_in, &mut self.mem);
        if new_mem.status == Status::Normal && new_mem.touches_mem() {
            let op = if new_mem.reads_mem {
                CacheOp::Read
            } else {
                CacheOp::Write
            };
            if !self.dcache.access(new_mem.mem_addr as u64, op) {
                self.d_miss_remaining = self.dcache.miss_latency();
                debug!(
                    "dcache miss at {:#x}, freezing {} cycles",
                    new_mem.mem_addr, self.d_miss_remaining
                );
            }
        }
        self.mem_inst = new_mem;

        // Illegal instruction surfacing from decode.
        if id_p.status == Status::Normal && !id_p.is_legal {
            let exc = Exception::IllegalInstruction {
                raw: id_p.raw,
                pc: id_p.pc,
            };
            debug!("illegal instruction: {}", exc);
            self.ex_inst = Instruction::nop(Status::Squashed);
            self.id_inst = Instruction::nop(Status::Squashed);
            self.enter_exception();
            return RunStatus::Error(exc);
        }

        let stall = if self.load_branch_extra > 0 {
            self.load_branch_extra -= 1;
            true
        } else {
            match hazards::detect(&id_p, &ex_p) {
                Some(Hazard::LoadBranch) => {
                    trace!("load-branch stall at pc {:#x}", id_p.pc);
                    self.load_branch_extra = 1;
                    self.load_stall_count += 1;
                    true
                }
                Some(Hazard::LoadUse) => {
                    trace!("load-use stall at pc {:#x}", id_p.pc);
                    self.load_stall_count += 1;
                    true
                }
                Some(Hazard::ArithBranch) => {
                    trace!("arith-branch stall at pc {:#x}", id_p.pc);
                    true
                }
                None => false,
            }
        };

        // Refresh the decode-stage operands every cycle the instruction
        // sits there; a later-arriving producer overwrites a stale capture.
        let mut id_work = id_p.clone();
        hazards::forward_operands(&mut id_work, &ex_p, &mem_p);

        if stall {
            self.ex_inst = Instruction::nop(Status::Bubble);
            self.id_inst = id_work;
            if self.i_miss_remaining > 0 {
                self.i_miss_remaining -= 1;
            }
            return RunStatus::Success;
        }

        // Control instructions resolve in decode, against forwarded
        // operands. Anything but the sequential PC is a redirect.
        let mut taken = false;
        if id_work.status == Status::Normal && !id_work.is_nop && id_work.is_control() {
            id_work = stages::resolve_next_pc(&id_work);
            taken = id_work.next_pc != id_work.pc.wrapping_add(WORD_BYTES);
        }

        self.ex_inst = stages::execute(&id_work);

        if taken {
            debug!(
                "redirect: pc {:#x} -> {:#x}, squashing fetch at {:#x}",
                id_work.pc, id_work.next_pc, if_p.pc
            );
            self.id_inst = Instruction::nop(Status::Squashed);
            if self.i_miss_remaining > 0 {
                // The fetch was still installing; abandon the block.
                self.icache.invalidate(if_p.pc as u64);
                self.i_miss_remaining = 0;
            }
            self.if_inst = if_p.with_status(Status::Squashed);
            self.pc = id_work.next_pc;
            return RunStatus::Success;
        }

        // An outstanding I-miss keeps the fetch in IF; decode sees bubbles
        // until the block arrives.
        if self.i_miss_remaining > 0 {
            self.i_miss_remaining -= 1;
            self.id_inst = Instruction::nop(Status::Bubble);
            return RunStatus::Success;
        }

        let new_id = stages::decode(&if_p, &self.regs);
        let id_is_control = new_id.status == Status::Normal && new_id.is_control();
        if new_id.is_halt {
            self.fetch_halted = true;
        }
        self.id_inst = new_id;

        if self.fetch_halted {
            self.if_inst = Instruction::nop(Status::Bubble);
            return RunStatus::Success;
        }

        let mut fetched = stages::fetch(self.pc, &self.mem);
        fetched.status = if id_is_control {
            Status::Speculative
        } else {
            Status::Normal
        };
        if !self.icache.access(self.pc as u64, CacheOp::Read) {
            self.i_miss_remaining = self.icache.miss_latency();
            trace!(
                "icache miss at {:#x}, {} bubble cycles",
                self.pc, self.i_miss_remaining
            );
        }
        self.if_inst = fetched;
        self.pc = self.pc.wrapping_add(WORD_BYTES);
        RunStatus::Success
    }

    /// Shared tail of both exception paths: clear pending stalls, redirect
    /// to the handler, and fetch it into IF. The run ends this cycle, so
    /// the handler fetch is recorded for the trace but its latency is moot.
    fn enter_exception(&mut self) {
        self.d_miss_remaining = 0;
        self.i_miss_remaining = 0;
        self.load_branch_extra = 0;
        self.pc = EXCEPTION_HANDLER;

        let mut fetched = stages::fetch(self.pc, &self.mem);
        fetched.status = Status::Normal;
        self.icache.access(self.pc as u64, CacheOp::Read);
        self.if_inst = fetched;
        self.pc = self.pc.wrapping_add(WORD_BYTES);
    }

    /// Commit-side statistics for the instruction that just retired.
    fn note_retired(&mut self) {
        let wb = &self.wb_inst;
        if wb.status != Status::Normal || wb.is_nop {
            return;
        }
        self.dyn_instructions += 1;
        match wb.opcode {
            Opcode::Load => self.inst_load += 1,
            Opcode::Store => self.inst_store += 1,
            Opcode::Branch | Opcode::Jal | Opcode::Jalr => self.inst_branch += 1,
            Opcode::Halt => {}
            _ => self.inst_alu += 1,
        }
    }

    fn emit(&mut self, cycle: u64) {
        let state = PipeState {
            cycle,
            if_pc: self.if_inst.pc,
            if_status: self.if_inst.status,
            id_instr: self.id_inst.raw,
            id_status: self.id_inst.status,
            ex_instr: self.ex_inst.raw,
            ex_status: self.ex_inst.status,
            mem_instr: self.mem_inst.raw,
            mem_status: self.mem_inst.status,
            wb_instr: self.wb_inst.raw,
            wb_status: self.wb_inst.status,
        };
        self.sink.record(&state);
    }

    /// Reads an architectural register.
    pub fn reg(&self, idx: usize) -> u32 {
        self.regs.read(idx)
    }

    /// The PC of the next fetch.
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// Cycles simulated so far.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Load-use plus load-branch stall events so far.
    pub fn load_stalls(&self) -> u64 {
        self.load_stall_count
    }

    /// The backing memory store.
    pub fn memory(&self) -> &MemoryStore {
        &self.mem
    }

    /// Prints PC and the full register file, two columns per row.
    pub fn dump_state(&self) {
        println!("PC = {:#010x}", self.pc);
        let r = self.regs.dump();
        for i in (0..32).step_by(2) {
            println!(
                "x{:<2} = {:#010x}    x{:<2} = {:#010x}",
                i,
                r[i],
                i + 1,
                r[i + 1]
            );
        }
    }
}
