//! Simulation statistics collection and reporting.
//!
//! This module tracks the metrics the simulator reports at `finalize`:
//! 1. **Cycle and instruction counts:** total cycles, retired instructions,
//!    and derived CPI.
//! 2. **Instruction mix:** retired counts by class.
//! 3. **Cache behavior:** hit/miss counts for the I- and D-caches.
//! 4. **Stalls:** load-use and load-branch stall events.

use serde::Serialize;

/// Final statistics for one simulation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SimStats {
    /// Instructions that retired with NORMAL status.
    pub dynamic_instructions: u64,
    /// Total cycles simulated.
    pub total_cycles: u64,

    /// I-cache hit count.
    pub ic_hits: u64,
    /// I-cache miss count.
    pub ic_misses: u64,
    /// D-cache hit count.
    pub dc_hits: u64,
    /// D-cache miss count.
    pub dc_misses: u64,

    /// Load-use plus load-branch stall events (a load-branch counts once
    /// even though it stalls two cycles).
    pub load_stalls: u64,

    /// Retired load instructions.
    pub inst_load: u64,
    /// Retired store instructions.
    pub inst_store: u64,
    /// Retired control instructions (branches and jumps).
    pub inst_branch: u64,
    /// Retired ALU instructions.
    pub inst_alu: u64,
}

impl SimStats {
    /// Prints all statistics to stdout.
    pub fn print(&self) {
        let cyc = if self.total_cycles == 0 {
            1
        } else {
            self.total_cycles
        };
        let instr = if self.dynamic_instructions == 0 {
            1
        } else {
            self.dynamic_instructions
        };
        let cpi = cyc as f64 / instr as f64;

        println!("\n==========================================================");
        println!("PIPELINE SIMULATION STATISTICS");
        println!("==========================================================");
        println!("sim_cycles               {}", self.total_cycles);
        println!("sim_insts                {}", self.dynamic_instructions);
        println!("sim_cpi                  {:.4}", cpi);
        println!("stalls.load              {}", self.load_stalls);
        println!("----------------------------------------------------------");
        println!("INSTRUCTION MIX");
        let total_inst = instr as f64;
        let mix = |name: &str, count: u64| {
            println!(
                "  op.{:<20} {} ({:.2}%)",
                name,
                count,
                (count as f64 / total_inst) * 100.0
            );
        };
        mix("alu", self.inst_alu);
        mix("load", self.inst_load);
        mix("store", self.inst_store);
        mix("branch", self.inst_branch);
        println!("----------------------------------------------------------");
        println!("MEMORY HIERARCHY");
        let print_cache = |name: &str, hits: u64, misses: u64| {
            let total = hits + misses;
            let rate = if total > 0 {
                (hits as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            println!(
                "  {:<6} accesses: {:<10} | hits: {:<10} | miss_rate: {:.2}%",
                name,
                total,
                hits,
                100.0 - rate
            );
        };
        print_cache("I", self.ic_hits, self.ic_misses);
        print_cache("D", self.dc_hits, self.dc_misses);
        println!("==========================================================");
    }
}
