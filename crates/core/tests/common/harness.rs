//! Shared test harness.
//!
//! `TestBed` assembles memory, config, and program with a fluent API and
//! produces a `TestContext` owning a running pipeline plus a handle on the
//! recorded snapshot stream.

use rvpipe_core::config::SimConfig;
use rvpipe_core::pipeline::record::{CollectSink, PipeState};
use rvpipe_core::{MemoryStore, Pipeline, RunStatus};

/// Cycle budget for `run_to_halt`; a test program that spins this long is
/// broken.
const HALT_BUDGET: u64 = 10_000;

/// Fluent builder for a simulator under test.
///
/// Defaults to zero-latency caches so hazard timings are observable on
/// their own; miss latencies opt in per test.
pub struct TestBed {
    config: SimConfig,
    program: Vec<u32>,
    data: Vec<(u32, u32)>,
}

impl Default for TestBed {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBed {
    pub fn new() -> Self {
        let mut config = SimConfig::default();
        config.icache.miss_latency = 0;
        config.dcache.miss_latency = 0;
        Self {
            config,
            program: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Instruction words placed at address 0.
    pub fn program(mut self, words: &[u32]) -> Self {
        self.program = words.to_vec();
        self
    }

    /// Pokes a data word into memory before the run.
    pub fn word(mut self, addr: u32, val: u32) -> Self {
        self.data.push((addr, val));
        self
    }

    pub fn icache_latency(mut self, cycles: u64) -> Self {
        self.config.icache.miss_latency = cycles;
        self
    }

    pub fn icache_block_bytes(mut self, bytes: usize) -> Self {
        self.config.icache.block_bytes = bytes;
        self
    }

    pub fn dcache_latency(mut self, cycles: u64) -> Self {
        self.config.dcache.miss_latency = cycles;
        self
    }

    pub fn memory_bytes(mut self, bytes: usize) -> Self {
        self.config.memory_bytes = bytes;
        self
    }

    /// Builds the pipeline (performing the initial fetch).
    pub fn start(self) -> TestContext {
        let _ = env_logger::builder().is_test(true).try_init();
        self.config.validate().expect("test config must be valid");

        let mut mem = MemoryStore::new(self.config.memory_bytes);
        mem.load_words(&self.program, 0);
        for (addr, val) in &self.data {
            mem.write_u32(*addr, *val);
        }

        let trace = CollectSink::new();
        let sim = Pipeline::new(
            &self.config.icache,
            &self.config.dcache,
            mem,
            Box::new(trace.clone()),
        );
        TestContext { sim, trace }
    }
}

/// A pipeline under test plus its recorded snapshot stream.
pub struct TestContext {
    pub sim: Pipeline,
    trace: CollectSink,
}

impl TestContext {
    /// Runs until halt or exception, asserting the budget is not blown.
    pub fn run_to_halt(&mut self) -> RunStatus {
        let status = self.sim.run_cycles(HALT_BUDGET);
        assert_ne!(
            status,
            RunStatus::Success,
            "program did not halt within {} cycles",
            HALT_BUDGET
        );
        status
    }

    pub fn run(&mut self, cycles: u64) -> RunStatus {
        self.sim.run_cycles(cycles)
    }

    pub fn reg(&self, idx: usize) -> u32 {
        self.sim.reg(idx)
    }

    /// Snapshots recorded so far.
    pub fn states(&self) -> Vec<PipeState> {
        self.trace.states()
    }

    /// The snapshot for one cycle.
    pub fn state(&self, cycle: u64) -> PipeState {
        self.trace
            .states()
            .into_iter()
            .find(|s| s.cycle == cycle)
            .unwrap_or_else(|| panic!("no snapshot for cycle {}", cycle))
    }
}

/// Builds and runs a program to halt with zero-latency caches.
pub fn run_program(words: &[u32]) -> TestContext {
    let mut ctx = TestBed::new().program(words).start();
    let status = ctx.run_to_halt();
    assert_eq!(status, RunStatus::Halt, "expected clean halt");
    ctx
}
