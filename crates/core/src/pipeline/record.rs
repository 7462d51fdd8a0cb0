//! Per-cycle snapshot records and their sinks.
//!
//! The controller emits exactly one [`PipeState`] per tick. Sinks decide
//! what to do with the stream: write JSON lines, collect in memory for
//! assertions, or drop everything.

use std::io::Write;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::pipeline::latches::Status;
use crate::stats::SimStats;

/// What each stage held at the end of one cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PipeState {
    pub cycle: u64,
    pub if_pc: u32,
    pub if_status: Status,
    pub id_instr: u32,
    pub id_status: Status,
    pub ex_instr: u32,
    pub ex_status: Status,
    pub mem_instr: u32,
    pub mem_status: Status,
    pub wb_instr: u32,
    pub wb_status: Status,
}

/// Receiver for the per-cycle snapshot stream.
pub trait SnapshotSink {
    /// Called once per tick with the end-of-cycle state.
    fn record(&mut self, state: &PipeState);

    /// Called once from `finalize` with the final statistics.
    fn summary(&mut self, _stats: &SimStats) {}
}

/// Discards the stream.
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn record(&mut self, _state: &PipeState) {}
}

/// Collects the stream in memory behind a shared handle, so the history
/// stays inspectable after the controller takes ownership of its sink.
#[derive(Clone, Default)]
pub struct CollectSink {
    states: Arc<Mutex<Vec<PipeState>>>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the snapshots recorded so far.
    pub fn states(&self) -> Vec<PipeState> {
        self.states.lock().unwrap().clone()
    }
}

impl SnapshotSink for CollectSink {
    fn record(&mut self, state: &PipeState) {
        self.states.lock().unwrap().push(state.clone());
    }
}

/// Writes one JSON object per line, and a final summary object.
pub struct JsonTrace<W: Write> {
    out: W,
}

impl<W: Write> JsonTrace<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> SnapshotSink for JsonTrace<W> {
    fn record(&mut self, state: &PipeState) {
        match serde_json::to_string(state) {
            Ok(line) => {
                if let Err(e) = writeln!(self.out, "{}", line) {
                    log::warn!("trace write failed: {}", e);
                }
            }
            Err(e) => log::warn!("trace serialization failed: {}", e),
        }
    }

    fn summary(&mut self, stats: &SimStats) {
        match serde_json::to_string(stats) {
            Ok(line) => {
                if let Err(e) = writeln!(self.out, "{}", line) {
                    log::warn!("trace write failed: {}", e);
                }
                let _ = self.out.flush();
            }
            Err(e) => log::warn!("trace serialization failed: {}", e),
        }
    }
}
