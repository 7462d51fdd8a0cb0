//! Functional semantics façade.
//!
//! Pure per-stage functions over [`Instruction`](crate::pipeline::latches::Instruction)
//! values. Each takes the latch feeding the stage and returns the value the
//! stage produces; none holds timing state, and architectural side effects
//! happen only through the explicitly borrowed register file and memory
//! store. Latches that are not on the committed path (IDLE, BUBBLE,
//! SQUASHED) pass through untouched.

mod decode;
mod execute;
mod fetch;
mod memory;
mod writeback;

pub use decode::{decode, resolve_next_pc};
pub use execute::execute;
pub use fetch::fetch;
pub use memory::memory;
pub use writeback::writeback;
