//! Cycle-accurate model of an R10K-style out-of-order pipeline.
//!
//! This crate implements a behavioral model of a superscalar, speculative,
//! out-of-order instruction pipeline with the following:
//! 1. **Pipeline:** the seven-stage datapath (Map, Dispatch, Issue, Operand,
//!    Execute, Retire, plus a nominal Stage 0 for exception restart) and its
//!    components: active list (ROB), rename map with a branch-rewind stack,
//!    checkpoint allocator, busy table, instruction queues, register file,
//!    ALUs, and exception tracker.
//! 2. **Renaming:** both physical-register-file renaming (R10K style) and
//!    ROB-slot renaming, selectable per run.
//! 3. **Fetch:** a trace-driven fetch collaborator with a golden functional
//!    reference that pre-executes every instruction for parity checking.
//! 4. **Simulation:** `Simulator` (owns fetch + datapath), configuration,
//!    and statistics.
//!
//! One call to [`pipeline::datapath::Datapath::cycle`] advances the whole
//! datapath by one clock. Within a cycle, component `query` operations run in
//! the combinational phase and `action` operations in the commit phase; a
//! shared phase flag enforces the discipline, and per-cycle port counters
//! enforce structural (hardware-realistic) access limits.

/// Common model primitives (rename tags, speculation masks, phase/ports).
pub mod common;
/// Simulator configuration (defaults, enums, validation).
pub mod config;
/// Fetch collaborator: trace generation and bundle management.
pub mod fetch;
/// Golden functional reference and per-instruction cookies.
pub mod golden;
/// Architectural instruction set (opcodes, logical registers).
pub mod isa;
/// The out-of-order datapath and its components.
pub mod pipeline;
/// Simulation driver: `Simulator` and the run loop.
pub mod sim;
/// Simulation statistics collection.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// The out-of-order datapath; one `cycle` call is one clock.
pub use crate::pipeline::datapath::Datapath;
/// Top-level simulator; owns the fetch unit and datapath side-by-side.
pub use crate::sim::simulator::Simulator;
