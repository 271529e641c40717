//! Simulation statistics collection.
//!
//! Tracks per-run counters for the datapath. It provides:
//! 1. **Throughput:** cycles, instructions accepted, instructions retired.
//! 2. **Speculation:** branches resolved, misprediction rewinds.
//! 3. **Exceptions:** faults raised and completed restart sequences.
//! 4. **Retirement log:** the in-order `(cycle, serial, rd, value)` record
//!    of everything that architecturally committed, for test interrogation.

use crate::isa::{DataValue, LogicalReg, Serial};

/// One architecturally committed instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetiredInst {
    /// Cycle the instruction retired in.
    pub cycle: u64,
    /// Program-order serial.
    pub serial: Serial,
    /// Destination register.
    pub rd: LogicalReg,
    /// Committed value.
    pub value: DataValue,
}

/// Per-run datapath statistics.
#[derive(Clone, Debug, Default)]
pub struct SimStats {
    /// Cycles simulated.
    pub cycles: u64,
    /// Instructions accepted into the datapath (including later-squashed
    /// wrong-path instructions).
    pub accepted: u64,
    /// Instructions retired in program order.
    pub retired: u64,
    /// Branches resolved in Execute.
    pub branches_resolved: u64,
    /// Misprediction rewinds performed.
    pub mispredict_rewinds: u64,
    /// Exceptions raised to the tracker.
    pub exceptions_raised: u64,
    /// Completed precise-exception restart sequences.
    pub restarts: u64,
    /// In-order record of retired instructions.
    pub retirement_log: Vec<RetiredInst>,
}
