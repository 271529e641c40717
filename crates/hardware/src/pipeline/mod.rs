//! The out-of-order datapath and its components.
//!
//! Leaves first: register file, busy table, rename map, checkpoint
//! allocator, active list, instruction queues, ALU, exception tracker; the
//! [`datapath`] orchestrator coordinates them once per cycle.
//!
//! All components follow the same protocol: `query` methods are pure and run
//! only in the combinational phase; `action` methods mutate and run only in
//! the commit phase; `reset` re-initializes outside the protocol; and
//! `begin_cycle` rearms the per-cycle port counters.

/// Active list (reorder buffer).
pub mod active_list;
/// Single-cycle ALU with branch resolution and exception detection.
pub mod alu;
/// Busy table: one pending-result bit per physical register.
pub mod busy;
/// Branch checkpoint allocator.
pub mod checkpoint;
/// Per-cycle orchestrator.
pub mod datapath;
/// Pending-exception tracker.
pub mod exception;
/// Instruction queues (reservation stations) with wake-up/select.
pub mod instq;
/// Inter-stage bundle structures.
pub mod latches;
/// Physical register file.
pub mod regfile;
/// Rename map with branch-rewind snapshot stack.
pub mod rmap;

use crate::golden::Cookie;
use latches::Operation;

/// Emit one per-stage trace line for an operation moving through the pipe.
pub(crate) fn trace_stage(stage: &str, op: &Operation, cookie: &Cookie) {
    tracing::trace!(
        serial = cookie.serial,
        speculating = cookie.speculating,
        opcode = ?cookie.inst.opcode,
        rd = cookie.inst.rd,
        rs1 = cookie.inst.rs1,
        rs2 = cookie.inst.rs2,
        td = op.td.preg_index(),
        ts1 = op.ts1.preg_index(),
        ts2 = op.ts2.preg_index(),
        depend_on = ?op.depend_on,
        "{stage}"
    );
}
