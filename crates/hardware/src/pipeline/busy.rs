//! Busy table.
//!
//! One bit per physical register: set when a producer has been renamed but
//! has not yet been scheduled, cleared at issue (not writeback) so that a
//! chain of dependent single-cycle operations can schedule back-to-back.
//! Index 0 is never busy.

use crate::common::{PhaseFlag, Port};
use crate::config::Config;

/// Pending-result bit table over the physical registers.
#[derive(Debug)]
pub struct BusyTable {
    array: Vec<bool>,
    phase: PhaseFlag,
    read_port: Port,
    set_port: Port,
    clear_port: Port,
}

impl BusyTable {
    /// Create and reset the table for the given configuration.
    pub fn new(cfg: &Config, phase: PhaseFlag) -> Self {
        let reads = 2 * cfg.decode_width;
        let sets = cfg.decode_width;
        let clears = cfg.execute_width;
        tracing::debug!(reads, sets, clears, "busy table port limits");
        let mut busy = Self {
            array: vec![false; cfg.num_physical_regs()],
            phase,
            read_port: Port::new("busy", "read", reads),
            set_port: Port::new("busy", "set", sets),
            clear_port: Port::new("busy", "clear", clears),
        };
        busy.reset();
        busy
    }

    /// Query: is this register's result still pending? Index 0 never is.
    pub fn is_busy(&self, preg: usize) -> bool {
        self.phase.assert_query("busy");
        self.read_port.use_one();
        assert!(preg < self.array.len(), "busy: index {preg} out of range");

        preg != 0 && self.array[preg]
    }

    /// Action: mark a freshly renamed destination pending.
    pub fn set_busy(&mut self, preg: usize) {
        self.phase.assert_action("busy");
        self.set_port.use_one();
        assert!(preg < self.array.len(), "busy: index {preg} out of range");

        if preg != 0 {
            self.array[preg] = true;
        }
    }

    /// Action: clear at issue of the producer.
    pub fn clear_busy(&mut self, preg: usize) {
        self.phase.assert_action("busy");
        self.clear_port.use_one();
        assert!(preg < self.array.len(), "busy: index {preg} out of range");

        if preg != 0 {
            self.array[preg] = false;
        }
    }

    /// Debug introspection without port accounting.
    pub fn peek(&self, preg: usize) -> bool {
        self.array[preg]
    }

    /// Clear every bit.
    pub fn reset(&mut self) {
        self.begin_cycle();
        self.array.fill(false);
    }

    /// Rearm the per-cycle port counters.
    pub fn begin_cycle(&self) {
        self.read_port.reset();
        self.set_port.reset();
        self.clear_port.reset();
    }
}
