//! Physical register file.
//!
//! A flat indexed store of data values. Index 0 is hardwired: it always
//! reads as zero and discards writes. In physical-rename mode the file holds
//! `OOO_DEGREE + NUM_LOGICAL_REG` rename registers; in ROB-rename mode the
//! low `NUM_LOGICAL_REG` indices are the architectural file (written at
//! retirement) and the remainder shadow active-list slots holding
//! speculative values.
//!
//! Read and write port counts are enforced per cycle; the limits differ by
//! rename mode because ROB-rename retirement both reads the retiring slots
//! and writes the architectural file.

use crate::common::{PhaseFlag, Port};
use crate::config::{Config, RenameMode};
use crate::isa::DataValue;

/// Indexed store of physical register values.
#[derive(Debug)]
pub struct RegFile {
    array: Vec<DataValue>,
    phase: PhaseFlag,
    read_port: Port,
    write_port: Port,
}

impl RegFile {
    /// Create and reset the register file for the given configuration.
    pub fn new(cfg: &Config, phase: PhaseFlag) -> Self {
        let (reads, writes) = match cfg.rename {
            RenameMode::Rob => (
                2 * cfg.decode_width + cfg.retire_width,
                cfg.execute_width + cfg.retire_width,
            ),
            RenameMode::Physical => (2 * cfg.execute_width, cfg.execute_width),
        };
        tracing::debug!(reads, writes, "regfile port limits");
        let mut rf = Self {
            array: vec![0; cfg.num_physical_regs()],
            phase,
            read_port: Port::new("regfile", "read", reads),
            write_port: Port::new("regfile", "write", writes),
        };
        rf.reset();
        rf
    }

    /// Query: read a physical register. Index 0 reads as zero.
    pub fn read(&self, preg: usize) -> DataValue {
        self.phase.assert_query("regfile");
        self.read_port.use_one();
        assert!(preg < self.array.len(), "regfile: read index {preg} out of range");

        if preg != 0 {
            self.array[preg]
        } else {
            assert_eq!(self.array[0], 0);
            0
        }
    }

    /// Action: write a physical register. Writes to index 0 are discarded.
    pub fn write(&mut self, preg: usize, val: DataValue) {
        self.phase.assert_action("regfile");
        self.write_port.use_one();
        assert!(preg < self.array.len(), "regfile: write index {preg} out of range");

        if preg != 0 {
            self.array[preg] = val;
        }
    }

    /// Debug introspection: read without port accounting or phase checks.
    pub fn peek(&self, preg: usize) -> DataValue {
        self.array[preg]
    }

    /// Reset to the initial pattern (`rf[i] = i`, index 0 zero).
    pub fn reset(&mut self) {
        self.begin_cycle();
        for (i, v) in self.array.iter_mut().enumerate() {
            *v = i as DataValue;
        }
        self.array[0] = 0;
    }

    /// Rearm the per-cycle port counters.
    pub fn begin_cycle(&self) {
        self.read_port.reset();
        self.write_port.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PhaseFlag;

    fn rf() -> (RegFile, PhaseFlag) {
        let phase = PhaseFlag::new();
        let rf = RegFile::new(&Config::default(), phase.clone());
        (rf, phase)
    }

    #[test]
    fn test_reset_pattern() {
        let (rf, phase) = rf();
        phase.begin_cycle();
        assert_eq!(rf.read(0), 0);
        assert_eq!(rf.read(5), 5);
        assert_eq!(rf.read(33), 33);
    }

    #[test]
    fn test_index_zero_discards_writes() {
        let (mut rf, phase) = rf();
        rf.write(0, 99);
        phase.begin_cycle();
        assert_eq!(rf.read(0), 0);
    }

    #[test]
    fn test_write_then_read() {
        let (mut rf, phase) = rf();
        rf.write(7, 1234);
        phase.begin_cycle();
        assert_eq!(rf.read(7), 1234);
    }

    #[test]
    #[should_panic(expected = "structural violation")]
    fn test_read_port_limit() {
        let (rf, phase) = rf();
        phase.begin_cycle();
        // Physical-rename default: 2 * execute_width = 6 reads allowed.
        for _ in 0..7 {
            let _ = rf.read(1);
        }
    }

    #[test]
    #[should_panic(expected = "query after commit")]
    fn test_read_rejected_in_commit_phase() {
        let (rf, _phase) = rf();
        let _ = rf.read(1);
    }
}
