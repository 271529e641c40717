//! Golden functional reference.
//!
//! The golden reference pre-executes every instruction in program order the
//! moment fetch produces it, recording the architectural result alongside
//! the instruction as a [`Cookie`]. The out-of-order datapath asserts parity
//! against the cookie at every stage, turning any rename or forwarding bug
//! into an immediate diagnostic instead of a silently wrong trace.
//!
//! Wrong-path instructions (past an already-injected misprediction or
//! exception) are pre-executed too; their effects are journaled so a rewind
//! or restart can undo them and keep the reference in lockstep with the
//! architectural state the datapath converges to.

use crate::isa::{DataValue, Instruction, LogicalReg, NUM_LOGICAL_REG, Opcode, Serial};
use crate::pipeline::latches::Operation;

/// Per-instruction golden record, carried through the whole pipeline.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cookie {
    /// Program-order serial stamp (doubles as the instruction's `pcLike`).
    pub serial: Serial,
    /// Architectural result value.
    pub vd: DataValue,
    /// Architectural first-operand value.
    pub vs1: DataValue,
    /// Architectural second-operand value.
    pub vs2: DataValue,
    /// The instruction with its true `miss`/`exception` flags.
    pub inst: Instruction,
    /// The renamed form, recorded by the datapath at map time.
    pub op: Operation,
    /// Wrong-path depth at pre-execution time; zero on the right path.
    pub speculating: u64,
}

/// One journal entry: enough to undo a single pre-executed instruction.
#[derive(Clone, Copy, Debug, Default)]
struct ReplayLog {
    serial: Serial,
    rd: LogicalReg,
    val: DataValue,
    is_miss: bool,
    is_exception: bool,
}

/// The golden reference: an in-order functional machine with an undo journal.
#[derive(Debug)]
pub struct GoldenRef {
    serial: Serial,
    speculating: u64,
    log: Vec<ReplayLog>,
    rf: [DataValue; NUM_LOGICAL_REG],
}

impl GoldenRef {
    /// Create a reference whose journal can hold every instruction the
    /// datapath may have in flight plus one decode bundle.
    pub fn new(ooo_degree: usize, decode_width: usize) -> Self {
        let mut golden = Self {
            serial: 0,
            speculating: 0,
            log: vec![ReplayLog::default(); ooo_degree + decode_width],
            rf: [0; NUM_LOGICAL_REG],
        };
        golden.reset();
        golden
    }

    /// The serial the next instruction will receive.
    pub fn serial(&self) -> Serial {
        self.serial
    }

    /// Architectural register value (for end-of-run checks).
    pub fn reg(&self, l: LogicalReg) -> DataValue {
        self.rf[l]
    }

    /// Pre-execute one instruction and journal its effect.
    pub fn pre_execute(&mut self, inst: Instruction) -> Cookie {
        let mut cookie = Cookie {
            serial: self.serial,
            speculating: self.speculating,
            ..Cookie::default()
        };
        self.serial += 1;
        if self.speculating > 0 {
            self.speculating += 1;
        }

        let depth = cookie.speculating as usize;
        assert!(
            depth < self.log.len(),
            "golden: wrong-path journal overflow at serial {}",
            cookie.serial
        );

        // Entry 0 is continuously overwritten while on the right path.
        self.log[depth] = ReplayLog {
            serial: cookie.serial,
            rd: inst.rd,
            val: self.rf[inst.rd],
            is_miss: false,
            is_exception: false,
        };

        cookie.inst = inst;
        cookie.vs1 = if inst.rs1 != 0 { self.rf[inst.rs1] } else { 0 };
        cookie.vs2 = if inst.rs2 != 0 { self.rf[inst.rs2] } else { 0 };
        cookie.vd = cookie.vs1.wrapping_add(cookie.vs2);

        if inst.exception {
            self.log[depth].is_exception = true;
            if self.speculating == 0 {
                // Beginning of the wrong path.
                self.speculating = 1;
            }
        }

        match inst.opcode {
            Opcode::Add => {
                if inst.rd != 0 {
                    self.rf[inst.rd] = cookie.vd;
                }
            }
            Opcode::Beq => {
                assert_eq!(inst.rd, 0, "golden: BEQ must target R0");
                if inst.miss {
                    self.log[depth].is_miss = true;
                    if self.speculating == 0 {
                        self.speculating = 1;
                    }
                }
            }
            Opcode::Halt => panic!("golden: HALT must not be pre-executed"),
        }

        cookie
    }

    /// Undo the journal back to the mispredicted branch with this serial.
    ///
    /// The branch itself stays executed; only its misprediction mark and the
    /// wrong-path instructions after it are undone.
    pub fn rewind(&mut self, serial: Serial) {
        assert!(self.speculating > 0, "golden: rewind while not speculating");
        let mut found = false;

        while self.speculating > 0 {
            self.speculating -= 1;
            let i = self.speculating as usize;
            if serial == self.log[i].serial {
                assert!(self.log[i].is_miss, "golden: rewind target is not a miss");
                self.log[i].is_miss = false;
                found = true;
                break;
            }
            if self.log[i].rd != 0 {
                self.rf[self.log[i].rd] = self.log[i].val;
            } else {
                assert_eq!(self.log[i].val, 0);
                assert_eq!(self.rf[0], 0);
            }
        }
        assert!(found, "golden: rewind serial {serial} not in journal");

        // If the oldest wrongness source is an exception, the reference is
        // still off the committed path until restart.
        if self.speculating == 0 && self.log[0].is_exception {
            self.speculating = 1;
        }
    }

    /// Undo the entire journal through the faulting instruction (inclusive).
    pub fn restart(&mut self, serial: Serial) {
        assert!(self.speculating > 0, "golden: restart while not speculating");
        let mut found = false;

        while self.speculating > 0 {
            self.speculating -= 1;
            let i = self.speculating as usize;
            if self.log[i].rd != 0 {
                self.rf[self.log[i].rd] = self.log[i].val;
            } else {
                assert_eq!(self.log[i].val, 0);
                assert_eq!(self.rf[0], 0);
            }
            if serial == self.log[i].serial {
                assert_eq!(i, 0, "golden: faulting serial is not the journal base");
                assert!(self.log[i].is_exception);
                found = true;
                break;
            }
        }
        assert!(found, "golden: restart serial {serial} not in journal");
    }

    /// Reset to the initial architectural state (`rf[i] = i`).
    pub fn reset(&mut self) {
        self.serial = 0;
        self.speculating = 0;
        for (i, r) in self.rf.iter_mut().enumerate() {
            *r = i as DataValue;
        }
        self.rf[0] = 0;
    }
}
