//! Architectural instruction set definitions.
//!
//! The modeled ISA is deliberately minimal: ALU adds and equal-compare
//! branches are enough to exercise renaming, scheduling, speculation, and
//! precise exceptions. It provides:
//! 1. **Opcodes:** `ADD`, `BEQ`, and the trace-terminating `HALT`.
//! 2. **Logical registers:** 32 names, with `R0` hardwired to zero.
//! 3. **Instruction:** the decoded form handed to the datapath, including
//!    the trace contract flags for misprediction and exception injection.

/// Number of architectural (logical) register names.
pub const NUM_LOGICAL_REG: usize = 32;

/// Logical register name; `0` always reads as zero and discards writes.
pub type LogicalReg = usize;

/// Operand value data type.
pub type DataValue = u64;

/// Instruction serial stamp, used in lieu of a program counter.
pub type Serial = u64;

/// Architectural opcode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Opcode {
    /// Register-register add: `rd <- rs1 + rs2`.
    #[default]
    Add,
    /// Branch if `rs1 == rs2`; must have `rd == R0`.
    Beq,
    /// End of trace; never enters the datapath.
    Halt,
}

/// A decoded instruction as presented by fetch.
///
/// `miss` and `exception` are a trace contract for testability: `miss`
/// asserts that fetch's branch prediction will be wrong, `exception` that
/// the ALU will observe a parity mismatch. Fetch blanks both flags on the
/// copy handed to the datapath (the cookie keeps the truth), so the model
/// cannot cheat by peeking at them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Instruction {
    /// Opcode.
    pub opcode: Opcode,
    /// Destination register.
    pub rd: LogicalReg,
    /// First source register.
    pub rs1: LogicalReg,
    /// Second source register.
    pub rs2: LogicalReg,
    /// Trace contract: this branch is a misprediction.
    pub miss: bool,
    /// Trace contract: this instruction raises a precise exception.
    pub exception: bool,
}

impl Instruction {
    /// The trace terminator.
    pub const HALT: Self = Self {
        opcode: Opcode::Halt,
        rd: 0,
        rs1: 0,
        rs2: 0,
        miss: false,
        exception: false,
    };

    /// A plain `ADD rd, rs1, rs2`.
    pub fn add(rd: LogicalReg, rs1: LogicalReg, rs2: LogicalReg) -> Self {
        Self {
            opcode: Opcode::Add,
            rd,
            rs1,
            rs2,
            ..Self::default()
        }
    }

    /// A `BEQ rs1, rs2`; `miss` marks it as a misprediction in the trace.
    pub fn beq(rs1: LogicalReg, rs2: LogicalReg, miss: bool) -> Self {
        Self {
            opcode: Opcode::Beq,
            rd: 0,
            rs1,
            rs2,
            miss,
            ..Self::default()
        }
    }
}
