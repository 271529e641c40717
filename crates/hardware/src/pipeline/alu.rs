//! Single-cycle ALU.
//!
//! Computes the add, resolves branch direction against the prediction, and
//! detects the modeled precise exception: a mismatch between the result's
//! parity and the `oparity` bit fetch attached to the operation.
//!
//! Every valid execution is cross-checked against the golden-reference
//! cookie; a mismatch is a modeling divergence (a rename or forwarding bug)
//! and aborts the run.

use crate::golden::Cookie;
use crate::isa::{DataValue, Opcode};
use crate::pipeline::latches::Operation;

/// Execution result for one lane.
#[derive(Clone, Copy, Debug, Default)]
pub struct AluOut {
    /// Result value (`vs1 + vs2`).
    pub vd: DataValue,
    /// The executed operation is a branch.
    pub is_br: bool,
    /// The branch's resolved direction differs from the prediction.
    pub is_mispredict: bool,
    /// The result parity differs from the operation's claimed parity.
    pub is_exception: bool,
}

/// One execution lane.
#[derive(Debug, Default)]
pub struct Alu;

impl Alu {
    /// Create a lane.
    pub fn new() -> Self {
        Self
    }

    /// Query: execute one operation. With `valid` false the lane idles and
    /// reports nothing.
    pub fn execute(
        &self,
        valid: bool,
        op: &Operation,
        vs1: DataValue,
        vs2: DataValue,
        cookie: &Cookie,
    ) -> AluOut {
        let mut result = AluOut {
            vd: vs1.wrapping_add(vs2),
            ..AluOut::default()
        };

        if valid {
            assert_eq!(vs1, cookie.vs1, "alu: vs1 diverges from golden at s{}", cookie.serial);
            assert_eq!(vs2, cookie.vs2, "alu: vs2 diverges from golden at s{}", cookie.serial);
            assert_eq!(result.vd, cookie.vd, "alu: vd diverges from golden at s{}", cookie.serial);

            result.is_br = op.opcode == Opcode::Beq;
            result.is_mispredict = (vs1 == vs2) != op.pred_taken;
            result.is_exception = (result.vd.count_ones() % 2 == 1) != op.oparity;
        }

        result
    }

    /// Reset; the lane is stateless.
    pub fn reset(&mut self) {}
}
