//! Fetch collaborator.
//!
//! The fetch unit sits upstream of the datapath. Each cycle it tops up a
//! decode-width bundle from the trace generator, pre-executing every new
//! instruction through the golden reference. The datapath reports how many
//! lanes it accepted, and redirects fetch on a misprediction rewind or an
//! exception restart.
//!
//! The `miss` and `exception` trace flags are blanked on the instruction
//! copies handed to the datapath; the model must discover both the hard
//! way. The cookies keep the truth for the assertion machinery.

/// Trace generation (scripted programs and seeded random streams).
pub mod trace;

use crate::config::Config;
use crate::golden::{Cookie, GoldenRef};
use crate::isa::{Instruction, Opcode, Serial};
use trace::TraceGen;

/// One decode-width group of fetched instructions and their metadata.
#[derive(Clone, Debug)]
pub struct FetchBundle {
    /// Number of meaningful lanes.
    pub howmany: usize,
    /// Instructions, with trace flags blanked.
    pub inst: Vec<Instruction>,
    /// Serial stamps (in lieu of program counters).
    pub pc_like: Vec<Serial>,
    /// Branch direction predictions.
    pub pred_taken: Vec<bool>,
    /// Claimed result parities (exception detection contract).
    pub oparity: Vec<bool>,
    /// Golden-reference cookies.
    pub cookie: Vec<Cookie>,
}

impl FetchBundle {
    /// An empty bundle of the given lane width.
    pub fn empty(width: usize) -> Self {
        Self {
            howmany: 0,
            inst: vec![Instruction::default(); width],
            pc_like: vec![0; width],
            pred_taken: vec![false; width],
            oparity: vec![false; width],
            cookie: vec![Cookie::default(); width],
        }
    }
}

/// Trace-driven fetch unit with an embedded golden reference.
#[derive(Debug)]
pub struct Fetch {
    trace: TraceGen,
    golden: GoldenRef,
    bundle: FetchBundle,
    width: usize,
}

impl Fetch {
    /// Create a fetch unit over the given trace source.
    pub fn new(cfg: &Config, trace: TraceGen) -> Self {
        Self {
            trace,
            golden: GoldenRef::new(cfg.ooo_degree, cfg.decode_width),
            bundle: FetchBundle::empty(cfg.decode_width),
            width: cfg.decode_width,
        }
    }

    /// Top up and return this cycle's bundle. Stops at a HALT.
    pub fn get_insts(&mut self) -> FetchBundle {
        while self.bundle.howmany < self.width {
            let inst = self.trace.next();
            if inst.opcode == Opcode::Halt {
                break;
            }

            let i = self.bundle.howmany;
            self.bundle.howmany += 1;

            let cookie = self.golden.pre_execute(inst);
            self.bundle.cookie[i] = cookie;
            self.bundle.pc_like[i] = cookie.serial;
            self.bundle.pred_taken[i] = inst.miss != (cookie.vs1 == cookie.vs2);
            self.bundle.oparity[i] = inst.exception != (cookie.vd.count_ones() % 2 == 1);

            // The datapath must not see the trace contract flags.
            let mut masked = inst;
            masked.miss = true;
            masked.exception = true;
            self.bundle.inst[i] = masked;
        }

        self.bundle.clone()
    }

    /// Discard the first `n` lanes the datapath accepted.
    pub fn accept(&mut self, n: usize) {
        assert!(n <= self.width);
        assert!(n <= self.bundle.howmany);

        for (i, j) in (n..self.bundle.howmany).enumerate() {
            self.bundle.inst[i] = self.bundle.inst[j];
            self.bundle.cookie[i] = self.bundle.cookie[j];
            self.bundle.pc_like[i] = self.bundle.pc_like[j];
            self.bundle.pred_taken[i] = self.bundle.pred_taken[j];
            self.bundle.oparity[i] = self.bundle.oparity[j];
        }
        self.bundle.howmany -= n;
    }

    /// Misprediction redirect: drop the bundle and undo the golden
    /// reference back to the branch.
    pub fn rewind(&mut self, serial: Serial) {
        tracing::debug!(serial, "fetch rewinding");
        self.golden.rewind(serial);
        self.bundle.howmany = 0;
    }

    /// Exception redirect: drop the bundle and undo the golden reference
    /// through the faulting instruction.
    pub fn restart(&mut self, serial: Serial) {
        tracing::debug!(serial, "fetch restarting");
        self.golden.restart(serial);
        self.bundle.howmany = 0;
    }

    /// The golden reference, for end-of-run architectural comparison.
    pub fn golden(&self) -> &GoldenRef {
        &self.golden
    }

    /// Reset the trace, the golden reference, and the bundle.
    pub fn reset(&mut self) {
        self.golden.reset();
        self.trace.reset();
        self.bundle.howmany = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch_of(program: Vec<Instruction>) -> Fetch {
        Fetch::new(&Config::default(), TraceGen::scripted(program))
    }

    #[test]
    fn test_bundle_fills_to_width() {
        let mut fetch = fetch_of(vec![Instruction::add(1, 2, 3); 6]);
        let bundle = fetch.get_insts();
        assert_eq!(bundle.howmany, 4);
        assert_eq!(bundle.pc_like[..4], [0, 1, 2, 3]);
    }

    #[test]
    fn test_accept_shifts_and_refills() {
        let mut fetch = fetch_of(vec![Instruction::add(1, 2, 3); 6]);
        let _ = fetch.get_insts();
        fetch.accept(3);
        let bundle = fetch.get_insts();
        assert_eq!(bundle.howmany, 3, "three fetched plus none past HALT");
        assert_eq!(bundle.pc_like[0], 3);
    }

    #[test]
    fn test_flags_blanked_for_datapath() {
        let mut fetch = fetch_of(vec![Instruction::beq(1, 1, false)]);
        let bundle = fetch.get_insts();
        assert!(bundle.inst[0].miss && bundle.inst[0].exception);
        assert!(!bundle.cookie[0].inst.miss);
    }

    #[test]
    fn test_prediction_encodes_miss_contract() {
        // vs1 == vs2 (both zero): a non-miss branch predicts taken.
        let mut fetch = fetch_of(vec![
            Instruction::beq(0, 0, false),
            Instruction::beq(0, 0, true),
        ]);
        let bundle = fetch.get_insts();
        assert!(bundle.pred_taken[0]);
        assert!(!bundle.pred_taken[1], "a miss inverts the prediction");
    }

    #[test]
    fn test_halt_stops_fill() {
        let mut fetch = fetch_of(vec![Instruction::add(1, 2, 3)]);
        let bundle = fetch.get_insts();
        assert_eq!(bundle.howmany, 1);
        let again = fetch.get_insts();
        assert_eq!(again.howmany, 1, "nothing past HALT");
    }
}
