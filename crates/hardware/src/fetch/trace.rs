//! Trace generation.
//!
//! Two sources: a scripted instruction sequence (tests and demos) and a
//! seeded random stream shaped by [`TraceConfig`]. Register names in the
//! random stream are drawn from a small window that drifts along the trace,
//! producing realistic clustered dependencies rather than uniform noise.
//! Both sources yield HALT forever once exhausted.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::TraceConfig;
use crate::isa::{Instruction, LogicalReg, NUM_LOGICAL_REG, Opcode};

/// An instruction stream for the fetch unit.
#[derive(Debug)]
pub enum TraceGen {
    /// Fixed program, yielded in order.
    Scripted {
        /// The program.
        program: Vec<Instruction>,
        /// Next instruction index.
        offset: usize,
    },
    /// Seeded random stream.
    Random {
        /// Generator state.
        rng: StdRng,
        /// Instructions produced so far.
        offset: u64,
        /// Shaping knobs.
        cfg: TraceConfig,
    },
}

impl TraceGen {
    /// A scripted trace over the given program.
    pub fn scripted(program: Vec<Instruction>) -> Self {
        Self::Scripted { program, offset: 0 }
    }

    /// A seeded random trace.
    pub fn random(cfg: TraceConfig) -> Self {
        Self::Random {
            rng: StdRng::seed_from_u64(cfg.seed),
            offset: 0,
            cfg,
        }
    }

    /// Produce the next instruction (HALT once exhausted).
    pub fn next(&mut self) -> Instruction {
        match self {
            Self::Scripted { program, offset } => {
                if *offset == program.len() {
                    return Instruction::HALT;
                }
                let inst = program[*offset];
                *offset += 1;
                inst
            }
            Self::Random { rng, offset, cfg } => {
                if *offset == cfg.length {
                    return Instruction::HALT;
                }
                let inst = random_inst(rng, *offset, cfg);
                *offset += 1;
                inst
            }
        }
    }

    /// Rewind to the beginning of the stream.
    pub fn reset(&mut self) {
        match self {
            Self::Scripted { offset, .. } => *offset = 0,
            Self::Random { rng, offset, cfg } => {
                *rng = StdRng::seed_from_u64(cfg.seed);
                *offset = 0;
            }
        }
    }
}

fn random_reg(rng: &mut StdRng, offset: u64, cfg: &TraceConfig) -> LogicalReg {
    let dice = rng.gen_range(0..cfg.rname_range);
    let drift = (offset * cfg.drift_mul) / cfg.drift_div;
    let n = NUM_LOGICAL_REG as u64;
    let reg = if cfg.with_r0 {
        (dice + drift) % n
    } else {
        1 + (dice + drift) % (n - 1)
    };
    reg as LogicalReg
}

fn random_inst(rng: &mut StdRng, offset: u64, cfg: &TraceConfig) -> Instruction {
    assert!(cfg.rname_range > 0 && cfg.rname_range <= NUM_LOGICAL_REG as u64);

    let mut inst = Instruction::default();

    let dice = rng.gen_range(0..cfg.add_share + cfg.br_share);
    inst.opcode = if dice < cfg.add_share {
        Opcode::Add
    } else {
        Opcode::Beq
    };

    inst.rd = if inst.opcode == Opcode::Beq {
        0
    } else {
        random_reg(rng, offset, cfg)
    };
    inst.rs1 = random_reg(rng, offset, cfg);
    inst.rs2 = random_reg(rng, offset, cfg);

    if inst.opcode == Opcode::Beq {
        let dice = rng.gen_range(0..cfg.br_hit + cfg.br_miss);
        inst.miss = dice >= cfg.br_hit;
    }

    let dice = rng.gen_range(0..cfg.except_total);
    inst.exception = dice < cfg.except;

    inst
}
