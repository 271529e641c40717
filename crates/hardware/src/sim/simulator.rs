//! Simulator: owns the fetch unit and the datapath side-by-side.
//!
//! The run loop mirrors the hardware handshake: fetch offers a bundle, the
//! datapath reports how many lanes it accepted and whether it wants a
//! redirect, and fetch reacts by discarding accepted lanes, or dropping the
//! bundle and undoing the golden reference on a rewind or restart.

use crate::config::{Config, ConfigError};
use crate::fetch::Fetch;
use crate::fetch::trace::TraceGen;
use crate::pipeline::datapath::{CycleOutput, Datapath};

/// Summary of one finished simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunReport {
    /// Cycles simulated.
    pub cycles: u64,
    /// Instructions accepted by the datapath.
    pub instructions: u64,
}

/// Top-level simulator: fetch collaborator + out-of-order datapath.
#[derive(Debug)]
pub struct Simulator {
    /// The fetch unit (trace source + golden reference).
    pub fetch: Fetch,
    /// The modeled datapath.
    pub datapath: Datapath,
    cfg: Config,
}

impl Simulator {
    /// Create a simulator over the configured random trace.
    pub fn new(cfg: &Config) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self::with_trace(cfg, TraceGen::random(cfg.trace)))
    }

    /// Create a simulator over an explicit trace source.
    ///
    /// # Panics
    ///
    /// On a structurally invalid configuration.
    pub fn with_trace(cfg: &Config, trace: TraceGen) -> Self {
        Self {
            fetch: Fetch::new(cfg, trace),
            datapath: Datapath::new(cfg),
            cfg: *cfg,
        }
    }

    /// Advance one cycle, applying the fetch handshake.
    pub fn step(&mut self) -> CycleOutput {
        let bundle = self.fetch.get_insts();
        let out = self.datapath.cycle(&bundle);

        self.fetch.accept(out.accept);
        if out.rewind {
            assert!(!out.restart);
            let Some(pc) = out.goto_pc else {
                panic!("rewind requested without a redirect target")
            };
            self.fetch.rewind(pc);
        }
        if out.restart {
            assert!(!out.rewind);
            let Some(pc) = out.goto_pc else {
                panic!("restart requested without a redirect target")
            };
            self.fetch.restart(pc);
        }
        out
    }

    /// Run until the trace is exhausted and the pipeline has drained.
    pub fn run(&mut self) -> RunReport {
        let mut countdown = 2 * self.cfg.ooo_degree;
        let mut cycles = 0u64;
        let mut instructions = 0u64;

        loop {
            let empty = self.fetch.get_insts().howmany == 0;
            let out = self.step();
            instructions += out.accept as u64;

            if empty {
                countdown -= 1;
                if countdown == 0 {
                    break;
                }
            }
            cycles += 1;
        }

        RunReport {
            cycles,
            instructions,
        }
    }
}
