//! Shared builders and run helpers for the simulator tests.

use ooo_core::Simulator;
use ooo_core::config::{Config, RenameMode};
use ooo_core::fetch::trace::TraceGen;
use ooo_core::isa::{Instruction, Serial};
use ooo_core::pipeline::datapath::CycleOutput;
use ooo_core::stats::RetiredInst;

/// Baseline configuration under the given rename mode.
pub fn config(rename: RenameMode) -> Config {
    Config {
        rename,
        ..Config::default()
    }
}

/// Run a scripted program to completion.
pub fn run_program(cfg: &Config, program: Vec<Instruction>) -> Simulator {
    let (sim, _outs) = run_collect(cfg, program);
    sim
}

/// Run a scripted program to completion, recording every cycle's outputs.
pub fn run_collect(cfg: &Config, program: Vec<Instruction>) -> (Simulator, Vec<CycleOutput>) {
    let mut sim = Simulator::with_trace(cfg, TraceGen::scripted(program));
    let mut outs = Vec::new();
    let mut countdown = 2 * cfg.ooo_degree;

    loop {
        let empty = sim.fetch.get_insts().howmany == 0;
        outs.push(sim.step());
        if empty {
            countdown -= 1;
            if countdown == 0 {
                break;
            }
        }
    }
    (sim, outs)
}

/// The in-order retirement record of a finished run.
pub fn retired(sim: &Simulator) -> &[RetiredInst] {
    &sim.datapath.stats.retirement_log
}

/// Retired serials, in retirement order.
pub fn retired_serials(sim: &Simulator) -> Vec<Serial> {
    retired(sim).iter().map(|r| r.serial).collect()
}

/// Retirement records stripped of cycle stamps, for cross-mode comparison.
pub fn retired_effects(sim: &Simulator) -> Vec<(Serial, usize, u64)> {
    retired(sim)
        .iter()
        .map(|r| (r.serial, r.rd, r.value))
        .collect()
}
