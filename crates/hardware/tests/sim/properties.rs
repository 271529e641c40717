//! Property tests over seeded random traces.
//!
//! The golden reference asserts value parity inside the datapath on every
//! cycle, so simply completing a long random run is already a strong check;
//! these tests additionally compare the architecturally committed effects
//! across rename modes, scan policies, and the cascade option.

use proptest::prelude::*;

use ooo_core::Simulator;
use ooo_core::config::{Config, RenameMode, ScanPolicy};
use ooo_core::isa::NUM_LOGICAL_REG;

use super::helpers::{config, retired_effects};

fn run_random(mut cfg: Config, seed: u64, length: u64) -> Simulator {
    cfg.trace.seed = seed;
    cfg.trace.length = length;
    let mut sim = Simulator::new(&cfg).expect("baseline config is valid");
    let _report = sim.run();
    sim
}

fn assert_quiesced(sim: &Simulator) {
    assert_eq!(sim.datapath.inflight(), 0, "pipeline drained");
    assert_eq!(sim.datapath.rf.peek(0), 0);
    assert!(!sim.datapath.busy.peek(0));
    assert_eq!(sim.datapath.checkpoint.peek_in_use().count(), 0);

    let serials: Vec<_> = sim
        .datapath
        .stats
        .retirement_log
        .iter()
        .map(|r| r.serial)
        .collect();
    assert!(
        serials.windows(2).all(|w| w[0] < w[1]),
        "retirement order must follow program order"
    );
}

#[test]
fn long_random_trace_is_mode_independent() {
    let physical = run_random(config(RenameMode::Physical), 1, 20_000);
    let rob = run_random(config(RenameMode::Rob), 1, 20_000);

    assert_quiesced(&physical);
    assert_quiesced(&rob);
    assert!(physical.datapath.stats.mispredict_rewinds > 0, "trace exercises rewinds");
    assert!(physical.datapath.stats.restarts > 0, "trace exercises restarts");
    assert_eq!(retired_effects(&physical), retired_effects(&rob));

    // Both converge on the same architectural file as the golden reference.
    for l in 0..NUM_LOGICAL_REG {
        assert_eq!(physical.datapath.arch_reg(l), physical.fetch.golden().reg(l));
        assert_eq!(rob.datapath.arch_reg(l), rob.fetch.golden().reg(l));
    }
}

#[test]
fn dris_checker_agrees_with_distributed_rename() {
    let cfg = Config {
        dris_checker: true,
        ..config(RenameMode::Rob)
    };
    let sim = run_random(cfg, 3, 5_000);
    assert_quiesced(&sim);
}

#[test]
fn scan_policy_does_not_change_architecture() {
    let round_robin = run_random(config(RenameMode::Physical), 5, 5_000);
    let random = run_random(
        Config {
            instq_scan: ScanPolicy::Random,
            ..config(RenameMode::Physical)
        },
        5,
        5_000,
    );
    assert_eq!(retired_effects(&round_robin), retired_effects(&random));
}

#[test]
fn cascading_does_not_change_architecture() {
    let split = run_random(config(RenameMode::Rob), 7, 5_000);
    let cascaded = run_random(
        Config {
            cascade_issue_operand: true,
            ..config(RenameMode::Rob)
        },
        7,
        5_000,
    );
    assert_eq!(retired_effects(&split), retired_effects(&cascaded));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn seeded_traces_retire_identically_in_both_modes(
        seed in any::<u64>(),
        length in 100u64..400,
    ) {
        let physical = run_random(config(RenameMode::Physical), seed, length);
        let rob = run_random(config(RenameMode::Rob), seed, length);

        assert_quiesced(&physical);
        assert_quiesced(&rob);
        prop_assert_eq!(retired_effects(&physical), retired_effects(&rob));
    }

    #[test]
    fn narrow_machines_still_converge(
        seed in any::<u64>(),
        decode in 1usize..4,
        execute in 1usize..3,
    ) {
        let cfg = Config {
            decode_width: decode,
            execute_width: execute,
            retire_width: decode,
            ..config(RenameMode::Physical)
        };
        let sim = run_random(cfg, seed, 300);
        assert_quiesced(&sim);
        for l in 0..NUM_LOGICAL_REG {
            prop_assert_eq!(sim.datapath.arch_reg(l), sim.fetch.golden().reg(l));
        }
    }
}
