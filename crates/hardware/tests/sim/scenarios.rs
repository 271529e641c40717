//! Concrete pipeline scenarios and boundary behaviors.
//!
//! Baseline machine unless stated otherwise: decode/retire width 4, three
//! ALU lanes, a 32-entry active list, 16-entry queues, speculation depth 4,
//! initial register file `R[i] = i`. Every scenario runs under both rename
//! strategies.

use pretty_assertions::assert_eq;
use rstest::rstest;

use ooo_core::config::{Config, RenameMode};
use ooo_core::isa::Instruction;

use super::helpers::{config, retired_serials, run_collect, run_program};

#[rstest]
#[case::physical(RenameMode::Physical)]
#[case::rob(RenameMode::Rob)]
fn raw_and_waw_hazards(#[case] mode: RenameMode) {
    let program = vec![
        Instruction::add(4, 0, 8),
        Instruction::add(2, 0, 4),
        Instruction::add(4, 0, 8),
        Instruction::add(8, 4, 8),
    ];
    let sim = run_program(&config(mode), program);

    assert_eq!(sim.datapath.arch_reg(4), 8);
    assert_eq!(sim.datapath.arch_reg(2), 8);
    assert_eq!(sim.datapath.arch_reg(8), 16);
    assert_eq!(retired_serials(&sim), vec![0, 1, 2, 3]);
}

#[rstest]
#[case::physical(RenameMode::Physical)]
#[case::rob(RenameMode::Rob)]
fn intra_bundle_forwarding(#[case] mode: RenameMode) {
    // The whole chain is accepted in one cycle; each source must see the
    // tag minted earlier in the same bundle.
    let program = vec![
        Instruction::add(1, 0, 5),
        Instruction::add(2, 1, 0),
        Instruction::add(3, 2, 1),
        Instruction::add(4, 3, 2),
    ];
    let (sim, outs) = run_collect(&config(mode), program);

    assert_eq!(outs[0].accept, 4, "the chain fits one decode bundle");
    assert_eq!(sim.datapath.arch_reg(1), 5);
    assert_eq!(sim.datapath.arch_reg(2), 5);
    assert_eq!(sim.datapath.arch_reg(3), 10);
    assert_eq!(sim.datapath.arch_reg(4), 15);
}

#[rstest]
#[case::physical(RenameMode::Physical)]
#[case::rob(RenameMode::Rob)]
fn correctly_predicted_branch(#[case] mode: RenameMode) {
    let program = vec![
        Instruction::add(1, 0, 2),
        Instruction::beq(0, 1, false),
    ];
    let (sim, outs) = run_collect(&config(mode), program);

    assert_eq!(outs[0].accept, 2, "branch closes but joins the bundle");
    assert!(outs.iter().all(|o| !o.rewind && !o.restart));
    assert_eq!(retired_serials(&sim), vec![0, 1]);
    assert_eq!(
        sim.datapath.checkpoint.peek_in_use().count(),
        0,
        "confirmed branch frees its checkpoint"
    );
}

#[rstest]
#[case::physical(RenameMode::Physical)]
#[case::rob(RenameMode::Rob)]
fn mispredicted_branch_rewinds(#[case] mode: RenameMode) {
    let program = vec![
        Instruction::add(1, 0, 2),
        Instruction::beq(0, 1, true),
        // Wrong path: fetched past the branch, must never retire.
        Instruction::add(5, 1, 1),
        Instruction::add(6, 5, 5),
    ];
    let (sim, outs) = run_collect(&config(mode), program);

    let rewinds: Vec<_> = outs.iter().filter(|o| o.rewind).collect();
    assert_eq!(rewinds.len(), 1);
    assert!(!rewinds[0].restart);
    assert_eq!(rewinds[0].goto_pc, Some(1), "redirect to the branch serial");

    assert_eq!(retired_serials(&sim), vec![0, 1], "nothing younger retires");
    assert_eq!(sim.datapath.arch_reg(1), 2);
    assert_eq!(sim.datapath.arch_reg(5), 5, "wrong-path write undone");
    assert_eq!(sim.datapath.arch_reg(6), 6);
    assert_eq!(
        sim.datapath.checkpoint.peek_in_use().count(),
        0,
        "rewound branch frees its checkpoint"
    );
}

#[rstest]
#[case::physical(RenameMode::Physical)]
#[case::rob(RenameMode::Rob)]
fn precise_exception_restart(#[case] mode: RenameMode) {
    let mut faulting = Instruction::add(4, 1, 2);
    faulting.exception = true;
    let program = vec![
        Instruction::add(1, 0, 2),       // s0: R1 = 2
        Instruction::beq(0, 0, false),   // s1: confirmed branch
        Instruction::add(2, 1, 1),       // s2: R2 = 4
        Instruction::add(3, 2, 2),       // s3: R3 = 8
        faulting,                        // s4: faults before committing R4
        Instruction::add(5, 4, 4),       // s5: past the fault, discarded
    ];
    let (sim, outs) = run_collect(&config(mode), program);

    let restarts: Vec<_> = outs.iter().filter(|o| o.restart).collect();
    assert_eq!(restarts.len(), 1);
    assert!(!restarts[0].rewind);
    assert_eq!(restarts[0].goto_pc, Some(4), "redirect to the faulting serial");

    assert_eq!(retired_serials(&sim), vec![0, 1, 2, 3], "retirement stops at the fault");
    assert_eq!(sim.datapath.arch_reg(1), 2);
    assert_eq!(sim.datapath.arch_reg(2), 4);
    assert_eq!(sim.datapath.arch_reg(3), 8);
    assert_eq!(sim.datapath.arch_reg(4), 4, "the fault's own write is undone");
    assert_eq!(sim.datapath.arch_reg(5), 5, "speculative completion discarded");
}

#[rstest]
#[case::physical(RenameMode::Physical)]
#[case::rob(RenameMode::Rob)]
fn cascaded_chain_sustains_one_per_cycle(#[case] mode: RenameMode) {
    // Eight back-to-back dependent adds on a single cascaded ALU lane must
    // retire one per cycle once the pipeline is warm.
    let cfg = Config {
        execute_width: 1,
        cascade_issue_operand: true,
        ..config(mode)
    };
    let program = vec![Instruction::add(1, 1, 2); 8];
    let sim = run_program(&cfg, program);

    let log = &sim.datapath.stats.retirement_log;
    assert_eq!(log.len(), 8);
    assert_eq!(sim.datapath.arch_reg(1), 1 + 8 * 2);
    for pair in log.windows(2) {
        assert_eq!(
            pair[1].cycle - pair[0].cycle,
            1,
            "warm dependent chain retires back-to-back"
        );
    }
}

#[rstest]
#[case::physical(RenameMode::Physical)]
#[case::rob(RenameMode::Rob)]
fn full_active_list_stalls_acceptance(#[case] mode: RenameMode) {
    let cfg = Config {
        ooo_degree: 8,
        ..config(mode)
    };
    let program = vec![Instruction::add(1, 2, 3); 24];
    let (sim, outs) = run_collect(&cfg, program);

    assert!(
        outs.iter().any(|o| o.accept == 0),
        "a full list must refuse a cycle's bundle"
    );
    assert_eq!(retired_serials(&sim), (0..24).collect::<Vec<_>>());
}

#[rstest]
#[case::physical(RenameMode::Physical)]
#[case::rob(RenameMode::Rob)]
fn branch_without_checkpoint_waits(#[case] mode: RenameMode) {
    let cfg = Config {
        speculate_depth: 1,
        ..config(mode)
    };
    let program = vec![
        Instruction::beq(0, 0, false),
        Instruction::beq(0, 0, false),
        Instruction::add(1, 0, 2),
    ];
    let (sim, outs) = run_collect(&cfg, program);

    assert_eq!(outs[0].accept, 1);
    assert_eq!(
        outs[1].accept, 0,
        "second branch must wait for the only checkpoint slot"
    );
    assert_eq!(retired_serials(&sim), vec![0, 1, 2]);
}

#[rstest]
#[case::physical(RenameMode::Physical)]
#[case::rob(RenameMode::Rob)]
fn two_branches_split_across_cycles(#[case] mode: RenameMode) {
    let program = vec![
        Instruction::add(1, 0, 2),
        Instruction::beq(0, 0, false),
        Instruction::beq(0, 0, false),
        Instruction::add(2, 0, 3),
    ];
    let (sim, outs) = run_collect(&config(mode), program);

    assert_eq!(outs[0].accept, 2, "acceptance truncates at the first branch");
    assert_eq!(retired_serials(&sim), vec![0, 1, 2, 3]);
    assert_eq!(sim.datapath.arch_reg(2), 3);
}

#[rstest]
#[case::physical(RenameMode::Physical)]
#[case::rob(RenameMode::Rob)]
fn nested_speculation_inner_rewind(#[case] mode: RenameMode) {
    // Two unresolved branches; the second mispredicts. Only state younger
    // than the second branch is rewound, and the first confirms later.
    let program = vec![
        Instruction::add(1, 0, 2),      // s0: R1 = 2
        Instruction::beq(1, 3, false),  // s1: 2 != 3, predicted not-taken
        Instruction::add(2, 1, 1),      // s2: R2 = 4
        Instruction::beq(0, 1, true),   // s3: mispredicted
        Instruction::add(3, 2, 2),      // s4: wrong path
    ];
    let (sim, outs) = run_collect(&config(mode), program);

    let rewinds: Vec<_> = outs.iter().filter(|o| o.rewind).collect();
    assert_eq!(rewinds.len(), 1);
    assert_eq!(rewinds[0].goto_pc, Some(3));

    assert_eq!(retired_serials(&sim), vec![0, 1, 2, 3]);
    assert_eq!(sim.datapath.arch_reg(2), 4, "older-than-branch state survives");
    assert_eq!(sim.datapath.arch_reg(3), 3, "wrong-path write undone");
    assert_eq!(sim.datapath.checkpoint.peek_in_use().count(), 0);
}

#[rstest]
#[case::physical(RenameMode::Physical)]
#[case::rob(RenameMode::Rob)]
fn zero_register_never_written(#[case] mode: RenameMode) {
    let program = vec![
        Instruction::add(0, 5, 6),
        Instruction::add(1, 0, 7),
    ];
    let sim = run_program(&config(mode), program);

    assert_eq!(sim.datapath.rf.peek(0), 0);
    assert!(!sim.datapath.busy.peek(0));
    assert_eq!(sim.datapath.arch_reg(1), 7, "R0 still reads as zero downstream");
    assert_eq!(retired_serials(&sim), vec![0, 1]);
}
