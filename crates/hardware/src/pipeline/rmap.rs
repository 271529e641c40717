//! Rename map with branch-rewind snapshot stack.
//!
//! Maps each logical register name to the rename tag of its current value.
//! `R0` is conceptually fixed to the zero tag. A full-map snapshot is taken
//! into the stack slot of every allocated branch checkpoint; misprediction
//! restores the snapshot in one cycle.
//!
//! The superscalar bundle operations rename a whole decode group in one
//! cycle with intra-bundle dependency forwarding: a source that names an
//! earlier destination in the same bundle takes that instruction's fresh
//! tag, not the stale table entry. The bundle lookup also returns each
//! destination's *previous* mapping (`tdOld`), which physical-rename mode
//! logs for serial exception unwind.

use crate::common::{PhaseFlag, Port, RenameTag};
use crate::config::{Config, RenameMode};
use crate::isa::{Instruction, LogicalReg, NUM_LOGICAL_REG};
use crate::pipeline::latches::RenameBundle;

/// Logical-to-physical rename map table.
#[derive(Debug)]
pub struct RenameMap {
    map: Vec<RenameTag>,
    stack: Vec<Vec<RenameTag>>,
    mode: RenameMode,
    decode_width: usize,
    ooo_degree: usize,
    num_physical: usize,
    phase: PhaseFlag,
    read_port: Port,
    write_port: Port,
    checkpoint_port: Port,
    unmap_port: Port,
}

impl RenameMap {
    /// Create and reset the map for the given configuration.
    pub fn new(cfg: &Config, phase: PhaseFlag) -> Self {
        let reads = match cfg.rename {
            RenameMode::Rob => cfg.decode_width * 2,
            // One extra read per lane to look up tdOld.
            RenameMode::Physical => cfg.decode_width * 3,
        };
        let writes = cfg.decode_width;
        let unmaps = cfg.retire_width;
        tracing::debug!(reads, writes, unmaps, "rename map port limits");
        let mut rmap = Self {
            map: vec![RenameTag::zero(cfg.rename); NUM_LOGICAL_REG],
            stack: vec![vec![RenameTag::zero(cfg.rename); NUM_LOGICAL_REG]; cfg.speculate_depth],
            mode: cfg.rename,
            decode_width: cfg.decode_width,
            ooo_degree: cfg.ooo_degree,
            num_physical: cfg.num_physical_regs(),
            phase,
            read_port: Port::new("rmap", "read", reads),
            write_port: Port::new("rmap", "write", writes),
            checkpoint_port: Port::new("rmap", "checkpoint", 1),
            unmap_port: Port::new("rmap", "unmap", unmaps),
        };
        rmap.reset();
        rmap
    }

    /// Query: the current mapping of a logical register.
    pub fn get(&self, lreg: LogicalReg) -> RenameTag {
        self.phase.assert_query("rmap");
        self.read_port.use_one();
        assert!(lreg < NUM_LOGICAL_REG, "rmap: logical register {lreg} out of range");

        if lreg != 0 {
            let tag = self.map[lreg];
            if self.mode == RenameMode::Physical {
                assert!(tag.preg_index() < self.num_physical);
            }
            tag
        } else {
            RenameTag::zero(self.mode)
        }
    }

    /// Query: rename up to `howmany` instructions in one cycle.
    ///
    /// Sources are forwarded within the bundle (the youngest earlier
    /// destination with the same name wins); `tdOld` gets the prior mapping
    /// of each destination under the same forwarding rule. A destination of
    /// `R0` still consumes its offered free tag as its own `tdOld`, so the
    /// never-mapped register returns to the free list at retirement.
    pub fn get_map_bundle(
        &self,
        howmany: usize,
        insts: &[Instruction],
        free: &[RenameTag],
    ) -> RenameBundle {
        self.phase.assert_query("rmap");
        assert!(howmany <= self.decode_width);

        let mut renamed = RenameBundle::empty(self.mode, self.decode_width);
        renamed.howmany = howmany;

        for i in 0..howmany {
            renamed.op[i].opcode = insts[i].opcode;
            renamed.op[i].td = if insts[i].rd != 0 {
                free[i]
            } else {
                RenameTag::zero(self.mode)
            };
        }

        // Lanes past `howmany` are scanned too; their zeroed names make the
        // lookups inert, matching a fixed-width rename array.
        for i in 0..self.decode_width {
            renamed.op[i].ts1 = self.get(insts[i].rs1);
            for j in (0..i).rev() {
                if insts[i].rs1 != 0 && insts[i].rs1 == insts[j].rd {
                    renamed.op[i].ts1 = renamed.op[j].td;
                    break;
                }
            }

            renamed.op[i].ts2 = self.get(insts[i].rs2);
            for j in (0..i).rev() {
                if insts[i].rs2 != 0 && insts[i].rs2 == insts[j].rd {
                    renamed.op[i].ts2 = renamed.op[j].td;
                    break;
                }
            }

            if self.mode == RenameMode::Physical {
                if insts[i].rd != 0 {
                    renamed.td_old[i] = self.get(insts[i].rd);
                    for j in (0..i).rev() {
                        if insts[i].rd == insts[j].rd {
                            renamed.td_old[i] = renamed.op[j].td;
                            break;
                        }
                    }
                } else {
                    renamed.td_old[i] = free[i];
                }
            }
        }

        renamed
    }

    /// Action: install a new mapping. `R0` mappings are discarded.
    pub fn set(&mut self, lreg: LogicalReg, tag: RenameTag) {
        self.phase.assert_action("rmap");
        self.write_port.use_one();
        assert!(lreg < NUM_LOGICAL_REG, "rmap: logical register {lreg} out of range");

        if lreg != 0 {
            match self.mode {
                RenameMode::Rob => {
                    let RenameTag::Reorder(slot) = tag else {
                        panic!("rmap: ROB rename requires a reorder tag, got {tag:?}");
                    };
                    assert!(slot < self.ooo_degree);
                }
                RenameMode::Physical => {
                    assert!(tag.preg_index() < self.num_physical);
                }
            }
            self.map[lreg] = tag;
        }
    }

    /// Action: install the new mappings for one accepted decode bundle.
    pub fn set_map_bundle(&mut self, howmany: usize, insts: &[Instruction], free: &[RenameTag]) {
        self.phase.assert_action("rmap");
        assert!(howmany <= self.decode_width);

        for i in 0..howmany {
            self.set(insts[i].rd, free[i]);
        }
    }

    /// Action: snapshot the whole map under a branch checkpoint slot.
    pub fn checkpoint(&mut self, slot: usize) {
        self.phase.assert_action("rmap");
        self.checkpoint_port.use_one();
        assert!(slot < self.stack.len());

        self.stack[slot].copy_from_slice(&self.map);
    }

    /// Action: restore the snapshot of a mispredicted branch.
    pub fn rewind(&mut self, slot: usize) {
        self.phase.assert_action("rmap");
        assert!(slot < self.stack.len());

        self.map.copy_from_slice(&self.stack[slot]);
    }

    /// Action (ROB rename): drop a mapping whose value moved to the
    /// architectural file at retirement, if it is still the latest.
    ///
    /// Snapshots are not tied to the retiring entry's lifetime, so every
    /// stack level holding the expired tag is cleared as well.
    pub fn unmap_on_retire(&mut self, lreg: LogicalReg, old: RenameTag) {
        self.phase.assert_action("rmap");
        self.unmap_port.use_one();
        assert!(lreg < NUM_LOGICAL_REG, "rmap: logical register {lreg} out of range");

        if lreg != 0 {
            assert!(
                matches!(self.map[lreg], RenameTag::Reorder(_)),
                "rmap: retiring {lreg} while unmapped"
            );
            if self.map[lreg] == old {
                self.map[lreg] = RenameTag::Architectural(lreg);
            }
        }

        for level in &mut self.stack {
            if lreg != 0 && level[lreg] == old {
                level[lreg] = RenameTag::Architectural(lreg);
            }
        }
    }

    /// Action (physical rename): restore one decode bundle's worth of old
    /// mappings, youngest first: a single serial exception-unwind step.
    pub fn unmap_bundle(&mut self, howmany: usize, rds: &[LogicalReg], td_olds: &[RenameTag]) {
        self.phase.assert_action("rmap");
        assert!(howmany <= self.decode_width);

        for i in 0..howmany {
            self.set(rds[i], td_olds[i]);
        }
    }

    /// Debug introspection without port accounting.
    pub fn peek(&self, lreg: LogicalReg) -> RenameTag {
        if lreg == 0 {
            RenameTag::zero(self.mode)
        } else {
            self.map[lreg]
        }
    }

    /// Reset to the identity mapping.
    pub fn reset(&mut self) {
        self.begin_cycle();
        for (l, tag) in self.map.iter_mut().enumerate() {
            *tag = match self.mode {
                RenameMode::Physical => RenameTag::Physical(l),
                RenameMode::Rob => RenameTag::Architectural(l),
            };
        }
    }

    /// Rearm the per-cycle port counters.
    pub fn begin_cycle(&self) {
        self.read_port.reset();
        self.write_port.reset();
        self.checkpoint_port.reset();
        self.unmap_port.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn physical() -> (RenameMap, PhaseFlag) {
        let phase = PhaseFlag::new();
        let cfg = Config::default();
        let rmap = RenameMap::new(&cfg, phase.clone());
        (rmap, phase)
    }

    fn rob() -> (RenameMap, PhaseFlag) {
        let phase = PhaseFlag::new();
        let cfg = Config {
            rename: RenameMode::Rob,
            ..Config::default()
        };
        let rmap = RenameMap::new(&cfg, phase.clone());
        (rmap, phase)
    }

    fn free_phys(base: usize, n: usize) -> Vec<RenameTag> {
        (0..n).map(|i| RenameTag::Physical(base + i)).collect()
    }

    #[test]
    fn test_reset_identity_mapping() {
        let (rmap, phase) = physical();
        phase.begin_cycle();
        assert_eq!(rmap.get(3), RenameTag::Physical(3));
        assert_eq!(rmap.get(0), RenameTag::Physical(0));
    }

    #[test]
    fn test_rob_mode_unmapped_reads_architectural() {
        let (rmap, phase) = rob();
        phase.begin_cycle();
        assert_eq!(rmap.get(7), RenameTag::Architectural(7));
    }

    #[test]
    fn test_set_ignores_r0() {
        let (mut rmap, phase) = physical();
        rmap.set(0, RenameTag::Physical(40));
        phase.begin_cycle();
        assert_eq!(rmap.get(0), RenameTag::Physical(0));
    }

    #[test]
    fn test_bundle_intra_forwarding() {
        let (rmap, phase) = physical();
        phase.begin_cycle();
        // R1 <- ..., then R2 <- R1 + R1 must see the fresh tag for R1.
        let insts = vec![
            Instruction::add(1, 5, 6),
            Instruction::add(2, 1, 1),
            Instruction::default(),
            Instruction::default(),
        ];
        let free = free_phys(32, 4);
        let bundle = rmap.get_map_bundle(2, &insts, &free);

        assert_eq!(bundle.op[0].ts1, RenameTag::Physical(5));
        assert_eq!(bundle.op[0].td, RenameTag::Physical(32));
        assert_eq!(bundle.op[1].ts1, RenameTag::Physical(32));
        assert_eq!(bundle.op[1].ts2, RenameTag::Physical(32));
    }

    #[test]
    fn test_bundle_td_old_tracks_waw() {
        let (rmap, phase) = physical();
        phase.begin_cycle();
        // Two writers of R4 in one bundle: the second's tdOld is the first's
        // fresh tag, not the table entry.
        let insts = vec![
            Instruction::add(4, 1, 1),
            Instruction::add(4, 2, 2),
            Instruction::default(),
            Instruction::default(),
        ];
        let free = free_phys(40, 4);
        let bundle = rmap.get_map_bundle(2, &insts, &free);

        assert_eq!(bundle.td_old[0], RenameTag::Physical(4));
        assert_eq!(bundle.td_old[1], RenameTag::Physical(40));
    }

    #[test]
    fn test_bundle_r0_destination_recycles_free_tag() {
        let (rmap, phase) = physical();
        phase.begin_cycle();
        let insts = vec![
            Instruction::add(0, 1, 2),
            Instruction::default(),
            Instruction::default(),
            Instruction::default(),
        ];
        let free = free_phys(50, 4);
        let bundle = rmap.get_map_bundle(1, &insts, &free);

        assert!(bundle.op[0].td.is_zero());
        assert_eq!(bundle.td_old[0], RenameTag::Physical(50));
    }

    #[test]
    fn test_checkpoint_rewind_roundtrip() {
        let (mut rmap, phase) = physical();
        rmap.set(3, RenameTag::Physical(33));
        rmap.checkpoint(1);
        rmap.set(3, RenameTag::Physical(44));
        rmap.rewind(1);
        phase.begin_cycle();
        assert_eq!(rmap.get(3), RenameTag::Physical(33));
    }

    #[test]
    fn test_unmap_on_retire_clears_map_and_stacks() {
        let (mut rmap, _phase) = rob();
        rmap.set(6, RenameTag::Reorder(9));
        rmap.checkpoint(0);
        rmap.unmap_on_retire(6, RenameTag::Reorder(9));
        assert_eq!(rmap.peek(6), RenameTag::Architectural(6));

        // The snapshot must not resurrect the expired tag on rewind.
        rmap.rewind(0);
        assert_eq!(rmap.peek(6), RenameTag::Architectural(6));
    }

    #[test]
    fn test_unmap_on_retire_keeps_newer_mapping() {
        let (mut rmap, _phase) = rob();
        rmap.set(6, RenameTag::Reorder(9));
        rmap.set(6, RenameTag::Reorder(12));
        rmap.unmap_on_retire(6, RenameTag::Reorder(9));
        assert_eq!(rmap.peek(6), RenameTag::Reorder(12));
    }
}
