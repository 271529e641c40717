//! Active list (reorder buffer).
//!
//! A circular buffer of inflight instructions in program order. Pointers
//! live in a doubled address space of `log2(2 * OOO_DEGREE)` bits, whose
//! high bit acts as a color tag distinguishing full from empty and defining
//! the "older than" order across the wrap.
//!
//! Entries are created at Map, marked at Execute (completed / exception),
//! and destroyed either by retirement advancing the dequeue pointer or by a
//! branch rewind pulling the enqueue pointer back. In physical-rename mode
//! each entry also logs its destination's previous mapping (`tdOld`) for
//! serial exception unwind, and carries the recycled free tag (`tdNew`) that
//! makes the list double as the free list.
//!
//! An optional centralized checker (DRIS-style, ROB rename only) shadows
//! renaming and issue inside the list and asserts parity with the
//! distributed structures.

use crate::common::{PhaseFlag, Port, RenameTag};
use crate::config::{Config, RenameMode};
use crate::golden::Cookie;
use crate::isa::{Instruction, LogicalReg, NUM_LOGICAL_REG, Serial};
use crate::pipeline::instq::InstQEntry;
use crate::pipeline::latches::{FreeRegBundle, RenameBundle, RetireBundle, UnmapBundle};
use crate::pipeline::trace_stage;

/// One inflight instruction.
#[derive(Clone, Copy, Debug, Default)]
struct ActiveListEntry {
    pc_like: Serial,
    completed: bool,
    exception: bool,
    rd: LogicalReg,
    /// Physical rename: the free tag recycled through this slot.
    td_new: RenameTag,
    /// Physical rename: the destination's previous mapping.
    td_old: RenameTag,
    cookie: Cookie,
}

/// Centralized-checker rename tag: colored ROB index or architectural name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DrisTag {
    Arch(usize),
    Rob(usize),
}

impl DrisTag {
    fn index(self) -> usize {
        match self {
            Self::Arch(i) | Self::Rob(i) => i,
        }
    }
}

/// Centralized-checker shadow state for one entry.
#[derive(Clone, Copy, Debug)]
struct DrisEntry {
    rs1: LogicalReg,
    rs2: LogicalReg,
    td: DrisTag,
    ts1: DrisTag,
    ts2: DrisTag,
    issued: bool,
    ts1_rdy: bool,
    ts2_rdy: bool,
}

impl Default for DrisEntry {
    fn default() -> Self {
        Self {
            rs1: 0,
            rs2: 0,
            td: DrisTag::Arch(0),
            ts1: DrisTag::Arch(0),
            ts2: DrisTag::Arch(0),
            issued: false,
            ts1_rdy: false,
            ts2_rdy: false,
        }
    }
}

/// The reorder buffer.
#[derive(Debug)]
pub struct ActiveList {
    entries: Vec<ActiveListEntry>,
    dris: Option<Vec<DrisEntry>>,
    enq_stack: Vec<usize>,
    enq: usize,
    deq: usize,
    mode: RenameMode,
    decode_width: usize,
    retire_width: usize,
    phase: PhaseFlag,
    read_pc_port: Port,
    read_old_port: Port,
    read_free_port: Port,
    read_status_port: Port,
    accept_port: Port,
    complete_port: Port,
    except_port: Port,
    retire_port: Port,
}

impl ActiveList {
    /// Create and reset the list for the given configuration.
    pub fn new(cfg: &Config, phase: PhaseFlag) -> Self {
        tracing::debug!(
            degree = cfg.ooo_degree,
            completes = cfg.execute_width,
            dris = cfg.dris_checker,
            "active list port limits"
        );
        let mut list = Self {
            entries: vec![ActiveListEntry::default(); cfg.ooo_degree],
            dris: cfg
                .dris_checker
                .then(|| vec![DrisEntry::default(); cfg.ooo_degree]),
            enq_stack: vec![0; cfg.speculate_depth],
            enq: 0,
            deq: 0,
            mode: cfg.rename,
            decode_width: cfg.decode_width,
            retire_width: cfg.retire_width,
            phase,
            read_pc_port: Port::new("activelist", "read_pc", 1),
            read_old_port: Port::new("activelist", "read_old", 1),
            read_free_port: Port::new("activelist", "read_free", 1),
            read_status_port: Port::new("activelist", "read_status", 1),
            accept_port: Port::new("activelist", "accept", 1),
            complete_port: Port::new("activelist", "complete", cfg.execute_width),
            except_port: Port::new("activelist", "except", cfg.execute_width),
            retire_port: Port::new("activelist", "retire", 1),
        };
        list.reset();
        list
    }

    fn degree(&self) -> usize {
        self.entries.len()
    }

    /// Occupied entry count, derived from the colored pointers.
    fn size(&self) -> usize {
        let n = self.degree();
        let (enq_color, enq_idx) = (self.enq / n, self.enq % n);
        let (deq_color, deq_idx) = (self.deq / n, self.deq % n);
        assert!(enq_color <= 1 && deq_color <= 1);

        if enq_color == deq_color {
            enq_idx - deq_idx
        } else {
            enq_idx + n - deq_idx
        }
    }

    /// Whether `old` is strictly older than `young` (colored comparison).
    fn is_older(&self, young: usize, old: usize) -> bool {
        let n = self.degree();
        let (old_color, old_idx) = (old / n, old % n);
        let (young_color, young_idx) = (young / n, young % n);
        assert!(old_color <= 1 && young_color <= 1);

        if old_color == young_color {
            young_idx > old_idx
        } else {
            young_idx <= old_idx
        }
    }

    /// Query: the serial stamp stored at an entry.
    pub fn pc_of(&self, atag: usize) -> Serial {
        self.phase.assert_query("activelist");
        self.read_pc_port.use_one();

        let n = self.degree();
        match self.mode {
            RenameMode::Rob => assert!(atag < 2 * n),
            RenameMode::Physical => assert!(atag < n),
        }
        let entry = &self.entries[atag % n];
        assert_eq!(entry.pc_like, entry.cookie.serial);
        entry.pc_like
    }

    /// Query: the serial of the faulting head entry (fetch redirect target).
    pub fn exception_pc(&self) -> Serial {
        self.phase.assert_query("activelist");
        let head = &self.entries[self.deq % self.degree()];
        assert!(head.completed);
        assert!(head.exception);
        self.pc_of(self.deq % self.degree())
    }

    /// Query (physical rename): the youngest up-to-one-decode-bundle of
    /// `(tdOld, rd)` pairs, consumed by one serial exception-unwind step.
    pub fn unmap_log(&self) -> UnmapBundle {
        self.phase.assert_query("activelist");
        self.read_old_port.use_one();
        assert!(self.size() <= self.degree());

        let n = self.degree();
        let howmany = self.size().min(self.decode_width);
        let mut bundle = UnmapBundle {
            howmany,
            td_old: vec![RenameTag::zero(self.mode); self.decode_width],
            rd: vec![0; self.decode_width],
        };

        let mut j = self.enq;
        for i in 0..howmany {
            j = (j + 2 * n - 1) % (2 * n);
            bundle.td_old[i] = self.entries[j % n].td_old;
            bundle.rd[i] = self.entries[j % n].rd;
        }
        bundle
    }

    /// Query: destination tags (and matching list indices) for up to one
    /// decode bundle of new instructions.
    pub fn free_regs(&self) -> FreeRegBundle {
        self.phase.assert_query("activelist");
        self.read_free_port.use_one();
        assert!(self.size() <= self.degree());

        let n = self.degree();
        let remaining = n - self.size();
        let howmany = remaining.min(self.decode_width);
        let mut bundle = FreeRegBundle::empty(self.mode, self.decode_width);
        bundle.howmany = howmany;

        let mut j = self.enq;
        for i in 0..howmany {
            match self.mode {
                RenameMode::Rob => {
                    bundle.free[i] = RenameTag::Reorder(j % n);
                    bundle.atag[i] = j % (2 * n);
                }
                RenameMode::Physical => {
                    bundle.free[i] = self.entries[j % n].td_new;
                    bundle.atag[i] = j % n;
                }
            }
            j = (j + 1) % (2 * n);
        }
        bundle
    }

    /// Query: the oldest run of completed, non-faulting entries, up to the
    /// retire width. Stops at the first incomplete or faulting entry.
    ///
    /// In ROB-rename mode the bundle names each retiring slot's tag and
    /// destination; the orchestrator reads the values out of the register
    /// file before committing the retirement.
    pub fn to_retire(&self) -> RetireBundle {
        self.phase.assert_query("activelist");

        let n = self.degree();
        let mut bundle = RetireBundle::empty(self.mode, self.retire_width);
        let mut howmany = 0;

        let mut j = self.deq;
        for i in 0..self.retire_width {
            if j == self.enq {
                break;
            }
            let entry = &self.entries[j % n];
            if !entry.completed || entry.exception {
                break;
            }

            match self.mode {
                RenameMode::Rob => {
                    bundle.rd[i] = entry.rd;
                    bundle.td[i] = if entry.rd != 0 {
                        RenameTag::Reorder(j % n)
                    } else {
                        RenameTag::zero(self.mode)
                    };
                    bundle.cookie[i] = entry.cookie;
                }
                RenameMode::Physical => {
                    bundle.td[i] = entry.td_old;
                    bundle.cookie[i] = entry.cookie;
                }
            }

            howmany += 1;
            j = (j + 1) % (2 * n);
        }

        bundle.howmany = howmany;
        assert!(howmany <= self.retire_width);
        assert!(self.size() >= howmany);
        bundle
    }

    /// Query: is the head entry a completed, faulting instruction?
    pub fn handle_exception(&self) -> bool {
        self.phase.assert_query("activelist");
        self.read_status_port.use_one();

        if self.deq == self.enq {
            return false;
        }
        let head = &self.entries[self.deq % self.degree()];
        head.completed && head.exception
    }

    /// Action: insert one accepted decode bundle at the enqueue pointer.
    pub fn accept(
        &mut self,
        howmany: usize,
        insts: &[Instruction],
        pc_like: &[Serial],
        renamed: &RenameBundle,
        cookies: &[Cookie],
    ) {
        self.phase.assert_action("activelist");
        self.accept_port.use_one();
        assert!(
            howmany <= self.degree() - self.size(),
            "activelist: accepting {howmany} into {} free slots",
            self.degree() - self.size()
        );

        let n = self.degree();
        let mut j = self.enq;
        for i in 0..howmany {
            let entry = &mut self.entries[j % n];
            entry.completed = false;
            entry.exception = false;
            entry.pc_like = pc_like[i];
            entry.rd = insts[i].rd;
            if self.mode == RenameMode::Physical {
                entry.td_old = renamed.td_old[i];
            }
            entry.cookie = cookies[i];
            assert_eq!(entry.pc_like, entry.cookie.serial);

            if self.dris.is_some() {
                self.dris_accept(j, &insts[i], renamed, i);
            }

            j = (j + 1) % (2 * n);
        }

        self.enq = (self.enq + howmany) % (2 * n);
    }

    /// Recompute rename decisions centrally for one accepted entry and
    /// assert parity with the distributed rename map.
    fn dris_accept(&mut self, j: usize, inst: &Instruction, renamed: &RenameBundle, lane: usize) {
        let n = self.degree();
        let mut d = DrisEntry {
            rs1: inst.rs1,
            rs2: inst.rs2,
            td: if inst.rd != 0 {
                DrisTag::Rob(j)
            } else {
                DrisTag::Arch(0)
            },
            ts1: DrisTag::Arch(inst.rs1),
            ts2: DrisTag::Arch(inst.rs2),
            issued: false,
            ts1_rdy: true,
            ts2_rdy: true,
        };

        let dris = self.dris.as_ref().expect("dris enabled");
        if inst.rs1 != 0 {
            let mut k = j;
            while k != self.deq {
                k = (k + 2 * n - 1) % (2 * n);
                if inst.rs1 == self.entries[k % n].rd {
                    d.ts1 = dris[k % n].td;
                    // Ready when issued: the ALU is single-cycle with
                    // forwarding.
                    d.ts1_rdy = dris[k % n].issued;
                    break;
                }
            }
        }
        if inst.rs2 != 0 {
            let mut k = j;
            while k != self.deq {
                k = (k + 2 * n - 1) % (2 * n);
                if inst.rs2 == self.entries[k % n].rd {
                    d.ts2 = dris[k % n].td;
                    d.ts2_rdy = dris[k % n].issued;
                    break;
                }
            }
        }

        assert!(
            dris_idx_equal(d.td, renamed.op[lane].td, n),
            "dris: rename td mismatch at lane {lane}"
        );
        assert!(
            dris_idx_equal(d.ts1, renamed.op[lane].ts1, n),
            "dris: rename ts1 mismatch at lane {lane}"
        );
        assert!(
            dris_idx_equal(d.ts2, renamed.op[lane].ts2, n),
            "dris: rename ts2 mismatch at lane {lane}"
        );

        self.dris.as_mut().expect("dris enabled")[j % n] = d;
    }

    /// Cross-check one issued instruction against the centralized shadow,
    /// then replay its wake-up effect centrally.
    pub fn check_issue(&mut self, issue: &InstQEntry) {
        let n = self.degree();
        assert!(issue.valid);
        assert!(self.is_older(self.enq, issue.atag));
        assert!(!self.is_older(self.deq, issue.atag));

        let d = self.dris.as_ref().expect("dris enabled")[issue.atag % n];
        let entry_rd = self.entries[issue.atag % n].rd;

        if self.is_older(self.deq, d.ts1.index()) {
            // Producer already retired: the operand must have been rewritten
            // to its architectural name.
            assert_eq!(issue.op.ts1, RenameTag::Architectural(d.rs1));
        } else {
            assert!(dris_idx_equal(d.ts1, issue.op.ts1, n));
        }
        if self.is_older(self.deq, d.ts2.index()) {
            assert_eq!(issue.op.ts2, RenameTag::Architectural(d.rs2));
        } else {
            assert!(dris_idx_equal(d.ts2, issue.op.ts2, n));
        }
        assert!(d.ts1_rdy, "dris: issue with ts1 not ready");
        assert!(d.ts2_rdy, "dris: issue with ts2 not ready");

        let dris = self.dris.as_mut().expect("dris enabled");
        let mut k = self.enq;
        while k != self.deq {
            k = (k + 2 * n - 1) % (2 * n);
            if entry_rd != 0 && dris[k % n].ts1 == d.td {
                assert!(!dris[k % n].ts1_rdy);
                dris[k % n].ts1_rdy = true;
            }
        }
        let mut k = self.enq;
        while k != self.deq {
            k = (k + 2 * n - 1) % (2 * n);
            if entry_rd != 0 && dris[k % n].ts2 == d.td {
                assert!(!dris[k % n].ts2_rdy);
                dris[k % n].ts2_rdy = true;
            }
        }

        let d = &mut self.dris.as_mut().expect("dris enabled")[issue.atag % n];
        assert!(!d.issued, "dris: double issue");
        d.issued = true;
    }

    /// Action: mark an entry's execution complete.
    pub fn complete(&mut self, atag: usize) {
        self.phase.assert_action("activelist");
        self.complete_port.use_one();

        let n = self.degree();
        let entry = &mut self.entries[atag % n];
        assert!(!entry.completed, "activelist: double completion");
        entry.completed = true;

        if let Some(dris) = &self.dris {
            assert!(dris[atag % n].issued, "dris: completion before issue");
        }
    }

    /// Action: mark an entry as faulting.
    pub fn mark_exception(&mut self, atag: usize) {
        self.phase.assert_action("activelist");
        self.except_port.use_one();

        let degree = self.degree();
        let entry = &mut self.entries[atag % degree];
        assert!(!entry.exception);
        entry.exception = true;
    }

    /// Action: commit one retirement bundle, advancing the dequeue pointer.
    pub fn retire(&mut self, bundle: &RetireBundle) {
        self.phase.assert_action("activelist");
        self.retire_port.use_one();
        assert!(bundle.howmany <= self.retire_width);
        assert!(self.size() >= bundle.howmany);

        let n = self.degree();
        let mut j = self.deq;
        for i in 0..bundle.howmany {
            assert!(j != self.enq);
            let entry = &mut self.entries[j % n];
            assert!(entry.completed && !entry.exception);

            if self.mode == RenameMode::Physical {
                // Recycle the freed previous mapping through this slot.
                entry.td_new = bundle.td[i];
            }
            trace_stage("retire", &entry.cookie.op, &entry.cookie);

            j = (j + 1) % (2 * n);
        }

        self.deq = (self.deq + bundle.howmany) % (2 * n);
    }

    /// Action (physical rename): snapshot the enqueue pointer under a
    /// branch checkpoint slot.
    pub fn checkpoint(&mut self, slot: usize) {
        self.phase.assert_action("activelist");
        assert!(slot < self.enq_stack.len());
        self.enq_stack[slot] = self.enq;
    }

    /// Action (ROB rename): squash everything younger than the entry;
    /// the enqueue pointer lands just past it.
    pub fn rewind_after(&mut self, atag: usize) {
        self.phase.assert_action("activelist");
        let n = self.degree();
        assert!(atag < 2 * n);
        self.enq = (atag + 1) % (2 * n);
    }

    /// Action (physical rename): restore the enqueue pointer snapshot of a
    /// mispredicted branch.
    pub fn rewind_to_checkpoint(&mut self, slot: usize) {
        self.phase.assert_action("activelist");
        assert!(slot < self.enq_stack.len());
        self.enq = self.enq_stack[slot];
    }

    /// Action (physical rename): walk the enqueue pointer back by one
    /// unwind bundle, youngest first.
    pub fn unwind(&mut self, howmany: usize) {
        self.phase.assert_action("activelist");
        assert!(self.size() <= self.degree());
        assert!(self.size() >= howmany);

        let n = self.degree();
        self.enq = (self.enq + 2 * n - howmany) % (2 * n);
        assert!(self.size() <= self.degree());
    }

    /// Debug introspection: occupied entry count.
    pub fn peek_size(&self) -> usize {
        self.size()
    }

    /// Empty the list; physical rename pre-populates the recycled free tags.
    pub fn reset(&mut self) {
        self.begin_cycle();
        if self.mode == RenameMode::Physical {
            for (i, entry) in self.entries.iter_mut().enumerate() {
                entry.td_new = RenameTag::Physical(NUM_LOGICAL_REG + i);
            }
        }
        self.enq = 0;
        self.deq = 0;
    }

    /// Rearm the per-cycle port counters.
    pub fn begin_cycle(&self) {
        self.read_pc_port.reset();
        self.read_old_port.reset();
        self.read_free_port.reset();
        self.read_status_port.reset();
        self.accept_port.reset();
        self.complete_port.reset();
        self.except_port.reset();
        self.retire_port.reset();
    }
}

/// Checker tag parity: same mapped-ness, same index modulo the list degree.
fn dris_idx_equal(a: DrisTag, b: RenameTag, n: usize) -> bool {
    match (a, b) {
        (DrisTag::Rob(x), RenameTag::Reorder(y)) => x % n == y % n,
        (DrisTag::Arch(x), RenameTag::Architectural(y)) => x % n == y % n,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn physical() -> (ActiveList, PhaseFlag) {
        let phase = PhaseFlag::new();
        let list = ActiveList::new(&Config::default(), phase.clone());
        (list, phase)
    }

    fn rob() -> (ActiveList, PhaseFlag) {
        let phase = PhaseFlag::new();
        let cfg = Config {
            rename: RenameMode::Rob,
            ..Config::default()
        };
        let list = ActiveList::new(&cfg, phase.clone());
        (list, phase)
    }

    fn bundle_of(insts: &[Instruction], base_serial: u64, width: usize) -> (Vec<Serial>, Vec<Cookie>) {
        let mut pcs = vec![0; width];
        let mut cookies = vec![Cookie::default(); width];
        for (i, inst) in insts.iter().enumerate() {
            pcs[i] = base_serial + i as u64;
            cookies[i] = Cookie {
                serial: pcs[i],
                inst: *inst,
                ..Cookie::default()
            };
        }
        (pcs, cookies)
    }

    fn accept_adds(list: &mut ActiveList, n: usize, base_serial: u64) {
        let cfg = Config::default();
        let insts: Vec<Instruction> = (0..n).map(|i| Instruction::add(1 + i % 4, 1, 2)).collect();
        let (pcs, cookies) = bundle_of(&insts, base_serial, cfg.decode_width);
        let renamed = RenameBundle::empty(list.mode, cfg.decode_width);
        list.accept(n, &insts, &pcs, &renamed, &cookies);
    }

    #[test]
    fn test_free_regs_shrink_as_list_fills() {
        let (mut list, phase) = physical();
        phase.begin_cycle();
        let free = list.free_regs();
        assert_eq!(free.howmany, 4);
        assert_eq!(free.free[0], RenameTag::Physical(NUM_LOGICAL_REG));
        assert_eq!(free.atag[0], 0);

        phase.commit();
        for i in 0..7 {
            list.begin_cycle();
            accept_adds(&mut list, 4, i * 4);
        }
        assert_eq!(list.peek_size(), 28);

        list.begin_cycle();
        accept_adds(&mut list, 4, 28);
        phase.begin_cycle();
        assert_eq!(list.free_regs().howmany, 0, "full list offers nothing");
    }

    #[test]
    fn test_retire_stops_at_incomplete() {
        let (mut list, phase) = physical();
        accept_adds(&mut list, 3, 0);
        list.complete(0);
        list.complete(2);

        phase.begin_cycle();
        let bundle = list.to_retire();
        assert_eq!(bundle.howmany, 1, "entry 1 is incomplete");

        phase.commit();
        list.retire(&bundle);
        assert_eq!(list.peek_size(), 2);
    }

    #[test]
    fn test_retire_stops_at_exception() {
        let (mut list, phase) = physical();
        accept_adds(&mut list, 2, 0);
        list.complete(0);
        list.complete(1);
        list.mark_exception(1);

        phase.begin_cycle();
        assert_eq!(list.to_retire().howmany, 1);
        assert!(!list.handle_exception(), "fault not at head yet");
    }

    #[test]
    fn test_handle_exception_at_head() {
        let (mut list, phase) = rob();
        accept_adds(&mut list, 1, 7);
        list.complete(0);
        list.mark_exception(0);

        phase.begin_cycle();
        assert!(list.handle_exception());
        assert_eq!(list.exception_pc(), 7);
    }

    #[test]
    fn test_checkpoint_rewind_restores_enqueue() {
        let (mut list, _phase) = physical();
        accept_adds(&mut list, 2, 0);
        list.checkpoint(1);
        list.begin_cycle();
        accept_adds(&mut list, 3, 2);
        assert_eq!(list.peek_size(), 5);

        list.rewind_to_checkpoint(1);
        assert_eq!(list.peek_size(), 2);
    }

    #[test]
    fn test_rob_rewind_lands_after_branch() {
        let (mut list, _phase) = rob();
        accept_adds(&mut list, 4, 0);
        list.rewind_after(1);
        assert_eq!(list.peek_size(), 2, "entries after atag 1 squashed");
    }

    #[test]
    fn test_unmap_log_is_youngest_first() {
        let (mut list, phase) = physical();
        let insts = [Instruction::add(3, 1, 2), Instruction::add(5, 1, 2)];
        let (pcs, cookies) = bundle_of(&insts, 0, 4);
        let mut renamed = RenameBundle::empty(RenameMode::Physical, 4);
        renamed.td_old[0] = RenameTag::Physical(3);
        renamed.td_old[1] = RenameTag::Physical(5);
        list.accept(2, &insts, &pcs, &renamed, &cookies);

        phase.begin_cycle();
        let log = list.unmap_log();
        assert_eq!(log.howmany, 2);
        assert_eq!(log.rd[0], 5, "youngest first");
        assert_eq!(log.td_old[0], RenameTag::Physical(5));
        assert_eq!(log.rd[1], 3);

        phase.commit();
        list.unwind(log.howmany);
        assert_eq!(list.peek_size(), 0);
    }

    #[test]
    fn test_free_tag_recycling_through_retirement() {
        let (mut list, phase) = physical();
        let insts = [Instruction::add(3, 1, 2)];
        let (pcs, cookies) = bundle_of(&insts, 0, 4);
        let mut renamed = RenameBundle::empty(RenameMode::Physical, 4);
        renamed.td_old[0] = RenameTag::Physical(3);
        list.accept(1, &insts, &pcs, &renamed, &cookies);
        list.complete(0);

        phase.begin_cycle();
        let bundle = list.to_retire();
        assert_eq!(bundle.td[0], RenameTag::Physical(3));

        phase.commit();
        list.retire(&bundle);

        // After a full wrap, slot 0's free tag is the recycled one.
        let mut wrapped = false;
        for i in 0..31 {
            list.begin_cycle();
            accept_adds(&mut list, 1, 1 + i);
            wrapped = true;
        }
        assert!(wrapped);
        phase.begin_cycle();
        let free = list.free_regs();
        assert_eq!(free.free[0], RenameTag::Physical(3));
    }

    #[test]
    #[should_panic(expected = "double completion")]
    fn test_double_complete_rejected() {
        let (mut list, _phase) = physical();
        accept_adds(&mut list, 1, 0);
        list.complete(0);
        list.begin_cycle();
        list.complete(0);
    }

    #[test]
    fn test_wraparound_pointer_color() {
        let (mut list, phase) = rob();
        // Fill and drain repeatedly to cross the color boundary. Bundles of
        // three keep each round within the execute-width complete ports.
        for round in 0..40u64 {
            list.begin_cycle();
            accept_adds(&mut list, 3, round * 3);
            for lane in 0..3 {
                list.complete((round as usize * 3 + lane) % 64);
            }
            phase.begin_cycle();
            let bundle = list.to_retire();
            assert_eq!(bundle.howmany, 3);
            phase.commit();
            list.retire(&bundle);
            assert_eq!(list.peek_size(), 0);
        }
    }
}
