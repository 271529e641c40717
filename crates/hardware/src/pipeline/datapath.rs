//! Per-cycle datapath orchestrator.
//!
//! One call to [`Datapath::cycle`] advances the whole out-of-order machine
//! by one clock. The modeled pipeline has seven stages (Fetch is external):
//!
//! ```text
//! 1 Fetch     external to the datapath
//! 2 Map       instructions renamed and entered into the active list
//! 3 Dispatch  renamed instructions enter the instruction queues
//! 4 Issue     readied instructions are scheduled out of the queues
//! 5 Operand   operands fetched from the register file (or forwarded)
//! 6 Execute   branches resolve, exceptions are detected, results write back
//! 7 Retire    oldest completed instructions leave in program order
//! ```
//!
//! Stages 4 and 5 can be cascaded combinationally, as in the R10K, via
//! `Config::cascade_issue_operand`. A nominal Stage 0 carries the global
//! signals, most importantly the precise-exception restart sequence.
//!
//! A cycle runs in two parts. The first generates every combinational
//! signal: only component *queries* may run, and all of them observe the
//! state at the start of the cycle. Forwarded updates are layered onto
//! shadow copies of the pipeline latches rather than mutated in place. The
//! second part commits: component *actions* apply the state changes and the
//! pipeline registers latch. The shared [`PhaseFlag`] enforces the split.
//!
//! Misprediction recovery takes one cycle through the rewind masks
//! broadcast at Execute. Exception recovery freezes acceptance and walks
//! the rename state back to the precise point: serially over several
//! cycles with physical-file renaming, in a single cycle with ROB renaming.

use crate::common::{PhaseFlag, RenameTag, SpeculateMask};
use crate::config::{Config, RenameMode};
use crate::fetch::FetchBundle;
use crate::golden::Cookie;
use crate::isa::{DataValue, LogicalReg, Opcode, Serial};
use crate::pipeline::active_list::ActiveList;
use crate::pipeline::alu::{Alu, AluOut};
use crate::pipeline::busy::BusyTable;
use crate::pipeline::checkpoint::Checkpoint;
use crate::pipeline::exception::ExceptionTracker;
use crate::pipeline::instq::{InstQ, InstQEntry};
use crate::pipeline::latches::{FreeRegBundle, RenameBundle};
use crate::pipeline::regfile::RegFile;
use crate::pipeline::rmap::RenameMap;
use crate::pipeline::trace_stage;
use crate::stats::{RetiredInst, SimStats};

/// Observable outputs of one cycle.
#[derive(Clone, Copy, Debug, Default)]
pub struct CycleOutput {
    /// Number of fetch-bundle lanes accepted this cycle.
    pub accept: usize,
    /// The datapath requests a misprediction redirect.
    pub rewind: bool,
    /// The datapath requests an exception restart redirect.
    pub restart: bool,
    /// Redirect target (meaningful with `rewind` or `restart`).
    pub goto_pc: Option<Serial>,
}

/// The out-of-order datapath.
#[derive(Debug)]
pub struct Datapath {
    cfg: Config,
    phase: PhaseFlag,

    /// Active list (reorder buffer).
    pub active_list: ActiveList,
    /// Execution lanes.
    pub alus: Vec<Alu>,
    /// Busy table.
    pub busy: BusyTable,
    /// Branch checkpoint allocator.
    pub checkpoint: Checkpoint,
    /// Pending-exception tracker.
    pub exception: ExceptionTracker,
    /// Per-lane instruction queues.
    pub instq: Vec<InstQ>,
    /// Physical register file.
    pub rf: RegFile,
    /// Rename map.
    pub rmap: RenameMap,

    // Pipeline registers. The `_r` suffix marks state latched for the next
    // cycle; everything else inside `cycle` is a combinational signal.
    handle_exception_r: bool,
    redirect_pc_r: Option<Serial>,
    fetch_r: FetchBundle,
    renamed_r: RenameBundle,
    free_r: FreeRegBundle,
    num_to_dispatch_r: usize,
    has_br_r: bool,
    operand_r: Vec<InstQEntry>,
    execute_r: Vec<InstQEntry>,
    vs1_r: Vec<DataValue>,
    vs2_r: Vec<DataValue>,

    /// Per-run statistics and the retirement log.
    pub stats: SimStats,
}

impl Datapath {
    /// Build a freshly reset datapath.
    ///
    /// # Panics
    ///
    /// On a structurally invalid configuration; validate first to surface
    /// the error gracefully.
    pub fn new(cfg: &Config) -> Self {
        if let Err(e) = cfg.validate() {
            panic!("datapath: invalid configuration: {e}");
        }

        let phase = PhaseFlag::new();
        let w = cfg.execute_width;
        Self {
            active_list: ActiveList::new(cfg, phase.clone()),
            alus: (0..w).map(|_| Alu::new()).collect(),
            busy: BusyTable::new(cfg, phase.clone()),
            checkpoint: Checkpoint::new(cfg, phase.clone()),
            exception: ExceptionTracker::new(phase.clone()),
            instq: (0..w).map(|lane| InstQ::new(cfg, lane, phase.clone())).collect(),
            rf: RegFile::new(cfg, phase.clone()),
            rmap: RenameMap::new(cfg, phase.clone()),
            handle_exception_r: false,
            redirect_pc_r: None,
            fetch_r: FetchBundle::empty(cfg.decode_width),
            renamed_r: RenameBundle::empty(cfg.rename, cfg.decode_width),
            free_r: FreeRegBundle::empty(cfg.rename, cfg.decode_width),
            num_to_dispatch_r: 0,
            has_br_r: false,
            operand_r: vec![InstQEntry::invalid(); w],
            execute_r: vec![InstQEntry::invalid(); w],
            vs1_r: vec![0; w],
            vs2_r: vec![0; w],
            stats: SimStats::default(),
            cfg: *cfg,
            phase,
        }
    }

    /// Architectural register value, for quiesced-state inspection.
    pub fn arch_reg(&self, l: LogicalReg) -> DataValue {
        match self.cfg.rename {
            RenameMode::Rob => self.rf.peek(l),
            RenameMode::Physical => self.rf.peek(self.rmap.peek(l).preg_index()),
        }
    }

    /// Inflight instruction count (active-list occupancy).
    pub fn inflight(&self) -> usize {
        self.active_list.peek_size()
    }

    fn begin_cycle(&mut self) {
        self.stats.cycles += 1;
        self.phase.begin_cycle();
        self.active_list.begin_cycle();
        self.busy.begin_cycle();
        self.checkpoint.begin_cycle();
        self.exception.begin_cycle();
        for q in &self.instq {
            q.begin_cycle();
        }
        self.rf.begin_cycle();
        self.rmap.begin_cycle();
    }

    /// Advance the datapath by one cycle.
    pub fn cycle(&mut self, input: &FetchBundle) -> CycleOutput {
        let w_exec = self.cfg.execute_width;
        let w_dec = self.cfg.decode_width;
        let rob_mode = self.cfg.rename == RenameMode::Rob;
        let cascade = self.cfg.cascade_issue_operand;

        self.begin_cycle();
        let mut out = CycleOutput::default();

        //
        // Combinational phase: queries only, forwarding onto shadow copies.
        //

        // Stage 0: global signals.
        let exception_pending = self.exception.pending();
        let handle_exception = self.active_list.handle_exception();
        let depend_on_mask = self.checkpoint.mask();
        let (ground_mask, unmap_bundle) = if rob_mode {
            (SpeculateMask::EMPTY, None)
        } else {
            (self.checkpoint.ground(), Some(self.active_list.unmap_log()))
        };

        if handle_exception {
            assert!(exception_pending, "faulting head without a pending exception");
        }

        let mut redirect_pc = None;
        if handle_exception {
            // Only meaningful in the last cycle of the unwind.
            redirect_pc = Some(self.active_list.exception_pc());
        } else if self.execute_r[0].valid {
            // Looked up in case lane 0 resolves a mispredicted branch. Safe
            // to read without decoding: only lane 0 handles branches.
            redirect_pc = Some(self.active_list.pc_of(self.execute_r[0].atag));
        }

        out.goto_pc = if self.handle_exception_r {
            self.redirect_pc_r
        } else {
            redirect_pc
        };

        // Stage 2 Map: how many instructions can be renamed this cycle?
        let mut fetch = input.clone();
        assert!(fetch.inst.len() == w_dec, "fetch bundle width mismatch");

        let free_bundle = self.active_list.free_regs();
        let mut num_to_rename = w_dec.min(fetch.howmany).min(free_bundle.howmany);

        let mut instq_free = vec![0usize; w_exec];
        let mut free_total: isize = 0;
        for (i, q) in self.instq.iter().enumerate() {
            instq_free[i] = q.num_slots();
            free_total += instq_free[i] as isize;
        }
        free_total -= self.num_to_dispatch_r as isize;
        num_to_rename = num_to_rename.min(free_total.max(0) as usize);

        // One branch per cycle, and it closes the bundle: only lane 0 can
        // execute a BEQ, and the rewind stack checkpoints one map per cycle.
        let mut has_br = false;
        for i in 0..num_to_rename {
            if fetch.inst[i].opcode == Opcode::Beq {
                num_to_rename = i + 1;
                has_br = true;
                break;
            }
        }

        if has_br {
            // The branch needs a lane-0 queue slot (beyond one reserved for
            // a branch already heading to dispatch) and a free checkpoint.
            let reserved = 1 + usize::from(self.has_br_r);
            if instq_free[0] < reserved || !self.checkpoint.has_free() {
                has_br = false;
                assert!(num_to_rename > 0);
                num_to_rename -= 1;
            }
        }

        let new_checkpoint = if has_br { self.checkpoint.next_free() } else { 0 };

        // Rename the accepted group.
        let mut renamed = self
            .rmap
            .get_map_bundle(num_to_rename, &fetch.inst, &free_bundle.free);
        for i in 0..w_dec {
            renamed.op[i].opcode = fetch.inst[i].opcode;
            renamed.op[i].pred_taken = fetch.pred_taken[i];
            renamed.op[i].oparity = fetch.oparity[i];
            // Only the branch lane cares about the checkpoint slot.
            renamed.op[i].checkpoint = new_checkpoint;
            renamed.op[i].depend_on = depend_on_mask;
        }
        if has_br {
            assert!(num_to_rename > 0);
            assert_eq!(fetch.inst[num_to_rename - 1].opcode, Opcode::Beq);
        }

        // Stage 3 Dispatch: operand busy status for last cycle's renames.
        let mut ts1_busy = vec![false; w_dec];
        let mut ts2_busy = vec![false; w_dec];
        for i in 0..w_dec {
            ts1_busy[i] = self.busy.is_busy(self.renamed_r.op[i].ts1.preg_index());
            ts2_busy[i] = self.busy.is_busy(self.renamed_r.op[i].ts2.preg_index());
        }

        // Stage 4 Issue: each queue offers one readied instruction.
        let mut issue: Vec<InstQEntry> = self.instq.iter_mut().map(InstQ::readied).collect();

        // With cascaded issue/operand the operand latch does not exist; the
        // selected instructions fetch operands in the same cycle.
        let operand_now: Vec<InstQEntry> = if cascade {
            issue.clone()
        } else {
            self.operand_r.clone()
        };

        // Stage 5 Operand Fetch (subject to forwarding below).
        let mut vs1 = vec![0; w_exec];
        let mut vs2 = vec![0; w_exec];
        for i in 0..w_exec {
            if operand_now[i].valid {
                trace_stage("operand", &operand_now[i].op, &operand_now[i].cookie);
            }
            vs1[i] = self.rf.read(operand_now[i].op.ts1.preg_index());
            vs2[i] = self.rf.read(operand_now[i].op.ts2.preg_index());
        }

        // Stage 6 Execute.
        let mut alu_out = vec![AluOut::default(); w_exec];
        let mut has_exception = vec![false; w_exec];
        let mut exception_depend = vec![SpeculateMask::EMPTY; w_exec];
        let mut exception_cookie = vec![Cookie::default(); w_exec];
        let mut rewind_mask = SpeculateMask::EMPTY;
        let mut free_mask = SpeculateMask::EMPTY;
        let mut branch_cookie = Cookie::default();

        for i in 0..w_exec {
            let e = &self.execute_r[i];
            alu_out[i] = self.alus[i].execute(e.valid, &e.op, self.vs1_r[i], self.vs2_r[i], &e.cookie);

            if alu_out[i].is_br {
                assert_eq!(i, 0, "branch executed outside lane 0");
                branch_cookie = e.cookie;
                if alu_out[i].is_mispredict {
                    assert!(e.cookie.inst.miss);
                    rewind_mask.set(e.op.checkpoint);
                } else {
                    assert!(!e.cookie.inst.miss);
                    free_mask.set(e.op.checkpoint);
                }
            }

            if alu_out[i].is_exception {
                assert!(e.cookie.inst.exception);
                has_exception[i] = true;
                exception_depend[i] = e.op.depend_on;
                exception_cookie[i] = e.cookie;
            }
        }
        assert!(
            rewind_mask.count() + free_mask.count() <= 1,
            "more than one branch resolved in one cycle"
        );

        // Stage 7 Retire: ask the active list for the oldest completed run.
        let mut retire = self.active_list.to_retire();
        if rob_mode {
            // Retiring values move from the list slots to the architectural
            // file; read them now and check them against the golden record.
            for i in 0..self.cfg.retire_width {
                let td = retire.td[i];
                retire.val[i] = self.rf.read(td.preg_index());
                if i < retire.howmany {
                    let cookie = &retire.cookie[i];
                    assert_eq!(td, cookie.op.td);
                    if td.is_zero() {
                        assert_eq!(retire.val[i], 0);
                    } else {
                        assert_eq!(
                            retire.val[i], cookie.vd,
                            "retiring value diverges from golden at s{}",
                            cookie.serial
                        );
                    }
                }
            }
        }

        //
        // Forwarding: layered onto shadow copies of the latched bundles,
        // never onto the latches themselves.
        //
        let mut renamed3 = self.renamed_r.clone();
        let mut operand5 = operand_now.clone();
        let mut execute6 = self.execute_r.clone();

        // Stage-4 issues resolve RAW dependences for instructions in
        // Dispatch that read stale busy bits this cycle.
        for i in 0..w_exec {
            if issue[i].valid && !issue[i].op.td.is_zero() {
                for j in 0..w_dec {
                    if issue[i].op.td == self.renamed_r.op[j].ts1 {
                        assert!(ts1_busy[j]);
                        ts1_busy[j] = false;
                    }
                    if issue[i].op.td == self.renamed_r.op[j].ts2 {
                        assert!(ts2_busy[j]);
                        ts2_busy[j] = false;
                    }
                }
            }
        }

        // Stage-6 results forward one stage back, to instructions that just
        // fetched operands from the register file. Their wake-up already
        // happened when the producers issued.
        for i in 0..w_exec {
            if self.execute_r[i].valid && !self.execute_r[i].op.td.is_zero() {
                for j in 0..w_exec {
                    if self.execute_r[i].op.td == operand_now[j].op.ts1 {
                        vs1[j] = alu_out[i].vd;
                    }
                    if self.execute_r[i].op.td == operand_now[j].op.ts2 {
                        vs2[j] = alu_out[i].vd;
                    }
                }
            }
        }

        // ROB rename: retirement moves values into the architectural file,
        // so inflight operands holding the retiring slot tags are rewritten
        // to the architectural names, in all three renamed stages.
        if rob_mode {
            for i in 0..retire.howmany {
                let td = retire.td[i];
                if td.is_zero() {
                    continue;
                }
                let ltag = RenameTag::Architectural(retire.rd[i]);

                for j in 0..w_dec {
                    if renamed.op[j].ts1 == td {
                        renamed.op[j].ts1 = ltag;
                    }
                    if renamed.op[j].ts2 == td {
                        renamed.op[j].ts2 = ltag;
                    }
                }
                for j in 0..w_dec {
                    if self.renamed_r.op[j].ts1 == td {
                        renamed3.op[j].ts1 = ltag;
                    }
                    if self.renamed_r.op[j].ts2 == td {
                        renamed3.op[j].ts2 = ltag;
                    }
                }
                for j in 0..w_exec {
                    if issue[j].op.ts1 == td {
                        issue[j].op.ts1 = ltag;
                    }
                    if issue[j].op.ts2 == td {
                        issue[j].op.ts2 = ltag;
                    }
                }
            }
        }

        // Branch resolution broadcast: squash or strip the dependence bit
        // on every inflight overlay.
        for i in 0..w_exec {
            if has_exception[i] {
                if exception_depend[i].intersects(free_mask) {
                    exception_depend[i].clear(free_mask.sole_slot());
                }
                if exception_depend[i].intersects(rewind_mask) {
                    // Cancelled locally before ever reaching the tracker.
                    has_exception[i] = false;
                }
            }

            if self.execute_r[i].op.depend_on.intersects(rewind_mask) {
                if self.execute_r[i].valid {
                    trace_stage("execute-squash", &self.execute_r[i].op, &self.execute_r[i].cookie);
                }
                execute6[i].valid = false;
            }

            if issue[i].op.depend_on.intersects(rewind_mask) {
                if issue[i].valid {
                    trace_stage("issue-kill", &issue[i].op, &issue[i].cookie);
                }
                issue[i].valid = false;
            }
            if issue[i].op.depend_on.intersects(free_mask) {
                issue[i].op.depend_on.clear(free_mask.sole_slot());
            }

            if !cascade {
                if operand_now[i].op.depend_on.intersects(rewind_mask) {
                    if operand_now[i].valid {
                        trace_stage("operand-squash", &operand_now[i].op, &operand_now[i].cookie);
                    }
                    operand5[i].valid = false;
                }
                if operand_now[i].op.depend_on.intersects(free_mask) {
                    operand5[i].op.depend_on.clear(free_mask.sole_slot());
                }
            }
        }
        if cascade {
            // Collapsed stages share one bundle: the operand shadow is the
            // post-broadcast issue bundle.
            operand5.copy_from_slice(&issue);
        }

        for i in 0..w_dec {
            if renamed.op[i].depend_on.intersects(free_mask) {
                renamed.op[i].depend_on.clear(free_mask.sole_slot());
            }
            if renamed3.op[i].depend_on.intersects(free_mask) {
                renamed3.op[i].depend_on.clear(free_mask.sole_slot());
            }
        }

        //
        // Commit phase: actions only, then the pipeline registers latch.
        //
        self.phase.commit();

        if !(handle_exception || self.handle_exception_r) {
            // Stage 7 Retire.
            self.active_list.retire(&retire);
            if rob_mode {
                for i in 0..retire.howmany {
                    let rd = retire.rd[i];
                    let td = retire.td[i];
                    let val = retire.val[i];
                    let cookie = retire.cookie[i];
                    assert_eq!(rd, cookie.inst.rd);
                    assert_eq!(td, cookie.op.td);
                    if rd != 0 {
                        assert_eq!(val, cookie.vd);
                    }

                    // The retiring value commits to the architectural file.
                    self.rf.write(rd, val);
                    // Drop the mapping if this slot is still the latest.
                    self.rmap.unmap_on_retire(rd, td);
                    // Rewrite stale operand tags still in the queues.
                    let ltag = RenameTag::Architectural(rd);
                    for q in &mut self.instq {
                        q.retire_tag(td, ltag, cookie);
                    }
                }
            }
            for i in 0..retire.howmany {
                let cookie = retire.cookie[i];
                let value = if rob_mode { retire.val[i] } else { cookie.vd };
                self.stats.retired += 1;
                self.stats.retirement_log.push(RetiredInst {
                    cycle: self.stats.cycles,
                    serial: cookie.serial,
                    rd: cookie.inst.rd,
                    value,
                });
            }

            // Stage 6 Execute: writeback and completion status.
            for i in 0..w_exec {
                if execute6[i].valid {
                    trace_stage("execute", &execute6[i].op, &execute6[i].cookie);
                    // Writeback; inert for zero destinations.
                    self.rf.write(execute6[i].op.td.preg_index(), alu_out[i].vd);
                    self.active_list.complete(execute6[i].atag);
                    if has_exception[i] {
                        self.active_list.mark_exception(execute6[i].atag);
                    }
                }
            }

            let mut rewound = false;
            let mut cleared = false;
            for i in 0..w_exec {
                if !alu_out[i].is_br {
                    continue;
                }
                assert_eq!(i, 0);
                self.stats.branches_resolved += 1;

                if alu_out[i].is_mispredict {
                    // Rewind to the checkpointed state, freeing the slot
                    // (and every slot speculated under it) in the process.
                    assert!(execute6[i].cookie.inst.miss);
                    assert!(!rewound);
                    assert!(rewind_mask.is_set_once());
                    rewound = true;

                    match self.cfg.rename {
                        RenameMode::Rob => self.active_list.rewind_after(execute6[i].atag),
                        RenameMode::Physical => {
                            self.active_list.rewind_to_checkpoint(execute6[i].op.checkpoint);
                        }
                    }
                    self.rmap.rewind(execute6[i].op.checkpoint);
                    for q in &mut self.instq {
                        q.squash(rewind_mask, branch_cookie);
                    }
                    self.exception.cancel(rewind_mask, branch_cookie);
                    self.checkpoint.rewind(rewind_mask);

                    self.stats.mispredict_rewinds += 1;
                    out.rewind = true;
                } else {
                    // Confirmed: strip the dependence bit everywhere and
                    // reclaim the slot. The active list and rename map work
                    // off the checkpoint bookkeeping and need no clearing.
                    assert!(!execute6[i].cookie.inst.miss);
                    assert!(!cleared);
                    assert!(free_mask.is_set_once());
                    cleared = true;

                    for q in &mut self.instq {
                        q.clear_mask(free_mask, branch_cookie);
                    }
                    self.exception.clear_mask(free_mask, branch_cookie);
                    self.checkpoint.free(free_mask);
                }
            }

            for i in 0..w_exec {
                if has_exception[i] {
                    // The tracker keeps the less speculative of this and any
                    // already-pending fault.
                    self.exception.raise(exception_depend[i], exception_cookie[i]);
                    self.stats.exceptions_raised += 1;
                }
            }

            if rewind_mask.any() {
                assert!(rewind_mask.is_set_once() && rewound);
            }
            if free_mask.any() {
                assert!(free_mask.is_set_once() && cleared);
            }

            // Stage 4 Issue: schedule, wake up consumers, clear busy bits.
            // Release and clear happen before the producer has executed;
            // the consumer is guaranteed the value by forwarding when it
            // reaches Execute, which is what lets a dependent chain
            // schedule back-to-back.
            for i in 0..w_exec {
                if issue[i].valid {
                    self.instq[i].issue(issue[i].slot_idx);
                    if self.cfg.dris_checker {
                        self.active_list.check_issue(&issue[i]);
                    }
                    for j in 0..w_exec {
                        self.instq[j].release(issue[i].op.td, issue[i].cookie);
                    }
                    self.busy.clear_busy(issue[i].op.td.preg_index());
                }
            }

            // Stage 3 Dispatch: round-robin into the queues. Skipped in a
            // rewind cycle (those instructions never happened); an exception
            // is not a reason to stop; until it is oldest it may itself be
            // speculative.
            if !rewind_mask.any() {
                let mut inserted = vec![0isize; w_exec];
                let mut j = 0usize;
                // Counting down: a branch is the last of its bundle, so it
                // lands in lane 0 without further fuss.
                for i in (0..self.num_to_dispatch_r).rev() {
                    trace_stage("dispatch", &renamed3.op[i], &self.fetch_r.cookie[i]);

                    let mut loopcnt = 0;
                    while inserted[j] == instq_free[j] as isize - isize::from(j == 0 && has_br) {
                        // Lane 0 keeps one slot spare when this cycle's Map
                        // is counting on it for a branch next cycle.
                        j = (j + 1) % w_exec;
                        loopcnt += 1;
                        assert!(loopcnt <= w_exec, "dispatch accounting left no queue slot");
                    }

                    if renamed3.op[i].opcode == Opcode::Beq {
                        assert!(self.has_br_r);
                        assert!(instq_free[0] >= 1 + usize::from(has_br));
                        assert_eq!(i, self.num_to_dispatch_r - 1);
                        assert_eq!(j, 0, "branch must dispatch to lane 0");
                    }

                    self.instq[j].insert(
                        self.free_r.atag[i],
                        renamed3.op[i],
                        ts1_busy[i],
                        ts2_busy[i],
                        self.fetch_r.cookie[i],
                    );
                    inserted[j] += 1;
                    j = (j + 1) % w_exec;
                }
            }

            // Stage 2 Map: accept into the active list and install the new
            // mappings. Frozen while an exception is pending or a rewind is
            // in progress.
            if !(exception_pending || rewind_mask.any()) {
                out.accept = num_to_rename;
                self.stats.accepted += num_to_rename as u64;

                for i in 0..w_dec {
                    fetch.cookie[i].op = renamed.op[i];
                }

                self.active_list.accept(
                    num_to_rename,
                    &fetch.inst,
                    &fetch.pc_like,
                    &renamed,
                    &fetch.cookie,
                );
                self.rmap
                    .set_map_bundle(num_to_rename, &fetch.inst, &free_bundle.free);

                for i in 0..w_dec {
                    // Lanes past the acceptance carry the zero tag, which
                    // the busy table ignores.
                    if i >= num_to_rename {
                        assert!(renamed.op[i].td.is_zero());
                    }
                    self.busy.set_busy(renamed.op[i].td.preg_index());
                }

                if has_br {
                    assert!(num_to_rename > 0);
                    assert_eq!(fetch.inst[num_to_rename - 1].opcode, Opcode::Beq);
                    self.checkpoint.alloc(new_checkpoint);
                    if !rob_mode {
                        self.active_list.checkpoint(new_checkpoint);
                    }
                    self.rmap.checkpoint(new_checkpoint);
                }
            }
        }

        // Stage 0: exception recovery.
        if handle_exception {
            // The oldest instruction is a completed fault: drain, and walk
            // the rename state back to the precise point.
            for q in &mut self.instq {
                q.reset();
            }
            for a in &mut self.alus {
                a.reset();
            }

            if rob_mode {
                // Single cycle: the architectural file already holds the
                // last retired state.
                self.active_list.reset();
                self.rmap.reset();
                self.busy.reset();
                self.checkpoint.reset();
            } else if depend_on_mask.any() {
                // First recover off the oldest branch snapshot, if any.
                assert!(ground_mask.is_set_once());
                self.checkpoint.rewind(ground_mask);
                self.rmap.rewind(ground_mask.sole_slot());
                self.active_list.rewind_to_checkpoint(ground_mask.sole_slot());
            } else {
                // Then walk the mappings back one bundle per cycle,
                // youngest first.
                let unmap = unmap_bundle.as_ref().expect("physical-rename unwind log");
                assert!(unmap.howmany != 0);
                self.rmap.unmap_bundle(unmap.howmany, &unmap.rd, &unmap.td_old);
                self.active_list.unwind(unmap.howmany);
            }
        }

        if self.handle_exception_r && !handle_exception {
            // Last cycle of recovery: request the restart redirect.
            out.restart = true;
            self.stats.restarts += 1;
            self.exception.clear_pending();

            for q in &mut self.instq {
                q.reset();
            }
            for a in &mut self.alus {
                a.reset();
            }
            if rob_mode {
                self.active_list.reset();
                self.rmap.reset();
                self.busy.reset();
                self.checkpoint.reset();
            }
        }

        // Latch the pipeline registers.
        let freeze = handle_exception || self.handle_exception_r;
        for i in 0..w_exec {
            if freeze {
                self.execute_r[i].valid = false;
            } else {
                self.execute_r[i] = operand5[i];
            }
            if !cascade {
                if freeze {
                    self.operand_r[i].valid = false;
                } else {
                    self.operand_r[i] = issue[i];
                }
            }
            self.vs1_r[i] = vs1[i];
            self.vs2_r[i] = vs2[i];
        }

        if !(exception_pending || rewind_mask.any()) {
            self.num_to_dispatch_r = num_to_rename;
            self.free_r = free_bundle;
            self.fetch_r = fetch;
            self.renamed_r = renamed;
            self.has_br_r = has_br;
        } else {
            self.num_to_dispatch_r = 0;
            self.free_r.howmany = 0;
            self.fetch_r.howmany = 0;
            self.renamed_r.howmany = 0;
            self.has_br_r = false;
        }

        self.handle_exception_r = handle_exception;
        self.redirect_pc_r = redirect_pc;

        out
    }
}
