//! Instruction queue (reservation station) with wake-up/select.
//!
//! One queue per ALU lane. Entries wait with per-operand ready bits; each
//! cycle the queue *selects* at most one entry whose operands are both ready
//! (scanning from a rotating or random start, first hit wins) and the
//! orchestrator *wakes up* consumers by broadcasting the issued destination
//! tag to every queue. Wake-up happens at issue, not writeback, so a chain
//! of dependent single-cycle operations schedules back-to-back.
//!
//! Squash and mask-clear are CAM operations over the `dependOn` masks,
//! broadcast when a branch resolves; `retire_tag` (ROB rename) rewrites
//! operand tags whose producer's slot was freed at retirement.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::{PhaseFlag, Port, RenameTag, SpeculateMask};
use crate::config::{Config, ScanPolicy};
use crate::golden::Cookie;
use crate::pipeline::latches::Operation;
use crate::pipeline::trace_stage;

/// One reservation-station slot.
#[derive(Clone, Copy, Debug, Default)]
pub struct InstQEntry {
    /// This entry's slot index (carried so issue can address the slot).
    pub slot_idx: usize,
    /// Whether the slot is occupied.
    pub valid: bool,
    /// Active-list index of the instruction.
    pub atag: usize,
    /// The renamed operation.
    pub op: Operation,
    /// First operand has been produced (or was never pending).
    pub ts1_ready: bool,
    /// Second operand has been produced (or was never pending).
    pub ts2_ready: bool,
    /// Golden-reference cookie.
    pub cookie: Cookie,
}

impl InstQEntry {
    /// The empty stub value.
    pub fn invalid() -> Self {
        Self::default()
    }
}

/// Per-lane scheduler queue.
#[derive(Debug)]
pub struct InstQ {
    lane: usize,
    array: Vec<InstQEntry>,
    in_use: usize,
    scan: usize,
    policy: ScanPolicy,
    rng: StdRng,
    phase: PhaseFlag,
    ready_port: Port,
    insert_port: Port,
    issue_port: Port,
    release_port: Port,
    retire_port: Port,
    squash_port: Port,
    clear_port: Port,
}

impl InstQ {
    /// Create and reset the queue for one ALU lane.
    pub fn new(cfg: &Config, lane: usize, phase: PhaseFlag) -> Self {
        tracing::debug!(
            lane,
            size = cfg.instq_size,
            scan = ?cfg.instq_scan,
            inserts = cfg.decode_width,
            releases = cfg.execute_width,
            retires = cfg.retire_width,
            "instq port limits"
        );
        let mut q = Self {
            lane,
            array: vec![InstQEntry::invalid(); cfg.instq_size],
            in_use: 0,
            scan: 0,
            policy: cfg.instq_scan,
            rng: StdRng::seed_from_u64(cfg.trace.seed ^ (lane as u64).wrapping_mul(0x9e37)),
            phase,
            ready_port: Port::new("instq", "ready", 1),
            insert_port: Port::new("instq", "insert", cfg.decode_width),
            issue_port: Port::new("instq", "issue", 1),
            release_port: Port::new("instq", "release", cfg.execute_width),
            retire_port: Port::new("instq", "retire", cfg.retire_width),
            squash_port: Port::new("instq", "squash", 1),
            clear_port: Port::new("instq", "clear", 1),
        };
        q.reset();
        q
    }

    fn scan_start(&mut self) -> usize {
        match self.policy {
            ScanPolicy::RoundRobin => self.scan,
            ScanPolicy::Random => self.rng.gen_range(0..self.array.len()),
        }
    }

    /// Query: number of free slots.
    pub fn num_slots(&self) -> usize {
        self.phase.assert_query("instq");
        assert!(self.in_use <= self.array.len());
        self.array.len() - self.in_use
    }

    /// Query: select one entry whose operands are both ready, or the
    /// invalid stub. First hit in scan order wins.
    pub fn readied(&mut self) -> InstQEntry {
        self.phase.assert_query("instq");
        self.ready_port.use_one();

        let size = self.array.len();
        let mut which = None;
        self.scan = self.scan_start();
        if self.in_use > 0 {
            for _ in 0..size {
                let e = &self.array[self.scan];
                if e.valid && e.ts1_ready && e.ts2_ready {
                    which = Some(self.scan);
                    break;
                }
                self.scan = (self.scan + 1) % size;
            }
        }

        match which {
            None => InstQEntry::invalid(),
            Some(w) => {
                assert!(self.in_use > 0);
                self.array[w]
            }
        }
    }

    /// Action: place a dispatched operation into any free slot.
    pub fn insert(
        &mut self,
        atag: usize,
        op: Operation,
        ts1_busy: bool,
        ts2_busy: bool,
        cookie: Cookie,
    ) {
        self.phase.assert_action("instq");
        self.insert_port.use_one();
        assert!(
            self.in_use < self.array.len(),
            "instq[{}]: insert into a full queue",
            self.lane
        );

        let size = self.array.len();
        self.scan = self.scan_start();
        for _ in 0..size {
            if !self.array[self.scan].valid {
                self.in_use += 1;
                let slot = self.scan;
                self.array[slot] = InstQEntry {
                    slot_idx: slot,
                    valid: true,
                    atag,
                    op,
                    ts1_ready: !ts1_busy,
                    ts2_ready: !ts2_busy,
                    cookie,
                };
                self.scan = (slot + 1) % size;
                return;
            }
            self.scan = (self.scan + 1) % size;
        }
        unreachable!("instq[{}]: no free slot despite in-use count", self.lane);
    }

    /// Action: remove a selected entry (it is leaving for execution).
    pub fn issue(&mut self, slot: usize) {
        self.phase.assert_action("instq");
        self.issue_port.use_one();
        assert!(slot < self.array.len());
        assert!(self.array[slot].valid, "instq[{}]: issuing empty slot {slot}", self.lane);
        assert!(self.in_use > 0);

        trace_stage("issue", &self.array[slot].op, &self.array[slot].cookie);
        self.array[slot].valid = false;
        self.in_use -= 1;
    }

    /// Action: wake-up broadcast. Every entry sourcing the issued
    /// destination tag marks that operand ready. Zero tags are inert.
    pub fn release(&mut self, tag: RenameTag, cookie: Cookie) {
        self.phase.assert_action("instq");
        self.release_port.use_one();

        if tag.is_zero() {
            return;
        }
        for e in &mut self.array {
            if e.op.ts1 == tag {
                if e.valid {
                    assert!(e.cookie.serial > cookie.serial);
                    assert!(!e.ts1_ready, "instq: waking an already-ready operand");
                }
                e.ts1_ready = true;
            }
            if e.op.ts2 == tag {
                if e.valid {
                    assert!(e.cookie.serial > cookie.serial);
                    assert!(!e.ts2_ready, "instq: waking an already-ready operand");
                }
                e.ts2_ready = true;
            }
        }
    }

    /// Action: invalidate every entry depending on a rewound branch.
    pub fn squash(&mut self, mask: SpeculateMask, cookie: Cookie) {
        self.phase.assert_action("instq");
        self.squash_port.use_one();
        assert!(mask.is_set_once());

        for e in &mut self.array {
            if e.valid && e.op.depend_on.intersects(mask) {
                assert!(e.cookie.serial > cookie.serial);
                trace_stage("issue-squash", &e.op, &e.cookie);
                e.valid = false;
                self.in_use -= 1;
            }
        }
    }

    /// Action: strip a confirmed branch's bit from every `dependOn` mask.
    pub fn clear_mask(&mut self, mask: SpeculateMask, cookie: Cookie) {
        self.phase.assert_action("instq");
        self.clear_port.use_one();
        assert!(mask.is_set_once());

        for e in &mut self.array {
            if e.op.depend_on.intersects(mask) {
                if e.valid {
                    assert!(e.cookie.serial > cookie.serial);
                }
                e.op.depend_on.clear_all(mask);
            }
        }
    }

    /// Action (ROB rename): rewrite operand tags naming a retired slot to
    /// the architectural name its value moved to.
    pub fn retire_tag(&mut self, ptag: RenameTag, ltag: RenameTag, cookie: Cookie) {
        self.phase.assert_action("instq");
        self.retire_port.use_one();

        if ptag.is_zero() {
            return;
        }
        for e in &mut self.array {
            if e.op.ts1 == ptag {
                if e.valid {
                    assert!(e.cookie.serial > cookie.serial);
                }
                e.op.ts1 = ltag;
            }
            if e.op.ts2 == ptag {
                if e.valid {
                    assert!(e.cookie.serial > cookie.serial);
                }
                e.op.ts2 = ltag;
            }
        }
    }

    /// Debug introspection: occupied entry count.
    pub fn peek_in_use(&self) -> usize {
        self.in_use
    }

    /// Empty the queue.
    pub fn reset(&mut self) {
        self.begin_cycle();
        self.in_use = 0;
        self.scan = 0;
        for (i, e) in self.array.iter_mut().enumerate() {
            *e = InstQEntry {
                slot_idx: i,
                ..InstQEntry::invalid()
            };
        }
    }

    /// Rearm the per-cycle port counters.
    pub fn begin_cycle(&self) {
        self.ready_port.reset();
        self.insert_port.reset();
        self.issue_port.reset();
        self.release_port.reset();
        self.retire_port.reset();
        self.squash_port.reset();
        self.clear_port.reset();
    }
}
