//! Pending-exception tracker.
//!
//! At most one exception is tracked at a time. When two instructions fault
//! before either reaches the head of the active list, the *less speculative*
//! one wins: the one whose `dependOn` mask has the strictly smaller
//! population count (at equal counts, the older serial). The masks are
//! nested by construction (the loser's dependencies are a superset of
//! the winner's), and that nesting is asserted.
//!
//! Branch resolution is forwarded here like to any other inflight entity:
//! a confirmed branch clears its bit from the pending mask; a mispredicted
//! branch the pending exception depends on cancels it outright.

use crate::common::{PhaseFlag, SpeculateMask};
use crate::golden::Cookie;

/// Tracker for the youngest-surviving pending exception.
#[derive(Debug)]
pub struct ExceptionTracker {
    pending: bool,
    depend_on: SpeculateMask,
    cookie: Cookie,
    phase: PhaseFlag,
}

impl ExceptionTracker {
    /// Create an idle tracker.
    pub fn new(phase: PhaseFlag) -> Self {
        Self {
            pending: false,
            depend_on: SpeculateMask::EMPTY,
            cookie: Cookie::default(),
            phase,
        }
    }

    /// Query: is an exception pending (possibly still speculative)?
    pub fn pending(&self) -> bool {
        self.phase.assert_query("exception");
        self.pending
    }

    /// Action: register a faulting instruction, keeping the less
    /// speculative of it and any already-pending exception.
    pub fn raise(&mut self, mask: SpeculateMask, cookie: Cookie) {
        self.phase.assert_action("exception");
        assert!(cookie.inst.exception, "exception: raise without fault flag");

        if !self.pending {
            self.pending = true;
            self.depend_on = mask;
            self.cookie = cookie;
            return;
        }

        let old = self.depend_on.count();
        let next = mask.count();

        if next < old {
            assert!(cookie.serial < self.cookie.serial);
            self.depend_on = mask;
            self.cookie = cookie;
        } else if next == old && cookie.serial < self.cookie.serial {
            // All else being equal, keep the older of the two.
            self.depend_on = mask;
            self.cookie = cookie;
        }

        // The dependency masks of competing exceptions must be nested.
        if next <= old {
            for slot in mask.slots() {
                assert!(self.depend_on.test(slot));
            }
        } else {
            for slot in self.depend_on.slots() {
                assert!(mask.test(slot));
            }
        }
    }

    /// Action: a mispredicted branch squashes any dependent pending fault.
    pub fn cancel(&mut self, mask: SpeculateMask, cookie: Cookie) {
        self.phase.assert_action("exception");

        if self.pending && self.depend_on.intersects(mask) {
            assert!(cookie.serial < self.cookie.serial);
            assert!(self.cookie.speculating > 0);
            self.pending = false;
        }
    }

    /// Action: a confirmed branch is no longer a dependency.
    pub fn clear_mask(&mut self, mask: SpeculateMask, cookie: Cookie) {
        self.phase.assert_action("exception");

        if self.pending && self.depend_on.intersects(mask) {
            assert!(cookie.serial < self.cookie.serial);
            self.depend_on.clear_all(mask);
        }
    }

    /// Action: the fault reached the head and recovery finished.
    pub fn clear_pending(&mut self) {
        self.phase.assert_action("exception");
        assert!(self.pending);
        assert_eq!(self.cookie.speculating, 0, "exception: restart from wrong path");
        assert!(!self.depend_on.any());
        self.reset();
    }

    /// Debug introspection without phase checks.
    pub fn peek_cookie(&self) -> Option<&Cookie> {
        self.pending.then_some(&self.cookie)
    }

    /// Reset to idle.
    pub fn reset(&mut self) {
        self.pending = false;
        self.depend_on = SpeculateMask::EMPTY;
    }

    /// Per-cycle rearm; the tracker has no ported interfaces.
    pub fn begin_cycle(&self) {}
}
