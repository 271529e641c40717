//! Clocking discipline: phase flag and structural port accounting.
//!
//! Every cycle runs in two phases. The **combinational** phase may only call
//! component queries (pure reads of start-of-cycle state); the **commit**
//! phase may only call component actions (state mutation, analogous to the
//! clock edge). The orchestrator owns a [`PhaseFlag`] and clones the handle
//! into every component; components assert the phase on every entry.
//!
//! A [`Port`] counts uses of one component interface within a cycle against
//! a hardware-realistic limit. Exceeding the limit is a fatal structural
//! error: the modeled configuration would not be synthesizable.

use std::cell::Cell;
use std::rc::Rc;

/// Cycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Queries only; component state is frozen.
    Combinational,
    /// Actions only; state updates latch.
    Commit,
}

/// Shared handle to the cycle phase, cloned into every component.
#[derive(Clone, Debug)]
pub struct PhaseFlag(Rc<Cell<Phase>>);

impl Default for PhaseFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseFlag {
    /// Create a flag, initially in the commit phase so that reset actions
    /// can run before the first cycle.
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(Phase::Commit)))
    }

    /// Enter the combinational phase at the top of a cycle.
    pub fn begin_cycle(&self) {
        self.0.set(Phase::Combinational);
    }

    /// Flip to the commit phase once all combinational signals are settled.
    pub fn commit(&self) {
        self.0.set(Phase::Commit);
    }

    /// Current phase.
    pub fn get(&self) -> Phase {
        self.0.get()
    }

    /// Assert that a query is legal now.
    ///
    /// # Panics
    ///
    /// If called during the commit phase.
    pub fn assert_query(&self, unit: &str) {
        assert!(
            self.0.get() == Phase::Combinational,
            "{unit}: query after commit phase began"
        );
    }

    /// Assert that an action is legal now.
    ///
    /// # Panics
    ///
    /// If called during the combinational phase.
    pub fn assert_action(&self, unit: &str) {
        assert!(
            self.0.get() == Phase::Commit,
            "{unit}: action before commit phase"
        );
    }
}

/// Per-cycle usage counter for one component port.
#[derive(Debug)]
pub struct Port {
    unit: &'static str,
    name: &'static str,
    limit: usize,
    used: Cell<usize>,
}

impl Port {
    /// Create a port with the given structural limit.
    pub fn new(unit: &'static str, name: &'static str, limit: usize) -> Self {
        Self {
            unit,
            name,
            limit,
            used: Cell::new(0),
        }
    }

    /// Account one use of the port this cycle.
    ///
    /// # Panics
    ///
    /// If the configured limit is exceeded: the model is structurally
    /// infeasible, not merely slow.
    pub fn use_one(&self) {
        let used = self.used.get();
        assert!(
            used < self.limit,
            "structural violation: {}.{} used more than {} times in one cycle",
            self.unit,
            self.name,
            self.limit
        );
        self.used.set(used + 1);
    }

    /// Reset the counter at the top of a cycle.
    pub fn reset(&self) {
        self.used.set(0);
    }

    /// The configured limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The port name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}
