//! Inter-stage bundle structures.
//!
//! Bundles carry up to a configured number of lanes plus a `howmany` count;
//! lanes past the count are kept in a harmless zeroed state so downstream
//! logic may scan the full width without bounds juggling, exactly as a
//! fixed-width hardware bus would.

use crate::common::{RenameTag, SpeculateMask};
use crate::config::RenameMode;
use crate::golden::Cookie;
use crate::isa::{DataValue, LogicalReg, Opcode};

/// An instruction in renamed (tagged) form.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Operation {
    /// Opcode.
    pub opcode: Opcode,
    /// Destination tag.
    pub td: RenameTag,
    /// First source tag.
    pub ts1: RenameTag,
    /// Second source tag.
    pub ts2: RenameTag,
    /// Fetch's branch direction prediction.
    pub pred_taken: bool,
    /// Fetch's claimed result parity (exception detection contract).
    pub oparity: bool,
    /// Checkpoint slot this operation occupies, if it is a branch.
    pub checkpoint: usize,
    /// Unresolved branches this operation speculatively depends on.
    pub depend_on: SpeculateMask,
}

impl Operation {
    /// A harmless filler operation whose tags are the mode's zero tag.
    pub fn inert(mode: RenameMode) -> Self {
        let zero = RenameTag::zero(mode);
        Self {
            td: zero,
            ts1: zero,
            ts2: zero,
            ..Self::default()
        }
    }
}

/// Rename-stage output: up to `DECODE_WIDTH` renamed operations.
#[derive(Clone, Debug)]
pub struct RenameBundle {
    /// Number of meaningful lanes.
    pub howmany: usize,
    /// Renamed operations.
    pub op: Vec<Operation>,
    /// Previous mapping of each destination (physical-rename unwind log).
    pub td_old: Vec<RenameTag>,
}

impl RenameBundle {
    /// An empty bundle of the given lane width.
    pub fn empty(mode: RenameMode, width: usize) -> Self {
        Self {
            howmany: 0,
            op: vec![Operation::inert(mode); width],
            td_old: vec![RenameTag::zero(mode); width],
        }
    }
}

/// Free destination tags offered by the active list for one decode bundle.
#[derive(Clone, Debug)]
pub struct FreeRegBundle {
    /// Number of tags available (bounded by free active-list slots).
    pub howmany: usize,
    /// Destination tags for newly renamed instructions.
    pub free: Vec<RenameTag>,
    /// Matching active-list indices.
    pub atag: Vec<usize>,
}

impl FreeRegBundle {
    /// An empty bundle of the given lane width.
    pub fn empty(mode: RenameMode, width: usize) -> Self {
        Self {
            howmany: 0,
            free: vec![RenameTag::zero(mode); width],
            atag: vec![0; width],
        }
    }
}

/// Instructions the active list offers for in-order retirement this cycle.
#[derive(Clone, Debug)]
pub struct RetireBundle {
    /// Number of retiring lanes.
    pub howmany: usize,
    /// Physical-rename mode: the freed previous mapping to recycle.
    /// ROB-rename mode: the retiring slot's tag (zero for `R0` writers).
    pub td: Vec<RenameTag>,
    /// Destination logical registers (ROB-rename mode).
    pub rd: Vec<LogicalReg>,
    /// Retiring values, read from the register file (ROB-rename mode).
    pub val: Vec<DataValue>,
    /// Golden-reference cookies of the retiring instructions.
    pub cookie: Vec<Cookie>,
}

impl RetireBundle {
    /// An empty bundle of the given lane width.
    pub fn empty(mode: RenameMode, width: usize) -> Self {
        Self {
            howmany: 0,
            td: vec![RenameTag::zero(mode); width],
            rd: vec![0; width],
            val: vec![0; width],
            cookie: vec![Cookie::default(); width],
        }
    }
}

/// The youngest-first log of old mappings consumed by one serial-unwind step
/// (physical-rename exception recovery).
#[derive(Clone, Debug)]
pub struct UnmapBundle {
    /// Number of entries to walk back this cycle.
    pub howmany: usize,
    /// Previous mappings to restore, youngest first.
    pub td_old: Vec<RenameTag>,
    /// Destination registers the mappings belong to.
    pub rd: Vec<LogicalReg>,
}
