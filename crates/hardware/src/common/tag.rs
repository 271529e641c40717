//! Rename tags: opaque identifiers of physical value storage.
//!
//! A tag names the location that holds (or is due to hold) a register value.
//! Which variants occur depends on the rename strategy:
//! - Physical-file renaming uses only [`RenameTag::Physical`].
//! - ROB renaming uses [`RenameTag::Architectural`] ("read the architectural
//!   file") and [`RenameTag::Reorder`] ("read/await the value in this ROB
//!   slot").
//!
//! Equality is derived pairwise on discriminant and index. The distinguished
//! zero tag (physical register 0 / architectural `R0`) always reads as zero
//! and is immune to busy marking, wake-up, and writeback.

use crate::config::RenameMode;
use crate::isa::{LogicalReg, NUM_LOGICAL_REG};

/// Identifier of the physical storage location for a register value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenameTag {
    /// A physical register index (physical-file renaming).
    Physical(usize),
    /// A logical name resolved against the architectural file (ROB renaming).
    Architectural(LogicalReg),
    /// An active-list slot index holding a speculative value (ROB renaming).
    Reorder(usize),
}

impl RenameTag {
    /// The zero tag for the given rename mode.
    pub fn zero(mode: RenameMode) -> Self {
        match mode {
            RenameMode::Physical => Self::Physical(0),
            RenameMode::Rob => Self::Architectural(0),
        }
    }

    /// Whether this tag denotes the hardwired zero location.
    pub fn is_zero(self) -> bool {
        matches!(self, Self::Physical(0) | Self::Architectural(0))
    }

    /// Flat index into the unified physical register file.
    ///
    /// Architectural names occupy indices `0..NUM_LOGICAL_REG`; ROB slots are
    /// offset past them. Physical tags index the file directly.
    pub fn preg_index(self) -> usize {
        match self {
            Self::Physical(p) => p,
            Self::Architectural(l) => {
                debug_assert!(l < NUM_LOGICAL_REG);
                l
            }
            Self::Reorder(slot) => NUM_LOGICAL_REG + slot,
        }
    }
}

impl Default for RenameTag {
    fn default() -> Self {
        Self::Architectural(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_tags_per_mode() {
        assert!(RenameTag::zero(RenameMode::Physical).is_zero());
        assert!(RenameTag::zero(RenameMode::Rob).is_zero());
        assert!(!RenameTag::Reorder(0).is_zero());
        assert!(!RenameTag::Physical(1).is_zero());
    }

    #[test]
    fn test_preg_index_regions() {
        assert_eq!(RenameTag::Architectural(5).preg_index(), 5);
        assert_eq!(RenameTag::Reorder(3).preg_index(), NUM_LOGICAL_REG + 3);
        assert_eq!(RenameTag::Physical(40).preg_index(), 40);
    }

    #[test]
    fn test_equality_is_pairwise() {
        // An architectural name never aliases a ROB slot, even when the
        // flattened indices would collide.
        assert_ne!(RenameTag::Architectural(0), RenameTag::Reorder(0));
        assert_eq!(RenameTag::Reorder(7), RenameTag::Reorder(7));
    }
}
