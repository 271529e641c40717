//! Configuration system for the pipeline model.
//!
//! This module defines all configuration structures used to parameterize the
//! datapath and the trace generator. It provides:
//! 1. **Defaults:** the baseline regression configuration.
//! 2. **Structures:** datapath widths and depths, rename strategy, scheduler
//!    scan policy, and trace shaping knobs.
//! 3. **Validation:** structural sanity checks run before a simulation.
//!
//! Configuration is supplied via JSON (`serde_json`) from the CLI or built
//! in code with `Config::default()` for tests.

use serde::Deserialize;
use thiserror::Error;

use crate::common::mask::MAX_SPECULATE_DEPTH;
use crate::isa::NUM_LOGICAL_REG;

/// Default configuration constants.
///
/// These values match the baseline regression configuration and are used
/// when a field is not explicitly present in a config file.
mod defaults {
    /// Maximum instructions accepted (renamed) per cycle.
    pub const DECODE_WIDTH: usize = 4;

    /// Maximum instructions retired per cycle.
    pub const RETIRE_WIDTH: usize = 4;

    /// Number of ALU lanes; only lane 0 resolves branches.
    pub const EXECUTE_WIDTH: usize = 3;

    /// Active-list (reorder buffer) capacity.
    pub const OOO_DEGREE: usize = 32;

    /// Per-lane instruction queue (reservation station) capacity.
    pub const INSTQ_SIZE: usize = 16;

    /// Branch checkpoint stack depth (unresolved branches in flight).
    pub const SPECULATE_DEPTH: usize = 4;

    /// Random trace length before the generator yields HALT.
    pub const TRACE_LENGTH: u64 = 100_000;

    /// Random trace: ADD share of the ADD/BEQ opcode dice.
    pub const TRACE_ADD_SHARE: u64 = 3;

    /// Random trace: BEQ share of the ADD/BEQ opcode dice.
    pub const TRACE_BR_SHARE: u64 = 1;

    /// Random trace: correctly-predicted share of the branch dice.
    pub const TRACE_BR_HIT: u64 = 2;

    /// Random trace: mispredicted share of the branch dice.
    pub const TRACE_BR_MISS: u64 = 1;

    /// Random trace: exception share (out of `TRACE_EXCEPT_TOTAL`).
    pub const TRACE_EXCEPT: u64 = 2;

    /// Random trace: exception dice denominator.
    pub const TRACE_EXCEPT_TOTAL: u64 = 500;

    /// Random trace: register-name dice range.
    pub const TRACE_RNAME_RANGE: u64 = 2;

    /// Random trace: register-name drift numerator.
    pub const TRACE_DRIFT_MUL: u64 = 1;

    /// Random trace: register-name drift denominator.
    pub const TRACE_DRIFT_DIV: u64 = 4;
}

/// Register rename strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum RenameMode {
    /// Separate physical register file of `OOO_DEGREE + NUM_LOGICAL_REG`
    /// entries; the previous mapping is logged for exception unwind.
    #[default]
    Physical,
    /// The active-list slot itself is the destination tag; values move to an
    /// architectural file at retirement.
    Rob,
}

/// Instruction-queue select tie-break policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ScanPolicy {
    /// Scan from a persistent rotating cursor.
    #[default]
    RoundRobin,
    /// Scan from a random start position each cycle.
    Random,
}

/// Random trace generator shaping knobs.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// RNG seed; the same seed reproduces the same trace.
    pub seed: u64,
    /// Number of instructions before the generator yields HALT.
    pub length: u64,
    /// ADD share of the opcode dice.
    pub add_share: u64,
    /// BEQ share of the opcode dice.
    pub br_share: u64,
    /// Correctly-predicted share of the branch dice.
    pub br_hit: u64,
    /// Mispredicted share of the branch dice.
    pub br_miss: u64,
    /// Exception share of the exception dice.
    pub except: u64,
    /// Exception dice denominator.
    pub except_total: u64,
    /// Register-name dice range (1..=32).
    pub rname_range: u64,
    /// Register-name drift numerator (spreads names over the trace).
    pub drift_mul: u64,
    /// Register-name drift denominator.
    pub drift_div: u64,
    /// Whether R0 may appear as a destination or source name.
    pub with_r0: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            length: defaults::TRACE_LENGTH,
            add_share: defaults::TRACE_ADD_SHARE,
            br_share: defaults::TRACE_BR_SHARE,
            br_hit: defaults::TRACE_BR_HIT,
            br_miss: defaults::TRACE_BR_MISS,
            except: defaults::TRACE_EXCEPT,
            except_total: defaults::TRACE_EXCEPT_TOTAL,
            rname_range: defaults::TRACE_RNAME_RANGE,
            drift_mul: defaults::TRACE_DRIFT_MUL,
            drift_div: defaults::TRACE_DRIFT_DIV,
            with_r0: true,
        }
    }
}

/// Full simulator configuration.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rename strategy.
    pub rename: RenameMode,
    /// Collapse Issue and Operand Fetch into one cycle, as in the R10K.
    pub cascade_issue_operand: bool,
    /// Maximum instructions accepted per cycle.
    pub decode_width: usize,
    /// Maximum instructions retired per cycle.
    pub retire_width: usize,
    /// Number of ALU lanes (lane 0 is the only branch-capable lane).
    pub execute_width: usize,
    /// Active-list capacity.
    pub ooo_degree: usize,
    /// Per-lane instruction queue capacity.
    pub instq_size: usize,
    /// Branch checkpoint stack depth.
    pub speculate_depth: usize,
    /// Instruction-queue select tie-break policy.
    pub instq_scan: ScanPolicy,
    /// Enable the redundant centralized rename/issue checker (ROB mode only).
    pub dris_checker: bool,
    /// Trace generator shaping.
    pub trace: TraceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rename: RenameMode::default(),
            cascade_issue_operand: false,
            decode_width: defaults::DECODE_WIDTH,
            retire_width: defaults::RETIRE_WIDTH,
            execute_width: defaults::EXECUTE_WIDTH,
            ooo_degree: defaults::OOO_DEGREE,
            instq_size: defaults::INSTQ_SIZE,
            speculate_depth: defaults::SPECULATE_DEPTH,
            instq_scan: ScanPolicy::default(),
            dris_checker: false,
            trace: TraceConfig::default(),
        }
    }
}

impl Config {
    /// Size of the unified physical register file.
    pub fn num_physical_regs(&self) -> usize {
        self.ooo_degree + NUM_LOGICAL_REG
    }

    /// Check the configuration for structural feasibility.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("decode_width", self.decode_width),
            ("retire_width", self.retire_width),
            ("execute_width", self.execute_width),
            ("ooo_degree", self.ooo_degree),
            ("instq_size", self.instq_size),
            ("speculate_depth", self.speculate_depth),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroParameter(name));
            }
        }
        if self.speculate_depth > MAX_SPECULATE_DEPTH {
            return Err(ConfigError::SpeculateDepth(self.speculate_depth));
        }
        if self.decode_width > self.ooo_degree {
            return Err(ConfigError::DecodeExceedsDegree {
                decode: self.decode_width,
                degree: self.ooo_degree,
            });
        }
        if self.dris_checker && self.rename != RenameMode::Rob {
            return Err(ConfigError::DrisWithoutRob);
        }
        if self.trace.rname_range == 0 || self.trace.rname_range > NUM_LOGICAL_REG as u64 {
            return Err(ConfigError::RegisterRange(self.trace.rname_range));
        }
        Ok(())
    }
}

/// Structural configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A width or depth parameter was zero.
    #[error("`{0}` must be nonzero")]
    ZeroParameter(&'static str),

    /// The checkpoint depth exceeds the speculation mask width.
    #[error("speculate_depth {0} exceeds the {MAX_SPECULATE_DEPTH}-slot mask width")]
    SpeculateDepth(usize),

    /// A decode bundle could not fit in an empty active list.
    #[error("decode_width {decode} exceeds ooo_degree {degree}")]
    DecodeExceedsDegree {
        /// Configured decode width.
        decode: usize,
        /// Configured active-list capacity.
        degree: usize,
    },

    /// The centralized checker only shadows ROB renaming.
    #[error("dris_checker requires the Rob rename mode")]
    DrisWithoutRob,

    /// The trace register range must fit the logical register file.
    #[error("trace rname_range {0} is outside 1..={NUM_LOGICAL_REG}")]
    RegisterRange(u64),
}
