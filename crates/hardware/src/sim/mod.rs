//! Simulation driver.

/// `Simulator` and the run loop.
pub mod simulator;

pub use simulator::{RunReport, Simulator};
