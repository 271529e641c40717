//! Simulator-level test suites.

/// Shared builders and run helpers.
pub mod helpers;
/// Property tests over seeded random traces.
mod properties;
/// Concrete pipeline scenarios and boundary behaviors.
mod scenarios;
