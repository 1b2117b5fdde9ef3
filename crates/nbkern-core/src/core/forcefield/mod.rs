//! # Force Field Module
//!
//! Analytic radial potential forms and the per-channel energy term.
//!
//! The kernels never call these functions in their inner loops except for the analytic
//! electrostatics and Lennard-Jones models; their main consumers are table generation
//! ([`crate::core::table::spline`]) and the analytic reference evaluator used to verify the
//! tabulated kernels.

pub mod potentials;
pub mod term;
