//! # nbkern Core Library
//!
//! Short-range non-bonded force and energy kernels for molecular dynamics, driven by
//! precomputed neighbor lists and cubic-spline interpolation tables.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Plain data models (`ParticleState`, `NeighborList`,
//!   `ShiftTable`, `InteractionParams`), the geometry descriptors, the interpolation tables and
//!   the analytic potential forms the tables are generated from.
//!
//! - **[`engine`]: The Logic Core.** The kernel family itself, monomorphized over
//!   electrostatics model, van der Waals model, geometry and output mode, together with the
//!   force/energy accumulator, the work counter and concurrent execution of kernel passes.
//!
//! - **[`workflows`]: The Public API.** Per-step evaluation of a set of neighbor lists and the
//!   analytic reference used to verify kernel output.

pub mod core;
pub mod engine;
pub mod workflows;
