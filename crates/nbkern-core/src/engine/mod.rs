//! # Engine Module
//!
//! The kernel execution engine: configuration, specialized kernel selection, force and energy
//! accumulation, work accounting and concurrent execution of kernel passes.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Cutoff, table sizing, dielectric and interaction model choices
//! - **Kernels** ([`kernel`]) - The generic pair loop and its monomorphized variants
//! - **Accumulation** ([`accumulator`]) - Particle forces, shift forces and energy-group sums
//! - **Work Accounting** ([`work`]) - Iteration counts and flop estimates per kernel variant
//! - **Parallel Execution** ([`parallel`]) - Concurrent passes with thread-local accumulators
//! - **Progress Monitoring** ([`progress`]) - Callbacks for multi-step drivers
//! - **Error Handling** ([`error`]) - Engine-level error aggregation
//!
//! Variant selection happens once, when a [`kernel::NonbondedKernel`] is built. The inner loop
//! itself never branches on the interaction type.

pub mod accumulator;
pub mod config;
pub mod error;
pub mod kernel;
pub mod parallel;
pub mod progress;
pub mod work;
