//! # Core Module
//!
//! Data contracts consumed by the kernels.
//!
//! - **Models** ([`models`]) - Particle state, neighbor lists, periodic shifts, pair parameters
//!   and the site-pair geometry descriptors.
//! - **Tables** ([`table`]) - Packed cubic-spline interpolation tables, their generation from
//!   analytic functions and their on-disk user table format.
//! - **Force Field** ([`forcefield`]) - Analytic potential forms and energy terms.

pub mod forcefield;
pub mod models;
pub mod table;
