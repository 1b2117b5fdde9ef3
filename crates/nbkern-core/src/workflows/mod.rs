//! # Workflows Module
//!
//! Top-level drivers built on the engine.
//!
//! - **Step Driver** ([`step`]) - A fixed plan of lists and kernels evaluated over one or more
//!   steps, with validation up front and progress reporting
//! - **Reference Evaluation** ([`reference`]) - Analytic list evaluation and brute-force pair
//!   sums used to check kernel output

pub mod reference;
pub mod step;
