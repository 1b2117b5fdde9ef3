use thiserror::Error;

use super::config::ConfigError;
use crate::core::models::nblist::NeighborListError;
use crate::core::models::params::ParamsError;
use crate::core::models::particles::ParticleStateError;
use crate::core::table::TableError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Interpolation table error: {source}")]
    Table {
        #[from]
        source: TableError,
    },

    #[error("Invalid neighbor list: {source}")]
    NeighborList {
        #[from]
        source: NeighborListError,
    },

    #[error("Invalid interaction parameters: {source}")]
    Params {
        #[from]
        source: ParamsError,
    },

    #[error("Invalid particle state: {source}")]
    Particles {
        #[from]
        source: ParticleStateError,
    },

    #[error("Kernel {variant} evaluates no interaction")]
    NoInteraction { variant: String },

    #[error("Kernel {variant} requires an interpolation table, but none was provided")]
    MissingTable { variant: String },

    #[error("Particle {particle} has van der Waals type {vdw_type}, but only {n_types} types are parameterized")]
    UnknownVdwType {
        particle: usize,
        vdw_type: usize,
        n_types: usize,
    },

    #[error("Accumulator {what} has {found} slots, expected {expected}")]
    AccumulatorMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
}
