use nalgebra::Vector3;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ParticleStateError {
    #[error("Particle arrays have mismatched lengths: {positions} positions, {charges} charges, {types} vdW types")]
    LengthMismatch {
        positions: usize,
        charges: usize,
        types: usize,
    },
}

/// Read-only per-particle inputs of a kernel pass.
///
/// Positions, charges and van der Waals type indices are stored as parallel arrays so the
/// kernels can load exactly what a site pair needs. Forces are not part of this struct; they
/// live in the [`ForceAccumulator`](crate::engine::accumulator::ForceAccumulator) that receives
/// the kernel output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParticleState {
    positions: Vec<Vector3<f64>>,
    charges: Vec<f64>,
    vdw_types: Vec<usize>,
}

impl ParticleState {
    pub fn new(
        positions: Vec<Vector3<f64>>,
        charges: Vec<f64>,
        vdw_types: Vec<usize>,
    ) -> Result<Self, ParticleStateError> {
        if positions.len() != charges.len() || positions.len() != vdw_types.len() {
            return Err(ParticleStateError::LengthMismatch {
                positions: positions.len(),
                charges: charges.len(),
                types: vdw_types.len(),
            });
        }
        Ok(Self {
            positions,
            charges,
            vdw_types,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn positions(&self) -> &[Vector3<f64>] {
        &self.positions
    }

    /// Mutable positions for the step driver; lists built against the old positions stay valid
    /// as long as no particle leaves the list buffer.
    #[inline]
    pub fn positions_mut(&mut self) -> &mut [Vector3<f64>] {
        &mut self.positions
    }

    #[inline]
    pub fn charges(&self) -> &[f64] {
        &self.charges
    }

    #[inline]
    pub fn vdw_types(&self) -> &[usize] {
        &self.vdw_types
    }

    /// Largest van der Waals type index in use, if any particle exists.
    pub fn max_vdw_type(&self) -> Option<usize> {
        self.vdw_types.iter().copied().max()
    }
}
