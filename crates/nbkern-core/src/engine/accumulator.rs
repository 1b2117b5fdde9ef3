use super::error::EngineError;
use crate::core::forcefield::term::EnergyTerm;
use nalgebra::{Matrix3, Vector3};

/// Potential energy per energy group, one sum per channel family.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnergyGroupSums {
    elec: Vec<f64>,
    vdw: Vec<f64>,
}

impl EnergyGroupSums {
    pub fn new(n_groups: usize) -> Self {
        Self {
            elec: vec![0.0; n_groups],
            vdw: vec![0.0; n_groups],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elec.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elec.is_empty()
    }

    #[inline]
    pub fn add(&mut self, group: usize, term: EnergyTerm) {
        self.elec[group] += term.elec;
        self.vdw[group] += term.vdw;
    }

    pub fn term(&self, group: usize) -> EnergyTerm {
        EnergyTerm::new(self.elec[group], self.vdw[group])
    }

    pub fn elec(&self) -> &[f64] {
        &self.elec
    }

    pub fn vdw(&self) -> &[f64] {
        &self.vdw
    }

    /// Sum over all groups.
    pub fn total(&self) -> EnergyTerm {
        (0..self.len()).map(|g| self.term(g)).sum()
    }

    pub fn reset(&mut self) {
        self.elec.fill(0.0);
        self.vdw.fill(0.0);
    }

    pub fn merge(&mut self, other: &Self) -> Result<(), EngineError> {
        check_len("energy groups", self.len(), other.len())?;
        for (a, b) in self.elec.iter_mut().zip(&other.elec) {
            *a += b;
        }
        for (a, b) in self.vdw.iter_mut().zip(&other.vdw) {
            *a += b;
        }
        Ok(())
    }
}

fn check_len(what: &'static str, expected: usize, found: usize) -> Result<(), EngineError> {
    if expected == found {
        Ok(())
    } else {
        Err(EngineError::AccumulatorMismatch {
            what,
            expected,
            found,
        })
    }
}

/// Step-scoped output of the kernel passes: particle forces, per-shift force sums and energy
/// group sums.
///
/// All kernel writes are additive, so any number of passes may contribute before the owner
/// reads the totals and calls [`ForceAccumulator::reset`].
#[derive(Debug, Clone, PartialEq)]
pub struct ForceAccumulator {
    forces: Vec<Vector3<f64>>,
    shift_forces: Vec<Vector3<f64>>,
    energies: EnergyGroupSums,
}

impl ForceAccumulator {
    pub fn new(n_particles: usize, n_shifts: usize, n_groups: usize) -> Self {
        Self {
            forces: vec![Vector3::zeros(); n_particles],
            shift_forces: vec![Vector3::zeros(); n_shifts],
            energies: EnergyGroupSums::new(n_groups),
        }
    }

    /// An empty accumulator of the same shape, for thread-local accumulation.
    pub fn zeroed_like(&self) -> Self {
        Self::new(
            self.forces.len(),
            self.shift_forces.len(),
            self.energies.len(),
        )
    }

    pub fn reset(&mut self) {
        self.forces.fill(Vector3::zeros());
        self.shift_forces.fill(Vector3::zeros());
        self.energies.reset();
    }

    #[inline]
    pub fn forces(&self) -> &[Vector3<f64>] {
        &self.forces
    }

    #[inline]
    pub fn shift_forces(&self) -> &[Vector3<f64>] {
        &self.shift_forces
    }

    #[inline]
    pub fn energies(&self) -> &EnergyGroupSums {
        &self.energies
    }

    /// Disjoint mutable access for the kernels.
    #[inline]
    pub(crate) fn parts_mut(
        &mut self,
    ) -> (&mut [Vector3<f64>], &mut [Vector3<f64>], &mut EnergyGroupSums) {
        (
            &mut self.forces,
            &mut self.shift_forces,
            &mut self.energies,
        )
    }

    /// Checks that kernels can write every slot a pass may address.
    pub fn ensure_shape(
        &self,
        n_particles: usize,
        n_shifts: usize,
        n_groups: usize,
    ) -> Result<(), EngineError> {
        check_len("forces", n_particles, self.forces.len())?;
        check_len("shift forces", n_shifts, self.shift_forces.len())?;
        check_len("energy groups", n_groups, self.energies.len())
    }

    /// Adds another accumulator of the same shape into this one.
    pub fn merge(&mut self, other: &Self) -> Result<(), EngineError> {
        check_len("forces", self.forces.len(), other.forces.len())?;
        check_len(
            "shift forces",
            self.shift_forces.len(),
            other.shift_forces.len(),
        )?;
        self.energies.merge(&other.energies)?;
        for (a, b) in self.forces.iter_mut().zip(&other.forces) {
            *a += b;
        }
        for (a, b) in self.shift_forces.iter_mut().zip(&other.shift_forces) {
            *a += b;
        }
        Ok(())
    }

    pub fn total_force(&self) -> Vector3<f64> {
        self.forces.iter().sum()
    }

    /// Virial `-1/2 (sum_i x_i f_i^T + sum_k s_k fs_k^T)`.
    ///
    /// The shift term accounts for outer groups that interacted through a periodic image, so
    /// the pairwise virial is recovered without revisiting any pair.
    pub fn virial(
        &self,
        positions: &[Vector3<f64>],
        shifts: &[Vector3<f64>],
    ) -> Result<Matrix3<f64>, EngineError> {
        check_len("forces", positions.len(), self.forces.len())?;
        if shifts.len() < self.shift_forces.len() {
            return Err(EngineError::AccumulatorMismatch {
                what: "shift forces",
                expected: shifts.len(),
                found: self.shift_forces.len(),
            });
        }
        let single_sum = positions
            .iter()
            .zip(&self.forces)
            .fold(Matrix3::zeros(), |acc, (x, f)| acc + x * f.transpose());
        let shift_sum = shifts
            .iter()
            .zip(&self.shift_forces)
            .fold(Matrix3::zeros(), |acc, (s, f)| acc + s * f.transpose());
        Ok(-0.5 * (single_sum + shift_sum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn energy_sums_accumulate_per_group() {
        let mut sums = EnergyGroupSums::new(2);
        sums.add(0, EnergyTerm::new(1.0, 2.0));
        sums.add(1, EnergyTerm::new(-0.5, 0.25));
        sums.add(0, EnergyTerm::new(1.0, 0.0));
        assert_eq!(sums.term(0), EnergyTerm::new(2.0, 2.0));
        assert_eq!(sums.total(), EnergyTerm::new(1.5, 2.25));
        sums.reset();
        assert_eq!(sums.total(), EnergyTerm::default());
    }

    #[test]
    fn merge_adds_all_buffers() {
        let mut a = ForceAccumulator::new(2, 1, 1);
        let mut b = a.zeroed_like();
        a.parts_mut().0[0] = Vector3::new(1.0, 0.0, 0.0);
        {
            let (forces, shift_forces, energies) = b.parts_mut();
            forces[0] = Vector3::new(1.0, 1.0, 0.0);
            shift_forces[0] = Vector3::new(0.0, 0.0, 3.0);
            energies.add(0, EnergyTerm::new(1.0, -1.0));
        }
        a.merge(&b).unwrap();
        assert_eq!(a.forces()[0], Vector3::new(2.0, 1.0, 0.0));
        assert_eq!(a.shift_forces()[0], Vector3::new(0.0, 0.0, 3.0));
        assert_eq!(a.energies().term(0), EnergyTerm::new(1.0, -1.0));
    }

    #[test]
    fn merge_rejects_mismatched_shapes() {
        let mut a = ForceAccumulator::new(2, 1, 1);
        let b = ForceAccumulator::new(3, 1, 1);
        assert!(matches!(
            a.merge(&b),
            Err(EngineError::AccumulatorMismatch { what: "forces", .. })
        ));
        let c = ForceAccumulator::new(2, 1, 2);
        assert!(matches!(
            a.merge(&c),
            Err(EngineError::AccumulatorMismatch {
                what: "energy groups",
                ..
            })
        ));
    }

    #[test]
    fn reset_clears_everything() {
        let mut acc = ForceAccumulator::new(1, 1, 1);
        {
            let (forces, shift_forces, energies) = acc.parts_mut();
            forces[0] = Vector3::new(1.0, 2.0, 3.0);
            shift_forces[0] = Vector3::new(1.0, 2.0, 3.0);
            energies.add(0, EnergyTerm::new(4.0, 5.0));
        }
        acc.reset();
        assert_eq!(acc, ForceAccumulator::new(1, 1, 1));
    }

    #[test]
    fn virial_of_a_pair_depends_only_on_separation() {
        // Force f on particle 0 seen through shift s, -f on particle 1.
        let f = Vector3::new(0.3, -0.2, 0.1);
        let x0 = Vector3::new(0.1, 0.2, 0.3);
        let x1 = Vector3::new(2.9, 0.1, 0.2);
        let s = Vector3::new(3.0, 0.0, 0.0);
        let mut acc = ForceAccumulator::new(2, 2, 1);
        {
            let (forces, shift_forces, _) = acc.parts_mut();
            forces[0] = f;
            forces[1] = -f;
            shift_forces[1] = f;
        }
        let virial = acc.virial(&[x0, x1], &[Vector3::zeros(), s]).unwrap();
        let expected = -0.5 * ((x0 + s - x1) * f.transpose());
        for (a, b) in virial.iter().zip(expected.iter()) {
            assert!(f64_approx_equal(*a, *b));
        }
    }
}
