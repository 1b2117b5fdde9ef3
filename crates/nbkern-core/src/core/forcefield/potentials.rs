/// Value and radial derivative `dV/dr` of a potential at one distance.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RadialValue {
    pub potential: f64,
    pub derivative: f64,
}

impl RadialValue {
    #[inline]
    pub fn new(potential: f64, derivative: f64) -> Self {
        Self {
            potential,
            derivative,
        }
    }

    /// Radial force magnitude `-dV/dr`; positive values are repulsive.
    #[inline]
    pub fn force(&self) -> f64 {
        -self.derivative
    }

    #[inline]
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.potential * factor, self.derivative * factor)
    }
}

/// Bare Coulomb shape `1/r`, without charges or prefactor.
#[inline]
pub fn coulomb(r: f64) -> RadialValue {
    let rinv = 1.0 / r;
    RadialValue::new(rinv, -rinv * rinv)
}

/// Reaction-field shape `1/r + krf r^2 - crf`.
#[inline]
pub fn reaction_field(r: f64, krf: f64, crf: f64) -> RadialValue {
    let rinv = 1.0 / r;
    RadialValue::new(rinv + krf * r * r - crf, -rinv * rinv + 2.0 * krf * r)
}

/// Dispersion shape `-1/r^6`, multiplied by `c6` in the kernels.
#[inline]
pub fn dispersion(r: f64) -> RadialValue {
    let rinv = 1.0 / r;
    let rinv6 = rinv.powi(6);
    RadialValue::new(-rinv6, 6.0 * rinv6 * rinv)
}

/// Repulsion shape `1/r^12`, multiplied by `c12` in the kernels.
#[inline]
pub fn repulsion(r: f64) -> RadialValue {
    let rinv = 1.0 / r;
    let rinv12 = rinv.powi(12);
    RadialValue::new(rinv12, -12.0 * rinv12 * rinv)
}

#[inline]
pub fn lennard_jones(r: f64, c6: f64, c12: f64) -> RadialValue {
    let disp = dispersion(r).scaled(c6);
    let rep = repulsion(r).scaled(c12);
    RadialValue::new(disp.potential + rep.potential, disp.derivative + rep.derivative)
}

/// Reaction-field constants `(krf, crf)` for a cutoff and the inner and outer dielectrics.
///
/// `epsilon_rf == 0` stands for a conducting (infinite) outer dielectric. The shape is shifted
/// so that it vanishes at the cutoff.
pub fn reaction_field_constants(cutoff: f64, epsilon_r: f64, epsilon_rf: f64) -> (f64, f64) {
    let rc3 = cutoff.powi(3);
    let krf = if epsilon_rf == 0.0 {
        1.0 / (2.0 * rc3)
    } else {
        (epsilon_rf - epsilon_r) / ((2.0 * epsilon_rf + epsilon_r) * rc3)
    };
    let crf = 1.0 / cutoff + krf * cutoff * cutoff;
    (krf, crf)
}
