use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Electric conversion factor `1 / (4 pi eps0)` in kJ mol^-1 nm e^-2.
pub const ONE_4PI_EPS0: f64 = 138.935_458;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParamsError {
    #[error("Pair parameter matrix has {found} entries, expected {expected} for {n_types} types")]
    MatrixShape {
        n_types: usize,
        expected: usize,
        found: usize,
    },
    #[error("Pair parameter matrix is not symmetric at types ({0}, {1})")]
    Asymmetric(usize, usize),
    #[error("Coulomb prefactor must be finite, got {0}")]
    InvalidPrefactor(f64),
    #[error("Relative dielectric constant must be positive, got {0}")]
    InvalidDielectric(f64),
}

/// Dispersion and repulsion coefficients for one pair of van der Waals types.
///
/// The Lennard-Jones potential in this convention is `c12 / r^12 - c6 / r^6`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LjPair {
    pub c6: f64,
    pub c12: f64,
}

impl LjPair {
    pub fn new(c6: f64, c12: f64) -> Self {
        Self { c6, c12 }
    }

    /// Converts a `(sigma, epsilon)` pair to `(c6, c12)`.
    pub fn from_sigma_epsilon(sigma: f64, epsilon: f64) -> Self {
        let sigma6 = sigma.powi(6);
        Self {
            c6: 4.0 * epsilon * sigma6,
            c12: 4.0 * epsilon * sigma6 * sigma6,
        }
    }
}

/// How per-type parameters are combined into per-pair coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CombinationRule {
    /// Per-type values are `(c6, c12)`; pairs use their geometric means.
    Geometric,
    /// Per-type values are `(sigma, epsilon)`; arithmetic sigma, geometric epsilon.
    LorentzBerthelot,
    /// Per-type values are `(sigma, epsilon)`; geometric sigma and epsilon.
    GeometricSigmaEpsilon,
}

impl CombinationRule {
    pub fn combine(&self, a: (f64, f64), b: (f64, f64)) -> LjPair {
        match self {
            CombinationRule::Geometric => LjPair::new((a.0 * b.0).sqrt(), (a.1 * b.1).sqrt()),
            CombinationRule::LorentzBerthelot => {
                LjPair::from_sigma_epsilon(0.5 * (a.0 + b.0), (a.1 * b.1).sqrt())
            }
            CombinationRule::GeometricSigmaEpsilon => {
                LjPair::from_sigma_epsilon((a.0 * b.0).sqrt(), (a.1 * b.1).sqrt())
            }
        }
    }
}

/// Pair coefficient matrix over van der Waals types plus the Coulomb prefactor.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionParams {
    n_types: usize,
    pairs: Vec<LjPair>,
    epsfac: f64,
}

impl InteractionParams {
    /// Builds the parameters from a row-major `n_types x n_types` matrix.
    pub fn new(n_types: usize, pairs: Vec<LjPair>, epsfac: f64) -> Result<Self, ParamsError> {
        let expected = n_types * n_types;
        if pairs.len() != expected {
            return Err(ParamsError::MatrixShape {
                n_types,
                expected,
                found: pairs.len(),
            });
        }
        for i in 0..n_types {
            for j in (i + 1)..n_types {
                if pairs[i * n_types + j] != pairs[j * n_types + i] {
                    return Err(ParamsError::Asymmetric(i, j));
                }
            }
        }
        if !epsfac.is_finite() {
            return Err(ParamsError::InvalidPrefactor(epsfac));
        }
        Ok(Self {
            n_types,
            pairs,
            epsfac,
        })
    }

    pub fn from_combination_rule(
        rule: CombinationRule,
        per_type: &[(f64, f64)],
        epsfac: f64,
    ) -> Result<Self, ParamsError> {
        let n_types = per_type.len();
        let mut pairs = Vec::with_capacity(n_types * n_types);
        for &a in per_type {
            for &b in per_type {
                pairs.push(rule.combine(a, b));
            }
        }
        Self::new(n_types, pairs, epsfac)
    }

    /// Coulomb prefactor for a relative dielectric constant.
    pub fn epsfac_for(epsilon_r: f64) -> Result<f64, ParamsError> {
        if epsilon_r <= 0.0 || !epsilon_r.is_finite() {
            return Err(ParamsError::InvalidDielectric(epsilon_r));
        }
        Ok(ONE_4PI_EPS0 / epsilon_r)
    }

    #[inline]
    pub fn n_types(&self) -> usize {
        self.n_types
    }

    #[inline]
    pub fn epsfac(&self) -> f64 {
        self.epsfac
    }

    #[inline]
    pub fn pair(&self, type_i: usize, type_j: usize) -> LjPair {
        self.pairs[type_i * self.n_types + type_j]
    }

    /// Row of the matrix for one type, for hoisting the outer particle's lookup.
    #[inline]
    pub fn row(&self, type_i: usize) -> &[LjPair] {
        &self.pairs[type_i * self.n_types..(type_i + 1) * self.n_types]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= TOLERANCE * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn new_rejects_wrong_matrix_size() {
        let result = InteractionParams::new(2, vec![LjPair::default(); 3], 1.0);
        assert_eq!(
            result,
            Err(ParamsError::MatrixShape {
                n_types: 2,
                expected: 4,
                found: 3
            })
        );
    }

    #[test]
    fn new_rejects_asymmetric_matrix() {
        let pairs = vec![
            LjPair::new(1.0, 1.0),
            LjPair::new(2.0, 1.0),
            LjPair::new(3.0, 1.0),
            LjPair::new(1.0, 1.0),
        ];
        let result = InteractionParams::new(2, pairs, 1.0);
        assert_eq!(result, Err(ParamsError::Asymmetric(0, 1)));
    }

    #[test]
    fn geometric_rule_uses_geometric_means() {
        let params = InteractionParams::from_combination_rule(
            CombinationRule::Geometric,
            &[(4.0, 9.0), (1.0, 1.0)],
            1.0,
        )
        .unwrap();
        let pair = params.pair(0, 1);
        assert!(approx_eq(pair.c6, 2.0));
        assert!(approx_eq(pair.c12, 3.0));
        assert_eq!(params.pair(1, 0), pair);
    }

    #[test]
    fn lorentz_berthelot_places_minimum_at_two_to_the_sixth_sigma() {
        let params = InteractionParams::from_combination_rule(
            CombinationRule::LorentzBerthelot,
            &[(0.3, 0.5), (0.5, 2.0)],
            1.0,
        )
        .unwrap();
        let pair = params.pair(0, 1);
        let sigma = 0.4;
        let r_min = 2.0_f64.powf(1.0 / 6.0) * sigma;
        let energy = pair.c12 / r_min.powi(12) - pair.c6 / r_min.powi(6);
        assert!(approx_eq(energy, -1.0));
    }

    #[test]
    fn row_returns_all_partners_of_a_type() {
        let params = InteractionParams::from_combination_rule(
            CombinationRule::Geometric,
            &[(1.0, 1.0), (4.0, 4.0), (9.0, 9.0)],
            1.0,
        )
        .unwrap();
        let row = params.row(1);
        assert_eq!(row.len(), 3);
        assert!(approx_eq(row[2].c6, 6.0));
    }

    #[test]
    fn epsfac_scales_with_inverse_dielectric() {
        let vacuum = InteractionParams::epsfac_for(1.0).unwrap();
        let water = InteractionParams::epsfac_for(80.0).unwrap();
        assert!(approx_eq(vacuum, ONE_4PI_EPS0));
        assert!(approx_eq(water * 80.0, ONE_4PI_EPS0));
        assert!(InteractionParams::epsfac_for(0.0).is_err());
    }
}
