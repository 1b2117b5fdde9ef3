use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Potential energy split by interaction channel family.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyTerm {
    pub elec: f64,
    pub vdw: f64,
}

impl EnergyTerm {
    pub fn new(elec: f64, vdw: f64) -> Self {
        Self { elec, vdw }
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.elec + self.vdw
    }
}

impl Add for EnergyTerm {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            elec: self.elec + rhs.elec,
            vdw: self.vdw + rhs.vdw,
        }
    }
}

impl AddAssign for EnergyTerm {
    fn add_assign(&mut self, rhs: Self) {
        self.elec += rhs.elec;
        self.vdw += rhs.vdw;
    }
}

impl Sum for EnergyTerm {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_returns_sum_of_both_channels() {
        let term = EnergyTerm::new(1.5, -2.0);
        assert_eq!(term.total(), -0.5);
    }

    #[test]
    fn add_sums_each_field_correctly() {
        let result = EnergyTerm::new(1.0, 2.0) + EnergyTerm::new(4.0, 5.0);
        assert_eq!(result, EnergyTerm::new(5.0, 7.0));
    }

    #[test]
    fn add_assign_with_zero_does_not_change_values() {
        let mut a = EnergyTerm::new(1.0, 2.0);
        a += EnergyTerm::default();
        assert_eq!(a, EnergyTerm::new(1.0, 2.0));
    }

    #[test]
    fn sum_over_iterator_accumulates_all_terms() {
        let total: EnergyTerm = [EnergyTerm::new(1.0, -1.0), EnergyTerm::new(0.5, 2.0)]
            .into_iter()
            .sum();
        assert_eq!(total, EnergyTerm::new(1.5, 1.0));
    }
}
