use super::{ChannelOutput, InteractionSetup, PairDistance};
use crate::core::models::params::LjPair;
use crate::core::table::{TableLookup, TableView};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VdwKind {
    None,
    LennardJones,
    CubicSplineTable,
}

impl VdwKind {
    pub const ALL: [VdwKind; 3] = [
        VdwKind::None,
        VdwKind::LennardJones,
        VdwKind::CubicSplineTable,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            VdwKind::None => "None",
            VdwKind::LennardJones => "LJ",
            VdwKind::CubicSplineTable => "CSTab",
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, VdwKind::None)
    }

    pub fn uses_table(&self) -> bool {
        matches!(self, VdwKind::CubicSplineTable)
    }
}

impl fmt::Display for VdwKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for VdwKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "none" => Ok(VdwKind::None),
            "lj" | "lennard-jones" => Ok(VdwKind::LennardJones),
            "cstab" | "table" | "cubic-spline-table" => Ok(VdwKind::CubicSplineTable),
            _ => Err(format!("Unknown van der Waals model: '{}'", s)),
        }
    }
}

/// Compile-time van der Waals model, evaluated with the pair's `(c6, c12)`.
pub trait VdwInteraction: 'static {
    const KIND: VdwKind;
    const ACTIVE: bool = true;
    const USES_TABLE: bool = false;
    const FLOPS_F: u64;
    const FLOPS_VF: u64;

    fn evaluate(
        setup: &InteractionSetup,
        table: &TableView<'_>,
        at: &TableLookup,
        d: &PairDistance,
        lj: LjPair,
    ) -> ChannelOutput;
}

pub struct NoVdw;
pub struct LennardJones;
pub struct CubicSplineVdw;

impl VdwInteraction for NoVdw {
    const KIND: VdwKind = VdwKind::None;
    const ACTIVE: bool = false;
    const FLOPS_F: u64 = 0;
    const FLOPS_VF: u64 = 0;

    #[inline(always)]
    fn evaluate(
        _: &InteractionSetup,
        _: &TableView<'_>,
        _: &TableLookup,
        _: &PairDistance,
        _: LjPair,
    ) -> ChannelOutput {
        ChannelOutput::default()
    }
}

impl VdwInteraction for LennardJones {
    const KIND: VdwKind = VdwKind::LennardJones;
    const FLOPS_F: u64 = 7;
    const FLOPS_VF: u64 = 12;

    #[inline(always)]
    fn evaluate(
        _: &InteractionSetup,
        _: &TableView<'_>,
        _: &TableLookup,
        d: &PairDistance,
        lj: LjPair,
    ) -> ChannelOutput {
        let rinvsix = d.rinvsq * d.rinvsq * d.rinvsq;
        let vvdw6 = lj.c6 * rinvsix;
        let vvdw12 = lj.c12 * rinvsix * rinvsix;
        ChannelOutput {
            potential: vvdw12 - vvdw6,
            fscal: (12.0 * vvdw12 - 6.0 * vvdw6) * d.rinvsq,
        }
    }
}

impl VdwInteraction for CubicSplineVdw {
    const KIND: VdwKind = VdwKind::CubicSplineTable;
    const USES_TABLE: bool = true;
    const FLOPS_F: u64 = 29;
    const FLOPS_VF: u64 = 34;

    #[inline(always)]
    fn evaluate(
        setup: &InteractionSetup,
        table: &TableView<'_>,
        at: &TableLookup,
        d: &PairDistance,
        lj: LjPair,
    ) -> ChannelOutput {
        let disp = table.spline(at, setup.dispersion_offset);
        let rep = table.spline(at, setup.repulsion_offset);
        ChannelOutput {
            potential: lj.c6 * disp.value + lj.c12 * rep.value,
            fscal: -(lj.c6 * disp.slope + lj.c12 * rep.slope) * table.scale() * d.rinv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::potentials;

    #[test]
    fn lennard_jones_matches_analytic_shape() {
        let lj = LjPair::from_sigma_epsilon(0.3, 0.5);
        let r: f64 = 0.35;
        let d = PairDistance::new(r * r);
        let out = LennardJones::evaluate(
            &InteractionSetup::default(),
            &TableView::default(),
            &TableLookup::ORIGIN,
            &d,
            lj,
        );
        let exact = potentials::lennard_jones(r, lj.c6, lj.c12);
        assert!((out.potential - exact.potential).abs() < 1e-12);
        assert!((out.fscal * r - exact.force()).abs() < 1e-9);
    }

    #[test]
    fn minimum_of_lennard_jones_has_zero_force() {
        let sigma: f64 = 0.3;
        let lj = LjPair::from_sigma_epsilon(sigma, 1.0);
        let r_min = 2f64.powf(1.0 / 6.0) * sigma;
        let d = PairDistance::new(r_min * r_min);
        let out = LennardJones::evaluate(
            &InteractionSetup::default(),
            &TableView::default(),
            &TableLookup::ORIGIN,
            &d,
            lj,
        );
        assert!((out.potential + 1.0).abs() < 1e-9);
        assert!(out.fscal.abs() < 1e-6);
    }

    #[test]
    fn parses_tags() {
        assert_eq!("LJ".parse::<VdwKind>(), Ok(VdwKind::LennardJones));
        assert_eq!("cstab".parse::<VdwKind>(), Ok(VdwKind::CubicSplineTable));
        assert!("buckingham".parse::<VdwKind>().is_err());
    }
}
