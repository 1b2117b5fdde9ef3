use super::{ChannelOutput, InteractionSetup, PairDistance};
use crate::core::table::{TableLookup, TableView};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElecKind {
    None,
    Coulomb,
    ReactionField,
    CubicSplineTable,
}

impl ElecKind {
    pub const ALL: [ElecKind; 4] = [
        ElecKind::None,
        ElecKind::Coulomb,
        ElecKind::ReactionField,
        ElecKind::CubicSplineTable,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            ElecKind::None => "None",
            ElecKind::Coulomb => "Coul",
            ElecKind::ReactionField => "RF",
            ElecKind::CubicSplineTable => "CSTab",
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, ElecKind::None)
    }

    pub fn uses_table(&self) -> bool {
        matches!(self, ElecKind::CubicSplineTable)
    }
}

impl fmt::Display for ElecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ElecKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "none" => Ok(ElecKind::None),
            "coul" | "coulomb" => Ok(ElecKind::Coulomb),
            "rf" | "reaction-field" => Ok(ElecKind::ReactionField),
            "cstab" | "table" | "cubic-spline-table" => Ok(ElecKind::CubicSplineTable),
            _ => Err(format!("Unknown electrostatics model: '{}'", s)),
        }
    }
}

/// Compile-time electrostatics model.
///
/// `qq` passed to [`ElecInteraction::evaluate`] already contains the Coulomb prefactor.
pub trait ElecInteraction: 'static {
    const KIND: ElecKind;
    const ACTIVE: bool = true;
    const USES_TABLE: bool = false;
    /// Flops per site pair, force only.
    const FLOPS_F: u64;
    /// Flops per site pair, force and energy.
    const FLOPS_VF: u64;

    fn evaluate(
        setup: &InteractionSetup,
        table: &TableView<'_>,
        at: &TableLookup,
        d: &PairDistance,
        qq: f64,
    ) -> ChannelOutput;
}

pub struct NoElec;
pub struct Coulomb;
pub struct ReactionField;
pub struct CubicSplineElec;

impl ElecInteraction for NoElec {
    const KIND: ElecKind = ElecKind::None;
    const ACTIVE: bool = false;
    const FLOPS_F: u64 = 0;
    const FLOPS_VF: u64 = 0;

    #[inline(always)]
    fn evaluate(
        _: &InteractionSetup,
        _: &TableView<'_>,
        _: &TableLookup,
        _: &PairDistance,
        _: f64,
    ) -> ChannelOutput {
        ChannelOutput::default()
    }
}

impl ElecInteraction for Coulomb {
    const KIND: ElecKind = ElecKind::Coulomb;
    const FLOPS_F: u64 = 3;
    const FLOPS_VF: u64 = 4;

    #[inline(always)]
    fn evaluate(
        _: &InteractionSetup,
        _: &TableView<'_>,
        _: &TableLookup,
        d: &PairDistance,
        qq: f64,
    ) -> ChannelOutput {
        let velec = qq * d.rinv;
        ChannelOutput {
            potential: velec,
            fscal: velec * d.rinvsq,
        }
    }
}

impl ElecInteraction for ReactionField {
    const KIND: ElecKind = ElecKind::ReactionField;
    const FLOPS_F: u64 = 5;
    const FLOPS_VF: u64 = 9;

    #[inline(always)]
    fn evaluate(
        setup: &InteractionSetup,
        _: &TableView<'_>,
        _: &TableLookup,
        d: &PairDistance,
        qq: f64,
    ) -> ChannelOutput {
        ChannelOutput {
            potential: qq * (d.rinv + setup.krf * d.rsq - setup.crf),
            fscal: qq * (d.rinv * d.rinvsq - 2.0 * setup.krf),
        }
    }
}

impl ElecInteraction for CubicSplineElec {
    const KIND: ElecKind = ElecKind::CubicSplineTable;
    const USES_TABLE: bool = true;
    const FLOPS_F: u64 = 12;
    const FLOPS_VF: u64 = 17;

    #[inline(always)]
    fn evaluate(
        setup: &InteractionSetup,
        table: &TableView<'_>,
        at: &TableLookup,
        d: &PairDistance,
        qq: f64,
    ) -> ChannelOutput {
        let point = table.spline(at, setup.elec_offset);
        ChannelOutput {
            potential: qq * point.value,
            fscal: -qq * point.slope * table.scale() * d.rinv,
        }
    }
}
