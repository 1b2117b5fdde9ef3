//! Specialized nonbonded kernels.
//!
//! [`run`] is the one pair loop. It is generic over the electrostatics model, the van der Waals
//! model, the geometry and the output mode, so every combination compiles to its own routine
//! with the model code inlined and no per-pair dispatch. [`select::NonbondedKernel`] picks the
//! instantiation once, from a runtime [`KernelSpec`].

pub mod elec;
pub mod mode;
pub mod select;
pub mod vdw;

use self::elec::{ElecInteraction, ElecKind};
use self::mode::OutputMode;
use self::vdw::{VdwInteraction, VdwKind};
use super::accumulator::ForceAccumulator;
use super::config::KernelConfig;
use super::work::{CostModel, IterationCounts};
use crate::core::forcefield::term::EnergyTerm;
use crate::core::models::geometry::{Geometry, GeometryKind, MAX_SITES};
use crate::core::models::nblist::NeighborListView;
use crate::core::models::params::InteractionParams;
use crate::core::models::particles::ParticleState;
use crate::core::models::shift::ShiftTable;
use crate::core::table::{TableLookup, TableView};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-pair overhead shared by all variants: displacement, squared distance, reciprocal square
/// root and the force update of both sites.
const FLOPS_PAIR: u64 = 24;

/// The runtime description of one kernel variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KernelSpec {
    pub elec: ElecKind,
    pub vdw: VdwKind,
    pub geometry: GeometryKind,
    pub energy: bool,
}

impl KernelSpec {
    pub fn from_config(config: &KernelConfig, geometry: GeometryKind) -> Self {
        Self {
            elec: config.elec,
            vdw: config.vdw,
            geometry,
            energy: config.energy,
        }
    }
}

impl fmt::Display for KernelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Elec{}_Vdw{}_Geom{}_{}",
            self.elec,
            self.vdw,
            self.geometry,
            mode::tag(self.energy)
        )
    }
}

/// Read-only particle data shared by all passes of a step.
#[derive(Debug, Clone, Copy)]
pub struct KernelData<'a> {
    pub particles: &'a ParticleState,
    pub params: &'a InteractionParams,
    pub shifts: &'a ShiftTable,
}

/// Model constants resolved at selection time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InteractionSetup {
    pub krf: f64,
    pub crf: f64,
    pub elec_offset: usize,
    pub dispersion_offset: usize,
    pub repulsion_offset: usize,
}

/// Potential and scalar force `F(r) / r` of one channel for one site pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelOutput {
    pub potential: f64,
    pub fscal: f64,
}

/// `1 / sqrt(rsq)`, defined as zero at zero distance.
#[inline(always)]
pub fn invsqrt(rsq: f64) -> f64 {
    if rsq > 0.0 { 1.0 / rsq.sqrt() } else { 0.0 }
}

/// Distance quantities derived once per site pair and shared by every channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairDistance {
    pub rsq: f64,
    pub rinv: f64,
    pub rinvsq: f64,
    pub r: f64,
}

impl PairDistance {
    #[inline(always)]
    pub fn new(rsq: f64) -> Self {
        let rinv = invsqrt(rsq);
        Self {
            rsq,
            rinv,
            rinvsq: rinv * rinv,
            r: rsq * rinv,
        }
    }
}

pub(crate) struct KernelInput<'a> {
    pub list: NeighborListView<'a>,
    pub table: TableView<'a>,
    pub data: KernelData<'a>,
}

pub(crate) type KernelFn =
    fn(&KernelInput<'_>, &InteractionSetup, &mut ForceAccumulator) -> IterationCounts;

#[inline(always)]
fn pair_is_active<E: ElecInteraction, V: VdwInteraction>(elec: bool, vdw: bool) -> bool {
    (E::ACTIVE && elec) || (V::ACTIVE && vdw)
}

/// The pair loop.
///
/// For each outer entry the outer sites are placed in the entry's periodic image, every
/// required site pair with every inner group is evaluated, the reaction is subtracted from the
/// inner site on the spot, and the summed outer force goes to the particle and to the entry's
/// shift slot. Indices and table range are preconditions checked before the pass, not here.
pub(crate) fn run<E, V, G, M>(
    input: &KernelInput<'_>,
    setup: &InteractionSetup,
    out: &mut ForceAccumulator,
) -> IterationCounts
where
    E: ElecInteraction,
    V: VdwInteraction,
    G: Geometry,
    M: OutputMode,
{
    let positions = input.data.particles.positions();
    let charges = input.data.particles.charges();
    let types = input.data.particles.vdw_types();
    let params = input.data.params;
    let facel = params.epsfac();
    let table = &input.table;
    let (forces, shift_forces, energies) = out.parts_mut();

    let mut counts = IterationCounts::default();
    for entry in input.list.iter() {
        counts.outer += 1;
        if entry.inner.is_empty() {
            continue;
        }
        counts.inner += entry.inner.len() as u64;

        let shift = input.data.shifts.vector(entry.shift);
        let inr = entry.particle;
        let mut xi = [Vector3::zeros(); MAX_SITES];
        let mut qi = [0.0; MAX_SITES];
        let mut ti = [0usize; MAX_SITES];
        for site in 0..G::OUTER_SITES {
            xi[site] = positions[inr + site] + shift;
            qi[site] = facel * charges[inr + site];
            ti[site] = types[inr + site];
        }

        let mut fi = [Vector3::<f64>::zeros(); MAX_SITES];
        let mut energy = EnergyTerm::default();

        for &jnr in entry.inner {
            for pair in G::PAIRS {
                if !pair_is_active::<E, V>(pair.elec, pair.vdw) {
                    continue;
                }
                let j = jnr + pair.inner;
                let dx = xi[pair.outer] - positions[j];
                let d = PairDistance::new(dx.norm_squared());

                let at = if (E::USES_TABLE && pair.elec) || (V::USES_TABLE && pair.vdw) {
                    table.locate(d.r)
                } else {
                    TableLookup::ORIGIN
                };

                let mut fscal = 0.0;
                if E::ACTIVE && pair.elec {
                    let c = E::evaluate(setup, table, &at, &d, qi[pair.outer] * charges[j]);
                    fscal += c.fscal;
                    if M::ENERGY {
                        energy.elec += c.potential;
                    }
                }
                if V::ACTIVE && pair.vdw {
                    let lj = params.pair(ti[pair.outer], types[j]);
                    let c = V::evaluate(setup, table, &at, &d, lj);
                    fscal += c.fscal;
                    if M::ENERGY {
                        energy.vdw += c.potential;
                    }
                }

                let t = dx * fscal;
                fi[pair.outer] += t;
                forces[j] -= t;
            }
        }

        let mut fsum = Vector3::zeros();
        for site in 0..G::OUTER_SITES {
            forces[inr + site] += fi[site];
            fsum += fi[site];
        }
        shift_forces[entry.shift] += fsum;
        if M::ENERGY {
            energies.add(entry.group, energy);
        }
    }
    counts
}

/// Flops per outer and per inner iteration of one instantiation of [`run`].
pub(crate) fn cost_model<E, V, G, M>() -> CostModel
where
    E: ElecInteraction,
    V: VdwInteraction,
    G: Geometry,
    M: OutputMode,
{
    let (elec, vdw) = if M::ENERGY {
        (E::FLOPS_VF, V::FLOPS_VF)
    } else {
        (E::FLOPS_F, V::FLOPS_F)
    };
    let flops_inner = G::PAIRS
        .iter()
        .filter(|p| pair_is_active::<E, V>(p.elec, p.vdw))
        .map(|p| {
            FLOPS_PAIR
                + if E::ACTIVE && p.elec { elec } else { 0 }
                + if V::ACTIVE && p.vdw { vdw } else { 0 }
        })
        .sum();
    // shift and site loads, per-site force reduction, energy stores
    let flops_outer = 3 + 9 * G::OUTER_SITES as u64 + if M::ENERGY { 2 } else { 0 };
    CostModel {
        flops_outer,
        flops_inner,
    }
}
