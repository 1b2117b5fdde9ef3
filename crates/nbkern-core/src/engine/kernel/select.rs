use super::elec::{Coulomb, CubicSplineElec, ElecInteraction, ElecKind, NoElec, ReactionField};
use super::mode::{ForceAndEnergy, ForceOnly};
use super::vdw::{CubicSplineVdw, LennardJones, NoVdw, VdwInteraction, VdwKind};
use super::{InteractionSetup, KernelData, KernelFn, KernelInput, KernelSpec, cost_model, run};
use crate::core::models::geometry::{
    Geometry, GeometryKind, ParticleParticle, Water3Particle, Water3Water3, Water4Particle,
    Water4Water4,
};
use crate::core::models::nblist::{ListLimits, NeighborList, NeighborListView};
use crate::core::table::{Channel, InterpolationTable, TableError, TableView};
use crate::engine::accumulator::ForceAccumulator;
use crate::engine::config::KernelConfig;
use crate::engine::error::EngineError;
use crate::engine::work::{CostModel, IterationCounts, WorkCounter};
use tracing::debug;

/// One specialized kernel, ready to run passes.
///
/// Everything the variant needs (function, model constants, table channel offsets) is resolved
/// here so a pass does no per-call lookups.
#[derive(Clone, Copy)]
pub struct NonbondedKernel<'t> {
    spec: KernelSpec,
    setup: InteractionSetup,
    table: TableView<'t>,
    table_range: f64,
    func: KernelFn,
    cost: CostModel,
}

impl std::fmt::Debug for NonbondedKernel<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonbondedKernel")
            .field("spec", &self.spec)
            .field("setup", &self.setup)
            .field("cost", &self.cost)
            .finish()
    }
}

impl<'t> NonbondedKernel<'t> {
    /// Picks the instantiation for `spec` and checks the table against it.
    ///
    /// A table is required when either model is tabulated; it must hold the needed channels
    /// and cover the configured cutoff.
    pub fn select(
        spec: KernelSpec,
        config: &KernelConfig,
        table: Option<&'t InterpolationTable>,
    ) -> Result<Self, EngineError> {
        if !spec.elec.is_active() && !spec.vdw.is_active() {
            return Err(EngineError::NoInteraction {
                variant: spec.to_string(),
            });
        }

        let mut setup = InteractionSetup::default();
        if spec.elec == ElecKind::ReactionField {
            let (krf, crf) = config.reaction_field();
            setup.krf = krf;
            setup.crf = crf;
        }

        let mut view = TableView::default();
        let mut table_range = f64::INFINITY;
        if spec.elec.uses_table() || spec.vdw.uses_table() {
            let table = table.ok_or_else(|| EngineError::MissingTable {
                variant: spec.to_string(),
            })?;
            if spec.elec.uses_table() {
                setup.elec_offset = table.ensure_channel(Channel::Electrostatics)?;
            }
            if spec.vdw.uses_table() {
                setup.dispersion_offset = table.ensure_channel(Channel::Dispersion)?;
                setup.repulsion_offset = table.ensure_channel(Channel::Repulsion)?;
            }
            table.ensure_covers(config.cutoff)?;
            view = table.view();
            table_range = table.max_distance();
        }

        let (func, cost) = with_elec(&spec);
        debug!(
            kernel = %spec,
            flops_outer = cost.flops_outer,
            flops_inner = cost.flops_inner,
            "Selected nonbonded kernel."
        );
        Ok(Self {
            spec,
            setup,
            table: view,
            table_range,
            func,
            cost,
        })
    }

    #[inline]
    pub fn spec(&self) -> KernelSpec {
        self.spec
    }

    #[inline]
    pub fn cost(&self) -> CostModel {
        self.cost
    }

    #[inline]
    pub fn setup(&self) -> &InteractionSetup {
        &self.setup
    }

    /// Checks every precondition a pass over `list` relies on: list structure and indices,
    /// van der Waals types, accumulator shape, and that every evaluated distance lies inside the
    /// table.
    pub fn validate(
        &self,
        list: &NeighborList,
        data: &KernelData<'_>,
        out: &ForceAccumulator,
    ) -> Result<(), EngineError> {
        let particles = data.particles;
        out.ensure_shape(particles.len(), data.shifts.len(), out.energies().len())?;
        let geometry = self.spec.geometry;
        list.validate(&ListLimits {
            n_particles: particles.len(),
            n_shifts: data.shifts.len(),
            n_groups: out.energies().len(),
            outer_sites: geometry.outer_sites(),
            inner_sites: geometry.inner_sites(),
        })?;

        let n_types = data.params.n_types();
        if let Some((particle, &vdw_type)) = particles
            .vdw_types()
            .iter()
            .enumerate()
            .find(|&(_, &t)| t >= n_types)
        {
            return Err(EngineError::UnknownVdwType {
                particle,
                vdw_type,
                n_types,
            });
        }

        if self.spec.elec.uses_table() || self.spec.vdw.uses_table() {
            let max_distance = max_pair_distance(list.view(), geometry, data);
            if max_distance >= self.table_range {
                return Err(TableError::NotCovering {
                    distance: max_distance,
                    max_distance: self.table_range,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Runs one pass over `list`, adding into `out` and recording the work done.
    pub fn run(
        &self,
        list: NeighborListView<'_>,
        data: &KernelData<'_>,
        out: &mut ForceAccumulator,
        work: &mut WorkCounter,
    ) -> IterationCounts {
        let input = KernelInput {
            list,
            table: self.table,
            data: *data,
        };
        let counts = (self.func)(&input, &self.setup, out);
        work.record(self.spec, self.cost, counts);
        counts
    }
}

/// Largest distance any required site pair of `list` is evaluated at.
fn max_pair_distance(
    list: NeighborListView<'_>,
    geometry: GeometryKind,
    data: &KernelData<'_>,
) -> f64 {
    let positions = data.particles.positions();
    let mut max_rsq: f64 = 0.0;
    for entry in list.iter() {
        let shift = data.shifts.vector(entry.shift);
        for &jnr in entry.inner {
            for pair in geometry.pairs() {
                let dx = positions[entry.particle + pair.outer] + shift - positions[jnr + pair.inner];
                max_rsq = max_rsq.max(dx.norm_squared());
            }
        }
    }
    max_rsq.sqrt()
}

fn with_elec(spec: &KernelSpec) -> (KernelFn, CostModel) {
    match spec.elec {
        ElecKind::None => with_vdw::<NoElec>(spec),
        ElecKind::Coulomb => with_vdw::<Coulomb>(spec),
        ElecKind::ReactionField => with_vdw::<ReactionField>(spec),
        ElecKind::CubicSplineTable => with_vdw::<CubicSplineElec>(spec),
    }
}

fn with_vdw<E: ElecInteraction>(spec: &KernelSpec) -> (KernelFn, CostModel) {
    match spec.vdw {
        VdwKind::None => with_geometry::<E, NoVdw>(spec),
        VdwKind::LennardJones => with_geometry::<E, LennardJones>(spec),
        VdwKind::CubicSplineTable => with_geometry::<E, CubicSplineVdw>(spec),
    }
}

fn with_geometry<E: ElecInteraction, V: VdwInteraction>(spec: &KernelSpec) -> (KernelFn, CostModel) {
    match spec.geometry {
        GeometryKind::ParticleParticle => with_mode::<E, V, ParticleParticle>(spec),
        GeometryKind::Water3Particle => with_mode::<E, V, Water3Particle>(spec),
        GeometryKind::Water3Water3 => with_mode::<E, V, Water3Water3>(spec),
        GeometryKind::Water4Particle => with_mode::<E, V, Water4Particle>(spec),
        GeometryKind::Water4Water4 => with_mode::<E, V, Water4Water4>(spec),
    }
}

fn with_mode<E: ElecInteraction, V: VdwInteraction, G: Geometry>(
    spec: &KernelSpec,
) -> (KernelFn, CostModel) {
    if spec.energy {
        (
            run::<E, V, G, ForceAndEnergy> as KernelFn,
            cost_model::<E, V, G, ForceAndEnergy>(),
        )
    } else {
        (
            run::<E, V, G, ForceOnly> as KernelFn,
            cost_model::<E, V, G, ForceOnly>(),
        )
    }
}
