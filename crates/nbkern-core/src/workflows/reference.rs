//! Direct evaluation of pair interactions without tables, for checking kernels.
//!
//! [`evaluate_list`] walks a neighbor list the same way a kernel does but evaluates every
//! channel analytically. [`brute_force`] ignores lists altogether and visits every particle
//! pair in every periodic image inside the cutoff.

use crate::core::forcefield::potentials::{self, RadialValue};
use crate::core::forcefield::term::EnergyTerm;
use crate::core::models::geometry::GeometryKind;
use crate::core::models::nblist::{NeighborList, energy_group_pair, n_group_pairs};
use crate::core::models::params::LjPair;
use crate::core::models::particles::ParticleState;
use crate::core::models::shift::ShiftTable;
use crate::engine::accumulator::ForceAccumulator;
use crate::engine::config::KernelConfig;
use crate::engine::kernel::KernelData;
use crate::engine::kernel::elec::ElecKind;
use crate::engine::kernel::vdw::VdwKind;
use itertools::Itertools;
use nalgebra::Vector3;
use std::collections::BTreeMap;

/// Analytic counterpart of a kernel configuration. Tabulated models map to the shapes the
/// generated tables encode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceModel {
    pub elec: ElecKind,
    pub vdw: VdwKind,
    pub krf: f64,
    pub crf: f64,
}

impl ReferenceModel {
    pub fn from_config(config: &KernelConfig) -> Self {
        let (krf, crf) = config.reaction_field();
        Self {
            elec: config.elec,
            vdw: config.vdw,
            krf,
            crf,
        }
    }

    /// Energies and radial force `-dV/dr` of one site pair at distance `r`.
    ///
    /// `qq` includes the Coulomb prefactor. Zero distance yields nothing, as in the kernels.
    pub fn pair(&self, r: f64, qq: f64, lj: LjPair, elec: bool, vdw: bool) -> (EnergyTerm, f64) {
        if r <= 0.0 {
            return (EnergyTerm::default(), 0.0);
        }
        let elec_value = match self.elec {
            _ if !elec => RadialValue::default(),
            ElecKind::None => RadialValue::default(),
            ElecKind::Coulomb | ElecKind::CubicSplineTable => potentials::coulomb(r).scaled(qq),
            ElecKind::ReactionField => {
                potentials::reaction_field(r, self.krf, self.crf).scaled(qq)
            }
        };
        let vdw_value = match self.vdw {
            _ if !vdw => RadialValue::default(),
            VdwKind::None => RadialValue::default(),
            VdwKind::LennardJones | VdwKind::CubicSplineTable => {
                potentials::lennard_jones(r, lj.c6, lj.c12)
            }
        };
        (
            EnergyTerm::new(elec_value.potential, vdw_value.potential),
            elec_value.force() + vdw_value.force(),
        )
    }
}

/// Molecule membership and energy group of every particle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticleLabels {
    pub molecule: Vec<usize>,
    pub group: Vec<usize>,
    pub n_groups: usize,
}

impl ParticleLabels {
    /// Every particle its own molecule, all in group 0.
    pub fn single_group(n_particles: usize) -> Self {
        Self {
            molecule: (0..n_particles).collect(),
            group: vec![0; n_particles],
            n_groups: 1,
        }
    }

    /// Slot of the pair `(i, j)` in group-pair sums.
    pub fn pair_slot(&self, i: usize, j: usize) -> usize {
        energy_group_pair(self.group[i], self.group[j], self.n_groups)
    }

    pub fn n_slots(&self) -> usize {
        n_group_pairs(self.n_groups)
    }
}

/// Evaluates every site pair a kernel of `geometry` would evaluate for `list`.
pub fn evaluate_list(
    model: &ReferenceModel,
    geometry: GeometryKind,
    list: &NeighborList,
    data: &KernelData<'_>,
    out: &mut ForceAccumulator,
) {
    let positions = data.particles.positions();
    let charges = data.particles.charges();
    let types = data.particles.vdw_types();
    let epsfac = data.params.epsfac();
    let (forces, shift_forces, energies) = out.parts_mut();

    for entry in list.view().iter() {
        let shift = data.shifts.vector(entry.shift);
        let mut entry_energy = EnergyTerm::default();
        for &jnr in entry.inner {
            for pair in geometry.pairs() {
                let i = entry.particle + pair.outer;
                let j = jnr + pair.inner;
                let dx = positions[i] + shift - positions[j];
                let r = dx.norm();
                let qq = epsfac * charges[i] * charges[j];
                let lj = data.params.pair(types[i], types[j]);
                let (energy, force) = model.pair(r, qq, lj, pair.elec, pair.vdw);
                if r > 0.0 {
                    let f = dx * (force / r);
                    forces[i] += f;
                    forces[j] -= f;
                    shift_forces[entry.shift] += f;
                }
                entry_energy += energy;
            }
        }
        energies.add(entry.group, entry_energy);
    }
}

/// Every pair `i < j` of different molecules in every image with `|x_i + s - x_j| < cutoff`.
///
/// Energies go to the group-pair slots of `labels`, so the returned accumulator has
/// `labels.n_slots()` energy groups.
pub fn brute_force(
    model: &ReferenceModel,
    data: &KernelData<'_>,
    cutoff: f64,
    labels: &ParticleLabels,
) -> ForceAccumulator {
    let particles = data.particles;
    let positions = particles.positions();
    let charges = particles.charges();
    let types = particles.vdw_types();
    let epsfac = data.params.epsfac();
    let mut out = ForceAccumulator::new(particles.len(), data.shifts.len(), labels.n_slots());
    let cutoff_sq = cutoff * cutoff;
    {
        let (forces, shift_forces, energies) = out.parts_mut();
        for (i, j) in (0..particles.len()).tuple_combinations() {
            if labels.molecule[i] == labels.molecule[j] {
                continue;
            }
            for (k, shift) in data.shifts.as_slice().iter().enumerate() {
                let dx = positions[i] + shift - positions[j];
                let rsq = dx.norm_squared();
                if rsq >= cutoff_sq {
                    continue;
                }
                let r = rsq.sqrt();
                let lj = data.params.pair(types[i], types[j]);
                let (energy, force) =
                    model.pair(r, epsfac * charges[i] * charges[j], lj, true, true);
                if r > 0.0 {
                    let f = dx * (force / r);
                    forces[i] += f;
                    forces[j] -= f;
                    shift_forces[k] += f;
                }
                energies.add(labels.pair_slot(i, j), energy);
            }
        }
    }
    out
}

/// Builds a particle-particle list holding every pair [`brute_force`] visits, one entry per
/// outer particle, image and group-pair slot.
pub fn grouped_pairs_list(
    particles: &ParticleState,
    shifts: &ShiftTable,
    cutoff: f64,
    labels: &ParticleLabels,
) -> NeighborList {
    let positions = particles.positions();
    let cutoff_sq = cutoff * cutoff;
    let mut list = NeighborList::new();
    for i in 0..particles.len() {
        for (k, shift) in shifts.as_slice().iter().enumerate() {
            let xi: Vector3<f64> = positions[i] + shift;
            let mut by_slot: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
            for j in (i + 1)..particles.len() {
                if labels.molecule[i] == labels.molecule[j] {
                    continue;
                }
                if (xi - positions[j]).norm_squared() < cutoff_sq {
                    by_slot.entry(labels.pair_slot(i, j)).or_default().push(j);
                }
            }
            for (slot, inner) in by_slot {
                list.push_entry(i, k, slot, inner);
            }
        }
    }
    list
}

/// [`grouped_pairs_list`] with every particle in its own molecule and a single group.
pub fn all_pairs_list(particles: &ParticleState, shifts: &ShiftTable, cutoff: f64) -> NeighborList {
    grouped_pairs_list(
        particles,
        shifts,
        cutoff,
        &ParticleLabels::single_group(particles.len()),
    )
}

/// Largest force difference between two accumulators and largest force magnitude in `expected`.
pub fn max_force_deviation(actual: &ForceAccumulator, expected: &ForceAccumulator) -> (f64, f64) {
    actual
        .forces()
        .iter()
        .zip(expected.forces())
        .fold((0.0, 0.0), |(dev, mag), (a, b)| {
            (f64::max(dev, (a - b).norm()), f64::max(mag, b.norm()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::params::{CombinationRule, InteractionParams};
    use crate::core::table::spline::TableGenerator;
    use crate::engine::config::KernelConfigBuilder;
    use crate::engine::kernel::KernelSpec;
    use crate::engine::kernel::select::NonbondedKernel;
    use crate::engine::work::WorkCounter;

    const OXYGEN: usize = 0;
    const HYDROGEN: usize = 1;
    const ION: usize = 2;

    struct Mixture {
        particles: ParticleState,
        params: InteractionParams,
        lists: Vec<(GeometryKind, NeighborList)>,
    }

    fn water_sites(center: Vector3<f64>, four_site: bool) -> Vec<Vector3<f64>> {
        let mut sites = vec![
            center,
            center + Vector3::new(0.0957, 0.0, 0.0),
            center + Vector3::new(-0.024, 0.0927, 0.0),
        ];
        if four_site {
            sites.push(center + Vector3::new(0.015, 0.015, 0.0));
        }
        sites
    }

    fn list_of(entries: Vec<(usize, Vec<usize>)>) -> NeighborList {
        let mut list = NeighborList::new();
        for (outer, inner) in entries {
            list.push_entry(outer, 0, 0, inner);
        }
        list
    }

    /// Two 4-site waters (0, 4), two 3-site waters (8, 11) and two ions (14, 15), with one
    /// list per geometry.
    fn mixture() -> Mixture {
        let mut positions = Vec::new();
        positions.extend(water_sites(Vector3::new(0.0, 0.0, 0.0), true));
        positions.extend(water_sites(Vector3::new(0.45, 0.1, 0.0), true));
        positions.extend(water_sites(Vector3::new(0.0, 0.45, 0.1), false));
        positions.extend(water_sites(Vector3::new(0.4, 0.5, -0.1), false));
        positions.push(Vector3::new(0.2, 0.2, 0.35));
        positions.push(Vector3::new(0.25, -0.3, 0.2));

        let mut charges = Vec::new();
        let mut types = Vec::new();
        for _ in 0..2 {
            charges.extend([0.0, 0.52, 0.52, -1.04]);
            types.extend([OXYGEN, HYDROGEN, HYDROGEN, HYDROGEN]);
        }
        for _ in 0..2 {
            charges.extend([-0.82, 0.41, 0.41]);
            types.extend([OXYGEN, HYDROGEN, HYDROGEN]);
        }
        charges.extend([1.0, -1.0]);
        types.extend([ION, ION]);

        let particles = ParticleState::new(positions, charges, types).unwrap();
        let params = InteractionParams::from_combination_rule(
            CombinationRule::LorentzBerthelot,
            &[(0.315, 0.65), (0.0, 0.0), (0.25, 0.4)],
            InteractionParams::epsfac_for(1.0).unwrap(),
        )
        .unwrap();

        let lists = vec![
            (GeometryKind::ParticleParticle, list_of(vec![(14, vec![15])])),
            (
                GeometryKind::Water3Particle,
                list_of(vec![(8, vec![14, 15]), (11, vec![14])]),
            ),
            (GeometryKind::Water3Water3, list_of(vec![(8, vec![11])])),
            (
                GeometryKind::Water4Particle,
                list_of(vec![(0, vec![14, 15]), (4, vec![])]),
            ),
            (GeometryKind::Water4Water4, list_of(vec![(0, vec![4])])),
        ];
        Mixture {
            particles,
            params,
            lists,
        }
    }

    #[test]
    fn every_kernel_variant_matches_analytic_reference() {
        let system = mixture();
        let shifts = ShiftTable::non_periodic();
        let data = KernelData {
            particles: &system.particles,
            params: &system.params,
            shifts: &shifts,
        };
        let n = system.particles.len();

        for elec in ElecKind::ALL {
            for vdw in VdwKind::ALL {
                if !elec.is_active() && !vdw.is_active() {
                    continue;
                }
                let config = KernelConfigBuilder::new()
                    .cutoff(1.0)
                    .elec(elec)
                    .vdw(vdw)
                    .build()
                    .unwrap();
                let table = config.table_layout().map(|layout| {
                    TableGenerator::new(config.table_scale, config.table_length())
                        .unwrap()
                        .analytic(layout, config.tabulated_elec())
                        .unwrap()
                });
                let tabulated = elec.uses_table() || vdw.uses_table();
                let tolerance = if tabulated { 1e-4 } else { 1e-10 };
                let model = ReferenceModel::from_config(&config);

                for (geometry, list) in &system.lists {
                    for energy in [false, true] {
                        let spec = KernelSpec {
                            elec,
                            vdw,
                            geometry: *geometry,
                            energy,
                        };
                        let kernel =
                            NonbondedKernel::select(spec, &config, table.as_ref()).unwrap();
                        let mut actual = ForceAccumulator::new(n, 1, 1);
                        kernel.validate(list, &data, &actual).unwrap();
                        kernel.run(list.view(), &data, &mut actual, &mut WorkCounter::new());

                        let mut expected = ForceAccumulator::new(n, 1, 1);
                        evaluate_list(&model, *geometry, list, &data, &mut expected);

                        let (deviation, magnitude) = max_force_deviation(&actual, &expected);
                        assert!(
                            deviation <= tolerance * magnitude.max(1.0),
                            "{spec}: force deviation {deviation} (max force {magnitude})"
                        );
                        if energy {
                            let (a, e) =
                                (actual.energies().term(0), expected.energies().term(0));
                            assert!(
                                (a.elec - e.elec).abs() <= tolerance * e.elec.abs().max(1.0),
                                "{spec}: elec {} vs {}",
                                a.elec,
                                e.elec
                            );
                            assert!(
                                (a.vdw - e.vdw).abs() <= tolerance * e.vdw.abs().max(1.0),
                                "{spec}: vdw {} vs {}",
                                a.vdw,
                                e.vdw
                            );
                        }
                    }
                }
            }
        }
    }

    fn periodic_ions() -> (ParticleState, ShiftTable, ParticleLabels) {
        let side = 1.5;
        let mut positions = Vec::new();
        let mut charges = Vec::new();
        for index in 0..24usize {
            let a = index as f64;
            positions.push(Vector3::new(
                (a * 0.613).rem_euclid(side),
                (a * 0.347 + 0.1).rem_euclid(side),
                (a * 0.871 + 0.2).rem_euclid(side),
            ));
            charges.push(if index % 2 == 0 { 0.6 } else { -0.6 });
        }
        let n = positions.len();
        let particles = ParticleState::new(positions, charges, vec![0; n]).unwrap();
        let shifts = ShiftTable::from_box(&[
            Vector3::new(side, 0.0, 0.0),
            Vector3::new(0.0, side, 0.0),
            Vector3::new(0.0, 0.0, side),
        ]);
        let labels = ParticleLabels {
            molecule: (0..n).collect(),
            group: (0..n).map(|i| i % 3).collect(),
            n_groups: 3,
        };
        (particles, shifts, labels)
    }

    #[test]
    fn group_sums_match_brute_force_pair_sums() {
        let (particles, shifts, labels) = periodic_ions();
        let params = InteractionParams::new(1, vec![LjPair::from_sigma_epsilon(0.2, 0.3)], 1.0)
            .unwrap();
        let data = KernelData {
            particles: &particles,
            params: &params,
            shifts: &shifts,
        };
        let cutoff = 0.7;
        let config = KernelConfigBuilder::new()
            .cutoff(cutoff)
            .elec(ElecKind::ReactionField)
            .vdw(VdwKind::LennardJones)
            .energy_groups(labels.n_slots())
            .build()
            .unwrap();
        let model = ReferenceModel::from_config(&config);

        let list = grouped_pairs_list(&particles, &shifts, cutoff, &labels);
        let kernel = NonbondedKernel::select(
            KernelSpec::from_config(&config, GeometryKind::ParticleParticle),
            &config,
            None,
        )
        .unwrap();
        let mut actual = ForceAccumulator::new(particles.len(), shifts.len(), labels.n_slots());
        kernel.validate(&list, &data, &actual).unwrap();
        kernel.run(list.view(), &data, &mut actual, &mut WorkCounter::new());

        let expected = brute_force(&model, &data, cutoff, &labels);
        for slot in 0..labels.n_slots() {
            let (a, e) = (actual.energies().term(slot), expected.energies().term(slot));
            assert!((a.elec - e.elec).abs() < 1e-9 * e.elec.abs().max(1.0), "slot {slot}");
            assert!((a.vdw - e.vdw).abs() < 1e-9 * e.vdw.abs().max(1.0), "slot {slot}");
        }
        let (total_a, total_e) = (actual.energies().total(), expected.energies().total());
        assert!((total_a.total() - total_e.total()).abs() < 1e-9 * total_e.total().abs().max(1.0));

        let (deviation, magnitude) = max_force_deviation(&actual, &expected);
        assert!(deviation < 1e-9 * magnitude.max(1.0));

        let positions = particles.positions();
        let virial_a = actual.virial(positions, shifts.as_slice()).unwrap();
        let virial_e = expected.virial(positions, shifts.as_slice()).unwrap();
        assert!((virial_a - virial_e).norm() < 1e-9 * virial_e.norm().max(1.0));
    }

    #[test]
    fn total_force_of_isolated_system_vanishes() {
        let (particles, shifts, labels) = periodic_ions();
        let params = InteractionParams::new(1, vec![LjPair::from_sigma_epsilon(0.2, 0.3)], 1.0)
            .unwrap();
        let data = KernelData {
            particles: &particles,
            params: &params,
            shifts: &shifts,
        };
        let model = ReferenceModel {
            elec: ElecKind::Coulomb,
            vdw: VdwKind::LennardJones,
            krf: 0.0,
            crf: 0.0,
        };
        let out = brute_force(&model, &data, 0.7, &labels);
        let largest = out.forces().iter().map(|f| f.norm()).fold(0.0, f64::max);
        assert!(largest > 0.0);
        assert!(out.total_force().norm() < 1e-9 * largest.max(1.0));
    }

    #[test]
    fn same_molecule_pairs_are_excluded() {
        let particles = ParticleState::new(
            vec![Vector3::zeros(), Vector3::new(0.1, 0.0, 0.0)],
            vec![1.0, 1.0],
            vec![0, 0],
        )
        .unwrap();
        let shifts = ShiftTable::non_periodic();
        let labels = ParticleLabels {
            molecule: vec![0, 0],
            group: vec![0, 0],
            n_groups: 1,
        };
        assert!(grouped_pairs_list(&particles, &shifts, 1.0, &labels).is_empty());
        assert_eq!(all_pairs_list(&particles, &shifts, 1.0).inner_len(), 1);
    }
}
