//! TOML system descriptions: particles, van der Waals types, box and optional neighbor lists.
//!
//! ```toml
//! combination-rule = "lorentz-berthelot"
//! box = [[3.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 3.0]]
//!
//! [[types]]
//! name = "OW"
//! params = [0.315, 0.636]
//!
//! [[particles]]
//! position = [0.0, 0.0, 0.0]
//! charge = -0.834
//! type = "OW"
//! molecule = 0
//! group = "SOL"
//!
//! [[lists]]
//! geometry = "w3p1"
//! entries = [{ outer = 0, inner = [3, 4], image = [0, 0, 0] }]
//! ```

use crate::error::{CliError, Result};
use nalgebra::Vector3;
use nbkern::core::models::geometry::GeometryKind;
use nbkern::core::models::nblist::{NeighborList, energy_group_pair};
use nbkern::core::models::params::{CombinationRule, InteractionParams};
use nbkern::core::models::particles::ParticleState;
use nbkern::core::models::shift::ShiftTable;
use nbkern::workflows::reference::{ParticleLabels, grouped_pairs_list};
use nbkern::workflows::step::GeometryList;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_GROUP: &str = "System";

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct FileType {
    name: String,
    params: [f64; 2],
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct FileParticle {
    position: [f64; 3],
    #[serde(default)]
    charge: f64,
    #[serde(rename = "type")]
    vdw_type: String,
    molecule: Option<usize>,
    group: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct FileEntry {
    outer: usize,
    inner: Vec<usize>,
    image: Option<[i32; 3]>,
    #[serde(default)]
    group: usize,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct FileList {
    geometry: String,
    #[serde(default)]
    entries: Vec<FileEntry>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SystemFile {
    #[serde(default = "default_rule")]
    combination_rule: CombinationRule,
    #[serde(rename = "box")]
    box_vectors: Option<[[f64; 3]; 3]>,
    types: Vec<FileType>,
    particles: Vec<FileParticle>,
    lists: Option<Vec<FileList>>,
}

fn default_rule() -> CombinationRule {
    CombinationRule::Geometric
}

/// A system ready for kernel evaluation.
#[derive(Debug, Clone)]
pub struct System {
    pub particles: ParticleState,
    pub shifts: ShiftTable,
    pub labels: ParticleLabels,
    pub group_names: Vec<String>,
    rule: CombinationRule,
    type_params: Vec<(f64, f64)>,
    lists: Option<Vec<GeometryList>>,
}

impl SystemFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading system description from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn into_system(self) -> Result<System> {
        let type_index: HashMap<&str, usize> = self
            .types
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.as_str(), i))
            .collect();
        if type_index.len() != self.types.len() {
            return Err(CliError::System("van der Waals type names must be unique".into()));
        }

        let mut positions = Vec::with_capacity(self.particles.len());
        let mut charges = Vec::with_capacity(self.particles.len());
        let mut vdw_types = Vec::with_capacity(self.particles.len());
        let mut molecule = Vec::with_capacity(self.particles.len());
        let mut group = Vec::with_capacity(self.particles.len());
        let mut group_names: Vec<String> = Vec::new();

        for (i, p) in self.particles.iter().enumerate() {
            let t = type_index.get(p.vdw_type.as_str()).ok_or_else(|| {
                CliError::System(format!(
                    "particle {} has unknown van der Waals type '{}'",
                    i, p.vdw_type
                ))
            })?;
            positions.push(Vector3::from(p.position));
            charges.push(p.charge);
            vdw_types.push(*t);
            molecule.push(p.molecule.unwrap_or(self.particles.len() + i));

            let name = p.group.as_deref().unwrap_or(DEFAULT_GROUP);
            let g = match group_names.iter().position(|n| n == name) {
                Some(g) => g,
                None => {
                    group_names.push(name.to_string());
                    group_names.len() - 1
                }
            };
            group.push(g);
        }
        if group_names.is_empty() {
            group_names.push(DEFAULT_GROUP.to_string());
        }

        let particles = ParticleState::new(positions, charges, vdw_types)
            .map_err(|e| CliError::System(e.to_string()))?;
        let shifts = match self.box_vectors {
            Some([a, b, c]) => {
                ShiftTable::from_box(&[Vector3::from(a), Vector3::from(b), Vector3::from(c)])
            }
            None => ShiftTable::non_periodic(),
        };
        let periodic = self.box_vectors.is_some();

        let lists = self
            .lists
            .map(|lists| {
                lists
                    .into_iter()
                    .map(|l| convert_list(l, periodic))
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?;

        let labels = ParticleLabels {
            molecule,
            group,
            n_groups: group_names.len(),
        };
        info!(
            particles = particles.len(),
            types = self.types.len(),
            groups = labels.n_groups,
            periodic,
            "Loaded system."
        );

        Ok(System {
            particles,
            shifts,
            labels,
            group_names,
            rule: self.combination_rule,
            type_params: self.types.iter().map(|t| (t.params[0], t.params[1])).collect(),
            lists,
        })
    }
}

fn convert_list(list: FileList, periodic: bool) -> Result<GeometryList> {
    let geometry: GeometryKind = list.geometry.parse().map_err(CliError::System)?;
    let mut out = NeighborList::new();
    for entry in list.entries {
        let [ix, iy, iz] = entry.image.unwrap_or([0, 0, 0]);
        let shift = if periodic {
            ShiftTable::index_of(ix, iy, iz).ok_or_else(|| {
                CliError::System(format!("image ({ix}, {iy}, {iz}) is not a neighboring cell"))
            })?
        } else if (ix, iy, iz) == (0, 0, 0) {
            0
        } else {
            return Err(CliError::System(
                "periodic images require a box in the system description".into(),
            ));
        };
        out.push_entry(entry.outer, shift, entry.group, entry.inner);
    }
    Ok(GeometryList {
        geometry,
        list: out,
    })
}

impl System {
    pub fn from_file(path: &Path) -> Result<Self> {
        SystemFile::from_file(path)?.into_system()
    }

    pub fn params(&self, epsfac: f64) -> Result<InteractionParams> {
        InteractionParams::from_combination_rule(self.rule, &self.type_params, epsfac)
            .map_err(|e| CliError::System(e.to_string()))
    }

    pub fn has_explicit_lists(&self) -> bool {
        self.lists.is_some()
    }

    /// The lists of the description, or one particle-particle list over all pairs of
    /// different molecules within `cutoff`, with entries grouped by energy-group pair.
    pub fn lists(&self, cutoff: f64) -> Vec<GeometryList> {
        match &self.lists {
            Some(lists) => lists.clone(),
            None => {
                let list = grouped_pairs_list(&self.particles, &self.shifts, cutoff, &self.labels);
                info!(
                    entries = list.len(),
                    pairs = list.inner_len(),
                    "Built particle-particle list."
                );
                vec![GeometryList {
                    geometry: GeometryKind::ParticleParticle,
                    list,
                }]
            }
        }
    }

    /// Energy slots the lists write to.
    pub fn energy_groups(&self) -> usize {
        match &self.lists {
            Some(lists) => lists
                .iter()
                .flat_map(|l| l.list.view().iter().map(|e| e.group + 1))
                .max()
                .unwrap_or(1),
            None => self.labels.n_slots(),
        }
    }

    /// Display name of every energy slot.
    pub fn slot_names(&self) -> Vec<String> {
        if self.lists.is_some() {
            return (0..self.energy_groups()).map(|s| format!("group {s}")).collect();
        }
        let n = self.labels.n_groups;
        let mut names = vec![String::new(); self.labels.n_slots()];
        for a in 0..n {
            for b in a..n {
                names[energy_group_pair(a, b, n)] =
                    format!("{}-{}", self.group_names[a], self.group_names[b]);
            }
        }
        names
    }
}
