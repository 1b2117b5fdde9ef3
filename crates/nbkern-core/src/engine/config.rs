use super::kernel::elec::ElecKind;
use super::kernel::vdw::VdwKind;
use crate::core::forcefield::potentials;
use crate::core::models::params::{InteractionParams, ParamsError};
use crate::core::table::TableLayout;
use crate::core::table::spline::TabulatedElec;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value {value} for parameter '{name}': {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

pub const DEFAULT_TABLE_SCALE: f64 = 500.0;
pub const DEFAULT_TABLE_EXTENSION: f64 = 1.0;

/// Everything a kernel pass needs to know besides the data it runs on.
///
/// Built once by the driver and passed down explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelConfig {
    /// Table points per unit distance.
    pub table_scale: f64,
    pub cutoff: f64,
    /// Distance tabulated beyond the cutoff.
    pub table_extension: f64,
    pub epsilon_r: f64,
    /// Reaction-field dielectric; `0` means a conducting boundary.
    pub epsilon_rf: f64,
    pub elec: ElecKind,
    pub vdw: VdwKind,
    /// Whether passes also accumulate potential energies.
    pub energy: bool,
    pub energy_groups: usize,
}

impl KernelConfig {
    pub fn epsfac(&self) -> Result<f64, ParamsError> {
        InteractionParams::epsfac_for(self.epsilon_r)
    }

    /// `(krf, crf)` for the configured cutoff and dielectrics.
    pub fn reaction_field(&self) -> (f64, f64) {
        potentials::reaction_field_constants(self.cutoff, self.epsilon_r, self.epsilon_rf)
    }

    pub fn table_length(&self) -> f64 {
        self.cutoff + self.table_extension
    }

    /// Layout of the table the configured models need, if any.
    pub fn table_layout(&self) -> Option<TableLayout> {
        TableLayout::for_channels(self.elec.uses_table(), self.vdw.uses_table())
    }

    /// Electrostatics shape written into generated tables.
    pub fn tabulated_elec(&self) -> TabulatedElec {
        TabulatedElec::Coulomb
    }
}

#[derive(Default)]
pub struct KernelConfigBuilder {
    table_scale: Option<f64>,
    cutoff: Option<f64>,
    table_extension: Option<f64>,
    epsilon_r: Option<f64>,
    epsilon_rf: Option<f64>,
    elec: Option<ElecKind>,
    vdw: Option<VdwKind>,
    energy: Option<bool>,
    energy_groups: Option<usize>,
}

impl KernelConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table_scale(mut self, scale: f64) -> Self {
        self.table_scale = Some(scale);
        self
    }
    pub fn cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }
    pub fn table_extension(mut self, extension: f64) -> Self {
        self.table_extension = Some(extension);
        self
    }
    pub fn epsilon_r(mut self, epsilon_r: f64) -> Self {
        self.epsilon_r = Some(epsilon_r);
        self
    }
    pub fn epsilon_rf(mut self, epsilon_rf: f64) -> Self {
        self.epsilon_rf = Some(epsilon_rf);
        self
    }
    pub fn elec(mut self, kind: ElecKind) -> Self {
        self.elec = Some(kind);
        self
    }
    pub fn vdw(mut self, kind: VdwKind) -> Self {
        self.vdw = Some(kind);
        self
    }
    pub fn energy(mut self, energy: bool) -> Self {
        self.energy = Some(energy);
        self
    }
    pub fn energy_groups(mut self, n: usize) -> Self {
        self.energy_groups = Some(n);
        self
    }

    pub fn build(self) -> Result<KernelConfig, ConfigError> {
        let config = KernelConfig {
            table_scale: self.table_scale.unwrap_or(DEFAULT_TABLE_SCALE),
            cutoff: self.cutoff.ok_or(ConfigError::MissingParameter("cutoff"))?,
            table_extension: self.table_extension.unwrap_or(DEFAULT_TABLE_EXTENSION),
            epsilon_r: self.epsilon_r.unwrap_or(1.0),
            epsilon_rf: self.epsilon_rf.unwrap_or(0.0),
            elec: self.elec.ok_or(ConfigError::MissingParameter("elec"))?,
            vdw: self.vdw.ok_or(ConfigError::MissingParameter("vdw"))?,
            energy: self.energy.unwrap_or(true),
            energy_groups: self.energy_groups.unwrap_or(1),
        };
        validate(&config)?;
        Ok(config)
    }
}

fn validate(config: &KernelConfig) -> Result<(), ConfigError> {
    let positive = |name, value: f64| {
        if value > 0.0 && value.is_finite() {
            Ok(())
        } else {
            Err(ConfigError::InvalidParameter {
                name,
                value,
                reason: "must be positive and finite",
            })
        }
    };
    positive("table_scale", config.table_scale)?;
    positive("cutoff", config.cutoff)?;
    positive("epsilon_r", config.epsilon_r)?;
    if !(config.table_extension >= 0.0 && config.table_extension.is_finite()) {
        return Err(ConfigError::InvalidParameter {
            name: "table_extension",
            value: config.table_extension,
            reason: "must be non-negative and finite",
        });
    }
    if !(config.epsilon_rf >= 0.0 && config.epsilon_rf.is_finite()) {
        return Err(ConfigError::InvalidParameter {
            name: "epsilon_rf",
            value: config.epsilon_rf,
            reason: "must be non-negative and finite",
        });
    }
    if config.energy_groups == 0 {
        return Err(ConfigError::InvalidParameter {
            name: "energy_groups",
            value: 0.0,
            reason: "at least one energy group is required",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> KernelConfigBuilder {
        KernelConfigBuilder::new()
            .cutoff(1.0)
            .elec(ElecKind::CubicSplineTable)
            .vdw(VdwKind::CubicSplineTable)
    }

    #[test]
    fn build_fills_defaults() {
        let config = minimal().build().unwrap();
        assert_eq!(config.table_scale, DEFAULT_TABLE_SCALE);
        assert_eq!(config.table_extension, DEFAULT_TABLE_EXTENSION);
        assert_eq!(config.epsilon_r, 1.0);
        assert!(config.energy);
        assert_eq!(config.energy_groups, 1);
        assert_eq!(config.table_length(), 2.0);
        assert_eq!(config.table_layout(), Some(TableLayout::CoulombVdw));
    }

    #[test]
    fn build_reports_missing_required_parameters() {
        let result = KernelConfigBuilder::new()
            .elec(ElecKind::Coulomb)
            .vdw(VdwKind::None)
            .build();
        assert_eq!(result, Err(ConfigError::MissingParameter("cutoff")));
        let result = KernelConfigBuilder::new().cutoff(1.0).vdw(VdwKind::None).build();
        assert_eq!(result, Err(ConfigError::MissingParameter("elec")));
    }

    #[test]
    fn build_rejects_invalid_values() {
        assert!(matches!(
            minimal().cutoff(-1.0).build(),
            Err(ConfigError::InvalidParameter { name: "cutoff", .. })
        ));
        assert!(matches!(
            minimal().energy_groups(0).build(),
            Err(ConfigError::InvalidParameter {
                name: "energy_groups",
                ..
            })
        ));
        assert!(matches!(
            minimal().table_extension(f64::NAN).build(),
            Err(ConfigError::InvalidParameter {
                name: "table_extension",
                ..
            })
        ));
    }

    #[test]
    fn analytic_models_need_no_table() {
        let config = minimal()
            .elec(ElecKind::ReactionField)
            .vdw(VdwKind::LennardJones)
            .build()
            .unwrap();
        assert_eq!(config.table_layout(), None);
        let vdw_only = minimal().elec(ElecKind::Coulomb).build().unwrap();
        assert_eq!(vdw_only.table_layout(), Some(TableLayout::Vdw));
    }

    #[test]
    fn reaction_field_constants_follow_dielectrics() {
        let config = minimal()
            .elec(ElecKind::ReactionField)
            .epsilon_rf(0.0)
            .build()
            .unwrap();
        let (krf, crf) = config.reaction_field();
        assert!((krf - 0.5).abs() < 1e-12);
        assert!((crf - 1.5).abs() < 1e-12);
    }
}
