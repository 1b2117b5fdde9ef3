use nbkern::engine::config::{DEFAULT_TABLE_EXTENSION, DEFAULT_TABLE_SCALE};
use nbkern::engine::kernel::elec::ElecKind;
use nbkern::engine::kernel::vdw::VdwKind;
use nbkern::workflows::step::DEFAULT_ENTRIES_PER_JOB;

pub struct DefaultsConfig {
    pub cutoff: f64,
    pub elec: ElecKind,
    pub vdw: VdwKind,
    pub table_scale: f64,
    pub table_extension: f64,
    pub epsilon_r: f64,
    pub epsilon_rf: f64,
    pub energy: bool,
    pub steps: usize,
    pub entries_per_job: usize,
    pub tolerance: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            cutoff: 1.0,
            elec: ElecKind::CubicSplineTable,
            vdw: VdwKind::CubicSplineTable,
            table_scale: DEFAULT_TABLE_SCALE,
            table_extension: DEFAULT_TABLE_EXTENSION,
            epsilon_r: 1.0,
            epsilon_rf: 0.0,
            energy: true,
            steps: 1,
            entries_per_job: DEFAULT_ENTRIES_PER_JOB,
            tolerance: 1e-4,
        }
    }
}
