use crate::core::forcefield::term::EnergyTerm;
use crate::core::models::geometry::GeometryKind;
use crate::core::models::nblist::NeighborList;
use crate::core::table::InterpolationTable;
use crate::core::table::spline::TableGenerator;
use crate::engine::accumulator::ForceAccumulator;
use crate::engine::config::KernelConfig;
use crate::engine::error::EngineError;
use crate::engine::kernel::select::NonbondedKernel;
use crate::engine::kernel::{KernelData, KernelSpec};
use crate::engine::parallel::{KernelJob, run_jobs, split_jobs};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::work::WorkCounter;
use tracing::{info, instrument, warn};

/// Outer entries per parallel job.
pub const DEFAULT_ENTRIES_PER_JOB: usize = 256;

/// A neighbor list together with the geometry its entries are built for.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryList {
    pub geometry: GeometryKind,
    pub list: NeighborList,
}

/// Everything that stays fixed between steps: configuration, table and lists.
#[derive(Debug, Clone)]
pub struct StepPlan {
    config: KernelConfig,
    table: Option<InterpolationTable>,
    lists: Vec<GeometryList>,
    entries_per_job: usize,
}

impl StepPlan {
    /// Generates the table the configured models need, if any.
    #[instrument(skip_all, name = "step_plan")]
    pub fn new(config: KernelConfig, lists: Vec<GeometryList>) -> Result<Self, EngineError> {
        let table = match config.table_layout() {
            Some(layout) => Some(
                TableGenerator::new(config.table_scale, config.table_length())?
                    .analytic(layout, config.tabulated_elec())?,
            ),
            None => None,
        };
        Self::build(config, table, lists)
    }

    /// Uses a prepared table, e.g. one read from a user table file.
    pub fn with_table(
        config: KernelConfig,
        table: InterpolationTable,
        lists: Vec<GeometryList>,
    ) -> Result<Self, EngineError> {
        if config.table_layout().is_none() {
            warn!("A table was supplied, but no configured model is tabulated; it will be ignored.");
        }
        if (table.scale() - config.table_scale).abs() > f64::EPSILON * config.table_scale {
            info!(
                "Supplied table scale {} overrides configured scale {}.",
                table.scale(),
                config.table_scale
            );
        }
        Self::build(config, Some(table), lists)
    }

    fn build(
        config: KernelConfig,
        table: Option<InterpolationTable>,
        lists: Vec<GeometryList>,
    ) -> Result<Self, EngineError> {
        let plan = Self {
            config,
            table,
            lists,
            entries_per_job: DEFAULT_ENTRIES_PER_JOB,
        };
        plan.kernels()?;
        Ok(plan)
    }

    pub fn with_entries_per_job(mut self, entries: usize) -> Self {
        self.entries_per_job = entries.max(1);
        self
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn table(&self) -> Option<&InterpolationTable> {
        self.table.as_ref()
    }

    pub fn lists(&self) -> &[GeometryList] {
        &self.lists
    }

    /// One kernel per list, in list order.
    pub fn kernels(&self) -> Result<Vec<NonbondedKernel<'_>>, EngineError> {
        self.lists
            .iter()
            .map(|l| {
                NonbondedKernel::select(
                    KernelSpec::from_config(&self.config, l.geometry),
                    &self.config,
                    self.table.as_ref(),
                )
            })
            .collect()
    }

    /// An accumulator shaped for `data` and the configured energy groups.
    pub fn accumulator(&self, data: &KernelData<'_>) -> ForceAccumulator {
        ForceAccumulator::new(
            data.particles.len(),
            data.shifts.len(),
            self.config.energy_groups,
        )
    }

    /// Checks every list against `data` once, before any pass runs.
    pub fn validate(&self, data: &KernelData<'_>) -> Result<(), EngineError> {
        let probe = self.accumulator(data);
        for (kernel, l) in self.kernels()?.iter().zip(&self.lists) {
            kernel.validate(&l.list, data, &probe)?;
        }
        Ok(())
    }

    /// Runs every list once, adding into `out`.
    pub fn evaluate(
        &self,
        data: &KernelData<'_>,
        out: &mut ForceAccumulator,
        work: &mut WorkCounter,
    ) -> Result<(), EngineError> {
        let kernels = self.kernels()?;
        let jobs = self.jobs(&kernels);
        run_jobs(&jobs, data, out, work)
    }

    fn jobs<'a>(&'a self, kernels: &'a [NonbondedKernel<'a>]) -> Vec<KernelJob<'a>> {
        kernels
            .iter()
            .zip(&self.lists)
            .flat_map(|(kernel, l)| split_jobs(kernel, l.list.view(), self.entries_per_job))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct StepsResult {
    /// Accumulator state after the last step.
    pub accumulator: ForceAccumulator,
    /// Work over all steps.
    pub work: WorkCounter,
    /// Total energy of every step.
    pub energies: Vec<EnergyTerm>,
}

/// Validates once, then evaluates the same configuration `steps` times, resetting the
/// accumulator before each step.
#[instrument(skip_all, name = "kernel_steps", fields(steps = steps))]
pub fn run_steps(
    plan: &StepPlan,
    data: &KernelData<'_>,
    steps: usize,
    reporter: &ProgressReporter,
) -> Result<StepsResult, EngineError> {
    reporter.report(Progress::PhaseStart { name: "Validation" });
    plan.validate(data)?;
    let kernels = plan.kernels()?;
    let jobs = plan.jobs(&kernels);
    reporter.report(Progress::PhaseFinish);
    info!(
        lists = plan.lists().len(),
        jobs = jobs.len(),
        "Validated neighbor lists."
    );

    let mut accumulator = plan.accumulator(data);
    let mut work = WorkCounter::new();
    let mut energies = Vec::with_capacity(steps);

    reporter.report(Progress::StepsStart {
        total_steps: steps as u64,
    });
    for step in 0..steps {
        accumulator.reset();
        run_jobs(&jobs, data, &mut accumulator, &mut work)?;
        let energy = accumulator.energies().total();
        energies.push(energy);
        reporter.report(Progress::StepFinished {
            step: step as u64,
            energy,
        });
    }
    reporter.report(Progress::StepsFinish);

    info!(
        steps,
        flops = work.total_flops(),
        "Finished kernel steps."
    );
    Ok(StepsResult {
        accumulator,
        work,
        energies,
    })
}
