use super::{Prepared, prepare};
use crate::cli::VerifyArgs;
use crate::error::{CliError, Result};
use nbkern::engine::accumulator::ForceAccumulator;
use nbkern::engine::config::KernelConfig;
use nbkern::engine::kernel::KernelData;
use nbkern::engine::kernel::elec::ElecKind;
use nbkern::engine::kernel::vdw::VdwKind;
use nbkern::engine::work::WorkCounter;
use nbkern::workflows::reference::{self, ParticleLabels, ReferenceModel};
use nbkern::workflows::step::{GeometryList, StepPlan};
use tracing::{info, instrument, warn};

/// Largest force and energy differences, each relative to the largest reference magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Deviation {
    force: f64,
    energy: Option<f64>,
}

impl Deviation {
    fn between(actual: &ForceAccumulator, expected: &ForceAccumulator, energy: bool) -> Self {
        let (dev, largest) = reference::max_force_deviation(actual, expected);
        let energy = energy.then(|| {
            let (a, e) = (actual.energies(), expected.energies());
            let pairs = a
                .elec()
                .iter()
                .zip(e.elec())
                .chain(a.vdw().iter().zip(e.vdw()));
            let (dev, largest) = pairs.fold((0.0f64, 0.0f64), |(dev, largest), (x, y)| {
                (dev.max((x - y).abs()), largest.max(y.abs()))
            });
            relative(dev, largest)
        });
        Self {
            force: relative(dev, largest),
            energy,
        }
    }

    fn within(&self, tolerance: f64) -> bool {
        self.force <= tolerance && self.energy.is_none_or(|e| e <= tolerance)
    }
}

fn relative(dev: f64, scale: f64) -> f64 {
    if scale > 0.0 { dev / scale } else { dev }
}

#[instrument(skip_all, name = "verify_command")]
pub fn run(args: VerifyArgs) -> Result<()> {
    let Prepared {
        config,
        system,
        params,
        lists,
    } = prepare(&args.system, &args.kernel)?;
    let tolerance = args.tolerance.unwrap_or(config.tolerance);
    if !(tolerance > 0.0 && tolerance.is_finite()) {
        return Err(CliError::Argument(format!(
            "tolerance must be positive, got {}",
            tolerance
        )));
    }

    let variants = if args.all_models {
        model_variants(&config.kernel)
    } else {
        vec![config.kernel.clone()]
    };
    let data = KernelData {
        particles: &system.particles,
        params: &params,
        shifts: &system.shifts,
    };

    let brute_force = args.brute_force && !system.has_explicit_lists();
    if args.brute_force && !brute_force {
        warn!("Skipping the brute-force comparison: the system supplies its own lists.");
    }

    println!(
        "{:<20} {:>12} {:>12} {:>8}",
        "Models", "Force dev", "Energy dev", "Status"
    );
    let mut failed = 0;
    let mut checked = 0;
    for variant in &variants {
        let name = format!("Elec{}_Vdw{}", variant.elec, variant.vdw);
        let mut deviations = vec![("list", against_list_reference(variant, &lists, &data)?)];
        if brute_force {
            deviations.push((
                "all pairs",
                against_brute_force(variant, &lists, &data, &system.labels)?,
            ));
        }
        for (against, deviation) in deviations {
            checked += 1;
            let ok = deviation.within(tolerance);
            if !ok {
                failed += 1;
            }
            println!(
                "{:<20} {:>12.3e} {:>12} {:>8}  ({})",
                name,
                deviation.force,
                deviation
                    .energy
                    .map_or_else(|| "-".to_string(), |e| format!("{:.3e}", e)),
                if ok { "ok" } else { "FAILED" },
                against
            );
        }
    }

    info!(checked, failed, tolerance, "Verification finished.");
    if failed > 0 {
        return Err(CliError::Verification { failed, checked });
    }
    println!("All {} comparison(s) within {:.1e}.", checked, tolerance);
    Ok(())
}

/// Every electrostatics and van der Waals model pair with at least one interaction.
fn model_variants(base: &KernelConfig) -> Vec<KernelConfig> {
    ElecKind::ALL
        .into_iter()
        .flat_map(|elec| VdwKind::ALL.into_iter().map(move |vdw| (elec, vdw)))
        .filter(|(elec, vdw)| elec.is_active() || vdw.is_active())
        .map(|(elec, vdw)| KernelConfig {
            elec,
            vdw,
            ..base.clone()
        })
        .collect()
}

fn evaluate_kernels(
    config: &KernelConfig,
    lists: &[GeometryList],
    data: &KernelData<'_>,
) -> Result<(StepPlan, ForceAccumulator)> {
    let plan = StepPlan::new(config.clone(), lists.to_vec())?;
    plan.validate(data)?;
    let mut out = plan.accumulator(data);
    plan.evaluate(data, &mut out, &mut WorkCounter::new())?;
    Ok((plan, out))
}

fn against_list_reference(
    config: &KernelConfig,
    lists: &[GeometryList],
    data: &KernelData<'_>,
) -> Result<Deviation> {
    let (plan, actual) = evaluate_kernels(config, lists, data)?;
    let model = ReferenceModel::from_config(config);
    let mut expected = plan.accumulator(data);
    for l in lists {
        reference::evaluate_list(&model, l.geometry, &l.list, data, &mut expected);
    }
    Ok(Deviation::between(&actual, &expected, config.energy))
}

fn against_brute_force(
    config: &KernelConfig,
    lists: &[GeometryList],
    data: &KernelData<'_>,
    labels: &ParticleLabels,
) -> Result<Deviation> {
    let (_, actual) = evaluate_kernels(config, lists, data)?;
    let model = ReferenceModel::from_config(config);
    let expected = reference::brute_force(&model, data, config.cutoff, labels);
    Ok(Deviation::between(&actual, &expected, config.energy))
}
