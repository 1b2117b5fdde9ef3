use super::{Prepared, prepare};
use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use crate::system::System;
use crate::utils::progress::CliProgressHandler;
use nbkern::core::table::io::read_user_table_from_path;
use nbkern::engine::accumulator::ForceAccumulator;
use nbkern::engine::kernel::KernelData;
use nbkern::engine::progress::ProgressReporter;
use nbkern::workflows::step::{StepPlan, StepsResult, run_steps};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

#[derive(Serialize)]
struct ForceRow {
    particle: usize,
    fx: f64,
    fy: f64,
    fz: f64,
}

pub fn run(args: RunArgs) -> Result<()> {
    let Prepared {
        config,
        system,
        params,
        lists,
    } = prepare(&args.system, &args.kernel)?;
    let steps = args.steps.unwrap_or(config.steps);
    let entries_per_job = args.entries_per_job.unwrap_or(config.entries_per_job);

    let plan = match (args.table.or(config.table_file), config.kernel.table_layout()) {
        (Some(path), Some(layout)) => {
            info!("Reading interpolation table from {:?}", path);
            let table = read_user_table_from_path(&path, layout)?;
            StepPlan::with_table(config.kernel.clone(), table, lists)?
        }
        (Some(path), None) => {
            warn!(
                "Ignoring table file {:?}: no configured model is tabulated.",
                path
            );
            StepPlan::new(config.kernel.clone(), lists)?
        }
        (None, _) => StepPlan::new(config.kernel.clone(), lists)?,
    }
    .with_entries_per_job(entries_per_job);

    let data = KernelData {
        particles: &system.particles,
        params: &params,
        shifts: &system.shifts,
    };

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    println!("Evaluating {} step(s)...", steps);
    let result = run_steps(&plan, &data, steps, &reporter)?;

    print_energies(&system, &result, config.kernel.energy);
    print_virial(&system, &result.accumulator)?;
    println!("\n{}", result.work);

    if let Some(path) = &args.forces {
        write_forces(path, &result.accumulator)?;
        println!("Forces written to: {}", path.display());
    }
    Ok(())
}

fn print_energies(system: &System, result: &StepsResult, energy: bool) {
    if !energy {
        println!("Energies were not computed (force-only kernels).");
        return;
    }
    let energies = result.accumulator.energies();
    println!(
        "\n{:<24} {:>16} {:>16} {:>16}",
        "Energy group", "Elec", "VdW", "Total"
    );
    for (slot, name) in system.slot_names().iter().enumerate() {
        let term = energies.term(slot);
        println!(
            "{:<24} {:>16.6} {:>16.6} {:>16.6}",
            name,
            term.elec,
            term.vdw,
            term.total()
        );
    }
    let total = energies.total();
    println!(
        "{:<24} {:>16.6} {:>16.6} {:>16.6}",
        "Total",
        total.elec,
        total.vdw,
        total.total()
    );
}

fn print_virial(system: &System, accumulator: &ForceAccumulator) -> Result<()> {
    let virial = accumulator.virial(system.particles.positions(), system.shifts.as_slice())?;
    println!("\nVirial:");
    for row in virial.row_iter() {
        println!("  {:>16.6} {:>16.6} {:>16.6}", row[0], row[1], row[2]);
    }
    Ok(())
}

fn write_forces(path: &Path, accumulator: &ForceAccumulator) -> Result<()> {
    let to_cli = |e: csv::Error| CliError::Other(anyhow::Error::new(e).context(format!(
        "Failed to write forces to {}",
        path.display()
    )));
    let mut writer = csv::Writer::from_path(path).map_err(to_cli)?;
    for (particle, f) in accumulator.forces().iter().enumerate() {
        writer
            .serialize(ForceRow {
                particle,
                fx: f.x,
                fy: f.y,
                fz: f.z,
            })
            .map_err(to_cli)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::KernelOverrides;
    use crate::commands::fixtures;
    use nbkern::core::table::TableLayout;
    use nbkern::core::table::io::write_user_table_to_path;
    use nbkern::core::table::spline::{TableGenerator, TabulatedElec};
    use nbkern::engine::kernel::elec::ElecKind;
    use nbkern::engine::kernel::vdw::VdwKind;

    #[derive(serde::Deserialize)]
    struct Row {
        particle: usize,
        fx: f64,
        fy: f64,
        fz: f64,
    }

    fn run_args(system: &Path, forces: &Path) -> RunArgs {
        RunArgs {
            system: system.to_path_buf(),
            kernel: KernelOverrides::default(),
            table: None,
            steps: Some(2),
            entries_per_job: Some(2),
            forces: Some(forces.to_path_buf()),
        }
    }

    fn read_rows(path: &Path) -> Vec<Row> {
        csv::Reader::from_path(path)
            .unwrap()
            .deserialize()
            .collect::<std::result::Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn run_writes_balanced_forces_for_every_particle() {
        let dir = tempfile::tempdir().unwrap();
        let system = fixtures::write(dir.path(), "ions.toml", fixtures::IONS);
        let forces = dir.path().join("forces.csv");

        run(run_args(&system, &forces)).unwrap();

        let rows = read_rows(&forces);
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().enumerate().all(|(i, r)| r.particle == i));
        let net = rows.iter().fold([0.0; 3], |acc, r| {
            [acc[0] + r.fx, acc[1] + r.fy, acc[2] + r.fz]
        });
        let largest = rows
            .iter()
            .map(|r| (r.fx * r.fx + r.fy * r.fy + r.fz * r.fz).sqrt())
            .fold(0.0, f64::max);
        assert!(largest > 0.0);
        for component in net {
            assert!(component.abs() < 1e-9 * largest);
        }
    }

    #[test]
    fn run_accepts_a_user_table_file() {
        let dir = tempfile::tempdir().unwrap();
        let system = fixtures::write(dir.path(), "water.toml", fixtures::WATER_ION);
        let table_path = dir.path().join("table.xvg");
        let table = TableGenerator::new(500.0, 2.0)
            .unwrap()
            .analytic(TableLayout::CoulombVdw, TabulatedElec::Coulomb)
            .unwrap();
        write_user_table_to_path(&table, &table_path).unwrap();

        let forces = dir.path().join("forces.csv");
        let mut args = run_args(&system, &forces);
        args.table = Some(table_path);
        run(args).unwrap();
        assert_eq!(read_rows(&forces).len(), 4);
    }

    #[test]
    fn table_too_short_for_cutoff_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let system = fixtures::write(dir.path(), "ions.toml", fixtures::IONS);
        let table_path = dir.path().join("short.xvg");
        let table = TableGenerator::new(500.0, 0.5)
            .unwrap()
            .analytic(TableLayout::CoulombVdw, TabulatedElec::Coulomb)
            .unwrap();
        write_user_table_to_path(&table, &table_path).unwrap();

        let mut args = run_args(&system, &dir.path().join("forces.csv"));
        args.table = Some(table_path);
        assert!(matches!(run(args), Err(CliError::Kernel(_))));
    }

    #[test]
    fn force_only_run_succeeds_with_analytic_models() {
        let dir = tempfile::tempdir().unwrap();
        let system = fixtures::write(dir.path(), "ions.toml", fixtures::IONS);
        let forces = dir.path().join("forces.csv");
        let mut args = run_args(&system, &forces);
        args.kernel = KernelOverrides {
            elec: Some(ElecKind::ReactionField),
            vdw: Some(VdwKind::LennardJones),
            no_energy: true,
            ..Default::default()
        };
        run(args).unwrap();
        assert_eq!(read_rows(&forces).len(), 6);
    }
}
