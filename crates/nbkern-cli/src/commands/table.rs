use crate::cli::{TableArgs, TableShape};
use crate::config::build_config;
use crate::error::Result;
use nbkern::core::table::TableLayout;
use nbkern::core::table::io::write_user_table_to_path;
use nbkern::core::table::spline::{TableGenerator, TabulatedElec};
use tracing::info;

/// Writes all three channels, so the file serves any tabulated model combination.
pub fn run(args: TableArgs) -> Result<()> {
    let config = build_config(&args.kernel)?.kernel;
    let elec = match args.shape {
        TableShape::Coulomb => TabulatedElec::Coulomb,
        TableShape::ReactionField => {
            let (krf, crf) = config.reaction_field();
            TabulatedElec::ReactionField { krf, crf }
        }
    };

    info!(
        scale = config.table_scale,
        length = config.table_length(),
        "Generating {:?} table.",
        args.shape
    );
    let table = TableGenerator::new(config.table_scale, config.table_length())?
        .analytic(TableLayout::CoulombVdw, elec)?;
    write_user_table_to_path(&table, &args.output)?;

    println!(
        "Table with {} points up to r = {:.4} written to: {}",
        table.rows() + 1,
        table.max_distance(),
        args.output.display()
    );
    Ok(())
}
