use clap::{Args, Parser, Subcommand, ValueEnum};
use nbkern::engine::kernel::elec::ElecKind;
use nbkern::engine::kernel::vdw::VdwKind;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "nbkern - Tabulated short-range non-bonded force and energy kernels for molecular dynamics.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Number of threads for kernel jobs.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate forces and energies of a system for one or more steps.
    Run(RunArgs),
    /// Generate an interpolation table and write it in the user table format.
    Table(TableArgs),
    /// Compare kernel output with the analytic reference evaluation.
    Verify(VerifyArgs),
}

/// Overrides shared by every subcommand that builds a kernel configuration.
#[derive(Args, Debug, Default, Clone)]
pub struct KernelOverrides {
    /// Path to the kernel configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the interaction cutoff.
    #[arg(long, value_name = "FLOAT")]
    pub cutoff: Option<f64>,

    /// Override the electrostatics model (none, coul, rf, cstab).
    #[arg(long, value_name = "MODEL")]
    pub elec: Option<ElecKind>,

    /// Override the van der Waals model (none, lj, cstab).
    #[arg(long, value_name = "MODEL")]
    pub vdw: Option<VdwKind>,

    /// Override the number of table points per unit distance.
    #[arg(long, value_name = "FLOAT")]
    pub table_scale: Option<f64>,

    /// Override the relative dielectric constant.
    #[arg(long, value_name = "FLOAT")]
    pub epsilon_r: Option<f64>,

    /// Override the reaction-field dielectric constant (0 for a conducting boundary).
    #[arg(long, value_name = "FLOAT")]
    pub epsilon_rf: Option<f64>,

    /// Compute forces only, skipping energies.
    #[arg(long)]
    pub no_energy: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S interactions.cutoff=1.2
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the system description in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub system: PathBuf,

    #[command(flatten)]
    pub kernel: KernelOverrides,

    /// Read the interpolation table from a user table file instead of generating it.
    #[arg(short, long, value_name = "PATH")]
    pub table: Option<PathBuf>,

    /// Override the number of steps to evaluate.
    #[arg(short = 'n', long, value_name = "INT")]
    pub steps: Option<usize>,

    /// Override the number of outer entries per parallel job.
    #[arg(long, value_name = "INT")]
    pub entries_per_job: Option<usize>,

    /// Write the final per-particle forces to a CSV file.
    #[arg(long, value_name = "PATH")]
    pub forces: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableShape {
    /// Plain Coulomb electrostatics.
    Coulomb,
    /// Reaction-field electrostatics with the configured dielectrics.
    ReactionField,
}

/// Arguments for the `table` subcommand.
#[derive(Args, Debug)]
pub struct TableArgs {
    /// Path for the generated table file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    #[command(flatten)]
    pub kernel: KernelOverrides,

    /// Shape of the electrostatics channel.
    #[arg(long, value_enum, default_value_t = TableShape::Coulomb)]
    pub shape: TableShape,
}

/// Arguments for the `verify` subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Path to the system description in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub system: PathBuf,

    #[command(flatten)]
    pub kernel: KernelOverrides,

    /// Largest accepted force and energy deviation, relative to the largest reference value.
    #[arg(long, value_name = "FLOAT")]
    pub tolerance: Option<f64>,

    /// Check every combination of electrostatics and van der Waals models.
    #[arg(long)]
    pub all_models: bool,

    /// Also compare against a brute-force sum over all pairs within the cutoff.
    #[arg(long)]
    pub brute_force: bool,
}
