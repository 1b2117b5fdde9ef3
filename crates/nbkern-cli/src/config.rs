mod defaults;

pub use defaults::DefaultsConfig;

use crate::cli::KernelOverrides;
use crate::error::{CliError, Result};
use nbkern::engine::config::{KernelConfig, KernelConfigBuilder};
use nbkern::engine::kernel::elec::ElecKind;
use nbkern::engine::kernel::vdw::VdwKind;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialInteractionConfig {
    cutoff: Option<f64>,
    elec: Option<ElecKind>,
    vdw: Option<VdwKind>,
    epsilon_r: Option<f64>,
    epsilon_rf: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialTableConfig {
    scale: Option<f64>,
    extension: Option<f64>,
    file: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialOutputConfig {
    energy: Option<bool>,
    energy_groups: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialExecutionConfig {
    steps: Option<usize>,
    entries_per_job: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialVerifyConfig {
    tolerance: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialKernelFile {
    interactions: Option<PartialInteractionConfig>,
    table: Option<PartialTableConfig>,
    output: Option<PartialOutputConfig>,
    execution: Option<PartialExecutionConfig>,
    verify: Option<PartialVerifyConfig>,
}

/// Fully merged settings of one invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub kernel: KernelConfig,
    pub table_file: Option<PathBuf>,
    pub steps: usize,
    pub entries_per_job: usize,
    pub tolerance: f64,
}

impl PartialKernelFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// File values, then `--set` values, then explicit CLI flags, then defaults.
    pub fn merge_with_cli(mut self, args: &KernelOverrides) -> Result<AppConfig> {
        self.apply_set_values(&args.set_values)?;
        let defaults = DefaultsConfig::default();

        let interactions = self.interactions.take().unwrap_or_default();
        let table = self.table.take().unwrap_or_default();
        let output = self.output.take().unwrap_or_default();
        let execution = self.execution.take().unwrap_or_default();
        let verify = self.verify.take().unwrap_or_default();

        let energy = if args.no_energy {
            false
        } else {
            output.energy.unwrap_or(defaults.energy)
        };

        let kernel = KernelConfigBuilder::new()
            .cutoff(args.cutoff.or(interactions.cutoff).unwrap_or(defaults.cutoff))
            .elec(args.elec.or(interactions.elec).unwrap_or(defaults.elec))
            .vdw(args.vdw.or(interactions.vdw).unwrap_or(defaults.vdw))
            .epsilon_r(
                args.epsilon_r
                    .or(interactions.epsilon_r)
                    .unwrap_or(defaults.epsilon_r),
            )
            .epsilon_rf(
                args.epsilon_rf
                    .or(interactions.epsilon_rf)
                    .unwrap_or(defaults.epsilon_rf),
            )
            .table_scale(args.table_scale.or(table.scale).unwrap_or(defaults.table_scale))
            .table_extension(table.extension.unwrap_or(defaults.table_extension))
            .energy(energy)
            .energy_groups(output.energy_groups.unwrap_or(1))
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        Ok(AppConfig {
            kernel,
            table_file: table.file,
            steps: execution.steps.unwrap_or(defaults.steps),
            entries_per_job: execution
                .entries_per_job
                .unwrap_or(defaults.entries_per_job),
            tolerance: verify.tolerance.unwrap_or(defaults.tolerance),
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let (key, value) = (key.trim(), value.trim());

            match key {
                "interactions.cutoff" => {
                    self.interactions().cutoff = Some(parse_value(key, value)?);
                }
                "interactions.elec" => {
                    self.interactions().elec = Some(parse_value(key, value)?);
                }
                "interactions.vdw" => {
                    self.interactions().vdw = Some(parse_value(key, value)?);
                }
                "interactions.epsilon-r" => {
                    self.interactions().epsilon_r = Some(parse_value(key, value)?);
                }
                "interactions.epsilon-rf" => {
                    self.interactions().epsilon_rf = Some(parse_value(key, value)?);
                }
                "table.scale" => {
                    self.table.get_or_insert_with(Default::default).scale =
                        Some(parse_value(key, value)?);
                }
                "table.extension" => {
                    self.table.get_or_insert_with(Default::default).extension =
                        Some(parse_value(key, value)?);
                }
                "table.file" => {
                    self.table.get_or_insert_with(Default::default).file =
                        Some(PathBuf::from(value));
                }
                "output.energy" => {
                    self.output.get_or_insert_with(Default::default).energy =
                        Some(parse_value(key, value)?);
                }
                "output.energy-groups" => {
                    self.output.get_or_insert_with(Default::default).energy_groups =
                        Some(parse_value(key, value)?);
                }
                "execution.steps" => {
                    self.execution.get_or_insert_with(Default::default).steps =
                        Some(parse_value(key, value)?);
                }
                "execution.entries-per-job" => {
                    self.execution
                        .get_or_insert_with(Default::default)
                        .entries_per_job = Some(parse_value(key, value)?);
                }
                "verify.tolerance" => {
                    self.verify.get_or_insert_with(Default::default).tolerance =
                        Some(parse_value(key, value)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    fn interactions(&mut self) -> &mut PartialInteractionConfig {
        self.interactions.get_or_insert_with(Default::default)
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}

/// Loads the configuration file named in `args`, if any, and merges it with the CLI.
pub fn build_config(args: &KernelOverrides) -> Result<AppConfig> {
    let file = match &args.config {
        Some(path) => PartialKernelFile::from_file(path)?,
        None => PartialKernelFile::default(),
    };
    file.merge_with_cli(args)
}
