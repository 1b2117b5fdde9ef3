pub mod run;
pub mod table;
pub mod verify;

use crate::cli::KernelOverrides;
use crate::config::{AppConfig, build_config};
use crate::error::Result;
use crate::system::System;
use nbkern::core::models::params::InteractionParams;
use nbkern::engine::error::EngineError;
use nbkern::workflows::step::GeometryList;
use std::path::Path;
use tracing::info;

/// Configuration, system and lists of a command that evaluates kernels.
struct Prepared {
    config: AppConfig,
    system: System,
    params: InteractionParams,
    lists: Vec<GeometryList>,
}

fn prepare(system_path: &Path, overrides: &KernelOverrides) -> Result<Prepared> {
    let mut config = build_config(overrides)?;
    info!("Loading system from {:?}", system_path);
    let system = System::from_file(system_path)?;

    let lists = system.lists(config.kernel.cutoff);
    let groups = system.energy_groups();
    if groups > config.kernel.energy_groups {
        info!(
            "Raising energy groups from {} to {} to match the system.",
            config.kernel.energy_groups, groups
        );
        config.kernel.energy_groups = groups;
    }

    let epsfac = config.kernel.epsfac().map_err(EngineError::from)?;
    let params = system.params(epsfac)?;
    Ok(Prepared {
        config,
        system,
        params,
        lists,
    })
}
