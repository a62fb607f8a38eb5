mod common;
mod config;
mod instance;
mod map;
mod solver;
mod stat;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, Config};
use crate::instance::Instance;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::new(&cli);

    let default_level = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    config.validate()?;

    let mut instance = Instance::load(&config.instance_path, config.seed)?;
    if let Some(ms) = config.time_limit {
        instance.set_max_comp_time(ms);
    }

    if config.make_scen {
        return instance.write_scen_file(&config.output_path);
    }

    let mut solver = solver::build(&config, &instance)?;
    let mut plan = solver.solve();
    let mut stats = solver.stats().clone();

    // A plan that fails validation must never be reported as solved.
    if let Some(ref found) = plan {
        if !found.validate(
            instance.grid(),
            instance.footprints(),
            instance.starts(),
            instance.goals(),
        ) {
            error!("{} produced an invalid plan", solver.name());
            stats.solved = false;
            plan = None;
        }
    }

    stats.print_summary(solver.name(), plan.as_ref());
    stats.write_log(&config, &instance, solver.name(), plan.as_ref())?;

    // Failing to converge is still a clean exit; only bad input errors out.
    Ok(())
}
