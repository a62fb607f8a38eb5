pub(crate) mod comm;
mod fspibt;
mod lapibt;
mod pibt;

pub use fspibt::FsPibt;
pub use lapibt::LaPibt;

use anyhow::{bail, Result};

use crate::common::Plan;
use crate::config::Config;
use crate::instance::Instance;
use crate::stat::Stats;

pub trait Solver {
    fn name(&self) -> &'static str;
    /// Run the scheduler. `None` means unsolved: unreachable goal, timestep
    /// cap, or computation time cap.
    fn solve(&mut self) -> Option<Plan>;
    fn stats(&self) -> &Stats;
}

pub fn build(config: &Config, instance: &Instance) -> Result<Box<dyn Solver>> {
    match config.solver.as_str() {
        "LAPIBT" => Ok(Box::new(LaPibt::new(instance, config.inheritance_depth)?)),
        "FSPIBT" => Ok(Box::new(FsPibt::new(instance, config.inheritance_depth)?)),
        other => bail!("unknown solver name {other}, available options are ['LAPIBT', 'FSPIBT']"),
    }
}
