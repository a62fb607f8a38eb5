use anyhow::{bail, Result};

use crate::common::Plan;
use crate::instance::Instance;
use crate::solver::pibt::PibtEngine;
use crate::solver::Solver;
use crate::stat::Stats;

// Probability of passing over an escape candidate. Non-zero so symmetric
// inheritance chains cannot lock step forever.
const ESCAPE_SKIP_PROB: f32 = 0.175;

/// Priority inheritance with backtracking for square agents.
pub struct LaPibt {
    engine: PibtEngine,
}

impl LaPibt {
    pub fn new(instance: &Instance, inheritance_depth: usize) -> Result<Self> {
        if instance.is_disk_mode() {
            bail!("LAPIBT plans square agents; use FSPIBT for disks");
        }
        Ok(Self {
            engine: PibtEngine::new(instance, inheritance_depth, ESCAPE_SKIP_PROB),
        })
    }
}

impl Solver for LaPibt {
    fn name(&self) -> &'static str {
        "LAPIBT"
    }

    fn solve(&mut self) -> Option<Plan> {
        self.engine.solve()
    }

    fn stats(&self) -> &Stats {
        &self.engine.stats
    }
}
