use anyhow::{bail, Result};

use crate::common::Plan;
use crate::instance::Instance;
use crate::solver::pibt::PibtEngine;
use crate::solver::Solver;
use crate::stat::Stats;

// Disks collide over a wider halo than squares, so their escape search skips
// candidates more aggressively to shake symmetric chains apart.
const ESCAPE_SKIP_PROB: f32 = 0.5;

/// Priority inheritance with backtracking for disk agents in free space.
pub struct FsPibt {
    engine: PibtEngine,
}

impl FsPibt {
    pub fn new(instance: &Instance, inheritance_depth: usize) -> Result<Self> {
        if !instance.is_disk_mode() {
            bail!("FSPIBT plans disk agents; use LAPIBT for squares");
        }
        Ok(Self {
            engine: PibtEngine::new(instance, inheritance_depth, ESCAPE_SKIP_PROB),
        })
    }
}

impl Solver for FsPibt {
    fn name(&self) -> &'static str {
        "FSPIBT"
    }

    fn solve(&mut self) -> Option<Plan> {
        self.engine.solve()
    }

    fn stats(&self) -> &Stats {
        &self.engine.stats
    }
}
