use std::fs::File;
use std::io::Write;

use anyhow::{Context, Result};
use tracing::info;

use crate::common::Plan;
use crate::config::Config;
use crate::instance::Instance;

#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub solved: bool,
    pub comp_time_ms: u128,
    pub preprocessing_time_ms: u128,
    pub lb_soc: usize,
    pub lb_makespan: usize,
}

impl Stats {
    pub fn print_summary(&self, solver: &str, plan: Option<&Plan>) {
        let soc = plan.map_or(0, Plan::soc);
        let makespan = plan.map_or(0, Plan::makespan);
        info!(
            "solved={}, solver={solver}, comp_time(ms)={}, soc={soc} (LB={}), makespan={makespan} (LB={})",
            u8::from(self.solved),
            self.comp_time_ms,
            self.lb_soc,
            self.lb_makespan
        );
    }

    /// Persist the key=value result log, followed by the solution block
    /// unless the short log was requested.
    pub fn write_log(
        &self,
        config: &Config,
        instance: &Instance,
        solver: &str,
        plan: Option<&Plan>,
    ) -> Result<()> {
        let grid = instance.grid();
        let mut log = String::new();

        log.push_str(&format!("instance={}\n", instance.instance_file()));
        log.push_str(&format!("agents={}\n", instance.num_agents()));
        let sizes: Vec<String> = instance
            .footprints()
            .iter()
            .map(|f| f.extent().to_string())
            .collect();
        let key = if instance.is_disk_mode() {
            "radiuses"
        } else {
            "sizes"
        };
        log.push_str(&format!("{}={}\n", key, sizes.join(", ")));
        log.push_str(&format!("map_file={}\n", grid.map_file()));
        log.push_str(&format!("solver={solver}\n"));
        log.push_str(&format!("solved={}\n", u8::from(self.solved)));
        log.push_str(&format!("soc={}\n", plan.map_or(0, Plan::soc)));
        log.push_str(&format!("lb_soc={}\n", self.lb_soc));
        log.push_str(&format!("makespan={}\n", plan.map_or(0, Plan::makespan)));
        log.push_str(&format!("lb_makespan={}\n", self.lb_makespan));
        log.push_str(&format!("comp_time={}\n", self.comp_time_ms));
        log.push_str(&format!(
            "preprocessing_comp_time={}\n",
            self.preprocessing_time_ms
        ));

        if !config.log_short {
            log.push_str("starts=");
            for &start in instance.starts() {
                let (x, y) = grid.pos(start);
                log.push_str(&format!("({x},{y}),"));
            }
            log.push_str("\ngoals=");
            for &goal in instance.goals() {
                let (x, y) = grid.pos(goal);
                log.push_str(&format!("({x},{y}),"));
            }
            log.push('\n');
            if let Some(plan) = plan {
                log.push_str("solution=\n");
                for t in 0..=plan.makespan() {
                    log.push_str(&format!("{t}:"));
                    for &v in plan.get(t) {
                        let (x, y) = grid.pos(v);
                        log.push_str(&format!("({x},{y}),"));
                    }
                    log.push('\n');
                }
            }
        }

        let mut file = File::create(&config.output_path)
            .with_context(|| format!("cannot create output file {}", config.output_path))?;
        file.write_all(log.as_bytes())?;
        Ok(())
    }
}
