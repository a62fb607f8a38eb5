use anyhow::anyhow;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "Rust LA-MAPF",
    about = "Large-agent MAPF via priority inheritance with backtracking, implemented in Rust.",
    version = "1.0"
)]
pub struct Cli {
    #[arg(short = 'i', long, help = "Path to the instance file")]
    pub instance: String,

    #[arg(
        short = 's',
        long,
        default_value = "LAPIBT",
        help = "Solver to use (LAPIBT | FSPIBT)"
    )]
    pub solver: String,

    #[arg(
        short = 'o',
        long,
        default_value = "./result.txt",
        help = "Path to the output log file"
    )]
    pub output: String,

    #[arg(short = 'v', long, default_value_t = false, help = "Print additional info")]
    pub verbose: bool,

    #[arg(
        short = 'T',
        long,
        help = "Max computation time in ms, overriding the instance file"
    )]
    pub time_limit: Option<u64>,

    #[arg(
        short = 'L',
        long,
        default_value_t = false,
        help = "Use the short log without the solution block"
    )]
    pub log_short: bool,

    #[arg(
        short = 'P',
        long,
        default_value_t = false,
        help = "Write a scenario file with concrete starts/goals and exit"
    )]
    pub make_scen: bool,

    #[arg(
        short = 'D',
        long,
        default_value_t = 5,
        help = "Inheritance depth of LA-PIBT"
    )]
    pub inheritance_depth: usize,

    #[arg(
        short = 'x',
        long,
        help = "Random seed, used only when the instance file sets none"
    )]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub instance_path: String,
    pub solver: String,
    pub output_path: String,
    pub verbose: bool,
    pub time_limit: Option<u64>,
    pub log_short: bool,
    pub make_scen: bool,
    pub inheritance_depth: usize,
    pub seed: Option<u64>,
}

impl Config {
    pub fn new(cli: &Cli) -> Self {
        Self {
            instance_path: cli.instance.clone(),
            solver: cli.solver.clone(),
            output_path: cli.output.clone(),
            verbose: cli.verbose,
            time_limit: cli.time_limit,
            log_short: cli.log_short,
            make_scen: cli.make_scen,
            inheritance_depth: cli.inheritance_depth,
            seed: cli.seed,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        match self.solver.as_str() {
            "LAPIBT" | "FSPIBT" => {}
            other => {
                return Err(anyhow!(
                    "unknown solver name {other}, available options are ['LAPIBT', 'FSPIBT']"
                ));
            }
        }

        if let Some(0) = self.time_limit {
            return Err(anyhow!("time limit must be positive, got 0"));
        }

        Ok(())
    }
}
