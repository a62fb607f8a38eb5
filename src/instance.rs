use std::collections::{HashSet, VecDeque};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};

use anyhow::{anyhow, bail, Context, Result};
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::common::Footprint;
use crate::map::Grid;

const DEFAULT_SEED: u64 = 0;
const DEFAULT_MAX_TIMESTEP: usize = 5000;
const DEFAULT_MAX_COMP_TIME: u64 = 30_000;
const DEFAULT_SQUARE_SIDE: f32 = 0.45;

/// A fully-resolved problem: grid, starts, goals, footprints, knobs.
#[derive(Debug, Clone)]
pub struct Instance {
    instance_file: String,
    grid: Grid,
    starts: Vec<usize>,
    goals: Vec<usize>,
    footprints: Vec<Footprint>,
    seed: u64,
    max_timestep: usize,
    max_comp_time: u64,
}

#[derive(Debug)]
enum SizeSpec {
    Squares(Vec<f32>),
    SquaresUniform(f32, f32),
    Disks(Vec<f32>),
}

/// Snapshot of generated agents, dumped for debugging reproducibility.
#[derive(Debug, Serialize, Deserialize)]
struct GeneratedAgent {
    id: usize,
    start: (i32, i32),
    goal: (i32, i32),
    size: f32,
}

impl Instance {
    /// Parse a line-oriented key=value instance file. `fallback_seed` is used
    /// only when the file itself sets no seed.
    pub fn load(path: &str, fallback_seed: Option<u64>) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("instance file {path} is not found"))?;
        Self::from_reader(path, BufReader::new(file), fallback_seed)
    }

    fn from_reader(
        path: &str,
        reader: impl BufRead,
        fallback_seed: Option<u64>,
    ) -> Result<Self> {
        let mut map_file: Option<String> = None;
        let mut num_agents: usize = 0;
        let mut size_spec: Option<SizeSpec> = None;
        let mut seed: Option<u64> = None;
        let mut random_problem = false;
        let mut well_formed = false;
        let mut max_timestep = DEFAULT_MAX_TIMESTEP;
        let mut max_comp_time = DEFAULT_MAX_COMP_TIME;
        let mut pairs: Vec<(i32, i32, i32, i32)> = Vec::new();

        // Keys may come in any order, so collect everything before resolving.
        for line in reader.lines() {
            let line = line?;
            let line = line.trim_end_matches('\r').trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let value = value.trim();
                match key.trim() {
                    "map_file" => map_file = Some(value.to_string()),
                    "agents" => num_agents = value.parse()?,
                    "sizes" => size_spec = Some(SizeSpec::Squares(parse_float_list(value)?)),
                    "radiuses" => size_spec = Some(SizeSpec::Disks(parse_float_list(value)?)),
                    "sizes_random_uniform" => {
                        let (min, max) = value
                            .split_once(',')
                            .ok_or_else(|| anyhow!("malformed sizes_random_uniform: {value}"))?;
                        size_spec = Some(SizeSpec::SquaresUniform(
                            min.trim().parse()?,
                            max.trim().parse()?,
                        ));
                    }
                    "seed" => seed = Some(value.parse()?),
                    "random_problem" => random_problem = value.parse::<usize>()? != 0,
                    "well_formed" => well_formed = value.parse::<usize>()? != 0,
                    "max_timestep" => max_timestep = value.parse()?,
                    "max_comp_time" => max_comp_time = value.parse()?,
                    other => bail!("unknown instance key: {other}"),
                }
            } else {
                let fields: Vec<&str> = line.split(',').map(str::trim).collect();
                if fields.len() != 4 {
                    bail!("unparseable instance line: {line}");
                }
                pairs.push((
                    fields[0].parse()?,
                    fields[1].parse()?,
                    fields[2].parse()?,
                    fields[3].parse()?,
                ));
            }
        }

        let map_file = map_file.ok_or_else(|| anyhow!("instance {path} sets no map_file"))?;
        let grid = Grid::from_file(&map_file)?;
        if num_agents == 0 {
            bail!("invalid number of agents");
        }

        let seed = seed.or(fallback_seed).unwrap_or(DEFAULT_SEED);
        let mut rng = StdRng::seed_from_u64(seed);
        let footprints = resolve_footprints(size_spec, num_agents, &mut rng);

        let (starts, goals) = if !random_problem && pairs.len() >= num_agents {
            explicit_starts_goals(&grid, &footprints, &pairs[..num_agents])?
        } else {
            if !pairs.is_empty() && !random_problem {
                warn!("given starts/goals are not sufficient, randomly creating the instance");
            }
            let starts = place_random(&grid, &footprints, &mut rng)?;
            let goals = if well_formed {
                well_formed_goals(&grid, &footprints, &starts, &mut rng)?
            } else {
                place_random(&grid, &footprints, &mut rng)?
            };
            write_debug_yaml("debug.yaml", &grid, &starts, &goals, &footprints)?;
            (starts, goals)
        };

        Ok(Instance {
            instance_file: path.to_string(),
            grid,
            starts,
            goals,
            footprints,
            seed,
            max_timestep,
            max_comp_time,
        })
    }

    /// Re-emit the resolved problem as an instance file with concrete
    /// starts and goals.
    pub fn write_scen_file(&self, path: &str) -> Result<()> {
        let mut out = String::new();
        out.push_str(&format!("map_file={}\n", self.grid.map_file()));
        out.push_str(&format!("agents={}\n", self.starts.len()));
        let sizes: Vec<String> = self
            .footprints
            .iter()
            .map(|f| f.extent().to_string())
            .collect();
        let key = if self.is_disk_mode() { "radiuses" } else { "sizes" };
        out.push_str(&format!("{}={}\n", key, sizes.join(", ")));
        out.push_str(&format!("seed={}\n", self.seed));
        out.push_str("random_problem=0\n");
        out.push_str(&format!("max_timestep={}\n", self.max_timestep));
        out.push_str(&format!("max_comp_time={}\n", self.max_comp_time));
        for i in 0..self.starts.len() {
            let (sx, sy) = self.grid.pos(self.starts[i]);
            let (gx, gy) = self.grid.pos(self.goals[i]);
            out.push_str(&format!("{sx},{sy},{gx},{gy}\n"));
        }

        let mut file =
            File::create(path).with_context(|| format!("cannot create scenario file {path}"))?;
        file.write_all(out.as_bytes())?;
        info!("scenario written to {path}");
        Ok(())
    }

    pub fn instance_file(&self) -> &str {
        &self.instance_file
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn num_agents(&self) -> usize {
        self.starts.len()
    }

    pub fn starts(&self) -> &[usize] {
        &self.starts
    }

    pub fn goals(&self) -> &[usize] {
        &self.goals
    }

    pub fn footprints(&self) -> &[Footprint] {
        &self.footprints
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn max_timestep(&self) -> usize {
        self.max_timestep
    }

    pub fn max_comp_time(&self) -> u64 {
        self.max_comp_time
    }

    pub fn set_max_comp_time(&mut self, ms: u64) {
        self.max_comp_time = ms;
    }

    pub fn is_disk_mode(&self) -> bool {
        self.footprints.first().is_some_and(Footprint::is_disk)
    }

    #[cfg(test)]
    pub(crate) fn for_tests(
        grid: Grid,
        starts: Vec<usize>,
        goals: Vec<usize>,
        footprints: Vec<Footprint>,
        seed: u64,
        max_timestep: usize,
        max_comp_time: u64,
    ) -> Self {
        Instance {
            instance_file: "inline".to_string(),
            grid,
            starts,
            goals,
            footprints,
            seed,
            max_timestep,
            max_comp_time,
        }
    }
}

fn parse_float_list(value: &str) -> Result<Vec<f32>> {
    value
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<f32>()
                .with_context(|| format!("malformed size value: {token}"))
        })
        .collect()
}

fn resolve_footprints(spec: Option<SizeSpec>, num_agents: usize, rng: &mut StdRng) -> Vec<Footprint> {
    match spec.unwrap_or(SizeSpec::Squares(Vec::new())) {
        SizeSpec::Squares(mut sides) => {
            if sides.len() < num_agents {
                warn!(
                    "only {} sizes given for {num_agents} agents, filling the rest with {DEFAULT_SQUARE_SIDE}",
                    sides.len()
                );
                sides.resize(num_agents, DEFAULT_SQUARE_SIDE);
            }
            sides.truncate(num_agents);
            sides
                .into_iter()
                .map(|side| Footprint::Square { side })
                .collect()
        }
        SizeSpec::SquaresUniform(min, max) => (0..num_agents)
            .map(|_| Footprint::Square {
                side: rng.gen_range(min..=max),
            })
            .collect(),
        SizeSpec::Disks(mut radii) => {
            if radii.len() < num_agents {
                warn!(
                    "only {} radiuses given for {num_agents} agents, drawing the rest from [1, 2]",
                    radii.len()
                );
                while radii.len() < num_agents {
                    radii.push(rng.gen_range(1.0..=2.0));
                }
            }
            radii.truncate(num_agents);
            radii
                .into_iter()
                .map(|radius| Footprint::Disk { radius })
                .collect()
        }
    }
}

fn explicit_starts_goals(
    grid: &Grid,
    footprints: &[Footprint],
    pairs: &[(i32, i32, i32, i32)],
) -> Result<(Vec<usize>, Vec<usize>)> {
    let mut starts = Vec::with_capacity(pairs.len());
    let mut goals = Vec::with_capacity(pairs.len());
    for (i, &(sx, sy, gx, gy)) in pairs.iter().enumerate() {
        if !grid.footprint_fits(sx, sy, &footprints[i]) {
            bail!(
                "start ({sx}, {sy}) does not exist, or there are obstacles within the footprint of agent {i}"
            );
        }
        if !grid.footprint_fits(gx, gy, &footprints[i]) {
            bail!(
                "goal ({gx}, {gy}) does not exist, or there are obstacles within the footprint of agent {i}"
            );
        }
        starts.push(grid.id(sx as usize, sy as usize));
        goals.push(grid.id(gx as usize, gy as usize));
    }
    Ok((starts, goals))
}

fn overlaps_any(grid: &Grid, footprints: &[Footprint], placed: &[usize], cell: usize, k: usize) -> bool {
    placed.iter().enumerate().any(|(j, &q)| {
        footprints[k].overlaps(grid.pos(cell), &footprints[j], grid.pos(q))
    })
}

/// Draw a collision-free, footprint-feasible cell for every agent.
fn place_random(grid: &Grid, footprints: &[Footprint], rng: &mut StdRng) -> Result<Vec<usize>> {
    let mut cells: Vec<usize> = (0..grid.num_nodes()).collect();
    cells.shuffle(rng);

    let mut placed: Vec<usize> = Vec::new();
    let mut next = 0;
    while placed.len() < footprints.len() {
        let k = placed.len();
        loop {
            if next >= cells.len() {
                bail!("number of agents is too large for the map");
            }
            let cell = cells[next];
            next += 1;
            let (x, y) = grid.pos(cell);
            if grid.footprint_fits(x, y, &footprints[k])
                && !overlaps_any(grid, footprints, &placed, cell, k)
            {
                placed.push(cell);
                break;
            }
        }
    }
    Ok(placed)
}

/// Goals drawn from the footprint-feasible component reachable from each
/// agent's start.
fn well_formed_goals(
    grid: &Grid,
    footprints: &[Footprint],
    starts: &[usize],
    rng: &mut StdRng,
) -> Result<Vec<usize>> {
    let mut goals: Vec<usize> = Vec::new();
    for (k, &start) in starts.iter().enumerate() {
        let mut reachable = HashSet::new();
        let mut open = VecDeque::from([start]);
        reachable.insert(start);
        while let Some(n) = open.pop_front() {
            for &m in grid.neighbors(n) {
                if reachable.contains(&m) {
                    continue;
                }
                let (x, y) = grid.pos(m);
                if grid.footprint_fits(x, y, &footprints[k]) {
                    reachable.insert(m);
                    open.push_back(m);
                }
            }
        }

        let mut cells: Vec<usize> = (0..grid.num_nodes()).collect();
        cells.shuffle(rng);
        let goal = cells
            .into_iter()
            .find(|&cell| reachable.contains(&cell) && !overlaps_any(grid, footprints, &goals, cell, k))
            .ok_or_else(|| anyhow!("no well-formed goal available for agent {k}"))?;
        goals.push(goal);
    }
    Ok(goals)
}

fn write_debug_yaml(
    path: &str,
    grid: &Grid,
    starts: &[usize],
    goals: &[usize],
    footprints: &[Footprint],
) -> Result<()> {
    let records: Vec<GeneratedAgent> = (0..starts.len())
        .map(|i| GeneratedAgent {
            id: i,
            start: grid.pos(starts[i]),
            goal: grid.pos(goals[i]),
            size: footprints[i].extent(),
        })
        .collect();
    info!("generated agents: {records:?}");

    let file = File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    let yaml = serde_yaml::to_string(&records)?;
    writer.write_all(yaml.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_map(name: &str) -> String {
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, "type octile\nheight 4\nwidth 6\nmap\n......\n......\n......\n......\n").unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn test_parse_explicit_instance() {
        let map_path = write_map("lamapf_inst_explicit.map");
        let text = format!(
            "# two agents on an open block\nmap_file={map_path}\nagents=2\nsizes=(0.45, 0.45)\nseed=3\nmax_timestep=64\nmax_comp_time=900\n0,0,5,3\n5,3,0,0\n"
        );
        let instance =
            Instance::from_reader("inline", text.as_bytes(), None).unwrap();

        assert_eq!(instance.num_agents(), 2);
        assert_eq!(instance.seed(), 3);
        assert_eq!(instance.max_timestep(), 64);
        assert_eq!(instance.max_comp_time(), 900);
        assert!(!instance.is_disk_mode());
        assert_eq!(instance.starts()[0], instance.grid().id(0, 0));
        assert_eq!(instance.goals()[1], instance.grid().id(0, 0));
    }

    #[test]
    fn test_sizes_padded_with_default() {
        let map_path = write_map("lamapf_inst_pad.map");
        let text = format!("map_file={map_path}\nagents=3\nsizes=(1.0)\n0,0,1,0\n3,0,4,0\n0,3,1,3\n");
        let instance = Instance::from_reader("inline", text.as_bytes(), None).unwrap();

        assert_eq!(
            instance.footprints(),
            &[
                Footprint::Square { side: 1.0 },
                Footprint::Square { side: 0.45 },
                Footprint::Square { side: 0.45 },
            ]
        );
    }

    #[test]
    fn test_disk_mode_and_infeasible_start_rejected() {
        let map_path = write_map("lamapf_inst_disk.map");
        let ok = format!("map_file={map_path}\nagents=1\nradiuses=(1.2)\n2,2,3,1\n");
        let instance = Instance::from_reader("inline", ok.as_bytes(), None).unwrap();
        assert!(instance.is_disk_mode());

        // (0, 0) cannot host a radius-1.2 disk.
        let bad = format!("map_file={map_path}\nagents=1\nradiuses=(1.2)\n0,0,3,1\n");
        assert!(Instance::from_reader("inline", bad.as_bytes(), None).is_err());
    }

    #[test]
    fn test_random_generation_is_seeded() {
        let map_path = write_map("lamapf_inst_random.map");
        let text =
            format!("map_file={map_path}\nagents=4\nsizes=(0.45, 0.45, 0.45, 0.45)\nseed=7\nrandom_problem=1\n");

        let first = Instance::from_reader("inline", text.as_bytes(), None).unwrap();
        let second = Instance::from_reader("inline", text.as_bytes(), None).unwrap();
        assert_eq!(first.starts(), second.starts());
        assert_eq!(first.goals(), second.goals());

        for (i, &start) in first.starts().iter().enumerate() {
            let (x, y) = first.grid().pos(start);
            assert!(first.grid().footprint_fits(x, y, &first.footprints()[i]));
            for j in 0..i {
                assert!(!first.footprints()[i].overlaps(
                    first.grid().pos(start),
                    &first.footprints()[j],
                    first.grid().pos(first.starts()[j])
                ));
            }
        }
    }

    #[test]
    fn test_well_formed_goals_are_reachable() {
        use crate::solver::comm::DistanceTable;

        let map_path = write_map("lamapf_inst_wf.map");
        let text = format!(
            "map_file={map_path}\nagents=3\nradiuses=(0.4, 0.4, 0.4)\nseed=11\nrandom_problem=1\nwell_formed=1\nmax_timestep=50\n"
        );
        let instance = Instance::from_reader("inline", text.as_bytes(), None).unwrap();

        let dist = DistanceTable::build(
            instance.grid(),
            instance.goals(),
            instance.footprints(),
            instance.max_timestep(),
        );
        for (i, &start) in instance.starts().iter().enumerate() {
            assert_ne!(dist.get(i, start), dist.unreachable());
        }
    }

    #[test]
    fn test_scen_round_trip() {
        let map_path = write_map("lamapf_inst_roundtrip.map");
        let text = format!(
            "map_file={map_path}\nagents=3\nsizes=(0.45, 0.45, 1.0)\nseed=13\nrandom_problem=1\nmax_timestep=77\n"
        );
        let original = Instance::from_reader("inline", text.as_bytes(), None).unwrap();

        let scen_path = std::env::temp_dir().join("lamapf_inst_roundtrip.scen");
        original.write_scen_file(scen_path.to_str().unwrap()).unwrap();

        let reloaded = Instance::load(scen_path.to_str().unwrap(), None).unwrap();
        assert_eq!(reloaded.starts(), original.starts());
        assert_eq!(reloaded.goals(), original.goals());
        assert_eq!(reloaded.footprints(), original.footprints());
        assert_eq!(reloaded.max_timestep(), 77);
    }

    #[test]
    fn test_load_shipped_samples() {
        let lapibt = Instance::load("instances/sample-lapibt.txt", None).unwrap();
        assert_eq!(lapibt.num_agents(), 4);
        assert!(!lapibt.is_disk_mode());
        assert_eq!(lapibt.seed(), 1);
        assert_eq!(lapibt.footprints()[2], Footprint::Square { side: 1.0 });

        let fspibt = Instance::load("instances/sample-fspibt.txt", None).unwrap();
        assert_eq!(fspibt.num_agents(), 3);
        assert!(fspibt.is_disk_mode());
        assert_eq!(fspibt.max_timestep(), 500);
    }

    #[test]
    fn test_sizes_random_uniform_is_seeded() {
        let map_path = write_map("lamapf_inst_uniform.map");
        let text = format!(
            "map_file={map_path}\nagents=5\nsizes_random_uniform=0.4,0.8\nseed=5\nrandom_problem=1\n"
        );

        let first = Instance::from_reader("inline", text.as_bytes(), None).unwrap();
        let second = Instance::from_reader("inline", text.as_bytes(), None).unwrap();
        assert_eq!(first.footprints(), second.footprints());
        for footprint in first.footprints() {
            let side = footprint.extent();
            assert!((0.4..=0.8).contains(&side));
            assert!(!footprint.is_disk());
        }
    }

    #[test]
    fn test_cli_seed_only_fills_a_gap() {
        let map_path = write_map("lamapf_inst_seed.map");
        let with_seed = format!("map_file={map_path}\nagents=1\nsizes=(0.45)\nseed=9\n0,0,1,0\n");
        let instance = Instance::from_reader("inline", with_seed.as_bytes(), Some(99)).unwrap();
        assert_eq!(instance.seed(), 9);

        let without_seed = format!("map_file={map_path}\nagents=1\nsizes=(0.45)\n0,0,1,0\n");
        let instance = Instance::from_reader("inline", without_seed.as_bytes(), Some(99)).unwrap();
        assert_eq!(instance.seed(), 99);
    }

    #[test]
    fn test_missing_map_file_is_fatal() {
        let text = "agents=2\nsizes=(0.45, 0.45)\n";
        assert!(Instance::from_reader("inline", text.as_bytes(), None).is_err());
    }

    #[test]
    fn test_rejects_gibberish_and_zero_agents() {
        let map_path = write_map("lamapf_inst_bad.map");
        let gibberish = format!("map_file={map_path}\nagents=1\nwhat even is this\n");
        assert!(Instance::from_reader("inline", gibberish.as_bytes(), None).is_err());

        let zero = format!("map_file={map_path}\nagents=0\n");
        assert!(Instance::from_reader("inline", zero.as_bytes(), None).is_err());
    }
}
