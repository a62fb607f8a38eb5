use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::common::{Footprint, Plan};
use crate::instance::Instance;
use crate::map::Grid;
use crate::solver::comm::{priority_order, Agent, DistanceTable, PathState, Timeout};
use crate::stat::Stats;

/// Rollback plan: for every agent touched by an inheritance chain, the path
/// state to restore on failure. Merging is first-write-wins so the outermost
/// caller always recovers its entry state.
type Snapshots = BTreeMap<usize, PathState>;

/// Priority inheritance with backtracking over sized agents.
///
/// One engine serves both geometries; the footprints decide the overlap
/// predicate, the footprint-fit test, and the shape of the escape border.
pub(crate) struct PibtEngine {
    grid: Grid,
    starts: Vec<usize>,
    goals: Vec<usize>,
    footprints: Vec<Footprint>,
    agents: Vec<Agent>,
    dist: DistanceTable,
    /// Agents currently pushing through the active inheritance chain.
    in_conflict: BTreeSet<usize>,
    rng: StdRng,
    inheritance_depth: usize,
    escape_skip_prob: f32,
    max_timestep: usize,
    max_comp_time: u64,
    started: Instant,
    pub(crate) stats: Stats,
}

impl PibtEngine {
    pub fn new(instance: &Instance, inheritance_depth: usize, escape_skip_prob: f32) -> Self {
        Self {
            grid: instance.grid().clone(),
            starts: instance.starts().to_vec(),
            goals: instance.goals().to_vec(),
            footprints: instance.footprints().to_vec(),
            agents: Vec::new(),
            dist: DistanceTable::default(),
            in_conflict: BTreeSet::new(),
            rng: StdRng::seed_from_u64(instance.seed()),
            inheritance_depth,
            escape_skip_prob,
            max_timestep: instance.max_timestep(),
            max_comp_time: instance.max_comp_time(),
            started: Instant::now(),
            stats: Stats::default(),
        }
    }

    pub fn solve(&mut self) -> Option<Plan> {
        self.started = Instant::now();
        self.prepare();

        for i in 0..self.agents.len() {
            if self.agents[i].init_d == self.unreachable() {
                warn!("goal for agent {i} is unreachable");
                self.stats.comp_time_ms = self.started.elapsed().as_millis();
                return None;
            }
        }

        let plan = self.run();
        self.stats.comp_time_ms = self.started.elapsed().as_millis();
        self.stats.solved = plan.is_some();
        plan
    }

    /// Build the distance tables and the runtime agents.
    pub(crate) fn prepare(&mut self) {
        info!("pre-processing, creating distance tables by BFS");
        self.dist = DistanceTable::build(
            &self.grid,
            &self.goals,
            &self.footprints,
            self.max_timestep,
        );
        self.stats.preprocessing_time_ms = self.started.elapsed().as_millis();
        info!(
            "done, elapsed: {}ms",
            self.stats.preprocessing_time_ms
        );

        let (lb_soc, lb_makespan) = self.dist.lower_bounds(&self.starts);
        self.stats.lb_soc = lb_soc;
        self.stats.lb_makespan = lb_makespan;

        self.agents = (0..self.starts.len())
            .map(|i| Agent {
                id: i,
                goal: self.goals[i],
                elapsed: 0,
                init_d: self.dist.get(i, self.starts[i]),
                tie_breaker: self.rng.gen_range(0.0..1.0),
                footprint: self.footprints[i],
                path: VecDeque::from([self.starts[i]]),
            })
            .collect();
    }

    fn run(&mut self) -> Option<Plan> {
        let num_agents = self.agents.len();
        let mut plan = Plan::new();
        plan.add(self.starts.clone());

        let mut order: Vec<usize> = (0..num_agents).collect();
        let mut timestep = 0;

        loop {
            timestep += 1;
            debug!(
                "elapsed: {}ms, timestep: {timestep}",
                self.started.elapsed().as_millis()
            );

            order.sort_by(|&i, &j| priority_order(&self.agents[i], &self.agents[j]));
            for k in 0..num_agents {
                let i = order[k];
                if self.agents[i].path.len() == 1 && self.step(i).is_err() {
                    info!("computation time limit reached inside conflict resolution");
                    self.discard_partial(&plan);
                    return None;
                }
            }

            let mut config = vec![0usize; num_agents];
            let mut all_on_goal = true;
            for agent in self.agents.iter_mut() {
                let next = agent.path[1];
                config[agent.id] = next;
                agent.path.pop_front();

                let on_goal = next == agent.goal;
                agent.elapsed = if on_goal { 0 } else { agent.elapsed + 1 };
                all_on_goal &= on_goal;
            }
            plan.add(config);

            if all_on_goal {
                return Some(plan);
            }
            if timestep >= self.max_timestep {
                info!("timestep limit reached");
                self.discard_partial(&plan);
                return None;
            }
            if self.started.elapsed().as_millis() > self.max_comp_time as u128 {
                info!("computation time limit reached");
                self.discard_partial(&plan);
                return None;
            }
        }
    }

    fn discard_partial(&self, plan: &Plan) {
        debug!(
            "discarding partial plan covering {} timesteps",
            plan.makespan()
        );
    }

    fn unreachable(&self) -> usize {
        self.dist.unreachable()
    }

    fn check_deadline(&self) -> Result<(), Timeout> {
        if self.started.elapsed().as_millis() > self.max_comp_time as u128 {
            return Err(Timeout);
        }
        Ok(())
    }

    fn overlap(&self, p: usize, fp_p: &Footprint, q: usize, fp_q: &Footprint) -> bool {
        fp_p.overlaps(self.grid.pos(p), fp_q, self.grid.pos(q))
    }

    /// Plan one move for agent `i`: greedy toward the goal, resolving blocks
    /// by priority inheritance, staying put as the last resort.
    pub(crate) fn step(&mut self, i: usize) -> Result<(), Timeout> {
        if self.agents[i].tail() == self.agents[i].goal {
            self.agents[i].push_wait();
            return Ok(());
        }

        let mut candidates: Vec<usize> = self.grid.neighbors(self.agents[i].tail()).to_vec();
        candidates.sort_by_key(|&n| self.dist.get(i, n));

        for next in candidates {
            if self.dist.get(i, next) == self.unreachable() {
                continue;
            }

            self.agents[i].path.push_back(next);

            if self.collision_conflict(i)? {
                self.agents[i].path.pop_back();
                continue;
            }

            if self.inheritance_conflict(i)? && self.solve_inheritance_conflict(i)?.is_empty() {
                self.agents[i].path.pop_back();
                continue;
            }

            return Ok(());
        }

        self.agents[i].push_wait();
        Ok(())
    }

    /// Does agent `i`'s tentative cell run into any committed plan? Peers in
    /// the conflict set are skipped: they are mid-push and their paths are
    /// partial.
    fn collision_conflict(&self, i: usize) -> Result<bool, Timeout> {
        self.check_deadline()?;
        let agent = &self.agents[i];
        let tail = agent.tail();
        let len = agent.path.len();

        for (j, other) in self.agents.iter().enumerate() {
            if j == i || self.in_conflict.contains(&j) || other.path.len() < len {
                continue;
            }
            for t in (len - 1)..other.path.len() {
                if self.overlap(tail, &agent.footprint, other.path[t], &other.footprint) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Same test against the agents of the conflict set. The parent's final
    /// cell is exempt: that is the cell being vacated for it.
    fn collision_with_conflict_set(&self, i: usize, parent: usize) -> Result<bool, Timeout> {
        self.check_deadline()?;
        let agent = &self.agents[i];
        let tail = agent.tail();

        for &j in &self.in_conflict {
            let other = &self.agents[j];
            let end = other.path.len() - usize::from(j == parent);
            for t in 0..end {
                if self.overlap(tail, &agent.footprint, other.path[t], &other.footprint) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Is some lower-priority agent (shorter tentative path) pinned under
    /// agent `i`'s tentative cell?
    fn inheritance_conflict(&self, i: usize) -> Result<bool, Timeout> {
        self.check_deadline()?;
        let agent = &self.agents[i];
        let tail = agent.tail();
        let len = agent.path.len();

        for (j, other) in self.agents.iter().enumerate() {
            if j != i
                && other.path.len() < len
                && self.overlap(tail, &agent.footprint, other.tail(), &other.footprint)
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Push every lower-priority agent out from under agent `i`'s tentative
    /// cell. Returns the accumulated rollback snapshots on success, an empty
    /// map on failure (with every touched path already restored).
    pub(crate) fn solve_inheritance_conflict(&mut self, i: usize) -> Result<Snapshots, Timeout> {
        self.check_deadline()?;
        let tail = self.agents[i].tail();
        let footprint = self.agents[i].footprint;
        self.in_conflict.insert(i);

        let mut acc: Snapshots = BTreeMap::new();
        // Restart the peer scan after every successful push: pushing one
        // agent can pin a new one under the chain.
        let mut restart = true;
        while restart {
            restart = false;
            for j in 0..self.agents.len() {
                if j == i || self.agents[j].path.len() >= self.agents[i].path.len() {
                    continue;
                }
                if !self.overlap(
                    tail,
                    &footprint,
                    self.agents[j].tail(),
                    &self.agents[j].footprint,
                ) {
                    continue;
                }

                let pushed = self.escape_inheritance_conflict(j, i)?;
                if pushed.is_empty() {
                    self.restore(&acc);
                    self.in_conflict.remove(&i);
                    return Ok(BTreeMap::new());
                }
                for (k, state) in pushed {
                    acc.entry(k).or_insert(state);
                }
                restart = true;
                break;
            }
        }

        self.in_conflict.remove(&i);
        Ok(acc)
    }

    /// Walk `child` out of the conflict region so `parent` can take its
    /// move: greedy best-first toward border cells just outside the combined
    /// footprint halo, bounded in depth and steps, with full rollback per
    /// failed border target.
    fn escape_inheritance_conflict(
        &mut self,
        child: usize,
        parent: usize,
    ) -> Result<Snapshots, Timeout> {
        if self.in_conflict.len() > self.inheritance_depth {
            return Ok(BTreeMap::new());
        }

        let mut targets = self.conflict_region_border(child, parent);
        let from = self.agents[child].tail();
        targets.sort_by(|&u, &v| {
            self.grid
                .euclidean(from, u)
                .partial_cmp(&self.grid.euclidean(from, v))
                .unwrap_or(Ordering::Equal)
        });

        let max_steps = (3.0
            * self.agents[child]
                .footprint
                .extent()
                .max(self.agents[parent].footprint.extent()))
        .ceil() as usize;

        'targets: for &target in &targets {
            // The random skip breaks deadlocks between symmetric chains.
            if self.dist.get(child, target) == self.unreachable()
                || self.rng.gen_range(0.0..1.0f32) < self.escape_skip_prob
            {
                continue;
            }

            let mut visited: HashSet<usize> = HashSet::new();
            visited.insert(self.agents[child].tail());
            let mut snapshots: Snapshots = BTreeMap::new();
            snapshots.insert(child, PathState::capture(&self.agents[child]));
            let mut steps = 0usize;

            while self.agents[child].tail() != target {
                if steps > max_steps {
                    self.restore(&snapshots);
                    continue 'targets;
                }

                let here = self.agents[child].tail();
                let mut neighbors: Vec<usize> = self.grid.neighbors(here).to_vec();
                neighbors.sort_by(|&u, &v| {
                    self.grid
                        .euclidean(target, u)
                        .partial_cmp(&self.grid.euclidean(target, v))
                        .unwrap_or(Ordering::Equal)
                });

                let mut advanced = false;
                for next in neighbors {
                    if visited.contains(&next) {
                        continue;
                    }
                    let (x, y) = self.grid.pos(next);
                    if !self.grid.footprint_fits(x, y, &self.agents[child].footprint) {
                        visited.insert(next);
                        continue;
                    }

                    self.agents[child].path.push_back(next);

                    // Keep the chain's tentative lengths in step with the
                    // child, snapshotting each member before first mutation.
                    let mut waited: Vec<usize> = Vec::new();
                    let members: Vec<usize> = self.in_conflict.iter().copied().collect();
                    for j in members {
                        if self.agents[j].path.len() <= self.agents[child].path.len() {
                            snapshots
                                .entry(j)
                                .or_insert_with(|| PathState::capture(&self.agents[j]));
                            self.agents[j].push_wait();
                            waited.push(j);
                        }
                    }

                    if self.collision_conflict(child)?
                        || self.collision_with_conflict_set(child, parent)?
                    {
                        self.undo_move(child, &waited);
                        visited.insert(next);
                        continue;
                    }

                    if self.inheritance_conflict(child)? {
                        let nested = self.solve_inheritance_conflict(child)?;
                        if nested.is_empty() {
                            self.undo_move(child, &waited);
                            visited.insert(next);
                            continue;
                        }
                        for (k, state) in nested {
                            snapshots.entry(k).or_insert(state);
                        }
                    }

                    // Agents pushed out by earlier (now finished) chains of
                    // this walk still have to wait along with it.
                    let snapshotted: Vec<usize> = snapshots.keys().copied().collect();
                    for j in snapshotted {
                        if j != child && !self.in_conflict.contains(&j) {
                            self.agents[j].push_wait();
                        }
                    }

                    visited.insert(next);
                    steps += 1;
                    advanced = true;
                    break;
                }

                if !advanced {
                    self.restore(&snapshots);
                    continue 'targets;
                }
            }

            return Ok(snapshots);
        }

        Ok(BTreeMap::new())
    }

    /// Undo one escape-walk move: the child's tentative cell and the waits
    /// appended alongside it.
    fn undo_move(&mut self, child: usize, waited: &[usize]) {
        self.agents[child].path.pop_back();
        for &j in waited {
            self.agents[j].path.pop_back();
        }
    }

    fn restore(&mut self, snapshots: &Snapshots) {
        for (&j, state) in snapshots {
            let path = &mut self.agents[j].path;
            path.truncate(state.len - 1);
            path.push_back(state.last);
        }
    }

    /// Cells on the outer perimeter of the parent's footprint expanded by the
    /// child's: the rectangle border for squares, a midpoint-circle sweep for
    /// disks.
    fn conflict_region_border(&self, child: usize, parent: usize) -> Vec<usize> {
        let (x, y) = self.grid.pos(self.agents[parent].tail());
        let mut border = Vec::new();

        match (self.agents[parent].footprint, self.agents[child].footprint) {
            (Footprint::Square { side: parent_side }, Footprint::Square { side: child_side }) => {
                let sp = parent_side.ceil() as i32;
                let sc = child_side.ceil() as i32;
                let stride = 1.max((sp + sc) / 4);

                let mut delta = 0;
                while delta < sp + sc {
                    for (cx, cy) in [
                        (x + delta, y - sc),
                        (x + delta, y + sp),
                        (x - sc, y + delta),
                        (x + sp, y + delta),
                    ] {
                        if let Some(id) = self.grid.node_at(cx, cy) {
                            border.push(id);
                        }
                    }
                    delta += stride;
                }
            }
            (Footprint::Disk { radius: parent_r }, Footprint::Disk { radius: child_r }) => {
                let r = parent_r + child_r;
                let mut dx = r.ceil() as i32;
                let mut dy = 0i32;
                loop {
                    for (cx, cy) in [
                        (x + dx, y + dy),
                        (x - dy, y + dx),
                        (x - dx, y - dy),
                        (x + dy, y - dx),
                    ] {
                        if let Some(id) = self.grid.node_at(cx, cy) {
                            border.push(id);
                        }
                    }
                    if (((dx - 1) * (dx - 1) + dy * dy) as f32) > r * r {
                        dx -= 1;
                    } else {
                        dy += 1;
                    }
                    if dx == 0 {
                        break;
                    }
                }
            }
            _ => unreachable!("footprint kinds never mix within one instance"),
        }

        border
    }

    #[cfg(test)]
    pub(crate) fn agent_path(&self, i: usize) -> Vec<usize> {
        self.agents[i].path.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Grid;

    fn square_instance(
        grid: Grid,
        starts: &[(usize, usize)],
        goals: &[(usize, usize)],
        side: f32,
    ) -> Instance {
        let starts: Vec<usize> = starts.iter().map(|&(x, y)| grid.id(x, y)).collect();
        let goals: Vec<usize> = goals.iter().map(|&(x, y)| grid.id(x, y)).collect();
        let footprints = vec![Footprint::Square { side }; starts.len()];
        Instance::for_tests(grid, starts, goals, footprints, 0, 100, 10_000)
    }

    #[test]
    fn test_square_border_candidates() {
        let grid = Grid::from_ascii(&[
            ".....", //
            ".....", //
            ".....", //
            ".....", //
            ".....",
        ]);
        let instance = square_instance(grid.clone(), &[(2, 2), (1, 1)], &[(3, 2), (1, 1)], 1.0);
        let mut engine = PibtEngine::new(&instance, 5, 0.0);
        engine.prepare();

        // Parent tail is its start (2, 2); unit squares give a 2-cell halo.
        let border = engine.conflict_region_border(1, 0);
        let expected: Vec<usize> = [
            (2, 1),
            (2, 3),
            (1, 2),
            (3, 2),
            (3, 1),
            (3, 3),
            (1, 3),
            (3, 3),
        ]
        .iter()
        .map(|&(x, y)| grid.id(x, y))
        .collect();
        assert_eq!(border, expected);
    }

    #[test]
    fn test_disk_border_is_outside_the_halo() {
        let grid = Grid::from_ascii(&[
            ".........", //
            ".........", //
            ".........", //
            ".........", //
            ".........", //
            ".........", //
            ".........", //
            ".........", //
            ".........",
        ]);
        let starts: Vec<usize> = vec![grid.id(4, 4), grid.id(5, 4)];
        let goals = starts.clone();
        let footprints = vec![
            Footprint::Disk { radius: 1.2 },
            Footprint::Disk { radius: 0.5 },
        ];
        let instance = Instance::for_tests(grid.clone(), starts, goals, footprints, 0, 100, 10_000);
        let mut engine = PibtEngine::new(&instance, 5, 0.0);
        engine.prepare();

        let border = engine.conflict_region_border(1, 0);
        assert!(!border.is_empty());
        let anchor = grid.id(4, 4);
        for id in border {
            // Every candidate clears the combined halo of 1.7.
            assert!(grid.euclidean(anchor, id) >= 1.7);
        }
    }

    #[test]
    fn test_step_toward_goal_without_conflict() {
        let grid = Grid::from_ascii(&["....."]);
        let instance = square_instance(grid.clone(), &[(0, 0)], &[(4, 0)], 0.45);
        let mut engine = PibtEngine::new(&instance, 5, 0.0);
        engine.prepare();

        engine.step(0).unwrap();
        assert_eq!(engine.agent_path(0), vec![grid.id(0, 0), grid.id(1, 0)]);
    }

    #[test]
    fn test_step_at_goal_waits() {
        let grid = Grid::from_ascii(&["..."]);
        let instance = square_instance(grid.clone(), &[(1, 0)], &[(1, 0)], 0.45);
        let mut engine = PibtEngine::new(&instance, 5, 0.0);
        engine.prepare();

        engine.step(0).unwrap();
        assert_eq!(engine.agent_path(0), vec![grid.id(1, 0), grid.id(1, 0)]);
    }

    #[test]
    fn test_single_push_makes_room() {
        // The blocker ahead is walked out to the border of the mover's halo.
        let grid = Grid::from_ascii(&["....."]);
        let instance = square_instance(grid.clone(), &[(0, 0), (1, 0)], &[(4, 0), (1, 0)], 0.45);
        let mut engine = PibtEngine::new(&instance, 5, 0.0);
        engine.prepare();

        engine.step(0).unwrap();
        // The mover commits its move and then waits one step while the
        // blocker clears out of its halo.
        assert_eq!(
            engine.agent_path(0),
            vec![grid.id(0, 0), grid.id(1, 0), grid.id(1, 0)]
        );
        assert_eq!(engine.agent_path(1), vec![grid.id(1, 0), grid.id(2, 0)]);
        assert!(engine.in_conflict.is_empty());
    }

    #[test]
    fn test_chained_push_synchronizes_waits() {
        // Pushing b rolls into c; everyone ends one timestep ahead, aligned.
        let grid = Grid::from_ascii(&["...."]);
        let instance = square_instance(
            grid.clone(),
            &[(0, 0), (1, 0), (2, 0)],
            &[(3, 0), (1, 0), (2, 0)],
            0.45,
        );
        let mut engine = PibtEngine::new(&instance, 5, 0.0);
        engine.prepare();

        engine.step(0).unwrap();
        assert_eq!(
            engine.agent_path(0),
            vec![grid.id(0, 0), grid.id(1, 0), grid.id(1, 0)]
        );
        assert_eq!(
            engine.agent_path(1),
            vec![grid.id(1, 0), grid.id(2, 0), grid.id(2, 0)]
        );
        assert_eq!(
            engine.agent_path(2),
            vec![grid.id(2, 0), grid.id(3, 0), grid.id(3, 0)]
        );
    }

    #[test]
    fn test_failed_inheritance_restores_all_paths() {
        // Depth 0 forbids any push; the mover must stay and the blocker's
        // path has to come back bit-identical.
        let grid = Grid::from_ascii(&["..."]);
        let instance = square_instance(grid.clone(), &[(0, 0), (1, 0)], &[(2, 0), (1, 0)], 0.45);
        let mut engine = PibtEngine::new(&instance, 0, 0.0);
        engine.prepare();

        let before = engine.agent_path(1);
        engine.step(0).unwrap();
        assert_eq!(engine.agent_path(0), vec![grid.id(0, 0), grid.id(0, 0)]);
        assert_eq!(engine.agent_path(1), before);
        assert!(engine.in_conflict.is_empty());
    }

    #[test]
    fn test_depth_cap_rolls_back_whole_chain() {
        // With depth 1 the nested push of c is refused, so the whole chain
        // a -> b -> c must unwind to its entry state.
        let grid = Grid::from_ascii(&["...."]);
        let instance = square_instance(
            grid.clone(),
            &[(0, 0), (1, 0), (2, 0)],
            &[(3, 0), (1, 0), (2, 0)],
            0.45,
        );
        let mut engine = PibtEngine::new(&instance, 1, 0.0);
        engine.prepare();

        engine.step(0).unwrap();
        assert_eq!(engine.agent_path(0), vec![grid.id(0, 0), grid.id(0, 0)]);
        assert_eq!(engine.agent_path(1), vec![grid.id(1, 0)]);
        assert_eq!(engine.agent_path(2), vec![grid.id(2, 0)]);
        assert!(engine.in_conflict.is_empty());
    }

    #[test]
    fn test_following_into_vacated_cell_is_allowed() {
        // Once the front agent has committed to move on, the follower may
        // enter the cell it vacates in the same timestep.
        let grid = Grid::from_ascii(&["...."]);
        let instance = square_instance(grid.clone(), &[(0, 0), (1, 0)], &[(3, 0), (2, 0)], 0.45);
        let mut engine = PibtEngine::new(&instance, 5, 0.0);
        engine.prepare();

        engine.step(1).unwrap();
        engine.step(0).unwrap();
        assert_eq!(engine.agent_path(1), vec![grid.id(1, 0), grid.id(2, 0)]);
        assert_eq!(engine.agent_path(0), vec![grid.id(0, 0), grid.id(1, 0)]);
    }

    #[test]
    fn test_wide_disks_reserve_future_cells() {
        // With radii summing past the cell pitch, the follower may not tail
        // the front agent at distance one; it has to hold back.
        let grid = Grid::from_ascii(&["...."]);
        let starts = vec![grid.id(0, 0), grid.id(1, 0)];
        let goals = vec![grid.id(3, 0), grid.id(3, 0)];
        let footprints = vec![Footprint::Disk { radius: 0.6 }; 2];
        let instance = Instance::for_tests(grid.clone(), starts, goals, footprints, 0, 100, 10_000);
        let mut engine = PibtEngine::new(&instance, 5, 0.0);
        engine.prepare();

        engine.step(1).unwrap();
        engine.step(0).unwrap();
        assert_eq!(engine.agent_path(1), vec![grid.id(1, 0), grid.id(2, 0)]);
        assert_eq!(engine.agent_path(0), vec![grid.id(0, 0), grid.id(0, 0)]);
    }

    #[test]
    fn test_solve_two_agents_passing() {
        let grid = Grid::from_ascii(&[
            "...", //
            "...",
        ]);
        let instance = square_instance(grid.clone(), &[(0, 0), (2, 0)], &[(2, 0), (0, 0)], 0.45);
        let mut engine = PibtEngine::new(&instance, 5, 0.0);

        let plan = engine.solve().expect("two agents can pass on two rows");
        assert!(plan.validate(
            &grid,
            instance.footprints(),
            instance.starts(),
            instance.goals()
        ));
        assert!(engine.stats.solved);
        assert!(plan.soc() >= engine.stats.lb_soc);
        assert!(plan.makespan() >= engine.stats.lb_makespan);
    }
}
