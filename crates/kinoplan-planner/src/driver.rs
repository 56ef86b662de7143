//! SyCLoP driver
//!
//! The synergistic outer loop: overlay the region graph on the motion
//! tree, repeatedly build a lead from a start region to a goal region,
//! pick lead regions from the availability distribution, and delegate
//! actual tree growth to the extension strategy. Estimates (coverage,
//! selections, edge costs) feed back into the next lead.

use kinoplan_core::space::{State, StateSpace, StateValidityChecker};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::avail::{AvailabilityDistribution, RegionSet};
use crate::config::{ConfigError, SyclopConfig};
use crate::decomposition::{CoverageGrid, Decomposition};
use crate::extension::{ExtensionStrategy, MotionId};
use crate::graph::{Adjacency, RegionGraph};
use crate::lead::LeadBuilder;
use crate::problem::{PlannedPath, ProblemDefinition};

/// Attempts at drawing a valid goal state before giving up.
const GOAL_SAMPLE_ATTEMPTS: usize = 100;

/// One multiplicative contribution to an adjacency's cost. Factors
/// must return a positive value.
pub trait EdgeCostFactor {
    fn factor(&self, graph: &RegionGraph, edge: &Adjacency) -> f64;
}

/// The built-in cost factor:
///
/// ((1 + n^2) / (1 + cov^2)) * alpha(source) * alpha(target)
///
/// where `n` counts lead inclusions while the edge is empty and
/// selections once it is not.
pub struct DefaultEdgeCost;

impl EdgeCostFactor for DefaultEdgeCost {
    fn factor(&self, graph: &RegionGraph, edge: &Adjacency) -> f64 {
        let crossings = if edge.empty {
            edge.num_lead_inclusions
        } else {
            edge.num_selections
        };
        let nsel = crossings as f64;
        let cov = edge.cov_cells.len() as f64;
        let alpha = graph.region(edge.source).alpha * graph.region(edge.target).alpha;
        ((1.0 + nsel * nsel) / (1.0 + cov * cov)) * alpha
    }
}

/// Decomposition-guided kinodynamic planner.
pub struct Syclop<E: ExtensionStrategy> {
    space: Box<dyn StateSpace>,
    checker: Box<dyn StateValidityChecker>,
    decomp: Box<dyn Decomposition>,
    cov_grid: Box<dyn CoverageGrid>,
    problem: ProblemDefinition,
    strategy: E,
    config: SyclopConfig,
    graph: RegionGraph,
    lead: Vec<usize>,
    avail: AvailabilityDistribution,
    start_regions: RegionSet,
    goal_regions: RegionSet,
    cost_factors: Vec<Box<dyn EdgeCostFactor>>,
    rng: StdRng,
    is_setup: bool,
    graph_ready: bool,
    num_motions: usize,
    start_cursor: usize,
}

impl<E: ExtensionStrategy> Syclop<E> {
    pub fn new(
        space: Box<dyn StateSpace>,
        checker: Box<dyn StateValidityChecker>,
        decomp: Box<dyn Decomposition>,
        cov_grid: Box<dyn CoverageGrid>,
        problem: ProblemDefinition,
        strategy: E,
        config: SyclopConfig,
    ) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            space,
            checker,
            decomp,
            cov_grid,
            problem,
            strategy,
            config,
            graph: RegionGraph::default(),
            lead: Vec::new(),
            avail: AvailabilityDistribution::new(),
            start_regions: RegionSet::new(),
            goal_regions: RegionSet::new(),
            cost_factors: Vec::new(),
            rng,
            is_setup: false,
            graph_ready: false,
            num_motions: 0,
            start_cursor: 0,
        }
    }

    /// Validate the configuration, build the region graph, and register
    /// the default edge cost factor. Idempotent.
    pub fn setup(&mut self) -> Result<(), ConfigError> {
        if self.is_setup {
            return Ok(());
        }
        self.config.validate()?;
        self.graph = RegionGraph::build(self.decomp.as_ref());
        self.cost_factors.push(Box::new(DefaultEdgeCost));
        self.is_setup = true;
        Ok(())
    }

    /// Forget everything learned while planning; the graph topology and
    /// the random stream position are kept.
    pub fn clear(&mut self) {
        self.lead.clear();
        self.avail.clear();
        self.graph.clear_details();
        self.graph_ready = false;
        self.start_regions.clear();
        self.goal_regions.clear();
        self.strategy.clear();
        self.num_motions = 0;
        self.start_cursor = 0;
    }

    /// Register an additional multiplicative edge cost factor.
    pub fn add_edge_cost_factor(&mut self, factor: Box<dyn EdgeCostFactor>) {
        self.cost_factors.push(factor);
    }

    /// Remove every cost factor, including the default one.
    pub fn clear_edge_cost_factors(&mut self) {
        self.cost_factors.clear();
    }

    pub fn graph(&self) -> &RegionGraph {
        &self.graph
    }

    pub fn lead(&self) -> &[usize] {
        &self.lead
    }

    pub fn problem(&self) -> &ProblemDefinition {
        &self.problem
    }

    pub fn strategy(&self) -> &E {
        &self.strategy
    }

    /// Run the outer loop until the termination condition fires or an
    /// exact solution is found.
    ///
    /// Returns `true` iff a path was attached to the goal, which
    /// includes the approximate best-so-far path produced on timeout.
    pub fn solve<F: FnMut() -> bool>(&mut self, mut ptc: F) -> bool {
        if !self.is_setup {
            log::error!("solve() called before setup()");
            return false;
        }

        if !self.graph_ready {
            self.num_motions = 0;
            self.setup_region_estimates();
            self.setup_edge_estimates();
            self.graph_ready = true;
        }

        while self.start_cursor < self.problem.start_states.len() {
            let start = self.problem.start_states[self.start_cursor].clone();
            self.start_cursor += 1;
            if !self.checker.is_valid(&start) {
                log::warn!("skipping invalid start state");
                continue;
            }
            let region = self.decomp.locate_region(&start);
            self.start_regions.insert(region);
            let motion_id = self.strategy.add_root(&start);
            self.graph.region_mut(region).motions.push(motion_id);
            self.num_motions += 1;
            self.update_coverage_estimate(region, &start);
        }
        if self.start_regions.is_empty() {
            log::error!("there are no valid start states");
            return false;
        }

        // At least one goal sample is needed to know the goal region.
        if self.goal_regions.is_empty() {
            match self.next_valid_goal_sample(&mut ptc) {
                Some(goal_state) => {
                    let region = self.decomp.locate_region(&goal_state);
                    self.goal_regions.insert(region);
                }
                None => {
                    log::error!("unable to sample a valid goal state");
                    return false;
                }
            }
        }

        log::info!("starting with {} motions", self.num_motions);

        let mut new_motions: Vec<MotionId> = Vec::new();
        let mut solution: Option<MotionId> = None;
        let mut goal_dist = f64::INFINITY;
        let mut solved = false;

        while !ptc() && !solved {
            let chosen_start = self.start_regions.sample(&mut self.rng);

            let mut chosen_goal = None;
            if self.problem.goal.has_more_samples() {
                if let Some(goal_state) = self.problem.goal.next_sample() {
                    if self.checker.is_valid(&goal_state) {
                        log::debug!("sampling another goal state");
                        let region = self.decomp.locate_region(&goal_state);
                        self.goal_regions.insert(region);
                        chosen_goal = Some(region);
                    }
                }
            }
            let chosen_goal = match chosen_goal {
                Some(region) => region,
                None => self.goal_regions.sample(&mut self.rng),
            };

            self.compute_lead(chosen_start, chosen_goal);
            self.compute_available_regions();
            if self.avail.is_empty() {
                continue;
            }

            for _ in 0..self.config.num_region_expansions {
                if solved || ptc() {
                    break;
                }
                let region = self.select_region();
                let mut improved = false;
                for _ in 0..self.config.num_tree_selections {
                    if solved || ptc() {
                        break;
                    }
                    new_motions.clear();
                    self.strategy.select_and_extend(
                        self.graph.region(region),
                        &mut self.rng,
                        &mut new_motions,
                    );
                    for &motion_id in &new_motions {
                        if ptc() {
                            break;
                        }
                        let state = self.strategy.motion(motion_id).state.clone();
                        let mut distance = f64::INFINITY;
                        if self.problem.goal.is_satisfied(&state, &mut distance) {
                            goal_dist = distance;
                            solution = Some(motion_id);
                            solved = true;
                            break;
                        }
                        if distance < goal_dist {
                            goal_dist = distance;
                            solution = Some(motion_id);
                        }

                        let new_region = self.decomp.locate_region(&state);
                        self.graph.region_mut(new_region).motions.push(motion_id);
                        self.num_motions += 1;
                        improved |= self.update_coverage_estimate(new_region, &state);
                        if new_region != region {
                            // The tree just entered this region; make it available.
                            if self.graph.region(new_region).motions.len() == 1 {
                                self.avail
                                    .add(new_region, self.graph.region(new_region).weight);
                            }
                            // Crossings between non-neighboring regions are not
                            // counted: the lead search only models neighbor edges.
                            if let Some(edge_id) = self.graph.edge_between(region, new_region) {
                                {
                                    let edge = self.graph.edge_mut(edge_id);
                                    edge.empty = false;
                                    edge.num_selections += 1;
                                }
                                improved |= self.update_connection_estimate(edge_id, &state);
                            }
                        }
                    }
                }
                if !improved && self.rng.gen::<f64>() < self.config.prob_abandon_lead_early {
                    break;
                }
            }
        }

        if let Some(last) = solution {
            let mut chain = vec![last];
            let mut cursor = last;
            while let Some(parent) = self.strategy.motion(cursor).parent {
                chain.push(parent);
                cursor = parent;
            }
            let mut path = PlannedPath::new();
            for &motion_id in chain.iter().rev() {
                let motion = self.strategy.motion(motion_id);
                if motion.parent.is_some() {
                    path.append_with_control(
                        motion.state.clone(),
                        motion.control.clone(),
                        motion.steps,
                    );
                } else {
                    path.append(motion.state.clone());
                }
            }
            self.problem
                .goal
                .add_solution_path(path, !solved, goal_dist);
            return true;
        }
        false
    }

    /// Estimate per-region free volume from uniform ambient samples.
    fn setup_region_estimates(&mut self) {
        let n = self.graph.num_regions();
        let mut num_total = vec![0usize; n];
        let mut num_valid = vec![0usize; n];
        let mut sample = self.space.alloc_state();

        for _ in 0..self.config.num_free_vol_samples {
            self.space.sample_uniform(&mut self.rng, &mut sample);
            let region = self.decomp.locate_region(&sample);
            if self.checker.is_valid(&sample) {
                num_valid[region] += 1;
            }
            num_total[region] += 1;
        }

        for i in 0..n {
            let volume = self.decomp.region_volume(i);
            let region = self.graph.region_mut(i);
            region.volume = volume;
            region.percent_valid_cells = if num_total[i] == 0 {
                1.0
            } else {
                num_valid[i] as f64 / num_total[i] as f64
            };
            region.free_volume =
                (region.percent_valid_cells * region.volume).max(f64::EPSILON);
            region.recompute_estimates();
        }
    }

    fn setup_edge_estimates(&mut self) {
        for edge_id in 0..self.graph.num_edges() {
            {
                let edge = self.graph.edge_mut(edge_id);
                edge.empty = true;
                edge.num_lead_inclusions = 0;
                edge.num_selections = 0;
            }
            self.update_edge(edge_id);
        }
    }

    /// Recompute an edge's cost as the product of the registered factors.
    fn update_edge(&mut self, edge_id: usize) {
        let mut cost = 1.0;
        {
            let edge = self.graph.edge(edge_id);
            for factor in &self.cost_factors {
                cost *= factor.factor(&self.graph, edge);
            }
        }
        self.graph.edge_mut(edge_id).cost = cost;
    }

    /// Record the coverage cell of `state` in `region`; true when the
    /// cell was new and the region estimates were refreshed.
    fn update_coverage_estimate(&mut self, region: usize, state: &State) -> bool {
        let cell = self.cov_grid.locate_cell(state);
        let r = self.graph.region_mut(region);
        if !r.cov_cells.insert(cell) {
            return false;
        }
        r.recompute_estimates();
        true
    }

    /// Record the coverage cell of `state` on an edge; true when new.
    fn update_connection_estimate(&mut self, edge_id: usize, state: &State) -> bool {
        let cell = self.cov_grid.locate_cell(state);
        if !self.graph.edge_mut(edge_id).cov_cells.insert(cell) {
            return false;
        }
        self.update_edge(edge_id);
        true
    }

    /// Build a fresh lead and charge lead inclusions to its still-empty
    /// edges.
    fn compute_lead(&mut self, start: usize, goal: usize) {
        let builder = LeadBuilder::new(self.config.prob_shortest_path);
        builder.build(
            &self.graph,
            self.decomp.as_ref(),
            &mut self.rng,
            start,
            goal,
            &mut self.lead,
        );

        for i in 0..self.lead.len().saturating_sub(1) {
            let (u, v) = (self.lead[i], self.lead[i + 1]);
            if let Some(edge_id) = self.graph.edge_between(u, v) {
                if self.graph.edge(edge_id).empty {
                    self.graph.edge_mut(edge_id).num_lead_inclusions += 1;
                    self.update_edge(edge_id);
                }
            }
        }
    }

    /// Rebuild the availability distribution by walking the lead from
    /// the goal end toward the start.
    fn compute_available_regions(&mut self) {
        self.avail.clear();
        for i in (0..self.lead.len()).rev() {
            let region = self.lead[i];
            if !self.graph.region(region).motions.is_empty() {
                self.avail.add(region, self.graph.region(region).weight);
                if self.rng.gen::<f64>() >= self.config.prob_keep_adding_to_avail {
                    break;
                }
            }
        }
    }

    /// Draw a region from the availability distribution and charge the
    /// selection to it.
    fn select_region(&mut self) -> usize {
        let region = self.avail.sample(&mut self.rng);
        let r = self.graph.region_mut(region);
        r.num_selections += 1;
        r.recompute_estimates();
        region
    }

    /// Draw goal states until one passes the validity checker, giving up
    /// when the samples run out, the attempt budget is spent, or the
    /// termination condition fires.
    fn next_valid_goal_sample<F: FnMut() -> bool>(&mut self, ptc: &mut F) -> Option<State> {
        for _ in 0..GOAL_SAMPLE_ATTEMPTS {
            if ptc() {
                return None;
            }
            match self.problem.goal.next_sample() {
                Some(goal_state) if self.checker.is_valid(&goal_state) => {
                    return Some(goal_state)
                }
                Some(_) => continue,
                None => return None,
            }
        }
        None
    }
}
