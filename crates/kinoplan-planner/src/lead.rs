//! Lead construction
//!
//! A lead is a chain of adjacent regions from the start region to the
//! goal region that the outer loop uses to bias tree growth. Most of
//! the time it is the cost-shortest chain under the current edge
//! estimates (A* with a centroid-distance heuristic); occasionally it
//! is a randomized depth-first walk, which keeps the planner from
//! committing to one corridor of the decomposition.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use rand::rngs::StdRng;
use rand::Rng;

use crate::decomposition::Decomposition;
use crate::graph::RegionGraph;

/// Marker for regions the searches have not visited.
const UNVISITED: usize = usize::MAX;

/// Frontier entry ordered by f-cost, with the region index breaking
/// ties so the search order is deterministic.
#[derive(Debug, PartialEq)]
struct Frontier {
    f: f64,
    region: usize,
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f
            .total_cmp(&other.f)
            .then_with(|| self.region.cmp(&other.region))
    }
}

/// Builds leads through the region graph.
#[derive(Debug, Clone)]
pub struct LeadBuilder {
    pub prob_shortest_path: f64,
}

impl LeadBuilder {
    pub fn new(prob_shortest_path: f64) -> Self {
        Self { prob_shortest_path }
    }

    /// Compute a lead from `start` to `goal` into `lead`.
    ///
    /// A lead of length one means start and goal coincide; an empty
    /// lead means the goal region is unreachable in the graph.
    pub fn build(
        &self,
        graph: &RegionGraph,
        decomp: &dyn Decomposition,
        rng: &mut StdRng,
        start: usize,
        goal: usize,
        lead: &mut Vec<usize>,
    ) {
        lead.clear();
        if start == goal {
            lead.push(start);
            return;
        }
        if rng.gen::<f64>() < self.prob_shortest_path {
            shortest_path_lead(graph, decomp, start, goal, lead);
        } else {
            random_dfs_lead(graph, rng, start, goal, lead);
        }
    }
}

/// A* over the adjacency costs, stopping as soon as the goal region is
/// settled and reconstructing the chain through the predecessor map.
fn shortest_path_lead(
    graph: &RegionGraph,
    decomp: &dyn Decomposition,
    start: usize,
    goal: usize,
    lead: &mut Vec<usize>,
) {
    let n = graph.num_regions();
    let goal_centroid = decomp.region_centroid(goal);
    let heuristic = |region: usize| -> f64 {
        let c = decomp.region_centroid(region);
        c.iter()
            .zip(&goal_centroid)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    };

    let mut cost_to = vec![f64::INFINITY; n];
    let mut parents = vec![UNVISITED; n];
    let mut settled = vec![false; n];
    let mut frontier = BinaryHeap::new();

    cost_to[start] = 0.0;
    frontier.push(Reverse(Frontier {
        f: heuristic(start),
        region: start,
    }));

    while let Some(Reverse(Frontier { region, .. })) = frontier.pop() {
        if settled[region] {
            continue;
        }
        settled[region] = true;
        if region == goal {
            trace_parents(&parents, start, goal, lead);
            return;
        }
        for &edge_id in graph.outgoing_edges(region) {
            let edge = graph.edge(edge_id);
            let candidate = cost_to[region] + edge.cost;
            if candidate < cost_to[edge.target] {
                cost_to[edge.target] = candidate;
                parents[edge.target] = region;
                frontier.push(Reverse(Frontier {
                    f: candidate + heuristic(edge.target),
                    region: edge.target,
                }));
            }
        }
    }
}

/// Depth-first walk with uniformly shuffled successor expansion. Each
/// unvisited neighbor batch is consumed in random order, so repeated
/// calls produce varied leads rather than one fixed traversal.
fn random_dfs_lead(
    graph: &RegionGraph,
    rng: &mut StdRng,
    start: usize,
    goal: usize,
    lead: &mut Vec<usize>,
) {
    let n = graph.num_regions();
    let mut parents = vec![UNVISITED; n];
    parents[start] = start;
    let mut stack = vec![start];

    while let Some(region) = stack.pop() {
        let mut neighbors = Vec::new();
        for &edge_id in graph.outgoing_edges(region) {
            let target = graph.edge(edge_id).target;
            if parents[target] == UNVISITED {
                parents[target] = region;
                neighbors.push(target);
            }
        }
        for i in 0..neighbors.len() {
            let choice = rng.gen_range(i..neighbors.len());
            if neighbors[choice] == goal {
                trace_parents(&parents, start, goal, lead);
                return;
            }
            stack.push(neighbors[choice]);
            neighbors.swap(i, choice);
        }
    }
}

/// Follow predecessors from the goal back to the start, then reverse.
fn trace_parents(parents: &[usize], start: usize, goal: usize, lead: &mut Vec<usize>) {
    let mut region = goal;
    lead.push(region);
    while region != start {
        region = parents[region];
        lead.push(region);
    }
    lead.reverse();
}
