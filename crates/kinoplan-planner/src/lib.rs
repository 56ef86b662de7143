//! Kinoplan Planner
//!
//! Synergistic decomposition-guided kinodynamic planning. A coarse
//! workspace decomposition is overlaid on a fine-grained motion tree:
//! the planner searches the region graph for a lead from the start
//! region to the goal region, samples regions along the lead by their
//! exploration estimates, and delegates actual tree growth to a
//! pluggable extension strategy.
//!
//! # Architecture
//!
//! ```text
//! lead (A* / random DFS over region graph)
//!   -> availability distribution over lead regions
//!     -> region selection
//!       -> ExtensionStrategy::select_and_extend
//!         -> coverage / edge estimates feed the next lead
//! ```
//!
//! # Components
//!
//! - [`config`]: planner parameters and validation
//! - [`decomposition`]: region and coverage-grid interfaces, uniform grid
//! - [`graph`]: region graph with per-region and per-edge estimates
//! - [`lead`]: lead construction
//! - [`avail`]: availability and set sampling
//! - [`extension`]: tree-growth seam and motion arena
//! - [`problem`]: goal, start states, and solution paths
//! - [`driver`]: the SyCLoP outer loop

pub mod avail;
pub mod config;
pub mod decomposition;
pub mod driver;
pub mod extension;
pub mod graph;
pub mod lead;
pub mod problem;

pub use avail::{AvailabilityDistribution, RegionSet};
pub use config::{ConfigError, SyclopConfig};
pub use decomposition::{CoverageGrid, Decomposition, GridDecomposition};
pub use driver::{DefaultEdgeCost, EdgeCostFactor, Syclop};
pub use extension::{ExtensionStrategy, Motion, MotionId, MotionTree};
pub use graph::{Adjacency, Region, RegionGraph};
pub use lead::LeadBuilder;
pub use problem::{Goal, PathWaypoint, PlannedPath, ProblemDefinition};
