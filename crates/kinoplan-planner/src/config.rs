//! Planner configuration
//!
//! Tuning knobs for the decomposition-guided planner. Defaults are
//! library constants; `validate` enforces the documented ranges before
//! any planning starts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Probability of building a lead with A* rather than randomized DFS.
pub const DEFAULT_PROB_SHORTEST_PATH: f64 = 0.95;

/// Probability of continuing to accumulate availability entries after
/// each region added from the goal end of the lead.
pub const DEFAULT_PROB_KEEP_ADDING_TO_AVAIL: f64 = 0.95;

/// Probability of abandoning the current lead after a region round
/// that brought no coverage improvement.
pub const DEFAULT_PROB_ABANDON_LEAD_EARLY: f64 = 0.25;

/// Uniform draws used to estimate per-region free volume.
pub const DEFAULT_NUM_FREEVOL_SAMPLES: usize = 100_000;

/// Region selections per lead.
pub const DEFAULT_NUM_REGION_EXPANSIONS: usize = 100;

/// Tree extensions per region selection.
pub const DEFAULT_NUM_TREE_SELECTIONS: usize = 1;

/// Configuration errors raised by [`SyclopConfig::validate`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be positive, got 0")]
    NonPositiveCount { name: &'static str },
    #[error("{name} must lie in {range}, got {value}")]
    ProbabilityOutOfRange {
        name: &'static str,
        range: &'static str,
        value: f64,
    },
}

/// Planner parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyclopConfig {
    /// Uniform samples for per-region free-volume estimation
    pub num_free_vol_samples: usize,
    /// Region selections per lead
    pub num_region_expansions: usize,
    /// Tree extensions per region selection
    pub num_tree_selections: usize,
    /// A* versus randomized-DFS lead probability, in [0, 1]
    pub prob_shortest_path: f64,
    /// Availability accumulation keep-probability, in [0, 1)
    pub prob_keep_adding_to_avail: f64,
    /// Lead abandonment probability after a non-improving round, in [0, 1]
    pub prob_abandon_lead_early: f64,
    /// Seed for the planner's single random stream
    pub seed: u64,
}

impl Default for SyclopConfig {
    fn default() -> Self {
        Self {
            num_free_vol_samples: DEFAULT_NUM_FREEVOL_SAMPLES,
            num_region_expansions: DEFAULT_NUM_REGION_EXPANSIONS,
            num_tree_selections: DEFAULT_NUM_TREE_SELECTIONS,
            prob_shortest_path: DEFAULT_PROB_SHORTEST_PATH,
            prob_keep_adding_to_avail: DEFAULT_PROB_KEEP_ADDING_TO_AVAIL,
            prob_abandon_lead_early: DEFAULT_PROB_ABANDON_LEAD_EARLY,
            seed: 0,
        }
    }
}

impl SyclopConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_free_vol_samples == 0 {
            return Err(ConfigError::NonPositiveCount {
                name: "num_free_vol_samples",
            });
        }
        if self.num_region_expansions == 0 {
            return Err(ConfigError::NonPositiveCount {
                name: "num_region_expansions",
            });
        }
        if self.num_tree_selections == 0 {
            return Err(ConfigError::NonPositiveCount {
                name: "num_tree_selections",
            });
        }
        if !(0.0..=1.0).contains(&self.prob_shortest_path) {
            return Err(ConfigError::ProbabilityOutOfRange {
                name: "prob_shortest_path",
                range: "[0, 1]",
                value: self.prob_shortest_path,
            });
        }
        if !(0.0..1.0).contains(&self.prob_keep_adding_to_avail) {
            return Err(ConfigError::ProbabilityOutOfRange {
                name: "prob_keep_adding_to_avail",
                range: "[0, 1)",
                value: self.prob_keep_adding_to_avail,
            });
        }
        if !(0.0..=1.0).contains(&self.prob_abandon_lead_early) {
            return Err(ConfigError::ProbabilityOutOfRange {
                name: "prob_abandon_lead_early",
                range: "[0, 1]",
                value: self.prob_abandon_lead_early,
            });
        }
        Ok(())
    }
}
