//! Region selection distributions
//!
//! Two small samplers drive the outer loop: a weighted discrete
//! distribution over the currently available lead regions, and a
//! uniform set sampler for start/goal regions. Both draw from the
//! planner's single random stream, so selection order is reproducible
//! under a fixed seed.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::Rng;

/// Discrete distribution over region indices, proportional to the
/// weight each entry was added with.
#[derive(Debug, Default)]
pub struct AvailabilityDistribution {
    entries: Vec<(usize, f64)>,
    total_weight: f64,
}

impl AvailabilityDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, region: usize, weight: f64) {
        self.entries.push((region, weight));
        self.total_weight += weight;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_weight = 0.0;
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn regions(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|(region, _)| *region)
    }

    /// Draw a region with probability proportional to its weight.
    ///
    /// # Panics
    ///
    /// Panics if the distribution is empty.
    pub fn sample(&self, rng: &mut StdRng) -> usize {
        let mut remaining = rng.gen::<f64>() * self.total_weight;
        for &(region, weight) in &self.entries {
            if remaining < weight {
                return region;
            }
            remaining -= weight;
        }
        // Floating-point shortfall lands on the final entry.
        self.entries[self.entries.len() - 1].0
    }
}

/// De-duplicated region index set with uniform sampling.
#[derive(Debug, Default)]
pub struct RegionSet {
    indices: Vec<usize>,
    seen: HashSet<usize>,
}

impl RegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, region: usize) {
        if self.seen.insert(region) {
            self.indices.push(region);
        }
    }

    pub fn clear(&mut self) {
        self.indices.clear();
        self.seen.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, region: usize) -> bool {
        self.seen.contains(&region)
    }

    /// Uniform draw over the stored indices.
    ///
    /// # Panics
    ///
    /// Panics if the set is empty.
    pub fn sample(&self, rng: &mut StdRng) -> usize {
        self.indices[rng.gen_range(0..self.indices.len())]
    }
}
