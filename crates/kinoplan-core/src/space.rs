//! Ambient state spaces
//!
//! States are dense `f64` vectors owned by the caller; a [`StateSpace`]
//! supplies the metric, interpolation, bounds handling, and sampling
//! operations a planner needs from its carrier space.

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::Rng;
use thiserror::Error;

/// A configuration of the ambient space.
pub type State = DVector<f64>;

/// Carrier-space configuration errors
#[derive(Debug, Error)]
pub enum SpaceError {
    #[error("state space must have at least one dimension")]
    EmptyBounds,
    #[error("invalid bounds on axis {axis}: low {low} must be below high {high}")]
    InvalidBounds { axis: usize, low: f64, high: f64 },
    #[error("step size delta must be positive, got {0}")]
    InvalidDelta(f64),
    #[error("geodesic overshoot factor lambda must exceed 1, got {0}")]
    InvalidLambda(f64),
    #[error("constraint is defined on R^{constraint} but the ambient space is R^{ambient}")]
    DimensionMismatch { ambient: usize, constraint: usize },
    #[error("manifold dimension {manifold} must be below the ambient dimension {ambient}")]
    ManifoldDimension { manifold: usize, ambient: usize },
}

/// Operations a planner requires from its carrier space.
///
/// Implementations must keep `distance` symmetric and bounded by
/// [`StateSpace::maximum_extent`]; the sanity checks in
/// [`crate::sanity`] verify these properties on demand.
pub trait StateSpace {
    /// Number of scalar components in a state.
    fn dimension(&self) -> usize;

    /// Distance between two states.
    fn distance(&self, a: &State, b: &State) -> f64;

    /// Write the interpolant at parameter `t` between `from` and `to` into `out`.
    fn interpolate(&self, from: &State, to: &State, t: f64, out: &mut State);

    /// Upper bound on the distance between any two states in the space.
    fn maximum_extent(&self) -> f64;

    /// Whether `s` lies within the space bounds.
    fn satisfies_bounds(&self, s: &State) -> bool;

    /// Clamp `s` into the space bounds.
    fn enforce_bounds(&self, s: &mut State);

    /// Sample a state uniformly at random over the bounded space.
    fn sample_uniform(&self, rng: &mut StdRng, out: &mut State);

    /// Sample uniformly within `distance` of `near`, clamped to bounds.
    fn sample_uniform_near(&self, rng: &mut StdRng, out: &mut State, near: &State, distance: f64);

    /// Allocate a zeroed state of the right dimension.
    fn alloc_state(&self) -> State {
        DVector::zeros(self.dimension())
    }
}

/// Validity oracle over single states (collision checks, joint limits, ...).
pub trait StateValidityChecker {
    fn is_valid(&self, s: &State) -> bool;
}

/// Checker that accepts every state.
pub struct AlwaysValid;

impl StateValidityChecker for AlwaysValid {
    fn is_valid(&self, _s: &State) -> bool {
        true
    }
}

/// Axis-aligned box in R^n with the Euclidean metric.
#[derive(Debug, Clone)]
pub struct RealVectorSpace {
    bounds: Vec<(f64, f64)>,
}

impl RealVectorSpace {
    /// Create a space from per-axis `(low, high)` bounds.
    pub fn new(bounds: Vec<(f64, f64)>) -> Result<Self, SpaceError> {
        if bounds.is_empty() {
            return Err(SpaceError::EmptyBounds);
        }
        for (axis, &(low, high)) in bounds.iter().enumerate() {
            if !(low < high) {
                return Err(SpaceError::InvalidBounds { axis, low, high });
            }
        }
        Ok(Self { bounds })
    }

    /// Hypercube `[low, high]^dimension`.
    pub fn cube(dimension: usize, low: f64, high: f64) -> Result<Self, SpaceError> {
        Self::new(vec![(low, high); dimension])
    }

    pub fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }
}

impl StateSpace for RealVectorSpace {
    fn dimension(&self) -> usize {
        self.bounds.len()
    }

    fn distance(&self, a: &State, b: &State) -> f64 {
        (a - b).norm()
    }

    fn interpolate(&self, from: &State, to: &State, t: f64, out: &mut State) {
        out.copy_from(from);
        out.axpy(t, &(to - from), 1.0);
    }

    fn maximum_extent(&self) -> f64 {
        self.bounds
            .iter()
            .map(|(low, high)| (high - low) * (high - low))
            .sum::<f64>()
            .sqrt()
    }

    fn satisfies_bounds(&self, s: &State) -> bool {
        s.iter()
            .zip(&self.bounds)
            .all(|(v, (low, high))| *v >= *low && *v <= *high)
    }

    fn enforce_bounds(&self, s: &mut State) {
        for (v, (low, high)) in s.iter_mut().zip(&self.bounds) {
            *v = v.clamp(*low, *high);
        }
    }

    fn sample_uniform(&self, rng: &mut StdRng, out: &mut State) {
        for (v, (low, high)) in out.iter_mut().zip(&self.bounds) {
            *v = rng.gen_range(*low..*high);
        }
    }

    fn sample_uniform_near(&self, rng: &mut StdRng, out: &mut State, near: &State, distance: f64) {
        for (i, (v, (low, high))) in out.iter_mut().zip(&self.bounds).enumerate() {
            let lo = (near[i] - distance).max(*low);
            let hi = (near[i] + distance).min(*high);
            *v = if lo < hi { rng.gen_range(lo..hi) } else { lo };
        }
    }
}
