//! Constrained state spaces and discrete geodesics
//!
//! A constrained space wraps an ambient carrier and an equality
//! constraint, replacing straight-line interpolation with traversal of
//! the constraint manifold. The traversal primitive is
//! [`ConstrainedStateSpace::discrete_geodesic`]: a finite chain of
//! on-manifold states joining two configurations with bounded
//! consecutive separation. [`ProjectedStateSpace`] is the concrete
//! strategy used here: step toward the target in the ambient space,
//! then Newton-project back onto the manifold.

use rand::rngs::StdRng;

use crate::constraint::Constraint;
use crate::sanity::{self, flags, SanityError};
use crate::space::{SpaceError, State, StateSpace, StateValidityChecker};

/// Default manifold traversal step.
pub const DEFAULT_DELTA: f64 = 0.05;

/// Default overshoot slack: a single projected step may stretch to
/// `lambda * delta`, and a whole traversal to `lambda` times the
/// straight-line distance, before the traversal gives up.
pub const DEFAULT_LAMBDA: f64 = 2.0;

/// A state space whose interpolation follows an implicit constraint manifold.
pub trait ConstrainedStateSpace: StateSpace {
    /// The wrapped carrier space.
    fn ambient(&self) -> &dyn StateSpace;

    /// The equality constraint defining the manifold.
    fn constraint(&self) -> &dyn Constraint;

    /// Traversal step bound.
    fn delta(&self) -> f64;

    /// Compute a discrete geodesic from `from` toward `to`.
    ///
    /// Returns `true` iff traversal reached a state within [`Self::delta`]
    /// of `to`. When `geodesic` is supplied the visited states are written
    /// to it in traversal order, starting with a copy of `from`; the caller
    /// owns them. `from` must satisfy the constraint; if it does not, the
    /// traversal fails with an empty list. On failure after partial
    /// progress the list holds the successfully traversed prefix and never
    /// contains `to`. When `interpolate` is false, traversal additionally
    /// stops at the first state rejected by the validity checker, if one
    /// is configured.
    fn discrete_geodesic(
        &self,
        from: &State,
        to: &State,
        interpolate: bool,
        geodesic: Option<&mut Vec<State>>,
    ) -> bool;

    /// Pick the geodesic sample closest to parameter `t` in arc length.
    ///
    /// Ties resolve to the earlier sample; a degenerate geodesic (total
    /// length below machine epsilon) yields the first sample.
    ///
    /// # Panics
    ///
    /// Panics if `geodesic` is empty.
    fn geodesic_interpolate<'a>(&self, geodesic: &'a [State], t: f64) -> &'a State {
        let n = geodesic.len();
        let mut cumulative = vec![0.0; n];
        for i in 1..n {
            cumulative[i] = cumulative[i - 1] + self.distance(&geodesic[i - 1], &geodesic[i]);
        }

        let total = cumulative[n - 1];
        if total <= f64::EPSILON {
            return &geodesic[0];
        }

        let mut i = 0;
        while i < n - 1 && cumulative[i] / total < t {
            i += 1;
        }
        if i + 1 >= n {
            return &geodesic[i];
        }
        let here = (cumulative[i] / total - t).abs();
        let next = (cumulative[i + 1] / total - t).abs();
        if here <= next {
            &geodesic[i]
        } else {
            &geodesic[i + 1]
        }
    }

    /// Geodesic-based interpolation; falls back to `from` when the
    /// manifold between the two states cannot be traversed.
    fn interpolate_on_manifold(&self, from: &State, to: &State, t: f64, out: &mut State) {
        let mut geodesic = Vec::new();
        if self.discrete_geodesic(from, to, true, Some(&mut geodesic)) {
            out.copy_from(self.geodesic_interpolate(&geodesic, t));
        } else {
            out.copy_from(from);
        }
    }

    /// Randomized audit of the constrained space.
    ///
    /// Samples ten near-neighbor pairs and checks that at least one pair
    /// is traversable, that every geodesic state satisfies the constraint,
    /// and that the samplers stay on-manifold; each failure is its own
    /// error. Finishes with the metric audit of [`crate::sanity`] at
    /// machine-epsilon tolerances.
    fn sanity_checks(&self, rng: &mut StdRng) -> Result<(), SanityError> {
        let mut s1 = self.alloc_state();
        let mut s2 = self.alloc_state();

        let mut traversable = false;
        let mut bad_geodesic = false;
        let mut bad_samplers = false;

        for _ in 0..10 {
            if bad_geodesic {
                break;
            }
            self.sample_uniform(rng, &mut s1);
            self.sample_uniform_near(rng, &mut s2, &s1, 10.0 * self.delta());
            bad_samplers |=
                !self.constraint().is_satisfied(&s1) || !self.constraint().is_satisfied(&s2);

            let mut geodesic = Vec::new();
            if self.discrete_geodesic(&s1, &s2, true, Some(&mut geodesic)) {
                traversable = true;
                for s in &geodesic {
                    bad_geodesic |= !self.constraint().is_satisfied(s);
                }
            }
        }

        if !traversable {
            return Err(SanityError::NotTraversable);
        }
        if bad_geodesic {
            return Err(SanityError::InvalidGeodesicStates);
        }
        if bad_samplers {
            return Err(SanityError::InvalidSamplerStates);
        }

        sanity::check_state_space(self, rng, f64::EPSILON, f64::EPSILON, flags::ALL)
    }
}

/// Projection-based constrained space.
///
/// Traversal repeatedly interpolates one `delta` toward the target in
/// the ambient space and projects the result back onto the manifold,
/// giving up on projection failure, degenerate or overlong steps, or an
/// exhausted travel budget.
pub struct ProjectedStateSpace<A: StateSpace, C: Constraint> {
    ambient: A,
    constraint: C,
    delta: f64,
    lambda: f64,
    longest_valid_segment_fraction: f64,
    validity_checker: Option<Box<dyn StateValidityChecker>>,
    is_setup: bool,
}

impl<A: StateSpace, C: Constraint> ProjectedStateSpace<A, C> {
    pub fn new(ambient: A, constraint: C) -> Self {
        Self {
            ambient,
            constraint,
            delta: DEFAULT_DELTA,
            lambda: DEFAULT_LAMBDA,
            longest_valid_segment_fraction: 1.0,
            validity_checker: None,
            is_setup: false,
        }
    }

    /// Set the traversal step; once set up, also refreshes the
    /// valid-segment fraction derived from it.
    pub fn set_delta(&mut self, delta: f64) -> Result<(), SpaceError> {
        if delta <= 0.0 {
            return Err(SpaceError::InvalidDelta(delta));
        }
        self.delta = delta;
        if self.is_setup {
            self.longest_valid_segment_fraction = self.delta / self.ambient.maximum_extent();
        }
        Ok(())
    }

    pub fn set_lambda(&mut self, lambda: f64) -> Result<(), SpaceError> {
        if lambda <= 1.0 {
            return Err(SpaceError::InvalidLambda(lambda));
        }
        self.lambda = lambda;
        Ok(())
    }

    /// Install the validity oracle consulted during non-interpolating
    /// traversal (i.e. motion validation).
    pub fn set_validity_checker(&mut self, checker: Box<dyn StateValidityChecker>) {
        self.validity_checker = Some(checker);
    }

    /// Verify the space/constraint pairing and finish configuration.
    /// Idempotent; must be called before planning.
    pub fn setup(&mut self) -> Result<(), SpaceError> {
        if self.is_setup {
            return Ok(());
        }

        let n = self.ambient.dimension();
        let cn = self.constraint.ambient_dimension();
        if n != cn {
            return Err(SpaceError::DimensionMismatch {
                ambient: n,
                constraint: cn,
            });
        }
        let k = self.constraint.manifold_dimension();
        if k >= n {
            return Err(SpaceError::ManifoldDimension {
                manifold: k,
                ambient: n,
            });
        }

        self.is_setup = true;
        // Re-apply so the segment fraction propagates now that setup is done.
        self.set_delta(self.delta)
    }

    pub fn is_setup(&self) -> bool {
        self.is_setup
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Fraction of the maximum extent a motion segment may span before
    /// subdivision; kept in lockstep with `delta`.
    pub fn longest_valid_segment_fraction(&self) -> f64 {
        self.longest_valid_segment_fraction
    }
}

impl<A: StateSpace, C: Constraint> StateSpace for ProjectedStateSpace<A, C> {
    fn dimension(&self) -> usize {
        self.ambient.dimension()
    }

    fn distance(&self, a: &State, b: &State) -> f64 {
        self.ambient.distance(a, b)
    }

    fn interpolate(&self, from: &State, to: &State, t: f64, out: &mut State) {
        self.interpolate_on_manifold(from, to, t, out);
    }

    fn maximum_extent(&self) -> f64 {
        self.ambient.maximum_extent()
    }

    fn satisfies_bounds(&self, s: &State) -> bool {
        self.ambient.satisfies_bounds(s)
    }

    fn enforce_bounds(&self, s: &mut State) {
        self.ambient.enforce_bounds(s);
    }

    fn sample_uniform(&self, rng: &mut StdRng, out: &mut State) {
        self.ambient.sample_uniform(rng, out);
        self.constraint.project(out);
        self.ambient.enforce_bounds(out);
    }

    fn sample_uniform_near(&self, rng: &mut StdRng, out: &mut State, near: &State, distance: f64) {
        self.ambient.sample_uniform_near(rng, out, near, distance);
        self.constraint.project(out);
        self.ambient.enforce_bounds(out);
    }
}

impl<A: StateSpace, C: Constraint> ConstrainedStateSpace for ProjectedStateSpace<A, C> {
    fn ambient(&self) -> &dyn StateSpace {
        &self.ambient
    }

    fn constraint(&self) -> &dyn Constraint {
        &self.constraint
    }

    fn delta(&self) -> f64 {
        self.delta
    }

    fn discrete_geodesic(
        &self,
        from: &State,
        to: &State,
        interpolate: bool,
        mut geodesic: Option<&mut Vec<State>>,
    ) -> bool {
        if let Some(list) = geodesic.as_deref_mut() {
            list.clear();
        }
        if !self.constraint.is_satisfied(from) {
            return false;
        }
        if let Some(list) = geodesic.as_deref_mut() {
            list.push(from.clone());
        }

        let tolerance = self.delta;
        let mut dist = self.ambient.distance(from, to);
        if dist <= tolerance {
            return true;
        }

        let travel_budget = self.lambda * dist;
        let mut traveled = 0.0;
        let mut previous = from.clone();
        let mut scratch = self.ambient.alloc_state();

        while dist > tolerance {
            self.ambient
                .interpolate(&previous, to, self.delta / dist, &mut scratch);
            if !self.constraint.project(&mut scratch) {
                break;
            }

            let step = self.ambient.distance(&previous, &scratch);
            if step < f64::EPSILON || step > self.lambda * self.delta {
                break;
            }
            if !interpolate {
                if let Some(checker) = &self.validity_checker {
                    if !checker.is_valid(&scratch) {
                        break;
                    }
                }
            }

            traveled += step;
            if traveled > travel_budget {
                break;
            }

            previous.copy_from(&scratch);
            if let Some(list) = geodesic.as_deref_mut() {
                list.push(scratch.clone());
            }
            dist = self.ambient.distance(&scratch, to);
        }

        dist <= tolerance
    }
}
