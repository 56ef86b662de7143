//! Constrained motion validation
//!
//! An edge between two configurations is valid when the constraint
//! manifold between them can be traversed and the far endpoint itself
//! satisfies the constraint. Validation never fails loudly: the result
//! is a boolean, with the furthest reachable state reported through
//! [`LastValid`] on request.

use crate::constrained::ConstrainedStateSpace;
use crate::space::State;

/// Where along a failed motion the last valid state sits.
///
/// The state buffer is owned by the caller; the validator only copies
/// into it. `t` is the interpolation parameter of that state on the
/// attempted motion.
#[derive(Debug, Clone)]
pub struct LastValid {
    pub state: State,
    pub t: f64,
}

impl LastValid {
    pub fn new(dimension: usize) -> Self {
        Self {
            state: State::zeros(dimension),
            t: 0.0,
        }
    }
}

/// Motion validator backed by discrete geodesic traversal.
pub struct ConstrainedMotionValidator<'a, S: ConstrainedStateSpace + ?Sized> {
    space: &'a S,
}

impl<'a, S: ConstrainedStateSpace + ?Sized> ConstrainedMotionValidator<'a, S> {
    pub fn new(space: &'a S) -> Self {
        Self { space }
    }

    /// Whether the motion from `s1` to `s2` stays on the manifold and
    /// reaches `s2`.
    pub fn check_motion(&self, s1: &State, s2: &State) -> bool {
        self.space.constraint().is_satisfied(s2)
            && self.space.discrete_geodesic(s1, s2, false, None)
    }

    /// As [`Self::check_motion`], additionally reporting the last valid
    /// state and its interpolation parameter when the motion fails.
    pub fn check_motion_last_valid(
        &self,
        s1: &State,
        s2: &State,
        last_valid: &mut LastValid,
    ) -> bool {
        let mut states = Vec::new();
        let reached = self.space.discrete_geodesic(s1, s2, false, Some(&mut states));

        // An empty traversal means even s1 was unusable; report zero
        // progress from s1 itself.
        if states.is_empty() {
            last_valid.state.copy_from(s1);
            last_valid.t = 0.0;
            return false;
        }

        if !reached {
            let mut traveled = 0.0;
            for pair in states.windows(2) {
                traveled += self.space.distance(&pair[0], &pair[1]);
            }
            let last = &states[states.len() - 1];
            last_valid.state.copy_from(last);
            let remaining = self.space.distance(last, s2);
            last_valid.t = traveled / (traveled + remaining);
        }

        self.space.constraint().is_satisfied(s2) && reached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constrained::ProjectedStateSpace;
    use crate::constraint::SphereConstraint;
    use crate::space::RealVectorSpace;
    use approx::assert_relative_eq;

    fn sphere_space() -> ProjectedStateSpace<RealVectorSpace, SphereConstraint> {
        let ambient = RealVectorSpace::cube(3, -1.5, 1.5).unwrap();
        let mut space = ProjectedStateSpace::new(ambient, SphereConstraint::unit(3));
        space.setup().unwrap();
        space
    }

    #[test]
    fn test_valid_motion_on_sphere() {
        let space = sphere_space();
        let validator = ConstrainedMotionValidator::new(&space);
        let s1 = State::from_vec(vec![1.0, 0.0, 0.0]);
        let s2 = State::from_vec(vec![0.0, 0.0, 1.0]);

        assert!(validator.check_motion(&s1, &s2));

        let mut last_valid = LastValid::new(3);
        assert!(validator.check_motion_last_valid(&s1, &s2, &mut last_valid));
    }

    #[test]
    fn test_off_manifold_start_reports_zero_progress() {
        let space = sphere_space();
        let validator = ConstrainedMotionValidator::new(&space);
        let s1 = State::from_vec(vec![1.3, 1.3, 0.0]);
        let s2 = State::from_vec(vec![0.0, 0.0, 1.0]);

        assert!(!validator.check_motion(&s1, &s2));

        let mut last_valid = LastValid::new(3);
        assert!(!validator.check_motion_last_valid(&s1, &s2, &mut last_valid));
        assert_relative_eq!(last_valid.state, s1, epsilon = 1e-12);
        assert_relative_eq!(last_valid.t, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_off_manifold_target_rejected() {
        let space = sphere_space();
        let validator = ConstrainedMotionValidator::new(&space);
        let s1 = State::from_vec(vec![1.0, 0.0, 0.0]);
        let s2 = State::from_vec(vec![1.2, 1.2, 0.0]);

        assert!(!validator.check_motion(&s1, &s2));
    }

    #[test]
    fn test_agreement_with_geodesic_traversal() {
        let space = sphere_space();
        let validator = ConstrainedMotionValidator::new(&space);

        let pairs = [
            (vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]),
            (vec![1.0, 0.0, 0.0], vec![-1.0, 0.0, 0.0]),
            (vec![0.0, 0.0, 1.0], vec![0.6, -0.8, 0.0]),
            (vec![1.3, 0.0, 0.0], vec![0.0, 1.0, 0.0]),
        ];
        for (a, b) in pairs {
            let s1 = State::from_vec(a);
            let s2 = State::from_vec(b);
            let expected = space.constraint().is_satisfied(&s2)
                && space.discrete_geodesic(&s1, &s2, false, None);
            assert_eq!(validator.check_motion(&s1, &s2), expected);
        }
    }
}
