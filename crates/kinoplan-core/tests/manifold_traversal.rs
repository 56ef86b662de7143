//! Manifold traversal properties
//!
//! Randomized checks of the constrained-space contract on the unit
//! sphere: reached geodesics stay on the manifold with bounded steps,
//! the validator agrees with raw traversal, and interpolation along a
//! degenerate geodesic is a plain copy.

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use kinoplan_core::constrained::{ConstrainedStateSpace, ProjectedStateSpace};
use kinoplan_core::constraint::{Constraint, SphereConstraint};
use kinoplan_core::space::{RealVectorSpace, StateSpace};
use kinoplan_core::validator::{ConstrainedMotionValidator, LastValid};

fn sphere_space() -> ProjectedStateSpace<RealVectorSpace, SphereConstraint> {
    let ambient = RealVectorSpace::cube(3, -1.5, 1.5).unwrap();
    let mut space = ProjectedStateSpace::new(ambient, SphereConstraint::unit(3));
    space.setup().unwrap();
    space
}

#[test]
fn test_reached_geodesics_satisfy_invariants() {
    let space = sphere_space();
    let mut rng = StdRng::seed_from_u64(101);
    let mut from = space.alloc_state();
    let mut to = space.alloc_state();

    let mut reached_any = false;
    for _ in 0..20 {
        space.sample_uniform(&mut rng, &mut from);
        space.sample_uniform_near(&mut rng, &mut to, &from, 10.0 * space.delta());

        let mut geodesic = Vec::new();
        if !space.discrete_geodesic(&from, &to, true, Some(&mut geodesic)) {
            continue;
        }
        reached_any = true;

        assert!(!geodesic.is_empty());
        assert_relative_eq!(geodesic[0], from, epsilon = 1e-12);
        for s in &geodesic {
            assert!(space.constraint().is_satisfied(s));
        }
        for pair in geodesic.windows(2) {
            let step = space.distance(&pair[0], &pair[1]);
            assert!(step <= space.lambda() * space.delta() + 1e-12);
        }
        let last = &geodesic[geodesic.len() - 1];
        assert!(space.distance(last, &to) <= space.delta() + 1e-12);
    }
    assert!(reached_any);
}

#[test]
fn test_validator_agrees_with_traversal() {
    let space = sphere_space();
    let validator = ConstrainedMotionValidator::new(&space);
    let mut rng = StdRng::seed_from_u64(202);
    let mut s1 = space.alloc_state();
    let mut s2 = space.alloc_state();

    for _ in 0..20 {
        space.sample_uniform(&mut rng, &mut s1);
        space.sample_uniform(&mut rng, &mut s2);

        let expected = space.constraint().is_satisfied(&s2)
            && space.discrete_geodesic(&s1, &s2, false, None);
        assert_eq!(validator.check_motion(&s1, &s2), expected);

        let mut last_valid = LastValid::new(space.dimension());
        assert_eq!(
            validator.check_motion_last_valid(&s1, &s2, &mut last_valid),
            expected
        );
    }
}

#[test]
fn test_interpolation_between_identical_states_is_copy() {
    let space = sphere_space();
    let mut rng = StdRng::seed_from_u64(303);
    let mut a = space.alloc_state();
    let mut out = space.alloc_state();

    for i in 0..10 {
        space.sample_uniform(&mut rng, &mut a);
        let t = i as f64 / 9.0;
        space.interpolate(&a, &a, t, &mut out);
        assert_eq!(out, a);
    }
}

#[test]
fn test_interpolants_stay_on_manifold() {
    let space = sphere_space();
    let mut rng = StdRng::seed_from_u64(404);
    let mut from = space.alloc_state();
    let mut to = space.alloc_state();
    let mut out = space.alloc_state();

    for i in 0..10 {
        space.sample_uniform(&mut rng, &mut from);
        space.sample_uniform(&mut rng, &mut to);
        let t = i as f64 / 9.0;
        space.interpolate(&from, &to, t, &mut out);
        assert!(space.constraint().is_satisfied(&out));
    }
}

#[test]
fn test_sanity_checks_accept_the_sphere() {
    let space = sphere_space();
    let mut rng = StdRng::seed_from_u64(505);
    assert!(space.sanity_checks(&mut rng).is_ok());
}
