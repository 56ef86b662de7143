//! Space and manifold sanity checks
//!
//! Cheap randomized audits run at explicit request, never during
//! planning. Each failure mode gets its own error so a misconfigured
//! constraint or metric can be named precisely.

use rand::rngs::StdRng;
use thiserror::Error;

use crate::space::StateSpace;

/// State pairs drawn per metric audit.
const SAMPLE_PAIRS: usize = 50;

/// Bit flags selecting which metric properties to audit.
pub mod flags {
    /// Distinct sampled states must have positive distance.
    pub const DISTANCE_DIFFERENT_STATES: u32 = 1 << 0;
    /// distance(a, b) must equal distance(b, a).
    pub const DISTANCE_SYMMETRIC: u32 = 1 << 1;
    /// No distance may exceed the reported maximum extent.
    pub const DISTANCE_BOUND: u32 = 1 << 2;
    /// Sampled states must satisfy the space bounds.
    pub const RESPECT_BOUNDS: u32 = 1 << 3;
    /// enforce_bounds must not move an in-bounds state.
    pub const ENFORCE_BOUNDS_NO_OP: u32 = 1 << 4;

    pub const ALL: u32 = DISTANCE_DIFFERENT_STATES
        | DISTANCE_SYMMETRIC
        | DISTANCE_BOUND
        | RESPECT_BOUNDS
        | ENFORCE_BOUNDS_NO_OP;
}

/// Failures surfaced by the sanity routines.
#[derive(Debug, Error)]
pub enum SanityError {
    #[error("unable to compute any discrete geodesic on the constraint")]
    NotTraversable,
    #[error("discrete geodesic computation generates states off the constraint manifold")]
    InvalidGeodesicStates,
    #[error("constraint-aware samplers generate states off the constraint manifold")]
    InvalidSamplerStates,
    #[error("distance between distinct states is not positive")]
    DifferentStatesDistance,
    #[error("distance function is not symmetric")]
    DistanceNotSymmetric,
    #[error("distance exceeds the reported maximum extent")]
    DistanceExceedsBound,
    #[error("sampler produced a state outside the space bounds")]
    SampleOutOfBounds,
    #[error("enforce_bounds moved a state that already satisfied the bounds")]
    EnforceBoundsMovedState,
}

/// Audit the metric and bounds behavior of a state space.
///
/// `zero` is the threshold below which a distance counts as zero and
/// `eps` the relative tolerance for comparisons; the constrained-space
/// checks pass machine epsilon for both.
pub fn check_state_space<S: StateSpace + ?Sized>(
    space: &S,
    rng: &mut StdRng,
    zero: f64,
    eps: f64,
    check_flags: u32,
) -> Result<(), SanityError> {
    let mut a = space.alloc_state();
    let mut b = space.alloc_state();

    for _ in 0..SAMPLE_PAIRS {
        space.sample_uniform(rng, &mut a);
        space.sample_uniform(rng, &mut b);

        if check_flags & flags::RESPECT_BOUNDS != 0
            && (!space.satisfies_bounds(&a) || !space.satisfies_bounds(&b))
        {
            return Err(SanityError::SampleOutOfBounds);
        }

        if check_flags & flags::ENFORCE_BOUNDS_NO_OP != 0 {
            let mut clamped = a.clone();
            space.enforce_bounds(&mut clamped);
            if space.distance(&a, &clamped) > zero {
                return Err(SanityError::EnforceBoundsMovedState);
            }
        }

        let d_ab = space.distance(&a, &b);
        let d_ba = space.distance(&b, &a);

        if check_flags & flags::DISTANCE_DIFFERENT_STATES != 0 && a != b && d_ab <= zero {
            return Err(SanityError::DifferentStatesDistance);
        }
        if check_flags & flags::DISTANCE_SYMMETRIC != 0
            && (d_ab - d_ba).abs() > eps * d_ab.abs().max(1.0)
        {
            return Err(SanityError::DistanceNotSymmetric);
        }
        if check_flags & flags::DISTANCE_BOUND != 0
            && d_ab > space.maximum_extent() * (1.0 + eps)
        {
            return Err(SanityError::DistanceExceedsBound);
        }
    }
    Ok(())
}
