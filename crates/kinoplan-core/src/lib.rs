//! # Kinoplan Core
//!
//! Constraint-manifold infrastructure for sampling-based motion
//! planning: ambient state spaces, implicit equality constraints with
//! Newton projection, discrete geodesic traversal, and motion
//! validation along the manifold.
//!
//! ## Modules
//!
//! - [`space`]: carrier spaces, states, validity checking
//! - [`constraint`]: implicit constraints F(q) = 0 and projection
//! - [`constrained`]: constrained spaces and discrete geodesics
//! - [`validator`]: edge validation via geodesic traversal
//! - [`sanity`]: randomized metric and manifold audits

pub mod constrained;
pub mod constraint;
pub mod sanity;
pub mod space;
pub mod validator;

pub use constrained::{ConstrainedStateSpace, ProjectedStateSpace, DEFAULT_DELTA, DEFAULT_LAMBDA};
pub use constraint::{Constraint, SphereConstraint};
pub use sanity::SanityError;
pub use space::{
    AlwaysValid, RealVectorSpace, SpaceError, State, StateSpace, StateValidityChecker,
};
pub use validator::{ConstrainedMotionValidator, LastValid};
