//! Implicit equality constraints
//!
//! A constraint is a differentiable function F: R^n -> R^(n-k) whose zero
//! set is the k-dimensional manifold of admissible configurations.
//! [`Constraint::project`] is the workhorse the constrained space leans
//! on: a Newton iteration that pulls an arbitrary ambient state onto the
//! zero set, or reports failure once its iteration budget is spent.

use nalgebra::{DMatrix, DVector};

use crate::space::State;

/// Tolerance below which ‖F(x)‖ counts as satisfied.
pub const DEFAULT_PROJECTION_TOLERANCE: f64 = 1e-4;

/// Newton iteration budget for [`Constraint::project`].
pub const DEFAULT_PROJECTION_MAX_ITERATIONS: u32 = 50;

/// Step used by the finite-difference Jacobian fallback.
const FD_STEP: f64 = 1e-6;

/// Singular values below this are treated as zero in the pseudo-inverse.
const SVD_EPSILON: f64 = 1e-12;

/// An implicit equality constraint F(q) = 0 on an ambient space.
pub trait Constraint {
    /// Dimension n of the ambient space the constraint is defined on.
    fn ambient_dimension(&self) -> usize;

    /// Dimension k of the constraint manifold, k < n.
    fn manifold_dimension(&self) -> usize;

    /// Number of scalar equations, n - k.
    fn co_dimension(&self) -> usize {
        self.ambient_dimension() - self.manifold_dimension()
    }

    /// Satisfaction tolerance on ‖F(x)‖.
    fn tolerance(&self) -> f64 {
        DEFAULT_PROJECTION_TOLERANCE
    }

    /// Projection iteration budget.
    fn max_iterations(&self) -> u32 {
        DEFAULT_PROJECTION_MAX_ITERATIONS
    }

    /// Evaluate F(x) into `out` (length n - k).
    fn function(&self, x: &State, out: &mut DVector<f64>);

    /// Evaluate the Jacobian of F at `x` into the (n-k) x n matrix `out`.
    ///
    /// The default is a central finite difference of [`Constraint::function`];
    /// override with the analytic Jacobian where one is available.
    fn jacobian(&self, x: &State, out: &mut DMatrix<f64>) {
        let n = self.ambient_dimension();
        let m = self.co_dimension();
        let mut probe = x.clone();
        let mut forward = DVector::zeros(m);
        let mut backward = DVector::zeros(m);
        for col in 0..n {
            let center = probe[col];
            probe[col] = center + FD_STEP;
            self.function(&probe, &mut forward);
            probe[col] = center - FD_STEP;
            self.function(&probe, &mut backward);
            probe[col] = center;
            for row in 0..m {
                out[(row, col)] = (forward[row] - backward[row]) / (2.0 * FD_STEP);
            }
        }
    }

    /// Whether `x` lies on the manifold within tolerance.
    fn is_satisfied(&self, x: &State) -> bool {
        let mut f = DVector::zeros(self.co_dimension());
        self.function(x, &mut f);
        f.norm() <= self.tolerance()
    }

    /// Newton projection of `x` onto the zero set of F.
    ///
    /// Iterates `x <- x - J(x)⁺ F(x)` with the pseudo-inverse taken through
    /// an SVD least-squares solve. Deterministic for a given input; returns
    /// `false` without further guarantees on `x` when the iteration budget
    /// runs out or the Jacobian degenerates.
    fn project(&self, x: &mut State) -> bool {
        let n = self.ambient_dimension();
        let m = self.co_dimension();
        let mut f = DVector::zeros(m);
        self.function(x, &mut f);

        let mut iterations = 0;
        while f.norm() > self.tolerance() {
            if iterations >= self.max_iterations() {
                return false;
            }
            let mut jac = DMatrix::zeros(m, n);
            self.jacobian(x, &mut jac);
            let step = match jac.svd(true, true).solve(&f, SVD_EPSILON) {
                Ok(step) => step,
                Err(_) => return false,
            };
            *x -= step;
            self.function(x, &mut f);
            iterations += 1;
        }
        true
    }
}

/// The sphere ‖q‖ = radius, the canonical n-1 dimensional test manifold.
#[derive(Debug, Clone)]
pub struct SphereConstraint {
    ambient: usize,
    radius: f64,
}

impl SphereConstraint {
    /// Unit sphere embedded in R^ambient.
    pub fn unit(ambient: usize) -> Self {
        Self::with_radius(ambient, 1.0)
    }

    pub fn with_radius(ambient: usize, radius: f64) -> Self {
        assert!(ambient >= 2, "sphere needs at least two ambient dimensions");
        assert!(radius > 0.0, "sphere radius must be positive");
        Self { ambient, radius }
    }
}

impl Constraint for SphereConstraint {
    fn ambient_dimension(&self) -> usize {
        self.ambient
    }

    fn manifold_dimension(&self) -> usize {
        self.ambient - 1
    }

    fn function(&self, x: &State, out: &mut DVector<f64>) {
        out[0] = x.norm() - self.radius;
    }

    fn jacobian(&self, x: &State, out: &mut DMatrix<f64>) {
        let norm = x.norm();
        if norm > 0.0 {
            for col in 0..self.ambient {
                out[(0, col)] = x[col] / norm;
            }
        } else {
            out.fill(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_project_pulls_onto_sphere() {
        let sphere = SphereConstraint::unit(3);
        let mut x = State::from_vec(vec![2.0, -1.0, 0.5]);

        assert!(!sphere.is_satisfied(&x));
        assert!(sphere.project(&mut x));
        assert!(sphere.is_satisfied(&x));
        assert_relative_eq!(x.norm(), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_project_is_deterministic() {
        let sphere = SphereConstraint::with_radius(4, 2.0);
        let start = State::from_vec(vec![0.3, 1.7, -2.2, 0.9]);

        let mut a = start.clone();
        let mut b = start.clone();
        assert!(sphere.project(&mut a));
        assert!(sphere.project(&mut b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_project_fails_on_degenerate_jacobian() {
        let sphere = SphereConstraint::unit(2);
        // The origin has no gradient direction to follow.
        let mut x = State::from_vec(vec![0.0, 0.0]);
        assert!(!sphere.project(&mut x));
    }

    #[test]
    fn test_finite_difference_matches_analytic_jacobian() {
        struct NumericSphere(SphereConstraint);
        impl Constraint for NumericSphere {
            fn ambient_dimension(&self) -> usize {
                self.0.ambient_dimension()
            }
            fn manifold_dimension(&self) -> usize {
                self.0.manifold_dimension()
            }
            fn function(&self, x: &State, out: &mut DVector<f64>) {
                self.0.function(x, out)
            }
            // jacobian left to the finite-difference default
        }

        let analytic = SphereConstraint::unit(3);
        let numeric = NumericSphere(SphereConstraint::unit(3));
        let x = State::from_vec(vec![0.6, -0.8, 0.1]);

        let mut ja = DMatrix::zeros(1, 3);
        let mut jn = DMatrix::zeros(1, 3);
        analytic.jacobian(&x, &mut ja);
        numeric.jacobian(&x, &mut jn);

        assert_relative_eq!(ja, jn, epsilon = 1e-6);
    }

    #[test]
    fn test_satisfied_state_projects_in_place() {
        let sphere = SphereConstraint::unit(3);
        let mut x = State::from_vec(vec![0.0, 1.0, 0.0]);
        let before = x.clone();

        assert!(sphere.project(&mut x));
        assert_eq!(x, before);
    }
}
