//! Spherical relaxation of quad-dominant graphs.
//!
//! One relaxation iteration runs three steps in order:
//!
//! 1. [`squarification`] pulls every face loop toward a regular polygon, with
//!    an extra "gun" pull on faces much smaller than the mesh average.
//! 2. [`laplacian`] smooths the result toward neighbor averages.
//! 3. [`project_to_sphere`] puts every vertex back on the target sphere.
//!
//! The corner distance returned by one squarification becomes the target of
//! the next, so faces drift toward a common size.
//!
//! # Example
//!
//! ```
//! use quadsphere::algo::relax::{relax, RelaxOptions};
//! use quadsphere::algo::subdivide::subdivide_quad;
//! use quadsphere::graph::cube;
//!
//! let mut graph = cube(1.0);
//! subdivide_quad(&mut graph).unwrap();
//!
//! let options = RelaxOptions::default().with_max_iterations(20);
//! let report = relax(&mut graph, &options).unwrap();
//! assert_eq!(report.iterations, 20);
//! ```

mod laplacian;
mod squarify;

pub use laplacian::{laplacian, laplacian_with};
pub use squarify::squarification;

pub use super::sphere::project_to_sphere;

use log::{debug, info};

use super::Progress;
use crate::error::{GraphError, Result};
use crate::graph::Graph;

/// Hard cap on relaxation iterations.
pub const MAX_ITERATIONS: usize = 1000;

/// Options for [`relax`].
#[derive(Debug, Clone)]
pub struct RelaxOptions {
    /// Number of iterations to run (at most [`MAX_ITERATIONS`]).
    pub max_iterations: usize,

    /// Laplacian step factor in `[0, 1]`; 1 is a plain neighbor average.
    pub laplacian_lambda: f64,

    /// Radius of the target sphere.
    pub radius: f64,

    /// Stop early once no vertex moves further than this in one iteration.
    /// Without a tolerance the loop always runs `max_iterations` times.
    pub tolerance: Option<f64>,

    /// Fixed corner distance for squarification. When unset, the mean corner
    /// distance of the previous iteration is used.
    pub target: Option<f64>,

    /// Strength of the extra pull on undersized faces.
    pub gun_boost: f64,

    /// A face is undersized when its corner distance is below this fraction
    /// of the target.
    pub small_face_ratio: f64,

    /// Whether to evaluate per-loop and per-vertex work in parallel.
    pub parallel: bool,
}

impl Default for RelaxOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            laplacian_lambda: 1.0,
            radius: 1.0,
            tolerance: None,
            target: None,
            gun_boost: 0.5,
            small_face_ratio: 0.5,
            parallel: true,
        }
    }
}

impl RelaxOptions {
    /// Set the number of iterations.
    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Set the Laplacian step factor.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.laplacian_lambda = lambda;
        self
    }

    /// Set the target sphere radius.
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Enable early termination at the given displacement tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Fix the squarification corner distance.
    pub fn with_target(mut self, target: f64) -> Self {
        self.target = Some(target);
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Check every field against its valid range.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations > MAX_ITERATIONS {
            return Err(GraphError::invalid_param(
                "max_iterations",
                self.max_iterations as f64,
                "must not exceed 1000",
            ));
        }
        if !(0.0..=1.0).contains(&self.laplacian_lambda) {
            return Err(GraphError::invalid_param(
                "laplacian_lambda",
                self.laplacian_lambda,
                "must lie in [0, 1]",
            ));
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(GraphError::invalid_param(
                "radius",
                self.radius,
                "must be positive and finite",
            ));
        }
        if let Some(tol) = self.tolerance {
            if !tol.is_finite() || tol < 0.0 {
                return Err(GraphError::invalid_param("tolerance", tol, "must be non-negative"));
            }
        }
        if let Some(target) = self.target {
            if !target.is_finite() || target <= 0.0 {
                return Err(GraphError::invalid_param("target", target, "must be positive"));
            }
        }
        if !self.gun_boost.is_finite() || self.gun_boost < 0.0 {
            return Err(GraphError::invalid_param(
                "gun_boost",
                self.gun_boost,
                "must be non-negative",
            ));
        }
        if !(0.0..=1.0).contains(&self.small_face_ratio) {
            return Err(GraphError::invalid_param(
                "small_face_ratio",
                self.small_face_ratio,
                "must lie in [0, 1]",
            ));
        }
        Ok(())
    }
}

/// Outcome of a [`relax`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RelaxReport {
    /// Iterations actually run.
    pub iterations: usize,
    /// Whether the run stopped because the tolerance was reached.
    pub converged: bool,
    /// Largest single-vertex move in the last iteration.
    pub last_max_displacement: f64,
    /// Mean corner distance measured by the last squarification.
    pub corner_distance: f64,
}

/// Relax a closed graph onto a sphere.
///
/// Runs up to `options.max_iterations` iterations of squarification,
/// Laplacian smoothing and projection. With a tolerance, stops after the
/// first iteration in which no vertex moved further than the tolerance.
pub fn relax(graph: &mut Graph, options: &RelaxOptions) -> Result<RelaxReport> {
    relax_with_progress(graph, options, &Progress::none())
}

/// [`relax`] reporting one step per iteration.
pub fn relax_with_progress(
    graph: &mut Graph,
    options: &RelaxOptions,
    progress: &Progress,
) -> Result<RelaxReport> {
    options.validate()?;

    let total = options.max_iterations;
    let mut report = RelaxReport::default();
    let mut target = options.target;

    for iter in 0..total {
        progress.report(iter, total, "Relaxing");
        let before = graph.positions();

        let corner = squarification(graph, target, options)?;
        if options.target.is_none() && corner > 0.0 {
            target = Some(corner);
        }
        let smoothed = laplacian_with(graph, options.laplacian_lambda, options.parallel)?;
        project_to_sphere(graph, options.radius)?;

        let max_move = graph
            .vertices()
            .map(|(v, vert)| (vert.position - before[v.index()]).norm())
            .fold(0.0, f64::max);

        report.iterations = iter + 1;
        report.last_max_displacement = max_move;
        report.corner_distance = corner;
        debug!(
            "relax iteration {}: corner distance {:.6}, smoothing {:.3e}, max move {:.3e}",
            iter, corner, smoothed, max_move
        );

        if options.tolerance.is_some_and(|tol| max_move <= tol) {
            report.converged = true;
            break;
        }
    }
    progress.report(total, total, "Relaxing");

    info!(
        "relaxation finished after {} iterations (converged: {}, max move {:.3e})",
        report.iterations, report.converged, report.last_max_displacement
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::sphere::max_radius_error;
    use crate::algo::quadify::quadification_seeded;
    use crate::algo::subdivide::{subdivide, subdivide_quad};
    use crate::graph::{cube, icosahedron, VertId};
    use nalgebra::{Point3, Vector3};

    /// A quad squashed along y, D2-symmetric about the z axis, on the unit
    /// sphere near the north pole.
    fn squashed_quad() -> Graph {
        let on_sphere = |x: f64, y: f64| {
            let z = (1.0 - x * x - y * y).sqrt();
            Point3::new(x, y, z)
        };
        let corners = [
            on_sphere(-0.6, 0.0),
            on_sphere(0.0, -0.1),
            on_sphere(0.6, 0.0),
            on_sphere(0.0, 0.1),
        ];
        let mut g = Graph::new();
        let ids: Vec<VertId> = corners.iter().map(|p| g.add_vert(*p, p.coords)).collect();
        for i in 0..4 {
            g.add_edge(ids[i], ids[(i + 1) % 4]).unwrap();
        }
        g
    }

    #[test]
    fn test_squashed_quad_regularizes() {
        let mut g = squashed_quad();
        let options = RelaxOptions::default()
            .with_max_iterations(50)
            .with_lambda(0.1)
            .with_radius(1.0);
        let report = relax(&mut g, &options).unwrap();
        assert_eq!(report.iterations, 50);
        assert!(!report.converged);

        let pts = g.positions();
        let c = Point3::from(pts.iter().map(|p| p.coords).sum::<Vector3<f64>>() / 4.0);
        let dists: Vec<f64> = pts.iter().map(|p| (p - c).norm()).collect();
        let max = dists.iter().copied().fold(0.0, f64::max);
        let min = dists.iter().copied().fold(f64::INFINITY, f64::min);
        assert!(min > 0.0);
        assert!((max - min) / max < 1e-3, "spread {}", (max - min) / max);
        assert!(max_radius_error(&g, 1.0) < 1e-12);
    }

    #[test]
    fn test_tolerance_stops_early() {
        let mut g = cube(1.0);
        let options = RelaxOptions::default().with_tolerance(1e-9);
        let report = relax(&mut g, &options).unwrap();
        // The cube is already regular and on the sphere.
        assert!(report.converged);
        assert_eq!(report.iterations, 1);
    }

    #[test]
    fn test_stays_on_sphere_and_valid() {
        let mut g = icosahedron(2.0);
        subdivide(&mut g).unwrap();
        quadification_seeded(&mut g, 11).unwrap();
        subdivide_quad(&mut g).unwrap();
        project_to_sphere(&mut g, 2.0).unwrap();

        let options = RelaxOptions::default().with_max_iterations(10).with_radius(2.0);
        let report = relax(&mut g, &options).unwrap();
        assert_eq!(report.iterations, 10);
        assert!(report.corner_distance > 0.0);
        assert!(max_radius_error(&g, 2.0) < 1e-12);
        g.validate().unwrap();
    }

    #[test]
    fn test_iteration_cap() {
        let mut g = cube(1.0);
        let before = g.positions();
        let options = RelaxOptions::default().with_max_iterations(MAX_ITERATIONS + 1);
        assert!(matches!(
            relax(&mut g, &options),
            Err(GraphError::InvalidParameter { .. })
        ));
        // Rejected before anything moved.
        assert_eq!(g.positions(), before);
    }

    #[test]
    fn test_zero_iterations_is_noop() {
        let mut g = icosahedron(1.0);
        let before = g.positions();
        let report = relax(&mut g, &RelaxOptions::default().with_max_iterations(0)).unwrap();
        assert_eq!(report.iterations, 0);
        assert_eq!(g.positions(), before);
    }
}
