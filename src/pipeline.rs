//! End-to-end sphere generation.
//!
//! [`run`] chains the operators into the usual recipe for a relaxed
//! quad sphere:
//!
//! 1. start from an icosahedron of the configured radius;
//! 2. apply `subdivisions` triangle subdivision passes, lifting after each;
//! 3. optionally quadify (merge random triangle pairs into quads);
//! 4. apply `quad_subdivisions` quad subdivision passes, lifting after each;
//! 5. optionally relax onto the sphere.
//!
//! # Example
//!
//! ```
//! use quadsphere::pipeline::{run, PipelineConfig};
//!
//! let config = PipelineConfig::default()
//!     .with_subdivisions(1)
//!     .with_seed(7)
//!     .with_max_iterations(5);
//! let output = run(&config).unwrap();
//! assert!(output.graph.all_vert_loops().unwrap().iter().all(|l| l.len() == 4));
//! ```

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::algo::quadify::{quadification, QuadifyReport};
use crate::algo::relax::{relax_with_progress, RelaxOptions, RelaxReport, MAX_ITERATIONS};
use crate::algo::subdivide::{
    subdivide_quad_with_progress, subdivide_with_progress, SubdivideOptions, SubdivideReport,
};
use crate::algo::{LiftMode, Progress};
use crate::error::{GraphError, Result};
use crate::graph::{icosahedron, Graph};

/// Configuration of a full generation run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Triangle subdivision passes on the icosahedron.
    pub subdivisions: usize,
    /// Merge triangle pairs into quads after triangle subdivision.
    pub quadify: bool,
    /// Quad subdivision passes after quadification.
    pub quad_subdivisions: usize,
    /// Lift applied after every subdivision pass.
    pub lift: LiftMode,
    /// Run the relaxation engine at the end.
    pub relax: bool,
    /// Relaxation iterations (at most 1000).
    pub max_iterations: usize,
    /// Laplacian step factor in `[0, 1]`.
    pub laplacian_lambda: f64,
    /// Early-exit displacement tolerance for relaxation.
    pub tolerance: Option<f64>,
    /// Sphere radius.
    pub radius: f64,
    /// Seed for quadification; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            subdivisions: 2,
            quadify: true,
            quad_subdivisions: 1,
            lift: LiftMode::Normalized,
            relax: true,
            max_iterations: 100,
            laplacian_lambda: 1.0,
            tolerance: None,
            radius: 1.0,
            seed: None,
        }
    }
}

impl PipelineConfig {
    /// Set the number of triangle subdivision passes.
    pub fn with_subdivisions(mut self, passes: usize) -> Self {
        self.subdivisions = passes;
        self
    }

    /// Enable or disable quadification.
    pub fn with_quadify(mut self, quadify: bool) -> Self {
        self.quadify = quadify;
        self
    }

    /// Set the number of quad subdivision passes.
    pub fn with_quad_subdivisions(mut self, passes: usize) -> Self {
        self.quad_subdivisions = passes;
        self
    }

    /// Set the lift applied after subdivision passes.
    pub fn with_lift(mut self, lift: LiftMode) -> Self {
        self.lift = lift;
        self
    }

    /// Enable or disable relaxation.
    pub fn with_relax(mut self, relax: bool) -> Self {
        self.relax = relax;
        self
    }

    /// Set the number of relaxation iterations.
    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Set the Laplacian step factor.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.laplacian_lambda = lambda;
        self
    }

    /// Set the relaxation tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Set the sphere radius.
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Fix the quadification seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Relaxation options derived from this configuration.
    pub fn relax_options(&self) -> RelaxOptions {
        RelaxOptions {
            max_iterations: self.max_iterations,
            laplacian_lambda: self.laplacian_lambda,
            radius: self.radius,
            tolerance: self.tolerance,
            ..RelaxOptions::default()
        }
    }

    fn subdivide_options(&self, passes: usize) -> SubdivideOptions {
        SubdivideOptions::new(passes)
            .with_lift(self.lift)
            .with_radius(self.radius)
    }

    /// Check the configuration before any work is done.
    pub fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(GraphError::invalid_param(
                "radius",
                self.radius,
                "must be positive and finite",
            ));
        }
        if self.max_iterations > MAX_ITERATIONS {
            return Err(GraphError::invalid_param(
                "max_iterations",
                self.max_iterations,
                "must not exceed 1000",
            ));
        }
        self.relax_options().validate()
    }
}

/// Per-stage reports of a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Triangle subdivision.
    pub subdivide: SubdivideReport,
    /// Quadification, when enabled.
    pub quadify: Option<QuadifyReport>,
    /// Quad subdivision.
    pub quad_subdivide: SubdivideReport,
    /// Relaxation, when enabled.
    pub relax: Option<RelaxReport>,
    /// Seed used for quadification.
    pub seed: Option<u64>,
}

/// The generated graph together with what each stage did.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// The generated sphere.
    pub graph: Graph,
    /// Stage reports.
    pub report: PipelineReport,
}

/// Generate a sphere according to `config`.
pub fn run(config: &PipelineConfig) -> Result<PipelineOutput> {
    run_with_progress(config, &Progress::none())
}

/// [`run`] reporting progress across all stages.
pub fn run_with_progress(config: &PipelineConfig, progress: &Progress) -> Result<PipelineOutput> {
    config.validate()?;

    const STAGES: usize = 4;
    let mut graph = icosahedron(config.radius);
    let mut report = PipelineReport::default();

    info!("subdividing triangles ({} passes, lift {:?})", config.subdivisions, config.lift);
    report.subdivide = subdivide_with_progress(
        &mut graph,
        &config.subdivide_options(config.subdivisions),
        &progress.stage(0, STAGES),
    )?;

    if config.quadify {
        let seed = config.seed.unwrap_or_else(rand::random);
        info!("quadifying (seed {})", seed);
        progress.report_sub(0, 1, 1, STAGES, "Quadifying");
        let mut rng = StdRng::seed_from_u64(seed);
        report.quadify = Some(quadification(&mut graph, &mut rng)?);
        report.seed = Some(seed);
        progress.report_sub(1, 1, 1, STAGES, "Quadifying");
    }

    info!("subdividing quads ({} passes)", config.quad_subdivisions);
    report.quad_subdivide = subdivide_quad_with_progress(
        &mut graph,
        &config.subdivide_options(config.quad_subdivisions),
        &progress.stage(2, STAGES),
    )?;

    if config.relax {
        info!("relaxing ({} iterations, radius {})", config.max_iterations, config.radius);
        report.relax = Some(relax_with_progress(
            &mut graph,
            &config.relax_options(),
            &progress.stage(3, STAGES),
        )?);
    }
    progress.report(STAGES, STAGES, "Done");

    info!(
        "pipeline finished: {} vertices, {} edges",
        graph.vertex_count(),
        graph.edge_count()
    );
    Ok(PipelineOutput { graph, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::sphere::max_radius_error;
    use crate::graph::length_histogram;

    #[test]
    fn test_triangle_sphere_only() {
        let config = PipelineConfig::default()
            .with_subdivisions(2)
            .with_quadify(false)
            .with_quad_subdivisions(0)
            .with_relax(false)
            .with_radius(3.0);
        let out = run(&config).unwrap();

        assert_eq!(out.graph.vertex_count(), 162);
        assert_eq!(out.report.subdivide.faces, 320);
        assert!(out.report.quadify.is_none());
        assert!(max_radius_error(&out.graph, 3.0) < 1e-12);
    }

    #[test]
    fn test_quad_sphere_is_reproducible() {
        let config = PipelineConfig::default()
            .with_subdivisions(1)
            .with_seed(5)
            .with_max_iterations(10);
        let a = run(&config).unwrap();
        let b = run(&config).unwrap();

        let loops = a.graph.all_vert_loops().unwrap();
        assert_eq!(length_histogram(&loops).len(), 1);
        assert_eq!(loops[0].len(), 4);
        assert_eq!(a.graph.positions(), b.graph.positions());
        assert_eq!(a.report.seed, Some(5));
        assert_eq!(a.report.relax.map(|r| r.iterations), Some(10));
        assert!(max_radius_error(&a.graph, 1.0) < 1e-12);
        a.graph.validate().unwrap();
    }

    #[test]
    fn test_unnormalized_lift_runs() {
        let config = PipelineConfig::default()
            .with_subdivisions(1)
            .with_lift(LiftMode::Unnormalized)
            .with_relax(false)
            .with_seed(1);
        let out = run(&config).unwrap();
        out.graph.validate().unwrap();
    }

    #[test]
    fn test_unnormalized_lift_at_large_radius() {
        for radius in [2.0, 5.0] {
            let config = PipelineConfig::default()
                .with_subdivisions(3)
                .with_lift(LiftMode::Unnormalized)
                .with_relax(false)
                .with_radius(radius)
                .with_seed(1);
            let out = run(&config).unwrap();
            out.graph.validate().unwrap();
            for (_, v) in out.graph.vertices() {
                assert!(v.position.coords.norm() <= radius + 1e-9);
            }
        }
    }

    #[test]
    fn test_every_stage_completes() {
        use std::sync::{Arc, Mutex};

        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let progress = Progress::new(move |c, t, _| sink.lock().unwrap().push((c, t)));

        let config = PipelineConfig::default()
            .with_subdivisions(1)
            .with_seed(2)
            .with_max_iterations(2);
        run_with_progress(&config, &progress).unwrap();

        let calls = calls.lock().unwrap();
        for stage in 1..=4 {
            assert!(calls.contains(&(stage * 1000, 4000)), "stage {stage} never finished");
        }
    }

    #[test]
    fn test_invalid_config() {
        assert!(run(&PipelineConfig::default().with_radius(0.0)).is_err());
        assert!(run(&PipelineConfig::default().with_max_iterations(1001)).is_err());
        assert!(run(&PipelineConfig::default().with_lambda(2.0)).is_err());
    }
}
