//! Face subdivision operators.
//!
//! Both operators split every face loop of a closed graph in one pass and
//! share edge midpoints between the two faces on either side of an edge.
//!
//! # Triangle subdivision
//!
//! [`subdivide`] accepts triangle-only graphs. Each triangle is split into
//! four by joining its three edge midpoints. Applied to an icosahedron and
//! followed by a spherical lift, repeated passes produce a geodesic sphere.
//!
//! # Quad subdivision
//!
//! [`subdivide_quad`] accepts loops of length 3 or 4. Each face gets a center
//! vertex and is split into `n` quads (corner, midpoint, center, midpoint).
//! A pure quad mesh goes through the usual 1→4 split; a mixed mesh left by
//! quadification comes out as quads only.
//!
//! # Atomicity
//!
//! Every pass first plans all midpoints, center vertices and edges against
//! an unchanged graph. Only when every face has been accepted is the plan
//! committed, so a rejected input leaves the graph untouched. Options are
//! checked before the first pass; a multi-pass call that fails in a later
//! pass keeps the passes already committed.
//!
//! # Example
//!
//! ```
//! use quadsphere::algo::subdivide::{subdivide_with, SubdivideOptions};
//! use quadsphere::algo::LiftMode;
//! use quadsphere::graph::icosahedron;
//!
//! let mut graph = icosahedron(1.0);
//! let options = SubdivideOptions::new(2).with_lift(LiftMode::Normalized);
//! subdivide_with(&mut graph, &options).unwrap();
//!
//! assert_eq!(graph.vertex_count(), 162);
//! assert_eq!(graph.all_vert_loops().unwrap().len(), 320);
//! ```

mod quad;
mod triangle;

pub use quad::{subdivide_quad, subdivide_quad_with, subdivide_quad_with_progress};
pub use triangle::{subdivide, subdivide_with, subdivide_with_progress};

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use nalgebra::{Point3, Vector3};

use super::sphere::{check_radius, lift, LiftMode};
use super::Progress;
use crate::error::{GraphError, Result};
use crate::graph::{undirected, EdgeId, FaceLoop, Graph, VertId};

/// Options for repeated subdivision.
#[derive(Debug, Clone)]
pub struct SubdivideOptions {
    /// Number of subdivision passes.
    pub iterations: usize,

    /// Lift applied to every vertex after each pass.
    pub lift: LiftMode,

    /// Target sphere radius used by the lift.
    pub radius: f64,
}

impl Default for SubdivideOptions {
    fn default() -> Self {
        Self::new(1)
    }
}

impl SubdivideOptions {
    /// Create options with the specified number of passes and no lift.
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            lift: LiftMode::None,
            radius: 1.0,
        }
    }

    /// Set the lift applied after each pass.
    pub fn with_lift(mut self, lift: LiftMode) -> Self {
        self.lift = lift;
        self
    }

    /// Set the radius of the lift target sphere.
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }
}

/// What one or more subdivision passes did to the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubdivideReport {
    /// Number of passes applied.
    pub passes: usize,
    /// Vertices created (midpoints and face centers).
    pub vertices_added: usize,
    /// Original edges retired.
    pub edges_retired: usize,
    /// Edges created (halves and interior edges).
    pub edges_added: usize,
    /// Face loops after the last pass.
    pub faces: usize,
}

impl SubdivideReport {
    fn absorb(&mut self, pass: SubdivideReport) {
        self.passes += pass.passes;
        self.vertices_added += pass.vertices_added;
        self.edges_retired += pass.edges_retired;
        self.edges_added += pass.edges_added;
        self.faces = pass.faces;
    }
}

/// Reject the pass unless every loop length is accepted.
fn check_loops(
    loops: &[FaceLoop],
    accept: impl Fn(usize) -> bool,
    expected: &'static str,
) -> Result<()> {
    if let Some(bad) = loops.iter().find(|l| !accept(l.len())) {
        warn!("subdivision rejected face loop {:?} of length {}", bad.to_ints(), bad.len());
        return Err(GraphError::UnbalancedInput {
            expected,
            found: bad.len(),
        });
    }
    Ok(())
}

fn average_normal(normals: impl IntoIterator<Item = Vector3<f64>>, fallback: Vector3<f64>) -> Vector3<f64> {
    let sum: Vector3<f64> = normals.into_iter().sum();
    sum.try_normalize(1e-12)
        .or_else(|| fallback.try_normalize(1e-12))
        .unwrap_or_else(Vector3::z)
}

/// Pending changes of one subdivision pass.
///
/// New vertex IDs are predicted from the current slot count; the arena only
/// ever appends, so the prediction holds when the plan is committed.
struct SplitPlan {
    base: usize,
    new_verts: Vec<(Point3<f64>, Vector3<f64>)>,
    midpoints: HashMap<(VertId, VertId), VertId>,
    retired: Vec<EdgeId>,
    new_edges: Vec<(VertId, VertId)>,
    planned: HashSet<(VertId, VertId)>,
}

impl SplitPlan {
    fn new(graph: &Graph) -> Self {
        Self {
            base: graph.vertex_slots(),
            new_verts: Vec::new(),
            midpoints: HashMap::with_capacity(graph.edge_count()),
            retired: Vec::with_capacity(graph.edge_count()),
            new_edges: Vec::new(),
            planned: HashSet::new(),
        }
    }

    fn vert(&mut self, position: Point3<f64>, normal: Vector3<f64>) -> VertId {
        let id = VertId::new(self.base + self.new_verts.len());
        self.new_verts.push((position, normal));
        id
    }

    fn edge(&mut self, a: VertId, b: VertId) {
        if self.planned.insert(undirected(a, b)) {
            self.new_edges.push((a, b));
        }
    }

    /// Midpoint of the edge `a`–`b`, shared by both faces on the edge.
    ///
    /// The first request plans the midpoint vertex, retires the original edge
    /// and plans its two halves.
    fn midpoint(&mut self, graph: &Graph, a: VertId, b: VertId) -> Result<VertId> {
        let key = undirected(a, b);
        if let Some(&m) = self.midpoints.get(&key) {
            return Ok(m);
        }

        let e = graph.find_edge(a, b).ok_or_else(|| {
            GraphError::topology(format!("face loop walks missing edge {a:?}-{b:?}"))
        })?;
        let pa = graph.position(a);
        let pb = graph.position(b);
        let position = nalgebra::center(pa, pb);
        let normal = average_normal([*graph.normal(a), *graph.normal(b)], position.coords);

        let m = self.vert(position, normal);
        self.midpoints.insert(key, m);
        self.retired.push(e);
        self.edge(a, m);
        self.edge(m, b);
        Ok(m)
    }

    fn commit(self, graph: &mut Graph, faces: usize) -> Result<SubdivideReport> {
        let report = SubdivideReport {
            passes: 1,
            vertices_added: self.new_verts.len(),
            edges_retired: self.retired.len(),
            edges_added: self.new_edges.len(),
            faces,
        };

        for (position, normal) in self.new_verts {
            let v = graph.add_vert(position, normal);
            debug_assert!(v.index() >= self.base);
        }
        for e in self.retired {
            graph.delete_edge(e);
        }
        for (a, b) in self.new_edges {
            graph.add_edge(a, b)?;
        }

        debug!(
            "subdivision pass: +{} vertices, -{} edges, +{} edges, {} faces",
            report.vertices_added, report.edges_retired, report.edges_added, faces
        );
        Ok(report)
    }
}

/// Run `pass` `options.iterations` times, lifting after each pass.
fn repeat<F>(
    graph: &mut Graph,
    options: &SubdivideOptions,
    progress: &Progress,
    message: &str,
    pass: F,
) -> Result<SubdivideReport>
where
    F: Fn(&mut Graph) -> Result<SubdivideReport>,
{
    if options.lift != LiftMode::None {
        check_radius(options.radius)?;
    }

    let mut report = SubdivideReport::default();
    for iter in 0..options.iterations {
        progress.report(iter, options.iterations, message);
        report.absorb(pass(graph)?);
        lift(graph, options.lift, options.radius)?;
    }
    progress.report(options.iterations, options.iterations, message);
    Ok(report)
}
