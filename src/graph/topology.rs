//! Face loop derivation.
//!
//! Faces are never stored. A face loop is recovered by walking the edge graph:
//! arriving at vertex `v` from `u`, the walk continues to the neighbor of `v`
//! that immediately precedes `u` in the counter-clockwise order of `v`'s
//! neighbors around `v`'s normal. That is the sharpest left turn, so the face
//! always lies to the left of the walk and loops come out counter-clockwise
//! when seen from the side the normals point to.
//!
//! Every live edge is traversed once in each direction, by the two loops it
//! separates. A loop that traverses an edge in both directions, or revisits a
//! vertex, means the graph is not a closed 2-manifold.

use std::collections::{HashMap, HashSet};

use nalgebra::{Point3, Unit, Vector3};
use log::warn;

use super::index::{undirected, EdgeId, VertId};
use super::store::Graph;
use crate::error::{GraphError, Result};

const EPSILON: f64 = 1e-12;

/// An ordered cycle of vertices bounding one face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceLoop {
    verts: Vec<VertId>,
}

impl FaceLoop {
    /// Wrap a vertex cycle.
    pub fn new(verts: Vec<VertId>) -> Self {
        Self { verts }
    }

    /// Number of vertices (and edges) in the loop.
    #[inline]
    pub fn len(&self) -> usize {
        self.verts.len()
    }

    /// Whether the loop has no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.verts.is_empty()
    }

    /// The vertices in walk order.
    #[inline]
    pub fn vertices(&self) -> &[VertId] {
        &self.verts
    }

    /// Directed edges `(v[i], v[i + 1])`, wrapping around.
    pub fn directed_edges(&self) -> impl Iterator<Item = (VertId, VertId)> + '_ {
        let n = self.verts.len();
        (0..n).map(move |i| (self.verts[i], self.verts[(i + 1) % n]))
    }

    /// Whether the loop walks from `a` straight to `b`.
    pub fn contains_directed(&self, a: VertId, b: VertId) -> bool {
        self.directed_edges().any(|d| d == (a, b))
    }

    /// Raw vertex indices in walk order.
    pub fn to_ints(&self) -> Vec<usize> {
        self.verts.iter().map(|v| v.index()).collect()
    }

    /// Rotation- and reflection-normalized form of the loop.
    ///
    /// Two loops describe the same cycle of vertices iff their canonical forms
    /// are equal, regardless of starting vertex or walk direction.
    pub fn canonical(&self) -> Vec<usize> {
        let ints = self.to_ints();
        let n = ints.len();
        if n == 0 {
            return ints;
        }
        let start = (0..n).min_by_key(|&i| ints[i]).unwrap_or(0);
        let forward: Vec<usize> = (0..n).map(|k| ints[(start + k) % n]).collect();
        let backward: Vec<usize> = (0..n).map(|k| ints[(start + n - k) % n]).collect();
        forward.min(backward)
    }

    /// Average position of the loop's vertices.
    pub fn centroid(&self, graph: &Graph) -> Point3<f64> {
        let sum: Vector3<f64> = self.verts.iter().map(|&v| graph.position(v).coords).sum();
        Point3::from(sum / self.verts.len().max(1) as f64)
    }

    /// Edge IDs of the loop, in walk order.
    ///
    /// # Errors
    /// [`GraphError::InvalidTopology`] if two consecutive vertices are not
    /// joined by a live edge.
    pub fn edge_ids(&self, graph: &Graph) -> Result<Vec<EdgeId>> {
        self.directed_edges()
            .map(|(a, b)| {
                graph.find_edge(a, b).ok_or_else(|| {
                    GraphError::topology(format!("loop step {:?} -> {:?} has no live edge", a, b))
                })
            })
            .collect()
    }
}

/// Lazily sorted neighbor rings, shared across the steps of a walk.
struct Rings<'a> {
    graph: &'a Graph,
    cache: HashMap<VertId, Vec<VertId>>,
}

impl<'a> Rings<'a> {
    fn new(graph: &'a Graph) -> Self {
        Self {
            graph,
            cache: HashMap::new(),
        }
    }

    /// Next vertex of the face to the left of the directed edge `from -> at`.
    fn successor(&mut self, from: VertId, at: VertId) -> Result<VertId> {
        if !self.cache.contains_key(&at) {
            let ring = self.graph.vertex_ring(at)?;
            self.cache.insert(at, ring);
        }
        let ring = &self.cache[&at];
        let idx = ring.iter().position(|&v| v == from).ok_or_else(|| {
            GraphError::topology(format!("{:?} is not a neighbor of {:?}", from, at))
        })?;
        Ok(ring[(idx + ring.len() - 1) % ring.len()])
    }

    fn trace(&mut self, a: VertId, b: VertId) -> Result<FaceLoop> {
        let limit = 2 * self.graph.edge_count() + 1;
        let mut verts = Vec::new();
        let (mut u, mut v) = (a, b);
        loop {
            verts.push(u);
            let w = self.successor(u, v)?;
            u = v;
            v = w;
            if (u, v) == (a, b) {
                break;
            }
            if verts.len() > limit {
                warn!("face walk {:?} -> {:?} did not close", a, b);
                return Err(GraphError::topology(format!(
                    "face walk from {:?} -> {:?} did not close after {} steps",
                    a, b, limit
                )));
            }
        }

        let face = FaceLoop::new(verts);
        check_loop(&face)?;
        Ok(face)
    }
}

/// Reject loops no operator can work with.
fn check_loop(face: &FaceLoop) -> Result<()> {
    if face.len() < 3 {
        warn!("degenerate face loop {:?}", face.to_ints());
        return Err(GraphError::DegenerateLoop {
            len: face.len(),
            vertices: face.to_ints(),
        });
    }

    let mut seen = HashSet::with_capacity(face.len());
    for &v in face.vertices() {
        if !seen.insert(v) {
            warn!("face loop {:?} revisits {:?}", face.to_ints(), v);
            return Err(GraphError::topology(format!(
                "face loop {:?} passes through {:?} twice",
                face.to_ints(),
                v
            )));
        }
    }
    Ok(())
}

impl Graph {
    /// Direction used to order the neighbors of `v`.
    ///
    /// Falls back from the stored normal to the radial direction, and from
    /// there to the plane spanned by the first two neighbors.
    fn ring_normal(&self, v: VertId, neighbors: &[VertId]) -> Option<Unit<Vector3<f64>>> {
        let p = self.position(v);
        let candidates = [
            *self.normal(v),
            p.coords,
            match neighbors {
                [n0, n1, ..] => (self.position(*n0) - p).cross(&(self.position(*n1) - p)),
                _ => Vector3::zeros(),
            },
        ];
        candidates
            .into_iter()
            .find_map(|n| Unit::try_new(n, EPSILON))
    }

    /// Neighbors of `v` sorted counter-clockwise around its normal.
    ///
    /// # Errors
    /// [`GraphError::InvalidTopology`] if no usable normal exists or all
    /// neighbors coincide with `v` in the tangent plane.
    pub fn vertex_ring(&self, v: VertId) -> Result<Vec<VertId>> {
        let neighbors = self.vert_neighbors(v);
        if neighbors.len() <= 2 {
            return Ok(neighbors);
        }

        let normal = self
            .ring_normal(v, &neighbors)
            .ok_or_else(|| GraphError::topology(format!("vertex {:?} has no usable normal", v)))?
            .into_inner();
        let p = *self.position(v);
        let tangent = |w: VertId| {
            let d = self.position(w) - p;
            d - normal * d.dot(&normal)
        };

        let x_axis = neighbors
            .iter()
            .find_map(|&w| Unit::try_new(tangent(w), EPSILON))
            .ok_or_else(|| {
                GraphError::topology(format!("neighbors of {:?} collapse onto its normal", v))
            })?
            .into_inner();
        let y_axis = normal.cross(&x_axis);

        let mut keyed: Vec<(f64, VertId)> = neighbors
            .into_iter()
            .map(|w| {
                let d = tangent(w);
                (d.dot(&y_axis).atan2(d.dot(&x_axis)), w)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(keyed.into_iter().map(|(_, w)| w).collect())
    }

    /// Trace the face loop lying to the left of the directed edge `a -> b`.
    ///
    /// The returned loop starts with `a, b`.
    pub fn trace_loop(&self, a: VertId, b: VertId) -> Result<FaceLoop> {
        Rings::new(self).trace(a, b)
    }

    /// Enumerate every face loop exactly once.
    ///
    /// # Errors
    /// [`GraphError::DegenerateLoop`] for loops shorter than three vertices,
    /// [`GraphError::InvalidTopology`] for walks that do not close or that
    /// cross the same edge twice.
    pub fn all_vert_loops(&self) -> Result<Vec<FaceLoop>> {
        let mut rings = Rings::new(self);
        let mut seen: HashSet<(VertId, VertId)> = HashSet::with_capacity(2 * self.edge_count());
        let mut loops = Vec::new();

        for (_, edge) in self.edges() {
            for (u, v) in [(edge.a, edge.b), (edge.b, edge.a)] {
                if seen.contains(&(u, v)) {
                    continue;
                }
                let face = rings.trace(u, v)?;
                for d in face.directed_edges() {
                    if !seen.insert(d) {
                        return Err(GraphError::topology(format!(
                            "directed edge {:?} -> {:?} belongs to two loops",
                            d.0, d.1
                        )));
                    }
                }
                loops.push(face);
            }
        }

        Ok(loops)
    }

    /// [`all_vert_loops`](Self::all_vert_loops) as raw vertex indices.
    pub fn all_vert_loops_as_ints(&self) -> Result<Vec<Vec<usize>>> {
        Ok(self.all_vert_loops()?.iter().map(FaceLoop::to_ints).collect())
    }

    /// The two face loops bordering edge `e`.
    ///
    /// The first loop lies left of `a -> b`, the second left of `b -> a`.
    ///
    /// # Errors
    /// [`GraphError::InvalidTopology`] if the edge is dead or both walks
    /// produce the same loop.
    pub fn loops_adjacent_to_edge(&self, e: EdgeId) -> Result<[FaceLoop; 2]> {
        if !self.is_edge_alive(e) {
            return Err(GraphError::topology(format!("{:?} is not a live edge", e)));
        }
        let (a, b) = self.edge_endpoints(e);
        let mut rings = Rings::new(self);
        let left = rings.trace(a, b)?;
        if left.contains_directed(b, a) {
            warn!("{:?} borders a single loop", e);
            return Err(GraphError::topology(format!(
                "{:?} borders the same loop on both sides",
                e
            )));
        }
        let right = rings.trace(b, a)?;
        Ok([left, right])
    }

    /// Check every structural invariant of a closed polygon mesh.
    ///
    /// - no duplicate live edges and no edges with dead endpoints;
    /// - every live edge borders two distinct loops of length >= 3;
    /// - every vertex with edges has degree >= 3.
    pub fn validate(&self) -> Result<()> {
        let mut keys = HashSet::with_capacity(self.edge_count());
        for (e, edge) in self.edges() {
            if !self.is_vert_alive(edge.a) || !self.is_vert_alive(edge.b) {
                return Err(GraphError::topology(format!("{:?} has a dead endpoint", e)));
            }
            if !keys.insert(undirected(edge.a, edge.b)) {
                return Err(GraphError::topology(format!(
                    "{:?} duplicates the edge {:?} -- {:?}",
                    e, edge.a, edge.b
                )));
            }
        }

        for (v, vert) in self.vertices() {
            let degree = vert.edges().len();
            if degree > 0 && degree < 3 {
                return Err(GraphError::topology(format!(
                    "vertex {:?} has degree {}",
                    v, degree
                )));
            }
        }

        LoopAdjacency::build(self)?.validate(self)
    }

    /// Whether [`validate`](Self::validate) succeeds.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Snapshot of all face loops with an O(1) edge-to-loop lookup.
///
/// Built once per batch operator; it becomes stale as soon as the graph is
/// mutated.
#[derive(Debug, Clone)]
pub struct LoopAdjacency {
    loops: Vec<FaceLoop>,
    by_directed: HashMap<(VertId, VertId), usize>,
}

impl LoopAdjacency {
    /// Derive every loop of `graph` and index its directed edges.
    pub fn build(graph: &Graph) -> Result<Self> {
        let loops = graph.all_vert_loops()?;
        let mut by_directed = HashMap::with_capacity(2 * graph.edge_count());
        for (i, face) in loops.iter().enumerate() {
            for d in face.directed_edges() {
                by_directed.insert(d, i);
            }
        }
        Ok(Self { loops, by_directed })
    }

    /// All loops, in discovery order.
    pub fn loops(&self) -> &[FaceLoop] {
        &self.loops
    }

    /// Index of the loop to the left of `a -> b`.
    pub fn loop_left_of(&self, a: VertId, b: VertId) -> Option<usize> {
        self.by_directed.get(&(a, b)).copied()
    }

    /// Indices of the two loops bordering `e`.
    pub fn adjacent_indices(&self, graph: &Graph, e: EdgeId) -> Result<[usize; 2]> {
        let (a, b) = graph.edge_endpoints(e);
        let left = self.loop_left_of(a, b);
        let right = self.loop_left_of(b, a);
        match (left, right) {
            (Some(l), Some(r)) if l != r => Ok([l, r]),
            (Some(_), Some(_)) => Err(GraphError::topology(format!(
                "{:?} borders the same loop on both sides",
                e
            ))),
            _ => {
                warn!("{:?} is missing an adjacent loop", e);
                Err(GraphError::topology(format!(
                    "{:?} has fewer than two adjacent loops",
                    e
                )))
            }
        }
    }

    /// The two loops bordering `e`.
    pub fn adjacent(&self, graph: &Graph, e: EdgeId) -> Result<[&FaceLoop; 2]> {
        let [l, r] = self.adjacent_indices(graph, e)?;
        Ok([&self.loops[l], &self.loops[r]])
    }

    /// Check that every live edge of `graph` resolves to two distinct loops.
    pub fn validate(&self, graph: &Graph) -> Result<()> {
        for e in graph.edge_ids() {
            self.adjacent_indices(graph, e)?;
        }
        Ok(())
    }

    /// Histogram of loop lengths: `(length, count)` pairs sorted by length.
    pub fn length_histogram(&self) -> Vec<(usize, usize)> {
        length_histogram(&self.loops)
    }
}

/// Histogram of loop lengths: `(length, count)` pairs sorted by length.
pub fn length_histogram(loops: &[FaceLoop]) -> Vec<(usize, usize)> {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for face in loops {
        *counts.entry(face.len()).or_insert(0) += 1;
    }
    let mut hist: Vec<(usize, usize)> = counts.into_iter().collect();
    hist.sort_unstable();
    hist
}
