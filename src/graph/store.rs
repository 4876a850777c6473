//! Vertex/edge arena.
//!
//! The [`Graph`] keeps vertices and edges in two dense arrays. Deleting an
//! element only sets its `dead` flag, so every [`VertId`] and [`EdgeId`] handed
//! out stays valid (and keeps pointing at the same slot) for the lifetime of
//! the graph. Iteration always walks the full backing array and skips dead
//! slots; live counts are never used as index bounds.
//!
//! Each vertex also keeps the list of live edges incident to it, which makes
//! neighbor queries O(degree) instead of O(edges).

use nalgebra::{Point3, Vector3};
use log::warn;

use super::index::{undirected, EdgeId, VertId};
use crate::error::{GraphError, Result};

/// A vertex in the graph.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// The vertex normal. Not necessarily unit length between updates; it is
    /// only used to orient the neighbor ring when face loops are traced.
    pub normal: Vector3<f64>,

    /// Live edges incident to this vertex, in insertion order.
    pub(crate) edges: Vec<EdgeId>,

    pub(crate) dead: bool,
}

impl Vertex {
    /// Create a new live vertex with no edges.
    pub fn new(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            position,
            normal,
            edges: Vec::new(),
            dead: false,
        }
    }

    /// Whether the vertex has been tombstoned.
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Live edges incident to this vertex.
    #[inline]
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }
}

/// An edge between two vertices.
///
/// The endpoints are stored in creation order. Geometrically the edge is
/// undirected; face loops traverse it once in each direction.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    /// First endpoint.
    pub a: VertId,
    /// Second endpoint.
    pub b: VertId,
    pub(crate) dead: bool,
}

impl Edge {
    /// Whether the edge has been tombstoned.
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// The endpoint opposite to `v`, or `None` if `v` is not an endpoint.
    #[inline]
    pub fn other(&self, v: VertId) -> Option<VertId> {
        if v == self.a {
            Some(self.b)
        } else if v == self.b {
            Some(self.a)
        } else {
            None
        }
    }
}

/// A polygon mesh stored as a graph of vertices and edges.
///
/// Faces are not stored; they are derived on demand as loops of the edge
/// graph (see the topology queries in [`crate::graph`]).
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub(crate) verts: Vec<Vertex>,
    pub(crate) edges: Vec<Edge>,
    live_verts: usize,
    live_edges: usize,
}

impl Graph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph with pre-allocated capacity.
    pub fn with_capacity(num_verts: usize, num_edges: usize) -> Self {
        Self {
            verts: Vec::with_capacity(num_verts),
            edges: Vec::with_capacity(num_edges),
            live_verts: 0,
            live_edges: 0,
        }
    }

    // ==================== Counts ====================

    /// Number of live vertices.
    ///
    /// This is not an index bound: dead slots may sit anywhere below
    /// [`vertex_slots`](Self::vertex_slots).
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.live_verts
    }

    /// Number of live edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.live_edges
    }

    /// Length of the vertex backing array, dead slots included.
    #[inline]
    pub fn vertex_slots(&self) -> usize {
        self.verts.len()
    }

    /// Length of the edge backing array, dead slots included.
    #[inline]
    pub fn edge_slots(&self) -> usize {
        self.edges.len()
    }

    // ==================== Accessors ====================

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, v: VertId) -> &Vertex {
        &self.verts[v.index()]
    }

    /// Get an edge by ID.
    #[inline]
    pub fn edge(&self, e: EdgeId) -> &Edge {
        &self.edges[e.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertId) -> &Point3<f64> {
        &self.verts[v.index()].position
    }

    /// Get a mutable reference to the position of a vertex.
    #[inline]
    pub fn position_mut(&mut self, v: VertId) -> &mut Point3<f64> {
        &mut self.verts[v.index()].position
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertId, pos: Point3<f64>) {
        self.verts[v.index()].position = pos;
    }

    /// Get the normal of a vertex.
    #[inline]
    pub fn normal(&self, v: VertId) -> &Vector3<f64> {
        &self.verts[v.index()].normal
    }

    /// Get a mutable reference to the normal of a vertex.
    #[inline]
    pub fn normal_mut(&mut self, v: VertId) -> &mut Vector3<f64> {
        &mut self.verts[v.index()].normal
    }

    /// Check whether `v` names a live vertex.
    #[inline]
    pub fn is_vert_alive(&self, v: VertId) -> bool {
        self.verts.get(v.index()).is_some_and(|vert| !vert.dead)
    }

    /// Check whether `e` names a live edge.
    #[inline]
    pub fn is_edge_alive(&self, e: EdgeId) -> bool {
        self.edges.get(e.index()).is_some_and(|edge| !edge.dead)
    }

    /// The two endpoints of an edge, in creation order.
    #[inline]
    pub fn edge_endpoints(&self, e: EdgeId) -> (VertId, VertId) {
        let edge = self.edge(e);
        (edge.a, edge.b)
    }

    /// The endpoints of an edge as a sorted pair.
    #[inline]
    pub fn edge_key(&self, e: EdgeId) -> (VertId, VertId) {
        let (a, b) = self.edge_endpoints(e);
        undirected(a, b)
    }

    /// Number of live edges at a vertex.
    #[inline]
    pub fn degree(&self, v: VertId) -> usize {
        self.vertex(v).edges.len()
    }

    /// All vertices joined to `v` by a live edge.
    ///
    /// The order is insertion order and carries no cyclic meaning; use
    /// [`vertex_ring`](Self::vertex_ring) when angular order matters.
    pub fn vert_neighbors(&self, v: VertId) -> Vec<VertId> {
        self.vertex(v)
            .edges
            .iter()
            .filter_map(|&e| self.edge(e).other(v))
            .collect()
    }

    /// Find the live edge joining `a` and `b`, in either direction.
    pub fn find_edge(&self, a: VertId, b: VertId) -> Option<EdgeId> {
        self.vertex(a)
            .edges
            .iter()
            .copied()
            .find(|&e| self.edge(e).other(a) == Some(b))
    }

    // ==================== Iteration ====================

    /// Iterate over live vertex IDs.
    pub fn vert_ids(&self) -> impl Iterator<Item = VertId> + '_ {
        self.verts
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.dead)
            .map(|(i, _)| VertId::new(i))
    }

    /// Iterate over live vertices with their IDs.
    pub fn vertices(&self) -> impl Iterator<Item = (VertId, &Vertex)> + '_ {
        self.verts
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.dead)
            .map(|(i, v)| (VertId::new(i), v))
    }

    /// Iterate mutably over live vertices with their IDs.
    pub fn vertices_mut(&mut self) -> impl Iterator<Item = (VertId, &mut Vertex)> + '_ {
        self.verts
            .iter_mut()
            .enumerate()
            .filter(|(_, v)| !v.dead)
            .map(|(i, v)| (VertId::new(i), v))
    }

    /// Iterate over live edge IDs.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.dead)
            .map(|(i, _)| EdgeId::new(i))
    }

    /// Iterate over live edges with their IDs.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.dead)
            .map(|(i, e)| (EdgeId::new(i), e))
    }

    // ==================== Mutation ====================

    /// Append a new live vertex and return its ID.
    pub fn add_vert(&mut self, position: Point3<f64>, normal: Vector3<f64>) -> VertId {
        let id = VertId::new(self.verts.len());
        self.verts.push(Vertex::new(position, normal));
        self.live_verts += 1;
        id
    }

    /// Append a new live edge between two live vertices.
    ///
    /// Duplicate edges are not detected here; callers building a graph are
    /// responsible for deduplicating vertex pairs.
    ///
    /// # Errors
    /// [`GraphError::InvalidTopology`] if `a == b` or either endpoint is not a
    /// live vertex.
    pub fn add_edge(&mut self, a: VertId, b: VertId) -> Result<EdgeId> {
        if a == b {
            return Err(GraphError::topology(format!(
                "cannot create a self-loop edge at {:?}",
                a
            )));
        }
        for v in [a, b] {
            if !self.is_vert_alive(v) {
                return Err(GraphError::topology(format!(
                    "edge endpoint {:?} is not a live vertex",
                    v
                )));
            }
        }

        Ok(self.push_edge(a, b))
    }

    /// [`add_edge`](Self::add_edge) for endpoints already known to be two
    /// distinct live vertices.
    pub(super) fn push_edge(&mut self, a: VertId, b: VertId) -> EdgeId {
        debug_assert!(a != b && self.is_vert_alive(a) && self.is_vert_alive(b));
        let id = EdgeId::new(self.edges.len());
        self.edges.push(Edge { a, b, dead: false });
        self.verts[a.index()].edges.push(id);
        self.verts[b.index()].edges.push(id);
        self.live_edges += 1;
        id
    }

    /// Tombstone an edge.
    ///
    /// The endpoints are left alive even if this was their last edge. Deleting
    /// an already dead edge is a no-op.
    pub fn delete_edge(&mut self, e: EdgeId) {
        let edge = &mut self.edges[e.index()];
        if edge.dead {
            return;
        }
        edge.dead = true;
        let (a, b) = (edge.a, edge.b);
        for v in [a, b] {
            let incident = &mut self.verts[v.index()].edges;
            if let Some(pos) = incident.iter().position(|&x| x == e) {
                incident.swap_remove(pos);
            }
        }
        self.live_edges -= 1;
    }

    /// Tombstone a vertex that has no live edges left.
    ///
    /// # Errors
    /// [`GraphError::InvalidTopology`] if the vertex still has live edges.
    pub fn kill_vert(&mut self, v: VertId) -> Result<()> {
        let vert = &mut self.verts[v.index()];
        if vert.dead {
            return Ok(());
        }
        if !vert.edges.is_empty() {
            warn!("refusing to kill {:?} with {} live edges", v, vert.edges.len());
            return Err(GraphError::topology(format!(
                "vertex {:?} still has {} live edges",
                v,
                vert.edges.len()
            )));
        }
        vert.dead = true;
        self.live_verts -= 1;
        Ok(())
    }

    // ==================== Geometry ====================

    /// Snapshot of every vertex position, indexed by slot (dead slots included).
    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.verts.iter().map(|v| v.position).collect()
    }

    /// Centroid of all live vertices.
    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.live_verts == 0 {
            return None;
        }
        let sum: Vector3<f64> = self.vertices().map(|(_, v)| v.position.coords).sum();
        Some(Point3::from(sum / self.live_verts as f64))
    }

    /// Length of an edge.
    pub fn edge_length(&self, e: EdgeId) -> f64 {
        let (a, b) = self.edge_endpoints(e);
        (self.position(b) - self.position(a)).norm()
    }

    /// Average length of all live edges (0 for an edgeless graph).
    pub fn average_edge_length(&self) -> f64 {
        if self.live_edges == 0 {
            return 0.0;
        }
        self.edge_ids().map(|e| self.edge_length(e)).sum::<f64>() / self.live_edges as f64
    }
}
