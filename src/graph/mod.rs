//! Core graph data structures.
//!
//! A polygon mesh is stored as a [`Graph`] of vertices and edges. Faces are
//! not stored; they are derived as [`FaceLoop`]s by walking the edges around
//! each vertex in angular order.
//!
//! # Index Types
//!
//! Elements are identified by type-safe index wrappers:
//! - [`VertId`] - Identifies a vertex
//! - [`EdgeId`] - Identifies an edge
//!
//! Indices are stable: deleting an element tombstones its slot and never
//! shifts other elements.
//!
//! # Construction
//!
//! ```
//! use quadsphere::graph::icosahedron;
//!
//! let graph = icosahedron(1.0);
//! assert_eq!(graph.vertex_count(), 12);
//! assert_eq!(graph.all_vert_loops().unwrap().len(), 20);
//! ```

mod builder;
mod index;
mod store;
mod topology;

pub use builder::{
    cube, from_polygons, from_quads, from_triangles, icosahedron, newell_normal, tetrahedron,
    to_face_lists, to_triangles,
};
pub use index::{undirected, EdgeId, VertId};
pub use store::{Edge, Graph, Vertex};
pub use topology::{length_histogram, FaceLoop, LoopAdjacency};
