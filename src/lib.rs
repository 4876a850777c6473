//! # quadsphere
//!
//! Polygon meshes as vertex/edge graphs, with the operators needed to turn an
//! icosahedron into a relaxed, evenly spaced quad sphere.
//!
//! Faces are never stored. They are recovered on demand as face loops by
//! walking the edges around each vertex in angular order, so operators only
//! ever add vertices, add edges and delete edges.
//!
//! ## Features
//!
//! - **Graph store**: tombstoned vertex/edge arena with stable IDs
//! - **Topology**: face loop tracing, edge-to-loop adjacency, validation
//! - **Subdivision**: triangle 1→4 and quad-producing center split
//! - **Quadification**: random greedy triangle-pair merging
//! - **Relaxation**: squarification, Laplacian smoothing, sphere projection
//! - **File formats**: OBJ and PLY
//!
//! ## Quick Start
//!
//! ```
//! use quadsphere::prelude::*;
//!
//! let mut graph = icosahedron(1.0);
//! subdivide(&mut graph).unwrap();
//! project_to_sphere(&mut graph, 1.0).unwrap();
//! quadification_seeded(&mut graph, 42).unwrap();
//! subdivide_quad(&mut graph).unwrap();
//!
//! let report = relax(&mut graph, &RelaxOptions::default().with_max_iterations(10)).unwrap();
//! assert_eq!(report.iterations, 10);
//!
//! let loops = graph.all_vert_loops().unwrap();
//! assert!(loops.iter().all(|l| l.len() == 4));
//! ```
//!
//! ## Building Graphs Programmatically
//!
//! ```
//! use quadsphere::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//! let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//!
//! let graph = from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(graph.vertex_count(), 4);
//! assert_eq!(graph.edge_count(), 6);
//! assert_eq!(graph.all_vert_loops().unwrap().len(), 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod graph;
pub mod io;
pub mod pipeline;

/// Prelude module for convenient imports.
///
/// ```
/// use quadsphere::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::{
        laplacian, lift, project_to_sphere, quadification, quadification_seeded, relax,
        squarification, subdivide, subdivide_quad, LiftMode, Progress, RelaxOptions,
        SubdivideOptions,
    };
    pub use crate::error::{GraphError, Result};
    pub use crate::graph::{
        from_polygons, from_quads, from_triangles, icosahedron, to_face_lists, EdgeId, FaceLoop,
        Graph, LoopAdjacency, VertId,
    };
}

pub use nalgebra;
