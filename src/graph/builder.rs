//! Graph construction and export.
//!
//! This module converts face-vertex lists (as found in mesh files) into a
//! [`Graph`] and back. Construction deduplicates edges and assigns each vertex
//! an area-weighted normal, which is what the face loop walk uses to orient
//! neighbor rings.

use std::collections::HashSet;

use nalgebra::{Point3, Vector3};
use log::debug;

use super::index::{undirected, VertId};
use super::store::Graph;
use crate::error::{GraphError, Result};

/// Build a graph from vertices and triangle faces.
///
/// # Example
/// ```
/// use quadsphere::graph::from_triangles;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(0.0, 0.0, 1.0),
/// ];
/// let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
///
/// let graph = from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(graph.vertex_count(), 4);
/// assert_eq!(graph.edge_count(), 6);
/// ```
pub fn from_triangles(vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> Result<Graph> {
    let polygons: Vec<&[usize]> = faces.iter().map(|f| f.as_slice()).collect();
    from_polygons(vertices, &polygons)
}

/// Build a graph from vertices and quad faces.
pub fn from_quads(vertices: &[Point3<f64>], faces: &[[usize; 4]]) -> Result<Graph> {
    let polygons: Vec<&[usize]> = faces.iter().map(|f| f.as_slice()).collect();
    from_polygons(vertices, &polygons)
}

/// Build a graph from vertices and arbitrary polygon faces.
///
/// One graph vertex is created per input vertex (unreferenced vertices stay
/// isolated) and one graph edge per distinct unordered vertex pair.
///
/// # Errors
/// - [`GraphError::EmptyMesh`] if there are no faces
/// - [`GraphError::InvalidVertexIndex`] for out-of-range indices
/// - [`GraphError::DegenerateFace`] for faces with fewer than three or
///   repeated vertices
pub fn from_polygons<F: AsRef<[usize]>>(vertices: &[Point3<f64>], faces: &[F]) -> Result<Graph> {
    if faces.is_empty() {
        return Err(GraphError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        let face = face.as_ref();
        for &vi in face {
            if vi >= vertices.len() {
                return Err(GraphError::InvalidVertexIndex {
                    face: fi,
                    vertex: vi,
                });
            }
        }
        let mut sorted = face.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if face.len() < 3 || sorted.len() != face.len() {
            return Err(GraphError::DegenerateFace { face: fi });
        }
    }

    // Area-weighted vertex normals from Newell face normals.
    let mut normals = vec![Vector3::zeros(); vertices.len()];
    for face in faces {
        let face = face.as_ref();
        let n = newell_normal(face.iter().map(|&i| vertices[i]));
        for &vi in face {
            normals[vi] += n;
        }
    }

    let mut edge_capacity = 0;
    for face in faces {
        edge_capacity += face.as_ref().len();
    }
    let mut graph = Graph::with_capacity(vertices.len(), edge_capacity / 2 + 1);

    let ids: Vec<VertId> = vertices
        .iter()
        .zip(&normals)
        .map(|(&p, n)| {
            let normal = n.try_normalize(1e-12).unwrap_or_else(|| p.coords);
            graph.add_vert(p, normal)
        })
        .collect();

    let mut edges: HashSet<(VertId, VertId)> = HashSet::with_capacity(edge_capacity / 2 + 1);
    for face in faces {
        let face = face.as_ref();
        let n = face.len();
        for i in 0..n {
            let a = ids[face[i]];
            let b = ids[face[(i + 1) % n]];
            if edges.insert(undirected(a, b)) {
                graph.add_edge(a, b)?;
            }
        }
    }

    debug!(
        "built graph from {} polygons: {} vertices, {} edges",
        faces.len(),
        graph.vertex_count(),
        graph.edge_count()
    );

    Ok(graph)
}

/// Newell normal of a polygon; its length is twice the polygon's area.
pub fn newell_normal<I: IntoIterator<Item = Point3<f64>>>(points: I) -> Vector3<f64> {
    let pts: Vec<Point3<f64>> = points.into_iter().collect();
    let n = pts.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let p = &pts[i];
        let q = &pts[(i + 1) % n];
        normal.x += (p.y - q.y) * (p.z + q.z);
        normal.y += (p.z - q.z) * (p.x + q.x);
        normal.z += (p.x - q.x) * (p.y + q.y);
    }
    normal
}

/// A regular icosahedron inscribed in a sphere of the given radius.
///
/// 12 vertices, 30 edges, 20 triangular faces.
pub fn icosahedron(radius: f64) -> Graph {
    let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let raw = [
        [-1.0, phi, 0.0],
        [1.0, phi, 0.0],
        [-1.0, -phi, 0.0],
        [1.0, -phi, 0.0],
        [0.0, -1.0, phi],
        [0.0, 1.0, phi],
        [0.0, -1.0, -phi],
        [0.0, 1.0, -phi],
        [phi, 0.0, -1.0],
        [phi, 0.0, 1.0],
        [-phi, 0.0, -1.0],
        [-phi, 0.0, 1.0],
    ];
    let faces = [
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];
    platonic(&raw, &faces, radius)
}

/// A regular tetrahedron inscribed in a sphere of the given radius.
pub fn tetrahedron(radius: f64) -> Graph {
    let raw = [
        [1.0, 1.0, 1.0],
        [1.0, -1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
    ];
    let faces = [[0, 2, 3], [0, 3, 1], [0, 1, 2], [1, 3, 2]];
    platonic(&raw, &faces, radius)
}

/// A cube inscribed in a sphere of the given radius.
///
/// 8 vertices, 12 edges, 6 quad faces.
pub fn cube(radius: f64) -> Graph {
    let raw = [
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, 1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
    ];
    let faces = [
        [0, 3, 2, 1],
        [4, 5, 6, 7],
        [0, 1, 5, 4],
        [2, 3, 7, 6],
        [0, 4, 7, 3],
        [1, 2, 6, 5],
    ];
    platonic(&raw, &faces, radius)
}

fn platonic<const N: usize>(raw: &[[f64; 3]], faces: &[[usize; N]], radius: f64) -> Graph {
    let mut graph = Graph::with_capacity(raw.len(), faces.len() * N / 2);
    let ids: Vec<VertId> = raw
        .iter()
        .map(|c| {
            let dir = Vector3::new(c[0], c[1], c[2]).normalize();
            graph.add_vert(Point3::from(dir * radius), dir)
        })
        .collect();

    let mut seen: HashSet<(VertId, VertId)> = HashSet::new();
    for face in faces {
        for i in 0..N {
            let a = ids[face[i]];
            let b = ids[face[(i + 1) % N]];
            if seen.insert(undirected(a, b)) {
                graph.push_edge(a, b);
            }
        }
    }
    graph
}

/// Export the graph as a compact face-vertex list.
///
/// Live vertices are renumbered densely in slot order and each face loop
/// becomes one polygon, ready for a mesh file or a renderer.
pub fn to_face_lists(graph: &Graph) -> Result<(Vec<Point3<f64>>, Vec<Vec<usize>>)> {
    let loops = graph.all_vert_loops()?;

    let mut remap = vec![usize::MAX; graph.vertex_slots()];
    let mut vertices = Vec::with_capacity(graph.vertex_count());
    for (v, vert) in graph.vertices() {
        remap[v.index()] = vertices.len();
        vertices.push(vert.position);
    }

    let faces = loops
        .iter()
        .map(|face| face.vertices().iter().map(|v| remap[v.index()]).collect())
        .collect();

    Ok((vertices, faces))
}

/// Export the graph as triangles, fan-triangulating every face loop.
pub fn to_triangles(graph: &Graph) -> Result<(Vec<Point3<f64>>, Vec<[usize; 3]>)> {
    let (vertices, polygons) = to_face_lists(graph)?;
    let mut triangles = Vec::with_capacity(polygons.len() * 2);
    for poly in &polygons {
        for i in 1..poly.len() - 1 {
            triangles.push([poly[0], poly[i], poly[i + 1]]);
        }
    }
    Ok((vertices, triangles))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn euler(graph: &Graph) -> i64 {
        let faces = graph.all_vert_loops().unwrap().len() as i64;
        graph.vertex_count() as i64 - graph.edge_count() as i64 + faces
    }

    #[test]
    fn test_icosahedron_counts() {
        let g = icosahedron(1.0);
        assert_eq!(g.vertex_count(), 12);
        assert_eq!(g.edge_count(), 30);
        assert_eq!(g.all_vert_loops().unwrap().len(), 20);
        assert!(g.vert_ids().all(|v| g.degree(v) == 5));
        for v in g.vert_ids() {
            assert!((g.position(v).coords.norm() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_solids_are_closed() {
        for g in [tetrahedron(1.0), cube(2.0), icosahedron(0.5)] {
            assert!(g.is_valid());
            assert_eq!(euler(&g), 2);
        }
    }

    #[test]
    fn test_from_triangles_dedups_edges() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        let g = from_triangles(&vertices, &faces).unwrap();
        assert_eq!(g.edge_count(), 6);
        assert!(g.is_valid());
        assert_eq!(euler(&g), 2);
    }

    #[test]
    fn test_from_triangles_errors() {
        let vertices = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)];

        let empty: Vec<[usize; 3]> = vec![];
        assert!(matches!(from_triangles(&vertices, &empty), Err(GraphError::EmptyMesh)));

        assert!(matches!(
            from_triangles(&vertices, &[[0, 1, 5]]),
            Err(GraphError::InvalidVertexIndex { face: 0, vertex: 5 })
        ));

        assert!(matches!(
            from_triangles(&vertices, &[[0, 1, 1]]),
            Err(GraphError::DegenerateFace { face: 0 })
        ));
    }

    #[test]
    fn test_normals_point_outward() {
        let g = cube(1.0);
        for (_, v) in g.vertices() {
            assert!(v.normal.dot(&v.position.coords) > 0.0);
        }
    }

    #[test]
    fn test_newell_normal_of_unit_square() {
        let n = newell_normal([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]);
        assert!((n - Vector3::new(0.0, 0.0, 2.0)).norm() < 1e-12);
    }

    #[test]
    fn test_round_trip_through_face_lists() {
        let g = cube(1.0);
        let (vertices, faces) = to_face_lists(&g).unwrap();
        assert_eq!(vertices.len(), 8);
        assert_eq!(faces.len(), 6);
        let rebuilt = from_polygons(&vertices, &faces).unwrap();
        assert_eq!(rebuilt.edge_count(), 12);
        assert!(rebuilt.is_valid());
    }

    #[test]
    fn test_to_triangles_splits_quads() {
        let (_, triangles) = to_triangles(&cube(1.0)).unwrap();
        assert_eq!(triangles.len(), 12);
    }

    #[test]
    fn test_export_skips_dead_vertices() {
        let mut g = icosahedron(1.0);
        let extra = g.add_vert(Point3::new(5.0, 0.0, 0.0), Vector3::x());
        g.kill_vert(extra).unwrap();
        let (vertices, faces) = to_face_lists(&g).unwrap();
        assert_eq!(vertices.len(), 12);
        assert!(faces.iter().flatten().all(|&i| i < 12));
    }
}
