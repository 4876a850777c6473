//! Center-point subdivision producing quads only.

use super::{average_normal, check_loops, repeat, SplitPlan, SubdivideOptions, SubdivideReport};
use crate::algo::Progress;
use crate::error::Result;
use crate::graph::Graph;

/// Split every triangle or quad into quads around a new center vertex.
///
/// # Algorithm
///
/// 1. Trace all face loops; a loop of length 5 or more rejects the pass with
///    [`UnbalancedInput`](crate::error::GraphError::UnbalancedInput).
/// 2. For each face of `n` corners, plan a center vertex at the corner
///    average with the normalized average of the corner normals.
/// 3. For each side, look up or create the shared midpoint and plan the
///    edge midpoint–center.
/// 4. Commit: every face becomes `n` quads `(corner, midpoint, center,
///    previous midpoint)`.
pub fn subdivide_quad(graph: &mut Graph) -> Result<SubdivideReport> {
    let loops = graph.all_vert_loops()?;
    check_loops(&loops, |n| n == 3 || n == 4, "triangle or quad loops")?;

    let mut plan = SplitPlan::new(graph);
    let mut faces = 0;
    for face in &loops {
        let corners = face.vertices();
        let center = face.centroid(graph);
        let normal = average_normal(corners.iter().map(|&v| *graph.normal(v)), center.coords);
        let c = plan.vert(center, normal);

        for (i, &a) in corners.iter().enumerate() {
            let b = corners[(i + 1) % corners.len()];
            let m = plan.midpoint(graph, a, b)?;
            plan.edge(m, c);
        }
        faces += corners.len();
    }

    plan.commit(graph, faces)
}

/// Apply [`subdivide_quad`] `options.iterations` times, lifting after each
/// pass.
pub fn subdivide_quad_with(
    graph: &mut Graph,
    options: &SubdivideOptions,
) -> Result<SubdivideReport> {
    subdivide_quad_with_progress(graph, options, &Progress::none())
}

/// [`subdivide_quad_with`] reporting one step per pass.
pub fn subdivide_quad_with_progress(
    graph: &mut Graph,
    options: &SubdivideOptions,
    progress: &Progress,
) -> Result<SubdivideReport> {
    repeat(graph, options, progress, "Subdividing quads", subdivide_quad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::quadify::quadification_seeded;
    use crate::algo::sphere::LiftMode;
    use crate::algo::subdivide::subdivide;
    use crate::error::GraphError;
    use crate::graph::{cube, from_polygons, icosahedron, length_histogram, tetrahedron};
    use nalgebra::Point3;

    #[test]
    fn test_cube_splits_into_24_quads() {
        let mut g = cube(1.0);
        let report = subdivide_quad(&mut g).unwrap();

        assert_eq!(g.vertex_count(), 8 + 12 + 6);
        assert_eq!(g.edge_count(), 48);
        assert_eq!(report.faces, 24);

        let loops = g.all_vert_loops().unwrap();
        assert_eq!(loops.len(), 24);
        assert!(loops.iter().all(|l| l.len() == 4));
        g.validate().unwrap();
    }

    #[test]
    fn test_triangles_become_three_quads() {
        let mut g = tetrahedron(1.0);
        subdivide_quad(&mut g).unwrap();

        assert_eq!(g.vertex_count(), 14);
        assert_eq!(g.edge_count(), 24);
        let loops = g.all_vert_loops().unwrap();
        assert_eq!(length_histogram(&loops), vec![(4, 12)]);
    }

    #[test]
    fn test_mixed_mesh_becomes_all_quads() {
        let mut g = icosahedron(1.0);
        subdivide(&mut g).unwrap();
        quadification_seeded(&mut g, 7).unwrap();

        let options = SubdivideOptions::new(1).with_lift(LiftMode::Normalized);
        subdivide_quad_with(&mut g, &options).unwrap();

        let loops = g.all_vert_loops().unwrap();
        assert!(loops.iter().all(|l| l.len() == 4));
        g.validate().unwrap();
    }

    #[test]
    fn test_rejects_pentagons_untouched() {
        // Pentagonal prism: two pentagon caps and five quad sides.
        let mut positions = Vec::new();
        for z in [-0.5, 0.5] {
            for i in 0..5 {
                let a = i as f64 * std::f64::consts::TAU / 5.0;
                positions.push(Point3::new(a.cos(), a.sin(), z));
            }
        }
        let mut faces: Vec<Vec<usize>> = vec![vec![4, 3, 2, 1, 0], vec![5, 6, 7, 8, 9]];
        for i in 0..5 {
            let j = (i + 1) % 5;
            faces.push(vec![i, j, j + 5, i + 5]);
        }
        let mut g = from_polygons(&positions, &faces).unwrap();
        let edges = g.edge_count();

        let err = subdivide_quad(&mut g).unwrap_err();
        assert!(matches!(err, GraphError::UnbalancedInput { found: 5, .. }));
        assert_eq!(g.vertex_count(), 10);
        assert_eq!(g.edge_count(), edges);
        assert_eq!(g.vertex_slots(), 10);
    }
}
