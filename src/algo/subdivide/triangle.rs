//! Midpoint subdivision of triangle graphs.

use super::{check_loops, repeat, SplitPlan, SubdivideOptions, SubdivideReport};
use crate::algo::Progress;
use crate::error::Result;
use crate::graph::Graph;

/// Split every triangle into four.
///
/// # Algorithm
///
/// 1. Trace all face loops; any loop that is not a triangle rejects the pass
///    with [`UnbalancedInput`](crate::error::GraphError::UnbalancedInput).
/// 2. For each triangle `(a, b, c)`, look up or create the midpoints
///    `mab`, `mbc`, `mca`. A midpoint is created once per edge and reused
///    by the triangle on the other side.
/// 3. Plan the three interior edges `mab–mbc`, `mbc–mca`, `mca–mab`.
/// 4. Commit: add the midpoints, retire every original edge and add its two
///    halves plus the interior edges.
///
/// Midpoints are placed on the chord; lift them with
/// [`subdivide_with`] or [`project_to_sphere`](crate::algo::project_to_sphere).
pub fn subdivide(graph: &mut Graph) -> Result<SubdivideReport> {
    let loops = graph.all_vert_loops()?;
    check_loops(&loops, |n| n == 3, "triangle loops")?;

    let mut plan = SplitPlan::new(graph);
    for face in &loops {
        let [a, b, c] = [face.vertices()[0], face.vertices()[1], face.vertices()[2]];
        let mab = plan.midpoint(graph, a, b)?;
        let mbc = plan.midpoint(graph, b, c)?;
        let mca = plan.midpoint(graph, c, a)?;
        plan.edge(mab, mbc);
        plan.edge(mbc, mca);
        plan.edge(mca, mab);
    }

    plan.commit(graph, loops.len() * 4)
}

/// Apply [`subdivide`] `options.iterations` times, lifting after each pass.
pub fn subdivide_with(graph: &mut Graph, options: &SubdivideOptions) -> Result<SubdivideReport> {
    subdivide_with_progress(graph, options, &Progress::none())
}

/// [`subdivide_with`] reporting one step per pass.
pub fn subdivide_with_progress(
    graph: &mut Graph,
    options: &SubdivideOptions,
    progress: &Progress,
) -> Result<SubdivideReport> {
    repeat(graph, options, progress, "Subdividing triangles", subdivide)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::sphere::{max_radius_error, LiftMode};
    use crate::error::GraphError;
    use crate::graph::{cube, icosahedron, tetrahedron, undirected};
    use std::collections::HashSet;

    #[test]
    fn test_icosahedron_one_pass() {
        let mut g = icosahedron(1.0);
        let report = subdivide(&mut g).unwrap();

        assert_eq!(g.vertex_count(), 42);
        assert_eq!(g.edge_count(), 120);
        assert_eq!(report.vertices_added, 30);
        assert_eq!(report.edges_retired, 30);
        assert_eq!(report.edges_added, 120);
        assert_eq!(report.faces, 80);

        let loops = g.all_vert_loops().unwrap();
        assert_eq!(loops.len(), 80);
        assert!(loops.iter().all(|l| l.len() == 3));
        g.validate().unwrap();
    }

    #[test]
    fn test_midpoints_are_shared() {
        let mut g = tetrahedron(1.0);
        let before: Vec<_> = g.edge_ids().map(|e| g.edge_endpoints(e)).collect();
        let original_positions = g.positions();
        subdivide(&mut g).unwrap();

        // 4 corners + 6 midpoints, every one of degree >= 3.
        assert_eq!(g.vertex_count(), 10);
        for (a, b) in before {
            assert!(g.find_edge(a, b).is_none());
            let mid = nalgebra::center(&original_positions[a.index()], &original_positions[b.index()]);
            let m = g
                .vert_ids()
                .find(|&v| (g.position(v) - mid).norm() < 1e-12)
                .unwrap();
            assert!(g.find_edge(a, m).is_some());
            assert!(g.find_edge(m, b).is_some());
        }
    }

    #[test]
    fn test_midpoint_normals_are_unit() {
        let mut g = icosahedron(2.0);
        let old = g.vertex_slots();
        subdivide(&mut g).unwrap();
        for v in g.vert_ids().filter(|v| v.index() >= old) {
            assert!((g.normal(v).norm() - 1.0).abs() < 1e-12);
            assert!(g.normal(v).dot(&g.position(v).coords) > 0.0);
        }
    }

    #[test]
    fn test_rejects_quads_untouched() {
        let mut g = cube(1.0);
        let verts = g.vertex_count();
        let edges: HashSet<_> = g.edge_ids().map(|e| g.edge_key(e)).collect();

        let err = subdivide(&mut g).unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnbalancedInput { found: 4, .. }
        ));
        assert_eq!(g.vertex_count(), verts);
        let after: HashSet<_> = g.edge_ids().map(|e| g.edge_key(e)).collect();
        assert_eq!(edges, after);
    }

    #[test]
    fn test_repeated_with_lift() {
        let mut g = icosahedron(1.5);
        let options = SubdivideOptions::new(3)
            .with_lift(LiftMode::Normalized)
            .with_radius(1.5);
        let report = subdivide_with(&mut g, &options).unwrap();

        assert_eq!(report.passes, 3);
        assert_eq!(report.faces, 20 * 64);
        assert_eq!(g.vertex_count(), 642);
        assert!(max_radius_error(&g, 1.5) < 1e-12);

        // No duplicate edges survive repeated passes.
        let keys: HashSet<_> = g.edge_ids().map(|e| g.edge_key(e)).collect();
        assert_eq!(keys.len(), g.edge_count());
        assert!(keys.iter().all(|&(a, b)| undirected(a, b) == (a, b)));
    }

    #[test]
    fn test_bad_lift_radius_rejected_before_pass() {
        let mut g = icosahedron(1.0);
        let options = SubdivideOptions::new(1)
            .with_lift(LiftMode::Normalized)
            .with_radius(0.0);

        let err = subdivide_with(&mut g, &options).unwrap_err();
        assert!(matches!(err, GraphError::InvalidParameter { name: "radius", .. }));
        assert_eq!(g.vertex_count(), 12);
        assert_eq!(g.edge_count(), 30);

        // The radius is irrelevant without a lift.
        let options = SubdivideOptions::new(1).with_radius(0.0);
        subdivide_with(&mut g, &options).unwrap();
        assert_eq!(g.vertex_count(), 42);
    }

    #[test]
    fn test_progress_reports_each_pass() {
        use std::sync::{Arc, Mutex};

        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let progress = Progress::new(move |c, t, _| sink.lock().unwrap().push((c, t)));

        let mut g = icosahedron(1.0);
        subdivide_with_progress(&mut g, &SubdivideOptions::new(2), &progress).unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![(0, 2), (1, 2), (2, 2)]);
    }
}
