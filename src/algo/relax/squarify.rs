//! Regular-polygon pull ("squarification").

use std::f64::consts::TAU;

use nalgebra::{Point3, Rotation3, Unit, Vector3};
use rayon::prelude::*;
use log::debug;

use super::RelaxOptions;
use crate::error::Result;
use crate::graph::{newell_normal, FaceLoop, Graph, VertId};

const EPSILON: f64 = 1e-12;

/// Per-loop result: the loop's own mean corner distance and the corner moves
/// it asks for (empty when the loop is too degenerate to orient).
struct LoopPull {
    local: f64,
    moves: Vec<(VertId, Vector3<f64>)>,
}

/// Pull every face loop toward a regular polygon of its own orientation.
///
/// # Algorithm
///
/// For a loop of `n` corners with centroid `c` and polygon normal `N`:
///
/// 1. Rotate each corner offset `p_i - c` by `-i·2π/n` about `N`. For a
///    regular polygon all rotated offsets coincide; their average, flattened
///    onto the face plane, gives the shared direction `u`.
/// 2. The ideal corner `i` is `c + R(i·2π/n)·u·t`, where `t` is `target` or,
///    without a target, the loop's own mean corner distance `local`.
/// 3. The displacement `ideal - p_i` is scaled by the loop's pull: 1, or
///    `1 + gun_boost·(t - local)/t` when `local < small_face_ratio·t`.
///
/// Vertices move by the average of the displacements their loops ask for;
/// vertices outside every loop stay where they are. Loops whose normal and
/// direction cannot be determined contribute nothing.
///
/// Returns the mean of `local` over all loops, or `target` (0 without one)
/// for a graph with no loops.
pub fn squarification(graph: &mut Graph, target: Option<f64>, options: &RelaxOptions) -> Result<f64> {
    let loops = graph.all_vert_loops()?;
    if loops.is_empty() {
        return Ok(target.unwrap_or(0.0));
    }

    let pulls: Vec<LoopPull> = {
        let g = &*graph;
        if options.parallel {
            loops.par_iter().map(|l| pull_loop(g, l, target, options)).collect()
        } else {
            loops.iter().map(|l| pull_loop(g, l, target, options)).collect()
        }
    };

    let mut sums = vec![Vector3::zeros(); graph.vertex_slots()];
    let mut counts = vec![0u32; graph.vertex_slots()];
    let mut skipped = 0;
    for pull in &pulls {
        if pull.moves.is_empty() {
            skipped += 1;
        }
        for &(v, delta) in &pull.moves {
            sums[v.index()] += delta;
            counts[v.index()] += 1;
        }
    }
    if skipped > 0 {
        debug!("squarification skipped {} degenerate loops", skipped);
    }

    for (v, vert) in graph.vertices_mut() {
        let n = counts[v.index()];
        if n > 0 {
            vert.position += sums[v.index()] / f64::from(n);
        }
    }

    let mean = pulls.iter().map(|p| p.local).sum::<f64>() / pulls.len() as f64;
    Ok(mean)
}

fn pull_loop(graph: &Graph, face: &FaceLoop, target: Option<f64>, options: &RelaxOptions) -> LoopPull {
    let corners: Vec<Point3<f64>> = face.vertices().iter().map(|&v| *graph.position(v)).collect();
    let c = face.centroid(graph);
    let offsets: Vec<Vector3<f64>> = corners.iter().map(|p| *p - c).collect();
    let n = offsets.len();
    let local = offsets.iter().map(|d| d.norm()).sum::<f64>() / n as f64;

    let skip = LoopPull {
        local,
        moves: Vec::new(),
    };

    let Some(axis) = Unit::try_new(newell_normal(corners.iter().copied()), EPSILON)
        .or_else(|| Unit::try_new(c.coords, EPSILON))
    else {
        return skip;
    };

    let step = TAU / n as f64;
    let mut dir: Vector3<f64> = offsets
        .iter()
        .enumerate()
        .map(|(i, d)| Rotation3::from_axis_angle(&axis, -(i as f64) * step) * *d)
        .sum::<Vector3<f64>>()
        / n as f64;
    dir -= axis.into_inner() * axis.dot(&dir);
    let Some(dir) = dir.try_normalize(EPSILON) else {
        return skip;
    };

    let t = target.filter(|&t| t > 0.0).unwrap_or(local);
    if t <= EPSILON {
        return skip;
    }

    let pull = match target {
        Some(target) if target > 0.0 && local < options.small_face_ratio * target => {
            1.0 + options.gun_boost * (target - local) / target
        }
        _ => 1.0,
    };

    let moves = face
        .vertices()
        .iter()
        .zip(&corners)
        .enumerate()
        .map(|(i, (&v, p))| {
            let ideal = c + Rotation3::from_axis_angle(&axis, i as f64 * step) * dir * t;
            (v, (ideal - *p) * pull)
        })
        .collect();

    LoopPull { local, moves }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{cube, from_polygons, icosahedron};
    use approx::assert_relative_eq;

    fn unit_square() -> Graph {
        let positions = [
            Point3::new(-0.5, -0.5, 0.0),
            Point3::new(0.5, -0.5, 0.0),
            Point3::new(0.5, 0.5, 0.0),
            Point3::new(-0.5, 0.5, 0.0),
        ];
        from_polygons(&positions, &[[0usize, 1, 2, 3]]).unwrap()
    }

    #[test]
    fn test_unit_square_is_fixed_point() {
        let mut g = unit_square();
        let before = g.positions();
        let mean = squarification(&mut g, None, &RelaxOptions::default()).unwrap();

        assert_relative_eq!(mean, 0.5f64.sqrt(), epsilon = 1e-12);
        for v in g.vert_ids() {
            assert!((g.position(v) - before[v.index()]).norm() < 1e-9);
        }
    }

    #[test]
    fn test_unit_square_with_own_target_is_fixed() {
        let mut g = unit_square();
        let before = g.positions();
        squarification(&mut g, Some(0.5f64.sqrt()), &RelaxOptions::default()).unwrap();
        for v in g.vert_ids() {
            assert!((g.position(v) - before[v.index()]).norm() < 1e-9);
        }
    }

    #[test]
    fn test_skewed_quad_becomes_square() {
        let positions = [
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, -0.2, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.2, 0.0),
        ];
        let mut g = from_polygons(&positions, &[[0usize, 1, 2, 3]]).unwrap();
        squarification(&mut g, None, &RelaxOptions::default()).unwrap();

        let c = Point3::from(g.positions().iter().map(|p| p.coords).sum::<Vector3<f64>>() / 4.0);
        let d: Vec<f64> = g.vert_ids().map(|v| (g.position(v) - c).norm()).collect();
        for w in d.windows(2) {
            assert_relative_eq!(w[0], w[1], epsilon = 1e-9);
        }
        // Diagonals of a square are perpendicular and equal.
        let ids: Vec<VertId> = g.vert_ids().collect();
        let d02 = g.position(ids[2]) - g.position(ids[0]);
        let d13 = g.position(ids[3]) - g.position(ids[1]);
        assert!(d02.dot(&d13).abs() < 1e-9);
        assert_relative_eq!(d02.norm(), d13.norm(), epsilon = 1e-9);
    }

    #[test]
    fn test_regular_solids_do_not_move() {
        for mut g in [cube(1.0), icosahedron(1.0)] {
            let before = g.positions();
            squarification(&mut g, None, &RelaxOptions::default()).unwrap();
            for v in g.vert_ids() {
                assert!((g.position(v) - before[v.index()]).norm() < 1e-9);
            }
        }
    }

    #[test]
    fn test_gun_factor_boosts_small_faces() {
        let options = RelaxOptions::default();
        let g = unit_square();
        let loops = g.all_vert_loops().unwrap();
        let local = 0.5f64.sqrt();

        let plain = pull_loop(&g, &loops[0], Some(local * 1.5), &options);
        let boosted = pull_loop(&g, &loops[0], Some(local * 4.0), &options);

        // Growing to 1.5x: ideal is 0.5 * local away, no boost.
        let (_, d) = plain.moves[0];
        assert_relative_eq!(d.norm(), 0.5 * local, epsilon = 1e-9);

        // Growing to 4x with local < 0.5 * target: pull = 1 + 0.5 * 0.75.
        let (_, d) = boosted.moves[0];
        assert_relative_eq!(d.norm(), 3.0 * local * 1.375, epsilon = 1e-9);
    }

    #[test]
    fn test_no_loops_returns_target() {
        let mut g = Graph::new();
        assert_eq!(squarification(&mut g, Some(2.0), &RelaxOptions::default()).unwrap(), 2.0);
        assert_eq!(squarification(&mut g, None, &RelaxOptions::default()).unwrap(), 0.0);
    }
}
