//! Umbrella (graph Laplacian) smoothing.

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::error::{GraphError, Result};
use crate::graph::{Graph, VertId};

/// Move every vertex toward the average of its neighbors.
///
/// `new = old + λ·(avg(neighbors) - old)`, with every average taken from the
/// positions before the pass. `λ = 1` replaces each vertex by its neighbor
/// average. Isolated vertices stay put.
///
/// Returns the summed squared displacement of the pass.
///
/// # Errors
/// [`GraphError::InvalidParameter`] unless `0 <= lambda <= 1`.
pub fn laplacian(graph: &mut Graph, lambda: f64) -> Result<f64> {
    laplacian_with(graph, lambda, true)
}

/// [`laplacian`] with explicit control over parallel evaluation.
pub fn laplacian_with(graph: &mut Graph, lambda: f64, parallel: bool) -> Result<f64> {
    if !(0.0..=1.0).contains(&lambda) {
        return Err(GraphError::invalid_param(
            "laplacian_lambda",
            lambda,
            "must lie in [0, 1]",
        ));
    }
    if lambda == 0.0 {
        return Ok(0.0);
    }

    let ids: Vec<VertId> = graph.vert_ids().collect();
    let updates: Vec<(VertId, Point3<f64>)> = {
        let g = &*graph;
        if parallel {
            ids.par_iter().map(|&v| (v, umbrella_step(g, v, lambda))).collect()
        } else {
            ids.iter().map(|&v| (v, umbrella_step(g, v, lambda))).collect()
        }
    };

    let mut total = 0.0;
    for (v, pos) in updates {
        total += (pos - graph.position(v)).norm_squared();
        graph.set_position(v, pos);
    }
    Ok(total)
}

fn umbrella_step(graph: &Graph, v: VertId, lambda: f64) -> Point3<f64> {
    let old = *graph.position(v);
    let neighbors = graph.vert_neighbors(v);
    if neighbors.is_empty() {
        return old;
    }
    let sum: Vector3<f64> = neighbors.iter().map(|&n| graph.position(n).coords).sum();
    let avg = Point3::from(sum / neighbors.len() as f64);
    old + (avg - old) * lambda
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{cube, icosahedron};
    use approx::assert_relative_eq;

    #[test]
    fn test_cube_contracts_uniformly() {
        let mut g = cube(1.0);
        let before = g.positions();
        laplacian(&mut g, 0.5).unwrap();
        // The neighbor average of a cube corner is a third of the corner.
        for v in g.vert_ids() {
            let expected = before[v.index()].coords * (2.0 / 3.0);
            assert_relative_eq!(g.position(v).coords, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_displacement_decreases_without_projection() {
        for lambda in [1.0, 0.5] {
            let mut g = icosahedron(1.0);
            let mut last = f64::INFINITY;
            for _ in 0..60 {
                let step = laplacian(&mut g, lambda).unwrap();
                assert!(step <= last, "lambda {lambda}: {step} > {last}");
                last = step;
            }
            assert!(last < 1e-10, "lambda {lambda}: {last}");
        }
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let mut a = icosahedron(1.0);
        let mut b = a.clone();
        a.set_position(VertId::new(0), Point3::new(0.3, 0.2, 1.1));
        b.set_position(VertId::new(0), Point3::new(0.3, 0.2, 1.1));

        let ta = laplacian_with(&mut a, 0.7, true).unwrap();
        let tb = laplacian_with(&mut b, 0.7, false).unwrap();
        assert_relative_eq!(ta, tb, epsilon = 1e-15);
        for v in a.vert_ids() {
            assert_eq!(a.position(v), b.position(v));
        }
    }

    #[test]
    fn test_lambda_bounds() {
        let mut g = cube(1.0);
        assert!(laplacian(&mut g, 1.5).is_err());
        assert!(laplacian(&mut g, -0.1).is_err());
        assert!(laplacian(&mut g, f64::NAN).is_err());
        assert_eq!(laplacian(&mut g, 0.0).unwrap(), 0.0);
    }
}
