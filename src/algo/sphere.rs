//! Spherical lifting and re-projection.
//!
//! Subdivision inserts vertices on flat faces; lifting pushes them back out to
//! the target sphere. The relaxation engine re-projects after every iteration
//! so smoothing cannot shrink the mesh.

use log::debug;
use nalgebra::Vector3;

use crate::error::{GraphError, Result};
use crate::graph::Graph;

const EPSILON: f64 = 1e-12;

/// How vertices are pulled onto the target sphere after a subdivision pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LiftMode {
    /// Leave positions where subdivision put them.
    #[default]
    None,
    /// Move every vertex exactly onto the sphere along its radius.
    Normalized,
    /// Scale every vertex by `1 + (radius - |p|) / radius`, i.e.
    /// `p += p * (radius - |p|) / radius`.
    ///
    /// The step is proportional to the distance from the origin rather than
    /// to the unit direction, so vertices inside the sphere only approach it
    /// and never land outside. The result scales with the radius. A vertex
    /// so far out that the factor would not be positive is snapped onto the
    /// sphere instead of crossing the origin.
    Unnormalized,
}

impl LiftMode {
    /// Parse a lift mode name (`none`, `normalized`, `unnormalized`).
    pub fn from_name(name: &str) -> Option<LiftMode> {
        match name.to_lowercase().as_str() {
            "none" => Some(LiftMode::None),
            "normalized" | "sphere" => Some(LiftMode::Normalized),
            "unnormalized" | "scale" => Some(LiftMode::Unnormalized),
            _ => None,
        }
    }
}

pub(crate) fn check_radius(radius: f64) -> Result<()> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(GraphError::invalid_param(
            "radius",
            radius,
            "must be positive and finite",
        ));
    }
    Ok(())
}

/// Push every live vertex onto the sphere of the given radius.
///
/// Each position moves along its own direction from the origin:
/// `p += normalize(p) * (radius - |p|)`, and its normal is reset to that
/// direction. Vertices sitting at the origin have no direction and are left
/// alone. Returns the number of vertices moved.
pub fn project_to_sphere(graph: &mut Graph, radius: f64) -> Result<usize> {
    check_radius(radius)?;

    let mut moved = 0;
    for (_, vert) in graph.vertices_mut() {
        let len = vert.position.coords.norm();
        if len < EPSILON {
            continue;
        }
        let dir: Vector3<f64> = vert.position.coords / len;
        vert.position += dir * (radius - len);
        vert.normal = dir;
        moved += 1;
    }
    Ok(moved)
}

/// Apply a [`LiftMode`] to every live vertex.
pub fn lift(graph: &mut Graph, mode: LiftMode, radius: f64) -> Result<()> {
    match mode {
        LiftMode::None => Ok(()),
        LiftMode::Normalized => project_to_sphere(graph, radius).map(|_| ()),
        LiftMode::Unnormalized => {
            check_radius(radius)?;
            for (_, vert) in graph.vertices_mut() {
                let p = vert.position.coords;
                let len = p.norm();
                if len < EPSILON {
                    continue;
                }
                let scale = 1.0 + (radius - len) / radius;
                let scale = if scale > 0.0 { scale } else { radius / len };
                vert.position.coords = p * scale;
                vert.normal = p / len;
            }
            debug!("applied unnormalized lift toward radius {}", radius);
            Ok(())
        }
    }
}

/// Largest distance of any live vertex from the sphere surface.
pub fn max_radius_error(graph: &Graph, radius: f64) -> f64 {
    graph
        .vertices()
        .map(|(_, v)| (v.position.coords.norm() - radius).abs())
        .fold(0.0, f64::max)
}
