//! Wavefront OBJ format support.
//!
//! Only geometry is read: `v` records and `f` records. Face corners may carry
//! texture and normal references (`1/2/3`, `1//3`), which are ignored, and
//! may use negative indices relative to the end of the vertex list. Every
//! other record is skipped.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;
use nalgebra::Point3;

use super::load_error;
use crate::error::Result;
use crate::graph::{from_polygons, to_face_lists, Graph};

/// Load a graph from an OBJ file.
///
/// # Example
///
/// ```no_run
/// use quadsphere::io::obj;
///
/// let graph = obj::load("sphere.obj").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<Graph> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut faces: Vec<Vec<usize>> = Vec::new();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let coords: Vec<f64> = tokens
                    .take(3)
                    .map(|t| t.parse::<f64>())
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| load_error(path, format!("line {}: {}", lineno + 1, e)))?;
                if coords.len() != 3 {
                    return Err(load_error(
                        path,
                        format!("line {}: vertex needs three coordinates", lineno + 1),
                    ));
                }
                vertices.push(Point3::new(coords[0], coords[1], coords[2]));
            }
            Some("f") => {
                let face = tokens
                    .map(|t| corner_index(t, vertices.len()))
                    .collect::<Option<Vec<usize>>>()
                    .ok_or_else(|| {
                        load_error(path, format!("line {}: malformed face index", lineno + 1))
                    })?;
                if face.len() < 3 {
                    return Err(load_error(
                        path,
                        format!("line {}: face has fewer than three corners", lineno + 1),
                    ));
                }
                faces.push(face);
            }
            _ => {}
        }
    }

    if faces.is_empty() {
        return Err(load_error(path, "OBJ file contains no faces"));
    }
    debug!("read {}: {} vertices, {} faces", path.display(), vertices.len(), faces.len());

    from_polygons(&vertices, &faces)
}

/// Resolve one face corner token to a 0-based vertex index.
fn corner_index(token: &str, vertex_count: usize) -> Option<usize> {
    let raw: i64 = token.split('/').next()?.parse().ok()?;
    match raw {
        0 => None,
        r if r > 0 => usize::try_from(r - 1).ok(),
        r => vertex_count.checked_sub(usize::try_from(-r).ok()?),
    }
}

/// Save a graph to an OBJ file, one polygon per face loop.
pub fn save<P: AsRef<Path>>(graph: &Graph, path: P) -> Result<()> {
    let path = path.as_ref();
    let (vertices, faces) = to_face_lists(graph)?;
    let mut writer = BufWriter::new(File::create(path)?);

    writeln!(writer, "# quadsphere")?;
    writeln!(writer, "# {} vertices, {} faces", vertices.len(), faces.len())?;
    for v in &vertices {
        writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
    }
    for face in &faces {
        write!(writer, "f")?;
        for &i in face {
            write!(writer, " {}", i + 1)?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}
