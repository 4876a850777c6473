//! PLY (Stanford polygon) format support.
//!
//! Reading goes through `ply-rs` and accepts ASCII and binary files with any
//! numeric coordinate type. Writing produces ASCII PLY with one polygon per
//! face loop.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;
use nalgebra::Point3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use super::load_error;
use crate::error::Result;
use crate::graph::{from_polygons, to_face_lists, Graph};

/// Load a graph from a PLY file.
///
/// # Example
///
/// ```no_run
/// use quadsphere::io::ply;
///
/// let graph = ply::load("sphere.ply").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<Graph> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);

    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| load_error(path, e.to_string()))?;

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| load_error(path, "PLY file has no vertex element"))?;

    let mut vertices: Vec<Point3<f64>> = Vec::with_capacity(vertex_element.len());
    for (i, vertex) in vertex_element.iter().enumerate() {
        let coord = |name: &str| {
            float_property(vertex, name)
                .ok_or_else(|| load_error(path, format!("vertex {i} missing {name} coordinate")))
        };
        vertices.push(Point3::new(coord("x")?, coord("y")?, coord("z")?));
    }

    let face_element = ply
        .payload
        .get("face")
        .ok_or_else(|| load_error(path, "PLY file has no face element"))?;

    let faces = face_element
        .iter()
        .enumerate()
        .map(|(i, face)| {
            list_property(face, "vertex_indices")
                .or_else(|| list_property(face, "vertex_index"))
                .ok_or_else(|| load_error(path, format!("face {i} missing vertex_indices")))
        })
        .collect::<Result<Vec<Vec<usize>>>>()?;

    if faces.is_empty() {
        return Err(load_error(path, "PLY file contains no faces"));
    }
    debug!("read {}: {} vertices, {} faces", path.display(), vertices.len(), faces.len());

    from_polygons(&vertices, &faces)
}

fn float_property(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(f64::from(*v)),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(f64::from(*v)),
        Property::UInt(v) => Some(f64::from(*v)),
        Property::Short(v) => Some(f64::from(*v)),
        Property::UShort(v) => Some(f64::from(*v)),
        Property::Char(v) => Some(f64::from(*v)),
        Property::UChar(v) => Some(f64::from(*v)),
        _ => None,
    }
}

fn list_property(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    fn indices<T: Copy + TryInto<usize>>(values: &[T]) -> Option<Vec<usize>> {
        values.iter().map(|&x| x.try_into().ok()).collect()
    }

    match element.get(name)? {
        Property::ListInt(v) => indices(v),
        Property::ListUInt(v) => indices(v),
        Property::ListShort(v) => indices(v),
        Property::ListUShort(v) => indices(v),
        Property::ListChar(v) => indices(v),
        Property::ListUChar(v) => indices(v),
        _ => None,
    }
}

/// Save a graph to an ASCII PLY file, one polygon per face loop.
pub fn save<P: AsRef<Path>>(graph: &Graph, path: P) -> Result<()> {
    let path = path.as_ref();
    let (vertices, faces) = to_face_lists(graph)?;
    let mut writer = BufWriter::new(File::create(path)?);

    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by quadsphere")?;
    writeln!(writer, "element vertex {}", vertices.len())?;
    writeln!(writer, "property double x")?;
    writeln!(writer, "property double y")?;
    writeln!(writer, "property double z")?;
    writeln!(writer, "element face {}", faces.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for v in &vertices {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }
    for face in &faces {
        write!(writer, "{}", face.len())?;
        for &i in face {
            write!(writer, " {i}")?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use crate::graph::{cube, length_histogram};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_quads_survive_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cube.ply");
        let original = cube(2.0);
        save(&original, &path).unwrap();

        let g = load(&path).unwrap();
        assert_eq!(g.vertex_count(), 8);
        assert_eq!(length_histogram(&g.all_vert_loops().unwrap()), vec![(4, 6)]);
        for (a, b) in original.vertices().zip(g.vertices()) {
            assert!((a.1.position - b.1.position).norm() < 1e-12);
        }
    }

    #[test]
    fn test_integer_coordinates_and_vertex_index() {
        let src = "\
ply
format ascii 1.0
element vertex 4
property int x
property int y
property int z
element face 4
property list uchar uint vertex_index
end_header
1 1 1
1 -1 -1
-1 1 -1
-1 -1 1
3 0 2 3
3 0 3 1
3 0 1 2
3 1 3 2
";
        let dir = tempdir().unwrap();
        let path = dir.path().join("tet.ply");
        fs::write(&path, src).unwrap();

        let g = load(&path).unwrap();
        assert_eq!(g.vertex_count(), 4);
        assert_eq!(g.edge_count(), 6);
        assert_eq!(g.all_vert_loops().unwrap().len(), 4);
    }

    #[test]
    fn test_missing_faces() {
        let src = "\
ply
format ascii 1.0
element vertex 1
property float x
property float y
property float z
end_header
0 0 0
";
        let dir = tempdir().unwrap();
        let path = dir.path().join("points.ply");
        fs::write(&path, src).unwrap();
        assert!(matches!(load(&path), Err(GraphError::LoadError { .. })));
    }
}
