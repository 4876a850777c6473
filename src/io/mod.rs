//! Mesh file I/O.
//!
//! Graphs are read from and written to polygon files. Loading builds a
//! [`Graph`] from the file's faces (triangles, quads or larger polygons);
//! saving writes one polygon per face loop.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save |
//! |--------|-----------|------|------|
//! | Wavefront OBJ | `.obj` | ✓ | ✓ |
//! | PLY (ASCII) | `.ply` | ✓ | ✓ |
//!
//! # Usage
//!
//! ```no_run
//! use quadsphere::io::{load, save};
//!
//! let graph = load("sphere.obj").unwrap();
//! save(&graph, "sphere.ply").unwrap();
//! ```

pub mod obj;
pub mod ply;

use std::path::Path;

use crate::error::{GraphError, Result};
use crate::graph::Graph;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ format.
    Obj,
    /// PLY (Stanford polygon) format.
    Ply,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            "ply" => Some(Format::Ply),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Format> {
        let path = path.as_ref();
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
            .ok_or_else(|| GraphError::UnsupportedFormat {
                extension: path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("(none)")
                    .to_string(),
            })
    }
}

/// Load a graph from a file, choosing the format by extension.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Graph> {
    let path = path.as_ref();
    match Format::from_path(path)? {
        Format::Obj => obj::load(path),
        Format::Ply => ply::load(path),
    }
}

/// Save a graph to a file, choosing the format by extension.
pub fn save<P: AsRef<Path>>(graph: &Graph, path: P) -> Result<()> {
    let path = path.as_ref();
    match Format::from_path(path)? {
        Format::Obj => obj::save(graph, path),
        Format::Ply => ply::save(graph, path),
    }
}

fn load_error(path: &Path, message: impl Into<String>) -> GraphError {
    GraphError::LoadError {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{cube, icosahedron};
    use tempfile::tempdir;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path("a/b/mesh.OBJ").unwrap(), Format::Obj);
        assert_eq!(Format::from_path("mesh.ply").unwrap(), Format::Ply);
        assert!(matches!(
            Format::from_path("mesh.stl"),
            Err(GraphError::UnsupportedFormat { extension }) if extension == "stl"
        ));
        assert!(Format::from_path("mesh").is_err());
    }

    #[test]
    fn test_save_and_load_by_extension() {
        let dir = tempdir().unwrap();
        for (graph, faces) in [(cube(1.0), 6), (icosahedron(1.0), 20)] {
            for name in ["mesh.obj", "mesh.ply"] {
                let path = dir.path().join(name);
                save(&graph, &path).unwrap();
                let back = load(&path).unwrap();
                assert_eq!(back.vertex_count(), graph.vertex_count());
                assert_eq!(back.edge_count(), graph.edge_count());
                assert_eq!(back.all_vert_loops().unwrap().len(), faces);
            }
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load(dir.path().join("nope.obj")).unwrap_err();
        assert!(matches!(err, GraphError::Io(_)));
    }
}
