//! Error types for quadsphere.
//!
//! Structural errors ([`GraphError::InvalidTopology`],
//! [`GraphError::DegenerateLoop`]) mean the edge graph itself is broken.
//! The rest reject inputs or parameters before any mutation happens.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`GraphError`].
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors that can occur during graph operations.
#[derive(Error, Debug)]
pub enum GraphError {
    /// The edge graph is not a closed 2-manifold, or an edge was requested
    /// between invalid endpoints.
    #[error("invalid topology: {details}")]
    InvalidTopology {
        /// Description of the violation, including the offending edge or vertex.
        details: String,
    },

    /// A face loop with fewer than three vertices was discovered.
    #[error("degenerate face loop of length {len}: {vertices:?}")]
    DegenerateLoop {
        /// Number of vertices in the loop.
        len: usize,
        /// Raw vertex indices of the loop.
        vertices: Vec<usize>,
    },

    /// An operator was handed a face loop of a length it cannot process.
    #[error("unbalanced input: expected {expected}, found a loop of length {found}")]
    UnbalancedInput {
        /// What the operator accepts.
        expected: &'static str,
        /// The loop length that was found.
        found: usize,
    },

    /// A polygon list without a single polygon.
    #[error("no polygons to build a graph from")]
    EmptyMesh,

    /// A polygon names a vertex that does not exist.
    #[error("polygon {face} names vertex {vertex}, which does not exist")]
    InvalidVertexIndex {
        /// Polygon position in the input list.
        face: usize,
        /// Offending vertex index.
        vertex: usize,
    },

    /// A polygon repeats a vertex or has zero area.
    #[error("polygon {face} repeats a vertex or has no area")]
    DegenerateFace {
        /// Polygon position in the input list.
        face: usize,
    },

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A file was readable but its contents were not.
    #[error("cannot read graph from {path}: {message}")]
    LoadError {
        /// File that was being read.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// No reader or writer for this extension.
    #[error("no OBJ or PLY support for extension {extension:?}")]
    UnsupportedFormat {
        /// Extension as found on the path (may be empty).
        extension: String,
    },

    /// An option is out of range.
    #[error("{name} = {value} is out of range: {reason}")]
    InvalidParameter {
        /// Option name.
        name: &'static str,
        /// Rendered value.
        value: String,
        /// Accepted range.
        reason: &'static str,
    },
}

impl GraphError {
    /// Shorthand for [`GraphError::InvalidParameter`].
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        GraphError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create an invalid topology error.
    pub fn topology(details: impl Into<String>) -> Self {
        GraphError::InvalidTopology {
            details: details.into(),
        }
    }

    /// Whether this error reports a structural invariant violation.
    ///
    /// Structural errors mean the graph cannot be processed further by any
    /// operator until it is rebuilt.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            GraphError::InvalidTopology { .. } | GraphError::DegenerateLoop { .. }
        )
    }
}
