//! Error types for the nearest insertion solver.
//!
//! Every fallible operation returns `TspResult<T>`. Lookups that the heuristic
//! expects to succeed on a complete graph surface as distinct variants instead
//! of empty results.

use crate::instance::VertexId;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for solver operations.
pub type TspResult<T> = Result<T, TspError>;

/// Unified error type for parsing, tour construction and output.
#[derive(Debug, Error)]
pub enum TspError {
    /// An input line does not hold exactly three integers.
    #[error("malformed input at line {line}: {reason} ({content:?})")]
    MalformedInput {
        /// 1-based line number.
        line: usize,
        /// Raw line content.
        content: String,
        /// What went wrong.
        reason: String,
    },

    /// No edge joins the two vertices in either direction.
    #[error("incomplete graph: no edge between {first} and {second}")]
    IncompleteGraph {
        first: VertexId,
        second: VertexId,
    },

    /// The edge list produced no vertices.
    #[error("empty graph: no vertices to build a tour from")]
    EmptyGraph,

    /// Nearest-vertex lookup on a vertex without incident edges.
    #[error("vertex {0} has no incident edges")]
    IsolatedVertex(VertexId),

    /// Insertion requested on a tour that has no adjacent pair.
    #[error("cannot insert into a tour of length {0}")]
    TourTooShort(usize),

    /// A tour weight or marginal cost does not fit in a `Weight`.
    #[error("weight overflow while {0}")]
    WeightOverflow(String),

    /// Rendered output differs from the expected result file.
    #[error("result mismatch: expected {expected:?}, got {actual:?}")]
    FixtureMismatch { expected: String, actual: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TspError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TspError::Io { path: path.into(), source }
    }
}
