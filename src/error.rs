use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChromaticError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An edge endpoint outside `[0, n)` was handed to the graph builder.
    #[error("edge ({u}, {v}) out of range for graph on {n} vertices")]
    BadEdge { u: usize, v: usize, n: usize },

    /// A vertex index outside `[0, n)` was passed to a graph accessor.
    #[error("vertex {v} out of range for graph on {n} vertices")]
    OutOfRange { v: usize, n: usize },

    #[error("coloring invalid: vertices {u} and {v} share an edge and color {color}")]
    VerifyFail { u: usize, v: usize, color: usize },
}

pub type Result<T> = std::result::Result<T, ChromaticError>;
