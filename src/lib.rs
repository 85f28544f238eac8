//! Proper vertex coloring of large undirected graphs with a speculative
//! parallel algorithm: degree-ordered pre-coloring, optimistic concurrent
//! color assignment, and a bounded conflict-repair loop.

pub mod error;
pub mod gen;
pub mod graph;
pub mod greedy;
pub mod load;
pub mod order;
pub mod report;
pub mod speculative;
pub mod verify;

pub use error::{ChromaticError, Result};
pub use graph::{Graph, GraphBuilder};
pub use speculative::{color_speculative, ColorConfig, ColorStats};
pub use verify::{check_coloring, count_colors};

/// Sentinel for a vertex that has not been assigned a color yet.
pub const UNCOLORED: usize = usize::MAX;
