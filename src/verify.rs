//! Final authority on whether a coloring is proper.

use rayon::prelude::*;

use crate::error::{ChromaticError, Result};
use crate::graph::Graph;

/// Scans every edge in parallel and reports an offending one, if any.
pub fn check_coloring(graph: &Graph, colors: &[usize]) -> Result<()> {
    let conflict = (0..graph.num_vertices())
        .into_par_iter()
        .find_map_any(|v| {
            graph
                .neighbors(v)
                .expect("vertex in range")
                .iter()
                .find(|&&u| colors[u as usize] == colors[v])
                .map(|&u| (v, u as usize))
        });

    match conflict {
        Some((u, v)) => Err(ChromaticError::VerifyFail {
            u,
            v,
            color: colors[u],
        }),
        None => Ok(()),
    }
}

/// Number of colors in use, i.e. one past the highest assigned color.
pub fn count_colors(colors: &[usize]) -> usize {
    colors.par_iter().max().map(|&c| c + 1).unwrap_or(0)
}
