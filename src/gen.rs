//! Synthetic graph generators for benchmarking and tests.

use rand::prelude::*;

use crate::graph::{Graph, GraphBuilder};

/// Random graph: every vertex draws up to `avg_edges` endpoints uniformly.
/// Self-loops and duplicates are discarded by the builder, so the edge
/// count is approximate.
pub fn random_graph(n: usize, avg_edges: usize) -> Graph {
    let mut rng = rand::thread_rng();
    let mut builder = GraphBuilder::with_estimate(n, n * avg_edges / 2);

    for v in 0..n {
        for _ in 0..rng.gen_range(0..avg_edges.max(1)) {
            let u = rng.gen_range(0..n);
            builder.add_edge(v, u).expect("generated endpoints in range");
        }
    }

    builder.finish()
}

pub fn path_graph(n: usize) -> Graph {
    let mut builder = GraphBuilder::new(n);
    for v in 1..n {
        builder.add_edge(v - 1, v).expect("generated endpoints in range");
    }
    builder.finish()
}
