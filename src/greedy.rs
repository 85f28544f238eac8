//! Sequential greedy coloring in natural vertex order. Deterministic; the
//! correctness oracle and color-count baseline for the parallel engine.

use crate::graph::Graph;
use crate::UNCOLORED;

pub fn color_greedy(graph: &Graph) -> Vec<usize> {
    let n = graph.num_vertices();
    let mut colors = vec![UNCOLORED; n];

    for v in 0..n {
        let mut seen = vec![false; graph.degree(v).expect("vertex in range") + 1];
        for &u in graph.neighbors(v).expect("vertex in range") {
            let c = colors[u as usize];
            if c < seen.len() {
                seen[c] = true;
            }
        }
        colors[v] = seen.iter().position(|&b| !b).unwrap();
    }

    colors
}
