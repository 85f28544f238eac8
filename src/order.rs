//! Largest-degree-first vertex ordering.

use rayon::prelude::*;

use crate::graph::Graph;

/// Comparison sort below this size, counting bins above.
const BINNING_THRESHOLD: usize = 10_000;

/// A permutation of the vertices, highest degree first, ties broken by
/// ascending index, plus the degree table it was built from.
pub struct DegreeOrder {
    pub order: Vec<u32>,
    pub degrees: Vec<u32>,
}

impl DegreeOrder {
    pub fn max_degree(&self) -> usize {
        self.order
            .first()
            .map(|&v| self.degrees[v as usize] as usize)
            .unwrap_or(0)
    }
}

pub fn order_by_degree(graph: &Graph) -> DegreeOrder {
    let n = graph.num_vertices();
    let degrees: Vec<u32> = (0..n)
        .into_par_iter()
        .map(|v| graph.degree(v).expect("vertex in range") as u32)
        .collect();

    let order = if n > BINNING_THRESHOLD {
        let max_degree = degrees.par_iter().copied().max().unwrap_or(0) as usize;
        let mut bins: Vec<Vec<u32>> = vec![Vec::new(); max_degree + 1];
        for v in 0..n {
            bins[degrees[v] as usize].push(v as u32);
        }
        // Emitting bins high to low keeps the ascending-index tie-break,
        // since each bin was filled in index order.
        let mut order = Vec::with_capacity(n);
        for bin in bins.iter().rev() {
            order.extend_from_slice(bin);
        }
        order
    } else {
        let mut order: Vec<u32> = (0..n as u32).collect();
        order.sort_unstable_by_key(|&v| (std::cmp::Reverse(degrees[v as usize]), v));
        order
    };

    DegreeOrder { order, degrees }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn star(n: usize) -> Graph {
        let mut b = GraphBuilder::new(n);
        for v in 1..n {
            b.add_edge(0, v).unwrap();
        }
        b.finish()
    }

    #[test]
    fn center_sorts_first() {
        let ord = order_by_degree(&star(6));
        assert_eq!(ord.order[0], 0);
        assert_eq!(ord.max_degree(), 5);
        // Leaves all tie at degree 1: ascending index.
        assert_eq!(&ord.order[1..], &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn binned_and_sorted_paths_agree() {
        // A graph big enough to take the binning path, mirrored at small
        // scale through the comparison path.
        let mut b = GraphBuilder::new(BINNING_THRESHOLD + 10);
        for v in 1..200usize {
            b.add_edge(0, v).unwrap();
        }
        for v in 300..350usize {
            b.add_edge(299, v).unwrap();
        }
        let g = b.finish();
        let ord = order_by_degree(&g);
        assert_eq!(ord.order[0], 0);
        assert_eq!(ord.order[1], 299);
        // Isolated vertices keep index order at the tail.
        let tail = ord.order[ord.order.len() - 2..].to_vec();
        assert!(tail[0] < tail[1]);
    }

    #[test]
    fn empty_graph() {
        let g = GraphBuilder::new(0).finish();
        let ord = order_by_degree(&g);
        assert!(ord.order.is_empty());
        assert_eq!(ord.max_degree(), 0);
    }
}
