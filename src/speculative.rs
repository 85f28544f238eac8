//! The speculative parallel coloring engine: a sequential pre-coloring pass
//! over the high-degree tail, an optimistic parallel assignment phase, and a
//! bounded conflict-detection / repair loop.
//!
//! The per-vertex commit is a linearizable read-modify-write on
//! `(color[v], max_color)`: a `compare_exchange` on `max_color` is the
//! synchronization point whenever the chosen color would extend the color
//! range, otherwise a single release store suffices because each vertex has
//! at most one committed writer per round.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use rayon::prelude::*;
use tracing::debug;

use crate::graph::Graph;
use crate::order::{order_by_degree, DegreeOrder};
use crate::UNCOLORED;

const MAX_RETRIES: usize = 8;
const MAX_RESOLUTION_ITERATIONS: usize = 3;
/// Headroom above the observed `max_color` when scanning neighbor colors,
/// covering colors created by concurrent commits.
const COLOR_SLACK: usize = 16;
/// Vertices above this degree go straight to the serialized path.
const CONTENTION_DEGREE: usize = 100;
const HIGH_DEGREE_MIN_THRESHOLD: usize = 50;
const BACKOFF_CAP_SPINS: usize = 1000;

#[derive(Clone, Debug)]
pub struct ColorConfig {
    /// Worker threads requested; the engine lowers this on small or very
    /// dense graphs.
    pub threads: usize,
    /// Conflict-repair rounds before the run is declared done.
    pub max_repair_rounds: usize,
    /// In the last repair round, hand still-conflicting vertices a fresh
    /// unique color each. Disabling this can leave the coloring invalid.
    pub safety_net: bool,
}

impl Default for ColorConfig {
    fn default() -> Self {
        ColorConfig {
            threads: std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1),
            max_repair_rounds: MAX_RESOLUTION_ITERATIONS,
            safety_net: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct ColorStats {
    pub threads: usize,
    pub precolored: usize,
    pub commits: usize,
    pub aborts: usize,
    pub serialized: usize,
    /// Conflict count observed at the start of each repair round.
    pub repair_rounds: Vec<usize>,
    /// Vertices resolved by the unique-color safety net.
    pub escaped: usize,
    /// `max_color` sampled after every phase; non-decreasing.
    pub max_color_trace: Vec<usize>,
}

struct Engine<'a> {
    graph: &'a Graph,
    degrees: &'a [u32],
    colors: Vec<AtomicUsize>,
    max_color: AtomicUsize,
    fallback: Mutex<()>,
    commits: AtomicUsize,
    aborts: AtomicUsize,
    serialized: AtomicUsize,
}

impl<'a> Engine<'a> {
    fn new(graph: &'a Graph, degrees: &'a [u32]) -> Self {
        let n = graph.num_vertices();
        Engine {
            graph,
            degrees,
            colors: (0..n).map(|_| AtomicUsize::new(UNCOLORED)).collect(),
            max_color: AtomicUsize::new(0),
            fallback: Mutex::new(()),
            commits: AtomicUsize::new(0),
            aborts: AtomicUsize::new(0),
            serialized: AtomicUsize::new(0),
        }
    }

    /// Smallest color in `0..bound` not held by a neighbor of `v`, or
    /// `bound` itself when every slot is taken.
    fn smallest_available(&self, v: usize, bound: usize) -> usize {
        let mut forbidden = vec![false; bound];
        for &u in self.graph.neighbors(v).expect("vertex in range") {
            let c = self.colors[u as usize].load(Ordering::Relaxed);
            if c < bound {
                forbidden[c] = true;
            }
        }
        forbidden.iter().position(|&b| !b).unwrap_or(bound)
    }

    /// Sequentially colors the high-degree prefix of `order` and seeds
    /// `max_color`. Returns how many vertices were taken.
    fn precolor(&self, order: &[u32]) -> usize {
        let threshold = HIGH_DEGREE_MIN_THRESHOLD.max(self.graph.num_vertices() / 100);
        let mut current_max = 0;
        let mut count = 0;
        for &v in order {
            let v = v as usize;
            if self.degrees[v] as usize <= threshold {
                break;
            }
            // The +1 slot is always free: only `current_max` colors exist.
            let c = self.smallest_available(v, current_max + 1);
            self.colors[v].store(c, Ordering::Relaxed);
            current_max = current_max.max(c + 1);
            count += 1;
        }
        self.max_color.store(current_max, Ordering::Release);
        count
    }

    /// One speculative commit attempt loop for `v`; always leaves `v`
    /// colored. High-degree vertices and exhausted retries take the
    /// serialized path.
    fn commit(&self, v: usize) {
        if self.degrees[v] as usize > CONTENTION_DEGREE {
            self.commit_serialized(v);
            return;
        }

        let mut retries = 0;
        loop {
            let current_max = self.max_color.load(Ordering::Acquire);
            let c = self.smallest_available(v, current_max + COLOR_SLACK);
            if c < current_max {
                self.colors[v].store(c, Ordering::Release);
                self.commits.fetch_add(1, Ordering::Relaxed);
                return;
            }
            match self.max_color.compare_exchange(
                current_max,
                c + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.colors[v].store(c, Ordering::Release);
                    self.commits.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                Err(_) => {
                    self.aborts.fetch_add(1, Ordering::Relaxed);
                    retries += 1;
                    if retries >= MAX_RETRIES {
                        self.commit_serialized(v);
                        return;
                    }
                    backoff(retries);
                }
            }
        }
    }

    /// The same steps under a process-wide lock. `fetch_max` keeps
    /// `max_color` monotone against concurrent CAS commits.
    fn commit_serialized(&self, v: usize) {
        let _guard = self.fallback.lock().unwrap();
        let current_max = self.max_color.load(Ordering::Acquire);
        let c = self.smallest_available(v, current_max + COLOR_SLACK);
        if c >= current_max {
            self.max_color.fetch_max(c + 1, Ordering::AcqRel);
        }
        self.colors[v].store(c, Ordering::Release);
        self.serialized.fetch_add(1, Ordering::Relaxed);
    }

    fn speculate(&self, rest: &[u32], chunk: usize) {
        rest.par_chunks(chunk).for_each(|block| {
            for &v in block {
                let v = v as usize;
                if self.colors[v].load(Ordering::Relaxed) != UNCOLORED {
                    continue;
                }
                self.commit(v);
            }
        });
    }

    /// Marks one endpoint of every monochromatic edge: smaller degree
    /// loses, ties go to the larger index. Returns the flagged count.
    /// Flag writes are idempotent, so racing marks from both endpoints of
    /// neighboring conflicts are harmless.
    fn detect(&self, flags: &[AtomicBool]) -> usize {
        (0..self.graph.num_vertices())
            .into_par_iter()
            .for_each(|v| {
                let cv = self.colors[v].load(Ordering::Relaxed);
                for &u in self.graph.neighbors(v).expect("vertex in range") {
                    let u = u as usize;
                    if u <= v {
                        continue;
                    }
                    if self.colors[u].load(Ordering::Relaxed) == cv {
                        let loser = if self.degrees[v] < self.degrees[u] { v } else { u };
                        flags[loser].store(true, Ordering::Relaxed);
                    }
                }
            });
        flags
            .par_iter()
            .filter(|f| f.load(Ordering::Relaxed))
            .count()
    }
}

fn backoff(retries: usize) {
    let spins = (10usize << retries.min(10)).min(BACKOFF_CAP_SPINS);
    for _ in 0..spins {
        std::hint::spin_loop();
    }
}

fn effective_threads(requested: usize, n: usize, max_degree: usize) -> usize {
    let requested = requested.max(1);
    if n < 1000 {
        requested.min(2)
    } else if n > 10_000 && max_degree > 1000 {
        (requested / 2).max(1)
    } else {
        requested
    }
}

fn chunk_size(n: usize, threads: usize) -> usize {
    let per = threads * 16;
    ((n + per - 1) / per).max(32)
}

/// Runs the full pipeline: ordering, pre-coloring, speculative assignment,
/// and conflict repair. The returned coloring is proper whenever the safety
/// net is enabled; `check_coloring` is still the authority.
pub fn color_speculative(graph: &Graph, cfg: &ColorConfig) -> (Vec<usize>, ColorStats) {
    let n = graph.num_vertices();
    let ord: DegreeOrder = order_by_degree(graph);
    let threads = effective_threads(cfg.threads, n, ord.max_degree());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .expect("building worker pool");

    let engine = Engine::new(graph, &ord.degrees);
    let mut stats = ColorStats {
        threads,
        ..ColorStats::default()
    };

    stats.precolored = engine.precolor(&ord.order);
    stats
        .max_color_trace
        .push(engine.max_color.load(Ordering::Relaxed));

    let chunk = chunk_size(n, threads);
    pool.install(|| engine.speculate(&ord.order[stats.precolored..], chunk));
    stats
        .max_color_trace
        .push(engine.max_color.load(Ordering::Relaxed));

    let flags: Vec<AtomicBool> = (0..n).map(|_| AtomicBool::new(false)).collect();
    pool.install(|| {
        for round in 0..cfg.max_repair_rounds {
            flags
                .par_iter()
                .for_each(|f| f.store(false, Ordering::Relaxed));
            let conflicts = engine.detect(&flags);
            if conflicts == 0 {
                break;
            }
            stats.repair_rounds.push(conflicts);
            debug!(round, conflicts, "repairing conflicts");

            let last_round = round + 1 == cfg.max_repair_rounds;
            if last_round && cfg.safety_net {
                // Unique colors for whatever is left; terminates the run
                // with a proper coloring at the cost of extra colors.
                (0..n)
                    .into_par_iter()
                    .filter(|&v| flags[v].load(Ordering::Relaxed))
                    .for_each(|v| {
                        let fresh = engine.max_color.fetch_add(1, Ordering::Relaxed);
                        engine.colors[v].store(fresh, Ordering::Relaxed);
                    });
                stats.escaped = conflicts;
            } else {
                (0..n)
                    .into_par_iter()
                    .filter(|&v| flags[v].load(Ordering::Relaxed))
                    .for_each(|v| engine.commit(v));
            }
            stats
                .max_color_trace
                .push(engine.max_color.load(Ordering::Relaxed));
        }
    });

    stats.commits = engine.commits.into_inner();
    stats.aborts = engine.aborts.into_inner();
    stats.serialized = engine.serialized.into_inner();

    // Unwrapping the atomics compiles to a no-op.
    let colors = engine
        .colors
        .into_iter()
        .map(AtomicUsize::into_inner)
        .collect();
    (colors, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::verify::{check_coloring, count_colors};

    fn cfg(threads: usize) -> ColorConfig {
        ColorConfig {
            threads,
            ..ColorConfig::default()
        }
    }

    fn complete(n: usize) -> Graph {
        let mut b = GraphBuilder::new(n);
        for u in 0..n {
            for v in u + 1..n {
                b.add_edge(u, v).unwrap();
            }
        }
        b.finish()
    }

    #[test]
    fn complete_graph_uses_exactly_n_colors() {
        let g = complete(5);
        let (colors, _) = color_speculative(&g, &cfg(4));
        check_coloring(&g, &colors).unwrap();
        assert_eq!(count_colors(&colors), 5);
    }

    #[test]
    fn max_color_trace_is_monotone() {
        let g = complete(20);
        let (_, stats) = color_speculative(&g, &cfg(4));
        assert!(stats.max_color_trace.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn high_degree_tail_is_precolored() {
        // Star with 60 leaves: the center's degree exceeds the threshold.
        let mut b = GraphBuilder::new(61);
        for v in 1..61 {
            b.add_edge(0, v).unwrap();
        }
        let g = b.finish();
        let (colors, stats) = color_speculative(&g, &cfg(2));
        assert_eq!(stats.precolored, 1);
        check_coloring(&g, &colors).unwrap();
        assert_eq!(count_colors(&colors), 2);
    }

    #[test]
    fn safety_net_disabled_respects_delta_plus_one() {
        let g = complete(8);
        let mut c = cfg(4);
        c.safety_net = false;
        let (colors, _) = color_speculative(&g, &c);
        // Every color comes from a mex over at most delta neighbors.
        assert!(count_colors(&colors) <= 8);
    }

    #[test]
    fn thread_policy_caps_small_graphs() {
        assert_eq!(effective_threads(8, 500, 10), 2);
        assert_eq!(effective_threads(8, 20_000, 2_000), 4);
        assert_eq!(effective_threads(8, 20_000, 50), 8);
        assert_eq!(effective_threads(0, 5, 1), 1);
    }

    #[test]
    fn chunks_never_shrink_below_floor() {
        assert_eq!(chunk_size(5, 8), 32);
        assert_eq!(chunk_size(1_000_000, 4), 15_625);
    }
}
