use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use chromatic::gen::{path_graph, random_graph};
use chromatic::greedy::color_greedy;
use chromatic::load::{load_graph, InputFormat};
use chromatic::report::write_result_file;
use chromatic::{check_coloring, color_speculative, count_colors, ColorConfig, Graph};

#[derive(Parser)]
#[command(author, version, about = "Speculative parallel graph coloring", long_about = None)]
struct Cli {
    /// Input graph file
    graph_file: Option<PathBuf>,

    /// Worker thread count (defaults to RAYON_NUM_THREADS, then all cores)
    num_threads: Option<usize>,

    #[command(flatten)]
    source: SourceArgs,

    /// Run the sequential greedy baseline instead of the parallel engine
    #[arg(long)]
    seq: bool,

    /// Coloring algorithm
    #[arg(long, default_value_t = ColorAlg::Speculative)]
    alg: ColorAlg,

    /// Input dialect
    #[arg(long, value_enum, default_value_t = FormatArg::Auto)]
    format: FormatArg,

    /// Write the coloring to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct SourceArgs {
    /// Alternate way to pass the input file
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Color a random graph instead of loading one
    #[arg(long, requires = "vertices", conflicts_with = "file")]
    random_graph: bool,

    /// Color a path graph instead of loading one
    #[arg(long, requires = "vertices", conflicts_with_all = ["file", "random_graph"])]
    path_graph: bool,

    /// Number of vertices for generated graphs
    #[arg(long, default_value_t = 0)]
    vertices: usize,

    /// Average number of edges per vertex for generated graphs
    #[arg(long, default_value_t = 4)]
    edges: usize,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum FormatArg {
    Auto,
    EdgeList,
    Header,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum ColorAlg {
    Speculative,
    Sequential,
}

impl std::fmt::Display for ColorAlg {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ColorAlg::Speculative => write!(f, "speculative"),
            ColorAlg::Sequential => write!(f, "sequential"),
        }
    }
}

impl From<FormatArg> for InputFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Auto => InputFormat::Auto,
            FormatArg::EdgeList => InputFormat::EdgeList,
            FormatArg::Header => InputFormat::Header,
        }
    }
}

fn build_graph(args: &Cli) -> Result<Graph> {
    if args.source.random_graph {
        Ok(random_graph(args.source.vertices, args.source.edges))
    } else if args.source.path_graph {
        Ok(path_graph(args.source.vertices))
    } else {
        let path = args
            .graph_file
            .as_ref()
            .or(args.source.file.as_ref())
            .context("no input graph: pass a file or a generator flag")?;
        Ok(load_graph(path, args.format.into())?)
    }
}

fn requested_threads(args: &Cli) -> usize {
    args.num_threads
        .or_else(|| {
            std::env::var("RAYON_NUM_THREADS")
                .ok()
                .and_then(|s| s.parse().ok())
        })
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1)
        })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Cli::parse();

    let graph = build_graph(&args)?;
    println!(
        "Loaded graph: {} vertices, {} edges",
        graph.num_vertices(),
        graph.num_edges()
    );

    let start = Instant::now();
    let sequential = args.seq || args.alg == ColorAlg::Sequential;
    let (colors, stats) = if sequential {
        println!("Running sequential greedy coloring");
        (color_greedy(&graph), None)
    } else {
        let cfg = ColorConfig {
            threads: requested_threads(&args),
            ..ColorConfig::default()
        };
        let (colors, stats) = color_speculative(&graph, &cfg);
        (colors, Some(stats))
    };
    let elapsed = start.elapsed();

    if let Some(stats) = &stats {
        println!("Using {} threads", stats.threads);
        println!("Pre-colored {} high-degree vertices", stats.precolored);
        println!(
            "Speculative phase: {} commits, {} aborts, {} serialized",
            stats.commits, stats.aborts, stats.serialized
        );
        for (round, conflicts) in stats.repair_rounds.iter().enumerate() {
            println!("Repair round {}: {} conflicts", round + 1, conflicts);
        }
        if stats.escaped > 0 {
            println!("Safety net recolored {} vertices", stats.escaped);
        }
    }

    println!("Coloring completed in {} seconds", elapsed.as_secs_f64());
    println!("Used {} colors", count_colors(&colors));

    if let Some(path) = &args.output {
        write_result_file(path, &colors, elapsed)?;
        println!("Coloring written to {}", path.display());
    }

    match check_coloring(&graph, &colors) {
        Ok(()) => {
            println!("Coloring is valid");
            Ok(())
        }
        Err(err) => {
            println!("Coloring is INVALID");
            Err(err.into())
        }
    }
}
