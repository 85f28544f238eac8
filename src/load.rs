//! Text-file graph loaders.
//!
//! Two dialects are accepted: plain edge lists with arbitrary node labels
//! (remapped densely in first-appearance order) and header-prefixed files
//! whose first data line carries the vertex count. Malformed lines are
//! skipped with a warning; only an unreadable file is fatal.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use tracing::warn;

use crate::error::{ChromaticError, Result};
use crate::graph::{Graph, GraphBuilder};

/// Edges accepted before the rest of the input is dropped.
const MAX_EDGES: usize = 100_000_000;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputFormat {
    /// Header dialect when the first data line holds a single token,
    /// edge-list otherwise.
    Auto,
    EdgeList,
    Header,
}

pub fn load_graph(path: &Path, format: InputFormat) -> Result<Graph> {
    load_graph_capped(path, format, MAX_EDGES)
}

fn load_graph_capped(path: &Path, format: InputFormat, cap: usize) -> Result<Graph> {
    let file = File::open(path).map_err(|source| ChromaticError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut lines = BufReader::new(file).lines();

    let Some(first) = next_data_line(&mut lines) else {
        return Ok(GraphBuilder::new(0).finish());
    };

    let format = match format {
        InputFormat::Auto => {
            if first.split_whitespace().count() == 1 {
                InputFormat::Header
            } else {
                InputFormat::EdgeList
            }
        }
        other => other,
    };

    match format {
        InputFormat::Header => load_header(first, lines, cap),
        _ => load_edge_list(first, lines, cap),
    }
}

fn next_data_line(lines: &mut Lines<BufReader<File>>) -> Option<String> {
    for line in lines {
        let line = line.ok()?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('%') {
            continue;
        }
        return Some(line);
    }
    None
}

fn parse_pair(line: &str) -> Option<(u64, u64)> {
    let mut it = line.split_whitespace();
    let u = it.next()?.parse().ok()?;
    let v = it.next()?.parse().ok()?;
    Some((u, v))
}

/// Arbitrary labels, remapped to `0..n` in first-appearance order.
fn load_edge_list(
    first: String,
    lines: Lines<BufReader<File>>,
    cap: usize,
) -> Result<Graph> {
    let mut index: HashMap<u64, u32> = HashMap::new();
    let mut edges: Vec<(u32, u32)> = Vec::new();
    let mut truncated = false;

    let data = std::iter::once(Ok(first)).chain(lines);
    for line in data {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('%') {
            continue;
        }
        let Some((a, b)) = parse_pair(trimmed) else {
            warn!(line = trimmed, "skipping malformed edge line");
            continue;
        };
        if edges.len() == cap {
            truncated = true;
            break;
        }
        let next = index.len() as u32;
        let u = *index.entry(a).or_insert(next);
        let next = index.len() as u32;
        let v = *index.entry(b).or_insert(next);
        edges.push((u, v));
    }

    if truncated {
        warn!(cap, "edge cap reached, dropping the rest of the input");
    }

    build(index.len(), &edges)
}

/// First data line is `N` (or `N M`); edge endpoints lie in `[0, N)`, or in
/// `[1, N]` for 1-indexed files, detected edge by edge.
fn load_header(first: String, lines: Lines<BufReader<File>>, cap: usize) -> Result<Graph> {
    let n: usize = match first.split_whitespace().next().and_then(|t| t.parse().ok()) {
        Some(n) => n,
        None => {
            warn!(line = first.trim(), "unparseable header, using empty graph");
            return Ok(GraphBuilder::new(1).finish());
        }
    };

    let mut edges: Vec<(u32, u32)> = Vec::new();
    let mut truncated = false;
    for line in lines {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('%') {
            continue;
        }
        let Some((mut u, mut v)) = parse_pair(trimmed) else {
            warn!(line = trimmed, "skipping malformed edge line");
            continue;
        };
        if u >= 1 && v >= 1 && u <= n as u64 && v <= n as u64 {
            u -= 1;
            v -= 1;
        }
        if u >= n as u64 || v >= n as u64 {
            warn!(line = trimmed, "skipping out-of-range edge");
            continue;
        }
        if edges.len() == cap {
            truncated = true;
            break;
        }
        edges.push((u as u32, v as u32));
    }

    if truncated {
        warn!(cap, "edge cap reached, dropping the rest of the input");
    }

    build(n, &edges)
}

fn build(n: usize, edges: &[(u32, u32)]) -> Result<Graph> {
    let mut builder = GraphBuilder::with_estimate(n, edges.len());
    for &(u, v) in edges {
        builder.add_edge(u as usize, v as usize)?;
    }
    if builder.self_loops() > 0 {
        warn!(count = builder.self_loops(), "dropped self-loops");
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_input(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn edge_list_remaps_labels() {
        let f = write_input("# comment\n% also a comment\n100 200\n200 300\n");
        let g = load_graph(f.path(), InputFormat::Auto).unwrap();
        assert_eq!(g.num_vertices(), 3);
        assert_eq!(g.num_edges(), 2);
        assert_eq!(g.neighbors(1).unwrap(), &[0, 2]);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let f = write_input("0 1\nnot an edge\n-3 4\n1 2\n");
        let g = load_graph(f.path(), InputFormat::EdgeList).unwrap();
        assert_eq!(g.num_vertices(), 3);
        assert_eq!(g.num_edges(), 2);
    }

    #[test]
    fn self_loops_and_duplicates_collapse() {
        let f = write_input("7 7\n7 8\n8 7\n");
        let g = load_graph(f.path(), InputFormat::EdgeList).unwrap();
        assert_eq!(g.num_vertices(), 2);
        assert_eq!(g.num_edges(), 1);
    }

    #[test]
    fn header_dialect_zero_indexed() {
        let f = write_input("4\n0 1\n0 2\n");
        let g = load_graph(f.path(), InputFormat::Auto).unwrap();
        assert_eq!(g.num_vertices(), 4);
        assert_eq!(g.num_edges(), 2);
        assert_eq!(g.neighbors(0).unwrap(), &[1, 2]);
    }

    #[test]
    fn header_dialect_one_indexed_adjusts() {
        let f = write_input("3\n1 2\n2 3\n");
        let g = load_graph(f.path(), InputFormat::Header).unwrap();
        assert_eq!(g.num_edges(), 2);
        assert_eq!(g.neighbors(1).unwrap(), &[0, 2]);
    }

    #[test]
    fn header_with_edge_count_token() {
        let f = write_input("4 2\n0 1\n2 3\n");
        let g = load_graph(f.path(), InputFormat::Header).unwrap();
        assert_eq!(g.num_vertices(), 4);
        assert_eq!(g.num_edges(), 2);
    }

    #[test]
    fn broken_header_falls_back_to_trivial_graph() {
        let f = write_input("sideways\n0 1\n");
        let g = load_graph(f.path(), InputFormat::Header).unwrap();
        assert_eq!(g.num_vertices(), 1);
        assert_eq!(g.num_edges(), 0);
    }

    #[test]
    fn empty_input_is_an_empty_graph() {
        let f = write_input("# nothing here\n");
        let g = load_graph(f.path(), InputFormat::Auto).unwrap();
        assert_eq!(g.num_vertices(), 0);
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = load_graph(Path::new("/no/such/file"), InputFormat::Auto).unwrap_err();
        assert!(matches!(err, ChromaticError::Io { .. }));
    }

    #[test]
    fn edge_cap_truncates() {
        let f = write_input("0 1\n1 2\n2 3\n3 4\n");
        let g = load_graph_capped(f.path(), InputFormat::EdgeList, 2).unwrap();
        assert_eq!(g.num_edges(), 2);
    }
}
