//! Result-file output: a commented header followed by one
//! `<vertex_id> <color>` line per vertex in ascending order.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::error::{ChromaticError, Result};
use crate::verify::count_colors;

pub fn write_result_file(path: &Path, colors: &[usize], elapsed: Duration) -> Result<()> {
    write_inner(path, colors, elapsed).map_err(|source| ChromaticError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_inner(path: &Path, colors: &[usize], elapsed: Duration) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "# Graph coloring results")?;
    writeln!(out, "# Elapsed: {} seconds", elapsed.as_secs_f64())?;
    writeln!(out, "# Vertices: {}", colors.len())?;
    writeln!(out, "# Colors used: {}", count_colors(colors))?;
    writeln!(out, "# Format: vertex_id color")?;
    for (v, c) in colors.iter().enumerate() {
        writeln!(out, "{} {}", v, c)?;
    }
    out.flush()
}
