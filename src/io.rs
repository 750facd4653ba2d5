//! Input plumbing: glob expansion and transparently decompressed readers.
//!
//! Crawlers append to dated log files (`servers-2026-07.jsonl.gz`), so a build
//! takes a glob pattern rather than a single path. Expansion is sorted so the
//! file processing order is deterministic, and every file is opened through
//! codec auto-detection so compressed and plain logs are interchangeable.

pub mod compression;

use anyhow::{bail, Context, Result};
use glob::glob;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Expand an input pattern into a sorted list of existing files.
///
/// A pattern without glob metacharacters still works as a plain path. Matching
/// directories are ignored.
///
/// # Errors
/// Returns an error if the pattern is invalid, a match cannot be read, or no
/// file matches: a build over zero input files is always a misconfiguration.
pub fn expand_inputs(pattern: &str) -> Result<Vec<PathBuf>> {
    let matches = glob(pattern).with_context(|| format!("invalid input pattern: {pattern}"))?;

    let mut files = Vec::new();
    for entry in matches {
        let path = entry.with_context(|| format!("read glob entry for pattern: {pattern}"))?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        bail!("no input files match pattern: {pattern}");
    }
    Ok(files)
}

/// Open one input file as a buffered line reader, decompressing if needed.
///
/// # Errors
/// Returns an error if the file cannot be opened or a codec fails to
/// initialize.
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = compression::decode_reader(file, path)
        .with_context(|| format!("setup decompression for {}", path.display()))?;
    Ok(Box::new(BufReader::new(reader)))
}
