//! Shard file emission.
//!
//! Each document batch and each index bucket becomes one addressable JSON
//! file. Files are written in parallel, one worker per file with no shared
//! mutable state; any failure is fatal and surfaces before the manifests are
//! ever touched.

use crate::config::BuildConfig;
use crate::shard::{DocumentShards, IndexShards};
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::fs::{create_dir_all, remove_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File counts for build reporting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Document batch files written.
    pub data_files: u64,
    /// Index bucket files written.
    pub index_files: u64,
}

/// Path of a document batch file: `<shard>/data/d_<batch>.json`.
pub fn data_file_path(config: &BuildConfig, shard: u32, batch: u64) -> PathBuf {
    config
        .output_dir
        .join(config.shard_dir_name(shard))
        .join("data")
        .join(format!("d_{batch}.json"))
}

/// Path of an index bucket file: `<shard>/index/<field>/<bucket>.json`, with
/// the field's dots flattened to underscores.
pub fn index_file_path(config: &BuildConfig, shard: u32, field: &str, bucket: &str) -> PathBuf {
    config
        .output_dir
        .join(config.shard_dir_name(shard))
        .join("index")
        .join(field.replace('.', "_"))
        .join(format!("{bucket}.json"))
}

/// Write every shard's data batches and index buckets.
///
/// Shard directories are cleared first: a build fully replaces the previous
/// artifact set, and a stale bucket file surviving under an active shard would
/// hand the front-end pointers into a build that no longer exists.
///
/// # Errors
/// Returns an error on the first directory or file that cannot be created or
/// written; the caller must not emit manifests after a failure here.
pub fn write_shards(
    config: &BuildConfig,
    documents: &DocumentShards,
    index: &IndexShards,
) -> Result<WriteStats> {
    for shard in documents.keys().chain(index.keys()) {
        let dir = config.output_dir.join(config.shard_dir_name(*shard));
        match remove_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("clear shard dir {}", dir.display()));
            }
        }
    }

    let data_tasks: Vec<_> = documents
        .iter()
        .flat_map(|(shard, batches)| {
            batches
                .iter()
                .map(move |(batch, docs)| (data_file_path(config, *shard, *batch), docs))
        })
        .collect();
    data_tasks
        .par_iter()
        .try_for_each(|(path, docs)| write_json(path, docs))?;

    let index_tasks: Vec<_> = index
        .iter()
        .flat_map(|(shard, fields)| {
            fields.iter().flat_map(move |(field, buckets)| {
                buckets
                    .iter()
                    .map(move |(bucket, keys)| (index_file_path(config, *shard, field, bucket), keys))
            })
        })
        .collect();
    index_tasks
        .par_iter()
        .try_for_each(|(path, keys)| write_json(path, keys))?;

    Ok(WriteStats {
        data_files: data_tasks.len() as u64,
        index_files: index_tasks.len() as u64,
    })
}

/// Serialize one value to one file, creating parent directories as needed.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value)
        .with_context(|| format!("serialize {}", path.display()))?;
    writer.flush()?;
    Ok(())
}
