//! End-to-end build orchestration.
//!
//! A build is an atomic batch job: load → deduplicate → transform → partition
//! → write shards → write manifests. Internal ids are fixed by enumerating the
//! deduplicated set *before* the parallel transform is dispatched, so worker
//! scheduling can never influence id assignment or output order. Re-running
//! the whole build is the recovery mechanism for any failure.

use crate::config::BuildConfig;
use crate::dedup::dedup_records;
use crate::document::{transform, Document, IndexEntry};
use crate::manifest::{build_manifest, numeric_catalog, sort_index, write_manifests};
use crate::record::{load_records, RawRecord};
use crate::shard::{partition_documents, partition_entries};
use crate::tokenize::Tokenizer;
use crate::writer::write_shards;
use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

/// Counters from one completed build.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct BuildSummary {
    /// Non-blank input lines seen.
    pub lines: u64,
    /// Lines admitted as raw records.
    pub admitted: u64,
    /// Lines skipped as inadmissible.
    pub rejected: u64,
    /// Admitted records dropped as duplicates of a better record.
    pub duplicates: u64,
    /// Canonical documents in the build.
    pub documents: u64,
    /// Index entries across all fields.
    pub index_entries: u64,
    /// Shards in the build.
    pub shards: u32,
    /// Document batch files written.
    pub data_files: u64,
    /// Index bucket files written.
    pub index_files: u64,
    /// Wall-clock build time in milliseconds.
    pub elapsed_ms: u64,
}

/// Run one full index build.
///
/// # Errors
/// Returns an error on invalid configuration, unreadable input, any shard file
/// that cannot be written, or a numeric field holding a non-numeric value.
/// Inadmissible input lines are skipped and counted, never an error.
pub fn run_build(config: &BuildConfig) -> Result<BuildSummary> {
    let started = Instant::now();
    config.validate()?;

    if let Some(workers) = config.workers {
        // A process gets one global pool; repeated builds (tests, daemons)
        // keep the first one.
        rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .build_global()
            .ok();
    }

    info!(input = %config.input, "loading raw records");
    let (records, load_stats) = load_records(&config.input)?;
    info!(
        lines = load_stats.lines,
        admitted = load_stats.admitted,
        rejected = load_stats.rejected,
        "parsed input"
    );

    let unique = dedup_records(records);
    let duplicates = load_stats.admitted - unique.len() as u64;
    info!(documents = unique.len(), duplicates, "deduplicated");
    if unique.is_empty() {
        warn!("no admissible records; writing an empty build");
    }

    // Ids are assigned here, in the deduplicated set's stable order. Workers
    // receive pre-assigned pairs and rayon's collect keeps their order.
    let work: Vec<(u64, RawRecord)> = unique
        .into_iter()
        .enumerate()
        .map(|(i, record)| (i as u64, record))
        .collect();
    let sort_keys: Vec<(u64, i64)> = work
        .iter()
        .map(|(id, record)| (*id, record.member_count))
        .collect();

    let tokenizer = Tokenizer::new(config.schema.stop_words.clone());
    let transformed: Vec<(Document, Vec<IndexEntry>)> = work
        .par_iter()
        .map(|(id, record)| transform(*id, record, &config.schema, &tokenizer))
        .collect();
    drop(work);

    let mut documents = Vec::with_capacity(transformed.len());
    let mut entries = Vec::new();
    for (document, doc_entries) in transformed {
        documents.push(document);
        entries.extend(doc_entries);
    }
    let total_documents = documents.len() as u64;
    let total_entries = entries.len() as u64;
    info!(entries = total_entries, "transformed documents");

    let document_shards = partition_documents(documents, config);
    let index_shards = partition_entries(entries, config);

    let write_stats = write_shards(config, &document_shards, &index_shards)?;
    info!(
        data_files = write_stats.data_files,
        index_files = write_stats.index_files,
        "wrote shard files"
    );

    // Manifests are last: the catalog can still fail the build, and until all
    // three land no reader sees the new dataset.
    let catalog = numeric_catalog(&index_shards, &config.schema.numeric)?;
    let sorted_ids = sort_index(sort_keys);
    let manifest = build_manifest(config, total_documents);
    write_manifests(config, &manifest, &catalog, &sorted_ids)?;
    info!(
        total_servers = manifest.total_servers,
        total_shards = manifest.total_shards,
        "build complete"
    );

    Ok(BuildSummary {
        lines: load_stats.lines,
        admitted: load_stats.admitted,
        rejected: load_stats.rejected,
        duplicates,
        documents: total_documents,
        index_entries: total_entries,
        shards: manifest.total_shards,
        data_files: write_stats.data_files,
        index_files: write_stats.index_files,
        elapsed_ms: started.elapsed().as_millis() as u64,
    })
}
