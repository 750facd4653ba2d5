//! Shard, batch, and bucket partitioning.
//!
//! Every placement below is a pure function of the internal id (or token) and
//! the build configuration, never of processing order: the search front-end
//! recomputes the same functions to locate a document or index bucket without
//! consulting anything but the manifest.
//!
//! Grouping uses ordered maps at every level so serialization walks keys in
//! sorted order and rebuilds of identical input produce byte-identical files.

use crate::config::BuildConfig;
use crate::document::{Document, IndexEntry, RichPointer};
use std::collections::BTreeMap;

/// Bucket receiving tokens shorter than the configured prefix length.
pub const FALLBACK_BUCKET: &str = "_";

/// Documents of one shard, grouped into batches: batch number → ordered docs.
pub type ShardBatches = BTreeMap<u64, Vec<Document>>;

/// All document shards: 1-based shard number → batches.
pub type DocumentShards = BTreeMap<u32, ShardBatches>;

/// Index entries of one shard: field → bucket → key → pointers.
pub type ShardIndex = BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<RichPointer>>>>;

/// All index shards: 1-based shard number → per-field buckets.
pub type IndexShards = BTreeMap<u32, ShardIndex>;

/// 1-based shard number holding an internal id.
pub fn shard_of(internal_id: u64, shard_capacity: usize) -> u32 {
    (internal_id / shard_capacity as u64) as u32 + 1
}

/// Batch file number of an internal id within its shard.
pub fn batch_of(internal_id: u64, shard_capacity: usize, docs_per_batch: usize) -> u64 {
    (internal_id % shard_capacity as u64) / docs_per_batch as u64
}

/// Bucket key for an index key: its first `prefix_length` characters, or the
/// fallback bucket for shorter keys.
///
/// Computed on characters, not bytes, so multi-byte keyword values cannot
/// split a code point. The result is sanitized into its file-system form here
/// rather than at write time: sanitizing later would let two distinct buckets
/// collide on one file name and silently overwrite each other.
pub fn prefix_bucket(key: &str, prefix_length: usize) -> String {
    let prefix: String = key.chars().take(prefix_length).collect();
    if prefix.chars().count() < prefix_length {
        return FALLBACK_BUCKET.to_string();
    }
    prefix
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Group documents by shard and batch.
///
/// Input is consumed in internal-id order, so each batch's document vector is
/// ordered by id without an explicit sort.
pub fn partition_documents(documents: Vec<Document>, config: &BuildConfig) -> DocumentShards {
    let mut shards = DocumentShards::new();
    for document in documents {
        let shard = shard_of(document.internal_id, config.shard_capacity);
        let batch = batch_of(
            document.internal_id,
            config.shard_capacity,
            config.docs_per_batch,
        );
        shards
            .entry(shard)
            .or_default()
            .entry(batch)
            .or_default()
            .push(document);
    }
    shards
}

/// Group index entries by their owning document's shard, then field, bucket,
/// and key.
///
/// An entry lands in the same shard as the document it points to. Pointer
/// lists keep their arrival order, which is internal-id order when entries
/// come out of the transform stage.
pub fn partition_entries(
    entries: impl IntoIterator<Item = IndexEntry>,
    config: &BuildConfig,
) -> IndexShards {
    let mut shards = IndexShards::new();
    for entry in entries {
        let shard = shard_of(entry.pointer.id, config.shard_capacity);
        let bucket = prefix_bucket(&entry.key, config.prefix_length);
        shards
            .entry(shard)
            .or_default()
            .entry(entry.field)
            .or_default()
            .entry(bucket)
            .or_default()
            .entry(entry.key)
            .or_default()
            .push(entry.pointer);
    }
    shards
}
