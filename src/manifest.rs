//! Global manifests: sort index, numeric catalog, and the build manifest.
//!
//! These three files are the front-end's entry points: they describe the
//! dataset's shape without requiring a scan of it. They are written last, so a
//! failed build can never leave an authoritative manifest pointing at shard
//! files that were never written.

use crate::config::BuildConfig;
use crate::shard::IndexShards;
use crate::writer::write_json;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};

/// File name of the global sort index.
pub const SORT_INDEX_FILE: &str = "all_servers_sorted_by_members.json";

/// File name of the numeric value catalog.
pub const NUMERIC_CATALOG_FILE: &str = "numeric_manifest.json";

/// File name of the build manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Internal-id range held by one shard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardRange {
    /// 1-based shard number.
    pub shard_number: u32,
    /// First internal id in the shard.
    pub start_id: u64,
    /// Last internal id in the shard (inclusive).
    pub end_id: u64,
}

/// The global build descriptor.
///
/// `data_shard_map` lets a client compute which shard holds a given internal
/// id without touching the index; `base_url` and `shard_dir_template` resolve
/// a shard number to a retrievable location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildManifest {
    /// Build timestamp, UTC.
    pub last_updated: String,
    /// Total canonical documents in this build.
    pub total_servers: u64,
    /// Total shards in this build.
    pub total_shards: u32,
    /// Documents per shard.
    pub servers_per_shard: u64,
    /// Documents per batch file.
    pub docs_per_file: u64,
    /// Base URL under which shard directories are hosted.
    pub base_url: String,
    /// Shard directory template; `{}` is the 1-based shard number.
    pub shard_dir_template: String,
    /// Per-shard id ranges.
    pub data_shard_map: Vec<ShardRange>,
}

/// Sorted distinct integer values per numeric field.
pub type NumericCatalog = BTreeMap<String, Vec<i64>>;

/// Compute the per-shard id-range table for a document count.
pub fn shard_map(total_documents: u64, shard_capacity: usize) -> Vec<ShardRange> {
    let capacity = shard_capacity as u64;
    let shards = total_documents.div_ceil(capacity);
    (0..shards)
        .map(|i| ShardRange {
            shard_number: i as u32 + 1,
            start_id: i * capacity,
            end_id: ((i + 1) * capacity).min(total_documents) - 1,
        })
        .collect()
}

/// Assemble the build manifest, stamped with the current UTC time.
pub fn build_manifest(config: &BuildConfig, total_documents: u64) -> BuildManifest {
    let data_shard_map = shard_map(total_documents, config.shard_capacity);
    BuildManifest {
        last_updated: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        total_servers: total_documents,
        total_shards: data_shard_map.len() as u32,
        servers_per_shard: config.shard_capacity as u64,
        docs_per_file: config.docs_per_batch as u64,
        base_url: config.base_url.clone(),
        shard_dir_template: config.shard_dir_template.clone(),
        data_shard_map,
    }
}

/// Order all internal ids by member count descending, ids ascending on ties.
///
/// This is the front-end's default result ordering; it is global, not sharded.
pub fn sort_index(sort_keys: impl IntoIterator<Item = (u64, i64)>) -> Vec<u64> {
    let mut keys: Vec<(u64, i64)> = sort_keys.into_iter().collect();
    keys.sort_by(|(id_a, mc_a), (id_b, mc_b)| mc_b.cmp(mc_a).then(id_a.cmp(id_b)));
    keys.into_iter().map(|(id, _)| id).collect()
}

/// Collect the sorted distinct integer values of every numeric field across
/// all shards.
///
/// # Errors
/// A stored value that does not parse as an integer is a hard error naming the
/// field, the value, and a document carrying it: the catalog drives client
/// range queries, and silently dropping a value would corrupt them.
pub fn numeric_catalog(index: &IndexShards, numeric_fields: &[String]) -> Result<NumericCatalog> {
    let mut catalog = NumericCatalog::new();
    for field in numeric_fields {
        let mut values = BTreeSet::new();
        for shard_index in index.values() {
            let Some(buckets) = shard_index.get(field) else {
                continue;
            };
            for keys in buckets.values() {
                for (key, pointers) in keys {
                    let value: i64 = match key.parse() {
                        Ok(v) => v,
                        Err(_) => {
                            let document = pointers.first().map_or(0, |p| p.id);
                            bail!(
                                "numeric field {field:?} holds non-numeric value {key:?} \
                                 (document {document})"
                            );
                        }
                    };
                    values.insert(value);
                }
            }
        }
        catalog.insert(field.clone(), values.into_iter().collect());
    }
    Ok(catalog)
}

/// Write the three global manifest files at the output root.
///
/// The build manifest is pretty-printed; it is the one artifact operators
/// read by hand.
///
/// # Errors
/// Returns an error if any file cannot be created or written.
pub fn write_manifests(
    config: &BuildConfig,
    manifest: &BuildManifest,
    catalog: &NumericCatalog,
    sorted_ids: &[u64],
) -> Result<()> {
    create_dir_all(&config.output_dir)
        .with_context(|| format!("mkdir -p {}", config.output_dir.display()))?;

    write_json(&config.output_dir.join(SORT_INDEX_FILE), sorted_ids)?;
    write_json(&config.output_dir.join(NUMERIC_CATALOG_FILE), catalog)?;

    let path = config.output_dir.join(MANIFEST_FILE);
    let file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, manifest)
        .with_context(|| format!("serialize {}", path.display()))?;
    writer.flush()?;
    Ok(())
}
