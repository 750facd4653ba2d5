//! # Shardpress
//!
//! A **static search-index builder** for server-discovery datasets. Shardpress
//! consumes a raw append-only JSON Lines log of crawl records and produces a
//! shard-partitioned artifact set (document batches, token-bucketed index
//! files, and global manifests) that a client-side or CDN-hosted search
//! front-end can query without any live backend.
//!
//! ## Key Features
//!
//! - **Full-rebuild batch pipeline** - every build replaces the previous artifact set
//! - **Deduplication** - repeated crawls of one server collapse to the best record
//! - **Three field classes** - tokenized text, exact-match keywords, cataloged numerics
//! - **Bounded shards** - documents and index entries partition by pure functions
//!   of the internal id, so a reader can recompute any file location
//! - **Deterministic output** - identical input produces byte-identical artifacts
//! - **Parallel execution** - parsing, transformation, and file writing fan out
//!   across a Rayon worker pool
//! - **Compressed inputs** - gzip/zstd record logs are decompressed transparently
//!   (optional via feature flags)
//!
//! ## Quick Start
//!
//! ```no_run
//! use shardpress::{run_build, BuildConfig};
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let config = BuildConfig {
//!     input: "crawl/servers-*.jsonl".into(),
//!     output_dir: "site".into(),
//!     ..BuildConfig::default()
//! };
//!
//! let summary = run_build(&config)?;
//! println!("indexed {} unique servers", summary.documents);
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline Stages
//!
//! Data flows strictly left to right:
//!
//! 1. **Load** ([`record`]) - decode raw lines, discard inadmissible ones
//! 2. **Deduplicate** ([`dedup`]) - one record per guild id, best member count wins
//! 3. **Transform** ([`document`], [`tokenize`]) - canonical documents plus index
//!    entries, computed in parallel over pre-assigned `(internal_id, record)` pairs
//! 4. **Partition** ([`shard`]) - pure-function assignment to shards, batches,
//!    and token-prefix buckets
//! 5. **Write** ([`writer`]) - one addressable file per batch and per bucket
//! 6. **Manifests** ([`manifest`]) - sort index, numeric catalog, and the build
//!    manifest, emitted only after every shard file succeeded
//!
//! Only deduplication and manifest building need a global view; the other
//! stages are per-record transforms and run on the worker pool.
//!
//! ## Output Layout
//!
//! ```text
//! <output_dir>/
//!   shard-1/
//!     data/d_0.json              # ordered array of canonical documents
//!     index/guild_name/co.json   # token -> [rich pointers]
//!     index/profile_member_count/_.json
//!   shard-2/...
//!   all_servers_sorted_by_members.json
//!   numeric_manifest.json
//!   manifest.json
//! ```
//!
//! ## Feature Flags
//!
//! - `compression-gzip` - read `.gz` record logs (default)
//! - `compression-zstd` - read `.zst` record logs (default)
//!
//! ## Module Overview
//!
//! - [`config`] - build configuration and the index field schema
//! - [`value`] - dotted-path access over untyped JSON trees
//! - [`io`] - glob expansion and transparently decompressed readers
//! - [`record`] - raw record admission and log loading
//! - [`dedup`] - best-record-per-guild reduction
//! - [`document`] - canonical documents and index entry extraction
//! - [`tokenize`] - text tokenization and stemming
//! - [`shard`] - shard/batch/bucket partitioning
//! - [`writer`] - shard file emission
//! - [`manifest`] - global manifests
//! - [`pipeline`] - end-to-end build orchestration

pub mod config;
pub mod dedup;
pub mod document;
pub mod io;
pub mod manifest;
pub mod pipeline;
pub mod record;
pub mod shard;
pub mod tokenize;
pub mod value;
pub mod writer;

// General re-exports
pub use config::{BuildConfig, IndexSchema};
pub use dedup::dedup_records;
pub use document::{Document, IndexEntry, RichPointer};
pub use manifest::{BuildManifest, ShardRange};
pub use pipeline::{run_build, BuildSummary};
pub use record::{LoadStats, RawRecord};
pub use tokenize::Tokenizer;
