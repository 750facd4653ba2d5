//! Build configuration and the index field schema.
//!
//! A [`BuildConfig`] is constructed once at startup and passed by reference to
//! every pipeline stage; no component reads ambient global state. The defaults
//! reproduce the production deployment's constants, so a bare
//! `BuildConfig::default()` with an input and output path is a working setup.

use anyhow::{bail, Result};
use std::collections::HashSet;
use std::path::PathBuf;

/// Documents per addressable data file inside a shard.
pub const DEFAULT_DOCS_PER_BATCH: usize = 500;

/// Documents per shard.
pub const DEFAULT_SHARD_CAPACITY: usize = 200_000;

/// Leading characters of a token that select its index bucket file.
pub const DEFAULT_PREFIX_LENGTH: usize = 2;

/// Stop words dropped during text tokenization.
///
/// These are the highest-frequency words in server names and descriptions;
/// indexing them would bloat the hottest bucket files for no search value.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "new", "you", "are", "server", "our", "from", "a", "is", "in",
    "it", "us", "to", "of", "we",
];

/// Which response fields are indexed, and as what class.
///
/// Field names are dotted paths under the record's `response` tree, except the
/// literal `invite` field which reads the record's top-level invite string.
#[derive(Clone, Debug)]
pub struct IndexSchema {
    /// Tokenized, multi-value capable fields.
    pub text: Vec<String>,
    /// Exact-match fields; list values emit one entry per element.
    pub keyword: Vec<String>,
    /// Exact-match fields whose distinct values are also cataloged as integers.
    pub numeric: Vec<String>,
    /// The text field holding a list of `{label: ...}` objects rather than
    /// strings; its labels are collected before tokenization.
    pub traits_field: String,
    /// Tokens dropped during text tokenization.
    pub stop_words: HashSet<String>,
}

impl Default for IndexSchema {
    fn default() -> Self {
        let owned = |fields: &[&str]| fields.iter().map(|f| (*f).to_string()).collect();
        Self {
            text: owned(&[
                "invite",
                "inviter.username",
                "inviter.global_name",
                "guild.name",
                "guild.description",
                "channel.name",
                "profile.tag",
                "profile.traits",
            ]),
            keyword: owned(&[
                "inviter.id",
                "guild.id",
                "guild.features",
                "guild.vanity_url_code",
                "channel.id",
                "guild.nsfw",
                "guild.premium_tier",
                "guild.verification_level",
            ]),
            numeric: owned(&[
                "profile.member_count",
                "profile.online_count",
                "guild.premium_subscription_count",
            ]),
            traits_field: "profile.traits".to_string(),
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| (*w).to_string()).collect(),
        }
    }
}

/// Configuration for one full index build.
#[derive(Clone, Debug)]
pub struct BuildConfig {
    /// Input path or glob pattern for raw record logs (e.g. `crawl/servers-*.jsonl`).
    pub input: String,
    /// Directory receiving the full artifact set. Replaced on every build.
    pub output_dir: PathBuf,
    /// Documents per shard.
    pub shard_capacity: usize,
    /// Documents per batch file within a shard.
    pub docs_per_batch: usize,
    /// Token prefix length selecting an index bucket file.
    pub prefix_length: usize,
    /// Base URL under which shards are hosted, recorded in the manifest for
    /// clients to resolve shard numbers to retrievable paths.
    pub base_url: String,
    /// Shard directory name template; `{}` is replaced by the 1-based shard number.
    pub shard_dir_template: String,
    /// Worker thread count for the parallel stages. `None` uses all cores.
    pub workers: Option<usize>,
    /// Field classes and tokenizer vocabulary.
    pub schema: IndexSchema,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            input: "servers.jsonl".to_string(),
            output_dir: PathBuf::from("site"),
            shard_capacity: DEFAULT_SHARD_CAPACITY,
            docs_per_batch: DEFAULT_DOCS_PER_BATCH,
            prefix_length: DEFAULT_PREFIX_LENGTH,
            base_url: "https://vovaauer.github.io".to_string(),
            shard_dir_template: "shard-{}".to_string(),
            workers: None,
            schema: IndexSchema::default(),
        }
    }
}

impl BuildConfig {
    /// Check the configuration for values that would produce a degenerate or
    /// unaddressable artifact set.
    ///
    /// # Errors
    /// Returns an error if the input pattern is empty, a capacity is zero, the
    /// prefix length is zero, or the shard directory template has no `{}`
    /// placeholder.
    pub fn validate(&self) -> Result<()> {
        if self.input.trim().is_empty() {
            bail!("input pattern is empty");
        }
        if self.shard_capacity == 0 {
            bail!("shard_capacity must be at least 1");
        }
        if self.docs_per_batch == 0 {
            bail!("docs_per_batch must be at least 1");
        }
        if self.prefix_length == 0 {
            bail!("prefix_length must be at least 1");
        }
        if !self.shard_dir_template.contains("{}") {
            bail!(
                "shard_dir_template {:?} has no {{}} placeholder",
                self.shard_dir_template
            );
        }
        Ok(())
    }

    /// Directory name for a 1-based shard number.
    pub fn shard_dir_name(&self, shard_number: u32) -> String {
        self.shard_dir_template.replace("{}", &shard_number.to_string())
    }
}
