//! Raw record admission and log loading.
//!
//! The raw log is append-only and noisy: crawl failures, rate-limit markers,
//! and half-written lines sit next to good records. Loading never fails the
//! build over one bad line; inadmissible lines are skipped and counted.

use crate::io::{expand_inputs, open_input};
use crate::value::{as_count, resolve};
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde_json::Value;
use std::io::BufRead;
use tracing::warn;

/// Dotted path that must resolve for a record to be admissible.
const GUILD_ID_PATH: &str = "response.guild.id";

/// Comparison score used by deduplication and carried on rich pointers.
const MEMBER_COUNT_PATH: &str = "response.profile.member_count";

/// One admissible crawl record: the decoded line plus the two values every
/// later stage needs, extracted once.
#[derive(Clone, Debug)]
pub struct RawRecord {
    /// The record's identity key.
    pub guild_id: String,
    /// Member count at crawl time; 0 when absent or non-numeric.
    pub member_count: i64,
    /// The full decoded line.
    pub value: Value,
}

/// Load totals for build reporting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Non-blank lines seen across all input files.
    pub lines: u64,
    /// Lines admitted as raw records.
    pub admitted: u64,
    /// Lines skipped: undecodable, not `status == "valid"`, or no guild id.
    pub rejected: u64,
}

/// Decode one log line into a raw record.
///
/// Returns `None` for anything inadmissible: lines that fail to decode, lack
/// the `status == "valid"` marker, or have no resolvable guild id.
pub fn parse_line(line: &str) -> Option<RawRecord> {
    let value: Value = serde_json::from_str(line).ok()?;
    if value.get("status").and_then(Value::as_str) != Some("valid") {
        return None;
    }
    let guild_id = match resolve(&value, GUILD_ID_PATH)? {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let member_count = as_count(resolve(&value, MEMBER_COUNT_PATH));
    Some(RawRecord {
        guild_id,
        member_count,
        value,
    })
}

/// Read every file matching the input pattern and parse its lines in parallel.
///
/// Files are visited in sorted order and whole files are read up front; the
/// full record set is expected to fit in memory for one build. Blank lines are
/// skipped without counting as rejects.
///
/// # Errors
/// Returns an error if the pattern matches no file or a file cannot be opened
/// or read. Bad lines are never an error.
pub fn load_records(pattern: &str) -> Result<(Vec<RawRecord>, LoadStats)> {
    let files = expand_inputs(pattern)?;

    let mut lines = Vec::new();
    for path in &files {
        let before = lines.len();
        let reader = open_input(path)?;
        for (i, line) in reader.lines().enumerate() {
            let line =
                line.with_context(|| format!("read line {} in {}", i + 1, path.display()))?;
            if line.trim().is_empty() {
                continue;
            }
            lines.push(line);
        }
        if lines.len() == before {
            warn!(file = %path.display(), "input file contributed no lines");
        }
    }

    let parsed: Vec<Option<RawRecord>> =
        lines.par_iter().map(|line| parse_line(line)).collect();

    let mut records = Vec::with_capacity(parsed.len());
    let mut stats = LoadStats {
        lines: parsed.len() as u64,
        ..LoadStats::default()
    };
    for slot in parsed {
        match slot {
            Some(record) => {
                stats.admitted += 1;
                records.push(record);
            }
            None => stats.rejected += 1,
        }
    }
    Ok((records, stats))
}
