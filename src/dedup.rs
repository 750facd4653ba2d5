//! Best-record-per-guild reduction.
//!
//! Repeated crawls of one server produce many raw records sharing a guild id;
//! the index must hold exactly one document per server. The fold below is the
//! single synchronization point between loading and transformation: internal
//! ids are assigned by enumerating its output, so its order must be stable
//! across rebuilds of identical input.

use crate::record::RawRecord;
use std::collections::HashMap;

/// Collapse raw records to one per guild id, keeping the record with the
/// strictly greater member count. Ties keep the first-seen record.
///
/// Output preserves the first-seen order of each guild id: a replacement
/// overwrites the first-seen record's slot instead of appending, so the
/// enumeration order (and with it every internal id) is a pure function of
/// input order.
pub fn dedup_records(records: Vec<RawRecord>) -> Vec<RawRecord> {
    let mut slots: Vec<RawRecord> = Vec::new();
    let mut by_guild: HashMap<String, usize> = HashMap::new();

    for record in records {
        match by_guild.get(&record.guild_id) {
            Some(&slot) => {
                if record.member_count > slots[slot].member_count {
                    slots[slot] = record;
                }
            }
            None => {
                by_guild.insert(record.guild_id.clone(), slots.len());
                slots.push(record);
            }
        }
    }
    slots
}
