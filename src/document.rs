//! Canonical documents and index entry extraction.
//!
//! One deduplicated raw record becomes one canonical document plus the index
//! entries pointing at it. The transform is a pure function of its input and
//! runs on the worker pool; ids are assigned before dispatch, never inside it.

use crate::config::IndexSchema;
use crate::record::RawRecord;
use crate::tokenize::Tokenizer;
use crate::value::{as_count, non_empty_str, resolve, stringify};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An index entry's payload: the document id plus denormalized sort keys, so
/// the front-end can rank results without fetching documents.
///
/// Serialized with the short wire names (`mc`, `oc`) the front-end consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichPointer {
    /// The pointed-to document's internal id.
    pub id: u64,
    /// Member count sort key.
    #[serde(rename = "mc")]
    pub member_count: i64,
    /// Online count sort key.
    #[serde(rename = "oc")]
    pub online_count: i64,
}

/// The deduplicated, flattened representation of one server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    /// Dense per-build id; assigned after deduplication, not stable across
    /// rebuilds.
    pub internal_id: u64,
    /// The record's response fields plus the injected `id` and `invite`.
    pub data: Map<String, Value>,
}

/// One `(field, key)` posting carrying its rich pointer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    /// Index field name (dotted path form, e.g. `guild.name`).
    pub field: String,
    /// Token (text fields) or stringified value (keyword/numeric fields).
    pub key: String,
    /// Pointer to the owning document.
    pub pointer: RichPointer,
}

/// Convert a raw record with its pre-assigned id into a canonical document and
/// its index entries.
pub fn transform(
    internal_id: u64,
    record: &RawRecord,
    schema: &IndexSchema,
    tokenizer: &Tokenizer,
) -> (Document, Vec<IndexEntry>) {
    let response = record.value.get("response");

    let mut data = match response.and_then(Value::as_object) {
        Some(fields) => fields.clone(),
        None => Map::new(),
    };
    data.insert("id".to_string(), Value::String(record.guild_id.clone()));
    data.insert(
        "invite".to_string(),
        record.value.get("invite").cloned().unwrap_or(Value::Null),
    );

    let pointer = RichPointer {
        id: internal_id,
        member_count: record.member_count,
        online_count: as_count(response.and_then(|r| resolve(r, "profile.online_count"))),
    };

    let mut entries = Vec::new();

    for field in &schema.text {
        for text in text_values(record, response, field, schema) {
            for token in tokenizer.tokenize(text) {
                entries.push(IndexEntry {
                    field: field.clone(),
                    key: token,
                    pointer,
                });
            }
        }
    }

    for field in schema.keyword.iter().chain(schema.numeric.iter()) {
        let Some(raw) = response.and_then(|r| resolve(r, field)) else {
            continue;
        };
        match raw {
            Value::Array(items) => {
                for item in items {
                    entries.push(IndexEntry {
                        field: field.clone(),
                        key: stringify(item),
                        pointer,
                    });
                }
            }
            Value::Null | Value::Object(_) => {}
            scalar => entries.push(IndexEntry {
                field: field.clone(),
                key: stringify(scalar),
                pointer,
            }),
        }
    }

    let document = Document { internal_id, data };
    (document, entries)
}

/// Resolve a text field to the strings to tokenize.
///
/// The literal `invite` field reads the record's top-level invite string; the
/// traits field collects the non-empty `label` of every list element; any
/// other field yields its string value, or each string element of a list.
fn text_values<'a>(
    record: &'a RawRecord,
    response: Option<&'a Value>,
    field: &str,
    schema: &IndexSchema,
) -> Vec<&'a str> {
    let raw = if field == "invite" {
        record.value.get("invite")
    } else {
        response.and_then(|r| resolve(r, field))
    };
    let Some(raw) = raw else {
        return Vec::new();
    };

    if field == schema.traits_field {
        match raw.as_array() {
            Some(items) => items
                .iter()
                .filter_map(|item| item.get("label").and_then(non_empty_str))
                .collect(),
            None => Vec::new(),
        }
    } else {
        match raw {
            Value::String(s) => vec![s.as_str()],
            Value::Array(items) => items.iter().filter_map(|item| item.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}
