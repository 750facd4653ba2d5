use shardpress::document::{transform, IndexEntry};
use shardpress::record::parse_line;
use shardpress::{IndexSchema, Tokenizer};

const FIXTURE: &str = r#"{
    "status": "valid",
    "invite": "abc",
    "response": {
        "guild": {
            "id": "42",
            "name": "Cool New Server",
            "features": ["COMMUNITY", "NEWS"],
            "nsfw": false,
            "premium_tier": 2
        },
        "profile": {
            "member_count": 50,
            "online_count": 5,
            "traits": [
                {"label": "Friendly Community"},
                {"label": ""},
                {"emoji": "no label here"}
            ]
        },
        "channel": {"id": "777", "name": "general"}
    }
}"#;

fn fixture_entries() -> Vec<IndexEntry> {
    let record = parse_line(&FIXTURE.replace('\n', " ")).expect("fixture is admissible");
    let schema = IndexSchema::default();
    let tokenizer = Tokenizer::new(schema.stop_words.clone());
    let (_, entries) = transform(3, &record, &schema, &tokenizer);
    entries
}

fn keys_for<'a>(entries: &'a [IndexEntry], field: &str) -> Vec<&'a str> {
    entries
        .iter()
        .filter(|e| e.field == field)
        .map(|e| e.key.as_str())
        .collect()
}

#[test]
fn document_merges_response_and_injects_identity() {
    let record = parse_line(&FIXTURE.replace('\n', " ")).unwrap();
    let schema = IndexSchema::default();
    let tokenizer = Tokenizer::new(schema.stop_words.clone());
    let (doc, _) = transform(3, &record, &schema, &tokenizer);

    assert_eq!(doc.internal_id, 3);
    assert_eq!(doc.data["id"], "42");
    assert_eq!(doc.data["invite"], "abc");
    // Response fields survive the merge untouched.
    assert_eq!(doc.data["guild"]["name"], "Cool New Server");
    assert_eq!(doc.data["profile"]["member_count"], 50);
}

#[test]
fn stop_words_never_reach_the_index() {
    let entries = fixture_entries();
    // "Cool New Server": "new" and "server" are stop words.
    assert_eq!(keys_for(&entries, "guild.name"), vec!["cool"]);
}

#[test]
fn invite_reads_the_top_level_string() {
    let entries = fixture_entries();
    assert_eq!(keys_for(&entries, "invite"), vec!["abc"]);
}

#[test]
fn traits_index_their_non_empty_labels() {
    let entries = fixture_entries();
    assert_eq!(
        keys_for(&entries, "profile.traits"),
        vec!["friendly", "community"]
    );
}

#[test]
fn keyword_lists_emit_one_entry_per_element() {
    let entries = fixture_entries();
    assert_eq!(
        keys_for(&entries, "guild.features"),
        vec!["COMMUNITY", "NEWS"]
    );
    // Scalars stringify; nulls and absent fields emit nothing.
    assert_eq!(keys_for(&entries, "guild.nsfw"), vec!["false"]);
    assert_eq!(keys_for(&entries, "guild.premium_tier"), vec!["2"]);
    assert!(keys_for(&entries, "inviter.id").is_empty());
}

#[test]
fn numeric_fields_store_decimal_string_keys() {
    let entries = fixture_entries();
    assert_eq!(keys_for(&entries, "profile.member_count"), vec!["50"]);
    assert_eq!(keys_for(&entries, "profile.online_count"), vec!["5"]);
}

#[test]
fn every_entry_carries_the_same_rich_pointer() {
    let entries = fixture_entries();
    assert!(!entries.is_empty());
    for entry in &entries {
        assert_eq!(entry.pointer.id, 3);
        assert_eq!(entry.pointer.member_count, 50);
        assert_eq!(entry.pointer.online_count, 5);
    }
}

#[test]
fn missing_counts_default_to_zero() {
    let record =
        parse_line(r#"{"status":"valid","response":{"guild":{"id":"9"}}}"#).unwrap();
    let schema = IndexSchema::default();
    let tokenizer = Tokenizer::new(schema.stop_words.clone());
    let (doc, entries) = transform(0, &record, &schema, &tokenizer);

    assert_eq!(doc.data["invite"], serde_json::Value::Null);
    for entry in &entries {
        assert_eq!(entry.pointer.member_count, 0);
        assert_eq!(entry.pointer.online_count, 0);
    }
}
