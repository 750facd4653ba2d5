//! Dotted-path access over untyped JSON trees.
//!
//! Raw records are schemaless: crawlers add and drop response fields between
//! runs. Index extraction therefore reads fields by dotted path over
//! `serde_json::Value`, with absence reported as `None` rather than a null
//! sentinel, so every caller handles the missing case explicitly.

use serde_json::Value;

/// Resolve a dotted path (`"guild.id"`) against a JSON tree.
///
/// Each segment must index into an object; any non-object intermediate or
/// missing key yields `None`. An empty path returns the root.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for key in path.split('.') {
        if key.is_empty() {
            continue;
        }
        current = current.as_object()?.get(key)?;
    }
    Some(current)
}

/// Coerce an optional JSON value to an `i64` count.
///
/// Absent, null, or non-numeric values count as 0; this is the comparison
/// score used for deduplication and the denormalized sort keys carried on
/// rich pointers.
pub fn as_count(value: Option<&Value>) -> i64 {
    value.and_then(Value::as_i64).unwrap_or(0)
}

/// Render a JSON scalar as an index key.
///
/// Strings pass through unquoted; every other value uses its JSON rendering
/// (`true`, `42`). Keyword and numeric index keys are stored in this form.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A non-empty string view of a JSON value, if it is one.
pub fn non_empty_str(value: &Value) -> Option<&str> {
    match value.as_str() {
        Some(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_nested_paths() {
        let v = json!({"response": {"guild": {"id": "123"}}});
        assert_eq!(
            resolve(&v, "response.guild.id"),
            Some(&Value::String("123".into()))
        );
    }

    #[test]
    fn absent_paths_are_none() {
        let v = json!({"response": {"guild": {}}});
        assert_eq!(resolve(&v, "response.guild.id"), None);
        assert_eq!(resolve(&v, "response.profile.tag"), None);
    }

    #[test]
    fn non_object_intermediates_are_none() {
        let v = json!({"response": "not a tree"});
        assert_eq!(resolve(&v, "response.guild.id"), None);
    }

    #[test]
    fn counts_default_to_zero() {
        let v = json!({"mc": "many", "oc": 17});
        assert_eq!(as_count(resolve(&v, "mc")), 0);
        assert_eq!(as_count(resolve(&v, "oc")), 17);
        assert_eq!(as_count(None), 0);
    }

    #[test]
    fn stringify_keeps_strings_unquoted() {
        assert_eq!(stringify(&json!("COMMUNITY")), "COMMUNITY");
        assert_eq!(stringify(&json!(false)), "false");
        assert_eq!(stringify(&json!(3)), "3");
    }
}
