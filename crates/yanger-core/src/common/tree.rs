// ── Nested JSON objects ──
//
// Path-based insertion and lookup on `serde_json::Value` trees, for the
// places where building typed records would be awkward.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

/// Set `path` in `root` to `value`, creating intermediate objects. Any
/// non-object met on the way (including `root`) is replaced.
#[cfg_attr(not(test), allow(dead_code))]
pub(crate) fn insert(root: &mut Value, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        *root = value;
        return;
    };

    let mut node = root;
    for key in parents {
        node = object(node)
            .entry((*key).to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    object(node).insert((*last).to_owned(), value);
}

/// Value at `path`, or `None` when any level is absent or not an object.
pub fn lookup<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, key| node.as_object()?.get(*key))
}

/// String at `path`.
pub fn lookup_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    lookup(root, path)?.as_str()
}

/// Integer at `path`, accepting numbers and numeric strings.
pub fn lookup_i64(root: &Value, path: &[&str]) -> Option<i64> {
    as_i64(lookup(root, path)?)
}

/// Unsigned integer at `path`, accepting numbers and numeric strings.
pub fn lookup_u64(root: &Value, path: &[&str]) -> Option<u64> {
    as_u64(lookup(root, path)?)
}

pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Array at `path`, empty when absent.
pub fn lookup_array<'a>(root: &'a Value, path: &[&str]) -> &'a [Value] {
    lookup(root, path)
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice)
}

/// Parse a JSON array element by element, skipping entries that do not
/// fit `T`.
pub fn parse_list<T: DeserializeOwned>(value: Value) -> Vec<T> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    debug!(error = %err, "skipping malformed entry");
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// First element of an array, or the value itself when it is not one.
pub fn first_item(value: Value) -> Value {
    match value {
        Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        other => other,
    }
}

#[cfg_attr(not(test), allow(dead_code))]
fn object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just made an object"),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn insert_creates_intermediates() {
        let mut root = json!({});
        insert(&mut root, &["a", "b", "c"], json!(1));
        insert(&mut root, &["a", "d"], json!("x"));
        assert_eq!(root, json!({"a": {"b": {"c": 1}, "d": "x"}}));
    }

    #[test]
    fn insert_replaces_non_objects() {
        let mut root = json!({"a": 5});
        insert(&mut root, &["a", "b"], json!(true));
        assert_eq!(root, json!({"a": {"b": true}}));

        let mut scalar = json!(null);
        insert(&mut scalar, &["k"], json!([]));
        assert_eq!(scalar, json!({"k": []}));
    }

    #[test]
    fn lookup_walks_objects_only() {
        let root = json!({"a": {"b": [1, 2], "n": "42"}});
        assert_eq!(lookup(&root, &["a", "b"]), Some(&json!([1, 2])));
        assert_eq!(lookup(&root, &["a", "b", "0"]), None);
        assert_eq!(lookup(&root, &["x"]), None);
        assert_eq!(lookup_i64(&root, &["a", "n"]), Some(42));
        assert_eq!(lookup_array(&root, &["a", "b"]).len(), 2);
        assert!(lookup_array(&root, &["a", "z"]).is_empty());
    }
}
