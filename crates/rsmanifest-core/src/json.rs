//! JSON loading and pretty-printing that keeps object key order.

use crate::ordered::{MappingKind, OrderedMapping};
use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

/// Errors that can occur reading or writing JSON files.
#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    #[error("failed to read or write JSON file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("failed to serialize JSON: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl<V: Serialize, K: MappingKind> Serialize for OrderedMapping<V, K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de, V: Deserialize<'de>, K: MappingKind> Deserialize<'de> for OrderedMapping<V, K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMappingVisitor(PhantomData))
    }
}

struct OrderedMappingVisitor<V, K>(PhantomData<fn() -> (V, K)>);

impl<'de, V: Deserialize<'de>, K: MappingKind> Visitor<'de> for OrderedMappingVisitor<V, K> {
    type Value = OrderedMapping<V, K>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut mapping = OrderedMapping::new();
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            mapping.set(key, value);
        }
        Ok(mapping)
    }
}

/// Parse a JSON object into an ordered mapping.
pub fn parse(s: &str) -> Result<OrderedMapping<Value>, JsonError> {
    serde_json::from_str(s).map_err(JsonError::Parse)
}

/// Load any deserializable value from a JSON file.
pub fn load<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, JsonError> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "loading JSON");
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(JsonError::Parse)
}

/// Load a JSON object file into an ordered mapping.
pub fn load_any(path: impl AsRef<Path>) -> Result<OrderedMapping<Value>, JsonError> {
    load(path)
}

/// Render pretty JSON with a trailing newline.
pub fn to_string_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String, JsonError> {
    let mut out = serde_json::to_string_pretty(value).map_err(JsonError::Serialize)?;
    out.push('\n');
    Ok(out)
}

/// Write pretty JSON to a file, replacing it.
pub fn dump_pretty<T: Serialize + ?Sized>(
    value: &T,
    path: impl AsRef<Path>,
) -> Result<(), JsonError> {
    let path = path.as_ref();
    let contents = to_string_pretty(value)?;
    tracing::debug!(path = %path.display(), "writing JSON");
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_keeps_document_order() {
        let mapping = parse(r#"{"zeta": 1, "alpha": {"y": 2, "b": 3}, "mid": null}"#).unwrap();
        let keys: Vec<&str> = mapping.keys().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);

        let nested: Vec<&String> = mapping["alpha"].as_object().unwrap().keys().collect();
        assert_eq!(nested, ["y", "b"]);
    }

    #[test]
    fn parse_rejects_non_objects() {
        assert!(matches!(parse("[1, 2]"), Err(JsonError::Parse(_))));
        assert!(matches!(parse("{"), Err(JsonError::Parse(_))));
    }

    #[test]
    fn serialize_in_insertion_order() {
        let mut mapping: OrderedMapping<Value> = OrderedMapping::new();
        mapping.set("b", json!(1));
        mapping.set("a", json!([true]));
        mapping.set("c", json!({"z": 0, "y": 1}));
        let s = serde_json::to_string(&mapping).unwrap();
        assert_eq!(s, r#"{"b":1,"a":[true],"c":{"z":0,"y":1}}"#);
    }

    #[test]
    fn typed_values_deserialize() {
        let mapping: OrderedMapping<u32> = serde_json::from_str(r#"{"x": 1, "a": 2}"#).unwrap();
        assert_eq!(mapping.keys().collect::<Vec<_>>(), ["x", "a"]);
        assert_eq!(mapping["a"], 2);
        assert!(serde_json::from_str::<OrderedMapping<u32>>(r#"{"x": "no"}"#).is_err());
    }

    #[test]
    fn pretty_output_ends_with_newline() {
        let mapping: OrderedMapping<Value> = [("a", json!(1))].into_iter().collect();
        assert_eq!(to_string_pretty(&mapping).unwrap(), "{\n  \"a\": 1\n}\n");
    }

    #[test]
    fn dump_then_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        let mut mapping: OrderedMapping<Value> = OrderedMapping::new();
        mapping.set("second", json!("x"));
        mapping.set("first", json!(2));
        dump_pretty(&mapping, &path).unwrap();

        let loaded = load_any(&path).unwrap();
        assert_eq!(loaded, mapping);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_any(dir.path().join("missing.json")).unwrap_err();
        match err {
            JsonError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected error: {other}"),
        }
    }
}
