//! # Key Path Reconstruction
//!
//! Rebuilds a nested value tree from flat `(dotted.key.path, scalar)` pairs,
//! the form in which the graph stores SLSA predicates.
//!
//! Reconstruction runs in two named steps:
//!
//! 1. **Insertion**: each path is split on `.`, intermediate maps are created
//!    as needed and the scalar is stored at the last segment. Entries are
//!    applied in key order, so the result does not depend on input order.
//! 2. **Listify**: bottom-up, every map whose keys are exactly
//!    `"0".."n-1"` is replaced by a list ordered by that index.
//!
//! A path that walks through an existing scalar replaces it with a map, and a
//! leaf stored on an existing map replaces the map. Callers are expected to
//! supply a consistent path set; no error is raised for conflicts.
//!
//! ## Examples
//!
//! ```
//! use graph_attest::keypath::{reconstruct, FlatKeyValue, Scalar, Value};
//!
//! let tree = reconstruct(&[
//!     FlatKeyValue::new("a.1", Scalar::String("y".to_string())),
//!     FlatKeyValue::new("a.0", Scalar::String("x".to_string())),
//! ]);
//!
//! let a = tree.get("a").unwrap();
//! assert_eq!(
//!     a,
//!     &Value::List(vec![
//!         Value::String("x".to_string()),
//!         Value::String("y".to_string()),
//!     ])
//! );
//! ```

use serde::Serialize;
use std::collections::BTreeMap;

/// A fully typed tree node, serialized as plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Looks up `key` if this is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }
}

/// The scalar kinds a flat entry can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl Scalar {
    /// Types a textual value: `true` and `false` become booleans, everything
    /// else stays a string.
    pub fn infer(text: &str) -> Self {
        match text {
            "true" => Scalar::Bool(true),
            "false" => Scalar::Bool(false),
            _ => Scalar::String(text.to_string()),
        }
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::Number(n) => Value::Number(n),
            Scalar::String(s) => Value::String(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlatKeyValue {
    pub key: String,
    pub value: Scalar,
}

impl FlatKeyValue {
    pub fn new(key: impl Into<String>, value: Scalar) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Builds the nested tree for `entries`; the root is always a map unless its
/// own keys form an index range.
pub fn reconstruct(entries: &[FlatKeyValue]) -> Value {
    let mut ordered: Vec<&FlatKeyValue> = entries.iter().collect();
    ordered.sort_by(|a, b| a.key.cmp(&b.key));

    let mut root = BTreeMap::new();
    for entry in ordered {
        insert_path(&mut root, &entry.key, entry.value.clone().into());
    }

    listify(Value::Map(root))
}

fn insert_path(root: &mut BTreeMap<String, Value>, path: &str, leaf: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = root;

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), leaf);
            return;
        }

        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Map(BTreeMap::new()));
        // A scalar on the way down becomes a map.
        if !slot.is_map() {
            *slot = Value::Map(BTreeMap::new());
        }
        let Value::Map(next) = slot else {
            return;
        };
        current = next;
    }
}

/// Replaces index-keyed maps with lists, at every depth.
pub fn listify(value: Value) -> Value {
    match value {
        Value::Map(map) => {
            let mut map: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, listify(v))).collect();

            if is_index_range(&map) {
                let items = (0..map.len())
                    .filter_map(|i| map.remove(&i.to_string()))
                    .collect();
                Value::List(items)
            } else {
                Value::Map(map)
            }
        }
        Value::List(items) => Value::List(items.into_iter().map(listify).collect()),
        scalar => scalar,
    }
}

// Keys must be exactly the canonical decimals 0..len.
fn is_index_range(map: &BTreeMap<String, Value>) -> bool {
    !map.is_empty() && (0..map.len()).all(|i| map.contains_key(&i.to_string()))
}
