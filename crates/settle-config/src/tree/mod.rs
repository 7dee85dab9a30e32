//! Rebuilding nested documents from flattened keys
//!
//! [`PathTreeBuilder`] owns one document and writes values at `Section:Key`
//! paths, creating intermediate objects as needed. Sibling properties are left
//! untouched; the value at the addressed leaf is replaced, never merged.

use serde_json::{Map, Value};
use settle_core::error::SettleError;

use crate::{
    flatten::kind,
    key::{Assignment, FlatKey, KEY_SEPARATOR},
    ConfigResult,
};

/// Owns a document under construction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathTreeBuilder {
    root: Map<String, Value>,
}

impl PathTreeBuilder {
    /// Start from an existing document, which must be an object
    pub fn new(document: Value) -> ConfigResult<Self> {
        match document {
            Value::Object(root) => Ok(Self { root }),
            other => Err(SettleError::malformed(
                "document",
                format!("expected an object at the top level, found {}", kind(&other)),
            )),
        }
    }

    /// Start from `{}`
    pub fn empty() -> Self {
        Self::default()
    }

    /// Write `value` at `key`, replacing whatever was there
    pub fn set(&mut self, key: &FlatKey, value: Value) -> &mut Self {
        insert_into_object(&mut self.root, key.as_str(), value);
        self
    }

    /// Apply a parsed `Section:Key=value` assignment
    pub fn apply(&mut self, assignment: &Assignment) -> &mut Self {
        self.set(&assignment.key, assignment.value.clone())
    }

    /// Read the node at `key`, descending through objects and arrays
    pub fn get(&self, key: &FlatKey) -> Option<&Value> {
        let mut segments = key.segments();
        let first = segments.next()?;
        let mut node = self.root.get(first)?;
        for segment in segments {
            node = match node {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(parse_index(segment)?)?,
                _ => return None,
            };
        }
        Some(node)
    }

    /// Finish building and take the document
    pub fn into_document(self) -> Value {
        Value::Object(self.root)
    }
}

/// Write `value` at `key` in `document` and return the updated document.
///
/// `document` must be an object. Missing intermediate levels are created as
/// objects, and a scalar found where a level is needed is replaced by one.
pub fn build(document: Value, key: &FlatKey, value: Value) -> ConfigResult<Value> {
    let mut builder = PathTreeBuilder::new(document)?;
    builder.set(key, value);
    Ok(builder.into_document())
}

fn insert_into_object(level: &mut Map<String, Value>, key: &str, value: Value) {
    match key.split_once(KEY_SEPARATOR) {
        None => {
            level.insert(key.to_string(), value);
        }
        Some((head, rest)) => {
            let child = level.entry(head).or_insert(Value::Null);
            insert_below(child, rest, value);
        }
    }
}

fn insert_below(node: &mut Value, key: &str, value: Value) {
    match node {
        Value::Object(map) => insert_into_object(map, key, value),
        Value::Array(items) => {
            let (head, rest) = match key.split_once(KEY_SEPARATOR) {
                Some((head, rest)) => (head, Some(rest)),
                None => (key, None),
            };

            match parse_index(head).filter(|index| *index <= items.len()) {
                Some(index) => {
                    if index == items.len() {
                        items.push(Value::Null);
                    }
                    match rest {
                        Some(rest) => insert_below(&mut items[index], rest, value),
                        None => items[index] = value,
                    }
                }
                None => {
                    // Not addressable as an element: keep the items under their indices
                    let map = std::mem::take(items)
                        .into_iter()
                        .enumerate()
                        .map(|(index, item)| (index.to_string(), item))
                        .collect();
                    *node = Value::Object(map);
                    insert_below(node, key, value);
                }
            }
        }
        _ => {
            *node = Value::Object(Map::new());
            insert_below(node, key, value);
        }
    }
}

/// Array index in canonical form only, so `01` and `+1` stay object keys
fn parse_index(segment: &str) -> Option<usize> {
    let index = segment.parse::<usize>().ok()?;
    (index.to_string() == segment).then_some(index)
}
