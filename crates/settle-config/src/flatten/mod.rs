//! Flattening nested documents into `Section:Key` / value pairs

use std::borrow::Cow;

use indexmap::IndexMap;
use serde_json::Value;
use settle_core::error::SettleError;
use tracing::debug;

use crate::{key::FlatKey, ConfigResult};

/// Flattened document: leaf keys in document traversal order
pub type FlatDocument = IndexMap<FlatKey, Value>;

/// Flatten a document into its leaf keys.
///
/// Objects contribute `parent:child` keys and arrays `parent:index` keys.
/// Scalars are leaves. Empty objects and arrays are kept as leaves holding the
/// empty container so they are not lost when the document is rebuilt.
pub fn flatten(document: &Value) -> ConfigResult<FlatDocument> {
    let root = document.as_object().ok_or_else(|| {
        SettleError::malformed(
            "document",
            format!("expected an object at the top level, found {}", kind(document)),
        )
    })?;

    let mut flat = FlatDocument::new();
    for (name, value) in root {
        visit(FlatKey::new(name.as_str()), value, &mut flat);
    }
    Ok(flat)
}

fn visit(key: FlatKey, value: &Value, flat: &mut FlatDocument) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (name, child) in map {
                visit(key.child(name), child, flat);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, item) in items.iter().enumerate() {
                visit(key.child(&index.to_string()), item, flat);
            }
        }
        leaf => {
            if let Some(previous) = flat.insert(key, leaf.clone()) {
                // A property named "a:b" collides with the path a -> b
                debug!("Duplicate flattened key, replacing value {}", previous);
            }
        }
    }
}

/// The string form used when comparing values across layers.
///
/// Strings compare by content, numbers by their textual form and booleans as
/// `true`/`false`, so `"1"` and `1` are the same setting. `null` has no string
/// form. Empty containers compare as `{}` and `[]`.
pub fn config_string(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(Cow::Borrowed(text.as_str())),
        Value::Bool(flag) => Some(Cow::Borrowed(if *flag { "true" } else { "false" })),
        Value::Number(number) => Some(Cow::Owned(number.to_string())),
        container => Some(Cow::Owned(container.to_string())),
    }
}

/// Whether two leaf values are the same setting
pub fn values_equal(left: &Value, right: &Value) -> bool {
    config_string(left) == config_string(right)
}

/// Name of a JSON value kind for error messages
pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
