//! Flattened settings keys (`Section:Nested:Key`) and `key=value` assignments

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use settle_core::error::SettleError;

use crate::ConfigResult;

/// Separator between path segments of a flattened key
pub const KEY_SEPARATOR: char = ':';

/// A flattened key addressing one location in a nested document.
///
/// Segments are separated by [`KEY_SEPARATOR`] and may be empty: `""` is a
/// legal property name, so `""` is a one-segment key and `"a:"` addresses the
/// empty-named property inside `a`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlatKey(String);

impl FlatKey {
    /// Create a key from its textual form
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Textual form of the key
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the path segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(KEY_SEPARATOR)
    }

    /// Number of path segments (always at least one)
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Key of a child property below this key
    pub fn child(&self, segment: &str) -> Self {
        let mut key = String::with_capacity(self.0.len() + 1 + segment.len());
        key.push_str(&self.0);
        key.push(KEY_SEPARATOR);
        key.push_str(segment);
        Self(key)
    }

    /// Whether `other` is this key or lies below it
    pub fn contains(&self, other: &FlatKey) -> bool {
        match other.0.strip_prefix(self.0.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with(KEY_SEPARATOR),
            None => false,
        }
    }
}

impl fmt::Display for FlatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FlatKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for FlatKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl Borrow<str> for FlatKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A single `Section:Key=value` assignment
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub key: FlatKey,
    pub value: Value,
}

impl Assignment {
    /// Parse `key=value`.
    ///
    /// The text is split at the first `=`. The value is read as JSON when it
    /// parses (`true`, `42`, `null`, `{"a":1}`) and taken as a plain string
    /// otherwise.
    pub fn parse(text: &str) -> ConfigResult<Self> {
        let (key, raw_value) = text.split_once('=').ok_or_else(|| {
            SettleError::invalid_key(text, "expected 'key=value', found no '='")
        })?;

        let value = serde_json::from_str(raw_value)
            .unwrap_or_else(|_| Value::String(raw_value.to_string()));

        Ok(Self {
            key: FlatKey::new(key),
            value,
        })
    }
}

impl FromStr for Assignment {
    type Err = SettleError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}
