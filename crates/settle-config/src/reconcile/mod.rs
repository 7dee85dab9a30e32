//! Splitting a pair of layers into a merged base and a minimal override
//!
//! Given a base layer and the layer above it, keys that only the upper layer
//! has move down into the base, keys with equal values are dropped from the
//! upper layer, and only keys whose values differ stay in the upper layer.
//! Reading the new upper layer on top of the new base yields the same settings
//! as the original upper layer, and the new base still holds every setting of
//! the original base.
//!
//! A key of the upper layer that clashes with the shape of the base (a value
//! where the base has a section, or a section where the base has a value) is
//! kept as an override. Merging it down would replace base settings.

use std::collections::BTreeSet;
use std::ops::Bound;

use serde_json::Value;
use tracing::debug;

use crate::{
    flatten::{flatten, values_equal, FlatDocument},
    key::{FlatKey, KEY_SEPARATOR},
    tree::PathTreeBuilder,
    ConfigResult,
};

/// Which keys went where during one reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Keys only in the upper layer, merged into the base
    pub added: Vec<FlatKey>,
    /// Keys kept in the upper layer: different values, or a shape clash with the base
    pub overridden: Vec<FlatKey>,
    /// Keys in both layers with equal values, removed from the upper layer
    pub dropped: Vec<FlatKey>,
}

impl ReconcileReport {
    /// Whether the base layer is left as it was
    pub fn base_unchanged(&self) -> bool {
        self.added.is_empty()
    }

    fn sort(&mut self) {
        self.added.sort();
        self.overridden.sort();
        self.dropped.sort();
    }
}

/// Result of reconciling two layers
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// The base layer plus every key unique to the upper layer
    pub base: Value,
    /// Only the keys whose value differs from the base, with the upper value
    pub overrides: Value,
    pub report: ReconcileReport,
}

/// Reconcile `upper` against `base`.
///
/// Both documents must be objects. Output key order is sorted at every level,
/// independent of the order in which keys were classified.
pub fn reconcile(base: &Value, upper: &Value) -> ConfigResult<Reconciliation> {
    let base_flat = flatten(base)?;
    let upper_flat = flatten(upper)?;
    let base_keys = BaseKeys::new(&base_flat);

    let mut merged = PathTreeBuilder::new(base.clone())?;
    let mut overrides = PathTreeBuilder::empty();
    let mut report = ReconcileReport::default();

    // Upper leaves never nest inside each other, so the keys written to
    // either builder are independent of classification order
    for (key, value) in &upper_flat {
        if let Some(base_value) = base_flat.get(key) {
            if values_equal(base_value, value) {
                report.dropped.push(key.clone());
            } else {
                overrides.set(key, value.clone());
                report.overridden.push(key.clone());
            }
            continue;
        }

        if base_keys.has_settings_below(key) {
            if is_empty_container(value) {
                // An empty section adds nothing to what the base already has there
                debug!("Empty section {} already present in base", key);
                report.dropped.push(key.clone());
            } else {
                debug!("{} replaces a base section, kept as override", key);
                overrides.set(key, value.clone());
                report.overridden.push(key.clone());
            }
            continue;
        }

        if let Some(setting) = base_keys.setting_above(key) {
            debug!("{} lies below base setting {}, kept as override", key, setting);
            overrides.set(key, value.clone());
            report.overridden.push(key.clone());
            continue;
        }

        merged.set(key, value.clone());
        report.added.push(key.clone());
    }

    report.sort();
    debug!(
        added = report.added.len(),
        overridden = report.overridden.len(),
        dropped = report.dropped.len(),
        "Reconciled layer pair"
    );

    Ok(Reconciliation {
        base: merged.into_document(),
        overrides: overrides.into_document(),
        report,
    })
}

/// Base leaf keys, indexed for path-prefix lookups
struct BaseKeys<'a> {
    flat: &'a FlatDocument,
    sorted: BTreeSet<&'a str>,
}

impl<'a> BaseKeys<'a> {
    fn new(flat: &'a FlatDocument) -> Self {
        let sorted = flat.keys().map(FlatKey::as_str).collect();
        Self { flat, sorted }
    }

    /// Whether some base leaf lies strictly below `key`
    fn has_settings_below(&self, key: &FlatKey) -> bool {
        let mut prefix = String::with_capacity(key.as_str().len() + 1);
        prefix.push_str(key.as_str());
        prefix.push(KEY_SEPARATOR);

        self.sorted
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .next()
            .is_some_and(|candidate| candidate.starts_with(prefix.as_str()))
    }

    /// A base leaf strictly above `key` that writing `key` would replace.
    ///
    /// Empty sections are not settings: writing below them only fills them.
    fn setting_above(&self, key: &FlatKey) -> Option<&'a FlatKey> {
        let text = key.as_str();
        text.match_indices(KEY_SEPARATOR)
            .filter_map(|(end, _)| self.flat.get_key_value(&text[..end]))
            .find(|(_, value)| !is_empty_container(value))
            .map(|(setting, _)| setting)
    }
}

/// Settings as read at runtime when `layers` are stacked in order.
///
/// Later layers replace earlier values key by key. Arrays are addressed by
/// index like any other key, so an override of `Urls:1` leaves `Urls:0` of
/// the layer below visible.
pub fn effective_settings(layers: &[&Value]) -> ConfigResult<FlatDocument> {
    let mut effective = FlatDocument::new();
    for layer in layers {
        effective.extend(flatten(layer)?);
    }
    Ok(effective)
}

/// Keys that a reconciliation failed to carry over
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mismatches {
    /// Settings of the original base missing or changed in the merged base
    pub base: Vec<FlatKey>,
    /// Settings of the original upper layer that read back differently
    pub upper: Vec<FlatKey>,
}

impl Mismatches {
    pub fn is_empty(&self) -> bool {
        self.base.is_empty() && self.upper.is_empty()
    }
}

/// Check a reconciled pair against the layers it came from.
///
/// The merged `base` must still hold every setting of `original_base`, and
/// `overrides` layered on top of `base` must read back as `original_upper`.
pub fn verify_layering(
    original_base: &Value,
    original_upper: &Value,
    base: &Value,
    overrides: &Value,
) -> ConfigResult<Mismatches> {
    Ok(Mismatches {
        base: missing_settings(original_base, &flatten(base)?)?,
        upper: missing_settings(original_upper, &effective_settings(&[base, overrides])?)?,
    })
}

fn missing_settings(expected: &Value, actual: &FlatDocument) -> ConfigResult<Vec<FlatKey>> {
    let missing = flatten(expected)?
        .into_iter()
        .filter(|(key, value)| !reads_back(actual, key, value))
        .map(|(key, _)| key)
        .collect();
    Ok(missing)
}

fn reads_back(effective: &FlatDocument, key: &FlatKey, expected: &Value) -> bool {
    if is_empty_container(expected) {
        // An empty section is satisfied by any section at the same path
        return effective.keys().any(|candidate| key.contains(candidate));
    }
    match effective.get(key) {
        Some(actual) => values_equal(actual, expected),
        None => expected.is_null(),
    }
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_document() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            (0i64..5).prop_map(Value::from),
            "[ab]{0,2}".prop_map(Value::String),
        ];
        let tree = leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::btree_map("[abc]{1,2}", inner.clone(), 0..4)
                    .prop_map(|map| Value::Object(map.into_iter().collect())),
                prop::collection::vec(inner, 0..3).prop_map(Value::Array),
            ]
        });
        prop::collection::btree_map("[abc]{1,2}", tree, 0..4)
            .prop_map(|map| Value::Object(map.into_iter().collect()))
    }

    proptest! {
        /// A document reconciled against itself needs no overrides
        #[test]
        fn reconcile_with_itself_is_identity(document in arb_document()) {
            let result = reconcile(&document, &document).unwrap();
            prop_assert_eq!(result.base, document);
            prop_assert_eq!(result.overrides, Value::Object(Default::default()));
        }

        /// Overrides never repeat a value the base already has
        #[test]
        fn overrides_only_hold_differing_values(base in arb_document(), upper in arb_document()) {
            let result = reconcile(&base, &upper).unwrap();
            let base_flat = flatten(&base).unwrap();
            let upper_flat = flatten(&upper).unwrap();

            for key in &result.report.overridden {
                match base_flat.get(key) {
                    Some(base_value) => prop_assert!(!values_equal(base_value, &upper_flat[key])),
                    None => prop_assert!(base_flat
                        .keys()
                        .any(|base_key| key.contains(base_key) || base_key.contains(key))),
                }
            }
            for key in &result.report.dropped {
                prop_assert!(!result.report.overridden.contains(key));
                prop_assert!(!result.report.added.contains(key));
            }
            prop_assert_eq!(
                result.report.added.len() + result.report.overridden.len() + result.report.dropped.len(),
                upper_flat.len()
            );
        }

        /// The merged base keeps every base setting unchanged
        #[test]
        fn merged_base_keeps_base_settings(base in arb_document(), upper in arb_document()) {
            let result = reconcile(&base, &upper).unwrap();
            let merged_flat = flatten(&result.base).unwrap();

            for (key, value) in flatten(&base).unwrap() {
                if is_empty_container(&value) {
                    prop_assert!(merged_flat.keys().any(|candidate| key.contains(candidate)));
                } else {
                    prop_assert_eq!(merged_flat.get(&key), Some(&value), "lost {}", key);
                }
            }
        }

        /// Overrides on top of the merged base read back as both original layers
        #[test]
        fn reconciled_pair_reads_back(base in arb_document(), upper in arb_document()) {
            let result = reconcile(&base, &upper).unwrap();
            let mismatches = verify_layering(&base, &upper, &result.base, &result.overrides).unwrap();
            prop_assert!(mismatches.is_empty(), "{:?}", mismatches);
        }
    }
}
