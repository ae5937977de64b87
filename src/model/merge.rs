//! Shallow-merge helpers for the free-form JSON maps carried by apps,
//! screens and components. Merging is key-wise and one level deep: overlay
//! keys win, everything else is kept from the base. Nested objects are
//! replaced wholesale, matching spread-style merge semantics.

use crate::model::JsonMap;

/// Returns `{...base, ...overlay}` as a new map.
pub fn merge(base: &JsonMap, overlay: &JsonMap) -> JsonMap {
    let mut result = base.clone();
    for (key, value) in overlay {
        result.insert(key.clone(), value.clone());
    }
    result
}

/// Merges `overlay` into `base` in place, overlay keys winning.
pub fn merge_into(base: &mut JsonMap, overlay: &JsonMap) {
    for (key, value) in overlay {
        base.insert(key.clone(), value.clone());
    }
}

/// Folds a chain of default layers left to right: later layers win per key.
/// Used at component creation where caller values override the type template,
/// which itself overrides the static defaults.
pub fn merge_layers<'a, I>(layers: I) -> JsonMap
where
    I: IntoIterator<Item = &'a JsonMap>,
{
    let mut result = JsonMap::new();
    for layer in layers {
        merge_into(&mut result, layer);
    }
    result
}
