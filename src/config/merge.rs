//! Layer merging for YAML tiers.
//!
//! A tier file only has to name what it changes. Maps combine key by key,
//! anything else in a later layer replaces what the earlier layers had,
//! and a `~` (null) leaves the earlier value in place. Nulls never reach
//! the merged result, so a default tree built from layers is always
//! representable as a `ConfigValue`.

use serde_json::Value;

/// Fold `layers` in order, later layers winning, and strip leftover nulls.
///
/// An empty or all-null input gives `Value::Null`.
///
/// # Example
/// ```
/// use serde_json::json;
/// use layered_config::config::merge_layers;
///
/// let builtin = json!({"media": {"volume": 1, "autoPlay": false, "rates": [1, 2]}});
/// let project = json!({"media": {"volume": 0.8, "autoPlay": null, "rates": [1.5]}});
/// let user = json!({"player": {"theme": "dark", "font": null}});
///
/// assert_eq!(
///     merge_layers([builtin, project, user]),
///     json!({
///         "media": {"volume": 0.8, "autoPlay": false, "rates": [1.5]},
///         "player": {"theme": "dark"}
///     })
/// );
/// ```
pub fn merge_layers(layers: impl IntoIterator<Item = Value>) -> Value {
    let mut merged = Value::Null;
    for layer in layers {
        merge_into(&mut merged, layer);
    }
    prune_nulls(merged)
}

/// Apply one layer on top of `target` in place.
pub fn merge_into(target: &mut Value, layer: Value) {
    match (target, layer) {
        (_, Value::Null) => {}
        (Value::Object(target_map), Value::Object(layer_map)) => {
            for (key, value) in layer_map {
                match target_map.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (target, layer) => *target = layer,
    }
}

/// Remove null map entries and list items at every depth.
pub fn prune_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, prune_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|v| !v.is_null())
                .map(prune_nulls)
                .collect(),
        ),
        other => other,
    }
}
