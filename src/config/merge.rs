//! Deep merge for tiered YAML configuration.
//!
//! Higher tiers override lower tiers key by key. Arrays such as the backoff
//! schedule are replaced wholesale.

use serde_json::Value;

/// Merge `overlay` onto `base`.
///
/// - Objects merge recursively; overlay keys win
/// - A null overlay keeps the base value (null means "not specified")
/// - Everything else in the overlay replaces the base
///
/// # Example
/// ```
/// use serde_json::json;
/// use task_thread_sync::config::deep_merge;
///
/// let base = json!({"discord": {"backoff_ms": [1000, 2000, 4000], "auto_archive_minutes": 10080}});
/// let overlay = json!({"discord": {"backoff_ms": [500]}});
/// let merged = deep_merge(base, overlay);
/// assert_eq!(merged["discord"]["backoff_ms"], json!([500]));
/// assert_eq!(merged["discord"]["auto_archive_minutes"], json!(10080));
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut merged), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                let next = match merged.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                merged.insert(key, next);
            }
            Value::Object(merged)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Fold a list of tiers, lowest priority first.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_tier_overrides_single_key() {
        let project = json!({"source": {"backend": "local", "sheet_name": "Projects"}});
        let user = json!({"source": {"sheet_name": "Mine"}});
        assert_eq!(
            deep_merge(project, user),
            json!({"source": {"backend": "local", "sheet_name": "Mine"}})
        );
    }

    #[test]
    fn test_backoff_schedule_is_replaced() {
        let base = json!({"discord": {"backoff_ms": [1000, 2000, 4000]}});
        let overlay = json!({"discord": {"backoff_ms": [10]}});
        assert_eq!(
            deep_merge(base, overlay),
            json!({"discord": {"backoff_ms": [10]}})
        );
    }

    #[test]
    fn test_null_keeps_lower_tier() {
        let base = json!({"server": {"port": 3000, "api_key": "k"}});
        let overlay = json!({"server": {"api_key": null}});
        assert_eq!(
            deep_merge(base, overlay),
            json!({"server": {"port": 3000, "api_key": "k"}})
        );
    }

    #[test]
    fn test_scalar_and_object_swap() {
        assert_eq!(
            deep_merge(json!({"columns": 3}), json!({"columns": {"owner": 4}})),
            json!({"columns": {"owner": 4}})
        );
        assert_eq!(
            deep_merge(json!({"columns": {"owner": 4}}), json!({"columns": 3})),
            json!({"columns": 3})
        );
    }

    #[test]
    fn test_merge_all_in_priority_order() {
        let tiers = vec![
            json!({"format": {"max_content_length": 1800, "utc_offset_minutes": 540}}),
            json!({"format": {"utc_offset_minutes": 0}}),
            json!({"format": {"max_content_length": 900}}),
        ];
        assert_eq!(
            deep_merge_all(tiers),
            json!({"format": {"max_content_length": 900, "utc_offset_minutes": 0}})
        );
    }
}
