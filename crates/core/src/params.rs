//! Lenient lookups into a JSON settings object.
//!
//! Each helper takes a list of accepted key names, tried in order, so a
//! current key can be listed before the legacy one it replaced. The first
//! key holding a value of the right type wins; otherwise the default is
//! returned. Nothing here fails.

use serde_json::Value;

fn lookup<'a, T>(params: &'a Value, keys: &[&str], extract: impl Fn(&'a Value) -> Option<T>) -> Option<T> {
    keys.iter().find_map(|key| params.get(key).and_then(&extract))
}

/// Integer setting. Floats and strings are skipped.
pub fn param_i64(params: &Value, keys: &[&str], default: i64) -> i64 {
    lookup(params, keys, Value::as_i64).unwrap_or(default)
}

pub fn param_bool(params: &Value, keys: &[&str], default: bool) -> bool {
    lookup(params, keys, Value::as_bool).unwrap_or(default)
}

pub fn param_string(params: &Value, keys: &[&str], default: &str) -> String {
    lookup(params, keys, Value::as_str).unwrap_or(default).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DIMENSION: &[&str] = &["reduction_dimension", "lightDimensions"];

    #[test]
    fn first_key_wins_over_legacy_key() {
        let params = json!({"reduction_dimension": 32, "lightDimensions": 8});
        assert_eq!(param_i64(&params, DIMENSION, 16), 32);
    }

    #[test]
    fn legacy_key_is_used_when_current_is_absent() {
        let params = json!({"lightDimensions": 8});
        assert_eq!(param_i64(&params, DIMENSION, 16), 8);
    }

    #[test]
    fn wrongly_typed_current_key_falls_through_to_legacy() {
        let params = json!({"reduction_dimension": "big", "lightDimensions": 8});
        assert_eq!(param_i64(&params, DIMENSION, 16), 8);
    }

    #[test]
    fn negative_integers_are_kept_for_later_clamping() {
        let params = json!({"reduction_dimension": -3});
        assert_eq!(param_i64(&params, DIMENSION, 16), -3);
    }

    #[test]
    fn float_dimension_falls_back_to_default() {
        let params = json!({"reduction_dimension": 2.5});
        assert_eq!(param_i64(&params, DIMENSION, 16), 16);
    }

    #[test]
    fn non_object_yields_defaults() {
        let params = json!("not an object");
        assert_eq!(param_i64(&params, DIMENSION, 7), 7);
        assert!(param_bool(&params, &["enable"], true));
        assert_eq!(param_string(&params, &["strategy"], "blit"), "blit");
    }

    #[test]
    fn bool_requires_a_json_bool() {
        assert!(!param_bool(&json!({"debug": false}), &["debug"], true));
        assert!(!param_bool(&json!({"debug": 1}), &["debug"], false));
    }

    #[test]
    fn string_reads_either_key() {
        let params = json!({"renderMode": "Blit"});
        assert_eq!(param_string(&params, &["strategy", "renderMode"], "none"), "Blit");
        assert_eq!(param_string(&json!({"strategy": 42}), &["strategy"], "blit"), "blit");
    }

    #[test]
    fn empty_key_list_always_defaults() {
        assert_eq!(param_i64(&json!({"a": 1}), &[], 5), 5);
    }
}
