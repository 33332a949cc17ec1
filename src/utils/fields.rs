//! Field probing over loosely shaped API JSON.
//!
//! The booking API does not keep a stable contract: the same id may come back
//! as `user_id`, `userId` or `id`, numbers may arrive as strings, and payloads
//! may or may not be wrapped in an envelope. Everything that reads API JSON
//! goes through these helpers so the fallback lists live in one place.

use crate::utils::error::{PawcareError, Result};
use serde_json::Value;

/// 以點號路徑取值，例如 `user.profile.name`
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for part in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Strings are returned as-is (trimmed); numbers and booleans are stringified.
pub fn probe_string(value: &Value, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|path| match lookup(value, path)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

pub fn probe_i64(value: &Value, candidates: &[&str]) -> Option<i64> {
    candidates.iter().find_map(|path| match lookup(value, path)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

pub fn probe_f64(value: &Value, candidates: &[&str]) -> Option<f64> {
    candidates.iter().find_map(|path| match lookup(value, path)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

pub fn probe_bool(value: &Value, candidates: &[&str]) -> Option<bool> {
    candidates.iter().find_map(|path| match lookup(value, path)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "y" | "active" => Some(true),
            "false" | "0" | "no" | "n" | "inactive" | "disabled" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Collects a list of strings from either a JSON array or a comma separated string.
pub fn probe_string_list(value: &Value, candidates: &[&str]) -> Vec<String> {
    for path in candidates {
        match lookup(value, path) {
            Some(Value::Array(items)) => {
                return items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s.trim().to_string()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .filter(|s| !s.is_empty())
                    .collect();
            }
            Some(Value::String(s)) if !s.trim().is_empty() => {
                return s
                    .split(',')
                    .map(|part| part.trim().to_string())
                    .filter(|part| !part.is_empty())
                    .collect();
            }
            _ => {}
        }
    }
    Vec::new()
}

pub fn require_string(value: &Value, candidates: &[&str], entity: &str) -> Result<String> {
    probe_string(value, candidates).ok_or_else(|| PawcareError::ResponseShapeError {
        message: format!(
            "{} is missing any of the fields [{}]",
            entity,
            candidates.join(", ")
        ),
    })
}

const ENVELOPE_KEYS: &[&str] = &["data", "result", "item", "payload"];
const LIST_KEYS: &[&str] = &["data", "items", "results", "rows", "records"];

/// Unwraps `{ "data": {...} }` style envelopes. Extra keys (beyond the
/// envelope key plus status/message chatter) mean the object is the record.
pub fn unwrap_envelope(value: Value, extra_keys: &[&str]) -> Value {
    let mut current = value;
    loop {
        let next = match &current {
            Value::Object(map) => ENVELOPE_KEYS
                .iter()
                .chain(extra_keys.iter())
                .find_map(|key| match map.get(*key) {
                    Some(inner @ Value::Object(_)) if is_envelope(map, key) => Some(inner.clone()),
                    _ => None,
                }),
            _ => None,
        };
        match next {
            Some(inner) => current = inner,
            None => return current,
        }
    }
}

fn is_envelope(map: &serde_json::Map<String, Value>, key: &str) -> bool {
    const CHATTER: &[&str] = &["status", "success", "message", "msg", "code", "ok", "token"];
    map.keys()
        .all(|k| k == key || CHATTER.contains(&k.as_str()))
}

/// Normalises a list response: bare arrays, arrays under a list key, a single
/// object (treated as one record) and null (treated as empty).
pub fn as_list(value: Value, extra_keys: &[&str]) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        Value::Object(mut map) => {
            for key in LIST_KEYS.iter().chain(extra_keys.iter()) {
                match map.get(*key) {
                    Some(Value::Array(_)) => {
                        if let Some(Value::Array(items)) = map.remove(*key) {
                            return items;
                        }
                    }
                    Some(Value::Object(_)) => {
                        if let Some(inner) = map.remove(*key) {
                            return as_list(inner, extra_keys);
                        }
                    }
                    Some(Value::Null) => return Vec::new(),
                    _ => {}
                }
            }
            if map.is_empty() {
                Vec::new()
            } else {
                vec![Value::Object(map)]
            }
        }
        other => {
            tracing::warn!("⚠️ Expected a list response, got scalar: {}", other);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_probe_uses_first_present_candidate() {
        let body = json!({"userId": 7, "id": 99});
        assert_eq!(
            probe_string(&body, &["user_id", "userId", "id"]).as_deref(),
            Some("7")
        );
    }

    #[test]
    fn test_probe_skips_null_and_blank() {
        let body = json!({"pet_id": null, "PETID": "  ", "id": "p-1"});
        assert_eq!(
            probe_string(&body, &["pet_id", "PETID", "id"]).as_deref(),
            Some("p-1")
        );
        assert!(probe_string(&body, &["pet_id", "PETID"]).is_none());
    }

    #[test]
    fn test_nested_lookup() {
        let body = json!({"user": {"profile": {"name": "Amy"}}, "tags": ["a", "b"]});
        assert_eq!(lookup(&body, "user.profile.name"), Some(&json!("Amy")));
        assert_eq!(lookup(&body, "tags.1"), Some(&json!("b")));
        assert!(lookup(&body, "user.missing").is_none());
    }

    #[test]
    fn test_numeric_probes_accept_strings() {
        let body = json!({"age": "4", "weight": "3.5", "price": 800});
        assert_eq!(probe_i64(&body, &["age"]), Some(4));
        assert_eq!(probe_f64(&body, &["weight"]), Some(3.5));
        assert_eq!(probe_f64(&body, &["amount", "price"]), Some(800.0));
    }

    #[test]
    fn test_probe_bool_variants() {
        assert_eq!(probe_bool(&json!({"is_active": 0}), &["is_active"]), Some(false));
        assert_eq!(probe_bool(&json!({"active": "yes"}), &["active"]), Some(true));
        assert_eq!(probe_bool(&json!({"active": "maybe"}), &["active"]), None);
    }

    #[test]
    fn test_string_list_from_array_or_csv() {
        assert_eq!(
            probe_string_list(&json!({"times": ["09:00", "10:00"]}), &["times"]),
            vec!["09:00", "10:00"]
        );
        assert_eq!(
            probe_string_list(&json!({"times": "09:00, 10:00"}), &["times"]),
            vec!["09:00", "10:00"]
        );
        assert!(probe_string_list(&json!({}), &["times"]).is_empty());
    }

    #[test]
    fn test_unwrap_envelope() {
        let wrapped = json!({"success": true, "data": {"id": 1, "name": "Amy"}});
        assert_eq!(unwrap_envelope(wrapped, &[]), json!({"id": 1, "name": "Amy"}));

        let nested = json!({"data": {"user": {"id": 1}}});
        assert_eq!(unwrap_envelope(nested, &["user"]), json!({"id": 1}));

        // 有其他欄位時不是 envelope
        let record = json!({"id": 1, "data": {"x": 1}});
        assert_eq!(unwrap_envelope(record.clone(), &[]), record);
    }

    #[test]
    fn test_as_list_shapes() {
        assert_eq!(as_list(json!([{"id": 1}]), &[]).len(), 1);
        assert_eq!(as_list(json!({"pets": [{"id": 1}, {"id": 2}]}), &["pets"]).len(), 2);
        assert_eq!(as_list(json!({"data": {"items": [{"id": 1}]}}), &[]).len(), 1);
        assert_eq!(as_list(json!({"id": 1}), &[]).len(), 1);
        assert!(as_list(json!(null), &[]).is_empty());
        assert!(as_list(json!({"data": null}), &[]).is_empty());
        assert!(as_list(json!({}), &[]).is_empty());
    }

    #[test]
    fn test_require_string_reports_candidates() {
        let err = require_string(&json!({}), &["token", "access_token"], "Login response")
            .unwrap_err();
        assert!(err.to_string().contains("token, access_token"));
    }
}
