// Helpers over the job variable mapping (a JSON object) plus the lenient
// scalar coercions the response validator needs.

use serde_json::{Map, Value};

/// The variable mapping carried by jobs and messages.
pub type Variables = Map<String, Value>;

pub struct VarUtil;

impl VarUtil {
    /// Extract a non-empty string variable.
    pub fn get_string(variables: &Variables, key: &str) -> Option<String> {
        match variables.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    /// Coerce a JSON value to a boolean.
    ///
    /// Accepts booleans, the strings "true"/"false" (case-insensitive), and
    /// the numbers 0/1. Anything else is a coercion failure, not a default.
    pub fn coerce_bool(value: &Value) -> Option<bool> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            _ => None,
        }
    }

    /// Coerce a JSON value to an integer.
    ///
    /// Accepts integers, floats with an integral value, and numeric strings.
    pub fn coerce_i64(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Some(i);
                }
                n.as_f64().and_then(|f| {
                    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                        Some(f as i64)
                    } else {
                        None
                    }
                })
            }
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }
}
