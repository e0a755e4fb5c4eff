//! # Canonical Serialization
//!
//! Normalizes parameter data into a unique byte form used for equality checks
//! and variant key hashing. Two parameter sets with the same keys and values
//! serialize identically regardless of insertion order; any key or value
//! difference produces different bytes.
//!
//! ## Rules
//!
//! - Object keys sorted lexicographically (byte order), recursively
//! - Array order preserved
//! - Numbers in shortest round-trip decimal form (`1.0` and `1` are both `1`)
//! - Booleans as `true`/`false`, strings JSON-escaped
//! - Subtrees nested deeper than [`MAX_CANONICAL_DEPTH`] become `null`
//!
//! The serializer is total: it never fails.
//!
//! ## Example
//!
//! ```rust
//! use variant_core::canonical::canonicalize;
//! use variant_core::params::ParamSet;
//!
//! let a = ParamSet::new().with("a", 1.0).with("b", 2.0);
//! let b = ParamSet::new().with("b", 2.0).with("a", 1.0);
//! assert_eq!(canonicalize(&a), canonicalize(&b));
//! assert_eq!(canonicalize(&a), br#"{"a":1,"b":2}"#.to_vec());
//! ```

use serde_json::Value;

use crate::params::ParamSet;

/// Nesting depth beyond which subtrees are replaced by `null`.
pub const MAX_CANONICAL_DEPTH: usize = 64;

/// Canonical bytes for a parameter set.
pub fn canonicalize(params: &ParamSet) -> Vec<u8> {
    canonicalize_value(&params.to_json()).into_bytes()
}

/// Canonical string for an arbitrary JSON value.
pub fn canonicalize_value(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    if depth > MAX_CANONICAL_DEPTH {
        out.push_str("null");
        return;
    }
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                out.push_str(&i.to_string());
            } else if let Some(u) = n.as_u64() {
                out.push_str(&u.to_string());
            } else {
                match n.as_f64() {
                    Some(f) => out.push_str(&format_number(f)),
                    None => out.push_str("null"),
                }
            }
        }
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item, depth + 1);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                if let Some(v) = map.get(key) {
                    write_value(out, v, depth + 1);
                }
            }
            out.push('}');
        }
    }
}

fn write_string(out: &mut String, s: &str) {
    // Value's Display is infallible and applies standard JSON escaping
    out.push_str(&Value::String(s.to_string()).to_string());
}

/// Shortest round-trip decimal for a float. Integral values print without a
/// fractional part, `-0` prints as `0`, non-finite values print as `null`.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "null".to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}

/// Canonical equality of two parameter sets.
pub fn canonical_eq(a: &ParamSet, b: &ParamSet) -> bool {
    canonicalize(a) == canonicalize(b)
}
