//! Stable identifier normalization.
//!
//! Task ids double as graph lookup keys and as externally-visible
//! selector-style tokens, so two properties must hold at once: values that
//! denote the same logical identifier normalize to the same key, and every
//! key stays within the symbol-safe alphabet `[A-Za-z0-9_-]`.
//!
//! The first property matters because tabular engines widen integer columns
//! to float the moment a null appears: an id column reads `276` while the
//! dependency column reads `276.0`. Both must come out as `"276"` or no
//! dependency edge ever resolves.
//!
//! The second is handled by a fixed escape: every character outside the safe
//! alphabet becomes `_xHH_` from its code point. The encoding is
//! deterministic, injective over the practical input space (`54.8` and
//! `54_8` stay distinct), and reversible in principle.

use crate::models::Value;

/// Normalizes one raw value into a stable, symbol-safe key.
///
/// Missing values map to the empty string; whole-number numerics (and their
/// float-formatted string forms like `"276.0"`) map to the decimal integer
/// string; everything else is escaped.
pub fn normalize_id(value: &Value) -> String {
    match value {
        Value::Missing => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => {
            if f.is_nan() {
                String::new()
            } else if f.fract() == 0.0 && f.is_finite() {
                format!("{}", *f as i64)
            } else {
                encode_symbol_safe(&format!("{f}"))
            }
        }
        Value::Text(s) => {
            let trimmed = s.trim();
            if let Ok(f) = trimmed.parse::<f64>() {
                if f.fract() == 0.0 && f.is_finite() {
                    return format!("{}", f as i64);
                }
            }
            encode_symbol_safe(trimmed)
        }
        Value::Temporal(dt) => encode_symbol_safe(&dt.format("%Y-%m-%d").to_string()),
    }
}

/// Escapes every character outside `[A-Za-z0-9_-]` as `_xHH_` from its
/// code point.
pub fn encode_symbol_safe(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            out.push(c);
        } else {
            out.push_str(&format!("_x{:02x}_", c as u32));
        }
    }
    out
}

/// Extracts and normalizes a raw dependency cell into a list of stable keys.
///
/// Text cells are comma-split and trimmed, each token normalized on its own;
/// a bare numeric cell is a single dependency. Missing cells and empty
/// tokens yield nothing.
pub fn extract_dependencies(value: &Value) -> Vec<String> {
    if value.is_missing() {
        return Vec::new();
    }

    match value {
        Value::Text(s) => s
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| normalize_id(&Value::Text(token.to_string())))
            .collect(),
        other => {
            let id = normalize_id(other);
            if id.is_empty() {
                Vec::new()
            } else {
                vec![id]
            }
        }
    }
}
