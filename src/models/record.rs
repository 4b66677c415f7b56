//! Tabular ingestion types.
//!
//! Input rows carry no schema guarantees: a date column may hold strings,
//! epoch numbers, or nulls; an identifier column may hold integers that a
//! tabular engine silently widened to floats. `Value` makes that explicit
//! as a tagged variant so every normalizer can pattern-match instead of
//! guessing types, and `RecordSet` is the column-named, row-major container
//! the transformation pipeline consumes.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single cell value of unknown provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null, NaN marker, or absent cell.
    Missing,
    /// Exact integer.
    Integer(i64),
    /// Floating-point number. `NaN` is treated as missing.
    Float(f64),
    /// Free text.
    Text(String),
    /// A date/timestamp-typed value from the source engine.
    Temporal(NaiveDateTime),
}

/// Shared missing cell, returned for absent columns.
pub(crate) const MISSING: Value = Value::Missing;

impl Value {
    /// Whether this value counts as missing (null or float NaN).
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Short type label used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Missing => "missing",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Temporal(_) => "temporal",
        }
    }

    /// Human-facing string form.
    ///
    /// Whole-number floats render without the fractional part (`276.0` →
    /// `"276"`) so values that denote the same logical identifier read the
    /// same regardless of how the source engine typed the column. Text is
    /// trimmed; missing renders empty.
    pub fn display_string(&self) -> String {
        match self {
            Value::Missing => String::new(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.is_nan() {
                    String::new()
                } else if f.fract() == 0.0 && f.is_finite() {
                    format!("{}", *f as i64)
                } else {
                    format!("{f}")
                }
            }
            Value::Text(s) => s.trim().to_string(),
            Value::Temporal(dt) => dt.format("%Y-%m-%d").to_string(),
        }
    }

    /// Numeric view, when the value is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Temporal(v)
    }
}

/// A sequence of named-field records, already filtered upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RecordSet {
    /// Creates an empty record set with the given column names.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row. Short rows are padded with `Missing`; extra cells are
    /// dropped so every row stays aligned with the column list.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Missing);
        self.rows.push(row);
    }

    /// Builder-style row append.
    pub fn with_row(mut self, row: Vec<Value>) -> Self {
        self.push_row(row);
        self
    }

    /// Column names, in declaration order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether a column exists.
    pub fn contains_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the record set has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `(row, column)`. Absent columns and out-of-range rows read
    /// as `Missing`, mirroring how optional configured columns degrade.
    pub fn cell(&self, row: usize, column: &str) -> &Value {
        let idx = match self.columns.iter().position(|c| c == column) {
            Some(idx) => idx,
            None => return &MISSING,
        };
        self.rows
            .get(row)
            .and_then(|r| r.get(idx))
            .unwrap_or(&MISSING)
    }

    /// All values of one column, top to bottom. Empty if the column is absent.
    ///
    /// Rows built through deserialization may be shorter than the column
    /// list; absent cells read as `Missing`, same as [`cell`](Self::cell).
    pub fn column_values<'a>(&'a self, column: &str) -> Vec<&'a Value> {
        match self.columns.iter().position(|c| c == column) {
            Some(idx) => self
                .rows
                .iter()
                .map(|r| r.get(idx).unwrap_or(&MISSING))
                .collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_detection() {
        assert!(Value::Missing.is_missing());
        assert!(Value::Float(f64::NAN).is_missing());
        assert!(!Value::Float(0.0).is_missing());
        assert!(!Value::Text(String::new()).is_missing());
    }

    #[test]
    fn test_display_string_collapses_whole_floats() {
        assert_eq!(Value::Float(276.0).display_string(), "276");
        assert_eq!(Value::Float(54.8).display_string(), "54.8");
        assert_eq!(Value::Integer(276).display_string(), "276");
        assert_eq!(Value::Text("  abc ".into()).display_string(), "abc");
        assert_eq!(Value::Missing.display_string(), "");
    }

    #[test]
    fn test_record_set_cell_access() {
        let rs = RecordSet::new(vec!["a".into(), "b".into()])
            .with_row(vec![Value::Integer(1), Value::from("x")])
            .with_row(vec![Value::Integer(2)]);

        assert_eq!(rs.len(), 2);
        assert_eq!(rs.cell(0, "a"), &Value::Integer(1));
        // Short row padded with Missing
        assert_eq!(rs.cell(1, "b"), &Value::Missing);
        // Unknown column reads as Missing
        assert_eq!(rs.cell(0, "zzz"), &Value::Missing);
        assert!(!rs.contains_column("zzz"));
    }

    #[test]
    fn test_column_values() {
        let rs = RecordSet::new(vec!["a".into()])
            .with_row(vec![Value::Integer(1)])
            .with_row(vec![Value::Missing]);
        assert_eq!(rs.column_values("a").len(), 2);
        assert!(rs.column_values("other").is_empty());
    }

    #[test]
    fn test_deserialized_short_rows_read_as_missing() {
        // Deserialization bypasses push_row padding, so rows may be short.
        let rs: RecordSet = serde_json::from_str(
            r#"{"columns":["id","team"],"rows":[[{"Text":"T1"}]]}"#,
        )
        .unwrap();
        assert_eq!(rs.cell(0, "team"), &Value::Missing);
        assert_eq!(rs.column_values("team"), vec![&Value::Missing]);
        assert_eq!(rs.column_values("id"), vec![&Value::Text("T1".into())]);
    }
}
