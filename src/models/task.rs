//! Renderable task model.
//!
//! A task is one schedulable bar in the output chart, derived from one input
//! record. The `id` is the stable, symbol-safe graph key; `display_id` keeps
//! the original identifier for presentation only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dates;

/// One tooltip field, order-preserved as configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    /// Column name the value came from.
    pub label: String,
    /// Type-preserving formatted value.
    pub value: FieldValue,
}

/// A tooltip value that keeps its source type on the wire.
///
/// Numbers stay numeric, missing cells become JSON null, everything else is
/// text (date-like values are pre-formatted to `YYYY-MM-DD`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Missing cell.
    Null,
    /// Integer cell.
    Integer(i64),
    /// Float cell.
    Float(f64),
    /// Text or formatted date.
    Text(String),
}

/// One schedulable unit in the transformation output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Stable, symbol-safe identifier, unique within a result.
    pub id: String,
    /// Original identifier, for presentation only (not necessarily unique).
    pub display_id: String,
    /// Task label; falls back to `display_id` when no name is available.
    pub name: String,
    /// Start date, canonical `YYYY-MM-DD`.
    pub start: String,
    /// End date, canonical `YYYY-MM-DD`. Always `start <= end`.
    pub end: String,
    /// Completion percentage in `[0, 100]`, when the source cell was numeric.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    /// Stable ids of prerequisite tasks. Reference-clean and cycle-free
    /// after validation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    /// Palette token or progress-tier token for the task bar.
    pub color_class: String,
    /// Where linear progress would stand today, present only while the task
    /// is in flight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_progress: Option<f64>,
    /// True iff `progress == 100`.
    pub is_complete: bool,
    /// Tooltip fields in configured order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<CustomField>,
    /// Group-by column values, consumed by hierarchical ordering.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub group_values: BTreeMap<String, Option<String>>,
    /// Dependency list rendered as task names, display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_dependencies: Option<String>,
}

impl Task {
    /// Creates a minimal task; remaining fields start at their neutral values.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            display_id: id.clone(),
            id,
            name: name.into(),
            start: start.into(),
            end: end.into(),
            progress: None,
            dependencies: Vec::new(),
            color_class: String::new(),
            expected_progress: None,
            is_complete: false,
            custom_fields: Vec::new(),
            group_values: BTreeMap::new(),
            display_dependencies: None,
        }
    }

    /// Sets the dependency list.
    pub fn with_dependencies(mut self, deps: Vec<String>) -> Self {
        self.dependencies = deps;
        self
    }

    /// Sets the progress percentage.
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self.is_complete = progress == 100;
        self
    }

    /// Sets one group-by value.
    pub fn with_group_value(
        mut self,
        column: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        self.group_values.insert(column.into(), value);
        self
    }

    /// Task length in whole days, `0` when either date fails to parse.
    pub fn duration_days(&self) -> i64 {
        match (dates::parse_iso(&self.start), dates::parse_iso(&self.end)) {
            (Some(start), Some(end)) => (end - start).num_days(),
            _ => 0,
        }
    }
}
