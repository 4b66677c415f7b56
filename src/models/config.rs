//! Transformation configuration.
//!
//! An immutable, fully-typed view of what the caller selected: which columns
//! feed which task fields, how to color, group, sort, and cap the output.
//! All optional knobs carry documented defaults; validation against the
//! actual input schema happens in one place, at the start of a run.

use serde::{Deserialize, Serialize};

use crate::palette::PaletteName;

/// Sort criterion for the ordered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Keep input order.
    #[default]
    None,
    /// Ascending start date.
    StartAsc,
    /// Descending start date.
    StartDesc,
    /// Ascending end date.
    EndAsc,
    /// Descending end date.
    EndDesc,
    /// Ascending name, case-insensitive.
    NameAsc,
    /// Descending name, case-insensitive.
    NameDesc,
    /// Ascending duration in whole days.
    DurationAsc,
    /// Descending duration in whole days.
    DurationDesc,
    /// Dependency-respecting topological order.
    Dependencies,
}

/// How to resolve a task id that already occurred earlier in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateIdPolicy {
    /// Keep the row, renaming its id with a numeric suffix (`A` → `A_1`).
    #[default]
    Rename,
    /// Drop the row, counting it under the `duplicate_id` skip reason.
    Skip,
}

fn default_max_tasks() -> usize {
    1000
}

/// Immutable input configuration for one transformation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformConfig {
    /// Column holding the task identifier. Required.
    pub id_column: String,
    /// Column holding the start date. Required.
    pub start_column: String,
    /// Column holding the end date. Required.
    pub end_column: String,
    /// Column holding the task name. Falls back to the display id.
    #[serde(default)]
    pub name_column: Option<String>,
    /// Column holding completion percentage.
    #[serde(default)]
    pub progress_column: Option<String>,
    /// Column holding the comma-separated dependency list.
    #[serde(default)]
    pub dependencies_column: Option<String>,
    /// Categorical column driving bar colors.
    #[serde(default)]
    pub color_column: Option<String>,
    /// Which built-in palette to use. Default `classic`.
    #[serde(default)]
    pub palette: PaletteName,
    /// Hex colors for the `custom` palette (6 to 12 entries).
    #[serde(default)]
    pub custom_colors: Option<Vec<String>>,
    /// Tooltip columns, order-significant.
    #[serde(default)]
    pub tooltip_columns: Vec<String>,
    /// Group-by columns, outer to inner, order-significant.
    #[serde(default)]
    pub group_by_columns: Vec<String>,
    /// Sort criterion. Default `none`.
    #[serde(default)]
    pub sort_by: SortBy,
    /// Maximum number of output tasks; `0` means unlimited. Default `1000`.
    #[serde(default = "default_max_tasks")]
    pub max_tasks: usize,
    /// Duplicate-id resolution. Default `rename`.
    #[serde(default)]
    pub duplicate_id_policy: DuplicateIdPolicy,
}

impl TransformConfig {
    /// Creates a configuration with the three required column selectors;
    /// everything else starts at its default.
    pub fn new(
        id_column: impl Into<String>,
        start_column: impl Into<String>,
        end_column: impl Into<String>,
    ) -> Self {
        Self {
            id_column: id_column.into(),
            start_column: start_column.into(),
            end_column: end_column.into(),
            name_column: None,
            progress_column: None,
            dependencies_column: None,
            color_column: None,
            palette: PaletteName::default(),
            custom_colors: None,
            tooltip_columns: Vec::new(),
            group_by_columns: Vec::new(),
            sort_by: SortBy::default(),
            max_tasks: default_max_tasks(),
            duplicate_id_policy: DuplicateIdPolicy::default(),
        }
    }

    /// Sets the name column.
    pub fn with_name_column(mut self, column: impl Into<String>) -> Self {
        self.name_column = Some(column.into());
        self
    }

    /// Sets the progress column.
    pub fn with_progress_column(mut self, column: impl Into<String>) -> Self {
        self.progress_column = Some(column.into());
        self
    }

    /// Sets the dependencies column.
    pub fn with_dependencies_column(mut self, column: impl Into<String>) -> Self {
        self.dependencies_column = Some(column.into());
        self
    }

    /// Sets the color column.
    pub fn with_color_column(mut self, column: impl Into<String>) -> Self {
        self.color_column = Some(column.into());
        self
    }

    /// Sets the palette.
    pub fn with_palette(mut self, palette: PaletteName) -> Self {
        self.palette = palette;
        self
    }

    /// Sets the custom palette colors.
    pub fn with_custom_colors(mut self, colors: Vec<String>) -> Self {
        self.custom_colors = Some(colors);
        self
    }

    /// Sets the tooltip columns.
    pub fn with_tooltip_columns(mut self, columns: Vec<String>) -> Self {
        self.tooltip_columns = columns;
        self
    }

    /// Sets the group-by columns, outer to inner.
    pub fn with_group_by_columns(mut self, columns: Vec<String>) -> Self {
        self.group_by_columns = columns;
        self
    }

    /// Sets the sort criterion.
    pub fn with_sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    /// Sets the output cap (`0` = unlimited).
    pub fn with_max_tasks(mut self, max_tasks: usize) -> Self {
        self.max_tasks = max_tasks;
        self
    }

    /// Sets the duplicate-id policy.
    pub fn with_duplicate_id_policy(mut self, policy: DuplicateIdPolicy) -> Self {
        self.duplicate_id_policy = policy;
        self
    }
}
