//! Row transformation orchestrator.
//!
//! Single-pass pipeline from a raw record set to a validated task list:
//!
//! 1. Validate configuration against the input schema (fatal on missing
//!    required columns or empty input).
//! 2. Build the color mapping once, if a color column is configured.
//! 3. Process each record into a task (dates, ids, progress, dependencies,
//!    tooltip fields, group values), skipping defective records with a
//!    recorded reason.
//! 4. Resolve duplicate ids per the configured policy.
//! 5. Validate the dependency graph (references, cycles).
//! 6. Order and group the result.
//! 7. Resolve dependency ids to names for display.
//! 8. Apply the output cap.
//! 9. Assemble totals, the skip-reason histogram, warnings, and duplicate
//!    incidents.
//!
//! Only configuration validation and empty input are fatal; every other
//! defect degrades a single record or emits a warning, never aborting the
//! run. The transformer holds no state across runs.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Local, NaiveDate};
use thiserror::Error;
use tracing::{info, warn};

use crate::dates;
use crate::ident;
use crate::models::{
    CustomField, DuplicateIdPolicy, DuplicateIncident, DuplicateOccurrence, FieldValue,
    OccurrenceStatus, RecordSet, SkipReason, Task, TransformConfig, TransformMetadata,
    TransformResult, Value,
};
use crate::ordering;
use crate::palette::{self, ColorMapping};
use crate::validation;

/// Fatal, non-retryable transformation failures.
///
/// Everything else the pipeline encounters degrades to a skipped record or
/// a warning inside the result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The input record set has no rows.
    #[error("input record set is empty")]
    EmptyInput,
    /// One or more required column selectors are absent from the schema.
    #[error("required columns not found: {}. Available columns: {}", missing.join(", "), available.join(", "))]
    MissingColumns {
        /// The configured required columns that are absent.
        missing: Vec<String>,
        /// Every column the input actually has.
        available: Vec<String>,
    },
}

/// Transforms raw records into renderable Gantt tasks.
///
/// One transformer holds one immutable [`TransformConfig`]; every call to
/// [`transform`](Self::transform) is an independent run.
#[derive(Debug, Clone)]
pub struct TaskTransformer {
    config: TransformConfig,
}

impl TaskTransformer {
    /// Creates a transformer for the given configuration.
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    /// Runs the full pipeline over one record set.
    pub fn transform(&self, records: &RecordSet) -> Result<TransformResult, TransformError> {
        self.validate_config(records)?;

        let total_rows = records.len();
        let today = Local::now().date_naive();

        let color_mapping = self.config.color_column.as_deref().and_then(|column| {
            let mapping = palette::create_color_mapping(
                records,
                column,
                self.config.palette,
                self.config.custom_colors.as_deref(),
            );
            if mapping.is_empty() {
                None
            } else {
                Some(mapping)
            }
        });

        let mut state = RunState::default();
        let mut tasks: Vec<Task> = Vec::new();
        let mut seen: HashMap<String, Vec<usize>> = HashMap::new();
        let mut incidents: Vec<DuplicateIncident> = Vec::new();
        let mut incident_index: HashMap<String, usize> = HashMap::new();

        for row in 0..total_rows {
            let Some(mut task) =
                self.process_row(records, row, color_mapping.as_ref(), today, &mut state)
            else {
                continue;
            };

            let prior = seen.get(&task.id).map(|rows| (rows[0], rows.len()));
            if let Some((first_row, occurrence_count)) = prior {
                let original_id = task.id.clone();
                seen.get_mut(&original_id)
                    .expect("registry entry present")
                    .push(row);

                let idx = *incident_index.entry(original_id.clone()).or_insert_with(|| {
                    incidents.push(DuplicateIncident {
                        original_id: original_id.clone(),
                        occurrences: vec![DuplicateOccurrence {
                            row_index: first_row,
                            assigned_id: Some(original_id.clone()),
                            status: OccurrenceStatus::Kept,
                        }],
                    });
                    incidents.len() - 1
                });

                match self.config.duplicate_id_policy {
                    DuplicateIdPolicy::Skip => {
                        state.skip(SkipReason::DuplicateId);
                        incidents[idx].occurrences.push(DuplicateOccurrence {
                            row_index: row,
                            assigned_id: None,
                            status: OccurrenceStatus::Skipped,
                        });
                        continue;
                    }
                    DuplicateIdPolicy::Rename => {
                        // A suffixed candidate can itself occur in the input
                        // (or have been assigned already); bump until unused
                        // and register it so later rows cannot alias it.
                        let mut suffix = occurrence_count;
                        let mut new_id = format!("{original_id}_{suffix}");
                        while seen.contains_key(&new_id) {
                            suffix += 1;
                            new_id = format!("{original_id}_{suffix}");
                        }
                        seen.insert(new_id.clone(), vec![row]);
                        task.id = new_id.clone();
                        incidents[idx].occurrences.push(DuplicateOccurrence {
                            row_index: row,
                            assigned_id: Some(new_id.clone()),
                            status: OccurrenceStatus::Renamed,
                        });
                        state.warnings.push(format!(
                            "Duplicate task ID '{original_id}' at row {row}. Renamed to '{new_id}'."
                        ));
                    }
                }
            } else {
                seen.insert(task.id.clone(), vec![row]);
            }

            tasks.push(task);
        }

        // A renamed duplicate leaves references to the original id
        // ambiguous; warn rather than silently redirecting.
        if self.config.duplicate_id_policy == DuplicateIdPolicy::Rename && !incidents.is_empty() {
            let renamed: HashSet<&str> =
                incidents.iter().map(|i| i.original_id.as_str()).collect();
            for task in &tasks {
                for dep in &task.dependencies {
                    if renamed.contains(dep.as_str()) {
                        state.warnings.push(format!(
                            "Task '{}' depends on '{dep}' which has duplicates. Dependency may be ambiguous.",
                            task.name
                        ));
                    }
                }
            }
        }

        info!(
            tasks = tasks.len(),
            total_rows, "processed records into tasks"
        );

        if !tasks.is_empty() {
            let (validated, dep_warnings) = validation::validate_dependencies(tasks);
            state.warnings.extend(dep_warnings);

            let (ordered, sort_warnings) = ordering::group_and_sort(
                validated,
                &self.config.group_by_columns,
                self.config.sort_by,
            );
            state.warnings.extend(sort_warnings);
            tasks = ordered;

            resolve_display_dependencies(&mut tasks);
        }

        if self.config.max_tasks > 0 && tasks.len() > self.config.max_tasks {
            let original_count = tasks.len();
            tasks.truncate(self.config.max_tasks);
            state.warnings.push(format!(
                "Dataset has {original_count} tasks. Displaying first {} due to the task limit. \
                 Consider filtering the data or raising the limit.",
                self.config.max_tasks
            ));
        }

        let displayed_rows = tasks.len();
        Ok(TransformResult {
            tasks,
            metadata: TransformMetadata {
                total_rows,
                displayed_rows,
                skipped_rows: total_rows - displayed_rows,
                skip_reasons: state.skip_reasons,
                warnings: state.warnings,
                duplicate_ids: incidents,
            },
            color_mapping,
        })
    }

    /// Checks the configuration against the actual input schema.
    ///
    /// Missing required columns and empty input are fatal; configured
    /// optional columns that are absent are logged and degrade per-row.
    fn validate_config(&self, records: &RecordSet) -> Result<(), TransformError> {
        if records.is_empty() {
            return Err(TransformError::EmptyInput);
        }

        let required = [
            &self.config.id_column,
            &self.config.start_column,
            &self.config.end_column,
        ];
        let missing: Vec<String> = required
            .iter()
            .filter(|c| !records.contains_column(c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(TransformError::MissingColumns {
                missing,
                available: records.columns().to_vec(),
            });
        }

        let mut optional: Vec<&String> = Vec::new();
        optional.extend(self.config.name_column.iter());
        optional.extend(self.config.progress_column.iter());
        optional.extend(self.config.dependencies_column.iter());
        optional.extend(self.config.color_column.iter());
        optional.extend(self.config.tooltip_columns.iter());
        optional.extend(self.config.group_by_columns.iter());

        let missing_optional: Vec<&str> = optional
            .into_iter()
            .filter(|c| !records.contains_column(c))
            .map(|c| c.as_str())
            .collect();
        if !missing_optional.is_empty() {
            warn!(
                columns = missing_optional.join(", "),
                "optional columns not found, skipping them"
            );
        }

        Ok(())
    }

    /// Builds one task from one record, or skips it with a recorded reason.
    fn process_row(
        &self,
        records: &RecordSet,
        row: usize,
        color_mapping: Option<&ColorMapping>,
        today: NaiveDate,
        state: &mut RunState,
    ) -> Option<Task> {
        let config = &self.config;

        let start = dates::normalize_date(records.cell(row, &config.start_column));
        let end = dates::normalize_date(records.cell(row, &config.end_column));
        let (Ok(start), Ok(end)) = (start, end) else {
            state.skip(SkipReason::InvalidDates);
            return None;
        };

        if !dates::validate_date_range(&start, &end) {
            warn!(row, %start, %end, "start date after end date, skipping row");
            state.skip(SkipReason::StartAfterEnd);
            return None;
        }

        let raw_id = records.cell(row, &config.id_column);
        let display = raw_id.display_string();
        let (id, display_id) = if display.is_empty() {
            let generated = format!("task_{row}");
            (generated.clone(), generated)
        } else {
            (ident::normalize_id(raw_id), display)
        };

        let name = config
            .name_column
            .as_deref()
            .map(|column| records.cell(row, column).display_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| display_id.clone());

        let progress = config
            .progress_column
            .as_deref()
            .and_then(|column| extract_progress(records.cell(row, column)));

        let mut dependencies = Vec::new();
        let mut display_dependencies = None;
        if let Some(column) = config.dependencies_column.as_deref() {
            let raw = records.cell(row, column);
            dependencies = ident::extract_dependencies(raw);
            let raw_display = raw.display_string();
            if !raw_display.is_empty() {
                display_dependencies = Some(raw_display);
            }
        }

        let color_class = match (config.color_column.as_deref(), color_mapping) {
            (Some(column), Some(mapping)) => {
                palette::color_class(records.cell(row, column), mapping).to_string()
            }
            _ => format!(
                "bar-default-tier-{}",
                progress_tier(progress.unwrap_or(0))
            ),
        };

        let mut custom_fields = Vec::new();
        for column in &config.tooltip_columns {
            if records.contains_column(column) {
                custom_fields.push(CustomField {
                    label: column.clone(),
                    value: field_value(records.cell(row, column)),
                });
            }
        }

        let mut group_values = BTreeMap::new();
        for column in &config.group_by_columns {
            if records.contains_column(column) {
                let value = records.cell(row, column);
                let entry = if value.is_missing() {
                    None
                } else {
                    Some(value.display_string())
                };
                group_values.insert(column.clone(), entry);
            }
        }

        Some(Task {
            id,
            display_id,
            name,
            expected_progress: expected_progress(&start, &end, today),
            start,
            end,
            is_complete: progress == Some(100),
            progress,
            dependencies,
            color_class,
            custom_fields,
            group_values,
            display_dependencies,
        })
    }
}

#[derive(Default)]
struct RunState {
    skip_reasons: BTreeMap<SkipReason, usize>,
    warnings: Vec<String>,
}

impl RunState {
    fn skip(&mut self, reason: SkipReason) {
        *self.skip_reasons.entry(reason).or_insert(0) += 1;
    }
}

/// Rewrites each task's display dependencies as resolved task names,
/// falling back to the raw id for anything unresolved.
fn resolve_display_dependencies(tasks: &mut [Task]) {
    let id_to_name: HashMap<String, String> = tasks
        .iter()
        .map(|t| (t.id.clone(), t.name.clone()))
        .collect();
    for task in tasks.iter_mut() {
        if task.dependencies.is_empty() {
            continue;
        }
        let names: Vec<&str> = task
            .dependencies
            .iter()
            .map(|dep| id_to_name.get(dep).map(String::as_str).unwrap_or(dep))
            .collect();
        task.display_dependencies = Some(names.join(", "));
    }
}

/// Clamps a raw progress cell to an integer percentage in `[0, 100]`.
///
/// Non-numeric text and missing cells yield `None`; fractional values
/// truncate toward zero before clamping.
fn extract_progress(value: &Value) -> Option<u8> {
    if value.is_missing() {
        return None;
    }
    let number = match value {
        Value::Integer(i) => *i as f64,
        Value::Float(f) => *f,
        Value::Text(s) => match s.trim().parse::<f64>() {
            Ok(f) if !f.is_nan() => f,
            _ => {
                warn!(value = s.as_str(), "invalid progress value, ignoring");
                return None;
            }
        },
        _ => return None,
    };
    Some((number.trunc()).clamp(0.0, 100.0) as u8)
}

/// Maps a progress percentage to a discrete styling tier
/// (0, 1, 25, 50, 75, or 100).
fn progress_tier(progress: u8) -> u8 {
    match progress {
        0 => 0,
        1..=24 => 1,
        25..=49 => 25,
        50..=74 => 50,
        75..=99 => 75,
        _ => 100,
    }
}

/// Linear expected progress of a task as of `today`.
///
/// Defined only while `today` lies within `[start, end]`; zero-length tasks
/// read 100 on their day. The result is clamped to `[0, 100]`.
pub fn expected_progress(start: &str, end: &str, today: NaiveDate) -> Option<f64> {
    let start = dates::parse_iso(start)?;
    let end = dates::parse_iso(end)?;
    if today < start || today > end {
        return None;
    }
    let total = (end - start).num_days();
    if total <= 0 {
        return Some(100.0);
    }
    let elapsed = (today - start).num_days();
    Some(((elapsed as f64 / total as f64) * 100.0).clamp(0.0, 100.0))
}

/// Formats one tooltip cell with its source type preserved.
fn field_value(value: &Value) -> FieldValue {
    match value {
        Value::Missing => FieldValue::Null,
        Value::Integer(i) => FieldValue::Integer(*i),
        Value::Float(f) if f.is_nan() => FieldValue::Null,
        Value::Float(f) => FieldValue::Float(*f),
        Value::Text(s) => FieldValue::Text(s.trim().to_string()),
        Value::Temporal(dt) => FieldValue::Text(dt.format("%Y-%m-%d").to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortBy;

    fn base_records() -> RecordSet {
        RecordSet::new(vec![
            "id".into(),
            "start".into(),
            "end".into(),
            "name".into(),
        ])
        .with_row(vec![
            Value::from("T1"),
            Value::from("2024-01-01"),
            Value::from("2024-01-10"),
            Value::from("First"),
        ])
        .with_row(vec![
            Value::from("T2"),
            Value::from("2024-01-05"),
            Value::from("2024-01-15"),
            Value::from("Second"),
        ])
    }

    fn base_config() -> TransformConfig {
        TransformConfig::new("id", "start", "end").with_name_column("name")
    }

    #[test]
    fn test_basic_transformation() {
        let result = TaskTransformer::new(base_config())
            .transform(&base_records())
            .unwrap();

        assert_eq!(result.tasks.len(), 2);
        assert_eq!(result.metadata.total_rows, 2);
        assert_eq!(result.metadata.displayed_rows, 2);
        assert_eq!(result.metadata.skipped_rows, 0);
        assert!(result.metadata.warnings.is_empty());
        assert_eq!(result.tasks[0].id, "T1");
        assert_eq!(result.tasks[0].name, "First");
        assert_eq!(result.tasks[0].start, "2024-01-01");
        assert!(result.color_mapping.is_none());
    }

    #[test]
    fn test_empty_input_is_fatal() {
        let records = RecordSet::new(vec!["id".into(), "start".into(), "end".into()]);
        let err = TaskTransformer::new(base_config())
            .transform(&records)
            .unwrap_err();
        assert_eq!(err, TransformError::EmptyInput);
    }

    #[test]
    fn test_missing_required_columns_fatal() {
        let records = RecordSet::new(vec!["id".into(), "other".into()])
            .with_row(vec![Value::from("T1"), Value::from("x")]);
        let err = TaskTransformer::new(base_config())
            .transform(&records)
            .unwrap_err();
        match err {
            TransformError::MissingColumns { missing, available } => {
                assert_eq!(missing, vec!["start".to_string(), "end".to_string()]);
                assert!(available.contains(&"other".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_dates_skipped() {
        let records = RecordSet::new(vec!["id".into(), "start".into(), "end".into()])
            .with_row(vec![
                Value::from("ok"),
                Value::from("2024-01-01"),
                Value::from("2024-01-02"),
            ])
            .with_row(vec![
                Value::from("bad"),
                Value::from("not-a-date"),
                Value::from("2024-01-02"),
            ])
            .with_row(vec![Value::from("null"), Value::Missing, Value::Missing]);

        let result = TaskTransformer::new(TransformConfig::new("id", "start", "end"))
            .transform(&records)
            .unwrap();
        assert_eq!(result.tasks.len(), 1);
        assert_eq!(result.metadata.skip_reasons[&SkipReason::InvalidDates], 2);
    }

    #[test]
    fn test_start_after_end_skipped() {
        let records = RecordSet::new(vec!["id".into(), "start".into(), "end".into()]).with_row(
            vec![
                Value::from("T1"),
                Value::from("2024-02-01"),
                Value::from("2024-01-01"),
            ],
        );
        let result = TaskTransformer::new(TransformConfig::new("id", "start", "end"))
            .transform(&records)
            .unwrap();
        assert!(result.tasks.is_empty());
        assert_eq!(result.metadata.skip_reasons[&SkipReason::StartAfterEnd], 1);
        assert_eq!(result.metadata.skipped_rows, 1);
    }

    #[test]
    fn test_missing_id_synthesized_from_row_index() {
        let records = RecordSet::new(vec!["id".into(), "start".into(), "end".into()])
            .with_row(vec![
                Value::Missing,
                Value::from("2024-01-01"),
                Value::from("2024-01-02"),
            ])
            .with_row(vec![
                Value::from("  "),
                Value::from("2024-01-01"),
                Value::from("2024-01-02"),
            ]);
        let result = TaskTransformer::new(TransformConfig::new("id", "start", "end"))
            .transform(&records)
            .unwrap();
        assert_eq!(result.tasks[0].id, "task_0");
        assert_eq!(result.tasks[1].id, "task_1");
        // Synthesized ids double as names when no name column is configured
        assert_eq!(result.tasks[0].name, "task_0");
    }

    #[test]
    fn test_name_falls_back_to_display_id() {
        let records = RecordSet::new(vec![
            "id".into(),
            "start".into(),
            "end".into(),
            "name".into(),
        ])
        .with_row(vec![
            Value::Float(276.0),
            Value::from("2024-01-01"),
            Value::from("2024-01-02"),
            Value::Missing,
        ]);
        let result = TaskTransformer::new(base_config())
            .transform(&records)
            .unwrap();
        assert_eq!(result.tasks[0].id, "276");
        assert_eq!(result.tasks[0].display_id, "276");
        assert_eq!(result.tasks[0].name, "276");
    }

    #[test]
    fn test_float_widened_dependencies_match_integer_ids() {
        // Id column read as int, dependency column widened to float by nulls.
        let records = RecordSet::new(vec![
            "id".into(),
            "start".into(),
            "end".into(),
            "deps".into(),
        ])
        .with_row(vec![
            Value::Integer(276),
            Value::from("2024-01-01"),
            Value::from("2024-01-05"),
            Value::Float(f64::NAN),
        ])
        .with_row(vec![
            Value::Missing,
            Value::from("2024-01-02"),
            Value::from("2024-01-06"),
            Value::from("276.0"),
        ])
        .with_row(vec![
            Value::Missing,
            Value::from("2024-01-03"),
            Value::from("2024-01-07"),
            Value::from("277.0"),
        ]);

        let config = TransformConfig::new("id", "start", "end").with_dependencies_column("deps");
        let result = TaskTransformer::new(config).transform(&records).unwrap();

        assert_eq!(result.tasks.len(), 3);
        assert_eq!(result.tasks[0].dependencies, Vec::<String>::new());
        // "276.0" resolved against the int-derived id "276"
        assert_eq!(result.tasks[1].dependencies, vec!["276".to_string()]);
        // "277" has no matching task, so reference cleaning dropped it
        assert!(result.tasks[2].dependencies.is_empty());
        assert!(result
            .metadata
            .warnings
            .iter()
            .any(|w| w.contains("non-existent") && w.contains("277")));
    }

    #[test]
    fn test_duplicate_ids_renamed_with_suffix() {
        let records = RecordSet::new(vec!["id".into(), "start".into(), "end".into()])
            .with_row(vec![
                Value::from("A"),
                Value::from("2024-01-01"),
                Value::from("2024-01-02"),
            ])
            .with_row(vec![
                Value::from("A"),
                Value::from("2024-01-03"),
                Value::from("2024-01-04"),
            ])
            .with_row(vec![
                Value::from("A"),
                Value::from("2024-01-05"),
                Value::from("2024-01-06"),
            ]);

        let result = TaskTransformer::new(TransformConfig::new("id", "start", "end"))
            .transform(&records)
            .unwrap();

        let ids: Vec<&str> = result.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["A", "A_1", "A_2"]);
        assert_eq!(result.metadata.warnings.len(), 2);
        assert_eq!(result.metadata.duplicate_ids.len(), 1);
        assert_eq!(result.metadata.duplicate_ids[0].occurrences.len(), 3);
        assert_eq!(
            result.metadata.duplicate_ids[0].occurrences[0].status,
            OccurrenceStatus::Kept
        );
    }

    #[test]
    fn test_rename_never_aliases_an_existing_id() {
        // The suffixed candidate "A_1" also occurs verbatim in the input.
        let records = RecordSet::new(vec!["id".into(), "start".into(), "end".into()])
            .with_row(vec![
                Value::from("A"),
                Value::from("2024-01-01"),
                Value::from("2024-01-02"),
            ])
            .with_row(vec![
                Value::from("A"),
                Value::from("2024-01-03"),
                Value::from("2024-01-04"),
            ])
            .with_row(vec![
                Value::from("A_1"),
                Value::from("2024-01-05"),
                Value::from("2024-01-06"),
            ]);

        let result = TaskTransformer::new(TransformConfig::new("id", "start", "end"))
            .transform(&records)
            .unwrap();

        let ids: Vec<&str> = result.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["A", "A_1", "A_1_1"]);
        let distinct: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(distinct.len(), ids.len());
    }

    #[test]
    fn test_rename_skips_over_taken_suffix() {
        // "A_1" is registered before the second "A" arrives, so the rename
        // must jump to "A_2".
        let records = RecordSet::new(vec!["id".into(), "start".into(), "end".into()])
            .with_row(vec![
                Value::from("A"),
                Value::from("2024-01-01"),
                Value::from("2024-01-02"),
            ])
            .with_row(vec![
                Value::from("A_1"),
                Value::from("2024-01-03"),
                Value::from("2024-01-04"),
            ])
            .with_row(vec![
                Value::from("A"),
                Value::from("2024-01-05"),
                Value::from("2024-01-06"),
            ]);

        let result = TaskTransformer::new(TransformConfig::new("id", "start", "end"))
            .transform(&records)
            .unwrap();

        let ids: Vec<&str> = result.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["A", "A_1", "A_2"]);
    }

    #[test]
    fn test_duplicate_ids_skipped_under_skip_policy() {
        let records = RecordSet::new(vec!["id".into(), "start".into(), "end".into()])
            .with_row(vec![
                Value::from("A"),
                Value::from("2024-01-01"),
                Value::from("2024-01-02"),
            ])
            .with_row(vec![
                Value::from("A"),
                Value::from("2024-01-03"),
                Value::from("2024-01-04"),
            ]);

        let config = TransformConfig::new("id", "start", "end")
            .with_duplicate_id_policy(DuplicateIdPolicy::Skip);
        let result = TaskTransformer::new(config).transform(&records).unwrap();

        assert_eq!(result.tasks.len(), 1);
        assert_eq!(result.metadata.skip_reasons[&SkipReason::DuplicateId], 1);
        assert_eq!(
            result.metadata.duplicate_ids[0].occurrences[1].status,
            OccurrenceStatus::Skipped
        );
    }

    #[test]
    fn test_renamed_duplicate_reference_warns_without_redirecting() {
        let records = RecordSet::new(vec![
            "id".into(),
            "start".into(),
            "end".into(),
            "deps".into(),
        ])
        .with_row(vec![
            Value::from("A"),
            Value::from("2024-01-01"),
            Value::from("2024-01-02"),
            Value::Missing,
        ])
        .with_row(vec![
            Value::from("A"),
            Value::from("2024-01-03"),
            Value::from("2024-01-04"),
            Value::Missing,
        ])
        .with_row(vec![
            Value::from("B"),
            Value::from("2024-01-05"),
            Value::from("2024-01-06"),
            Value::from("A"),
        ]);

        let config = TransformConfig::new("id", "start", "end").with_dependencies_column("deps");
        let result = TaskTransformer::new(config).transform(&records).unwrap();

        // The reference still points at the original id.
        let b = result.tasks.iter().find(|t| t.id == "B").unwrap();
        assert_eq!(b.dependencies, vec!["A".to_string()]);
        assert!(result
            .metadata
            .warnings
            .iter()
            .any(|w| w.contains("may be ambiguous")));
    }

    #[test]
    fn test_progress_clamping() {
        let records = RecordSet::new(vec![
            "id".into(),
            "start".into(),
            "end".into(),
            "progress".into(),
        ])
        .with_row(vec![
            Value::from("a"),
            Value::from("2024-01-01"),
            Value::from("2024-01-02"),
            Value::Integer(-10),
        ])
        .with_row(vec![
            Value::from("b"),
            Value::from("2024-01-01"),
            Value::from("2024-01-02"),
            Value::Integer(150),
        ])
        .with_row(vec![
            Value::from("c"),
            Value::from("2024-01-01"),
            Value::from("2024-01-02"),
            Value::Integer(50),
        ])
        .with_row(vec![
            Value::from("d"),
            Value::from("2024-01-01"),
            Value::from("2024-01-02"),
            Value::from("garbage"),
        ]);

        let config = TransformConfig::new("id", "start", "end").with_progress_column("progress");
        let result = TaskTransformer::new(config).transform(&records).unwrap();

        let progress: Vec<Option<u8>> = result.tasks.iter().map(|t| t.progress).collect();
        assert_eq!(progress, [Some(0), Some(100), Some(50), None]);
        assert!(result.tasks[1].is_complete);
        assert!(!result.tasks[2].is_complete);
    }

    #[test]
    fn test_progress_tier_color_fallback() {
        let records = RecordSet::new(vec![
            "id".into(),
            "start".into(),
            "end".into(),
            "progress".into(),
        ])
        .with_row(vec![
            Value::from("a"),
            Value::from("2024-01-01"),
            Value::from("2024-01-02"),
            Value::Integer(60),
        ])
        .with_row(vec![
            Value::from("b"),
            Value::from("2024-01-01"),
            Value::from("2024-01-02"),
            Value::Missing,
        ]);

        let config = TransformConfig::new("id", "start", "end").with_progress_column("progress");
        let result = TaskTransformer::new(config).transform(&records).unwrap();
        assert_eq!(result.tasks[0].color_class, "bar-default-tier-50");
        assert_eq!(result.tasks[1].color_class, "bar-default-tier-0");
    }

    #[test]
    fn test_color_mapping_applied_and_returned() {
        let records = RecordSet::new(vec![
            "id".into(),
            "start".into(),
            "end".into(),
            "team".into(),
        ])
        .with_row(vec![
            Value::from("a"),
            Value::from("2024-01-01"),
            Value::from("2024-01-02"),
            Value::from("Dev"),
        ])
        .with_row(vec![
            Value::from("b"),
            Value::from("2024-01-01"),
            Value::from("2024-01-02"),
            Value::Missing,
        ]);

        let config = TransformConfig::new("id", "start", "end").with_color_column("team");
        let result = TaskTransformer::new(config).transform(&records).unwrap();

        assert_eq!(result.tasks[0].color_class, "bar-blue");
        assert_eq!(result.tasks[1].color_class, "bar-gray");
        let mapping = result.color_mapping.unwrap();
        assert_eq!(mapping["Dev"], "bar-blue");
    }

    #[test]
    fn test_max_tasks_cap() {
        let mut records = RecordSet::new(vec!["id".into(), "start".into(), "end".into()]);
        for i in 0..2000 {
            records.push_row(vec![
                Value::from(format!("t{i}")),
                Value::from("2024-01-01"),
                Value::from("2024-01-02"),
            ]);
        }
        let config = TransformConfig::new("id", "start", "end").with_max_tasks(1000);
        let result = TaskTransformer::new(config).transform(&records).unwrap();

        assert_eq!(result.tasks.len(), 1000);
        assert_eq!(result.metadata.total_rows, 2000);
        assert_eq!(result.metadata.displayed_rows, 1000);
        assert_eq!(result.metadata.warnings.len(), 1);
        assert!(result.metadata.warnings[0].contains("2000"));
    }

    #[test]
    fn test_max_tasks_zero_is_unlimited() {
        let mut records = RecordSet::new(vec!["id".into(), "start".into(), "end".into()]);
        for i in 0..1500 {
            records.push_row(vec![
                Value::from(format!("t{i}")),
                Value::from("2024-01-01"),
                Value::from("2024-01-02"),
            ]);
        }
        let config = TransformConfig::new("id", "start", "end").with_max_tasks(0);
        let result = TaskTransformer::new(config).transform(&records).unwrap();
        assert_eq!(result.tasks.len(), 1500);
        assert!(result.metadata.warnings.is_empty());
    }

    #[test]
    fn test_cycle_broken_through_pipeline() {
        let records = RecordSet::new(vec![
            "id".into(),
            "start".into(),
            "end".into(),
            "deps".into(),
        ])
        .with_row(vec![
            Value::from("A"),
            Value::from("2024-01-01"),
            Value::from("2024-01-02"),
            Value::from("B"),
        ])
        .with_row(vec![
            Value::from("B"),
            Value::from("2024-01-03"),
            Value::from("2024-01-04"),
            Value::from("C"),
        ])
        .with_row(vec![
            Value::from("C"),
            Value::from("2024-01-05"),
            Value::from("2024-01-06"),
            Value::from("A"),
        ]);

        let config = TransformConfig::new("id", "start", "end").with_dependencies_column("deps");
        let result = TaskTransformer::new(config).transform(&records).unwrap();

        assert_eq!(result.tasks.len(), 3);
        let cycle_warnings: Vec<&String> = result
            .metadata
            .warnings
            .iter()
            .filter(|w| w.contains("Circular dependency"))
            .collect();
        assert_eq!(cycle_warnings.len(), 1);
        let total_edges: usize = result.tasks.iter().map(|t| t.dependencies.len()).sum();
        assert_eq!(total_edges, 2);
    }

    #[test]
    fn test_tooltip_fields_preserve_order_and_types() {
        let records = RecordSet::new(vec![
            "id".into(),
            "start".into(),
            "end".into(),
            "estimate".into(),
            "owner".into(),
        ])
        .with_row(vec![
            Value::from("a"),
            Value::from("2024-01-01"),
            Value::from("2024-01-02"),
            Value::Float(3.5),
            Value::Missing,
        ]);

        let config = TransformConfig::new("id", "start", "end")
            .with_tooltip_columns(vec!["owner".into(), "estimate".into(), "absent".into()]);
        let result = TaskTransformer::new(config).transform(&records).unwrap();

        let fields = &result.tasks[0].custom_fields;
        // Configured order preserved; absent column silently dropped
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].label, "owner");
        assert_eq!(fields[0].value, FieldValue::Null);
        assert_eq!(fields[1].label, "estimate");
        assert_eq!(fields[1].value, FieldValue::Float(3.5));
    }

    #[test]
    fn test_grouped_sorting_through_pipeline() {
        let records = RecordSet::new(vec![
            "id".into(),
            "start".into(),
            "end".into(),
            "team".into(),
        ])
        .with_row(vec![
            Value::from("b1"),
            Value::from("2024-01-05"),
            Value::from("2024-01-06"),
            Value::from("Beta"),
        ])
        .with_row(vec![
            Value::from("a1"),
            Value::from("2024-01-03"),
            Value::from("2024-01-04"),
            Value::from("Alpha"),
        ])
        .with_row(vec![
            Value::from("a2"),
            Value::from("2024-01-01"),
            Value::from("2024-01-02"),
            Value::from("Alpha"),
        ]);

        let config = TransformConfig::new("id", "start", "end")
            .with_group_by_columns(vec!["team".into()])
            .with_sort_by(SortBy::StartAsc);
        let result = TaskTransformer::new(config).transform(&records).unwrap();

        let ids: Vec<&str> = result.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a2", "a1", "b1"]);
    }

    #[test]
    fn test_display_dependencies_resolved_to_names() {
        let records = RecordSet::new(vec![
            "id".into(),
            "start".into(),
            "end".into(),
            "name".into(),
            "deps".into(),
        ])
        .with_row(vec![
            Value::from("T1"),
            Value::from("2024-01-01"),
            Value::from("2024-01-02"),
            Value::from("Design"),
            Value::Missing,
        ])
        .with_row(vec![
            Value::from("T2"),
            Value::from("2024-01-03"),
            Value::from("2024-01-04"),
            Value::from("Build"),
            Value::from("T1"),
        ]);

        let config = base_config().with_dependencies_column("deps");
        let result = TaskTransformer::new(config).transform(&records).unwrap();

        let build = result.tasks.iter().find(|t| t.id == "T2").unwrap();
        assert_eq!(build.display_dependencies.as_deref(), Some("Design"));
    }

    #[test]
    fn test_expected_progress_window() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        // Midway through a 10-day task
        let mid = expected_progress("2024-01-01", "2024-01-11", today).unwrap();
        assert!((mid - 50.0).abs() < 1e-9);
        // Outside the window
        assert!(expected_progress("2024-02-01", "2024-02-05", today).is_none());
        assert!(expected_progress("2023-12-01", "2023-12-05", today).is_none());
        // Zero-length task on its day
        assert_eq!(
            expected_progress("2024-01-06", "2024-01-06", today),
            Some(100.0)
        );
        // Boundaries included
        assert_eq!(
            expected_progress("2024-01-06", "2024-01-16", today),
            Some(0.0)
        );
    }

    #[test]
    fn test_progress_tiers() {
        assert_eq!(progress_tier(0), 0);
        assert_eq!(progress_tier(1), 1);
        assert_eq!(progress_tier(24), 1);
        assert_eq!(progress_tier(25), 25);
        assert_eq!(progress_tier(49), 25);
        assert_eq!(progress_tier(50), 50);
        assert_eq!(progress_tier(74), 50);
        assert_eq!(progress_tier(75), 75);
        assert_eq!(progress_tier(99), 75);
        assert_eq!(progress_tier(100), 100);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = TaskTransformer::new(base_config())
            .transform(&base_records())
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["metadata"]["totalRows"].is_number());
        assert!(json["tasks"][0]["displayId"].is_string());
        assert!(json.get("colorMapping").is_none());
    }
}
