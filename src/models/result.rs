//! Transformation output and diagnostic metadata.
//!
//! A run always yields a complete, internally-consistent task list; every
//! degradation along the way is enumerated here (skip-reason histogram,
//! ordered warnings, structured duplicate incidents) so the caller can render
//! diagnostics without re-deriving cause.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Task;

/// Why a record was excluded from the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Start or end date could not be normalized.
    InvalidDates,
    /// Dates parsed but `start > end`.
    StartAfterEnd,
    /// Duplicate id dropped under the `skip` policy.
    DuplicateId,
}

/// What happened to one row that carried an already-seen id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccurrenceStatus {
    /// First occurrence, kept under its original id.
    Kept,
    /// Subsequent occurrence, kept under a suffixed id.
    Renamed,
    /// Subsequent occurrence, dropped.
    Skipped,
}

/// One row involved in a duplicate-id incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateOccurrence {
    /// Zero-based input row index.
    pub row_index: usize,
    /// Id the row ended up with, when it was kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_id: Option<String>,
    /// Outcome for this row.
    pub status: OccurrenceStatus,
}

/// All rows that shared one original id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateIncident {
    /// The id as it appeared in the input.
    pub original_id: String,
    /// Every occurrence, first one included, in row order.
    pub occurrences: Vec<DuplicateOccurrence>,
}

/// Run totals and audit trail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformMetadata {
    /// Rows in the input record set.
    pub total_rows: usize,
    /// Tasks in the output.
    pub displayed_rows: usize,
    /// `total_rows - displayed_rows`.
    pub skipped_rows: usize,
    /// Count per skip reason.
    pub skip_reasons: BTreeMap<SkipReason, usize>,
    /// Human-readable degradation notices, in pipeline order.
    pub warnings: Vec<String>,
    /// Structured duplicate-id incidents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicate_ids: Vec<DuplicateIncident>,
}

/// Result of one transformation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformResult {
    /// The validated, ordered task list.
    pub tasks: Vec<Task>,
    /// Diagnostics for this run.
    pub metadata: TransformMetadata,
    /// Categorical value → palette token, present when a color column was
    /// configured and produced at least one category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_mapping: Option<BTreeMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_reason_wire_names() {
        assert_eq!(
            serde_json::to_string(&SkipReason::StartAfterEnd).unwrap(),
            "\"start_after_end\""
        );
        assert_eq!(
            serde_json::to_string(&SkipReason::InvalidDates).unwrap(),
            "\"invalid_dates\""
        );
    }

    #[test]
    fn test_metadata_histogram_serializes_as_object() {
        let mut metadata = TransformMetadata::default();
        metadata.total_rows = 3;
        metadata.skipped_rows = 2;
        metadata.displayed_rows = 1;
        *metadata
            .skip_reasons
            .entry(SkipReason::InvalidDates)
            .or_insert(0) += 2;

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["skipReasons"]["invalid_dates"], 2);
        assert_eq!(json["totalRows"], 3);
        assert!(json.get("duplicateIds").is_none());
    }

    #[test]
    fn test_duplicate_incident_shape() {
        let incident = DuplicateIncident {
            original_id: "A".into(),
            occurrences: vec![
                DuplicateOccurrence {
                    row_index: 0,
                    assigned_id: Some("A".into()),
                    status: OccurrenceStatus::Kept,
                },
                DuplicateOccurrence {
                    row_index: 4,
                    assigned_id: None,
                    status: OccurrenceStatus::Skipped,
                },
            ],
        };
        let json = serde_json::to_value(&incident).unwrap();
        assert_eq!(json["originalId"], "A");
        assert_eq!(json["occurrences"][0]["status"], "kept");
        assert!(json["occurrences"][1].get("assignedId").is_none());
    }
}
