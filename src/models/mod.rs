//! Gantt transformation domain models.
//!
//! Provides the data types flowing through the pipeline: raw tabular input
//! ([`RecordSet`] of typed [`Value`] cells), the run configuration
//! ([`TransformConfig`]), the renderable output ([`Task`]), and the result
//! envelope ([`TransformResult`] with its metadata and incident records).

mod config;
mod record;
mod result;
mod task;

pub use config::{DuplicateIdPolicy, SortBy, TransformConfig};
pub use record::{RecordSet, Value};
pub use result::{
    DuplicateIncident, DuplicateOccurrence, OccurrenceStatus, SkipReason, TransformMetadata,
    TransformResult,
};
pub use task::{CustomField, FieldValue, Task};
