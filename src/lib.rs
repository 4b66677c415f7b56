//! Gantt task transformation pipeline.
//!
//! Turns raw tabular records into a validated, ordered, renderable task list
//! for Gantt-style charts. The pipeline normalizes messy real-world input
//! (mixed date representations, float-widened id columns, duplicate ids,
//! circular dependencies) into a clean output with per-record skip reasons
//! and human-readable warnings instead of hard failures.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `RecordSet`, `Value`, `TransformConfig`,
//!   `Task`, `TransformResult`
//! - **`dates`**: Date normalization to canonical `YYYY-MM-DD`
//! - **`ident`**: Stable symbol-safe id normalization and dependency parsing
//! - **`palette`**: Categorical color mapping over built-in and custom palettes
//! - **`validation`**: Dependency graph integrity (references, cycles)
//! - **`ordering`**: Stable sorts, topological ordering, hierarchical grouping
//! - **`transform`**: The orchestrator tying the stages together
//!
//! # Example
//!
//! ```
//! use u_gantt::models::{RecordSet, TransformConfig, Value};
//! use u_gantt::transform::TaskTransformer;
//!
//! let records = RecordSet::new(vec!["id".into(), "start".into(), "end".into()])
//!     .with_row(vec![
//!         Value::from("T1"),
//!         Value::from("2024-01-01"),
//!         Value::from("2024-01-10"),
//!     ]);
//!
//! let config = TransformConfig::new("id", "start", "end");
//! let result = TaskTransformer::new(config).transform(&records).unwrap();
//! assert_eq!(result.tasks.len(), 1);
//! ```

pub mod dates;
pub mod ident;
pub mod models;
pub mod ordering;
pub mod palette;
pub mod transform;
pub mod validation;

pub use models::{RecordSet, Task, TransformConfig, TransformResult, Value};
pub use transform::{TaskTransformer, TransformError};
