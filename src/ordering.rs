//! Deterministic task ordering.
//!
//! Simple-key sorts (start, end, name, duration), a dependency-respecting
//! topological order, and a hierarchical grouping stage that partitions
//! tasks before sorting within groups.
//!
//! All sorts are stable; name comparisons are case-insensitive; duration is
//! `end - start` in whole days. The topological order is Kahn's algorithm
//! with ready tasks tie-broken by ascending start date, which lays
//! independent tasks out as a waterfall.
//!
//! # Reference
//! Kahn (1962), "Topological sorting of large networks", CACM 5(11)

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{info, warn};

use crate::models::{SortBy, Task};

/// Sorts a task set by the given criterion.
///
/// `SortBy::None` returns the input order unchanged. The warning list is
/// non-empty only for a `dependencies` sort over a graph with residual
/// cycles; task count is always preserved.
pub fn sort_tasks(tasks: Vec<Task>, sort_by: SortBy) -> (Vec<Task>, Vec<String>) {
    if tasks.is_empty() || sort_by == SortBy::None {
        return (tasks, Vec::new());
    }

    info!(count = tasks.len(), ?sort_by, "sorting tasks");

    let mut tasks = tasks;
    match sort_by {
        SortBy::None => unreachable!("handled above"),
        SortBy::StartAsc => tasks.sort_by(|a, b| a.start.cmp(&b.start)),
        SortBy::StartDesc => tasks.sort_by(|a, b| b.start.cmp(&a.start)),
        SortBy::EndAsc => tasks.sort_by(|a, b| a.end.cmp(&b.end)),
        SortBy::EndDesc => tasks.sort_by(|a, b| b.end.cmp(&a.end)),
        SortBy::NameAsc => tasks.sort_by_key(|t| t.name.to_lowercase()),
        SortBy::NameDesc => {
            tasks.sort_by(|a, b| b.name.to_lowercase().cmp(&a.name.to_lowercase()))
        }
        SortBy::DurationAsc => tasks.sort_by_key(Task::duration_days),
        SortBy::DurationDesc => tasks.sort_by(|a, b| b.duration_days().cmp(&a.duration_days())),
        SortBy::Dependencies => return topological_sort(tasks),
    }
    (tasks, Vec::new())
}

/// Kahn's algorithm over the dependency edges (edge runs dependency →
/// dependent). Zero-in-degree tasks seed the queue sorted by start date;
/// newly-ready neighbors are enqueued in start-date order.
///
/// Residual cycles should not exist after graph validation; if any do, the
/// unresolved tasks are appended at the end sorted by start date, with a
/// warning.
fn topological_sort(tasks: Vec<Task>) -> (Vec<Task>, Vec<String>) {
    let start_of: HashMap<&str, &str> = tasks
        .iter()
        .map(|t| (t.id.as_str(), t.start.as_str()))
        .collect();

    let mut dependents: HashMap<&str, Vec<&str>> =
        tasks.iter().map(|t| (t.id.as_str(), Vec::new())).collect();
    let mut in_degree: HashMap<&str, usize> =
        tasks.iter().map(|t| (t.id.as_str(), 0)).collect();

    for task in &tasks {
        for dep in &task.dependencies {
            if start_of.contains_key(dep.as_str()) {
                dependents
                    .get_mut(dep.as_str())
                    .expect("all ids registered")
                    .push(task.id.as_str());
                *in_degree.get_mut(task.id.as_str()).expect("all ids registered") += 1;
            }
        }
    }

    // ISO date strings compare chronologically, so the start-date tie-break
    // is a plain string sort.
    let mut ready: Vec<&str> = tasks
        .iter()
        .filter(|t| in_degree[t.id.as_str()] == 0)
        .map(|t| t.id.as_str())
        .collect();
    ready.sort_by_key(|id| start_of[id]);

    let mut queue: VecDeque<&str> = ready.into();
    let mut ordered_ids: Vec<&str> = Vec::with_capacity(tasks.len());

    while let Some(id) = queue.pop_front() {
        ordered_ids.push(id);

        let mut neighbors = dependents[id].clone();
        neighbors.sort_by_key(|n| start_of[n]);
        for neighbor in neighbors {
            let degree = in_degree.get_mut(neighbor).expect("all ids registered");
            *degree -= 1;
            if *degree == 0 {
                queue.push_back(neighbor);
            }
        }
    }

    let mut warnings = Vec::new();
    if ordered_ids.len() < tasks.len() {
        let processed: HashSet<&str> = ordered_ids.iter().copied().collect();
        let mut remaining: Vec<&Task> = tasks
            .iter()
            .filter(|t| !processed.contains(t.id.as_str()))
            .collect();
        remaining.sort_by(|a, b| a.start.cmp(&b.start));
        let appended = remaining.len();
        ordered_ids.extend(remaining.into_iter().map(|t| t.id.as_str()));

        warn!(appended, "topological sort incomplete due to cycles");
        warnings.push(format!(
            "Topological sort incomplete due to cycles. Appended {appended} unresolved tasks sorted by start date."
        ));
    }

    let rank: HashMap<String, usize> = ordered_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.to_string(), i))
        .collect();
    let mut tasks = tasks;
    tasks.sort_by_key(|t| rank[t.id.as_str()]);
    (tasks, warnings)
}

/// Partitions tasks hierarchically by the ordered group columns (outer to
/// inner), then sorts within the deepest groups by `sort_by`.
///
/// Group keys sort lexicographically with missing or blank values last at
/// every level. An empty column list degenerates to a plain sort.
pub fn group_and_sort(
    tasks: Vec<Task>,
    group_columns: &[String],
    sort_by: SortBy,
) -> (Vec<Task>, Vec<String>) {
    if group_columns.is_empty() {
        return sort_tasks(tasks, sort_by);
    }
    let mut warnings = Vec::new();
    let grouped = group_level(tasks, group_columns, sort_by, &mut warnings);
    (grouped, warnings)
}

fn group_level(
    tasks: Vec<Task>,
    columns: &[String],
    sort_by: SortBy,
    warnings: &mut Vec<String>,
) -> Vec<Task> {
    let Some((column, rest)) = columns.split_first() else {
        let (sorted, sort_warnings) = sort_tasks(tasks, sort_by);
        warnings.extend(sort_warnings);
        return sorted;
    };

    // Partition in encounter order, then order the groups themselves.
    let mut groups: Vec<(Option<String>, Vec<Task>)> = Vec::new();
    for task in tasks {
        let key = task
            .group_values
            .get(column)
            .cloned()
            .flatten()
            .filter(|v| !v.is_empty());
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(task),
            None => groups.push((key, vec![task])),
        }
    }

    groups.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    groups
        .into_iter()
        .flat_map(|(_, members)| group_level(members, rest, sort_by, warnings))
        .collect()
}
