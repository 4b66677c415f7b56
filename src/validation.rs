//! Dependency graph validation.
//!
//! Two passes over a task set with raw dependency references:
//! 1. **Reference cleaning** — drop self-references and references to
//!    unknown tasks, warning about each.
//! 2. **Cycle detection/removal** — classic three-color depth-first
//!    traversal (white = unvisited, gray = on current path, black = fully
//!    processed). An edge from a gray node to another gray node closes a
//!    cycle; that specific edge is removed and the cycle path reported.
//!
//! Each pass produces a new task list rather than rewriting in place, so
//! the passes stay independently testable. The traversal uses an explicit
//! work stack; recursion would hit depth limits on large graphs. Roots are
//! visited in ascending-id order so warnings and removals are deterministic.
//!
//! Running the validator on its own output yields no further warnings.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.3 (DFS edge
//! classification)

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::Task;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Runs both validation passes: reference cleaning, then cycle removal.
///
/// The returned warnings are the union of both passes, in pass order.
pub fn validate_dependencies(tasks: Vec<Task>) -> (Vec<Task>, Vec<String>) {
    let (tasks, mut warnings) = clean_references(tasks);
    let (tasks, cycle_warnings) = break_cycles(tasks);
    warnings.extend(cycle_warnings);
    (tasks, warnings)
}

/// Removes self-references and references to unknown tasks.
pub fn clean_references(tasks: Vec<Task>) -> (Vec<Task>, Vec<String>) {
    let valid_ids: HashSet<String> = tasks.iter().map(|t| t.id.clone()).collect();
    let mut warnings = Vec::new();

    let tasks = tasks
        .into_iter()
        .map(|mut task| {
            if task.dependencies.is_empty() {
                return task;
            }

            let mut deps = std::mem::take(&mut task.dependencies);

            if deps.iter().any(|d| *d == task.id) {
                deps.retain(|d| *d != task.id);
                warnings.push(format!("Task '{}' has self-dependency. Removed.", task.id));
            }

            let dangling: Vec<&String> =
                deps.iter().filter(|d| !valid_ids.contains(*d)).collect();
            if !dangling.is_empty() {
                warnings.push(format!(
                    "Task '{}' references non-existent tasks: {}. Removed.",
                    task.id,
                    dangling
                        .iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
                deps.retain(|d| valid_ids.contains(d));
            }

            task.dependencies = deps;
            task
        })
        .collect();

    (tasks, warnings)
}

/// Detects cycles and breaks each by removing the edge that closed it.
///
/// Expects reference-clean input (see [`clean_references`]); unknown
/// neighbors are skipped defensively. Task count is always preserved.
pub fn break_cycles(tasks: Vec<Task>) -> (Vec<Task>, Vec<String>) {
    if tasks.is_empty() {
        return (tasks, Vec::new());
    }

    let adjacency: HashMap<String, Vec<String>> = tasks
        .iter()
        .map(|t| (t.id.clone(), t.dependencies.clone()))
        .collect();

    let mut roots: Vec<&String> = adjacency.keys().collect();
    roots.sort();

    let mut color: HashMap<&str, Color> = adjacency
        .keys()
        .map(|id| (id.as_str(), Color::White))
        .collect();
    let mut cycle_edges: HashSet<(String, String)> = HashSet::new();
    let mut warnings = Vec::new();

    for root in roots {
        if color[root.as_str()] != Color::White {
            continue;
        }

        // Explicit DFS stack: (node, index of next neighbor to examine).
        let mut stack: Vec<(&str, usize)> = vec![(root.as_str(), 0)];
        let mut path: Vec<&str> = vec![root.as_str()];
        color.insert(root.as_str(), Color::Gray);

        while let Some(&(node, next_idx)) = stack.last() {
            let neighbors = adjacency[node].as_slice();
            if next_idx >= neighbors.len() {
                color.insert(node, Color::Black);
                path.pop();
                stack.pop();
                continue;
            }
            stack.last_mut().expect("stack non-empty").1 += 1;

            let neighbor = neighbors[next_idx].as_str();
            match color.get(neighbor) {
                Some(Color::Gray) => {
                    // Back edge: neighbor is on the current path.
                    let pos = path
                        .iter()
                        .position(|p| *p == neighbor)
                        .expect("gray node is on path");
                    let mut cycle: Vec<&str> = path[pos..].to_vec();
                    cycle.push(neighbor);
                    warnings.push(format!(
                        "Circular dependency detected: {}. Removing edge {} -> {}.",
                        cycle.join(" -> "),
                        node,
                        neighbor
                    ));
                    cycle_edges.insert((node.to_string(), neighbor.to_string()));
                }
                Some(Color::White) => {
                    color.insert(neighbor, Color::Gray);
                    path.push(neighbor);
                    stack.push((neighbor, 0));
                }
                // Black edges are already known cycle-free; unknown ids
                // were removed by reference cleaning.
                Some(Color::Black) | None => {}
            }
        }
    }

    if !cycle_edges.is_empty() {
        info!(broken = cycle_edges.len(), "cycle detection removed edges");
    }

    let tasks = tasks
        .into_iter()
        .map(|mut task| {
            if !task.dependencies.is_empty() {
                task.dependencies
                    .retain(|dep| !cycle_edges.contains(&(task.id.clone(), dep.clone())));
            }
            task
        })
        .collect();

    (tasks, warnings)
}

/// Edge counters over a task set, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DependencyStats {
    /// Number of tasks.
    pub total_tasks: usize,
    /// Tasks with at least one dependency.
    pub tasks_with_deps: usize,
    /// Total dependency edges.
    pub total_edges: usize,
    /// Largest dependency list on a single task.
    pub max_deps_per_task: usize,
}

/// Counts dependency edges in a task set.
pub fn dependency_stats(tasks: &[Task]) -> DependencyStats {
    let mut stats = DependencyStats {
        total_tasks: tasks.len(),
        ..Default::default()
    };
    for task in tasks {
        let count = task.dependencies.len();
        if count > 0 {
            stats.tasks_with_deps += 1;
            stats.total_edges += count;
            stats.max_deps_per_task = stats.max_deps_per_task.max(count);
        }
    }
    stats
}
