//! Dependency resolution over the task graph
//!
//! Tasks reference their blockers by id. The resolver decides whether a
//! task is currently actionable:
//!
//! - A blocker that is missing, soft-deleted, or in a terminal status is
//!   satisfied. Dangling ids never block; cross-device sync and soft
//!   deletion make them routine.
//! - A cycle among blockers can never be resolved by any completion
//!   order, so every task on it is treated as permanently blocked. Cycles
//!   are surfaced to the UI, not raised as errors.

use std::collections::{HashMap, HashSet};

use crate::model::Task;

/// Borrowed id lookup over a task slice
pub type TaskIndex<'a> = HashMap<&'a str, &'a Task>;

/// Build an id index for O(1) lookups over `tasks`
pub fn index_tasks(tasks: &[Task]) -> TaskIndex<'_> {
    tasks.iter().map(|task| (task.id.as_str(), task)).collect()
}

/// Whether a blocker reference counts as satisfied
///
/// `None` means the referenced task does not exist; absent blockers are
/// satisfied by policy.
pub fn is_task_completed_for_dependency(task: Option<&Task>) -> bool {
    match task {
        None => true,
        Some(task) => task.is_deleted() || task.status.is_terminal(),
    }
}

/// Whether a cycle is reachable from `task_id` along blocker edges
///
/// Depth-first traversal with an explicit recursion stack for back-edge
/// detection and a visited set so cleared subgraphs are not re-explored.
/// Runs independently of task status: completing a task does not break a
/// cycle.
pub fn has_circular_dependency<'a>(task_id: &'a str, tasks: &TaskIndex<'a>) -> bool {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut on_stack: HashSet<&str> = HashSet::new();
    // (node, index of next blocker edge to follow)
    let mut frames: Vec<(&str, usize)> = vec![(task_id, 0)];

    while let Some((id, edge)) = frames.pop() {
        let blockers: &[String] = tasks
            .get(id)
            .map(|task| task.blocked_by_task_ids.as_slice())
            .unwrap_or(&[]);

        if edge == 0 {
            if visited.contains(id) {
                continue;
            }
            visited.insert(id);
            on_stack.insert(id);
        }

        if edge < blockers.len() {
            frames.push((id, edge + 1));
            let next = blockers[edge].as_str();
            if on_stack.contains(next) {
                return true;
            }
            if !visited.contains(next) {
                frames.push((next, 0));
            }
        } else {
            on_stack.remove(id);
        }
    }

    false
}

/// Whether `task` is currently blocked
pub fn is_task_blocked(task: &Task, tasks: &TaskIndex<'_>) -> bool {
    if task.blocked_by_task_ids.is_empty() {
        return false;
    }
    if has_circular_dependency(task.id.as_str(), tasks) {
        return true;
    }
    task.blocked_by_task_ids
        .iter()
        .any(|id| !is_task_completed_for_dependency(tasks.get(id.as_str()).copied()))
}

/// Ids of all blocked tasks within `tasks`
///
/// Builds the index once, so overall cost is O(n * d) for blocker
/// fan-out d.
pub fn blocked_task_ids(tasks: &[Task]) -> HashSet<String> {
    let index = index_tasks(tasks);
    tasks
        .iter()
        .filter(|task| is_task_blocked(task, &index))
        .map(|task| task.id.clone())
        .collect()
}

/// How many non-deleted tasks list `task_id` as a blocker
///
/// Surfaced in the UI as "completing this unblocks N tasks".
pub fn unblocks_count(task_id: &str, tasks: &[Task]) -> usize {
    tasks
        .iter()
        .filter(|task| {
            !task.is_deleted()
                && task
                    .blocked_by_task_ids
                    .iter()
                    .any(|id| id == task_id)
        })
        .count()
}
