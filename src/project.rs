//! Project classification utilities
//!
//! Pure views over the project/task collections. Nothing here mutates
//! input; filters return fresh vectors.

use std::collections::HashMap;

use crate::model::{Project, ProjectStatus, Task, TaskStatus};

/// Borrowed id lookup over a project slice
pub type ProjectIndex<'a> = HashMap<&'a str, &'a Project>;

/// Build an id index for O(1) lookups over `projects`
pub fn index_projects(projects: &[Project]) -> ProjectIndex<'_> {
    projects
        .iter()
        .map(|project| (project.id.as_str(), project))
        .collect()
}

/// Whether `task` counts as belonging to an active project
///
/// Loose tasks and tasks pointing at a project that no longer exists are
/// treated as active; only a real, non-deleted project in a non-active,
/// non-focused state parks its tasks.
pub fn is_task_in_active_project(task: &Task, projects: &ProjectIndex<'_>) -> bool {
    let Some(project_id) = task.project_id.as_deref() else {
        return true;
    };
    let Some(project) = projects.get(project_id) else {
        return true;
    };
    if project.is_deleted() {
        return false;
    }
    project.status == ProjectStatus::Active || project.is_focused
}

/// Whether some non-deleted task of `project` is in `next`
pub fn project_has_next_action(project: &Project, tasks: &[Task]) -> bool {
    tasks.iter().any(|task| {
        task.project_id.as_deref() == Some(project.id.as_str())
            && !task.is_deleted()
            && task.status == TaskStatus::Next
    })
}

/// Active, non-deleted projects lacking a next action
///
/// Drives the "projects that need attention" review prompt.
pub fn projects_needing_next_action<'a>(
    projects: &'a [Project],
    tasks: &[Task],
) -> Vec<&'a Project> {
    projects
        .iter()
        .filter(|project| {
            project.status == ProjectStatus::Active
                && !project.is_deleted()
                && !project_has_next_action(project, tasks)
        })
        .collect()
}

/// Non-deleted projects in an area, sorted by title
pub fn projects_by_area<'a>(projects: &'a [Project], area_id: &str) -> Vec<&'a Project> {
    let mut matched: Vec<&Project> = projects
        .iter()
        .filter(|project| !project.is_deleted() && project.area_id.as_deref() == Some(area_id))
        .collect();
    sort_by_title(&mut matched);
    matched
}

/// Non-deleted projects carrying a tag, sorted by title
pub fn projects_by_tag<'a>(projects: &'a [Project], tag_id: &str) -> Vec<&'a Project> {
    let mut matched: Vec<&Project> = projects
        .iter()
        .filter(|project| {
            !project.is_deleted() && project.tag_ids.iter().any(|id| id == tag_id)
        })
        .collect();
    sort_by_title(&mut matched);
    matched
}

// Case-insensitive title ordering, with the raw title as tiebreaker so
// the sort stays total.
fn sort_by_title(projects: &mut [&Project]) {
    projects.sort_by(|a, b| {
        a.title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.title.cmp(&b.title))
    });
}
