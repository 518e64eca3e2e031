//! Review staleness computation
//!
//! During a weekly review the app surfaces next/waiting tasks and active
//! projects that have not been touched recently. Staleness is measured in
//! whole days since the last update, rounded up.

use chrono::{DateTime, Utc};

use crate::model::{Project, ProjectStatus, Task, TaskStatus};
use crate::project::{index_projects, is_task_in_active_project};

/// Default number of days after which an item counts as stale
pub const DEFAULT_STALE_THRESHOLD_DAYS: i64 = 14;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// What kind of record a stale item refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StaleKind {
    Next,
    Waiting,
    Project,
}

/// One entry in the review's stale list
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaleItem {
    /// Task id, or `project:<id>` for projects so the combined list
    /// stays unambiguous
    pub id: String,
    pub title: String,
    pub days_stale: i64,
    pub kind: StaleKind,
}

/// Stale next/waiting tasks and active projects, most stale first
///
/// Tasks only count when they sit in an active project (loose tasks and
/// dangling project references included, per
/// [`is_task_in_active_project`]). Items at or under the threshold are
/// excluded.
pub fn stale_items(
    tasks: &[Task],
    projects: &[Project],
    stale_threshold_days: i64,
    now: DateTime<Utc>,
) -> Vec<StaleItem> {
    let project_index = index_projects(projects);
    let mut items = Vec::new();

    for task in tasks {
        if task.is_deleted() {
            continue;
        }
        let kind = match task.status {
            TaskStatus::Next => StaleKind::Next,
            TaskStatus::Waiting => StaleKind::Waiting,
            _ => continue,
        };
        if !is_task_in_active_project(task, &project_index) {
            continue;
        }
        let days_stale = days_between(task.updated_at, now);
        if days_stale <= stale_threshold_days {
            continue;
        }
        items.push(StaleItem {
            id: task.id.clone(),
            title: task.title.clone(),
            days_stale,
            kind,
        });
    }

    for project in projects {
        if project.is_deleted() || project.status != ProjectStatus::Active {
            continue;
        }
        let days_stale = days_between(project.updated_at, now);
        if days_stale <= stale_threshold_days {
            continue;
        }
        items.push(StaleItem {
            id: format!("project:{}", project.id),
            title: project.title.clone(),
            days_stale,
            kind: StaleKind::Project,
        });
    }

    items.sort_by(|a, b| b.days_stale.cmp(&a.days_stale));
    items
}

// Ceiling of elapsed wall-clock days; an update later the same day
// already counts as one day stale.
fn days_between(updated: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let elapsed_ms = (now - updated).num_milliseconds();
    (elapsed_ms + DAY_MS - 1).div_euclid(DAY_MS)
}
