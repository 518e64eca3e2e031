//! Data model for tend
//!
//! Tasks, projects, and areas are plain records referencing each other by
//! id. References are weak: a task may point at a project or blocker that
//! no longer exists, and every consumer must define its own "absent" policy
//! rather than assuming referential integrity.
//!
//! Deletion is soft: `deleted_at` marks a record as removed without
//! dropping it from the collections. Physical removal happens only through
//! an explicit purge at the storage layer.
//!
//! Field names serialize in camelCase so the persisted blob stays
//! compatible with the application shells.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::generate_uuid;
use crate::pomodoro::PomodoroDurations;

/// Workflow status for a task
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Inbox,
    Todo,
    Next,
    InProgress,
    Waiting,
    Someday,
    Done,
    Archived,
}

impl TaskStatus {
    /// Statuses that satisfy a dependency on this task
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Archived)
    }
}

/// Workflow status for a project
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    Active,
    Waiting,
    Someday,
    Done,
    Archived,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Kind of attachment: a managed file or an external link
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AttachmentKind {
    File,
    Link,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub kind: AttachmentKind,
    pub title: String,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

/// A single task record
///
/// Absent array fields deserialize as empty rather than failing, since
/// older blobs predate several of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    /// Ids of tasks that must complete before this one is actionable
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_by_task_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checklist: Vec<ChecklistItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purged_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a fresh inbox task with a generated id
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_uuid(),
            title: title.into(),
            status: TaskStatus::Inbox,
            priority: None,
            project_id: None,
            due_date: None,
            start_date: None,
            blocked_by_task_ids: Vec::new(),
            tag_ids: Vec::new(),
            context_ids: Vec::new(),
            checklist: Vec::new(),
            attachments: Vec::new(),
            notes: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            purged_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A project grouping tasks toward an outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub status: ProjectStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_id: Option<String>,
    #[serde(default)]
    pub order: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Focused projects stay actionable regardless of status
    #[serde(default)]
    pub is_focused: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purged_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Create a fresh active project with a generated id
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_uuid(),
            title: title.into(),
            status: ProjectStatus::Active,
            area_id: None,
            order: 0,
            color: None,
            notes: None,
            is_focused: false,
            tag_ids: Vec::new(),
            attachments: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
            purged_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// An area of responsibility grouping projects
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Area {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_uuid(),
            title: title.into(),
            order: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// User settings persisted alongside the collections
///
/// The core only reads a handful of typed fields; everything else the
/// shells store here round-trips untouched through `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pomodoro: Option<PomodoroDurations>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_threshold_days: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The full persisted application blob
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub areas: Vec<Area>,
    #[serde(default)]
    pub settings: Settings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_defaults_to_inbox() {
        let task = Task::new("Capture");
        assert_eq!(task.status, TaskStatus::Inbox);
        assert_eq!(task.created_at, task.updated_at);
        assert!(!task.is_deleted());
        assert_eq!(task.id.len(), 36);
    }

    #[test]
    fn task_status_serializes_with_dashes() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let back: TaskStatus = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(back, TaskStatus::InProgress);
    }

    #[test]
    fn task_fields_serialize_in_camel_case() {
        let mut task = Task::new("Ship");
        task.blocked_by_task_ids = vec!["other".to_string()];
        task.project_id = Some("p1".to_string());
        let value = serde_json::to_value(&task).unwrap();
        assert!(value.get("blockedByTaskIds").is_some());
        assert!(value.get("projectId").is_some());
        assert!(value.get("createdAt").is_some());
        // Unset soft-delete marker is omitted entirely
        assert!(value.get("deletedAt").is_none());
    }

    #[test]
    fn absent_arrays_deserialize_as_empty() {
        let json = r#"{
            "id": "t1",
            "title": "Sparse",
            "status": "todo",
            "createdAt": "2026-01-01T00:00:00Z",
            "updatedAt": "2026-01-01T00:00:00Z"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert!(task.blocked_by_task_ids.is_empty());
        assert!(task.tag_ids.is_empty());
        assert!(task.checklist.is_empty());
    }

    #[test]
    fn app_data_defaults_are_empty() {
        let data: AppData = serde_json::from_str("{}").unwrap();
        assert!(data.tasks.is_empty());
        assert!(data.projects.is_empty());
        assert!(data.areas.is_empty());
    }

    #[test]
    fn settings_preserve_unknown_keys() {
        let json = r#"{"staleThresholdDays": 21, "theme": "dark"}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.stale_threshold_days, Some(21));
        assert_eq!(
            settings.extra.get("theme").and_then(|v| v.as_str()),
            Some("dark")
        );
        let round = serde_json::to_value(&settings).unwrap();
        assert_eq!(round.get("theme").and_then(|v| v.as_str()), Some("dark"));
    }
}
