//! In-memory task store with debounced persistence
//!
//! The store is the single source of truth for tasks, projects, areas,
//! and settings. Mutators update the in-memory collections synchronously
//! and arm a trailing-edge debounce timer; rapid mutations collapse into
//! a single save through the [`StorageAdapter`]. `flush_pending_save`
//! is the synchronization barrier for app suspend/exit.
//!
//! Saves are serialized: at most one adapter write is in flight, and the
//! snapshot is taken under the state lock at write time, so a flush
//! always persists the latest state rather than a stale copy. The store
//! never retries a failed write; it re-marks itself dirty and propagates
//! the error (timer-path failures are logged and kept dirty for the next
//! flush).
//!
//! Requires a Tokio runtime context for the debounce timer.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::dependency;
use crate::error::{Error, Result};
use crate::model::{
    AppData, Area, Attachment, ChecklistItem, Priority, Project, ProjectStatus, Settings, Task,
    TaskStatus,
};
use crate::review::{self, StaleItem, DEFAULT_STALE_THRESHOLD_DAYS};

/// Default debounce window between a mutation and its save
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

/// Partial update for a task; unset fields keep their current value
///
/// Nested options distinguish "leave alone" (`None`) from "clear"
/// (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Option<Priority>>,
    pub project_id: Option<Option<String>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub start_date: Option<Option<DateTime<Utc>>>,
    pub blocked_by_task_ids: Option<Vec<String>>,
    pub tag_ids: Option<Vec<String>>,
    pub context_ids: Option<Vec<String>>,
    pub checklist: Option<Vec<ChecklistItem>>,
    pub attachments: Option<Vec<Attachment>>,
    pub notes: Option<Option<String>>,
}

/// Partial update for a project; unset fields keep their current value
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub status: Option<ProjectStatus>,
    pub area_id: Option<Option<String>>,
    pub order: Option<i64>,
    pub color: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub is_focused: Option<bool>,
    pub tag_ids: Option<Vec<String>>,
}

struct State {
    data: AppData,
    dirty: bool,
    pending: Option<JoinHandle<()>>,
}

struct StoreInner {
    state: Mutex<State>,
    adapter: Arc<dyn crate::storage::StorageAdapter>,
    debounce: Duration,
    // Serializes adapter writes: at most one save in flight
    save_lock: tokio::sync::Mutex<()>,
}

/// Handle to the shared store; clones refer to the same state
#[derive(Clone)]
pub struct TaskStore {
    inner: Arc<StoreInner>,
}

impl TaskStore {
    pub fn new(adapter: Arc<dyn crate::storage::StorageAdapter>) -> Self {
        Self::with_debounce(adapter, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(
        adapter: Arc<dyn crate::storage::StorageAdapter>,
        debounce: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(State {
                    data: AppData::default(),
                    dirty: false,
                    pending: None,
                }),
                adapter,
                debounce,
                save_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Replace in-memory state wholesale with the adapter's blob
    ///
    /// Called once at startup. Adapter failures (including corrupt data)
    /// propagate; the previous in-memory state is left untouched.
    pub async fn fetch_data(&self) -> Result<()> {
        // Serialize against any write already in flight so a stale
        // snapshot cannot land on the adapter after the load.
        let _guard = self.inner.save_lock.lock().await;
        let data = self.inner.adapter.get_data().await?;
        let mut state = lock_state(&self.inner);
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        debug!(
            tasks = data.tasks.len(),
            projects = data.projects.len(),
            "loaded application data"
        );
        state.data = data;
        state.dirty = false;
        Ok(())
    }

    /// Persist the latest state now, cancelling any pending timer
    ///
    /// Idempotent: a flush with nothing dirty performs no adapter call.
    /// Resolves once the adapter write completes; a flush arriving while
    /// a timer-initiated write is in flight waits for that write before
    /// deciding whether anything is left to save. Write errors propagate
    /// and leave the store dirty for a later flush.
    pub async fn flush_pending_save(&self) -> Result<()> {
        let pending = {
            let mut state = lock_state(&self.inner);
            state.pending.take()
        };
        if let Some(pending) = pending {
            pending.abort();
        }
        save_now(&self.inner).await
    }

    // =========================================================================
    // Task mutators
    // =========================================================================

    /// Add an inbox task with the given title
    pub fn add_task(&self, title: impl Into<String>) -> Task {
        let task = Task::new(title);
        let created = task.clone();
        let mut state = lock_state(&self.inner);
        state.data.tasks.push(task);
        self.mark_dirty(&mut state);
        created
    }

    /// Add a task with an explicit status and project
    pub fn add_task_with(
        &self,
        title: impl Into<String>,
        status: TaskStatus,
        project_id: Option<String>,
    ) -> Task {
        let mut task = Task::new(title);
        task.status = status;
        task.project_id = project_id;
        let created = task.clone();
        let mut state = lock_state(&self.inner);
        state.data.tasks.push(task);
        self.mark_dirty(&mut state);
        created
    }

    /// Add several inbox tasks at once (one debounce arm for the batch)
    pub fn add_tasks<I, S>(&self, titles: I) -> Vec<Task>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tasks: Vec<Task> = titles.into_iter().map(Task::new).collect();
        if tasks.is_empty() {
            return tasks;
        }
        let mut state = lock_state(&self.inner);
        state.data.tasks.extend(tasks.iter().cloned());
        self.mark_dirty(&mut state);
        tasks
    }

    /// Merge a partial update into a task and bump its `updated_at`
    pub fn update_task(&self, task_id: &str, patch: TaskPatch) -> Result<Task> {
        let mut state = lock_state(&self.inner);
        let task = state
            .data
            .tasks
            .iter_mut()
            .find(|task| task.id == task_id)
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(project_id) = patch.project_id {
            task.project_id = project_id;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(start_date) = patch.start_date {
            task.start_date = start_date;
        }
        if let Some(blocked_by) = patch.blocked_by_task_ids {
            task.blocked_by_task_ids = blocked_by;
        }
        if let Some(tag_ids) = patch.tag_ids {
            task.tag_ids = tag_ids;
        }
        if let Some(context_ids) = patch.context_ids {
            task.context_ids = context_ids;
        }
        if let Some(checklist) = patch.checklist {
            task.checklist = checklist;
        }
        if let Some(attachments) = patch.attachments {
            task.attachments = attachments;
        }
        if let Some(notes) = patch.notes {
            task.notes = notes;
        }
        task.updated_at = Utc::now();
        let updated = task.clone();

        self.mark_dirty(&mut state);
        Ok(updated)
    }

    /// Soft-delete a task
    ///
    /// The record stays in the collection with `deleted_at` set; views
    /// and dependency resolution treat it as gone.
    pub fn delete_task(&self, task_id: &str) -> Result<()> {
        let mut state = lock_state(&self.inner);
        let task = state
            .data
            .tasks
            .iter_mut()
            .find(|task| task.id == task_id)
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;
        let now = Utc::now();
        task.deleted_at = Some(now);
        task.updated_at = now;
        self.mark_dirty(&mut state);
        Ok(())
    }

    // =========================================================================
    // Project mutators
    // =========================================================================

    /// Add an active project
    pub fn add_project(&self, title: impl Into<String>, color: Option<String>) -> Project {
        let mut project = Project::new(title);
        project.color = color;
        let created = project.clone();
        let mut state = lock_state(&self.inner);
        state.data.projects.push(project);
        self.mark_dirty(&mut state);
        created
    }

    /// Merge a partial update into a project and bump its `updated_at`
    pub fn update_project(&self, project_id: &str, patch: ProjectPatch) -> Result<Project> {
        let mut state = lock_state(&self.inner);
        let project = state
            .data
            .projects
            .iter_mut()
            .find(|project| project.id == project_id)
            .ok_or_else(|| Error::ProjectNotFound(project_id.to_string()))?;

        if let Some(title) = patch.title {
            project.title = title;
        }
        if let Some(status) = patch.status {
            project.status = status;
        }
        if let Some(area_id) = patch.area_id {
            project.area_id = area_id;
        }
        if let Some(order) = patch.order {
            project.order = order;
        }
        if let Some(color) = patch.color {
            project.color = color;
        }
        if let Some(notes) = patch.notes {
            project.notes = notes;
        }
        if let Some(is_focused) = patch.is_focused {
            project.is_focused = is_focused;
        }
        if let Some(tag_ids) = patch.tag_ids {
            project.tag_ids = tag_ids;
        }
        project.updated_at = Utc::now();
        let updated = project.clone();

        self.mark_dirty(&mut state);
        Ok(updated)
    }

    /// Soft-delete a project; its tasks keep their (now dangling)
    /// reference
    pub fn delete_project(&self, project_id: &str) -> Result<()> {
        let mut state = lock_state(&self.inner);
        let project = state
            .data
            .projects
            .iter_mut()
            .find(|project| project.id == project_id)
            .ok_or_else(|| Error::ProjectNotFound(project_id.to_string()))?;
        let now = Utc::now();
        project.deleted_at = Some(now);
        project.updated_at = now;
        self.mark_dirty(&mut state);
        Ok(())
    }

    /// Mutate settings in place
    pub fn update_settings(&self, mutate: impl FnOnce(&mut Settings)) {
        let mut state = lock_state(&self.inner);
        mutate(&mut state.data.settings);
        self.mark_dirty(&mut state);
    }

    // =========================================================================
    // Read accessors (snapshots, never internal references)
    // =========================================================================

    /// Clone of the full blob, as it would be persisted
    pub fn snapshot(&self) -> AppData {
        lock_state(&self.inner).data.clone()
    }

    /// Non-deleted tasks
    pub fn tasks(&self) -> Vec<Task> {
        lock_state(&self.inner)
            .data
            .tasks
            .iter()
            .filter(|task| !task.is_deleted())
            .cloned()
            .collect()
    }

    /// Non-deleted projects
    pub fn projects(&self) -> Vec<Project> {
        lock_state(&self.inner)
            .data
            .projects
            .iter()
            .filter(|project| !project.is_deleted())
            .cloned()
            .collect()
    }

    pub fn areas(&self) -> Vec<Area> {
        lock_state(&self.inner).data.areas.clone()
    }

    pub fn settings(&self) -> Settings {
        lock_state(&self.inner).data.settings.clone()
    }

    /// Ids of tasks currently blocked by unfinished or cyclic blockers
    pub fn blocked_task_ids(&self) -> std::collections::HashSet<String> {
        let state = lock_state(&self.inner);
        dependency::blocked_task_ids(&state.data.tasks)
    }

    /// Stale review items using the configured threshold
    pub fn stale_items(&self, now: DateTime<Utc>) -> Vec<StaleItem> {
        let state = lock_state(&self.inner);
        let threshold = state
            .data
            .settings
            .stale_threshold_days
            .unwrap_or(DEFAULT_STALE_THRESHOLD_DAYS);
        review::stale_items(&state.data.tasks, &state.data.projects, threshold, now)
    }

    /// Whether unsaved changes exist
    pub fn is_dirty(&self) -> bool {
        lock_state(&self.inner).dirty
    }

    // =========================================================================
    // Persistence internals
    // =========================================================================

    // Trailing-edge debounce: every mutation resets the timer, so a
    // burst of edits produces one save.
    //
    // `pending` is only the timer. The write runs in a detached task,
    // so aborting `pending` can never abandon a write that has already
    // cleared the dirty flag; once a save starts it either completes or
    // fails and re-marks the store dirty.
    fn mark_dirty(&self, state: &mut MutexGuard<'_, State>) {
        state.dirty = true;
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        let inner = Arc::clone(&self.inner);
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            tokio::spawn(async move {
                if let Err(err) = save_now(&inner).await {
                    warn!(error = %err, "debounced save failed; state kept dirty");
                }
            });
        }));
    }
}

fn lock_state(inner: &StoreInner) -> MutexGuard<'_, State> {
    // A panic while holding the lock leaves the data itself intact;
    // recover rather than poisoning every later call.
    inner
        .state
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn save_now(inner: &Arc<StoreInner>) -> Result<()> {
    let _guard = inner.save_lock.lock().await;

    let snapshot = {
        let mut state = lock_state(inner);
        if !state.dirty {
            return Ok(());
        }
        state.dirty = false;
        state.data.clone()
    };

    match inner.adapter.save_data(&snapshot).await {
        Ok(()) => {
            debug!(tasks = snapshot.tasks.len(), "saved application data");
            Ok(())
        }
        Err(err) => {
            lock_state(inner).dirty = true;
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageAdapter};
    use async_trait::async_trait;

    /// Adapter that records every saved blob
    #[derive(Default)]
    struct RecordingStorage {
        saves: Mutex<Vec<AppData>>,
        fail_saves: std::sync::atomic::AtomicBool,
    }

    impl RecordingStorage {
        fn save_count(&self) -> usize {
            self.saves.lock().unwrap().len()
        }

        fn last_save(&self) -> Option<AppData> {
            self.saves.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl StorageAdapter for RecordingStorage {
        async fn get_data(&self) -> crate::Result<AppData> {
            Ok(AppData::default())
        }

        async fn save_data(&self, data: &AppData) -> crate::Result<()> {
            if self.fail_saves.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(Error::Storage("disk full".to_string()));
            }
            self.saves.lock().unwrap().push(data.clone());
            Ok(())
        }
    }

    // Long window so tests control when saves happen via flush
    fn store_with(adapter: Arc<RecordingStorage>) -> TaskStore {
        TaskStore::with_debounce(adapter, Duration::from_secs(3600))
    }

    /// Adapter whose writes park until the test releases them
    #[derive(Default)]
    struct BlockingStorage {
        saves: Mutex<Vec<AppData>>,
        started: std::sync::atomic::AtomicUsize,
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl StorageAdapter for BlockingStorage {
        async fn get_data(&self) -> crate::Result<AppData> {
            Ok(AppData::default())
        }

        async fn save_data(&self, data: &AppData) -> crate::Result<()> {
            self.started
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.release.notified().await;
            self.saves.lock().unwrap().push(data.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn add_task_defaults_to_inbox() {
        let store = store_with(Arc::new(RecordingStorage::default()));
        store.add_task("New Task");
        let tasks = store.tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "New Task");
        assert_eq!(tasks[0].status, TaskStatus::Inbox);
    }

    #[tokio::test]
    async fn update_task_merges_and_bumps_updated_at() {
        let store = store_with(Arc::new(RecordingStorage::default()));
        let task = store.add_task("Task to Update");
        let before = task.updated_at;

        let updated = store
            .update_task(
                &task.id,
                TaskPatch {
                    title: Some("Updated Task".to_string()),
                    status: Some(TaskStatus::Next),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "Updated Task");
        assert_eq!(updated.status, TaskStatus::Next);
        assert!(updated.updated_at >= before);
        // Untouched fields survive the merge
        assert_eq!(updated.created_at, task.created_at);
    }

    #[tokio::test]
    async fn patch_can_clear_optional_fields() {
        let store = store_with(Arc::new(RecordingStorage::default()));
        let task = store.add_task_with("In project", TaskStatus::Next, Some("p1".to_string()));
        let updated = store
            .update_task(
                &task.id,
                TaskPatch {
                    project_id: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(updated.project_id.is_none());
    }

    #[tokio::test]
    async fn update_unknown_task_errors() {
        let store = store_with(Arc::new(RecordingStorage::default()));
        let err = store.update_task("ghost", TaskPatch::default()).unwrap_err();
        assert!(matches!(err, Error::TaskNotFound(_)));
    }

    #[tokio::test]
    async fn delete_task_is_soft() {
        let store = store_with(Arc::new(RecordingStorage::default()));
        let task = store.add_task("Task to Delete");
        store.delete_task(&task.id).unwrap();

        // Excluded from active views, retained in the blob
        assert!(store.tasks().is_empty());
        let snapshot = store.snapshot();
        assert_eq!(snapshot.tasks.len(), 1);
        assert!(snapshot.tasks[0].deleted_at.is_some());
    }

    #[tokio::test]
    async fn add_project_carries_color() {
        let store = store_with(Arc::new(RecordingStorage::default()));
        store.add_project("New Project", Some("#ff0000".to_string()));
        let projects = store.projects();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].title, "New Project");
        assert_eq!(projects[0].color.as_deref(), Some("#ff0000"));
        assert_eq!(projects[0].status, ProjectStatus::Active);
    }

    #[tokio::test]
    async fn debounced_save_flushes_once_and_is_idempotent() {
        let adapter = Arc::new(RecordingStorage::default());
        let store = store_with(Arc::clone(&adapter));

        store.add_task("Test Save");
        // Debounced: nothing persisted yet
        assert_eq!(adapter.save_count(), 0);

        store.flush_pending_save().await.unwrap();
        assert_eq!(adapter.save_count(), 1);
        let saved = adapter.last_save().unwrap();
        assert_eq!(saved.tasks.len(), 1);
        assert_eq!(saved.tasks[0].title, "Test Save");

        // No intervening mutation: flush performs no additional save
        store.flush_pending_save().await.unwrap();
        assert_eq!(adapter.save_count(), 1);
    }

    #[tokio::test]
    async fn burst_of_mutations_coalesces_into_one_save() {
        let adapter = Arc::new(RecordingStorage::default());
        let store = store_with(Arc::clone(&adapter));

        for i in 0..10 {
            store.add_task(format!("Task {i}"));
        }
        store.flush_pending_save().await.unwrap();

        assert_eq!(adapter.save_count(), 1);
        assert_eq!(adapter.last_save().unwrap().tasks.len(), 10);
    }

    #[tokio::test]
    async fn timer_fires_without_flush() {
        let adapter = Arc::new(RecordingStorage::default());
        let store = TaskStore::with_debounce(
            Arc::clone(&adapter) as Arc<dyn StorageAdapter>,
            Duration::from_millis(10),
        );

        store.add_task("Eventually saved");
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(adapter.save_count(), 1);
        assert!(!store.is_dirty());
    }

    #[tokio::test]
    async fn flush_waits_for_write_already_in_flight() {
        let adapter = Arc::new(BlockingStorage::default());
        let store = TaskStore::with_debounce(
            Arc::clone(&adapter) as Arc<dyn StorageAdapter>,
            Duration::from_millis(10),
        );

        store.add_task("Raced");
        // Let the timer fire and enter the adapter write
        while adapter.started.load(std::sync::atomic::Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let flusher = {
            let store = store.clone();
            tokio::spawn(async move { store.flush_pending_save().await })
        };
        // Park the flush behind the in-flight write, then let it finish
        tokio::task::yield_now().await;
        adapter.release.notify_one();
        flusher.await.unwrap().unwrap();

        // The flush must not return until the task is actually on the
        // adapter; the store ends up clean with the write landed.
        {
            let saves = adapter.saves.lock().unwrap();
            assert_eq!(saves.len(), 1);
            assert_eq!(saves[0].tasks[0].title, "Raced");
        }
        assert!(!store.is_dirty());
    }

    #[tokio::test]
    async fn failed_flush_propagates_and_keeps_store_dirty() {
        let adapter = Arc::new(RecordingStorage::default());
        let store = store_with(Arc::clone(&adapter));

        store.add_task("Unsavable");
        adapter
            .fail_saves
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let err = store.flush_pending_save().await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(store.is_dirty());

        // Recovery: a later flush persists the same state
        adapter
            .fail_saves
            .store(false, std::sync::atomic::Ordering::SeqCst);
        store.flush_pending_save().await.unwrap();
        assert_eq!(adapter.save_count(), 1);
    }

    #[tokio::test]
    async fn fetch_data_replaces_state_wholesale() {
        let mut seeded = AppData::default();
        seeded.tasks.push(Task::new("From disk"));
        let store = TaskStore::with_debounce(
            Arc::new(MemoryStorage::with_data(seeded)),
            Duration::from_secs(3600),
        );

        store.add_task("Pre-load local"); // discarded by the load
        store.fetch_data().await.unwrap();

        let tasks = store.tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "From disk");
        assert!(!store.is_dirty());
    }

    #[tokio::test]
    async fn flush_captures_mutations_after_arming() {
        let adapter = Arc::new(RecordingStorage::default());
        let store = store_with(Arc::clone(&adapter));

        store.add_task("First");
        store.add_task("Second");
        store.flush_pending_save().await.unwrap();

        // The single save holds both mutations, not a stale snapshot
        assert_eq!(adapter.last_save().unwrap().tasks.len(), 2);
    }

    #[tokio::test]
    async fn store_level_blocked_and_stale_views() {
        let store = store_with(Arc::new(RecordingStorage::default()));
        let blocker = store.add_task_with("Blocker", TaskStatus::Next, None);
        let dependent = store.add_task_with("Dependent", TaskStatus::Next, None);
        store
            .update_task(
                &dependent.id,
                TaskPatch {
                    blocked_by_task_ids: Some(vec![blocker.id.clone()]),
                    ..Default::default()
                },
            )
            .unwrap();

        let blocked = store.blocked_task_ids();
        assert!(blocked.contains(&dependent.id));
        assert!(!blocked.contains(&blocker.id));

        // Nothing stale yet: everything was touched just now
        assert!(store.stale_items(Utc::now()).is_empty());
    }
}
