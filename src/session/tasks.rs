//! Task ledger for focus-time tracking.
//!
//! Tracks every task the user has added, which single task is the active
//! focus target, and how many seconds of focus time each task has
//! accrued. After every mutation the ledger guarantees that at most one
//! task is in progress, and that it is exactly the active one.

use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::types::{Task, TaskStatus, TaskView};

// ============================================================================
// LedgerError
// ============================================================================

/// Errors that can occur on task ledger operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The requested task id does not exist.
    #[error("タスクが見つかりません (id: {0})")]
    TaskNotFound(u64),

    /// The task text was empty or whitespace only.
    #[error("タスク名を入力してください")]
    EmptyText,
}

impl LedgerError {
    /// Returns true if this error is a missing task id.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TaskNotFound(_))
    }
}

// ============================================================================
// TaskLedger
// ============================================================================

/// The set of tracked tasks and the active focus target.
#[derive(Debug, Default)]
pub struct TaskLedger {
    /// Tasks in creation order
    tasks: Vec<Task>,
    /// Id of the single in-progress task, if any
    active_id: Option<u64>,
    /// Next id to hand out
    next_id: u64,
}

impl TaskLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            active_id: None,
            next_id: 1,
        }
    }

    /// Adds a new pending task and returns its id.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::EmptyText` if the text is empty after trimming.
    pub fn add(&mut self, text: &str) -> Result<u64, LedgerError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(LedgerError::EmptyText);
        }

        let id = self.next_id;
        self.next_id += 1;
        self.tasks.push(Task::new(id, trimmed));
        Ok(id)
    }

    /// Makes the given task the active focus target.
    ///
    /// Any other in-progress task is demoted back to pending; completed
    /// tasks are never demoted.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::TaskNotFound` for an unknown id, in which
    /// case nothing changes.
    pub fn start(&mut self, id: u64) -> Result<(), LedgerError> {
        if !self.contains(id) {
            return Err(LedgerError::TaskNotFound(id));
        }

        for task in &mut self.tasks {
            if task.id != id && task.status == TaskStatus::InProgress {
                task.status = TaskStatus::Pending;
            }
        }

        if let Some(task) = self.find_mut(id) {
            task.status = TaskStatus::InProgress;
            task.started_at = Some(unix_now());
        }
        self.active_id = Some(id);
        Ok(())
    }

    /// Accrues one second of focus time to the given task.
    ///
    /// No-op unless the id names the current active task.
    pub fn accrue_second(&mut self, id: u64) {
        if self.active_id != Some(id) {
            return;
        }
        if let Some(task) = self.find_mut(id) {
            task.time_spent += 1;
        }
    }

    /// Completes the active task, if any, and returns its text.
    pub fn complete_active(&mut self) -> Option<String> {
        let id = self.active_id.take()?;
        let task = self.find_mut(id)?;
        task.status = TaskStatus::Completed;
        Some(task.text.clone())
    }

    /// Flips a task between completed and pending.
    ///
    /// Returns whether the task is now completed. Toggling the active
    /// task to completed clears the active id.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::TaskNotFound` for an unknown id.
    pub fn toggle(&mut self, id: u64) -> Result<bool, LedgerError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(LedgerError::TaskNotFound(id))?;

        let now_completed = if task.is_completed() {
            task.status = TaskStatus::Pending;
            false
        } else {
            task.status = TaskStatus::Completed;
            true
        };

        if now_completed && self.active_id == Some(id) {
            self.active_id = None;
        }
        Ok(now_completed)
    }

    /// Removes a task from the ledger.
    ///
    /// Deleting the active task clears the active id, stopping accrual.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::TaskNotFound` for an unknown id.
    pub fn delete(&mut self, id: u64) -> Result<(), LedgerError> {
        if !self.contains(id) {
            return Err(LedgerError::TaskNotFound(id));
        }

        self.tasks.retain(|t| t.id != id);
        if self.active_id == Some(id) {
            self.active_id = None;
        }
        Ok(())
    }

    /// Returns the id of the active task, if any.
    pub fn active_id(&self) -> Option<u64> {
        self.active_id
    }

    /// Returns the text of the active task, if any.
    pub fn active_text(&self) -> Option<&str> {
        let id = self.active_id?;
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.text.as_str())
    }

    /// Looks up a task by id.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Returns true if a task with the given id exists.
    pub fn contains(&self, id: u64) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    /// Returns serializable views of all tasks in creation order.
    pub fn views(&self) -> Vec<TaskView> {
        self.tasks.iter().map(TaskView::from).collect()
    }

    /// Returns the number of tracked tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if no tasks are tracked.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn find_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn in_progress_count(ledger: &TaskLedger) -> usize {
        ledger
            .views()
            .iter()
            .filter(|v| v.status == TaskStatus::InProgress)
            .count()
    }

    // ------------------------------------------------------------------------
    // Add Tests
    // ------------------------------------------------------------------------

    mod add_tests {
        use super::*;

        #[test]
        fn test_add_returns_monotonic_ids() {
            let mut ledger = TaskLedger::new();
            let first = ledger.add("Write report").unwrap();
            let second = ledger.add("Review PR").unwrap();

            assert!(second > first);
            assert_eq!(ledger.len(), 2);
        }

        #[test]
        fn test_add_trims_text() {
            let mut ledger = TaskLedger::new();
            let id = ledger.add("  Write report  ").unwrap();
            assert_eq!(ledger.get(id).unwrap().text, "Write report");
        }

        #[test]
        fn test_add_rejects_empty_text() {
            let mut ledger = TaskLedger::new();
            assert_eq!(ledger.add(""), Err(LedgerError::EmptyText));
            assert_eq!(ledger.add("   "), Err(LedgerError::EmptyText));
            assert!(ledger.is_empty());
        }

        #[test]
        fn test_new_task_starts_pending() {
            let mut ledger = TaskLedger::new();
            let id = ledger.add("Write report").unwrap();

            let task = ledger.get(id).unwrap();
            assert_eq!(task.status, TaskStatus::Pending);
            assert_eq!(task.time_spent, 0);
            assert!(task.started_at.is_none());
        }
    }

    // ------------------------------------------------------------------------
    // Start Tests
    // ------------------------------------------------------------------------

    mod start_tests {
        use super::*;

        #[test]
        fn test_start_marks_in_progress_and_active() {
            let mut ledger = TaskLedger::new();
            let id = ledger.add("Write report").unwrap();

            ledger.start(id).unwrap();

            let task = ledger.get(id).unwrap();
            assert_eq!(task.status, TaskStatus::InProgress);
            assert!(task.started_at.is_some());
            assert_eq!(ledger.active_id(), Some(id));
            assert_eq!(ledger.active_text(), Some("Write report"));
        }

        #[test]
        fn test_start_unknown_id_is_error_without_changes() {
            let mut ledger = TaskLedger::new();
            let id = ledger.add("Write report").unwrap();
            ledger.start(id).unwrap();

            let result = ledger.start(999);
            assert_eq!(result, Err(LedgerError::TaskNotFound(999)));
            assert!(result.unwrap_err().is_not_found());
            assert_eq!(ledger.active_id(), Some(id));
        }

        #[test]
        fn test_start_demotes_previous_in_progress_task() {
            let mut ledger = TaskLedger::new();
            let first = ledger.add("First").unwrap();
            let second = ledger.add("Second").unwrap();

            ledger.start(first).unwrap();
            ledger.start(second).unwrap();

            assert_eq!(ledger.get(first).unwrap().status, TaskStatus::Pending);
            assert_eq!(ledger.get(second).unwrap().status, TaskStatus::InProgress);
            assert_eq!(ledger.active_id(), Some(second));
            assert_eq!(in_progress_count(&ledger), 1);
        }

        #[test]
        fn test_start_never_demotes_completed_tasks() {
            let mut ledger = TaskLedger::new();
            let done = ledger.add("Done").unwrap();
            let next = ledger.add("Next").unwrap();

            ledger.toggle(done).unwrap();
            ledger.start(next).unwrap();

            assert_eq!(ledger.get(done).unwrap().status, TaskStatus::Completed);
        }
    }

    // ------------------------------------------------------------------------
    // Accrual Tests
    // ------------------------------------------------------------------------

    mod accrual_tests {
        use super::*;

        #[test]
        fn test_accrue_increments_active_task() {
            let mut ledger = TaskLedger::new();
            let id = ledger.add("Write report").unwrap();
            ledger.start(id).unwrap();

            ledger.accrue_second(id);
            ledger.accrue_second(id);
            ledger.accrue_second(id);

            assert_eq!(ledger.get(id).unwrap().time_spent, 3);
        }

        #[test]
        fn test_accrue_ignores_non_active_ids() {
            let mut ledger = TaskLedger::new();
            let active = ledger.add("Active").unwrap();
            let other = ledger.add("Other").unwrap();
            ledger.start(active).unwrap();

            ledger.accrue_second(other);
            ledger.accrue_second(999);

            assert_eq!(ledger.get(active).unwrap().time_spent, 0);
            assert_eq!(ledger.get(other).unwrap().time_spent, 0);
        }

        #[test]
        fn test_accrue_stops_after_delete() {
            let mut ledger = TaskLedger::new();
            let id = ledger.add("Write report").unwrap();
            ledger.start(id).unwrap();
            ledger.accrue_second(id);

            ledger.delete(id).unwrap();
            ledger.accrue_second(id);

            assert!(ledger.active_id().is_none());
            assert!(ledger.get(id).is_none());
        }
    }

    // ------------------------------------------------------------------------
    // Completion Tests
    // ------------------------------------------------------------------------

    mod completion_tests {
        use super::*;

        #[test]
        fn test_complete_active_marks_completed_and_clears_active() {
            let mut ledger = TaskLedger::new();
            let id = ledger.add("Write report").unwrap();
            ledger.start(id).unwrap();

            let completed = ledger.complete_active();

            assert_eq!(completed, Some("Write report".to_string()));
            assert_eq!(ledger.get(id).unwrap().status, TaskStatus::Completed);
            assert!(ledger.active_id().is_none());
            assert_eq!(in_progress_count(&ledger), 0);
        }

        #[test]
        fn test_complete_active_without_active_task() {
            let mut ledger = TaskLedger::new();
            ledger.add("Idle task").unwrap();

            assert_eq!(ledger.complete_active(), None);
        }
    }

    // ------------------------------------------------------------------------
    // Toggle Tests
    // ------------------------------------------------------------------------

    mod toggle_tests {
        use super::*;

        #[test]
        fn test_toggle_flips_between_completed_and_pending() {
            let mut ledger = TaskLedger::new();
            let id = ledger.add("Write report").unwrap();

            assert!(ledger.toggle(id).unwrap());
            assert_eq!(ledger.get(id).unwrap().status, TaskStatus::Completed);

            assert!(!ledger.toggle(id).unwrap());
            assert_eq!(ledger.get(id).unwrap().status, TaskStatus::Pending);
        }

        #[test]
        fn test_toggle_active_task_clears_active_id() {
            let mut ledger = TaskLedger::new();
            let id = ledger.add("Write report").unwrap();
            ledger.start(id).unwrap();

            assert!(ledger.toggle(id).unwrap());
            assert!(ledger.active_id().is_none());
            assert_eq!(in_progress_count(&ledger), 0);
        }

        #[test]
        fn test_toggle_unknown_id_is_error() {
            let mut ledger = TaskLedger::new();
            assert_eq!(ledger.toggle(42), Err(LedgerError::TaskNotFound(42)));
        }
    }

    // ------------------------------------------------------------------------
    // Delete Tests
    // ------------------------------------------------------------------------

    mod delete_tests {
        use super::*;

        #[test]
        fn test_delete_removes_task() {
            let mut ledger = TaskLedger::new();
            let id = ledger.add("Write report").unwrap();

            ledger.delete(id).unwrap();

            assert!(ledger.get(id).is_none());
            assert!(ledger.is_empty());
        }

        #[test]
        fn test_delete_active_task_clears_active_id() {
            let mut ledger = TaskLedger::new();
            let id = ledger.add("Write report").unwrap();
            ledger.start(id).unwrap();

            ledger.delete(id).unwrap();

            assert!(ledger.active_id().is_none());
            assert!(ledger.active_text().is_none());
        }

        #[test]
        fn test_delete_other_task_keeps_active_id() {
            let mut ledger = TaskLedger::new();
            let keep = ledger.add("Keep").unwrap();
            let remove = ledger.add("Remove").unwrap();
            ledger.start(keep).unwrap();

            ledger.delete(remove).unwrap();

            assert_eq!(ledger.active_id(), Some(keep));
        }

        #[test]
        fn test_delete_unknown_id_is_error() {
            let mut ledger = TaskLedger::new();
            assert_eq!(ledger.delete(7), Err(LedgerError::TaskNotFound(7)));
        }
    }

    // ------------------------------------------------------------------------
    // Invariant Tests
    // ------------------------------------------------------------------------

    mod invariant_tests {
        use super::*;

        #[test]
        fn test_at_most_one_in_progress_task_through_mixed_operations() {
            let mut ledger = TaskLedger::new();
            let a = ledger.add("A").unwrap();
            let b = ledger.add("B").unwrap();
            let c = ledger.add("C").unwrap();

            ledger.start(a).unwrap();
            assert_eq!(in_progress_count(&ledger), 1);

            ledger.start(b).unwrap();
            assert_eq!(in_progress_count(&ledger), 1);

            ledger.toggle(c).unwrap();
            assert_eq!(in_progress_count(&ledger), 1);

            ledger.start(c).unwrap();
            assert_eq!(in_progress_count(&ledger), 1);
            assert_eq!(ledger.get(c).unwrap().status, TaskStatus::InProgress);

            ledger.delete(c).unwrap();
            assert_eq!(in_progress_count(&ledger), 0);
            assert!(ledger.active_id().is_none());

            ledger.start(b).unwrap();
            ledger.complete_active();
            assert_eq!(in_progress_count(&ledger), 0);
        }

        #[test]
        fn test_in_progress_task_always_matches_active_id() {
            let mut ledger = TaskLedger::new();
            let a = ledger.add("A").unwrap();
            let b = ledger.add("B").unwrap();

            ledger.start(a).unwrap();
            ledger.start(b).unwrap();

            let in_progress: Vec<u64> = ledger
                .views()
                .iter()
                .filter(|v| v.status == TaskStatus::InProgress)
                .map(|v| v.id)
                .collect();
            assert_eq!(in_progress, vec![ledger.active_id().unwrap()]);
        }

        #[test]
        fn test_views_preserve_creation_order() {
            let mut ledger = TaskLedger::new();
            ledger.add("First").unwrap();
            ledger.add("Second").unwrap();
            ledger.add("Third").unwrap();

            let texts: Vec<String> = ledger.views().into_iter().map(|v| v.text).collect();
            assert_eq!(texts, vec!["First", "Second", "Third"]);
        }
    }
}
