//! Task lifecycle as a reducer over the active and history collections.
//!
//! A task lives in exactly one of the two collections. Complete and Delete
//! both move it to the head of history (deletes are soft and can be
//! restored); Restore moves it back to the end of the active list. History is
//! capped at [`HISTORY_CAPACITY`] entries, the oldest falling off the tail.

use tracing::debug;

use crate::classify::{Bucket, bucket_of};
use crate::error::LifecycleError;
use crate::model::{Millis, Task, TaskEdit};

pub const HISTORY_CAPACITY: usize = 100;

/// Working subset the user drilled into from the calendar view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayView {
    pub bucket: Bucket,
    pub title: String,
    pub tasks: Vec<Task>,
}

/// Everything the host holds in memory between actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    pub active: Vec<Task>,
    /// Newest first.
    pub history: Vec<Task>,
    pub selected_day: Option<DayView>,
}

impl Board {
    pub fn new(active: Vec<Task>, history: Vec<Task>) -> Self {
        Self {
            active,
            history,
            selected_day: None,
        }
    }

    pub fn find_active(&self, id: &str) -> Option<&Task> {
        self.active.iter().find(|t| t.id == id)
    }

    pub fn find_history(&self, id: &str) -> Option<&Task> {
        self.history.iter().find(|t| t.id == id)
    }

    fn contains(&self, id: &str) -> bool {
        self.find_active(id).is_some() || self.find_history(id).is_some()
    }

    fn take_active(&mut self, id: &str) -> Result<Task, LifecycleError> {
        let pos = self
            .active
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| LifecycleError::NotActive(id.to_string()))?;
        Ok(self.active.remove(pos))
    }

    fn push_history(&mut self, task: Task) {
        self.history.insert(0, task);
        if self.history.len() > HISTORY_CAPACITY {
            for evicted in self.history.drain(HISTORY_CAPACITY..) {
                debug!(task_id = %evicted.id, "history full, evicting oldest entry");
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Append a freshly created task to the active list.
    Add(Task),
    Complete(String),
    /// Soft delete: same effect as [`Action::Complete`].
    Delete(String),
    Restore(String),
    Edit { id: String, changes: TaskEdit },
    /// Open the working view for one calendar bucket.
    SelectBucket(Bucket),
    ClearSelection,
}

/// Apply one action, returning the next board. `board` is left untouched;
/// on error no partial change is visible.
pub fn reduce(board: &Board, action: Action, now: Millis) -> Result<Board, LifecycleError> {
    let mut next = board.clone();
    match action {
        Action::Add(task) => {
            if next.contains(&task.id) {
                return Err(LifecycleError::DuplicateId(task.id));
            }
            debug!(task_id = %task.id, "task added");
            next.active.push(task);
        }
        Action::Complete(id) | Action::Delete(id) => {
            let mut task = next.take_active(&id)?;
            task.mark_done(now);
            if let Some(view) = next.selected_day.as_mut() {
                view.tasks.retain(|t| t.id != id);
            }
            debug!(task_id = %id, "task moved to history");
            next.push_history(task);
        }
        Action::Restore(id) => {
            let pos = next
                .history
                .iter()
                .position(|t| t.id == id)
                .ok_or_else(|| LifecycleError::NotInHistory(id.clone()))?;
            let mut task = next.history.remove(pos);
            task.mark_restored();
            debug!(task_id = %id, "task restored");
            next.active.push(task);
        }
        Action::Edit { id, changes } => {
            let mut found = false;
            if let Some(task) = next.active.iter_mut().find(|t| t.id == id) {
                task.apply_edit(&changes);
                found = true;
            }
            if let Some(view) = next.selected_day.as_mut() {
                if let Some(task) = view.tasks.iter_mut().find(|t| t.id == id) {
                    task.apply_edit(&changes);
                    found = true;
                }
            }
            if !found {
                return Err(LifecycleError::NotActive(id));
            }
        }
        Action::SelectBucket(bucket) => {
            let tasks = next
                .active
                .iter()
                .filter(|t| !t.is_done && bucket_of(t, now) == bucket)
                .cloned()
                .collect();
            next.selected_day = Some(DayView {
                bucket,
                title: bucket.title().to_string(),
                tasks,
            });
        }
        Action::ClearSelection => next.selected_day = None,
    }
    Ok(next)
}
