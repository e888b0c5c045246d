//! taskboard - task lifecycle and flat-file persistence for a to-do list.
//!
//! - `model`: the task entity, groups and priorities
//! - `codec`: `|`-delimited record lines
//! - `storage`: whole-file snapshots of the active and history collections
//! - `classify`: calendar buckets, urgency tiers, search and grouping
//! - `lifecycle`: complete/delete/restore/edit as a reducer
//! - `reminder`: the periodic "due soon" scan

pub mod classify;
pub mod codec;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod reminder;
pub mod storage;

use anyhow::{Context, Result};

pub use config::Config;
pub use error::{DecodeError, LifecycleError, NameError, StoreError};
pub use lifecycle::{Action, Board, reduce};
pub use model::{Group, Millis, Priority, Task, TaskEdit};
pub use storage::TaskStore;

/// Load both collections into a fresh board.
pub fn open_board(store: &TaskStore, now: Millis) -> Board {
    Board::new(store.load_active(now), store.load_history(now))
}

/// Persist both collections of `board` as whole snapshots.
pub fn save_board(store: &TaskStore, board: &Board) -> Result<()> {
    store
        .try_save_active(&board.active)
        .context("Writing active tasks to disk")?;
    store
        .try_save_history(&board.history)
        .context("Writing history to disk")
}

/// Like [`open_board`], but a file that exists and cannot be read is an error
/// instead of falling back. Used before any write so a failed load never
/// replaces real data with defaults.
pub fn try_open_board(store: &TaskStore, now: Millis) -> Result<Board> {
    let active = store
        .try_load_active(now)
        .context("Reading active tasks")?
        .unwrap_or_else(|| storage::seed_tasks(now));
    let history = store
        .try_load_history(now)
        .context("Reading history")?
        .unwrap_or_default();
    Ok(Board::new(active, history))
}

/// Load, apply one action, save. Returns the board that was written.
pub fn apply(store: &TaskStore, action: Action, now: Millis) -> Result<Board> {
    let board = try_open_board(store, now)?;
    let next = reduce(&board, action, now)?;
    save_board(store, &next)?;
    Ok(next)
}

/// Create and persist a new active task.
pub fn add_task(store: &TaskStore, task: Task, now: Millis) -> Result<Board> {
    Task::validate_name(&task.name)?;
    apply(store, Action::Add(task), now)
}

pub fn complete_task(store: &TaskStore, id: &str, now: Millis) -> Result<Board> {
    apply(store, Action::Complete(id.to_string()), now)
        .with_context(|| format!("completing task {id}"))
}

/// Soft delete: the task stays restorable from history.
pub fn delete_task(store: &TaskStore, id: &str, now: Millis) -> Result<Board> {
    apply(store, Action::Delete(id.to_string()), now).with_context(|| format!("deleting task {id}"))
}

pub fn restore_task(store: &TaskStore, id: &str, now: Millis) -> Result<Board> {
    apply(store, Action::Restore(id.to_string()), now)
        .with_context(|| format!("restoring task {id}"))
}

pub fn edit_task(store: &TaskStore, id: &str, changes: TaskEdit, now: Millis) -> Result<Board> {
    if let Some(name) = &changes.name {
        Task::validate_name(name)?;
    }
    apply(
        store,
        Action::Edit {
            id: id.to_string(),
            changes,
        },
        now,
    )
    .with_context(|| format!("editing task {id}"))
}
