use std::fs;

use taskboard::lifecycle::HISTORY_CAPACITY;
use taskboard::model::{DAY_MS, HOUR_MS};
use taskboard::reminder::scan;
use taskboard::storage::seed_tasks;
use taskboard::{
    Action, Group, LifecycleError, Millis, Priority, Task, TaskEdit, TaskStore, open_board,
};
use tempfile::TempDir;

const NOW: Millis = 1_700_000_000_000;

fn store() -> (TempDir, TaskStore) {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    let store = TaskStore::open(dir.path());
    (dir, store)
}

fn task(id: &str, name: &str, deadline: Millis) -> Task {
    Task::builder()
        .name(name)
        .id(id)
        .deadline(deadline)
        .group(Group::School)
        .priority(Priority::Medium)
        .created_at(NOW - DAY_MS)
        .build()
}

#[test]
fn first_run_starts_from_seed_and_persists_it() {
    let (_dir, store) = store();

    let board = taskboard::complete_task(&store, "1", NOW).unwrap();
    assert_eq!(board.active.len(), seed_tasks(NOW).len() - 1);
    assert_eq!(board.history[0].id, "1");

    let reloaded = open_board(&store, NOW + 1);
    assert_eq!(reloaded.active, board.active);
    assert_eq!(reloaded.history, board.history);
}

#[test]
fn complete_then_restore_round_trips_through_files() {
    let (_dir, store) = store();
    store.try_save_active(&[task("a", "Essay", NOW + DAY_MS)]).unwrap();

    taskboard::complete_task(&store, "a", NOW).unwrap();
    let history = fs::read_to_string(store.config().history_file()).unwrap();
    assert_eq!(
        history,
        format!("a|Essay|{}|SCHOOL|MEDIUM|true|{}|{}", NOW + DAY_MS, NOW - DAY_MS, NOW)
    );
    assert_eq!(fs::read_to_string(store.config().active_file()).unwrap(), "");

    let board = taskboard::restore_task(&store, "a", NOW + 5).unwrap();
    assert!(board.history.is_empty());
    let active = fs::read_to_string(store.config().active_file()).unwrap();
    assert_eq!(
        active,
        format!("a|Essay|{}|SCHOOL|MEDIUM|false|{}", NOW + DAY_MS, NOW - DAY_MS)
    );
}

#[test]
fn delete_is_recoverable() {
    let (_dir, store) = store();
    store.try_save_active(&[task("a", "Essay", NOW)]).unwrap();

    taskboard::delete_task(&store, "a", NOW).unwrap();
    let board = taskboard::restore_task(&store, "a", NOW).unwrap();
    assert_eq!(board.active[0].id, "a");
    assert!(!board.active[0].is_done);
}

#[test]
fn unknown_id_is_reported_and_nothing_is_written() {
    let (_dir, store) = store();
    store.try_save_active(&[task("a", "Essay", NOW)]).unwrap();

    let err = taskboard::complete_task(&store, "missing", NOW).unwrap_err();
    assert_eq!(
        err.downcast_ref::<LifecycleError>(),
        Some(&LifecycleError::NotActive("missing".into()))
    );
    assert!(!store.config().history_file().exists());
}

#[test]
fn mutation_after_failed_load_is_refused() {
    let (_dir, store) = store();
    // A directory where the active file should be cannot be read.
    fs::create_dir(store.config().active_file()).unwrap();

    assert!(taskboard::complete_task(&store, "1", NOW).is_err());
    assert!(store.config().active_file().is_dir());
    assert!(!store.config().history_file().exists());

    // The read-only path still substitutes the seed.
    assert_eq!(open_board(&store, NOW).active, seed_tasks(NOW));
}

#[test]
fn invalid_utf8_survives_a_mutation() {
    let (_dir, store) = store();
    let mut content = b"a|Essay|1|SCHOOL|HIGH|false|1\nb|Caf".to_vec();
    content.push(0xE9);
    content.extend_from_slice(b"|2|WORK|LOW|false|2");
    fs::write(store.config().active_file(), content).unwrap();

    let board = taskboard::complete_task(&store, "b", NOW).unwrap();
    let ids: Vec<_> = board.active.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["a"]);
    assert_eq!(store.load_history(NOW)[0].id, "b");
}

#[test]
fn history_file_never_exceeds_capacity() {
    let (_dir, store) = store();
    let tasks: Vec<Task> = (0..HISTORY_CAPACITY + 5)
        .map(|i| task(&format!("t{i}"), "bulk", NOW + DAY_MS))
        .collect();
    store.try_save_active(&tasks).unwrap();

    for t in &tasks {
        taskboard::complete_task(&store, &t.id, NOW).unwrap();
    }

    let history = store.load_history(NOW);
    assert_eq!(history.len(), HISTORY_CAPACITY);
    assert_eq!(history[0].id, format!("t{}", HISTORY_CAPACITY + 4));
    assert!(history.iter().all(|t| t.id != "t0" && t.id != "t4"));
    assert!(store.load_active(NOW).is_empty());
}

#[test]
fn edit_persists_without_changing_identity() {
    let (_dir, store) = store();
    store.try_save_active(&[task("a", "Essay", NOW)]).unwrap();

    let changes = TaskEdit {
        name: Some("Final essay".into()),
        deadline: Some(NOW + 3 * DAY_MS),
        group: Some(Group::Work),
        priority: None,
    };
    taskboard::edit_task(&store, "a", changes, NOW).unwrap();

    let reloaded = store.load_active(NOW);
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded[0].id, "a");
    assert_eq!(reloaded[0].name, "Final essay");
    assert_eq!(reloaded[0].deadline, NOW + 3 * DAY_MS);
    assert_eq!(reloaded[0].group, Group::Work);
    assert_eq!(reloaded[0].priority, Priority::Medium);
    assert_eq!(reloaded[0].created_at, NOW - DAY_MS);
}

#[test]
fn names_that_would_break_the_format_are_rejected() {
    let (_dir, store) = store();
    store.try_save_active(&[]).unwrap();

    let bad = task("x", "a|b", NOW);
    assert!(taskboard::add_task(&store, bad, NOW).is_err());
    assert!(store.load_active(NOW).is_empty());

    let blank = task("y", "  ", NOW);
    assert!(taskboard::add_task(&store, blank, NOW).is_err());
}

#[test]
fn reminder_scan_over_persisted_snapshot() {
    let (_dir, store) = store();
    store
        .try_save_active(&[
            task("past", "Past", NOW - HOUR_MS),
            task("half", "Half hour", NOW + 30 * 60 * 1000),
            task("late", "Tonight", NOW + 23 * HOUR_MS),
            task("days", "Later", NOW + 2 * DAY_MS),
        ])
        .unwrap();

    let active = store.load_active(NOW);
    assert_eq!(scan(&active, NOW).map(|t| t.id.as_str()), Some("half"));

    let board = taskboard::apply(&store, Action::Complete("half".into()), NOW).unwrap();
    assert_eq!(scan(&board.active, NOW).map(|t| t.id.as_str()), Some("late"));
}
