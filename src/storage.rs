// --- Whole-snapshot persistence for the active and history collections ---

use std::{
    borrow::Cow,
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Write},
    path::Path,
};

use fs4::fs_std::FileExt;
use tempfile::NamedTempFile; // For atomic writes
use tracing::{debug, warn};

use crate::{
    codec::{RecordFormat, decode_all, encode_all},
    config::Config,
    error::StoreError,
    model::{DAY_MS, Group, Millis, Priority, Task},
};

/// Reads and writes the two record files under a data directory.
///
/// The `try_*` methods report failures. The plain `load_*`/`save_*` methods
/// never fail: a load that cannot read falls back to the seed set (active) or
/// an empty list (history), and a save that cannot write is logged and dropped.
#[derive(Debug, Clone)]
pub struct TaskStore {
    config: Config,
}

impl TaskStore {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn open(data_dir: impl AsRef<Path>) -> Self {
        Self::new(Config::with_data_dir(data_dir.as_ref()))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `Ok(None)` when the active file does not exist yet.
    pub fn try_load_active(&self, now: Millis) -> Result<Option<Vec<Task>>, StoreError> {
        self.read_records(&self.config.active_file(), RecordFormat::Active, now)
    }

    pub fn try_load_history(&self, now: Millis) -> Result<Option<Vec<Task>>, StoreError> {
        self.read_records(&self.config.history_file(), RecordFormat::History, now)
    }

    /// Active collection, or the sample seed set on first run or read failure.
    pub fn load_active(&self, now: Millis) -> Vec<Task> {
        match self.try_load_active(now) {
            Ok(Some(tasks)) => tasks,
            Ok(None) => {
                debug!(path = %self.config.active_file().display(), "no active file, seeding");
                seed_tasks(now)
            }
            Err(e) => {
                warn!(error = %e, "failed to load active tasks, seeding");
                seed_tasks(now)
            }
        }
    }

    pub fn load_history(&self, now: Millis) -> Vec<Task> {
        match self.try_load_history(now) {
            Ok(Some(tasks)) => tasks,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to load history");
                Vec::new()
            }
        }
    }

    pub fn try_save_active(&self, tasks: &[Task]) -> Result<(), StoreError> {
        self.write_records(&self.config.active_file(), tasks, RecordFormat::Active)
    }

    pub fn try_save_history(&self, tasks: &[Task]) -> Result<(), StoreError> {
        self.write_records(&self.config.history_file(), tasks, RecordFormat::History)
    }

    pub fn save_active(&self, tasks: &[Task]) {
        if let Err(e) = self.try_save_active(tasks) {
            warn!(error = %e, "failed to save active tasks");
        }
    }

    pub fn save_history(&self, tasks: &[Task]) {
        if let Err(e) = self.try_save_history(tasks) {
            warn!(error = %e, "failed to save history");
        }
    }

    fn read_records(
        &self,
        path: &Path,
        format: RecordFormat,
        now: Millis,
    ) -> Result<Option<Vec<Task>>, StoreError> {
        if !path.exists() {
            return Ok(None);
        }

        // Readers proceed unlocked rather than lose a readable file.
        let _lock = match self.lock(false) {
            Ok(file) => Some(file),
            Err(e) => {
                warn!(error = %e, "reading task records without a lock");
                None
            }
        };
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            // Removed between the existence check and the read.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };

        // Invalid UTF-8 is replaced per character; every line is still decoded.
        let content = String::from_utf8_lossy(&bytes);
        if matches!(content, Cow::Owned(_)) {
            warn!(path = %path.display(), "task records contain invalid UTF-8");
        }
        let tasks = decode_all(&content, format, now);
        debug!(path = %path.display(), count = tasks.len(), "loaded task records");
        Ok(Some(tasks))
    }

    fn write_records(
        &self,
        path: &Path,
        tasks: &[Task],
        format: RecordFormat,
    ) -> Result<(), StoreError> {
        let dir = self.config.data_dir();
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

        let _lock = self.lock(true)?;
        atomic_write(path, &encode_all(tasks, format))?;
        debug!(path = %path.display(), count = tasks.len(), "saved task records");
        Ok(())
    }

    // Advisory lock on the sidecar file, released when the handle drops.
    fn lock(&self, exclusive: bool) -> Result<File, StoreError> {
        let path = self.config.lock_file();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;

        let locked = if exclusive {
            FileExt::lock_exclusive(&file)
        } else {
            FileExt::lock_shared(&file)
        };
        locked.map_err(|source| StoreError::Lock { path, source })?;
        Ok(file)
    }
}

/// Replace `path` with `content` only once the whole payload is on disk.
fn atomic_write(path: &Path, content: &str) -> Result<(), StoreError> {
    // Temp file in the *same* directory so the rename stays on one filesystem.
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;

    tmp.write_all(content.as_bytes())
        .and_then(|_| tmp.flush())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| StoreError::io(tmp.path(), e))?;

    tmp.persist(path).map_err(|source| StoreError::Persist {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Sample tasks shown on first run, deadlines relative to `now`.
pub fn seed_tasks(now: Millis) -> Vec<Task> {
    let seed = |id: &str, name: &str, days: Millis, group: Group, priority: Priority| {
        Task::builder()
            .name(name)
            .id(id)
            .deadline(now + days * DAY_MS)
            .group(group)
            .priority(priority)
            .created_at(now)
            .build()
    };

    vec![
        seed("1", "Complete math homework", 1, Group::School, Priority::High),
        seed("2", "Team meeting preparation", 2, Group::Meeting, Priority::Low),
        seed("3", "Buy groceries", 3, Group::Housework, Priority::Medium),
        seed("4", "Project deadline", 5, Group::Work, Priority::Low),
        seed("5", "Clean the house", 7, Group::Housework, Priority::Low),
        seed("6", "Study for exam", 4, Group::School, Priority::High),
        seed("7", "Client presentation", 6, Group::Work, Priority::Low),
        seed("8", "Doctor appointment", 2, Group::Other, Priority::High),
        seed("9", "Pay bills", 1, Group::Housework, Priority::High),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const NOW: Millis = 1_700_000_000_000;

    fn task(id: &str) -> Task {
        Task::builder()
            .name(format!("task {id}"))
            .id(id)
            .deadline(NOW + DAY_MS)
            .created_at(NOW)
            .build()
    }

    #[test]
    fn missing_active_file_yields_seed() {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::open(dir.path());

        assert!(store.try_load_active(NOW).unwrap().is_none());
        let tasks = store.load_active(NOW);
        assert_eq!(tasks, seed_tasks(NOW));
        assert_eq!(tasks.len(), 9);
    }

    #[test]
    fn missing_history_file_yields_empty() {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::open(dir.path());
        assert!(store.load_history(NOW).is_empty());
    }

    #[test]
    fn empty_active_file_is_not_seeded() {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::open(dir.path());
        store.try_save_active(&[]).unwrap();
        assert!(store.load_active(NOW).is_empty());
    }

    #[test]
    fn save_overwrites_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::open(dir.path());

        store.try_save_active(&[task("a"), task("b")]).unwrap();
        store.try_save_active(&[task("c")]).unwrap();

        let ids: Vec<_> = store
            .load_active(NOW)
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, ["c"]);
    }

    #[test]
    fn history_keeps_completion_time() {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::open(dir.path());
        let mut done = task("h");
        done.mark_done(NOW + 5);

        store.try_save_history(std::slice::from_ref(&done)).unwrap();
        assert_eq!(store.load_history(0), vec![done]);
    }

    #[test]
    fn malformed_lines_are_dropped_on_load() {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::open(dir.path());
        fs::write(
            store.config().active_file(),
            "x|ok|1|WORK|LOW|false|1\nbroken line\ny|bad|1|WORK|NONE|false|1\n",
        )
        .unwrap();

        let tasks = store.load_active(NOW);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "x");
    }

    #[test]
    fn invalid_utf8_line_does_not_discard_file() {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::open(dir.path());
        let mut content = b"a|Essay|1|SCHOOL|HIGH|false|1\nb|Caf".to_vec();
        content.push(0xE9);
        content.extend_from_slice(b"|2|WORK|LOW|false|2\n");
        fs::write(store.config().active_file(), content).unwrap();

        let tasks = store.try_load_active(NOW).unwrap().unwrap();
        let ids: Vec<_> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(tasks[0].name, "Essay");
        assert!(tasks[1].name.starts_with("Caf"));
        assert_eq!(store.load_active(NOW), tasks);
    }

    #[test]
    fn broken_lock_file_does_not_block_reads() {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::open(dir.path());
        fs::write(store.config().active_file(), "a|Essay|1|SCHOOL|HIGH|false|1").unwrap();
        fs::create_dir(store.config().lock_file()).unwrap();

        let ids: Vec<_> = store
            .load_active(NOW)
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, ["a"]);
    }

    #[test]
    fn save_creates_missing_data_dir() {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::open(dir.path().join("nested").join("board"));
        store.try_save_history(&[]).unwrap();
        assert!(store.config().history_file().exists());
    }

    #[test]
    fn unreadable_active_file_falls_back_to_seed() {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::open(dir.path());
        // A directory where the file should be makes the read fail.
        fs::create_dir(store.config().active_file()).unwrap();

        assert!(store.try_load_active(NOW).is_err());
        assert_eq!(store.load_active(NOW), seed_tasks(NOW));
    }

    #[test]
    fn failed_save_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::open(dir.path());
        fs::create_dir(store.config().history_file()).unwrap();
        fs::write(store.config().history_file().join("keep"), "x").unwrap();

        assert!(store.try_save_history(&[task("a")]).is_err());
        store.save_history(&[task("a")]);
    }
}
