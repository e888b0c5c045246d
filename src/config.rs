//! Runtime configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::{DAY_MS, Millis};

pub const ACTIVE_FILE: &str = "todos.txt";
pub const HISTORY_FILE: &str = "history_todos.txt";
pub const LOCK_FILE: &str = "todos.lock";

pub const DEFAULT_REMINDER_PERIOD: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the record files.
    pub data_dir: PathBuf,
    /// How often the reminder job scans.
    pub reminder_period: Duration,
    /// How far ahead of `now` a deadline may be and still trigger a reminder.
    pub reminder_window: Millis,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            reminder_period: DEFAULT_REMINDER_PERIOD,
            reminder_window: DAY_MS,
        }
    }
}

impl Config {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn active_file(&self) -> PathBuf {
        self.data_dir.join(ACTIVE_FILE)
    }

    pub fn history_file(&self) -> PathBuf {
        self.data_dir.join(HISTORY_FILE)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.data_dir.join(LOCK_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.reminder_period, Duration::from_secs(900));
        assert_eq!(cfg.reminder_window, DAY_MS);
        assert_eq!(cfg.active_file(), PathBuf::from("./todos.txt"));
    }

    #[test]
    fn files_live_under_data_dir() {
        let cfg = Config::with_data_dir("/tmp/board");
        assert_eq!(cfg.history_file(), Path::new("/tmp/board/history_todos.txt"));
        assert_eq!(cfg.lock_file(), Path::new("/tmp/board/todos.lock"));
    }
}
