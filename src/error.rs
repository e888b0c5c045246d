//! Error types for taskboard.
//!
//! Parse and I/O failures are recovered close to where they happen (a bad
//! line is skipped, a missing file falls back to a default). These types exist
//! so the recovering layer can log a reason and so callers that want the
//! stricter behaviour can see it.

use std::path::PathBuf;
use thiserror::Error;

/// Why a single record line was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: &'static str, found: usize },

    #[error("unknown group token: {0}")]
    UnknownGroup(String),

    #[error("unknown priority token: {0}")]
    UnknownPriority(String),
}

/// Failure at the task store boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("lock acquisition failed: {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A lifecycle transition whose precondition does not hold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("task {0} is not active")]
    NotActive(String),

    #[error("task {0} is not in history")]
    NotInHistory(String),

    #[error("task {0} already exists")]
    DuplicateId(String),
}

/// Rejection of a user-supplied name at the host boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("task name must not be blank")]
    Blank,

    #[error("task name must not contain '|' or line breaks")]
    ReservedCharacter,
}
