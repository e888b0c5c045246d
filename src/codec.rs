//! Line codec for task records.
//!
//! One task per line, fields joined with `|`:
//!
//! ```text
//! id|name|deadline|group|priority|isDone|createdAt              (active file)
//! id|name|deadline|group|priority|isDone|createdAt|completedAt  (history file)
//! ```
//!
//! Timestamps are decimal epoch milliseconds, `group`/`priority` are the enum
//! tokens and `isDone` is `true`/`false`. Decoding is tolerant: a bad number
//! is replaced, a bad line is rejected on its own and never fails a file.

use tracing::warn;

use crate::error::DecodeError;
use crate::model::{Group, Millis, Priority, Task};

pub const DELIMITER: char = '|';

const BASE_FIELDS: usize = 7;

/// Which of the two record files a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// Exactly seven fields, no completion time.
    Active,
    /// Seven fields plus an optional, possibly empty, completion time.
    History,
}

/// Encode one task as a record line (no trailing newline).
pub fn encode(task: &Task, format: RecordFormat) -> String {
    let mut line = format!(
        "{}|{}|{}|{}|{}|{}|{}",
        task.id,
        task.name,
        task.deadline,
        task.group.token(),
        task.priority.token(),
        task.is_done,
        task.created_at
    );
    if format == RecordFormat::History {
        line.push(DELIMITER);
        if let Some(at) = task.completed_at {
            line.push_str(&at.to_string());
        }
    }
    line
}

/// Decode one record line. `now` replaces unparseable deadline/createdAt values.
pub fn decode(line: &str, format: RecordFormat, now: Millis) -> Result<Task, DecodeError> {
    let parts: Vec<&str> = line.split(DELIMITER).collect();
    match format {
        RecordFormat::Active if parts.len() != BASE_FIELDS => {
            return Err(DecodeError::FieldCount {
                expected: "exactly 7",
                found: parts.len(),
            });
        }
        RecordFormat::History if parts.len() < BASE_FIELDS => {
            return Err(DecodeError::FieldCount {
                expected: "at least 7",
                found: parts.len(),
            });
        }
        _ => {}
    }

    let group =
        Group::from_token(parts[3]).ok_or_else(|| DecodeError::UnknownGroup(parts[3].into()))?;
    let priority = Priority::from_token(parts[4])
        .ok_or_else(|| DecodeError::UnknownPriority(parts[4].into()))?;

    let completed_at = match format {
        RecordFormat::Active => None,
        RecordFormat::History => parts
            .get(7)
            .map(|raw| raw.trim())
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| raw.parse::<Millis>().ok()),
    };

    Ok(Task {
        id: parts[0].to_string(),
        name: parts[1].to_string(),
        deadline: parts[2].parse().unwrap_or(now),
        group,
        priority,
        is_done: parts[5].eq_ignore_ascii_case("true"),
        created_at: parts[6].parse().unwrap_or(now),
        completed_at,
    })
}

/// Encode a whole collection, one line per task.
pub fn encode_all(tasks: &[Task], format: RecordFormat) -> String {
    tasks
        .iter()
        .map(|t| encode(t, format))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decode a whole file, skipping blank and rejected lines.
pub fn decode_all(content: &str, format: RecordFormat, now: Millis) -> Vec<Task> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(idx, line)| match decode(line, format, now) {
            Ok(task) => Some(task),
            Err(e) => {
                warn!(line = idx + 1, error = %e, "skipping malformed task record");
                None
            }
        })
        .collect()
}
