use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;
use uuid::Uuid;

use crate::error::NameError;

// Epoch milliseconds, the unit of every timestamp on disk.
pub type Millis = i64;

pub const HOUR_MS: Millis = 60 * 60 * 1000;
pub const DAY_MS: Millis = 24 * HOUR_MS;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> Millis {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as Millis
}

/// Render a timestamp as `dd/MM/yyyy - HH:mm`, local offset when known.
pub fn format_deadline(millis: Millis) -> String {
    let format = format_description!("[day]/[month]/[year] - [hour]:[minute]");
    let Ok(utc) = OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000) else {
        return millis.to_string();
    };
    let at = match time::UtcOffset::current_local_offset() {
        Ok(offset) => utc.to_offset(offset),
        Err(_) => utc,
    };
    at.format(&format).unwrap_or_else(|_| millis.to_string())
}

// --- Group ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Group {
    School,
    Work,
    Housework,
    Meeting,
    Other,
}

impl Group {
    pub const ALL: [Group; 5] = [
        Group::School,
        Group::Work,
        Group::Housework,
        Group::Meeting,
        Group::Other,
    ];

    /// Token used in the record files.
    pub fn token(self) -> &'static str {
        match self {
            Group::School => "SCHOOL",
            Group::Work => "WORK",
            Group::Housework => "HOUSEWORK",
            Group::Meeting => "MEETING",
            Group::Other => "OTHER",
        }
    }

    /// Exact, case-sensitive inverse of [`Group::token`].
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.token() == token)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Group::School => "School",
            Group::Work => "Work",
            Group::Housework => "Housework",
            Group::Meeting => "Meeting",
            Group::Other => "Other",
        }
    }

    /// ARGB display colour.
    pub fn color(self) -> u32 {
        match self {
            Group::School => 0xFF50C878,
            Group::Work => 0xFF00416A,
            Group::Housework => 0xFF00BCD4,
            Group::Meeting => 0xFF9C27B0,
            Group::Other => 0xFF696969,
        }
    }
}

// --- Priority ---
// Variant order is severity order: Low < Medium < High.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn token(self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.token() == token)
    }

    pub fn level(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    pub fn color(self) -> u32 {
        match self {
            Priority::Low => 0xFF8BC34A,
            Priority::Medium => 0xFFFFC107,
            Priority::High => 0xFFFF5722,
        }
    }
}

// --- Task Object ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /** Opaque unique key, immutable once set */
    pub id: String,

    /** Display name */
    pub name: String,

    pub deadline: Millis,

    pub group: Group,

    pub priority: Priority,

    /** True exactly while the task sits in history */
    pub is_done: bool,

    /** Creation time (immutable once set) */
    pub created_at: Millis,

    /** When the task moved to history; cleared on restore */
    pub completed_at: Option<Millis>,
}

/// Field changes applied by an edit. `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    pub name: Option<String>,
    pub deadline: Option<Millis>,
    pub group: Option<Group>,
    pub priority: Option<Priority>,
}

impl TaskEdit {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.deadline.is_none()
            && self.group.is_none()
            && self.priority.is_none()
    }
}

// --- Zero size markers for the "typed-state" builder ---
pub struct MissingName;
pub struct HasName;

// --- Generic Builder struct ---
pub struct TaskBuilder<NameState> {
    name: Option<String>,
    deadline: Millis,
    group: Group,
    priority: Priority,
    id: Option<String>,
    created_at: Option<Millis>,

    _state: std::marker::PhantomData<NameState>,
}

impl Task {
    /// Creates a new builder chain (*without* a name).
    pub fn builder() -> TaskBuilder<MissingName> {
        TaskBuilder {
            name: None,
            deadline: 0,
            group: Group::Other,
            priority: Priority::Low,
            id: None,
            created_at: None,
            _state: std::marker::PhantomData,
        }
    }

    /// Move into the done state. Only the lifecycle reducer should call this.
    pub(crate) fn mark_done(&mut self, now: Millis) {
        self.is_done = true;
        self.completed_at = Some(now);
    }

    pub(crate) fn mark_restored(&mut self) {
        self.is_done = false;
        self.completed_at = None;
    }

    /// Apply an edit in place. Lifecycle fields, `id` and `created_at` are untouched.
    pub fn apply_edit(&mut self, edit: &TaskEdit) {
        if let Some(name) = &edit.name {
            self.name = name.clone();
        }
        if let Some(deadline) = edit.deadline {
            self.deadline = deadline;
        }
        if let Some(group) = edit.group {
            self.group = group;
        }
        if let Some(priority) = edit.priority {
            self.priority = priority;
        }
    }

    /// Boundary check for names typed by a user. The core accepts any name;
    /// the record format cannot carry `|` or line breaks.
    pub fn validate_name(name: &str) -> Result<(), NameError> {
        if name.trim().is_empty() {
            return Err(NameError::Blank);
        }
        if name.contains(['|', '\n', '\r']) {
            return Err(NameError::ReservedCharacter);
        }
        Ok(())
    }
}

// --- Stage-1: methods available *before* a name exists ---
impl TaskBuilder<MissingName> {
    pub fn name<S: Into<String>>(self, n: S) -> TaskBuilder<HasName> {
        TaskBuilder {
            name: Some(n.into()),
            deadline: self.deadline,
            group: self.group,
            priority: self.priority,
            id: self.id,
            created_at: self.created_at,
            _state: std::marker::PhantomData,
        }
    }
}

// --- Stage-2: setters available in *either* state ---
impl<NameState> TaskBuilder<NameState> {
    pub fn deadline(mut self, d: Millis) -> Self {
        self.deadline = d;
        self
    }

    pub fn group(mut self, g: Group) -> Self {
        self.group = g;
        self
    }

    pub fn priority(mut self, p: Priority) -> Self {
        self.priority = p;
        self
    }

    /// Fixed id instead of a fresh UUID (seed data, tests).
    pub fn id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Fixed creation time instead of the clock.
    pub fn created_at(mut self, at: Millis) -> Self {
        self.created_at = Some(at);
        self
    }
}

// --- Final-Stage: .build() only once a name is supplied ---
impl TaskBuilder<HasName> {
    /// Consume builder and return a fresh active [`Task`].
    pub fn build(self) -> Task {
        Task {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: self.name.unwrap_or_default(),
            deadline: self.deadline,
            group: self.group,
            priority: self.priority,
            is_done: false,
            created_at: self.created_at.unwrap_or_else(now_millis),
            completed_at: None,
        }
    }
}
