//! Pure classification helpers used for display grouping and search.
//!
//! Every function takes `now` explicitly so results do not depend on the clock.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{DAY_MS, Group, Millis, Task};

/// Span covered by [`Bucket::Upcoming`], inclusive at both ends.
pub const UPCOMING_SPAN: Millis = 20 * DAY_MS;

/// Calendar bucket of a deadline relative to `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Bucket {
    Overdue,
    Upcoming,
    Future,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Overdue, Bucket::Upcoming, Bucket::Future];

    pub fn title(self) -> &'static str {
        match self {
            Bucket::Overdue => "Overdue Tasks",
            Bucket::Upcoming => "Next 20 Days",
            Bucket::Future => "20+ Days Away",
        }
    }

    pub fn color(self) -> u32 {
        match self {
            Bucket::Overdue => 0xFFD32F2F,
            Bucket::Upcoming => 0xFF1976D2,
            Bucket::Future => 0xFF388E3C,
        }
    }
}

pub fn bucket_of(task: &Task, now: Millis) -> Bucket {
    bucket_of_deadline(task.deadline, now)
}

pub fn bucket_of_deadline(deadline: Millis, now: Millis) -> Bucket {
    if deadline < now {
        Bucket::Overdue
    } else if deadline <= now.saturating_add(UPCOMING_SPAN) {
        Bucket::Upcoming
    } else {
        Bucket::Future
    }
}

/// Colour-coding severity of a deadline, finer than [`Bucket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UrgencyTier {
    PastDue,
    DueToday,
    Tomorrow,
    ThisWeekNear,
    ThisWeekFar,
    Distant,
}

impl UrgencyTier {
    pub fn color(self) -> u32 {
        match self {
            UrgencyTier::PastDue => 0xFFD32F2F,
            UrgencyTier::DueToday => 0xFFE91E63,
            UrgencyTier::Tomorrow => 0xFFFF5722,
            UrgencyTier::ThisWeekNear => 0xFFFF9800,
            UrgencyTier::ThisWeekFar => 0xFFFFD700,
            UrgencyTier::Distant => 0xFF4CAF50,
        }
    }
}

/// Whole days until `deadline`, truncated toward zero.
pub fn days_until(deadline: Millis, now: Millis) -> i64 {
    deadline.saturating_sub(now) / DAY_MS
}

// First match wins; the arms are ordered.
pub fn urgency_tier(deadline: Millis, now: Millis) -> UrgencyTier {
    match days_until(deadline, now) {
        d if d < 0 => UrgencyTier::PastDue,
        0 => UrgencyTier::DueToday,
        1 => UrgencyTier::Tomorrow,
        d if d <= 3 => UrgencyTier::ThisWeekNear,
        d if d <= 7 => UrgencyTier::ThisWeekFar,
        _ => UrgencyTier::Distant,
    }
}

pub fn urgency_color(deadline: Millis, now: Millis) -> u32 {
    urgency_tier(deadline, now).color()
}

/// Case-insensitive substring match on the name. An empty query matches.
pub fn matches_query(task: &Task, query: &str) -> bool {
    query.is_empty() || task.name.to_lowercase().contains(&query.to_lowercase())
}

/// Partition by group in declaration order, omitting empty groups.
pub fn group_buckets<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
) -> BTreeMap<Group, Vec<&'a Task>> {
    let mut groups: BTreeMap<Group, Vec<&Task>> = BTreeMap::new();
    for task in tasks {
        groups.entry(task.group).or_default().push(task);
    }
    groups
}

/// Partition by calendar bucket. All three buckets are present, possibly empty.
pub fn calendar<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    now: Millis,
) -> BTreeMap<Bucket, Vec<&'a Task>> {
    let mut buckets: BTreeMap<Bucket, Vec<&Task>> =
        Bucket::ALL.into_iter().map(|b| (b, Vec::new())).collect();
    for task in tasks {
        buckets.entry(bucket_of(task, now)).or_default().push(task);
    }
    buckets
}

/// List view: matching, not done, earliest deadline first.
pub fn visible_active<'a>(tasks: &'a [Task], query: &str) -> Vec<&'a Task> {
    let mut visible: Vec<&Task> = tasks
        .iter()
        .filter(|t| !t.is_done && matches_query(t, query))
        .collect();
    visible.sort_by_key(|t| t.deadline);
    visible
}

/// History view: matching, most recently completed first.
pub fn visible_history<'a>(tasks: &'a [Task], query: &str) -> Vec<&'a Task> {
    let mut visible: Vec<&Task> = tasks.iter().filter(|t| matches_query(t, query)).collect();
    visible.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    visible
}
