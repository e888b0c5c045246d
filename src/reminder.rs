//! Periodic reminder for the most urgent task due soon.
//!
//! [`scan`] is a pure query. [`ReminderJob`] is the periodic driver: each tick
//! it loads a fresh active snapshot from the store (never the host's
//! in-memory collections), scans it and hands at most one [`Reminder`] to
//! the injected [`Notifier`]. Time comes from an injected [`Clock`] so the job
//! runs in tests without real waits.

use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::model::{DAY_MS, Millis, Task, format_deadline, now_millis};
use crate::storage::TaskStore;

/// Earliest-due task with `now < deadline <= now + 1 day`, if any.
pub fn scan(active: &[Task], now: Millis) -> Option<&Task> {
    scan_within(active, now, DAY_MS)
}

/// [`scan`] with a custom look-ahead window. Ties keep the first task seen.
pub fn scan_within(active: &[Task], now: Millis, window: Millis) -> Option<&Task> {
    let horizon = now.saturating_add(window);
    active
        .iter()
        .filter(|t| !t.is_done && t.deadline > now && t.deadline <= horizon)
        .fold(None, |best: Option<&Task>, t| match best {
            Some(b) if b.deadline <= t.deadline => Some(b),
            _ => Some(t),
        })
}

/// Notification payload handed to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub task_id: String,
    pub title: String,
    pub body: String,
}

impl Reminder {
    pub fn for_task(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            title: format!("Reminder: {}", task.name),
            body: format!("Deadline: {}", format_deadline(task.deadline)),
        }
    }
}

/// Source of time for the job.
pub trait Clock {
    fn now(&self) -> Millis;
    fn sleep(&self, period: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Millis {
        now_millis()
    }

    fn sleep(&self, period: Duration) {
        std::thread::sleep(period);
    }
}

/// Delivers reminders. Channel setup and permissions are the implementor's concern.
pub trait Notifier {
    fn notify(&self, reminder: &Reminder) -> Result<()>;
}

pub struct ReminderJob<C, N> {
    store: TaskStore,
    clock: C,
    notifier: N,
    period: Duration,
    window: Millis,
}

impl<C: Clock, N: Notifier> ReminderJob<C, N> {
    pub fn new(store: TaskStore, clock: C, notifier: N) -> Self {
        let Config {
            reminder_period,
            reminder_window,
            ..
        } = store.config().clone();
        Self {
            store,
            clock,
            notifier,
            period: reminder_period,
            window: reminder_window,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// One tick: fresh load, scan, dispatch at most one reminder.
    pub fn run_once(&self) -> Option<Reminder> {
        let now = self.clock.now();
        let active = self.store.load_active(now);
        let task = scan_within(&active, now, self.window)?;

        let reminder = Reminder::for_task(task);
        match self.notifier.notify(&reminder) {
            Ok(()) => info!(task_id = %reminder.task_id, "reminder dispatched"),
            Err(e) => warn!(task_id = %reminder.task_id, error = %e, "reminder dispatch failed"),
        }
        Some(reminder)
    }

    /// Tick every period. `None` runs until the process is torn down;
    /// `Some(0)` runs nothing.
    pub fn run(&self, max_ticks: Option<usize>) -> usize {
        if max_ticks == Some(0) {
            return 0;
        }
        let mut ticks = 0;
        loop {
            if self.run_once().is_none() {
                debug!("no task due within the reminder window");
            }
            ticks += 1;
            if max_ticks.is_some_and(|max| ticks >= max) {
                return ticks;
            }
            self.clock.sleep(self.period);
        }
    }
}
