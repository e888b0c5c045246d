use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueHint};
use time::macros::format_description;
use time::{PrimitiveDateTime, UtcOffset};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use taskboard::classify::{
    Bucket, calendar, group_buckets, urgency_tier, visible_active, visible_history,
};
use taskboard::model::{HOUR_MS, format_deadline, now_millis};
use taskboard::reminder::{Notifier, Reminder, ReminderJob, SystemClock};
use taskboard::{Config, Group, Millis, Priority, Task, TaskEdit, TaskStore};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Main verb. If omitted, `list` is default action.
    #[command(subcommand)]
    verb: Option<Verb>,

    /// Directory holding todos.txt and history_todos.txt.
    #[arg(short, long, value_hint = ValueHint::DirPath, env = "TASKBOARD_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Seconds between reminder scans.
    #[arg(long, env = "TASKBOARD_REMINDER_PERIOD_SECS", default_value_t = 15 * 60)]
    reminder_period_secs: u64,
}

#[derive(Subcommand, Debug)]
enum Verb {
    /// Active tasks, earliest deadline first.
    List {
        #[arg(short, long, default_value = "")]
        query: String,

        #[arg(long)]
        json: bool,
    },
    /// Active tasks grouped by category.
    Groups {
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// Active tasks by calendar bucket.
    Calendar {
        #[arg(short, long, default_value = "")]
        query: String,

        /// Only show one bucket: overdue, upcoming or future.
        #[arg(long)]
        bucket: Option<String>,
    },
    /// Completed and deleted tasks, newest first.
    History {
        #[arg(short, long, default_value = "")]
        query: String,
    },
    Add {
        name: String,

        /// Deadline as "YYYY-MM-DD HH:MM" local time.
        #[arg(long, conflicts_with = "in_hours")]
        due: Option<String>,

        /// Deadline relative to now.
        #[arg(long)]
        in_hours: Option<i64>,

        #[arg(short, long, default_value = "OTHER")]
        group: String,

        #[arg(short, long, default_value = "LOW")]
        priority: String,
    },
    Edit {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, conflicts_with = "in_hours")]
        due: Option<String>,

        #[arg(long)]
        in_hours: Option<i64>,

        #[arg(short, long)]
        group: Option<String>,

        #[arg(short, long)]
        priority: Option<String>,
    },
    Complete {
        id: String,
    },
    Delete {
        id: String,
    },
    Restore {
        id: String,
    },
    /// Scan for the most urgent task due within a day.
    Remind {
        /// Keep scanning every period.
        #[arg(long)]
        watch: bool,

        /// Stop after this many scans when watching.
        #[arg(long)]
        ticks: Option<usize>,
    },
}

struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, reminder: &Reminder) -> Result<()> {
        println!("{}\n  {}", reminder.title, reminder.body);
        Ok(())
    }
}

fn main() -> Result<()> {
    // Tracing is opt-in via RUST_LOG; an invalid filter means no output.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| EnvFilter::try_new(raw.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new("off"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();
    let config = Config {
        data_dir: cli.data_dir,
        reminder_period: Duration::from_secs(cli.reminder_period_secs),
        ..Config::default()
    };
    let store = TaskStore::new(config);
    let now = now_millis();

    match cli.verb.unwrap_or(Verb::List {
        query: String::new(),
        json: false,
    }) {
        Verb::List { query, json } => {
            let board = taskboard::open_board(&store, now);
            let tasks = visible_active(&board.active, &query);
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else {
                print_table(&tasks, now);
            }
        }
        Verb::Groups { query } => {
            let board = taskboard::open_board(&store, now);
            let tasks = visible_active(&board.active, &query);
            for (group, members) in group_buckets(tasks) {
                println!("== {} ({})", group.display_name(), members.len());
                print_table(&members, now);
            }
        }
        Verb::Calendar { query, bucket } => {
            let only = bucket.as_deref().map(parse_bucket).transpose()?;
            let board = taskboard::open_board(&store, now);
            let tasks = visible_active(&board.active, &query);
            for (bucket, members) in calendar(tasks, now) {
                if only.is_some_and(|b| b != bucket) {
                    continue;
                }
                println!("== {} ({})", bucket.title(), members.len());
                print_table(&members, now);
            }
        }
        Verb::History { query } => {
            let board = taskboard::open_board(&store, now);
            for t in visible_history(&board.history, &query) {
                let done = t.completed_at.map(format_deadline).unwrap_or_default();
                println!("{:<36} | {:<18} | {}", t.id, done, t.name);
            }
        }
        Verb::Add {
            name,
            due,
            in_hours,
            group,
            priority,
        } => {
            let deadline = resolve_deadline(due.as_deref(), in_hours, now)?
                .context("either --due or --in-hours is required")?;
            let task = Task::builder()
                .name(name)
                .deadline(deadline)
                .group(parse_group(&group)?)
                .priority(parse_priority(&priority)?)
                .created_at(now)
                .build();
            let id = task.id.clone();
            taskboard::add_task(&store, task, now)?;
            println!("{id}");
        }
        Verb::Edit {
            id,
            name,
            due,
            in_hours,
            group,
            priority,
        } => {
            let changes = TaskEdit {
                name,
                deadline: resolve_deadline(due.as_deref(), in_hours, now)?,
                group: group.as_deref().map(parse_group).transpose()?,
                priority: priority.as_deref().map(parse_priority).transpose()?,
            };
            if changes.is_empty() {
                bail!("nothing to change");
            }
            taskboard::edit_task(&store, &id, changes, now)?;
        }
        Verb::Complete { id } => {
            taskboard::complete_task(&store, &id, now)?;
        }
        Verb::Delete { id } => {
            taskboard::delete_task(&store, &id, now)?;
        }
        Verb::Restore { id } => {
            taskboard::restore_task(&store, &id, now)?;
        }
        Verb::Remind { watch, ticks } => {
            let job = ReminderJob::new(store, SystemClock, ConsoleNotifier);
            if watch {
                job.run(ticks);
            } else if job.run_once().is_none() {
                println!("Nothing due in the next 24 hours.");
            }
        }
    }
    Ok(())
}

fn print_table(tasks: &[&Task], now: Millis) {
    for t in tasks {
        println!(
            "{:<36} | {:<6} | {:<9} | {:<12} | {:<18} | {}",
            t.id,
            t.priority.display_name(),
            t.group.display_name(),
            format!("{:?}", urgency_tier(t.deadline, now)),
            format_deadline(t.deadline),
            t.name
        );
    }
}

fn resolve_deadline(due: Option<&str>, in_hours: Option<i64>, now: Millis) -> Result<Option<Millis>> {
    if let Some(hours) = in_hours {
        let deadline = hours
            .checked_mul(HOUR_MS)
            .and_then(|offset| now.checked_add(offset))
            .with_context(|| format!("--in-hours {hours} is out of range"))?;
        return Ok(Some(deadline));
    }
    let Some(raw) = due else {
        return Ok(None);
    };
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    let local = PrimitiveDateTime::parse(raw, &format)
        .with_context(|| format!("invalid deadline {raw:?}, expected YYYY-MM-DD HH:MM"))?;
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let at = local.assume_offset(offset);
    Ok(Some((at.unix_timestamp_nanos() / 1_000_000) as Millis))
}

fn parse_group(raw: &str) -> Result<Group> {
    Group::from_token(&raw.to_ascii_uppercase())
        .with_context(|| format!("unknown group {raw:?}"))
}

fn parse_priority(raw: &str) -> Result<Priority> {
    Priority::from_token(&raw.to_ascii_uppercase())
        .with_context(|| format!("unknown priority {raw:?}"))
}

fn parse_bucket(raw: &str) -> Result<Bucket> {
    match raw.to_ascii_lowercase().as_str() {
        "overdue" => Ok(Bucket::Overdue),
        "upcoming" => Ok(Bucket::Upcoming),
        "future" => Ok(Bucket::Future),
        _ => bail!("unknown bucket {raw:?}"),
    }
}
