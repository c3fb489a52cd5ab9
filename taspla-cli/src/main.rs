use anyhow::{bail, Result};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use taspla_core::time::{format_local, parse_due};
use taspla_core::{
    Priority, RankedTask, SystemClock, Task, TaskDraft, TaskFilter, TaskPatch, TaskSession,
    TaskStatus,
};

mod config;
mod file_store;
mod logging;
mod state;

use config::Config;
use file_store::JsonFileStore;

type Session = TaskSession<JsonFileStore, SystemClock>;

#[derive(Parser, Debug)]
#[command(name = "taspla", version, about = "Taspla task list: most urgent first")]
struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Config file commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    #[command(flatten)]
    Task(TaskCommand),
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    /// Create a task
    Add {
        title: String,

        /// Due date: YYYY-MM-DD, "YYYY-MM-DD HH:MM" (local) or RFC3339
        #[arg(long)]
        due: String,

        /// critical | high | medium | low
        #[arg(short, long, default_value = "medium")]
        priority: Priority,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Remind this many days before the due date
        #[arg(long)]
        remind_days: Option<u32>,

        /// Remind this many hours before the due date
        #[arg(long)]
        remind_hours: Option<u32>,
    },

    /// Show active tasks, most urgent first
    List {
        /// Also show completed tasks
        #[arg(long)]
        all: bool,

        #[arg(long)]
        status: Option<TaskStatus>,

        #[arg(long)]
        priority: Option<Priority>,

        /// Max rows (default from config)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Mark a task completed
    Done { id: String },

    /// Move a completed task back to active
    Restore { id: String },

    /// Change some fields of a task
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(short, long)]
        priority: Option<Priority>,

        #[arg(long)]
        due: Option<String>,

        #[arg(long)]
        remind_days: Option<u32>,

        #[arg(long)]
        remind_hours: Option<u32>,

        /// Drop both reminder offsets
        #[arg(long, conflicts_with_all = ["remind_days", "remind_hours"])]
        clear_reminder: bool,
    },

    /// Delete a task permanently
    Rm { id: String },

    /// Show tasks whose reminder is due now
    Remind,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write ~/.taspla/config.toml with defaults
    Init,

    /// Print the effective config
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose)?;

    match cli.command {
        Command::Config { command } => run_config(command),
        Command::Task(command) => run(command),
    }
}

fn run_config(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Init => config::init_config(),
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            print!("{}", toml::to_string_pretty(&cfg)?);
            Ok(())
        }
    }
}

fn run(command: TaskCommand) -> Result<()> {
    let cfg = config::load_config()?;
    let tz = cfg.tz()?;
    let mut session = open_session(&cfg, tz)?;

    match command {
        TaskCommand::Add {
            title,
            due,
            priority,
            description,
            remind_days,
            remind_hours,
        } => {
            let mut draft = TaskDraft::new(title, priority, parse_due(&due, tz)?)
                .with_description(description);
            draft.reminder_days = remind_days;
            draft.reminder_hours = remind_hours;

            let task = session.create(draft)?;
            println!("Created {} {}", short_id(&task.id), task.title);
        }

        TaskCommand::List {
            all,
            status,
            priority,
            limit,
        } => {
            let limit = limit.unwrap_or(cfg.list_limit);
            list(&session, tz, all, status, priority, limit);
        }

        TaskCommand::Done { id } => {
            let id = session.engine().resolve_id(&id)?;
            let task = session.complete(&id)?;
            println!("Completed {} {}", short_id(&task.id), task.title);
        }

        TaskCommand::Restore { id } => {
            let id = session.engine().resolve_id(&id)?;
            let task = session.restore(&id)?;
            println!("Restored {} {}", short_id(&task.id), task.title);
        }

        TaskCommand::Edit {
            id,
            title,
            description,
            priority,
            due,
            remind_days,
            remind_hours,
            clear_reminder,
        } => {
            let id = session.engine().resolve_id(&id)?;
            let patch = TaskPatch {
                title,
                description,
                priority,
                due: due.map(|d| parse_due(&d, tz)).transpose()?,
                reminder_days: if clear_reminder { Some(None) } else { remind_days.map(Some) },
                reminder_hours: if clear_reminder { Some(None) } else { remind_hours.map(Some) },
            };
            if patch.is_empty() {
                bail!("nothing to change (pass --title, --due, --priority, ...)");
            }
            let task = session.patch(&id, patch)?;
            println!("Updated {} {}", short_id(&task.id), task.title);
        }

        TaskCommand::Rm { id } => {
            // Unknown ids are a no-op, matching the engine.
            let removed = match session.engine().resolve_id(&id) {
                Ok(full) => session.remove(&full)?,
                Err(taspla_core::TaskError::TaskNotFound(_)) => None,
                Err(e) => return Err(e.into()),
            };
            match removed {
                Some(task) => println!("Removed {} {}", short_id(&task.id), task.title),
                None => println!("No task {id}; nothing removed"),
            }
        }

        TaskCommand::Remind => {
            let due = session.engine().due_reminders();
            if due.is_empty() {
                println!("No reminders due.");
            }
            for t in due {
                println!(
                    "* {} (due {}) {}",
                    t.title,
                    format_local(t.due, tz),
                    short_id(&t.id)
                );
            }
        }
    }

    Ok(())
}

fn open_session(cfg: &Config, tz: Tz) -> Result<Session> {
    let path = cfg.tasks_path()?;
    let store = JsonFileStore::open(&path)?;
    tracing::info!(path = %store.path().display(), %tz, "opening task store");
    TaskSession::open(store, SystemClock, tz)
}

fn list(
    session: &Session,
    tz: Tz,
    all: bool,
    status: Option<TaskStatus>,
    priority: Option<Priority>,
    limit: usize,
) {
    let engine = session.engine();

    if status != Some(TaskStatus::Completed) {
        let ranked: Vec<RankedTask<'_>> = engine
            .ranked_active()
            .into_iter()
            .filter(|r| priority.is_none_or(|p| r.task.priority == p))
            .collect();

        if ranked.is_empty() {
            println!("No active tasks.");
        }
        for (i, r) in ranked.iter().take(limit).enumerate() {
            println!("{}", format_ranked(i + 1, r, tz));
        }
        if ranked.len() > limit {
            println!("     ... {} more", ranked.len() - limit);
        }
    }

    if all || status == Some(TaskStatus::Completed) {
        let filter = TaskFilter {
            status: Some(TaskStatus::Completed),
            priority,
        };
        let done = engine.list(&filter);
        if !done.is_empty() {
            println!("\nCompleted:");
        }
        for t in done.into_iter().take(limit) {
            println!("{}", format_completed(t, tz));
        }
    }
}

fn format_ranked(pos: usize, r: &RankedTask<'_>, tz: Tz) -> String {
    let badge = if r.overdue {
        "!"
    } else if r.reminder_due {
        "*"
    } else {
        " "
    };
    format!(
        "{pos:>3}. {badge} [{:<8}] {}  (due {})  {}",
        r.task.priority.as_str(),
        r.task.title,
        format_local(r.task.due, tz),
        short_id(&r.task.id)
    )
}

fn format_completed(t: &Task, tz: Tz) -> String {
    let done_at = t
        .completed_at
        .map(|at| format_local(at, tz))
        .unwrap_or_default();
    format!(
        "     x [{:<8}] {}  (done {})  {}",
        t.priority.as_str(),
        t.title,
        done_at,
        short_id(&t.id)
    )
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use taspla_core::{RankContext, Tier};

    #[test]
    fn cli_parses_add_with_reminder() {
        let cli = Cli::try_parse_from([
            "taspla", "add", "Ship it", "--due", "2026-02-20", "-p", "high", "--remind-days", "2",
        ])
        .unwrap();
        match cli.command {
            Command::Task(TaskCommand::Add { title, priority, remind_days, .. }) => {
                assert_eq!(title, "Ship it");
                assert_eq!(priority, Priority::High);
                assert_eq!(remind_days, Some(2));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_routes_config_apart_from_task_commands() {
        let cli = Cli::try_parse_from(["taspla", "config", "show"]).unwrap();
        assert!(matches!(cli.command, Command::Config { command: ConfigCommand::Show }));

        let cli = Cli::try_parse_from(["taspla", "remind"]).unwrap();
        assert!(matches!(cli.command, Command::Task(TaskCommand::Remind)));
    }

    #[test]
    fn cli_rejects_clear_with_new_reminder() {
        let res = Cli::try_parse_from([
            "taspla", "edit", "abc", "--clear-reminder", "--remind-hours", "3",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn overdue_row_gets_bang_badge() {
        let now = Utc.with_ymd_and_hms(2026, 2, 15, 9, 0, 0).unwrap();
        let t = Task::new(
            "0123456789abcdef",
            TaskDraft::new("Fix login bug", Priority::High, now - Duration::days(5)),
            now,
        );
        let ranked = taspla_core::rank([&t], &RankContext::utc(now));
        assert_eq!(ranked[0].tier, Tier::Overdue);

        let line = format_ranked(1, &ranked[0], Tz::UTC);
        assert_eq!(line, "  1. ! [high    ] Fix login bug  (due 2026-02-10 09:00)  01234567");
    }

    #[test]
    fn short_id_handles_short_ids() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id("0123456789"), "01234567");
    }
}
