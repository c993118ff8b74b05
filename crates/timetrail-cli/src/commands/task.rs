//! Task management commands.

use chrono::Utc;
use clap::Subcommand;
use timetrail_core::task::{Tag, Task, TaskStatus};
use timetrail_core::timefmt;

use super::common::AppContext;

const DEFAULT_TAG_COLOR: &str = "#9e9e9e";

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task name
        name: String,
        /// Task description
        #[arg(long)]
        description: Option<String>,
        /// Comma-separated tags, each `label` or `label:color`
        #[arg(long)]
        tags: Option<String>,
    },
    /// List tasks
    List {
        /// Filter by status (idle, running, paused, completed)
        #[arg(long)]
        status: Option<String>,
        /// Print the full task records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one task as JSON
    Show {
        /// Task ID or unique prefix
        id: String,
    },
    /// Edit name and/or description
    Edit {
        /// Task ID or unique prefix
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
    },
    /// Replace a task's tags
    Tag {
        /// Task ID or unique prefix
        id: String,
        /// Comma-separated tags, each `label` or `label:color`
        tags: String,
    },
    /// Start timing a task (pauses any other running task)
    Start {
        /// Task ID or unique prefix
        id: String,
    },
    /// Resume a paused task (alias for start)
    Resume {
        /// Task ID or unique prefix
        id: String,
    },
    /// Pause the running task
    Pause {
        /// Task ID or unique prefix
        id: String,
    },
    /// Mark a task completed
    Complete {
        /// Task ID or unique prefix
        id: String,
    },
    /// Reopen a completed task
    Reopen {
        /// Task ID or unique prefix
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task ID or unique prefix
        id: String,
    },
}

fn parse_tags(raw: &str) -> Vec<Tag> {
    raw.split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((label, color)) => Tag::new(label.trim(), color.trim()),
            None => Tag::new(entry, DEFAULT_TAG_COLOR),
        })
        .collect()
}

fn parse_status(raw: &str) -> Result<TaskStatus, Box<dyn std::error::Error>> {
    match raw {
        "idle" => Ok(TaskStatus::Idle),
        "running" => Ok(TaskStatus::Running),
        "paused" => Ok(TaskStatus::Paused),
        "completed" => Ok(TaskStatus::Completed),
        other => Err(format!("unknown status filter: {other}").into()),
    }
}

/// Display prefix of a task id. Ids are opaque strings, so this must not
/// assume ASCII.
fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Idle => "idle",
        TaskStatus::Running => "running",
        TaskStatus::Paused => "paused",
        TaskStatus::Completed => "completed",
    }
}

fn print_task(task: &Task) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(task)?);
    Ok(())
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = AppContext::open()?;
    let now = Utc::now();

    match action {
        TaskAction::Add {
            name,
            description,
            tags,
        } => {
            let tags = tags.as_deref().map(parse_tags).unwrap_or_default();
            let task = ctx
                .store
                .lock()
                .unwrap()
                .create(name, description, tags, now);
            ctx.persist()?;
            println!("Task created: {}", task.id);
            print_task(&task)?;
        }
        TaskAction::List { status, json } => {
            let filter = status.as_deref().map(parse_status).transpose()?;
            let store = ctx.store.lock().unwrap();
            let tasks: Vec<&Task> = store
                .tasks()
                .iter()
                .filter(|t| filter.map_or(true, |s| t.status == s))
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else {
                for task in tasks {
                    println!(
                        "{}  {:<9}  {}  {}",
                        short_id(&task.id),
                        status_label(task.status),
                        timefmt::format_hms(timefmt::total_ms(&task.intervals, now)),
                        task.name,
                    );
                }
            }
        }
        TaskAction::Show { id } => {
            let id = ctx.resolve_task_id(&id)?;
            let store = ctx.store.lock().unwrap();
            let task = store.get(&id).ok_or(format!("no task with id {id}"))?;
            print_task(task)?;
        }
        TaskAction::Edit {
            id,
            name,
            description,
        } => {
            let id = ctx.resolve_task_id(&id)?;
            ctx.store.lock().unwrap().edit(&id, name, description, now)?;
            ctx.persist()?;
            println!("Task updated: {id}");
        }
        TaskAction::Tag { id, tags } => {
            let id = ctx.resolve_task_id(&id)?;
            ctx.store
                .lock()
                .unwrap()
                .set_tags(&id, parse_tags(&tags), now)?;
            ctx.persist()?;
            println!("Task updated: {id}");
        }
        TaskAction::Start { id } | TaskAction::Resume { id } => {
            let id = ctx.resolve_task_id(&id)?;
            ctx.store.lock().unwrap().start(&id, now)?;
            ctx.persist()?;
            println!("Task started: {id}");
        }
        TaskAction::Pause { id } => {
            let id = ctx.resolve_task_id(&id)?;
            ctx.store.lock().unwrap().pause(&id, now)?;
            ctx.persist()?;
            println!("Task paused: {id}");
        }
        TaskAction::Complete { id } => {
            let id = ctx.resolve_task_id(&id)?;
            ctx.store.lock().unwrap().complete(&id, now)?;
            ctx.persist()?;
            println!("Task completed: {id}");
        }
        TaskAction::Reopen { id } => {
            let id = ctx.resolve_task_id(&id)?;
            ctx.store.lock().unwrap().reopen(&id, now)?;
            ctx.persist()?;
            println!("Task reopened: {id}");
        }
        TaskAction::Delete { id } => {
            let id = ctx.resolve_task_id(&id)?;
            let removed = ctx.store.lock().unwrap().delete(&id)?;
            ctx.persist()?;
            println!("Task deleted: {} ({})", removed.id, removed.name);
        }
    }

    Ok(())
}
