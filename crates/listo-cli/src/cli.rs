use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// A local checklist with due-date reminders and recurring tasks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the persisted state (overrides config)
    #[clap(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show all lists
    Lists,
    /// Create a new list
    NewList(NewListCommand),
    /// Rename a list
    RenameList(RenameListCommand),
    /// Delete a list, cancelling its reminders
    RmList(RmListCommand),
    /// Add a task to a list
    Add(AddCommand),
    /// Show the tasks of a list
    Tasks(TasksCommand),
    /// Toggle a task's completion state
    Done(DoneCommand),
    /// Delete a task
    Rm(RmCommand),
    /// Move a task's due date
    Due(DueCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct NewListCommand {
    /// The list label
    pub label: String,
}

#[derive(Parser, Debug, Clone)]
pub struct RenameListCommand {
    /// The list (key, key prefix, or label)
    pub list: String,
    /// The new label
    pub label: String,
}

#[derive(Parser, Debug, Clone)]
pub struct RmListCommand {
    /// The list (key, key prefix, or label)
    pub list: String,
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// The list (key, key prefix, or label)
    pub list: String,
    /// The task title
    pub title: String,
    /// Due date, UTC (RFC 3339 or "YYYY-MM-DD HH:MM")
    #[clap(short, long)]
    pub due: Option<String>,
    /// Recurrence frequency (daily, weekly, monthly, yearly)
    #[clap(long)]
    pub every: Option<String>,
    /// Recurrence interval
    #[clap(long, default_value_t = 1)]
    pub interval: u32,
    /// Weekdays for weekly recurrence (0=Sun..6=Sat, comma separated)
    #[clap(long)]
    pub on: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct TasksCommand {
    /// The list (key, key prefix, or label)
    pub list: String,
}

#[derive(Parser, Debug, Clone)]
pub struct DoneCommand {
    /// The list (key, key prefix, or label)
    pub list: String,
    /// The task id (prefix allowed)
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct RmCommand {
    /// The list (key, key prefix, or label)
    pub list: String,
    /// The task id (prefix allowed)
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct DueCommand {
    /// The list (key, key prefix, or label)
    pub list: String,
    /// The task id (prefix allowed)
    pub id: String,
    /// New due date, UTC (RFC 3339 or "YYYY-MM-DD HH:MM")
    pub due: String,
}
