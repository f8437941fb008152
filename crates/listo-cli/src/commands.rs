use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::str::FromStr;

use crate::cli;
use listo_core::error::CoreError;
use listo_core::lists::ListManager;
use listo_core::models::{AppState, Frequency, NewTaskData, RecurrenceRule};
use listo_core::recurrence;
use listo_core::store::StateStore;
use listo_core::tasks::TaskManager;

pub fn show_lists(store: &StateStore) -> Result<()> {
    let state = store.snapshot();
    if state.lists.is_empty() {
        println!("No lists yet.");
        return Ok(());
    }
    for list in &state.lists {
        println!(
            "{}  {}  ({} tasks)",
            short(&list.key),
            list.label,
            list.count.unwrap_or(0)
        );
    }
    Ok(())
}

pub fn new_list(lists: &ListManager, command: cli::NewListCommand) -> Result<()> {
    match lists.create_list(&command.label) {
        Some(key) => println!("Created '{}' ({})", command.label.trim(), short(&key)),
        None => println!("Nothing created (empty label)."),
    }
    Ok(())
}

pub fn rename_list(
    store: &StateStore,
    lists: &ListManager,
    command: cli::RenameListCommand,
) -> Result<()> {
    let key = resolve_list_key(&store.snapshot(), &command.list)?;
    if lists.rename_list(&key, &command.label) {
        println!("Renamed {} to '{}'", short(&key), command.label.trim());
    } else {
        println!("List {} was not renamed.", short(&key));
    }
    Ok(())
}

pub async fn rm_list(
    store: &StateStore,
    lists: &ListManager,
    command: cli::RmListCommand,
) -> Result<()> {
    let key = resolve_list_key(&store.snapshot(), &command.list)?;
    if lists.delete_list(&key).await {
        println!("Deleted list {}", short(&key));
    } else {
        println!("List {} was not deleted.", short(&key));
    }
    Ok(())
}

pub async fn add_task(
    store: &StateStore,
    tasks: &TaskManager,
    command: cli::AddCommand,
) -> Result<()> {
    let list_key = resolve_list_key(&store.snapshot(), &command.list)?;
    let due_date = command.due.as_deref().map(parse_due).transpose()?;
    let recurrence = build_recurrence(&command)?;

    let data = NewTaskData {
        title: command.title,
        due_date,
        list_key,
        recurrence,
    };
    match tasks.add_task(data).await {
        Some(task) => println!("Added '{}' ({})", task.title, short(&task.id)),
        None => println!("Nothing added (empty title)."),
    }
    Ok(())
}

pub fn show_tasks(store: &StateStore, command: cli::TasksCommand) -> Result<()> {
    let state = store.snapshot();
    let key = resolve_list_key(&state, &command.list)?;
    let tasks = state.tasks(&key);
    if tasks.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    for task in tasks {
        let mark = if task.done { "x" } else { " " };
        let mut line = format!("[{}] {}  {}", mark, short(&task.id), task.title);
        if let Some(due) = task.due_date {
            line.push_str(&format!("  (due {})", due.format("%Y-%m-%d %H:%M")));
        }
        if let Some(rule) = &task.recurrence {
            line.push_str(&format!("  [every {} {}]", rule.interval, rule.frequency));
        }
        println!("{}", line);
    }
    Ok(())
}

pub async fn toggle_done(
    store: &StateStore,
    tasks: &TaskManager,
    command: cli::DoneCommand,
) -> Result<()> {
    let state = store.snapshot();
    let key = resolve_list_key(&state, &command.list)?;
    let id = resolve_task_id(&state, &key, &command.id)?;
    tasks.toggle_done(&key, &id).await;
    Ok(())
}

pub async fn rm_task(
    store: &StateStore,
    tasks: &TaskManager,
    command: cli::RmCommand,
) -> Result<()> {
    let state = store.snapshot();
    let key = resolve_list_key(&state, &command.list)?;
    let id = resolve_task_id(&state, &key, &command.id)?;
    tasks.delete_task(&key, &id).await;
    println!("Deleted task {}", short(&id));
    Ok(())
}

pub async fn reschedule(
    store: &StateStore,
    tasks: &TaskManager,
    command: cli::DueCommand,
) -> Result<()> {
    let state = store.snapshot();
    let key = resolve_list_key(&state, &command.list)?;
    let id = resolve_task_id(&state, &key, &command.id)?;
    let due = parse_due(&command.due)?;
    tasks.reschedule_due_date(&key, &id, due).await;
    println!("Task {} now due {}", short(&id), due.format("%Y-%m-%d %H:%M"));
    Ok(())
}

fn short(id: &str) -> &str {
    &id[..id.len().min(8)]
}

fn parse_due(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
        .map_err(|_| CoreError::InvalidInput(format!("unparseable due date: {}", raw)))?;
    Ok(Utc.from_utc_datetime(&naive))
}

fn build_recurrence(command: &cli::AddCommand) -> Result<Option<RecurrenceRule>> {
    let Some(every) = &command.every else {
        if command.on.is_some() {
            return Err(CoreError::InvalidInput("--on requires --every".to_string()).into());
        }
        return Ok(None);
    };

    let frequency =
        Frequency::from_str(every).map_err(|e| CoreError::InvalidInput(e.to_string()))?;
    let mut rule = RecurrenceRule::every(frequency).with_interval(command.interval);
    if let Some(on) = &command.on {
        let weekdays = on
            .split(',')
            .map(|d| {
                d.trim()
                    .parse::<u8>()
                    .map_err(|_| CoreError::InvalidInput(format!("bad weekday: {}", d)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        rule = rule.on_weekdays(weekdays);
    }
    recurrence::validate(&rule)?;
    Ok(Some(rule))
}

fn resolve_list_key(state: &AppState, needle: &str) -> Result<String> {
    if state.lists.iter().any(|l| l.key == needle) {
        return Ok(needle.to_string());
    }
    let by_label: Vec<_> = state
        .lists
        .iter()
        .filter(|l| l.label.eq_ignore_ascii_case(needle))
        .collect();
    if by_label.len() == 1 {
        return Ok(by_label[0].key.clone());
    }
    let by_prefix: Vec<_> = state
        .lists
        .iter()
        .filter(|l| l.key.starts_with(needle))
        .collect();
    match by_prefix.len() {
        1 => Ok(by_prefix[0].key.clone()),
        0 => Err(CoreError::NotFound(format!("no list matching '{}'", needle)).into()),
        _ => Err(CoreError::InvalidInput(format!("'{}' matches more than one list", needle)).into()),
    }
}

fn resolve_task_id(state: &AppState, list_key: &str, prefix: &str) -> Result<String> {
    let tasks = state.tasks(list_key);
    if let Some(task) = tasks.iter().find(|t| t.id == prefix) {
        return Ok(task.id.clone());
    }
    let matches: Vec<_> = tasks.iter().filter(|t| t.id.starts_with(prefix)).collect();
    match matches.len() {
        1 => Ok(matches[0].id.clone()),
        0 => Err(CoreError::NotFound(format!("no task matching '{}'", prefix)).into()),
        _ => Err(CoreError::InvalidInput(format!("'{}' matches more than one task", prefix)).into()),
    }
}
