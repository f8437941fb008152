use clap::Parser;
use owo_colors::{OwoColorize, Style};
use std::sync::Arc;
use std::time::Duration;

use listo_core::error::CoreError;
use listo_core::lists::ListManager;
use listo_core::scheduler::ReminderScheduler;
use listo_core::storage::KeyValueStore;
use listo_core::store::StateStore;
use listo_core::tasks::TaskManager;

mod cli;
mod commands;
mod config;
mod scheduler;
mod storage;

const STORAGE_KEY: &str = "listo.state";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = config::Config::new().unwrap_or_default();
    let cli = cli::Cli::parse();
    let data_dir = cli.data_dir.clone().unwrap_or(config.data_dir);

    let storage: Arc<dyn KeyValueStore> = Arc::new(storage::JsonFileStore::new(data_dir));
    let store = StateStore::load(storage.clone(), STORAGE_KEY).await;
    let reminders: Arc<dyn ReminderScheduler> = Arc::new(scheduler::LogScheduler);
    let tasks = TaskManager::new(store.clone(), reminders.clone());
    let lists = ListManager::new(store.clone(), reminders);

    let mutating = !matches!(cli.command, cli::Commands::Lists | cli::Commands::Tasks(_));

    let result = match cli.command {
        cli::Commands::Lists => commands::show_lists(&store),
        cli::Commands::NewList(command) => commands::new_list(&lists, command),
        cli::Commands::RenameList(command) => commands::rename_list(&store, &lists, command),
        cli::Commands::RmList(command) => commands::rm_list(&store, &lists, command).await,
        cli::Commands::Add(command) => commands::add_task(&store, &tasks, command).await,
        cli::Commands::Tasks(command) => commands::show_tasks(&store, command),
        cli::Commands::Done(command) => commands::toggle_done(&store, &tasks, command).await,
        cli::Commands::Rm(command) => commands::rm_task(&store, &tasks, command).await,
        cli::Commands::Due(command) => commands::reschedule(&store, &tasks, command).await,
    };

    if mutating {
        settle_writes(&store, storage.as_ref()).await;
    }

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

/// The store's persistence writer is fire-and-forget; wait (bounded) for the
/// final snapshot to land before the process exits.
async fn settle_writes(store: &StateStore, storage: &dyn KeyValueStore) {
    let Ok(expected) = serde_json::to_string(&store.snapshot()) else {
        return;
    };
    for _ in 0..100 {
        if matches!(storage.get(STORAGE_KEY).await, Ok(Some(raw)) if raw == expected) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tracing::warn!("exiting before the last state write was observed");
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.downcast_ref::<CoreError>() {
        match core_error {
            CoreError::NotFound(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
            }
            CoreError::InvalidInput(s) => {
                eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
            }
            CoreError::InvalidRecurrence(s) => {
                eprintln!("{} Invalid recurrence: {}", "Error:".style(error_style), s);
            }
            _ => eprintln!("{} {}", "Error:".style(error_style), err),
        }
    } else {
        eprintln!("{} {}", "Error:".style(error_style), err);
    }
}
