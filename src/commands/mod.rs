//! Command-line interface.
//!
//! Each subcommand lives in its own module with an `Args` struct and a
//! `cmd` entry point. Commands that touch tasks open a [`TaskStore`] over the
//! hosted backend with [`open_store`] and initialize it before reading.

pub mod analytics;
pub mod export;
pub mod group;
pub mod init;
pub mod login;
pub mod logout;
pub mod profile;
pub mod report;
pub mod task;
pub mod watch;

use crate::api::supabase::SupabaseClient;
use crate::api::Backend;
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::sync::{ordering, TaskError, TaskStore};
use crate::libs::task::{Task, TaskId};
use crate::msg_error_anyhow;
use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configure the backend and analytics settings")]
    Init,
    #[command(about = "Create an account")]
    Signup(login::SignupArgs),
    #[command(about = "Sign in")]
    Login(login::LoginArgs),
    #[command(about = "Sign out and forget the local session")]
    Logout,
    #[command(about = "Update display name or password")]
    Profile(profile::ProfileArgs),
    #[command(about = "Send a password reset link")]
    ResetPassword(login::ResetArgs),
    #[command(about = "Show pinned and bucket tasks")]
    List(task::ListArgs),
    #[command(about = "Create a task")]
    Add(task::AddArgs),
    #[command(about = "Edit a task")]
    Edit(task::EditArgs),
    #[command(about = "Mark a task as done")]
    Done(task::DoneArgs),
    #[command(about = "Pin a task to home")]
    Pin(task::IdArgs),
    #[command(about = "Move a pinned task back to the bucket")]
    Unpin(task::IdArgs),
    #[command(about = "Move a pinned task to a position on home")]
    Move(task::MoveArgs),
    #[command(about = "Delete a task")]
    Delete(task::DeleteArgs),
    #[command(about = "Follow task changes from other devices")]
    Watch,
    #[command(about = "Productivity over a date range")]
    Report(report::ReportArgs),
    #[command(about = "Task statistics, categories and trend")]
    Analytics,
    #[command(about = "Export tasks or analytics to a file")]
    Export(export::ExportArgs),
    #[command(about = "Manage task groups")]
    Group(group::GroupArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init => init::cmd(),
            Commands::Signup(args) => login::signup(args).await,
            Commands::Login(args) => login::login(args).await,
            Commands::Logout => logout::cmd().await,
            Commands::Profile(args) => profile::cmd(args).await,
            Commands::ResetPassword(args) => login::reset_password(args).await,
            Commands::List(args) => task::list(args).await,
            Commands::Add(args) => task::add(args).await,
            Commands::Edit(args) => task::edit(args).await,
            Commands::Done(args) => task::done(args).await,
            Commands::Pin(args) => task::pin(args).await,
            Commands::Unpin(args) => task::unpin(args).await,
            Commands::Move(args) => task::move_to(args).await,
            Commands::Delete(args) => task::delete(args).await,
            Commands::Watch => watch::cmd().await,
            Commands::Report(args) => report::cmd(args).await,
            Commands::Analytics => analytics::cmd().await,
            Commands::Export(args) => export::cmd(args).await,
            Commands::Group(args) => group::cmd(args),
        }
    }
}

/// Hosted client for the configured project.
pub(crate) fn open_client() -> Result<(Config, Arc<SupabaseClient>)> {
    let config = Config::read()?;
    let client = SupabaseClient::from_config(&config)?;
    Ok((config, Arc::new(client)))
}

/// Task store over the configured project, loaded and ready to read.
pub(crate) async fn open_store() -> Result<Arc<TaskStore<SupabaseClient>>> {
    let (config, client) = open_client()?;
    let store = Arc::new(TaskStore::new(client, config.groups()));
    store.initialize().await.map_err(task_failure)?;
    Ok(store)
}

/// Turns a store error into a printable one.
pub(crate) fn task_failure(error: TaskError) -> anyhow::Error {
    match error {
        TaskError::NotAuthenticated => msg_error_anyhow!(Message::NotSignedIn),
        other => msg_error_anyhow!(Message::TaskOperationFailed(other.to_string())),
    }
}

/// Finds the task whose id is `prefix` or starts with it.
///
/// An exact match wins over prefix matches.
pub fn resolve_task(tasks: &[Task], prefix: &str) -> Result<Task> {
    let prefix = prefix.trim();
    if let Some(task) = tasks.iter().find(|t| t.id.as_str() == prefix) {
        return Ok(task.clone());
    }
    let matches: Vec<&Task> = if prefix.is_empty() {
        Vec::new()
    } else {
        tasks.iter().filter(|t| t.id.as_str().starts_with(prefix)).collect()
    };
    match matches.as_slice() {
        [] => Err(msg_error_anyhow!(Message::TaskNotFound(prefix.to_string()))),
        [task] => Ok((*task).clone()),
        many => Err(msg_error_anyhow!(Message::TaskIdAmbiguous(prefix.to_string(), many.len()))),
    }
}

/// New home order with `task` at the 1-based `position`.
///
/// Only pinned tasks have a persisted order; the bucket is re-sorted by
/// creation time on every fetch.
pub fn home_sequence(home: &[Task], task: &Task, position: u32) -> Result<Vec<Task>> {
    if !task.featured {
        return Err(msg_error_anyhow!(Message::BucketNotReorderable(task.title.clone())));
    }
    let target = position.saturating_sub(1) as usize;
    ordering::move_item(home, &task.id, target).map_err(task_failure)
}

/// Resolves an id prefix against the store's current partitions.
pub(crate) fn resolve_in<B: Backend>(store: &TaskStore<B>, prefix: &str) -> Result<(TaskId, Task)> {
    let task = resolve_task(&store.tasks(), prefix)?;
    Ok((task.id.clone(), task))
}

/// Parses `today` or a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("today") {
        return Ok(Local::now().date_naive());
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| msg_error_anyhow!(Message::InvalidDate(input.to_string())))
}
