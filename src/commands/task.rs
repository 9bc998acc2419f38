//! Task commands.
//!
//! Ids may be given as any unique prefix of the full id shown by `list`.

use super::{home_sequence, open_store, parse_date, resolve_in, task_failure};
use crate::api::DeleteOutcome;
use crate::libs::messages::Message;
use crate::libs::task::{Partition, Task, TaskChanges, TaskDraft, FEATURED_CAPACITY};
use crate::libs::view::View;
use crate::{msg_info, msg_print, msg_success, msg_warning};
use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only pinned tasks
    #[arg(long, conflicts_with = "bucket")]
    home: bool,

    /// Only unpinned tasks
    #[arg(long)]
    bucket: bool,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(required = true)]
    title: String,

    #[arg(short, long)]
    group: String,

    /// `today` or YYYY-MM-DD
    #[arg(long, default_value = "today")]
    date: String,

    #[arg(short, long, default_value = "")]
    description: String,

    /// Pin the new task to home
    #[arg(short, long)]
    featured: bool,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    #[arg(required = true)]
    id: String,

    #[arg(short, long)]
    title: Option<String>,

    #[arg(short, long)]
    description: Option<String>,

    #[arg(short, long)]
    group: Option<String>,

    #[arg(long)]
    date: Option<String>,
}

#[derive(Debug, Args)]
pub struct DoneArgs {
    #[arg(required = true)]
    id: String,

    /// Mark the task as not done
    #[arg(long)]
    undo: bool,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    #[arg(required = true)]
    id: String,
}

#[derive(Debug, Args)]
pub struct MoveArgs {
    #[arg(required = true)]
    id: String,

    /// 1-based position among the pinned tasks
    #[arg(required = true, value_parser = clap::value_parser!(u32).range(1..))]
    position: u32,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[arg(required = true)]
    id: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

pub async fn list(args: ListArgs) -> Result<()> {
    let store = open_store().await?;
    let state = store.state();

    if !args.bucket {
        print_partition(Partition::Home, state.partition(Partition::Home));
    }
    if !args.home {
        print_partition(Partition::Bucket, state.partition(Partition::Bucket));
    }
    Ok(())
}

/// Prints one partition with its header.
pub fn print_partition(partition: Partition, tasks: &[Task]) {
    match partition {
        Partition::Home => msg_print!(Message::HomeHeader(tasks.len(), FEATURED_CAPACITY), true),
        Partition::Bucket => msg_print!(Message::BucketHeader(tasks.len()), true),
    }
    if tasks.is_empty() {
        msg_print!(Message::NoTasks);
    } else {
        View::tasks(tasks, partition == Partition::Home);
    }
}

pub async fn add(args: AddArgs) -> Result<()> {
    let store = open_store().await?;
    let draft = TaskDraft::new(&args.title, &args.group, parse_date(&args.date)?)
        .description(&args.description)
        .featured(args.featured);

    let task = store.add_task(&draft).await.map_err(task_failure)?;
    msg_success!(Message::TaskCreated(task.title));
    Ok(())
}

pub async fn edit(args: EditArgs) -> Result<()> {
    let store = open_store().await?;
    let (id, _) = resolve_in(&store, &args.id)?;
    let changes = TaskChanges {
        title: args.title,
        description: args.description,
        group: args.group,
        date: args.date.as_deref().map(parse_date).transpose()?,
        ..Default::default()
    };
    if changes.is_empty() {
        msg_warning!(Message::NoChangesProvided);
        return Ok(());
    }

    let task = store.update_task(&id, &changes).await.map_err(task_failure)?;
    msg_success!(Message::TaskUpdated(task.title));
    Ok(())
}

pub async fn done(args: DoneArgs) -> Result<()> {
    let store = open_store().await?;
    let (id, _) = resolve_in(&store, &args.id)?;

    let task = store
        .update_task(&id, &TaskChanges::completed(!args.undo))
        .await
        .map_err(task_failure)?;
    if task.completed {
        msg_success!(Message::TaskCompleted(task.title));
    } else {
        msg_success!(Message::TaskReopened(task.title));
    }
    Ok(())
}

pub async fn pin(args: IdArgs) -> Result<()> {
    let store = open_store().await?;
    let (id, task) = resolve_in(&store, &args.id)?;

    store.move_to_featured(&id).await.map_err(task_failure)?;
    msg_success!(Message::TaskPinned(task.title));
    Ok(())
}

pub async fn unpin(args: IdArgs) -> Result<()> {
    let store = open_store().await?;
    let (id, task) = resolve_in(&store, &args.id)?;

    store.move_to_bucket(&id).await.map_err(task_failure)?;
    msg_success!(Message::TaskUnpinned(task.title));
    Ok(())
}

pub async fn move_to(args: MoveArgs) -> Result<()> {
    let store = open_store().await?;
    let (id, task) = resolve_in(&store, &args.id)?;
    let home = store.home_tasks();

    let sequence = home_sequence(&home, &task, args.position)?;
    store.reorder(&sequence).await.map_err(task_failure)?;

    let position = sequence.iter().position(|t| t.id == id).map_or(1, |index| index + 1);
    msg_success!(Message::TaskMoved(task.title, position));
    Ok(())
}

pub async fn delete(args: DeleteArgs) -> Result<()> {
    let store = open_store().await?;
    let (id, task) = resolve_in(&store, &args.id)?;

    if !args.yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::ConfirmDeleteTask(task.title.clone()).to_string())
            .default(false)
            .interact()?;
        if !confirmed {
            return Ok(());
        }
    }

    match store.delete_task(&id).await.map_err(task_failure)? {
        DeleteOutcome::Deleted => msg_success!(Message::TaskDeleted(task.title)),
        DeleteOutcome::AlreadyGone => msg_info!(Message::TaskAlreadyDeleted(id.to_string())),
    }
    Ok(())
}
