//! Typed, user-scoped access to the remote `tasks` table.
//!
//! Every operation resolves the signed-in user first and scopes the call to
//! that identity; an owner supplied by the caller is never trusted.

use super::{ordering, OrderFailure, TaskError};
use crate::api::{AuthError, Backend, DeleteOutcome, NewTaskRow, TaskPatch, TaskQuery, TaskSort, User};
use crate::libs::task::{Task, TaskChanges, TaskId, UserId, ValidDraft};
use chrono::Utc;
use futures_util::future::join_all;
use std::sync::Arc;

pub struct TaskRepository<B: Backend> {
    backend: Arc<B>,
}

impl<B: Backend> Clone for TaskRepository<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: Backend> TaskRepository<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Resolves the signed-in user or fails with `NotAuthenticated`.
    pub async fn current_user(&self) -> Result<User, TaskError> {
        match self.backend.current_user().await {
            Ok(Some(user)) => Ok(user),
            Ok(None) | Err(AuthError::NotAuthorized(_)) => Err(TaskError::NotAuthenticated),
            Err(e) => Err(TaskError::Remote(e.into())),
        }
    }

    /// Fetches (home, bucket) concurrently.
    ///
    /// Home is ordered by `order` ascending, bucket newest first. Rows owned
    /// by anyone else are dropped.
    pub async fn fetch_partitions(&self) -> Result<(Vec<Task>, Vec<Task>), TaskError> {
        let user = self.current_user().await?;
        let home_query = TaskQuery {
            owner: user.id.clone(),
            featured: true,
            sort: TaskSort::ManualAscending,
        };
        let bucket_query = TaskQuery {
            owner: user.id.clone(),
            featured: false,
            sort: TaskSort::NewestFirst,
        };

        tracing::debug!(user = %user.id, "fetching task partitions");
        let (home, bucket) = tokio::try_join!(self.backend.select(&home_query), self.backend.select(&bucket_query))?;

        let mut home = owned_rows(home, &user.id, true);
        let mut bucket = owned_rows(bucket, &user.id, false);
        ordering::sort_home(&mut home);
        ordering::sort_bucket(&mut bucket);

        tracing::debug!(home = home.len(), bucket = bucket.len(), "task partitions fetched");
        Ok((home, bucket))
    }

    /// Persists a validated draft as a new, non-completed task.
    pub async fn create(&self, draft: &ValidDraft) -> Result<Task, TaskError> {
        let user = self.current_user().await?;
        let row = NewTaskRow {
            title: draft.title().to_string(),
            description: draft.description().to_string(),
            group: draft.group().to_string(),
            date: draft.date(),
            featured: draft.is_featured(),
            completed: false,
            user_id: user.id.clone(),
            created_at: Utc::now(),
            order: None,
        };

        tracing::debug!(user = %user.id, title = %row.title, featured = row.featured, "creating task");
        let task = self.backend.insert(&row).await?;
        ensure_owned(&task, &user.id)?;
        Ok(task)
    }

    /// Applies only the supplied fields and returns the full updated row.
    ///
    /// When `completed` is present, `completed_at` is stamped with the current
    /// time (completed) or cleared (not completed).
    pub async fn update(&self, id: &TaskId, changes: &TaskChanges) -> Result<Task, TaskError> {
        let changes = changes.validate()?;
        let user = self.current_user().await?;
        let patch = TaskPatch {
            title: changes.title,
            description: changes.description,
            group: changes.group,
            date: changes.date,
            completed: changes.completed,
            completed_at: changes.completed.map(|done| done.then(Utc::now)),
            featured: changes.featured,
            order: changes.order,
        };

        tracing::debug!(user = %user.id, task = %id, "updating task");
        let task = self.backend.update(&user.id, id, &patch).await?;
        ensure_owned(&task, &user.id)?;
        Ok(task)
    }

    /// Deletes a task. A row that is already gone counts as success.
    pub async fn delete(&self, id: &TaskId) -> Result<DeleteOutcome, TaskError> {
        let user = self.current_user().await?;
        tracing::debug!(user = %user.id, task = %id, "deleting task");
        let outcome = self.backend.delete(&user.id, id).await?;
        if outcome == DeleteOutcome::AlreadyGone {
            tracing::debug!(task = %id, "task was already deleted");
        }
        Ok(outcome)
    }

    /// Persists `sequence` order: position = index.
    ///
    /// All writes are issued concurrently and every one is attempted; failures
    /// are collected into a single `PartialFailure`. Tasks already at their
    /// position are not written. Returns the number of writes performed.
    pub async fn set_order(&self, sequence: &[Task]) -> Result<usize, TaskError> {
        let assignments = ordering::order_assignments(sequence);
        if assignments.is_empty() {
            return Ok(0);
        }

        let user = self.current_user().await?;
        tracing::debug!(user = %user.id, writes = assignments.len(), "persisting task order");

        let writes = assignments.iter().map(|(id, position)| {
            let patch = TaskPatch {
                order: Some(*position),
                ..Default::default()
            };
            let owner = user.id.clone();
            async move { self.backend.update(&owner, id, &patch).await }
        });
        let results = join_all(writes).await;

        let mut succeeded = 0;
        let mut failures = Vec::new();
        for ((id, position), result) in assignments.into_iter().zip(results) {
            match result {
                Ok(_) => succeeded += 1,
                Err(error) => {
                    tracing::warn!(task = %id, position, error = %error, "order update failed");
                    failures.push(OrderFailure { id, position, error });
                }
            }
        }

        if failures.is_empty() {
            Ok(succeeded)
        } else {
            Err(TaskError::PartialFailure { succeeded, failures })
        }
    }
}

fn owned_rows(rows: Vec<Task>, owner: &UserId, featured: bool) -> Vec<Task> {
    rows.into_iter()
        .filter(|task| {
            let keep = &task.user_id == owner && task.featured == featured;
            if !keep {
                tracing::warn!(task = %task.id, "dropping row outside the requested scope");
            }
            keep
        })
        .collect()
}

fn ensure_owned(task: &Task, owner: &UserId) -> Result<(), TaskError> {
    if &task.user_id != owner {
        tracing::warn!(task = %task.id, "remote store returned a row owned by another user");
        return Err(TaskError::Remote(crate::api::RemoteError::Unauthorized(format!(
            "task {} belongs to another user",
            task.id
        ))));
    }
    Ok(())
}
