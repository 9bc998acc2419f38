//! Capability surface of the hosted backend.
//!
//! The synchronization layer never talks HTTP directly. It consumes three
//! capabilities, each expressed as a trait:
//!
//! - [`AuthProvider`]: sign-up, sign-in, sign-out, profile and password flows
//! - [`TaskTable`]: query/insert/update/delete against the `tasks` table
//! - [`ChangeFeed`]: a subscription to row-change events for one user
//!
//! Implementations:
//!
//! - [`supabase::SupabaseClient`]: the hosted backend-as-a-service
//! - [`memory::MemoryBackend`]: in-process backend used by tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskpin::api::supabase::SupabaseClient;
//! use taskpin::libs::{config::Config, sync::TaskStore, task::Groups};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::read()?;
//! let client = Arc::new(SupabaseClient::from_config(&config)?);
//! let store = TaskStore::new(client, Groups::default());
//! store.initialize().await?;
//! # Ok(())
//! # }
//! ```

use crate::libs::task::{Task, TaskId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub mod memory;
pub mod supabase;

/// Authentication failures, classified the way the provider reports them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("{0}")]
    Unknown(String),
}

/// Failures of the remote store or its transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The request never produced a response (connection, TLS, timeout).
    #[error("Network error: {0}")]
    Transport(String),

    /// The targeted row does not exist or is not visible to the caller.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store refused the caller's credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The store answered with an error status.
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The response could not be decoded.
    #[error("Malformed response: {0}")]
    Decode(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// An authenticated user as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Server-side ordering applied to a partition query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSort {
    /// `order` ascending, unordered rows last.
    ManualAscending,
    /// `created_at` descending.
    NewestFirst,
}

/// A filtered read of the `tasks` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub owner: UserId,
    pub featured: bool,
    pub sort: TaskSort,
}

/// Row sent on insert. The server assigns `id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTaskRow {
    pub title: String,
    pub description: String,
    pub group: String,
    pub date: NaiveDate,
    pub featured: bool,
    pub completed: bool,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

/// Column changes sent on update; absent fields are left untouched.
///
/// `completed_at` is doubly optional: `Some(None)` clears the column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl TaskPatch {
    /// Applies the patch to a row in place.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(group) = &self.group {
            task.group = group.clone();
        }
        if let Some(date) = self.date {
            task.date = date;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(completed_at) = self.completed_at {
            task.completed_at = completed_at;
        }
        if let Some(featured) = self.featured {
            task.featured = featured;
        }
        if let Some(order) = self.order {
            task.order = Some(order);
        }
    }
}

/// Result of a delete: a missing row is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyGone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeOperation {
    Insert,
    Update,
    Delete,
}

/// A row-change notification. Consumers treat it as a trigger only.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub operation: ChangeOperation,
    pub row: Option<Task>,
}

/// A live change-feed subscription.
///
/// Owns the background tasks feeding it; dropping the subscription or
/// calling [`Subscription::unsubscribe`] stops them, after which no event is
/// delivered.
pub struct Subscription {
    events: mpsc::Receiver<ChangeEvent>,
    workers: Vec<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(events: mpsc::Receiver<ChangeEvent>, workers: Vec<JoinHandle<()>>) -> Self {
        Self { events, workers }
    }

    /// Waits for the next event. `None` once the feed has ended.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Returns an already-queued event without waiting.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.events.try_recv().ok()
    }

    pub fn unsubscribe(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.events.close();
        for worker in self.workers.drain(..) {
            worker.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Authentication capability.
pub trait AuthProvider: Send + Sync {
    /// Returns the signed-in user, or `None` when there is no session.
    fn current_user(&self) -> impl Future<Output = Result<Option<User>, AuthError>> + Send;

    fn sign_up(&self, email: &str, password: &str, name: &str) -> impl Future<Output = Result<User, AuthError>> + Send;

    fn sign_in(&self, email: &str, password: &str) -> impl Future<Output = Result<User, AuthError>> + Send;

    fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>> + Send;

    fn update_profile(&self, name: &str) -> impl Future<Output = Result<(), AuthError>> + Send;

    fn update_password(&self, new_password: &str) -> impl Future<Output = Result<(), AuthError>> + Send;

    fn send_password_reset(&self, email: &str) -> impl Future<Output = Result<(), AuthError>> + Send;
}

/// Access to the `tasks` table. Every call is scoped to an owner.
pub trait TaskTable: Send + Sync {
    fn select(&self, query: &TaskQuery) -> impl Future<Output = Result<Vec<Task>, RemoteError>> + Send;

    fn insert(&self, row: &NewTaskRow) -> impl Future<Output = Result<Task, RemoteError>> + Send;

    /// Updates one row owned by `owner`; `NotFound` when no such row exists.
    fn update(&self, owner: &UserId, id: &TaskId, patch: &TaskPatch) -> impl Future<Output = Result<Task, RemoteError>> + Send;

    fn delete(&self, owner: &UserId, id: &TaskId) -> impl Future<Output = Result<DeleteOutcome, RemoteError>> + Send;
}

/// Row-change notifications for one user's tasks.
pub trait ChangeFeed: Send + Sync {
    fn subscribe(&self, owner: &UserId) -> impl Future<Output = Result<Subscription, RemoteError>> + Send;
}

/// Everything the synchronization layer needs from a backend.
pub trait Backend: AuthProvider + TaskTable + ChangeFeed + 'static {}

impl<T> Backend for T where T: AuthProvider + TaskTable + ChangeFeed + 'static {}
