//! In-process backend for tests.
//!
//! Implements [`AuthProvider`], [`TaskTable`] and [`ChangeFeed`] over shared
//! in-memory state. Every write publishes a [`ChangeEvent`] to subscribers of
//! the owning user, exactly like the hosted feed does, so a second
//! "device" can be simulated by writing through the same backend.
//!
//! Faults can be injected per operation, per task (order updates) or for the
//! whole backend (offline), and an artificial latency makes concurrent calls
//! overlap.

use super::{
    AuthError, AuthProvider, ChangeEvent, ChangeFeed, ChangeOperation, DeleteOutcome, NewTaskRow, RemoteError, Subscription,
    TaskPatch, TaskQuery, TaskSort, TaskTable, User,
};
use crate::libs::sync::ordering;
use crate::libs::task::{Task, TaskId, UserId};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Operations that can be made to fail once via [`MemoryBackend::fail_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
    Subscribe,
}

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password: String,
}

#[derive(Default)]
struct State {
    accounts: HashMap<String, Account>,
    session: Option<User>,
    rows: Vec<Task>,
    next_id: u64,
}

#[derive(Default)]
struct Faults {
    offline: bool,
    queued: VecDeque<(Operation, RemoteError)>,
    failing_tasks: HashSet<TaskId>,
    latency: Option<Duration>,
}

pub struct MemoryBackend {
    state: Mutex<State>,
    faults: Mutex<Faults>,
    changes: broadcast::Sender<(UserId, ChangeEvent)>,
    selects: AtomicUsize,
    updates: AtomicUsize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(256);
        Self {
            state: Mutex::new(State::default()),
            faults: Mutex::new(Faults::default()),
            changes,
            selects: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
        }
    }

    /// Creates a backend with one registered and signed-in user.
    pub fn with_user(email: &str, password: &str, name: &str) -> Self {
        let backend = Self::new();
        let user = backend.register(email, password, name);
        backend.state.lock().session = Some(user);
        backend
    }

    fn register(&self, email: &str, password: &str, name: &str) -> User {
        let mut state = self.state.lock();
        state.next_id += 1;
        let user = User {
            id: UserId::new(format!("user-{}", state.next_id)),
            email: email.to_string(),
            name: Some(name.to_string()),
        };
        state.accounts.insert(
            email.to_lowercase(),
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    pub fn session_user(&self) -> Option<User> {
        self.state.lock().session.clone()
    }

    /// Every stored row, regardless of owner.
    pub fn rows(&self) -> Vec<Task> {
        self.state.lock().rows.clone()
    }

    pub fn row(&self, id: &TaskId) -> Option<Task> {
        self.state.lock().rows.iter().find(|t| &t.id == id).cloned()
    }

    /// Number of `select` calls served so far.
    pub fn select_calls(&self) -> usize {
        self.selects.load(Ordering::SeqCst)
    }

    /// Number of `update` calls served so far.
    pub fn update_calls(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Number of change feed subscriptions still open.
    pub fn open_subscriptions(&self) -> usize {
        self.changes.receiver_count()
    }

    /// Makes the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: Operation, error: RemoteError) {
        self.faults.lock().queued.push_back((operation, error));
    }

    /// Makes every update of `id` fail until cleared.
    pub fn fail_updates_of(&self, id: &TaskId) {
        self.faults.lock().failing_tasks.insert(id.clone());
    }

    pub fn set_offline(&self, offline: bool) {
        self.faults.lock().offline = offline;
    }

    pub fn set_latency(&self, latency: Option<Duration>) {
        self.faults.lock().latency = latency;
    }

    /// Inserts a row directly, as another client would, and notifies
    /// subscribers. Used to seed data or simulate foreign writes.
    pub fn seed(&self, row: Task) {
        self.state.lock().rows.push(row.clone());
        self.publish(&row.user_id.clone(), ChangeOperation::Insert, Some(row));
    }

    async fn enter(&self, operation: Operation) -> Result<(), RemoteError> {
        let latency = self.faults.lock().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut faults = self.faults.lock();
        if faults.offline {
            return Err(RemoteError::Transport("backend is offline".to_string()));
        }
        if let Some(index) = faults.queued.iter().position(|(op, _)| *op == operation) {
            if let Some((_, error)) = faults.queued.remove(index) {
                return Err(error);
            }
        }
        Ok(())
    }

    fn publish(&self, owner: &UserId, operation: ChangeOperation, row: Option<Task>) {
        // No subscribers is not an error.
        let _ = self.changes.send((owner.clone(), ChangeEvent { operation, row }));
    }
}

impl AuthProvider for MemoryBackend {
    async fn current_user(&self) -> Result<Option<User>, AuthError> {
        Ok(self.session_user())
    }

    async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<User, AuthError> {
        if self.state.lock().accounts.contains_key(&email.to_lowercase()) {
            return Err(AuthError::Unknown("User already registered".to_string()));
        }
        let user = self.register(email, password, name);
        self.state.lock().session = Some(user.clone());
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let mut state = self.state.lock();
        let account = state.accounts.get(&email.to_lowercase()).cloned().ok_or(AuthError::UserNotFound)?;
        if account.password != password {
            return Err(AuthError::InvalidCredentials);
        }
        state.session = Some(account.user.clone());
        Ok(account.user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.state.lock().session = None;
        Ok(())
    }

    async fn update_profile(&self, name: &str) -> Result<(), AuthError> {
        let mut state = self.state.lock();
        let user = state.session.as_mut().ok_or_else(|| AuthError::NotAuthorized("no session".to_string()))?;
        user.name = Some(name.to_string());
        let updated = user.clone();
        if let Some(account) = state.accounts.get_mut(&updated.email.to_lowercase()) {
            account.user = updated;
        }
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> Result<(), AuthError> {
        let mut state = self.state.lock();
        let email = state
            .session
            .as_ref()
            .map(|u| u.email.to_lowercase())
            .ok_or_else(|| AuthError::NotAuthorized("no session".to_string()))?;
        if let Some(account) = state.accounts.get_mut(&email) {
            account.password = new_password.to_string();
        }
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        if self.state.lock().accounts.contains_key(&email.to_lowercase()) {
            Ok(())
        } else {
            Err(AuthError::UserNotFound)
        }
    }
}

impl TaskTable for MemoryBackend {
    async fn select(&self, query: &TaskQuery) -> Result<Vec<Task>, RemoteError> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        self.enter(Operation::Select).await?;

        let mut rows: Vec<Task> = self
            .state
            .lock()
            .rows
            .iter()
            .filter(|t| t.user_id == query.owner && t.featured == query.featured)
            .cloned()
            .collect();
        match query.sort {
            TaskSort::ManualAscending => ordering::sort_home(&mut rows),
            TaskSort::NewestFirst => ordering::sort_bucket(&mut rows),
        }
        Ok(rows)
    }

    async fn insert(&self, row: &NewTaskRow) -> Result<Task, RemoteError> {
        self.enter(Operation::Insert).await?;

        let task = {
            let mut state = self.state.lock();
            state.next_id += 1;
            let task = Task {
                id: TaskId::new(uuid::Uuid::new_v4().to_string()),
                title: row.title.clone(),
                description: row.description.clone(),
                group: row.group.clone(),
                date: row.date,
                completed: row.completed,
                completed_at: None,
                featured: row.featured,
                created_at: row.created_at,
                user_id: row.user_id.clone(),
                order: row.order,
            };
            state.rows.push(task.clone());
            task
        };
        self.publish(&task.user_id, ChangeOperation::Insert, Some(task.clone()));
        Ok(task)
    }

    async fn update(&self, owner: &UserId, id: &TaskId, patch: &TaskPatch) -> Result<Task, RemoteError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.enter(Operation::Update).await?;
        if self.faults.lock().failing_tasks.contains(id) {
            return Err(RemoteError::Rejected {
                status: 500,
                message: format!("update of {} failed", id),
            });
        }

        let task = {
            let mut state = self.state.lock();
            let task = state
                .rows
                .iter_mut()
                .find(|t| &t.id == id && &t.user_id == owner)
                .ok_or_else(|| RemoteError::NotFound(format!("task {}", id)))?;
            patch.apply_to(task);
            task.clone()
        };
        self.publish(owner, ChangeOperation::Update, Some(task.clone()));
        Ok(task)
    }

    async fn delete(&self, owner: &UserId, id: &TaskId) -> Result<DeleteOutcome, RemoteError> {
        self.enter(Operation::Delete).await?;

        let removed = {
            let mut state = self.state.lock();
            let position = state.rows.iter().position(|t| &t.id == id && &t.user_id == owner);
            position.map(|index| state.rows.remove(index))
        };
        match removed {
            Some(task) => {
                self.publish(owner, ChangeOperation::Delete, Some(task));
                Ok(DeleteOutcome::Deleted)
            }
            None => Ok(DeleteOutcome::AlreadyGone),
        }
    }
}

impl ChangeFeed for MemoryBackend {
    async fn subscribe(&self, owner: &UserId) -> Result<Subscription, RemoteError> {
        self.enter(Operation::Subscribe).await?;

        let mut changes = self.changes.subscribe();
        let (tx, rx) = mpsc::channel(64);
        let owner = owner.clone();
        let forwarder = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok((user, event)) if user == owner => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "change subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Ok(Subscription::new(rx, vec![forwarder]))
    }
}
