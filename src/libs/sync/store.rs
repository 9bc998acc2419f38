//! The task synchronization store.
//!
//! [`TaskStore`] owns the two in-memory partitions (home and bucket) and
//! mediates every mutation through the [`TaskRepository`]. It is an explicit
//! state container: construct one per signed-in session, share it behind an
//! `Arc`, and call [`TaskStore::reset`] on sign-out.
//!
//! ## State machine
//!
//! ```text
//! Uninitialized ──initialize──▶ Loading ──ok──▶ Ready ──mutation──▶ Loading
//!       ▲                          │                                  │
//!       │                          └──err──▶ Error ◀────────err───────┘
//!       └───────────── reset ──────────────────────────────────────────
//! ```
//!
//! On failure the partitions keep their last-known-good contents; only the
//! error message changes. Validation and capacity rejections happen before
//! any network call.
//!
//! Every remote round trip is tagged with the store's epoch. [`TaskStore::reset`]
//! bumps the epoch, so results of calls that were in flight for the previous
//! session are discarded instead of repopulating the cleared store.

use super::{ordering, TaskError, TaskRepository};
use crate::api::{Backend, DeleteOutcome};
use crate::libs::task::{Groups, Partition, Task, TaskChanges, TaskDraft, TaskId};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SyncPhase {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    Error,
}

/// Full in-memory state of the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub home: Vec<Task>,
    pub bucket: Vec<Task>,
    pub phase: SyncPhase,
    pub error: Option<String>,
    pub initialized: bool,
    in_flight: usize,
}

impl StoreState {
    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn partition(&self, partition: Partition) -> &[Task] {
        match partition {
            Partition::Home => &self.home,
            Partition::Bucket => &self.bucket,
        }
    }

    fn partition_mut(&mut self, partition: Partition) -> &mut Vec<Task> {
        match partition {
            Partition::Home => &mut self.home,
            Partition::Bucket => &mut self.bucket,
        }
    }

    /// The UI-facing view of this state.
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            home_tasks: self.home.clone(),
            all_tasks: self.bucket.clone(),
            loading: self.loading(),
            error: self.error.clone(),
            initialized: self.initialized,
        }
    }

    fn settle_phase(&mut self) {
        self.phase = if self.in_flight > 0 {
            SyncPhase::Loading
        } else if self.error.is_some() {
            SyncPhase::Error
        } else if self.initialized {
            SyncPhase::Ready
        } else {
            SyncPhase::Uninitialized
        };
    }
}

/// Client-visible state shape for UI binding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    pub home_tasks: Vec<Task>,
    pub all_tasks: Vec<Task>,
    pub loading: bool,
    pub error: Option<String>,
    pub initialized: bool,
}

pub struct TaskStore<B: Backend> {
    repository: TaskRepository<B>,
    groups: RwLock<Groups>,
    state: watch::Sender<StoreState>,
    epoch: AtomicU64,
    init_lock: tokio::sync::Mutex<()>,
    init_attempts: AtomicU64,
    last_init_error: Mutex<Option<TaskError>>,
}

impl<B: Backend> TaskStore<B> {
    pub fn new(backend: Arc<B>, groups: Groups) -> Self {
        Self {
            repository: TaskRepository::new(backend),
            groups: RwLock::new(groups),
            state: watch::Sender::new(StoreState::default()),
            epoch: AtomicU64::new(0),
            init_lock: tokio::sync::Mutex::new(()),
            init_attempts: AtomicU64::new(0),
            last_init_error: Mutex::new(None),
        }
    }

    pub fn repository(&self) -> &TaskRepository<B> {
        &self.repository
    }

    pub fn backend(&self) -> &Arc<B> {
        self.repository.backend()
    }

    /// Receives every state change.
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> StoreState {
        self.state.borrow().clone()
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        self.state.borrow().snapshot()
    }

    pub fn home_tasks(&self) -> Vec<Task> {
        self.state.borrow().home.clone()
    }

    pub fn all_tasks(&self) -> Vec<Task> {
        self.state.borrow().bucket.clone()
    }

    /// Home followed by bucket; the input of every analytics function.
    pub fn tasks(&self) -> Vec<Task> {
        let state = self.state.borrow();
        state.home.iter().chain(state.bucket.iter()).cloned().collect()
    }

    pub fn partition(&self, partition: Partition) -> Vec<Task> {
        self.state.borrow().partition(partition).to_vec()
    }

    pub fn find(&self, id: &TaskId) -> Option<Task> {
        let state = self.state.borrow();
        state.home.iter().chain(state.bucket.iter()).find(|t| &t.id == id).cloned()
    }

    pub fn phase(&self) -> SyncPhase {
        self.state.borrow().phase
    }

    pub fn is_initialized(&self) -> bool {
        self.state.borrow().initialized
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn groups(&self) -> Groups {
        self.groups.read().clone()
    }

    pub fn set_groups(&self, groups: Groups) {
        *self.groups.write() = groups;
    }

    /// Current session epoch; changes on every [`TaskStore::reset`].
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Loads both partitions once.
    ///
    /// A no-op when already initialized. Callers arriving while a first load
    /// is in flight wait for it and share its outcome instead of fetching
    /// again.
    pub async fn initialize(&self) -> Result<(), TaskError> {
        if self.is_initialized() {
            return Ok(());
        }

        let attempt = self.init_attempts.load(Ordering::SeqCst);
        let _guard = self.init_lock.lock().await;
        if self.is_initialized() {
            return Ok(());
        }
        if self.init_attempts.load(Ordering::SeqCst) != attempt {
            let previous = self.last_init_error.lock().clone();
            if let Some(error) = previous {
                return Err(error);
            }
        }

        let result = self.fetch(true).await;
        *self.last_init_error.lock() = result.as_ref().err().cloned();
        self.init_attempts.fetch_add(1, Ordering::SeqCst);
        if result.is_ok() {
            tracing::info!("task store initialized");
        }
        result
    }

    /// Re-fetches both partitions and replaces them wholesale.
    pub async fn resync(&self) -> Result<(), TaskError> {
        self.fetch(false).await
    }

    /// Creates a task and appends it to the partition matching its flag.
    ///
    /// A featured draft loads the store first so capacity is counted against
    /// the real home partition.
    pub async fn add_task(&self, draft: &TaskDraft) -> Result<Task, TaskError> {
        let valid = match draft.validate(&self.groups()) {
            Ok(valid) => valid,
            Err(e) => return Err(self.reject(e)),
        };
        if valid.is_featured() {
            self.initialize().await?;
            let home_len = self.home_len();
            if let Err(e) = ordering::ensure_capacity(home_len) {
                return Err(self.reject(e));
            }
        }

        let epoch = self.begin();
        match self.repository.create(&valid).await {
            Ok(task) => {
                let row = task.clone();
                self.settle(epoch, move |s| ordering::place_row(&mut s.home, &mut s.bucket, row));
                Ok(task)
            }
            Err(e) => Err(self.fail(epoch, e)),
        }
    }

    /// Applies `changes` remotely and replaces the local copy with the
    /// returned row.
    ///
    /// Turning `featured` on for a bucket task is capacity-checked like
    /// [`TaskStore::move_to_featured`]; a row whose flag changed moves to the
    /// other partition.
    pub async fn update_task(&self, id: &TaskId, changes: &TaskChanges) -> Result<Task, TaskError> {
        let changes = match changes.validate() {
            Ok(changes) => changes,
            Err(e) => return Err(self.reject(e)),
        };
        if changes.featured == Some(true) {
            self.initialize().await?;
            let (in_home, home_len) = self.home_membership(id);
            if !in_home {
                if let Err(e) = ordering::ensure_capacity(home_len) {
                    return Err(self.reject(e));
                }
            }
        }

        let epoch = self.begin();
        match self.repository.update(id, &changes).await {
            Ok(task) => {
                let row = task.clone();
                self.settle(epoch, move |s| ordering::place_row(&mut s.home, &mut s.bucket, row));
                Ok(task)
            }
            Err(e) => Err(self.fail(epoch, e)),
        }
    }

    /// Pins a task to home, re-checking capacity at call time, then resyncs.
    pub async fn move_to_featured(&self, id: &TaskId) -> Result<(), TaskError> {
        self.initialize().await?;
        let (in_home, home_len) = self.home_membership(id);
        if in_home {
            return Ok(());
        }
        if let Err(e) = ordering::ensure_capacity(home_len) {
            return Err(self.reject(e));
        }
        self.move_and_resync(id, true).await
    }

    /// Unpins a task back to the bucket, then resyncs.
    pub async fn move_to_bucket(&self, id: &TaskId) -> Result<(), TaskError> {
        let in_bucket = self.state.borrow().bucket.iter().any(|t| &t.id == id);
        if in_bucket {
            return Ok(());
        }
        self.move_and_resync(id, false).await
    }

    /// Persists a new order for exactly one partition and adopts it locally
    /// without re-fetching.
    ///
    /// The partition is taken from the tasks' `featured` flag; mixed
    /// sequences and sequences that are not a permutation of the current
    /// partition are rejected.
    pub async fn reorder(&self, sequence: &[Task]) -> Result<(), TaskError> {
        let partition = match ordering::sequence_partition(sequence) {
            Ok(Some(partition)) => partition,
            Ok(None) => return Ok(()),
            Err(e) => return Err(self.reject(e)),
        };
        let current = self.partition(partition);
        if let Err(e) = ordering::ensure_same_members(sequence, &current) {
            return Err(self.reject(e));
        }

        let ordered: Vec<Task> = sequence
            .iter()
            .filter_map(|wanted| current.iter().find(|t| t.id == wanted.id).cloned())
            .collect();

        let epoch = self.begin();
        match self.repository.set_order(&ordered).await {
            Ok(written) => {
                tracing::debug!(%partition, written, "partition reordered");
                let ordered = ordering::with_positions(ordered);
                self.settle(epoch, move |s| *s.partition_mut(partition) = ordered);
                Ok(())
            }
            Err(e) => Err(self.fail(epoch, e)),
        }
    }

    /// Deletes a task and removes it from whichever partition holds it.
    pub async fn delete_task(&self, id: &TaskId) -> Result<DeleteOutcome, TaskError> {
        let epoch = self.begin();
        match self.repository.delete(id).await {
            Ok(outcome) => {
                let id = id.clone();
                self.settle(epoch, move |s| {
                    ordering::remove_everywhere(&mut s.home, &mut s.bucket, &id);
                });
                Ok(outcome)
            }
            Err(e) => Err(self.fail(epoch, e)),
        }
    }

    /// Clears both partitions and the initialized flag.
    ///
    /// Results of calls still in flight are discarded when they complete.
    pub fn reset(&self) {
        *self.last_init_error.lock() = None;
        self.state.send_modify(|s| {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            *s = StoreState::default();
        });
        tracing::info!("task store reset");
    }

    async fn fetch(&self, mark_initialized: bool) -> Result<(), TaskError> {
        let epoch = self.begin();
        match self.repository.fetch_partitions().await {
            Ok((home, bucket)) => {
                self.settle(epoch, move |s| {
                    s.home = home;
                    s.bucket = bucket;
                    if mark_initialized {
                        s.initialized = true;
                    }
                });
                Ok(())
            }
            Err(e) => Err(self.fail(epoch, e)),
        }
    }

    async fn move_and_resync(&self, id: &TaskId, featured: bool) -> Result<(), TaskError> {
        let epoch = self.begin();
        let result = async {
            self.repository.update(id, &TaskChanges::featured(featured)).await?;
            self.repository.fetch_partitions().await
        }
        .await;

        match result {
            Ok((home, bucket)) => {
                self.settle(epoch, move |s| {
                    s.home = home;
                    s.bucket = bucket;
                });
                Ok(())
            }
            Err(e) => Err(self.fail(epoch, e)),
        }
    }

    fn home_len(&self) -> usize {
        self.state.borrow().home.len()
    }

    fn home_membership(&self, id: &TaskId) -> (bool, usize) {
        let state = self.state.borrow();
        (state.home.iter().any(|t| &t.id == id), state.home.len())
    }

    /// Enters `Loading` and returns the epoch the call belongs to.
    ///
    /// The epoch is read under the state lock that `reset` bumps it under.
    fn begin(&self) -> u64 {
        let mut epoch = 0;
        self.state.send_modify(|s| {
            epoch = self.epoch();
            s.in_flight += 1;
            s.error = None;
            s.settle_phase();
        });
        epoch
    }

    /// Applies a successful round trip unless the store was reset meanwhile.
    fn settle(&self, epoch: u64, apply: impl FnOnce(&mut StoreState)) {
        let applied = self.state.send_if_modified(|s| {
            if self.epoch() != epoch {
                return false;
            }
            apply(s);
            s.in_flight = s.in_flight.saturating_sub(1);
            s.settle_phase();
            true
        });
        if !applied {
            tracing::debug!("discarding result from a previous session");
        }
    }

    /// Records a failed round trip; partitions are left untouched.
    fn fail(&self, epoch: u64, error: TaskError) -> TaskError {
        tracing::warn!(error = %error, "task operation failed");
        let message = error.to_string();
        self.state.send_if_modified(|s| {
            if self.epoch() != epoch {
                return false;
            }
            s.in_flight = s.in_flight.saturating_sub(1);
            s.error = Some(message);
            s.settle_phase();
            true
        });
        error
    }

    /// Records a rejection that happened before any network call.
    fn reject(&self, error: TaskError) -> TaskError {
        tracing::debug!(error = %error, "task operation rejected");
        let message = error.to_string();
        self.state.send_modify(|s| {
            s.error = Some(message);
            s.settle_phase();
        });
        error
    }
}
