//! Client-side task synchronization.
//!
//! Layers, leaves first:
//!
//! - [`repository::TaskRepository`]: typed, user-scoped calls against the
//!   remote `tasks` table
//! - [`ordering`]: pure ordering and partition rules
//! - [`store::TaskStore`]: the in-memory home/bucket partitions and every
//!   mutation that touches them
//! - [`listener::ChangeListener`]: resynchronizes the store on remote changes
//!
//! All of them report failures as [`TaskError`].

pub mod listener;
pub mod ordering;
pub mod repository;
pub mod store;

pub use listener::ChangeListener;
pub use repository::TaskRepository;
pub use store::{StoreState, SyncPhase, TaskSnapshot, TaskStore};

use crate::api::{AuthError, RemoteError};
use crate::libs::task::TaskId;

/// One failed write inside a batched order update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFailure {
    pub id: TaskId,
    pub position: i64,
    pub error: RemoteError,
}

/// Errors surfaced by the synchronization layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// Client-side rule violation; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// The featured partition is full.
    #[error("Maximum of {capacity} featured tasks allowed")]
    CapacityExceeded { capacity: usize },

    /// An operation needed a signed-in user and there was none.
    #[error("Authentication required")]
    NotAuthenticated,

    #[error(transparent)]
    Remote(RemoteError),

    /// Some writes of a batched order update failed.
    #[error("Reorder failed for {} of {} tasks", failures.len(), failures.len() + succeeded)]
    PartialFailure { succeeded: usize, failures: Vec<OrderFailure> },
}

impl From<RemoteError> for TaskError {
    /// A session the backend no longer accepts means the user is signed out.
    fn from(error: RemoteError) -> Self {
        match error {
            RemoteError::Auth(AuthError::NotAuthorized(_)) => TaskError::NotAuthenticated,
            other => TaskError::Remote(other),
        }
    }
}
