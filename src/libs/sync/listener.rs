//! Realtime change listener.
//!
//! Subscribes to the change feed of the signed-in user's tasks and answers
//! every insert/update/delete with a full resync of the store. Events that
//! pile up while a resync runs are coalesced into the next one.
//!
//! The subscription is opened before the baseline fetch so that no change
//! between the two is lost, and no event is acted on until the store has been
//! initialized once. A [`TaskStore::reset`] ends the listener right away and
//! closes its subscription.

use super::{StoreState, TaskError, TaskStore};
use crate::api::{Backend, Subscription};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle to a running listener.
///
/// [`ChangeListener::stop`] waits for the worker to exit; once it returns no
/// further resync is triggered. Dropping the handle signals the worker to
/// stop after any resync it is currently running.
pub struct ChangeListener {
    stop: watch::Sender<bool>,
    worker: Option<JoinHandle<()>>,
    resyncs: Arc<AtomicU64>,
}

impl ChangeListener {
    /// Subscribes for the current user, initializes the store and starts
    /// listening.
    pub async fn start<B: Backend>(store: Arc<TaskStore<B>>) -> Result<Self, TaskError> {
        let user = store.repository().current_user().await?;
        let subscription = store.backend().subscribe(&user.id).await?;
        store.initialize().await?;

        let states = store.subscribe();
        let epoch = store.epoch();
        let (stop, stop_rx) = watch::channel(false);
        let resyncs = Arc::new(AtomicU64::new(0));
        let worker = tokio::spawn(listen(store, subscription, epoch, states, stop_rx, Arc::clone(&resyncs)));

        tracing::info!(user = %user.id, "listening for task changes");
        Ok(Self {
            stop,
            worker: Some(worker),
            resyncs,
        })
    }

    /// Number of resyncs completed so far.
    pub fn resyncs(&self) -> u64 {
        self.resyncs.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stops listening and waits for the worker to exit.
    pub async fn stop(mut self) {
        let _ = self.stop.send(true);
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, "change listener ended abnormally");
            }
        }
        tracing::info!("change listener stopped");
    }
}

impl Drop for ChangeListener {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
    }
}

async fn listen<B: Backend>(
    store: Arc<TaskStore<B>>,
    mut subscription: Subscription,
    epoch: u64,
    mut states: watch::Receiver<StoreState>,
    mut stop: watch::Receiver<bool>,
    resyncs: Arc<AtomicU64>,
) {
    loop {
        if store.epoch() != epoch {
            tracing::debug!("store was reset, leaving change feed");
            break;
        }
        let event = tokio::select! {
            biased;
            _ = stop.changed() => break,
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            event = subscription.recv() => event,
        };
        let Some(event) = event else {
            tracing::info!("change feed closed");
            break;
        };

        let mut coalesced = 1;
        while subscription.try_recv().is_some() {
            coalesced += 1;
        }
        if *stop.borrow() || store.epoch() != epoch {
            break;
        }

        tracing::debug!(operation = ?event.operation, coalesced, "task change received");
        match store.resync().await {
            Ok(()) => {
                resyncs.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => tracing::warn!(error = %e, "resync after change failed"),
        }
    }
    subscription.unsubscribe();
}
