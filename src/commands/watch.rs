//! Live view of the task lists.
//!
//! Opens the change feed, prints both partitions and reprints them whenever
//! a change from another device has been synced, until Ctrl-C or SIGTERM.

use super::task::print_partition;
use super::{open_client, task_failure};
use crate::libs::messages::Message;
use crate::libs::sync::{ChangeListener, StoreState, SyncPhase, TaskStore};
use crate::libs::task::{Partition, Task};
use crate::{msg_error, msg_info, msg_warning};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::oneshot;

pub async fn cmd() -> Result<()> {
    let (config, client) = open_client()?;
    let store = Arc::new(TaskStore::new(client, config.groups()));
    let listener = ChangeListener::start(Arc::clone(&store)).await.map_err(task_failure)?;

    msg_info!(Message::WatchStarted);
    let mut states = store.subscribe();
    let mut shown = print_state(&states.borrow_and_update());

    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
    tokio::spawn(wait_for_signal(shutdown_tx));

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                if state.phase != SyncPhase::Ready || (state.home == shown.0 && state.bucket == shown.1) {
                    continue;
                }
                msg_info!(Message::WatchResynced(state.home.len(), state.bucket.len()));
                shown = print_state(&state);
            }
        }
    }

    listener.stop().await;
    msg_info!(Message::WatchStopped);
    Ok(())
}

fn print_state(state: &StoreState) -> (Vec<Task>, Vec<Task>) {
    print_partition(Partition::Home, &state.home);
    print_partition(Partition::Bucket, &state.bucket);
    (state.home.clone(), state.bucket.clone())
}

async fn wait_for_signal(shutdown: oneshot::Sender<()>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => msg_info!(Message::WatchReceivedSigterm),
                    _ = sigint.recv() => msg_info!(Message::WatchReceivedCtrlC),
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                msg_error!(Message::WatchSignalListenFailed(e.to_string()));
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;

    let _ = shutdown.send(());
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => msg_info!(Message::WatchReceivedCtrlC),
        Err(e) => {
            msg_warning!(Message::WatchSignalListenFailed(e.to_string()));
            std::future::pending::<()>().await;
        }
    }
}
