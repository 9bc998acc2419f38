//! Pure ordering and partition rules used by the task store.
//!
//! Nothing here touches the network. The store calls these functions to
//! decide what to persist and how to lay out its in-memory partitions.

use super::TaskError;
use crate::libs::task::{Partition, Task, TaskId, FEATURED_CAPACITY};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Orders home tasks by explicit `order` ascending; tasks without an order
/// follow, oldest first.
pub fn sort_home(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| match (a.order, b.order) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.created_at.cmp(&b.created_at)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.created_at.cmp(&b.created_at),
    });
}

/// Orders bucket tasks by creation time, most recent first.
pub fn sort_bucket(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Fails with `CapacityExceeded` when `home_len` leaves no room for one more
/// featured task.
pub fn ensure_capacity(home_len: usize) -> Result<(), TaskError> {
    if home_len >= FEATURED_CAPACITY {
        return Err(TaskError::CapacityExceeded {
            capacity: FEATURED_CAPACITY,
        });
    }
    Ok(())
}

/// Determines which partition a reorder sequence targets.
///
/// Returns `None` for an empty sequence and rejects sequences that mix
/// featured and non-featured tasks.
pub fn sequence_partition(sequence: &[Task]) -> Result<Option<Partition>, TaskError> {
    let Some(first) = sequence.first() else {
        return Ok(None);
    };
    if sequence.iter().any(|t| t.featured != first.featured) {
        return Err(TaskError::Validation("Cannot reorder featured and non-featured tasks together".to_string()));
    }
    Ok(Some(first.partition()))
}

/// Checks that `sequence` is a permutation of `current`.
pub fn ensure_same_members(sequence: &[Task], current: &[Task]) -> Result<(), TaskError> {
    let proposed: HashSet<&TaskId> = sequence.iter().map(|t| &t.id).collect();
    let existing: HashSet<&TaskId> = current.iter().map(|t| &t.id).collect();
    if proposed.len() != sequence.len() {
        return Err(TaskError::Validation("Reorder sequence contains duplicate tasks".to_string()));
    }
    if proposed != existing {
        return Err(TaskError::Validation(
            "Reorder sequence must contain exactly the tasks of one partition".to_string(),
        ));
    }
    Ok(())
}

/// Positions to persist for `sequence`: index per task, skipping tasks whose
/// stored order already matches.
pub fn order_assignments(sequence: &[Task]) -> Vec<(TaskId, i64)> {
    sequence
        .iter()
        .enumerate()
        .filter_map(|(index, task)| {
            let position = index as i64;
            (task.order != Some(position)).then(|| (task.id.clone(), position))
        })
        .collect()
}

/// Returns `sequence` with each task's `order` set to its index.
pub fn with_positions(sequence: Vec<Task>) -> Vec<Task> {
    sequence
        .into_iter()
        .enumerate()
        .map(|(index, mut task)| {
            task.order = Some(index as i64);
            task
        })
        .collect()
}

/// Moves the task `id` to `target` within `sequence` (drag and drop).
///
/// `target` past the end places the task last. Unknown ids are rejected.
pub fn move_item(sequence: &[Task], id: &TaskId, target: usize) -> Result<Vec<Task>, TaskError> {
    let from = sequence
        .iter()
        .position(|t| &t.id == id)
        .ok_or_else(|| TaskError::Validation(format!("Task {} is not in this list", id)))?;

    let mut moved = sequence.to_vec();
    let task = moved.remove(from);
    let target = target.min(moved.len());
    moved.insert(target, task);
    Ok(moved)
}

/// Removes `id` from both partitions; returns whether anything was removed.
pub fn remove_everywhere(home: &mut Vec<Task>, bucket: &mut Vec<Task>, id: &TaskId) -> bool {
    let before = home.len() + bucket.len();
    home.retain(|t| &t.id != id);
    bucket.retain(|t| &t.id != id);
    before != home.len() + bucket.len()
}

/// Puts a server-returned row into the partition matching its flag.
///
/// An existing copy is replaced in place when the task stays in the same
/// partition; otherwise it is removed and the row is appended to the other
/// partition.
pub fn place_row(home: &mut Vec<Task>, bucket: &mut Vec<Task>, row: Task) {
    let (target, other) = match row.partition() {
        Partition::Home => (home, bucket),
        Partition::Bucket => (bucket, home),
    };
    other.retain(|t| t.id != row.id);
    match target.iter_mut().find(|t| t.id == row.id) {
        Some(slot) => *slot = row,
        None => target.push(row),
    }
}
