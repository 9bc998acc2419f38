//! Core library modules.
//!
//! - [`task`]: the task entity, drafts, change sets and groups
//! - [`sync`]: repository, ordering rules, store and realtime listener
//! - [`productivity`]: analytics derived from the task list
//! - [`config`], [`data_storage`], [`secret`]: configuration and at-rest state
//! - [`messages`], [`view`], [`export`]: console output and file export

pub mod config;
pub mod data_storage;
pub mod export;
pub mod messages;
pub mod productivity;
pub mod secret;
pub mod sync;
pub mod task;
pub mod view;
