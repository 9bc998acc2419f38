//! # Taskpin
//!
//! A personal task board on top of a hosted backend: create tasks in groups,
//! pin up to three of them to the home view, reorder, complete and analyze
//! productivity, with changes from other devices applied live.
//!
//! ## Layout
//!
//! - [`api`]: backend capabilities (auth, `tasks` table, change feed) and
//!   their hosted and in-memory implementations
//! - [`libs`]: the synchronization layer, analytics and ambient services
//! - [`commands`]: the command-line interface
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taskpin::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod api;
pub mod commands;
pub mod libs;
