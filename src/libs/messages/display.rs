//! Text of every [`Message`].

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let s = match self {
            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved".to_string(),
            Message::ConfigModuleBackend => "Backend settings".to_string(),
            Message::ConfigModuleAnalytics => "Analytics settings".to_string(),
            Message::BackendNotConfigured => "Backend is not configured. Run `taskpin init` or set TASKPIN_URL and TASKPIN_ANON_KEY".to_string(),
            Message::PromptSelectModules => "Select the settings to configure".to_string(),
            Message::PromptBackendUrl => "Project URL".to_string(),
            Message::PromptBackendAnonKey => "Anon key".to_string(),
            Message::PromptTrendDays => "Days shown in the trend".to_string(),
            Message::PromptTrendLeadDays => "Days before today the trend starts".to_string(),

            // === ACCOUNT MESSAGES ===
            Message::PromptEmail => "Email".to_string(),
            Message::PromptName => "Name".to_string(),
            Message::PromptPassword => "Password".to_string(),
            Message::PromptNewPassword => "New password".to_string(),
            Message::SignedUp(email) => format!("Account created for {}", email),
            Message::SignUpPendingConfirmation(email) => format!("Check {} to confirm your account, then log in", email),
            Message::SignedIn(name) => format!("Signed in as {}", name),
            Message::SignedOut => "Signed out".to_string(),
            Message::NotSignedIn => "You are not signed in. Run `taskpin login`".to_string(),
            Message::ProfileUpdated(name) => format!("Profile updated: {}", name),
            Message::PasswordUpdated => "Password updated".to_string(),
            Message::PasswordResetSent(email) => format!("Password reset link sent to {}", email),
            Message::NothingToUpdate => "Nothing to update".to_string(),
            Message::AuthFailed(reason) => format!("Authentication failed: {}", reason),

            // === TASK MESSAGES ===
            Message::TaskCreated(title) => format!("Task '{}' created", title),
            Message::TaskUpdated(title) => format!("Task '{}' updated", title),
            Message::TaskCompleted(title) => format!("Task '{}' completed", title),
            Message::TaskReopened(title) => format!("Task '{}' reopened", title),
            Message::TaskPinned(title) => format!("Task '{}' pinned to home", title),
            Message::TaskUnpinned(title) => format!("Task '{}' moved back to the bucket", title),
            Message::TaskMoved(title, position) => format!("Task '{}' moved to position {}", title, position),
            Message::BucketNotReorderable(title) => format!(
                "Task '{}' is not pinned; the bucket is always listed newest first",
                title
            ),
            Message::TaskDeleted(title) => format!("Task '{}' deleted", title),
            Message::TaskAlreadyDeleted(id) => format!("Task {} was already deleted", id),
            Message::TaskNotFound(id) => format!("No task matches '{}'", id),
            Message::TaskIdAmbiguous(id, count) => format!("'{}' matches {} tasks, use a longer id", id, count),
            Message::ConfirmDeleteTask(title) => format!("Delete task '{}'?", title),
            Message::NoChangesProvided => "No changes provided".to_string(),
            Message::InvalidDate(input) => format!("Invalid date '{}', expected YYYY-MM-DD", input),
            Message::HomeHeader(count, capacity) => format!("📌 Home ({}/{})", count, capacity),
            Message::BucketHeader(count) => format!("🗂  Bucket ({})", count),
            Message::NoTasks => "No tasks".to_string(),
            Message::TaskOperationFailed(reason) => reason.to_string(),

            // === WATCH MESSAGES ===
            Message::WatchStarted => "Watching for task changes. Press Ctrl-C to stop".to_string(),
            Message::WatchStopped => "Stopped watching".to_string(),
            Message::WatchResynced(home, bucket) => format!("Synced: {} pinned, {} in bucket", home, bucket),
            Message::WatchReceivedCtrlC => "Received Ctrl-C, stopping".to_string(),
            Message::WatchReceivedSigterm => "Received SIGTERM, stopping".to_string(),
            Message::WatchSignalListenFailed(e) => format!("Unable to listen for shutdown signal: {}", e),

            // === ANALYTICS MESSAGES ===
            Message::ReportHeader(from, to) => format!("Productivity from {} to {}", from, to),
            Message::ProductivityScore(score, band) => format!("Score: {}% ({})", score, band),
            Message::AnalyticsHeader => "Task statistics".to_string(),
            Message::CategoriesHeader => "By category".to_string(),
            Message::TrendHeader(days) => format!("Completion trend ({} days)", days),
            Message::InvalidDateRange(from, to) => format!("Start date {} is after end date {}", from, to),

            // === EXPORT MESSAGES ===
            Message::ExportCompleted(path) => format!("Exported to {}", path),
            Message::ExportNoData => "There are no tasks to export".to_string(),
            Message::ExportFailed(reason) => format!("Export failed: {}", reason),

            // === GROUP MESSAGES ===
            Message::GroupsHeader => "Groups".to_string(),
            Message::GroupAdded(name) => format!("Group '{}' added", name),
            Message::GroupRemoved(name) => format!("Group '{}' removed", name),
        };
        write!(f, "{}", s)
    }
}
