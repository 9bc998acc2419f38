//! Task entity and the typed payloads that flow into the synchronization layer.
//!
//! A [`Task`] is always a server row: it carries the server-assigned id,
//! owner and timestamps. Client input enters through [`TaskDraft`] (creation)
//! and [`TaskChanges`] (partial updates); both are validated here so that
//! every `Validation` error comes from one rule set.

use crate::libs::sync::TaskError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Maximum number of characters in a task title.
pub const TITLE_MAX_CHARS: usize = 100;

/// Maximum number of characters in a task description.
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Maximum number of featured tasks a user may have at once.
pub const FEATURED_CAPACITY: usize = 3;

/// Groups offered to a fresh installation.
pub const DEFAULT_GROUPS: [&str; 2] = ["Work", "Personal"];

/// Opaque, server-assigned task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted task row as returned by the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    pub group: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub user_id: UserId,
    #[serde(default)]
    pub order: Option<i64>,
}

impl Task {
    /// The partition this task belongs to according to its `featured` flag.
    pub fn partition(&self) -> Partition {
        Partition::for_featured(self.featured)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// The two observable task partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    /// Featured tasks pinned to the home view.
    Home,
    /// Every other task.
    Bucket,
}

impl Partition {
    pub fn for_featured(featured: bool) -> Self {
        if featured {
            Partition::Home
        } else {
            Partition::Bucket
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Home => write!(f, "home"),
            Partition::Bucket => write!(f, "bucket"),
        }
    }
}

/// The configured set of known group names.
///
/// Membership is checked when a task is created; editing an existing task
/// only requires a non-blank group so that renamed groups do not strand old
/// tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Groups(Vec<String>);

impl Default for Groups {
    fn default() -> Self {
        Self(DEFAULT_GROUPS.iter().map(|g| g.to_string()).collect())
    }
}

impl Groups {
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    pub fn contains(&self, name: &str) -> bool {
        let name = name.trim();
        self.0.iter().any(|g| g == name)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Adds a group name, rejecting blanks and case-insensitive duplicates.
    pub fn add(&mut self, name: &str) -> Result<(), TaskError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TaskError::Validation("Group name is required".to_string()));
        }
        if self.0.iter().any(|g| g.eq_ignore_ascii_case(name)) {
            return Err(TaskError::Validation(format!("Group '{}' already exists", name)));
        }
        self.0.push(name.to_string());
        Ok(())
    }

    /// Removes a group name. The last remaining group cannot be removed.
    pub fn remove(&mut self, name: &str) -> Result<(), TaskError> {
        let name = name.trim();
        let position = self
            .0
            .iter()
            .position(|g| g == name)
            .ok_or_else(|| TaskError::Validation(format!("Unknown group '{}'", name)))?;
        if self.0.len() == 1 {
            return Err(TaskError::Validation("At least one group must remain".to_string()));
        }
        self.0.remove(position);
        Ok(())
    }
}

/// Client-supplied data for a task that does not exist yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub group: String,
    pub date: Option<NaiveDate>,
    pub featured: bool,
}

impl TaskDraft {
    pub fn new(title: &str, group: &str, date: NaiveDate) -> Self {
        TaskDraft {
            title: title.to_string(),
            description: String::new(),
            group: group.to_string(),
            date: Some(date),
            featured: false,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn featured(mut self, featured: bool) -> Self {
        self.featured = featured;
        self
    }

    /// Checks the draft against the field rules and the known groups.
    ///
    /// This is the only way to obtain a [`ValidDraft`], which is what the
    /// repository accepts for creation.
    pub fn validate(&self, groups: &Groups) -> Result<ValidDraft, TaskError> {
        let title = validate_title(&self.title)?;
        let description = validate_description(&self.description)?;
        let date = self.date.ok_or_else(|| TaskError::Validation("Task date is required".to_string()))?;
        let group = self.group.trim();
        if group.is_empty() {
            return Err(TaskError::Validation("Task group is required".to_string()));
        }
        if !groups.contains(group) {
            return Err(TaskError::Validation(format!("Unknown group '{}'", group)));
        }

        Ok(ValidDraft {
            title,
            description,
            group: group.to_string(),
            date,
            featured: self.featured,
        })
    }
}

/// A draft that passed validation; fields are trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDraft {
    title: String,
    description: String,
    group: String,
    date: NaiveDate,
    featured: bool,
}

impl ValidDraft {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn is_featured(&self) -> bool {
        self.featured
    }
}

/// A partial update. Only fields set to `Some` are sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub group: Option<String>,
    pub date: Option<NaiveDate>,
    pub completed: Option<bool>,
    pub featured: Option<bool>,
    pub order: Option<i64>,
}

impl TaskChanges {
    pub fn completed(completed: bool) -> Self {
        TaskChanges {
            completed: Some(completed),
            ..Default::default()
        }
    }

    pub fn featured(featured: bool) -> Self {
        TaskChanges {
            featured: Some(featured),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == TaskChanges::default()
    }

    /// Applies the field rules to the supplied fields and returns a trimmed copy.
    pub fn validate(&self) -> Result<TaskChanges, TaskError> {
        if self.is_empty() {
            return Err(TaskError::Validation("No changes supplied".to_string()));
        }
        let title = self.title.as_deref().map(validate_title).transpose()?;
        let description = self.description.as_deref().map(validate_description).transpose()?;
        let group = match self.group.as_deref().map(str::trim) {
            Some("") => return Err(TaskError::Validation("Task group is required".to_string())),
            other => other.map(str::to_string),
        };

        Ok(TaskChanges {
            title,
            description,
            group,
            ..self.clone()
        })
    }
}

fn validate_title(title: &str) -> Result<String, TaskError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TaskError::Validation("Task title is required".to_string()));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(TaskError::Validation(format!("Task title must be at most {} characters", TITLE_MAX_CHARS)));
    }
    Ok(title.to_string())
}

fn validate_description(description: &str) -> Result<String, TaskError> {
    let description = description.trim();
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(TaskError::Validation(format!(
            "Task description must be at most {} characters",
            DESCRIPTION_MAX_CHARS
        )));
    }
    Ok(description.to_string())
}
