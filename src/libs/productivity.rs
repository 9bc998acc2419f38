//! Productivity analytics derived from the task list.
//!
//! Everything here is a pure function of a task slice, normally home
//! followed by bucket ([`TaskStore::tasks`](crate::libs::sync::TaskStore::tasks)).
//!
//! ## Formulas
//!
//! ```text
//! completion rate    = completed / total * 100      (0 when there are no tasks)
//! productivity score = round(completion rate)
//! ```
//!
//! Scores are classified into bands:
//!
//! | Score   | Band     | Colour    |
//! |---------|----------|-----------|
//! | 0..=40  | Low      | `#EF442D` |
//! | 41..=80 | Moderate | `#FFA34E` |
//! | 81..    | High     | `#C0F433` |

use crate::libs::sync::TaskError;
use crate::libs::task::Task;
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Category used for tasks whose group is blank.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Colour of a category in charts.
pub fn category_color(category: &str) -> &'static str {
    match category {
        "Work" => "#FFD84E",
        "Personal" => "#C9C9C9",
        _ => "#808080",
    }
}

/// Share of completed tasks in percent.
pub fn completion_rate(tasks: &[Task]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }
    let completed = tasks.iter().filter(|t| t.completed).count();
    completed as f64 / tasks.len() as f64 * 100.0
}

/// Completion rate rounded to a whole percent.
pub fn productivity_score(tasks: &[Task]) -> u32 {
    completion_rate(tasks).round() as u32
}

/// Number of tasks per group.
pub fn by_category(tasks: &[Task]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for task in tasks {
        let group = task.group.trim();
        let key = if group.is_empty() { UNCATEGORIZED } else { group };
        *counts.entry(key.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TaskError> {
        if start > end {
            return Err(TaskError::Validation(format!("Start date {} is after end date {}", start, end)));
        }
        Ok(Self { start, end })
    }

    /// From the first of `today`'s month up to `today`.
    pub fn month_to_date(today: NaiveDate) -> Self {
        let start = today.with_day(1).unwrap_or(today);
        Self { start, end: today }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Tasks whose date lies in `range`.
pub fn filter_in_range(tasks: &[Task], range: &DateRange) -> Vec<Task> {
    tasks.iter().filter(|t| range.contains(t.date)).cloned().collect()
}

/// Completion rate of the tasks dated on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRate {
    pub date: NaiveDate,
    pub total: usize,
    pub completion_rate: f64,
}

/// One entry per day for `days` days, starting `lead_days` before `today`.
pub fn trend(tasks: &[Task], today: NaiveDate, days: u32, lead_days: u32) -> Vec<DayRate> {
    let first = today - Duration::days(i64::from(lead_days));
    (0..days)
        .map(|offset| {
            let date = first + Duration::days(i64::from(offset));
            let dated: Vec<Task> = tasks.iter().filter(|t| t.date == date).cloned().collect();
            DayRate {
                date,
                total: dated.len(),
                completion_rate: completion_rate(&dated),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProgressBand {
    Low,
    Moderate,
    High,
}

impl ProgressBand {
    pub fn for_score(score: u32) -> Self {
        match score {
            0..=40 => ProgressBand::Low,
            41..=80 => ProgressBand::Moderate,
            _ => ProgressBand::High,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            ProgressBand::Low => "#EF442D",
            ProgressBand::Moderate => "#FFA34E",
            ProgressBand::High => "#C0F433",
        }
    }
}

impl fmt::Display for ProgressBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressBand::Low => write!(f, "low"),
            ProgressBand::Moderate => write!(f, "moderate"),
            ProgressBand::High => write!(f, "high"),
        }
    }
}

/// Overview shown on the analytics page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub completion_rate: f64,
    pub by_category: BTreeMap<String, usize>,
    pub trend: Vec<DayRate>,
}

impl TaskStats {
    pub fn compute(tasks: &[Task], today: NaiveDate, days: u32, lead_days: u32) -> Self {
        Self {
            total: tasks.len(),
            completed: tasks.iter().filter(|t| t.completed).count(),
            completion_rate: completion_rate(tasks),
            by_category: by_category(tasks),
            trend: trend(tasks, today, days, lead_days),
        }
    }
}

/// Productivity over a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeReport {
    pub range: DateRange,
    pub total: usize,
    pub completed: usize,
    pub score: u32,
    pub band: ProgressBand,
}

impl RangeReport {
    pub fn compute(tasks: &[Task], range: DateRange) -> Self {
        let in_range = filter_in_range(tasks, &range);
        let score = productivity_score(&in_range);
        Self {
            range,
            total: in_range.len(),
            completed: in_range.iter().filter(|t| t.completed).count(),
            score,
            band: ProgressBand::for_score(score),
        }
    }
}
