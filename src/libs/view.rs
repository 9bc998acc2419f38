//! Terminal tables.

use super::productivity::{category_color, RangeReport, TaskStats};
use super::task::Task;
use prettytable::{format, row, Table};

/// Length of the id prefix shown in task tables.
pub const SHORT_ID_LEN: usize = 8;

pub struct View {}

impl View {
    /// Prints one partition. `numbered` adds the 1-based position used by
    /// `taskpin move`.
    pub fn tasks(tasks: &[Task], numbered: bool) {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);

        if numbered {
            table.set_titles(row!["#", "ID", "TITLE", "GROUP", "DATE", "DONE"]);
        } else {
            table.set_titles(row!["ID", "TITLE", "GROUP", "DATE", "DONE"]);
        }
        for (index, task) in tasks.iter().enumerate() {
            let id = short_id(task);
            let done = if task.completed { "✔" } else { "" };
            let date = task.date.format("%Y-%m-%d");
            if numbered {
                table.add_row(row![index + 1, id, task.title, task.group, date, done]);
            } else {
                table.add_row(row![id, task.title, task.group, date, done]);
            }
        }
        table.printstd();
    }

    pub fn stats(stats: &TaskStats) {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
        table.add_row(row!["Total tasks", stats.total]);
        table.add_row(row!["Completed", stats.completed]);
        table.add_row(row!["Success rate", format!("{}%", stats.completion_rate.round())]);
        table.printstd();
    }

    pub fn categories(stats: &TaskStats) {
        let mut table = Table::new();
        table.set_titles(row!["CATEGORY", "TASKS", "COLOUR"]);
        for (category, count) in &stats.by_category {
            table.add_row(row![category, count, category_color(category)]);
        }
        table.printstd();
    }

    pub fn trend(stats: &TaskStats) {
        let mut table = Table::new();
        table.set_titles(row!["DAY", "TASKS", "COMPLETION", ""]);
        for day in &stats.trend {
            let bar = "█".repeat((day.completion_rate / 10.0).round() as usize);
            table.add_row(row![
                day.date.format("%b %d"),
                day.total,
                format!("{:.0}%", day.completion_rate),
                bar
            ]);
        }
        table.printstd();
    }

    pub fn range_report(report: &RangeReport) {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
        table.add_row(row!["Tasks in range", report.total]);
        table.add_row(row!["Completed", report.completed]);
        table.add_row(row!["Score", format!("{}%", report.score)]);
        table.add_row(row!["Band", format!("{} ({})", report.band, report.band.color())]);
        table.printstd();
    }

    pub fn groups(groups: &[String]) {
        let mut table = Table::new();
        table.set_titles(row!["GROUP", "COLOUR"]);
        for group in groups {
            table.add_row(row![group, category_color(group)]);
        }
        table.printstd();
    }
}

fn short_id(task: &Task) -> String {
    task.id.as_str().chars().take(SHORT_ID_LEN).collect()
}
