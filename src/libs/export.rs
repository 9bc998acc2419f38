//! File export of tasks and analytics.
//!
//! Formats:
//!
//! - **CSV**: one row per record, for spreadsheets and scripts
//! - **JSON**: pretty-printed, preserves structure
//! - **Excel**: formatted workbook with auto-sized columns
//!
//! Without an explicit output path the file is written to the working
//! directory as `taskpin_<data>_<timestamp>.<ext>`.

use crate::libs::productivity::TaskStats;
use crate::libs::task::Task;
use anyhow::Result;
use chrono::Local;
use rust_xlsxwriter::{Color, Format, Workbook};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    Excel,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Excel => "xlsx",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportData {
    /// Every task of both partitions.
    Tasks,
    /// Totals, category breakdown and trend.
    Analytics,
}

impl ExportData {
    fn name(self) -> &'static str {
        match self {
            ExportData::Tasks => "tasks",
            ExportData::Analytics => "analytics",
        }
    }
}

/// Flat, string-typed task row shared by all formats.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportTask {
    pub id: String,
    pub title: String,
    pub description: String,
    pub group: String,
    pub date: String,
    pub completed: bool,
    pub completed_at: String,
    pub pinned: bool,
    pub order: String,
    pub created_at: String,
}

impl From<&Task> for ExportTask {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.to_string(),
            title: task.title.clone(),
            description: task.description.clone(),
            group: task.group.clone(),
            date: task.date.format("%Y-%m-%d").to_string(),
            completed: task.completed,
            completed_at: task.completed_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            pinned: task.featured,
            order: task.order.map(|o| o.to_string()).unwrap_or_default(),
            created_at: task.created_at.to_rfc3339(),
        }
    }
}

const TASK_HEADERS: [&str; 10] = [
    "ID",
    "Title",
    "Description",
    "Group",
    "Date",
    "Completed",
    "Completed At",
    "Pinned",
    "Order",
    "Created At",
];

impl ExportTask {
    fn cells(&self) -> [String; 10] {
        [
            self.id.clone(),
            self.title.clone(),
            self.description.clone(),
            self.group.clone(),
            self.date.clone(),
            yes_no(self.completed),
            self.completed_at.clone(),
            yes_no(self.pinned),
            self.order.clone(),
            self.created_at.clone(),
        ]
    }
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}

pub struct Exporter {
    format: ExportFormat,
    output_path: PathBuf,
}

impl Exporter {
    pub fn new(format: ExportFormat, data: ExportData, output_path: Option<PathBuf>) -> Self {
        let output_path = output_path.unwrap_or_else(|| {
            PathBuf::from(format!(
                "taskpin_{}_{}.{}",
                data.name(),
                Local::now().format("%Y%m%d_%H%M%S"),
                format.extension()
            ))
        });
        Self { format, output_path }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn export_tasks(&self, tasks: &[Task]) -> Result<()> {
        let rows: Vec<ExportTask> = tasks.iter().map(ExportTask::from).collect();
        match self.format {
            ExportFormat::Csv => self.tasks_csv(&rows),
            ExportFormat::Json => self.write_json(&rows),
            ExportFormat::Excel => self.tasks_excel(&rows),
        }
    }

    pub fn export_analytics(&self, stats: &TaskStats) -> Result<()> {
        match self.format {
            ExportFormat::Csv => self.analytics_csv(stats),
            ExportFormat::Json => self.write_json(stats),
            ExportFormat::Excel => self.analytics_excel(stats),
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        fs::write(&self.output_path, serde_json::to_string_pretty(value)?)?;
        Ok(())
    }

    fn tasks_csv(&self, rows: &[ExportTask]) -> Result<()> {
        let mut wtr = csv::Writer::from_path(&self.output_path)?;
        wtr.write_record(TASK_HEADERS)?;
        for row in rows {
            wtr.write_record(row.cells())?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Three sections separated by blank lines: totals, categories, trend.
    fn analytics_csv(&self, stats: &TaskStats) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_path(&self.output_path)?;
        wtr.write_record(["Metric", "Value"])?;
        wtr.write_record(["Total", stats.total.to_string().as_str()])?;
        wtr.write_record(["Completed", stats.completed.to_string().as_str()])?;
        wtr.write_record(["Completion Rate", format!("{:.1}%", stats.completion_rate).as_str()])?;
        wtr.write_record([""])?;

        wtr.write_record(["Category", "Tasks"])?;
        for (category, count) in &stats.by_category {
            wtr.write_record([category.as_str(), count.to_string().as_str()])?;
        }
        wtr.write_record([""])?;

        wtr.write_record(["Date", "Tasks", "Completion Rate"])?;
        for day in &stats.trend {
            wtr.write_record([
                day.date.format("%Y-%m-%d").to_string(),
                day.total.to_string(),
                format!("{:.1}%", day.completion_rate),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn tasks_excel(&self, rows: &[ExportTask]) -> Result<()> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet().set_name("Tasks")?;
        let header_format = Format::new().set_bold().set_background_color(Color::Gray);

        for (col, header) in TASK_HEADERS.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }
        for (i, row) in rows.iter().enumerate() {
            for (col, cell) in row.cells().iter().enumerate() {
                worksheet.write_string(i as u32 + 1, col as u16, cell)?;
            }
        }

        worksheet.autofit();
        workbook.save(&self.output_path)?;
        Ok(())
    }

    fn analytics_excel(&self, stats: &TaskStats) -> Result<()> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold().set_background_color(Color::Gray);

        let summary = workbook.add_worksheet().set_name("Summary")?;
        summary.write_string_with_format(0, 0, "Metric", &header_format)?;
        summary.write_string_with_format(0, 1, "Value", &header_format)?;
        summary.write_string(1, 0, "Total")?;
        summary.write_number(1, 1, stats.total as f64)?;
        summary.write_string(2, 0, "Completed")?;
        summary.write_number(2, 1, stats.completed as f64)?;
        summary.write_string(3, 0, "Completion Rate (%)")?;
        summary.write_number(3, 1, stats.completion_rate)?;
        summary.autofit();

        let categories = workbook.add_worksheet().set_name("Categories")?;
        categories.write_string_with_format(0, 0, "Category", &header_format)?;
        categories.write_string_with_format(0, 1, "Tasks", &header_format)?;
        for (i, (category, count)) in stats.by_category.iter().enumerate() {
            categories.write_string(i as u32 + 1, 0, category)?;
            categories.write_number(i as u32 + 1, 1, *count as f64)?;
        }
        categories.autofit();

        let trend = workbook.add_worksheet().set_name("Trend")?;
        trend.write_string_with_format(0, 0, "Date", &header_format)?;
        trend.write_string_with_format(0, 1, "Tasks", &header_format)?;
        trend.write_string_with_format(0, 2, "Completion Rate (%)", &header_format)?;
        for (i, day) in stats.trend.iter().enumerate() {
            let row = i as u32 + 1;
            trend.write_string(row, 0, day.date.format("%Y-%m-%d").to_string())?;
            trend.write_number(row, 1, day.total as f64)?;
            trend.write_number(row, 2, day.completion_rate)?;
        }
        trend.autofit();

        workbook.save(&self.output_path)?;
        Ok(())
    }
}
