//! Export of tasks or analytics to CSV, JSON or Excel.

use super::open_store;
use crate::libs::config::Config;
use crate::libs::export::{ExportData, ExportFormat, Exporter};
use crate::libs::messages::Message;
use crate::libs::productivity::TaskStats;
use crate::{msg_error_anyhow, msg_success, msg_warning};
use anyhow::Result;
use chrono::Local;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// What to export
    #[arg(value_enum, default_value = "tasks")]
    data: ExportData,

    #[arg(short, long, value_enum, default_value = "csv")]
    format: ExportFormat,

    /// Output file (default: taskpin_<data>_<timestamp>.<ext> in the current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn cmd(args: ExportArgs) -> Result<()> {
    let store = open_store().await?;
    let tasks = store.tasks();
    if tasks.is_empty() {
        msg_warning!(Message::ExportNoData);
        return Ok(());
    }

    let exporter = Exporter::new(args.format, args.data, args.output);
    let result = match args.data {
        ExportData::Tasks => exporter.export_tasks(&tasks),
        ExportData::Analytics => {
            let settings = Config::read()?.analytics();
            let stats = TaskStats::compute(&tasks, Local::now().date_naive(), settings.trend_days, settings.trend_lead_days);
            exporter.export_analytics(&stats)
        }
    };
    result.map_err(|e| msg_error_anyhow!(Message::ExportFailed(e.to_string())))?;

    msg_success!(Message::ExportCompleted(exporter.output_path().display().to_string()));
    Ok(())
}
