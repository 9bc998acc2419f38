use super::{open_store, parse_date};
use crate::libs::messages::Message;
use crate::libs::productivity::{DateRange, RangeReport};
use crate::libs::view::View;
use crate::{msg_error_anyhow, msg_print};
use anyhow::Result;
use chrono::Local;
use clap::Args;

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// First day, `today` or YYYY-MM-DD (default: first of this month)
    #[arg(long)]
    from: Option<String>,

    /// Last day, `today` or YYYY-MM-DD (default: today)
    #[arg(long)]
    to: Option<String>,
}

/// Productivity of the tasks dated within the range.
pub async fn cmd(args: ReportArgs) -> Result<()> {
    let today = Local::now().date_naive();
    let default = DateRange::month_to_date(today);
    let from = args.from.as_deref().map(parse_date).transpose()?.unwrap_or(default.start());
    let to = args.to.as_deref().map(parse_date).transpose()?.unwrap_or(default.end());
    let range = DateRange::new(from, to).map_err(|_| msg_error_anyhow!(Message::InvalidDateRange(from.to_string(), to.to_string())))?;

    let store = open_store().await?;
    let report = RangeReport::compute(&store.tasks(), range);

    msg_print!(Message::ReportHeader(from.to_string(), to.to_string()), true);
    View::range_report(&report);
    msg_print!(Message::ProductivityScore(report.score, report.band.to_string()), true);
    Ok(())
}
