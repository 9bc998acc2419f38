use super::open_store;
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::productivity::TaskStats;
use crate::libs::view::View;
use crate::msg_print;
use anyhow::Result;
use chrono::Local;

pub async fn cmd() -> Result<()> {
    let settings = Config::read()?.analytics();
    let store = open_store().await?;
    let stats = TaskStats::compute(
        &store.tasks(),
        Local::now().date_naive(),
        settings.trend_days,
        settings.trend_lead_days,
    );

    msg_print!(Message::AnalyticsHeader, true);
    View::stats(&stats);
    msg_print!(Message::CategoriesHeader, true);
    View::categories(&stats);
    msg_print!(Message::TrendHeader(stats.trend.len()), true);
    View::trend(&stats);
    Ok(())
}
