use super::ui::{StyleType, format_optional_cell, header_cell, new_styled_table, rate_cell, style_text};
use crate::core::{DailyRate, Timeline};
use crate::sync::RateSync;
use anyhow::Result;
use comfy_table::Cell;

const RECENT_DAYS: usize = 7;

fn point_cell(point: Option<DailyRate>) -> Cell {
    format_optional_cell(point, |p| {
        format!("{} ({})", super::ui::format_rate(p.rate), p.date)
    })
}

pub fn render_summary(timeline: &Timeline) -> String {
    let mut table = new_styled_table();
    table.set_header(vec![
        header_cell("Pair"),
        header_cell("Latest"),
        header_cell("Low"),
        header_cell("High"),
        header_cell("Average"),
    ]);
    table.add_row(vec![
        Cell::new(timeline.pair().to_string()),
        point_cell(timeline.latest()),
        point_cell(timeline.min()),
        point_cell(timeline.max()),
        format_optional_cell(timeline.average(), super::ui::format_rate),
    ]);
    table.to_string()
}

pub fn render_recent(timeline: &Timeline) -> String {
    let mut table = new_styled_table();
    table.set_header(vec![header_cell("Date"), header_cell("Rate")]);
    let skip = timeline.rates.len().saturating_sub(RECENT_DAYS);
    for point in timeline.rates.iter().skip(skip) {
        table.add_row(vec![Cell::new(point.date), rate_cell(point.rate)]);
    }
    table.to_string()
}

pub async fn run(sync: &RateSync, base: &str, target: &str) -> Result<()> {
    let refresh = sync.refresh_timeline(base, target);
    let timeline = super::settle(sync, refresh, "Fetching timeline").await?;

    let period = match (timeline.start_date, timeline.end_date) {
        (Some(start), Some(end)) => format!("{start} to {end}"),
        _ => "no data points".to_string(),
    };
    println!(
        "{}",
        style_text(&format!("{} ({})", timeline.pair(), period), StyleType::Title)
    );
    println!("{}", render_summary(&timeline));
    if !timeline.rates.is_empty() {
        println!("{}", render_recent(&timeline));
    }
    Ok(())
}
