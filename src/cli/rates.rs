use super::ui::{StyleType, header_cell, new_styled_table, rate_cell, style_text};
use crate::core::RateSet;
use crate::sync::RateSync;
use anyhow::Result;
use comfy_table::Cell;

pub fn render(rates: &RateSet) -> String {
    let mut table = new_styled_table();
    table.set_header(vec![header_cell("Currency"), header_cell("Rate")]);
    for (code, rate) in &rates.rates {
        table.add_row(vec![Cell::new(code), rate_cell(*rate)]);
    }
    table.to_string()
}

pub async fn run(sync: &RateSync) -> Result<()> {
    let refresh = sync.refresh_rates();
    let provider = sync.store().provider_selection();
    let rates = super::settle(sync, refresh, &format!("Fetching rates from {provider}")).await?;

    let date = rates
        .date
        .map_or("unknown date".to_string(), |d| d.to_string());
    println!(
        "{}",
        style_text(
            &format!("1 {} as of {} ({})", rates.base, date, provider),
            StyleType::Title
        )
    );
    println!("{}", render(&rates));
    println!(
        "{}",
        style_text(
            &format!("{} currencies", rates.rates.len()),
            StyleType::Subtle
        )
    );
    Ok(())
}
