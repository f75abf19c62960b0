use super::ui::{StyleType, format_rate, style_text};
use crate::core::RateSet;
use crate::sync::RateSync;
use anyhow::{Result, anyhow};

pub fn describe(rates: &RateSet, amount: f64, from: &str, to: &str) -> Result<String> {
    let (from, to) = (from.to_uppercase(), to.to_uppercase());
    let converted = rates
        .convert(amount, &from, &to)
        .ok_or_else(|| anyhow!("No rate available for {} to {}", from, to))?;
    Ok(format!("{amount:.2} {from} = {converted:.2} {to}"))
}

pub async fn run(sync: &RateSync, amount: f64, from: &str, to: &str) -> Result<()> {
    let refresh = sync.refresh_rates();
    let rates = super::settle(sync, refresh, "Fetching rates").await?;

    println!(
        "{}",
        style_text(&describe(&rates, amount, from, to)?, StyleType::Highlight)
    );
    if let Some(rate) = rates.rate(from, to) {
        println!(
            "{}",
            style_text(
                &format!("1 {} = {} {}", from.to_uppercase(), format_rate(rate), to.to_uppercase()),
                StyleType::Subtle
            )
        );
    }
    Ok(())
}
