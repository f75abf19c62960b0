pub mod convert;
pub mod provider;
pub mod rates;
pub mod setup;
pub mod timeline;
pub mod ui;

use crate::sync::{RateSync, Refresh};
use anyhow::{Result, anyhow};
use tracing::debug;

/// Waits for a refresh while showing progress, then returns whatever the
/// store holds. A failed refresh falls back to the cached value if any.
pub(crate) async fn settle<T: Clone + Send + 'static>(
    sync: &RateSync,
    refresh: Refresh<T>,
    message: &str,
) -> Result<T> {
    let data = refresh.data();
    ui::track_loading(sync.observe_loading(), message).await;

    let outcome = refresh.finished().await;
    match (outcome, data.get()) {
        (Ok(()), Some(value)) => Ok(value),
        (Err(err), Some(value)) => {
            ui::print_error(&err.to_string());
            ui::print_error("Showing last known values.");
            Ok(value)
        }
        (Err(err), None) => Err(anyhow!(err)),
        (Ok(()), None) => {
            debug!("Refresh succeeded without a stored value");
            Err(anyhow!("no data available"))
        }
    }
}
