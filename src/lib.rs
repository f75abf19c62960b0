pub mod cli;
pub mod core;
pub mod providers;
pub mod store;
pub mod sync;

use crate::core::config::AppConfig;
use crate::providers::HttpProviderClient;
use crate::store::LocalStore;
use crate::sync::RateSync;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Rates,
    Timeline { base: String, target: String },
    Convert { amount: f64, from: String, to: String },
    Provider(Option<String>),
}

/// Wires the persisted store and the HTTP providers into a [`RateSync`].
pub fn build_sync(config: &AppConfig) -> Result<RateSync> {
    let store_path = config.default_data_path()?.join("store");
    let store = Arc::new(LocalStore::open(&store_path)?);
    let client = Arc::new(HttpProviderClient::new(&config.providers)?);

    Ok(RateSync::new(store, client).with_min_loading(config.min_loading()))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxsync starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let sync = build_sync(&config)?;

    match command {
        AppCommand::Rates => cli::rates::run(&sync).await,
        AppCommand::Timeline { base, target } => cli::timeline::run(&sync, &base, &target).await,
        AppCommand::Convert { amount, from, to } => {
            cli::convert::run(&sync, amount, &from, &to).await
        }
        AppCommand::Provider(name) => cli::provider::run(&sync, name.as_deref()),
    }
}
