use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Storage and HTTP internals stay quiet unless `RUST_LOG` asks for them.
const NOISY_TARGETS: [&str; 3] = ["fjall", "lsm_tree", "hyper_util"];

/// Per-target levels: the crate follows `verbose`, dependencies are capped at WARN.
pub fn log_targets(verbose: bool) -> Targets {
    let app_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    NOISY_TARGETS
        .iter()
        .fold(Targets::new(), |targets, target| {
            targets.with_target(*target, LevelFilter::WARN)
        })
        .with_target(env!("CARGO_CRATE_NAME"), app_level)
        .with_default(LevelFilter::WARN)
}

/// Installs the global subscriber. Output goes to stderr so command output
/// on stdout stays clean.
pub fn init_logging(verbose: bool) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(if verbose { "debug" } else { "warn" }),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .pretty()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(log_targets(verbose))
        .with(env_filter)
        .try_init()?;
    Ok(())
}
