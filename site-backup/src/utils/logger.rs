//! Logging configuration using tracing.

use crate::config::LogConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive for `level`: our own events at `level`, dependencies
/// (suppaftp, reqwest, hyper) only from `warn` up.
pub fn filter_directive(level: &str) -> String {
    format!("site_backup={},warn", level)
}

/// Install the global subscriber. `RUST_LOG` wins over `level_override`, which
/// wins over `[log] level`.
pub fn init(config: &LogConfig, level_override: Option<&str>) -> anyhow::Result<()> {
    let level = level_override.unwrap_or(&config.level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(level)))
        .unwrap_or_else(|_| EnvFilter::new(filter_directive("info")));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false);

    if config.compact {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.compact().without_time())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
