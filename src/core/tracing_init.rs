use crate::core::config::LoggingConfig;
use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directives when `RUST_LOG` is not set
///
/// Request spans from tower-http stay at `debug` unless the configured level
/// is more verbose, so `info` logs only show portal events.
fn default_directives(level: &str) -> String {
    let http_level = match level {
        "trace" | "debug" => level,
        _ => "warn",
    };
    format!("{level},tower_http={http_level},lettre=warn,reqwest=warn")
}

pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(&config.level)))
        .context("Invalid log filter")?;

    let use_console = config.console || config.format == "console";

    if use_console {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true)
                    .with_line_number(true),
            )
            .try_init()
            .context("Failed to install console logger")?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
            .context("Failed to install JSON logger")?;
    }

    Ok(())
}
