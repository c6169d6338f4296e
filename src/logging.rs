// src/logging.rs

//! Log output for the `docmirror` binary.
//!
//! The filter comes from, in order:
//! 1. `--log-level` on the command line,
//! 2. `DOCMIRROR_LOG`, which takes full `tracing` directives such as
//!    `docmirror=debug,notify=warn`,
//! 3. plain `info`.
//!
//! A `DOCMIRROR_LOG` value that does not parse is ignored. Output goes to
//! stderr so it never mixes with `--dry-run` listings on stdout.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable read when no CLI level is given.
pub const LOG_ENV_VAR: &str = "DOCMIRROR_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let directive = filter_directive(cli_level, env_value.as_deref());

    fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}

/// The filter directive logging starts with.
pub fn filter_directive(cli_level: Option<LogLevel>, env_value: Option<&str>) -> String {
    if let Some(level) = cli_level {
        return level_name(level).to_string();
    }

    match env_value.map(str::trim) {
        Some(value) if !value.is_empty() && EnvFilter::try_new(value).is_ok() => {
            value.to_string()
        }
        _ => DEFAULT_DIRECTIVE.to_string(),
    }
}

fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
