use anyhow::{Error, Result};
use once_cell::sync::OnceCell;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LogLevel};

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Installs the global tracing subscriber once.
///
/// `RUST_LOG` takes precedence over `level` when set. Events go to stderr so
/// the report on stdout stays machine readable.
///
/// # Errors
/// Returns an error when another global subscriber is already installed.
pub fn init(format: LogFormat, level: LogLevel) -> Result<()> {
    TRACING_INIT.get_or_try_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

        let registry = tracing_subscriber::registry().with(env_filter);
        let installed = match format {
            LogFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_writer(std::io::stderr)
                        .json(),
                )
                .try_init(),
            LogFormat::Compact => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_writer(std::io::stderr)
                        .compact(),
                )
                .try_init(),
        };
        installed.map_err(|e: tracing_subscriber::util::TryInitError| Error::msg(e.to_string()))?;

        info!(format = ?format, level = level.as_str(), "tracing initialized");
        Ok::<(), Error>(())
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init(LogFormat::Compact, LogLevel::Warn).unwrap();
        init(LogFormat::Json, LogLevel::Debug).unwrap();
    }
}
