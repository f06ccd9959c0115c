pub mod config;
pub mod error;

pub use config::{
    Config, HourFormat, LayoutConfig, LoggingConfig, SenderConfig, TemperatureUnit,
    ValidationResult, WatchFaceConfig,
};
pub use error::{AppError, ConfigError, SyncError};

use anyhow::Result;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Initialize logging. `RUST_LOG` wins over `default_filter` when set; a
/// blank `default_filter` means [`DEFAULT_LOG_FILTER`].
pub fn init_with_filter(default_filter: &str) -> Result<()> {
    let fallback = effective_filter(default_filter);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!(filter = fallback, "Sunshine core initialized");
    Ok(())
}

fn effective_filter(filter: &str) -> &str {
    let filter = filter.trim();
    if filter.is_empty() {
        DEFAULT_LOG_FILTER
    } else {
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_filter_falls_back_to_info() {
        assert_eq!(effective_filter(""), "info");
        assert_eq!(effective_filter("   "), "info");
        assert_eq!(effective_filter(" sunshine_sync=debug "), "sunshine_sync=debug");
    }
}
