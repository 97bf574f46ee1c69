//! Logging setup for Dimensify
//!
//! Installs a `tracing-subscriber` registry with an env filter and a text or
//! JSON formatter

use dimensify_config::{LogFormat, TelemetryConfig};
use tracing_subscriber::EnvFilter;

/// Guard returned by [`init`]; hold it for the lifetime of the process
#[derive(Debug)]
pub struct TelemetryGuard {
    format: LogFormat,
}

impl TelemetryGuard {
    /// Format the subscriber was installed with
    #[must_use]
    pub const fn format(&self) -> LogFormat {
        self.format
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!("telemetry shut down");
    }
}

/// Initialize logging from configuration
///
/// `RUST_LOG` takes precedence, then `telemetry.log_filter`, then
/// `default_filter`. An unparsable directive falls back to `info`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init(config: Option<&TelemetryConfig>, default_filter: &str) -> anyhow::Result<TelemetryGuard> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = build_filter(config, default_filter);
    let format = config.map(|c| c.format).unwrap_or_default();

    match format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;
        }
        LogFormat::Text => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;
        }
    }

    Ok(TelemetryGuard { format })
}

/// Resolve the active filter directive
fn filter_directive(config: Option<&TelemetryConfig>, default_filter: &str) -> String {
    std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| config.and_then(|c| c.log_filter.clone()))
        .unwrap_or_else(|| default_filter.to_string())
}

fn build_filter(config: Option<&TelemetryConfig>, default_filter: &str) -> EnvFilter {
    let directive = filter_directive(config, default_filter);
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"))
}
