//! Subscriber installation
//!
//! Provides the [`TelemetryGuard`] for the logging lifecycle.

use tracing::info;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{TelemetryConfig, TelemetryError, TelemetryResult};

/// Keeps the logging setup alive.
///
/// Hold it for the life of the application; dropping it logs a shutdown line.
///
/// ```rust,ignore
/// use codex_rpc_telemetry::TelemetryConfig;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let _telemetry = TelemetryConfig::builder()
///         .service_name("review-bot")
///         .json_logs(false)
///         .build()
///         .init()?;
///
///     run().await
/// }
/// ```
#[derive(Debug)]
pub struct TelemetryGuard {
    config: TelemetryConfig,
}

impl TelemetryGuard {
    /// Install the global subscriber for `config`.
    ///
    /// `RUST_LOG` overrides the configured filter when it parses.
    ///
    /// # Errors
    ///
    /// As for [`TelemetryConfig::init`].
    pub fn init(config: TelemetryConfig) -> TelemetryResult<Self> {
        config.validate()?;
        let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
        let filter = config.filter(env.as_deref())?;

        let writer = if config.stderr_output {
            BoxMakeWriter::new(std::io::stderr)
        } else {
            BoxMakeWriter::new(std::io::stdout)
        };

        let installed = if config.json_logs {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .json();
            Registry::default().with(filter).with(layer).try_init()
        } else {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_thread_ids(false)
                .pretty();
            Registry::default().with(filter).with(layer).try_init()
        };
        installed.map_err(|e| TelemetryError::InitializationFailed(e.to_string()))?;

        info!(
            service_name = %config.service_name,
            service_version = %config.service_version,
            json_logs = config.json_logs,
            stderr_output = config.stderr_output,
            "telemetry initialized"
        );
        Ok(Self { config })
    }

    /// Get the service name
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.config.service_name
    }

    /// Get the service version
    #[must_use]
    pub fn service_version(&self) -> &str {
        &self.config.service_version
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        info!(service_name = %self.config.service_name, "telemetry shutting down");
    }
}
