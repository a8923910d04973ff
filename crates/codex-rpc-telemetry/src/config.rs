//! Telemetry configuration

use tracing_subscriber::filter::EnvFilter;

use crate::{TelemetryError, TelemetryGuard, TelemetryResult};

/// Default filter: informational output, with the client stack at debug
pub const DEFAULT_LOG_LEVEL: &str = "info,codex_rpc=debug";

/// Logging configuration
///
/// Use [`TelemetryConfigBuilder`] to construct one.
///
/// # Example
///
/// ```rust
/// use codex_rpc_telemetry::TelemetryConfig;
///
/// let config = TelemetryConfig::builder()
///     .service_name("review-bot")
///     .log_level("warn,codex_rpc_client=debug")
///     .json_logs(false)
///     .build();
/// assert!(config.stderr_output);
/// ```
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name, logged once at startup
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Filter directives such as `"info"` or `"info,codex_rpc_stdio=trace"`.
    /// `RUST_LOG` takes precedence when set.
    pub log_level: String,
    /// One JSON object per event instead of human readable output
    pub json_logs: bool,
    /// Write to stderr. Keep this on when the process itself speaks the
    /// protocol over stdout.
    pub stderr_output: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "codex-rpc".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json_logs: true,
            stderr_output: true,
        }
    }
}

impl TelemetryConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder::default()
    }

    /// Install the global subscriber described by this configuration.
    ///
    /// # Errors
    ///
    /// [`TelemetryError::InvalidConfiguration`] for an empty service name or
    /// unparsable filter, [`TelemetryError::InitializationFailed`] if a global
    /// subscriber is already installed.
    pub fn init(self) -> TelemetryResult<TelemetryGuard> {
        TelemetryGuard::init(self)
    }

    pub(crate) fn validate(&self) -> TelemetryResult<()> {
        if self.service_name.trim().is_empty() {
            return Err(TelemetryError::InvalidConfiguration(
                "service name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The filter to install: `env` when it parses, the configured level otherwise.
    pub(crate) fn filter(&self, env: Option<&str>) -> TelemetryResult<EnvFilter> {
        if let Some(directives) = env
            && let Ok(filter) = EnvFilter::try_new(directives)
        {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.log_level).map_err(|e| {
            TelemetryError::InvalidConfiguration(format!(
                "invalid log level {:?}: {e}",
                self.log_level
            ))
        })
    }
}

/// Builder for [`TelemetryConfig`]
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfigBuilder {
    service_name: Option<String>,
    service_version: Option<String>,
    log_level: Option<String>,
    json_logs: Option<bool>,
    stderr_output: Option<bool>,
}

impl TelemetryConfigBuilder {
    /// Set the service name
    #[must_use]
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Set the service version
    #[must_use]
    pub fn service_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = Some(version.into());
        self
    }

    /// Set the filter directives
    #[must_use]
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// JSON or human readable output
    #[must_use]
    pub fn json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = Some(enabled);
        self
    }

    /// stderr (default) or stdout
    #[must_use]
    pub fn stderr_output(mut self, enabled: bool) -> Self {
        self.stderr_output = Some(enabled);
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> TelemetryConfig {
        let defaults = TelemetryConfig::default();
        TelemetryConfig {
            service_name: self.service_name.unwrap_or(defaults.service_name),
            service_version: self.service_version.unwrap_or(defaults.service_version),
            log_level: self.log_level.unwrap_or(defaults.log_level),
            json_logs: self.json_logs.unwrap_or(defaults.json_logs),
            stderr_output: self.stderr_output.unwrap_or(defaults.stderr_output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "codex-rpc");
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert!(config.json_logs);
        assert!(config.stderr_output);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = TelemetryConfig::builder()
            .service_name("review-bot")
            .service_version("2.0.0")
            .log_level("debug")
            .json_logs(false)
            .stderr_output(false)
            .build();

        assert_eq!(config.service_name, "review-bot");
        assert_eq!(config.service_version, "2.0.0");
        assert_eq!(config.log_level, "debug");
        assert!(!config.json_logs);
        assert!(!config.stderr_output);
    }

    #[test]
    fn test_empty_service_name_is_rejected() {
        let config = TelemetryConfig::builder().service_name("  ").build();
        assert!(matches!(
            config.validate(),
            Err(TelemetryError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_env_directives_take_precedence() {
        let config = TelemetryConfig::builder().log_level("info").build();
        let filter = config.filter(Some("codex_rpc_stdio=trace")).unwrap();
        assert_eq!(filter.to_string(), "codex_rpc_stdio=trace");

        let filter = config.filter(None).unwrap();
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn test_unparsable_env_falls_back_to_configured_level() {
        let config = TelemetryConfig::builder().log_level("warn").build();
        let filter = config.filter(Some("codex_rpc=loud")).unwrap();
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn test_unparsable_level_is_invalid_configuration() {
        let config = TelemetryConfig::builder().log_level("codex_rpc=loud").build();
        assert!(matches!(
            config.filter(None),
            Err(TelemetryError::InvalidConfiguration(_))
        ));
    }
}
