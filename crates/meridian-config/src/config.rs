//! The root configuration type.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, DispatchSection, LogFormat, LoggingSection, ServerSection};

/// Complete Meridian application configuration.
///
/// # Example
///
/// ```
/// use meridian_config::MeridianConfig;
///
/// let config = MeridianConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert_eq!(config.dispatch.presentation_mode, "public");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct MeridianConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Dispatch settings.
    #[serde(default)]
    pub dispatch: DispatchSection,
}

impl MeridianConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> MeridianConfigBuilder {
        MeridianConfigBuilder::default()
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unparsable bind address,
    /// a zero request timeout, or an empty presentation mode.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }
        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.dispatch.presentation_mode.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "dispatch.presentation_mode",
                "must not be empty",
            ));
        }
        Ok(())
    }

    /// Local development preset: pretty debug logs with source locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            server: ServerSection {
                http_addr: "127.0.0.1:8080".to_string(),
                shutdown_timeout_secs: 5,
                ..ServerSection::default()
            },
            logging: LoggingSection {
                enabled: true,
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                include_location: true,
            },
            dispatch: DispatchSection::default(),
        }
    }

    /// Production preset: JSON info logs.
    #[must_use]
    pub fn production() -> Self {
        Self {
            server: ServerSection::default(),
            logging: LoggingSection {
                enabled: true,
                level: "info".to_string(),
                format: LogFormat::Json,
                include_location: false,
            },
            dispatch: DispatchSection::default(),
        }
    }

    /// Returns the graceful shutdown timeout.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    /// Returns the per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }
}

/// Builder for [`MeridianConfig`].
#[derive(Debug, Default)]
pub struct MeridianConfigBuilder {
    config: MeridianConfig,
}

impl MeridianConfigBuilder {
    /// Sets the server section.
    #[must_use]
    pub fn server(mut self, server: ServerSection) -> Self {
        self.config.server = server;
        self
    }

    /// Sets the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingSection) -> Self {
        self.config.logging = logging;
        self
    }

    /// Sets the dispatch section.
    #[must_use]
    pub fn dispatch(mut self, dispatch: DispatchSection) -> Self {
        self.config.dispatch = dispatch;
        self
    }

    /// Sets the default presentation mode.
    #[must_use]
    pub fn presentation_mode(mut self, mode: impl Into<String>) -> Self {
        self.config.dispatch.presentation_mode = mode.into();
        self
    }

    /// Builds the configuration without validating it.
    #[must_use]
    pub fn build(self) -> MeridianConfig {
        self.config
    }
}
