//! # Meridian Telemetry
//!
//! Structured logging for Meridian services, built on `tracing` and
//! `tracing-subscriber`.
//!
//! - JSON output for production, pretty output for development
//! - `EnvFilter` directives for per-crate levels
//! - Shared field names ([`fields`]) used by the dispatch spans
//!
//! # Example
//!
//! ```rust,ignore
//! use meridian_config::MeridianConfig;
//! use meridian_telemetry::{init_logging, LogConfig};
//!
//! let config = MeridianConfig::production();
//! init_logging(&LogConfig::from(&config.logging).with_service_name("users-api"))?;
//! ```

#![doc(html_root_url = "https://docs.rs/meridian-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{create_env_filter, fields, init_logging, LogConfig, DEFAULT_SERVICE_NAME};
