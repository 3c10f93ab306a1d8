//! # Meridian Config
//!
//! Typed configuration for Meridian applications:
//!
//! - TOML and JSON files, merged key by key over defaults or a preset
//! - Environment overrides in the form `PREFIX__SECTION__KEY`
//! - Strict parsing (unknown fields are errors) and validation on load
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! include_location = false
//!
//! [dispatch]
//! presentation_mode = "public"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `MERIDIAN__SERVER__HTTP_ADDR=0.0.0.0:9000`
//! - `MERIDIAN__LOGGING__LEVEL=debug`
//! - `MERIDIAN__DISPATCH__PRESENTATION_MODE=internal`

#![doc(html_root_url = "https://docs.rs/meridian-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{MeridianConfig, MeridianConfigBuilder};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{
    DispatchSection, LogFormat, LoggingSection, ServerSection, DEFAULT_HTTP_ADDR,
    DEFAULT_PRESENTATION_MODE,
};
