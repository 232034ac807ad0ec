//! Configuration for the Cohort identity service.
//!
//! Values are layered: an optional `.env` file is loaded into the process
//! environment, an optional TOML file supplies defaults, and environment
//! variables override both. Composition ends with guard rails that either
//! reject the configuration or attach [`ConfigWarnings`] for the operator.

#![allow(missing_docs)]

pub mod constants;
pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError};
pub use models::sources::{EnvConfig, FileConfig};
pub use models::{
    AuthConfig, Config, ConfigMetadata, CorsConfig, DatabaseConfig, DevConfig, ServerConfig,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
