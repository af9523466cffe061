//! Configuration loading, env substitution, and validation.
//!
//! Config files: `skillwatch.toml`, `skillwatch.yaml` or `skillwatch.json`,
//! searched in `./` then `~/.config/skillwatch/`.
//!
//! Supports `${ENV_VAR}` substitution in the raw file text.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{config_dir, discover_and_load, find_config_file, load_config},
    schema::{EnrichConfig, FetchConfig, MonitorConfig, PathsConfig, ReportConfig},
    validate::{Diagnostic, Severity, ValidationResult},
};

/// Render the effective configuration as TOML.
pub fn to_toml_string(config: &MonitorConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}
