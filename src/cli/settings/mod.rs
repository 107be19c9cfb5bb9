//! Settings management for CLI set/unset commands.
//!
//! Each configuration key gets a [`SettingHandler`]; the [`SettingRegistry`]
//! maps user-facing key names (`api-url`, `read-timeout`, ...) to them.

pub mod error;
pub mod handlers;
pub mod helpers;
pub mod registry;

pub use error::SettingError;
pub use registry::SettingRegistry;

use std::path::PathBuf;

use crate::core::config::data::Config;

/// Where set/unset operations read and write the configuration.
pub struct SetContext {
    pub config_path: PathBuf,
}

impl SetContext {
    pub fn from_default_path() -> Result<Self, SettingError> {
        let config_path = Config::config_path().ok_or_else(|| {
            SettingError::ConfigError("Could not determine the configuration directory".into())
        })?;
        Ok(Self { config_path })
    }
}

/// Trait for handling a configuration setting.
pub trait SettingHandler: Send + Sync {
    /// Returns the configuration key this handler manages.
    fn key(&self) -> &'static str;

    /// Set the configuration value from the words after the key.
    fn set(&self, args: &[String], ctx: &SetContext) -> Result<String, SettingError>;

    /// Clear the value so the built-in default applies again.
    fn unset(&self, ctx: &SetContext) -> Result<String, SettingError>;

    /// Format the current value for display in `datachat set` output.
    fn format(&self, config: &Config) -> String;
}

pub fn run_set(
    registry: &SettingRegistry,
    key: &str,
    args: &[String],
    ctx: &SetContext,
) -> Result<String, SettingError> {
    registry
        .get(key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?
        .set(args, ctx)
}

pub fn run_unset(
    registry: &SettingRegistry,
    key: &str,
    ctx: &SetContext,
) -> Result<String, SettingError> {
    registry
        .get(key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?
        .unset(ctx)
}

/// Render every setting in display order.
pub fn format_all(registry: &SettingRegistry, config: &Config) -> String {
    registry
        .keys_display_order()
        .iter()
        .filter_map(|key| registry.get(key))
        .map(|handler| handler.format(config))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests;
