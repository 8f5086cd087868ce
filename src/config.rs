//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/processify/processify.toml`
//! 3. Local config: file passed to [`Settings::load`]
//! 4. Environment variables: `PROCESSIFY_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Parser and logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Turn numeric named values (`--port 8080`) into JSON numbers
    pub coerce_numbers: bool,
    /// Turn `true`/`false` named values into JSON booleans
    pub coerce_booleans: bool,
    /// Read `--no-name` as `name = false`
    pub negated_flags: bool,
    /// Log verbosity: 0 warn, 1 info, 2 debug, 3 trace
    pub verbosity: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            coerce_numbers: true,
            coerce_booleans: true,
            negated_flags: true,
            verbosity: 0,
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub coerce_numbers: Option<bool>,
    pub coerce_booleans: Option<bool>,
    pub negated_flags: Option<bool>,
    pub verbosity: Option<u8>,
}

/// Get the XDG config directory for processify.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "processify").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("processify.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            coerce_numbers: overlay.coerce_numbers.unwrap_or(self.coerce_numbers),
            coerce_booleans: overlay.coerce_booleans.unwrap_or(self.coerce_booleans),
            negated_flags: overlay.negated_flags.unwrap_or(self.negated_flags),
            verbosity: overlay.verbosity.unwrap_or(self.verbosity),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_path` - Optional config file; skipped when it does not exist
    pub fn load(local_path: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(local) = local_path {
            if local.exists() {
                current = current.merge_with(&load_raw_settings(local)?);
            }
        }

        Self::apply_env_overrides(current)
    }

    /// Apply PROCESSIFY_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("PROCESSIFY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_bool("coerce_numbers") {
            settings.coerce_numbers = val;
        }
        if let Ok(val) = config.get_bool("coerce_booleans") {
            settings.coerce_booleans = val;
        }
        if let Ok(val) = config.get_bool("negated_flags") {
            settings.negated_flags = val;
        }
        if let Ok(val) = config.get::<u8>("verbosity") {
            settings.verbosity = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_created_then_coercion_enabled() {
        let settings = Settings::default();
        assert!(settings.coerce_numbers);
        assert!(settings.coerce_booleans);
        assert!(settings.negated_flags);
        assert_eq!(settings.verbosity, 0);
    }

    #[test]
    fn given_partial_overlay_when_merging_then_unspecified_fields_kept() {
        let overlay = RawSettings {
            coerce_numbers: Some(false),
            verbosity: Some(2),
            ..RawSettings::default()
        };

        let merged = Settings::default().merge_with(&overlay);

        assert!(!merged.coerce_numbers);
        assert!(merged.coerce_booleans);
        assert_eq!(merged.verbosity, 2);
    }

    #[test]
    fn given_settings_when_to_toml_then_contains_all_keys() {
        let rendered = Settings::default().to_toml().unwrap();
        assert!(rendered.contains("coerce_numbers = true"));
        assert!(rendered.contains("verbosity = 0"));
    }
}
