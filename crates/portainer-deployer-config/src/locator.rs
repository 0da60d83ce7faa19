// crates/portainer-deployer-config/src/locator.rs
// ============================================================================
// Module: Config Locator
// Description: Bootstrap file pointing at the main settings file.
// Purpose: Resolve and update the active settings path.
// Dependencies: crate::store
// ============================================================================

//! ## Overview
//! The locator is a small TOML file whose `CONFIG` section stores
//! `path_to_config`, the path of the main settings file. Its own location is
//! taken from an explicit path, the [`LOCATOR_ENV_VAR`] override, or a file
//! under the user's home directory.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::path::Path;
use std::path::PathBuf;

use crate::store::ConfigError;
use crate::store::ConfigStore;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable overriding the locator file path.
pub const LOCATOR_ENV_VAR: &str = "PORTAINER_DEPLOYER_LOCATOR";
/// Locator section holding the settings path.
pub const LOCATOR_SECTION: &str = "CONFIG";
/// Locator key holding the settings path.
pub const SETTINGS_PATH_KEY: &str = "path_to_config";
/// Directory under `$HOME` holding the default locator.
const DEFAULT_LOCATOR_DIR: &str = ".portainer_deployer";
/// Default locator file name.
const DEFAULT_LOCATOR_NAME: &str = "locator.toml";
/// Maximum accepted length for a configured path.
const MAX_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Locator
// ============================================================================

/// Bootstrap pointer to the main settings file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocator {
    /// Store backing the locator file.
    store: ConfigStore,
}

impl ConfigLocator {
    /// Uses the locator file at `path`.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            store: ConfigStore::new(path),
        }
    }

    /// Resolves the locator from an explicit path, the environment, or `$HOME`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when no location can be determined.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Ok(Self::at(path));
        }
        if let Ok(env_path) = env::var(LOCATOR_ENV_VAR) {
            if env_path.len() > MAX_PATH_LENGTH {
                return Err(ConfigError::Invalid(format!("{LOCATOR_ENV_VAR} exceeds max length")));
            }
            if !env_path.trim().is_empty() {
                return Ok(Self::at(env_path));
            }
        }
        let home = env::var_os("HOME").filter(|home| !home.is_empty()).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "unable to locate the home directory; set {LOCATOR_ENV_VAR} or pass --locator"
            ))
        })?;
        Ok(Self::at(PathBuf::from(home).join(DEFAULT_LOCATOR_DIR).join(DEFAULT_LOCATOR_NAME)))
    }

    /// Returns the locator file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Returns the configured settings path.
    ///
    /// Relative paths are resolved against the locator's directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the locator is missing or holds no path.
    pub fn settings_path(&self) -> Result<PathBuf, ConfigError> {
        let raw = self.store.get(LOCATOR_SECTION, SETTINGS_PATH_KEY)?;
        let configured = PathBuf::from(raw.trim());
        if configured.is_absolute() {
            return Ok(configured);
        }
        let base = self.path().parent().map_or_else(PathBuf::new, Path::to_path_buf);
        Ok(base.join(configured))
    }

    /// Opens the settings store the locator points at.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the settings path cannot be resolved.
    pub fn settings_store(&self) -> Result<ConfigStore, ConfigError> {
        self.settings_path().map(ConfigStore::new)
    }

    /// Points the locator at `settings_path` after checking it is a file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFile`] when the target is not a regular
    /// file, or a storage error when the locator cannot be written.
    pub fn update_settings_path(&self, settings_path: &Path) -> Result<(), ConfigError> {
        let rendered = settings_path.to_string_lossy();
        if rendered.len() > MAX_PATH_LENGTH {
            return Err(ConfigError::Invalid("settings path exceeds max length".to_string()));
        }
        if !settings_path.is_file() {
            return Err(ConfigError::MissingFile(rendered.into_owned()));
        }
        self.store.set(LOCATOR_SECTION, SETTINGS_PATH_KEY, &rendered)
    }
}
