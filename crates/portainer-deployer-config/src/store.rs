// crates/portainer-deployer-config/src/store.rs
// ============================================================================
// Module: Config Store
// Description: Section-scoped key/value storage backed by a TOML file.
// Purpose: Read and write settings with no cross-call caching.
// Dependencies: tempfile, thiserror, toml
// ============================================================================

//! ## Overview
//! [`ConfigStore`] maps `(section, key)` pairs to string values persisted in
//! a TOML file. Section names are case-insensitive and normalized to upper
//! case; keys are case-insensitive and normalized to lower case.
//!
//! ## Invariants
//! - Every operation re-reads the backing file.
//! - Unknown sections and keys are errors, never silent defaults.
//! - Writes rewrite the whole document through a temp file and rename.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use thiserror::Error;
use toml::Table;
use toml::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum size accepted for a settings file.
pub const MAX_CONFIG_FILE_BYTES: u64 = 1024 * 1024;

/// Literals accepted as boolean `true`.
const TRUTHY: [&str; 4] = ["true", "1", "yes", "on"];
/// Literals accepted as boolean `false`.
const FALSY: [&str; 4] = ["false", "0", "no", "off"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration storage errors.
///
/// # Invariants
/// - Variants are stable for CLI error mapping and tests.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading or writing a config file.
    #[error("config io error at {path}: {error}")]
    Io {
        /// File involved in the failure.
        path: String,
        /// Underlying error text.
        error: String,
    },
    /// TOML parsing failure.
    #[error("config parse error in {path}: {error}")]
    Parse {
        /// File that failed to parse.
        path: String,
        /// Parser error text.
        error: String,
    },
    /// Config file does not exist or is not a regular file.
    #[error("{0} does not exist or is not a file")]
    MissingFile(String),
    /// Requested section is absent.
    #[error("section [{section}] not found in {path}")]
    MissingSection {
        /// Normalized section name.
        section: String,
        /// File that was searched.
        path: String,
    },
    /// Requested key is absent from an existing section.
    #[error("key '{key}' not found in section [{section}]")]
    MissingKey {
        /// Normalized section name.
        section: String,
        /// Normalized key name.
        key: String,
    },
    /// Value is not one of the accepted boolean literals.
    #[error("value '{value}' for {section}.{key} is not a boolean (expected true/false/1/0/yes/no/on/off)")]
    InvalidBoolean {
        /// Normalized section name.
        section: String,
        /// Normalized key name.
        key: String,
        /// Offending raw value.
        value: String,
    },
    /// Value is a nested table or array instead of a scalar.
    #[error("value for {section}.{key} must be a scalar")]
    InvalidValue {
        /// Normalized section name.
        section: String,
        /// Normalized key name.
        key: String,
    },
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Section-scoped settings file.
///
/// # Invariants
/// - Holds only the backing path; file content is never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    /// Backing TOML file.
    path: PathBuf,
}

impl ConfigStore {
    /// Creates a store backed by `path`. The file is not touched until used.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the value stored at `section.key`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file, section, or key is missing, or
    /// the value is not a scalar.
    pub fn get(&self, section: &str, key: &str) -> Result<String, ConfigError> {
        let document = self.load()?;
        let (section_name, table) = self.find_section(&document, section)?;
        let normalized_key = normalize_key(key);
        let value = find_key(table, &normalized_key).map(|(_, value)| value).ok_or_else(|| {
            ConfigError::MissingKey {
                section: section_name.clone(),
                key: normalized_key.clone(),
            }
        })?;
        scalar_to_string(value).ok_or(ConfigError::InvalidValue {
            section: section_name,
            key: normalized_key,
        })
    }

    /// Reads `section.key` and interprets it as a boolean literal.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBoolean`] for unrecognized literals, or
    /// any error produced by [`ConfigStore::get`].
    pub fn get_bool(&self, section: &str, key: &str) -> Result<bool, ConfigError> {
        let value = self.get(section, key)?;
        parse_bool(&value).ok_or_else(|| ConfigError::InvalidBoolean {
            section: normalize_section(section),
            key: normalize_key(key),
            value,
        })
    }

    /// Stores `value` at `section.key`, creating the section and file when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the existing file cannot be parsed or the
    /// rewritten document cannot be persisted.
    pub fn set(&self, section: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut document = match self.load() {
            Ok(document) => document,
            Err(ConfigError::MissingFile(_)) => Table::new(),
            Err(err) => return Err(err),
        };
        let section_name = normalize_section(section);
        let existing = document
            .keys()
            .find(|name| name.eq_ignore_ascii_case(&section_name))
            .cloned();
        let mut table = match existing {
            Some(name) => match document.remove(&name) {
                Some(Value::Table(table)) => table,
                Some(_) => {
                    return Err(ConfigError::Invalid(format!(
                        "[{section_name}] in {} is not a section",
                        self.path.display()
                    )));
                }
                None => Table::new(),
            },
            None => Table::new(),
        };
        let normalized_key = normalize_key(key);
        table.retain(|name, _| !name.eq_ignore_ascii_case(&normalized_key));
        table.insert(normalized_key, Value::String(value.to_string()));
        document.insert(section_name, Value::Table(table));
        self.persist(&document)
    }

    /// Returns a copy of every scalar pair stored in `section`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file or section is missing or any value
    /// is not a scalar.
    pub fn section_snapshot(&self, section: &str) -> Result<BTreeMap<String, String>, ConfigError> {
        let document = self.load()?;
        let (section_name, table) = self.find_section(&document, section)?;
        let mut snapshot = BTreeMap::new();
        for (key, value) in table {
            let normalized_key = normalize_key(key);
            let rendered = scalar_to_string(value).ok_or_else(|| ConfigError::InvalidValue {
                section: section_name.clone(),
                key: normalized_key.clone(),
            })?;
            snapshot.insert(normalized_key, rendered);
        }
        Ok(snapshot)
    }

    /// Loads and parses the backing file.
    fn load(&self) -> Result<Table, ConfigError> {
        let display = self.path.display().to_string();
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(ConfigError::MissingFile(display));
            }
            Err(err) => {
                return Err(ConfigError::Io {
                    path: display,
                    error: err.to_string(),
                });
            }
        };
        if !metadata.is_file() {
            return Err(ConfigError::MissingFile(display));
        }
        if metadata.len() > MAX_CONFIG_FILE_BYTES {
            return Err(ConfigError::Invalid(format!("{display} exceeds the config size limit")));
        }
        let content = fs::read_to_string(&self.path).map_err(|err| ConfigError::Io {
            path: display.clone(),
            error: err.to_string(),
        })?;
        toml::from_str::<Table>(&content).map_err(|err| ConfigError::Parse {
            path: display,
            error: err.to_string(),
        })
    }

    /// Finds a section by case-insensitive name.
    fn find_section<'a>(
        &self,
        document: &'a Table,
        section: &str,
    ) -> Result<(String, &'a Table), ConfigError> {
        let section_name = normalize_section(section);
        let found = document
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&section_name))
            .and_then(|(_, value)| value.as_table());
        found.map(|table| (section_name.clone(), table)).ok_or_else(|| ConfigError::MissingSection {
            section: section_name,
            path: self.path.display().to_string(),
        })
    }

    /// Writes the document through a sibling temp file and atomic rename.
    fn persist(&self, document: &Table) -> Result<(), ConfigError> {
        let display = self.path.display().to_string();
        let io_error = |err: std::io::Error| ConfigError::Io {
            path: display.clone(),
            error: err.to_string(),
        };
        let rendered = toml::to_string(document).map_err(|err| ConfigError::Invalid(err.to_string()))?;
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(io_error)?;
        let mut temp = NamedTempFile::new_in(&parent).map_err(io_error)?;
        temp.write_all(rendered.as_bytes()).map_err(io_error)?;
        temp.as_file().sync_all().map_err(io_error)?;
        temp.persist(&self.path).map_err(|err| io_error(err.error))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a boolean literal (case-insensitive).
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    let lowered = value.trim().to_ascii_lowercase();
    if TRUTHY.contains(&lowered.as_str()) {
        Some(true)
    } else if FALSY.contains(&lowered.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Normalizes a section name for lookup and storage.
#[must_use]
pub fn normalize_section(section: &str) -> String {
    section.trim().to_ascii_uppercase()
}

/// Normalizes a key name for lookup and storage.
#[must_use]
pub fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}

/// Finds a key by case-insensitive name.
fn find_key<'a>(table: &'a Table, key: &str) -> Option<(&'a String, &'a Value)> {
    table.iter().find(|(name, _)| name.eq_ignore_ascii_case(key))
}

/// Renders scalar TOML values as strings; nested values yield `None`.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Integer(number) => Some(number.to_string()),
        Value::Float(number) => Some(number.to_string()),
        Value::Boolean(flag) => Some(flag.to_string()),
        Value::Datetime(datetime) => Some(datetime.to_string()),
        Value::Array(_) | Value::Table(_) => None,
    }
}
