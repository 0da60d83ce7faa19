// crates/portainer-deployer-core/src/patch.rs
// ============================================================================
// Module: Path Patcher
// Description: Dot-notation in-place edits of YAML stack files.
// Purpose: Customize a stack definition before it is submitted.
// Dependencies: serde_yaml, thiserror
// ============================================================================

//! ## Overview
//! [`apply_patch`] loads a YAML file, walks a [`KeyPath`] through nested
//! mappings, replaces the value at the final segment, and writes the file
//! back. Missing intermediate mappings are created; an intermediate that
//! exists but is not a mapping is a [`PatchError::ConflictingType`].
//!
//! ## Invariants
//! - The file is written only after the edit and serialization succeed.
//! - An empty or `null` document is treated as an empty mapping.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_yaml::Mapping;
use serde_yaml::Value;
use thiserror::Error;

use crate::document::parse_document;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Stack file patch errors.
///
/// # Invariants
/// - None of these leave the target file modified.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    /// Target file does not exist.
    #[error("file {0} not found")]
    FileNotFound(String),
    /// Target file could not be read or written.
    #[error("unable to access {path}: {error}")]
    Io {
        /// File involved in the failure.
        path: String,
        /// Underlying error text.
        error: String,
    },
    /// Target file is not valid YAML.
    #[error("unable to parse {path}: {error}")]
    Parse {
        /// File that failed to parse.
        path: String,
        /// Parser error text.
        error: String,
    },
    /// Dot path is empty or holds an empty segment.
    #[error("invalid key path '{0}'")]
    InvalidPath(String),
    /// An intermediate segment holds a non-mapping value.
    #[error("wrong key sequence {path}: '{segment}' is not a mapping in {file}")]
    ConflictingType {
        /// Full dot path being written.
        path: String,
        /// Dot prefix whose value is not a mapping.
        segment: String,
        /// File being patched.
        file: String,
    },
    /// Edited document could not be serialized.
    #[error("unable to serialize {path}: {error}")]
    Serialize {
        /// File being patched.
        path: String,
        /// Serializer error text.
        error: String,
    },
}

// ============================================================================
// SECTION: Key Paths
// ============================================================================

/// Non-empty sequence of mapping keys parsed from dot notation.
///
/// # Invariants
/// - Holds at least one segment; no segment is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    /// Ordered path segments.
    segments: Vec<String>,
}

impl KeyPath {
    /// Splits `raw` on `.` into segments.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::InvalidPath`] when any segment is empty.
    pub fn parse(raw: &str) -> Result<Self, PatchError> {
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(PatchError::InvalidPath(raw.to_string()));
        }
        Ok(Self {
            segments,
        })
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the dot-joined prefix of the first `depth` segments.
    fn prefix(&self, depth: usize) -> String {
        if depth == 0 {
            return "<document root>".to_string();
        }
        self.segments[..depth].join(".")
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

// ============================================================================
// SECTION: Values
// ============================================================================

/// Replacement value written at the end of a key path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchValue {
    /// Single string scalar.
    Scalar(String),
    /// Ordered list of strings.
    List(Vec<String>),
}

impl PatchValue {
    /// Converts the value into a YAML node.
    #[must_use]
    pub fn to_yaml(&self) -> Value {
        match self {
            Self::Scalar(text) => Value::String(text.clone()),
            Self::List(items) => Value::Sequence(items.iter().cloned().map(Value::String).collect()),
        }
    }
}

// ============================================================================
// SECTION: Patching
// ============================================================================

/// Replaces the value at `dot_path` inside the YAML file at `file_path`.
///
/// # Errors
///
/// Returns [`PatchError`] when the file is missing or unparsable, the path is
/// invalid, an intermediate is not a mapping, or the write fails. The file is
/// left untouched unless the final write itself fails.
pub fn apply_patch(
    file_path: &Path,
    dot_path: &str,
    new_value: &PatchValue,
) -> Result<(), PatchError> {
    let mut document = load_document(file_path)?;
    let key_path = KeyPath::parse(dot_path)?;
    set_path(&mut document, &key_path, new_value.to_yaml()).map_err(|conflict| {
        PatchError::ConflictingType {
            path: key_path.to_string(),
            segment: conflict.segment,
            file: file_path.display().to_string(),
        }
    })?;
    let rendered = serde_yaml::to_string(&document).map_err(|err| PatchError::Serialize {
        path: file_path.display().to_string(),
        error: err.to_string(),
    })?;
    fs::write(file_path, rendered).map_err(|err| PatchError::Io {
        path: file_path.display().to_string(),
        error: err.to_string(),
    })
}

/// Loads and parses a YAML file.
///
/// # Errors
///
/// Returns [`PatchError::FileNotFound`], [`PatchError::Io`], or
/// [`PatchError::Parse`].
pub fn load_document(file_path: &Path) -> Result<Value, PatchError> {
    let display = file_path.display().to_string();
    let content = fs::read_to_string(file_path).map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            PatchError::FileNotFound(display.clone())
        } else {
            PatchError::Io {
                path: display.clone(),
                error: err.to_string(),
            }
        }
    })?;
    parse_document(&content).map_err(|err| PatchError::Parse {
        path: display,
        error: err.to_string(),
    })
}

/// Intermediate node that blocked a traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConflict {
    /// Dot prefix whose value is not a mapping.
    pub segment: String,
}

/// Sets `value` at `key_path` inside an in-memory document.
///
/// # Errors
///
/// Returns [`PathConflict`] naming the first prefix that holds a non-mapping.
pub fn set_path(
    document: &mut Value,
    key_path: &KeyPath,
    value: Value,
) -> Result<(), PathConflict> {
    if document.is_null() {
        *document = Value::Mapping(Mapping::new());
    }
    let Some((last, parents)) = key_path.segments.split_last() else {
        return Err(PathConflict {
            segment: key_path.prefix(0),
        });
    };
    let mut current = document;
    for (depth, segment) in parents.iter().enumerate() {
        let Value::Mapping(map) = current else {
            return Err(PathConflict {
                segment: key_path.prefix(depth),
            });
        };
        current = map
            .entry(Value::String(segment.clone()))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
    }
    let Value::Mapping(map) = current else {
        return Err(PathConflict {
            segment: key_path.prefix(parents.len()),
        });
    };
    map.insert(Value::String(last.clone()), value);
    Ok(())
}

/// Reads the value at `key_path`, if every segment is present.
#[must_use]
pub fn get_path<'a>(document: &'a Value, key_path: &KeyPath) -> Option<&'a Value> {
    key_path
        .segments
        .iter()
        .try_fold(document, |node, segment| node.as_mapping()?.get(segment.as_str()))
}
