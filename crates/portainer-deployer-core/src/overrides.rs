// crates/portainer-deployer-core/src/overrides.rs
// ============================================================================
// Module: Override Literals
// Description: Validation of `key=value` tokens from the command line.
// Purpose: Reject malformed overrides before any file or network I/O.
// Dependencies: thiserror, crate::patch
// ============================================================================

//! ## Overview
//! Two literal families are accepted:
//! - Stack overrides `a.b.c=value` or `a.b.c=[x,y,z]`, applied with
//!   [`crate::apply_patch`].
//! - Settings references `section.key` and assignments `section.key=value`,
//!   used by the `config` command.
//!
//! Key segments are ASCII alphanumerics or underscores. Scalar values must be
//! non-empty and bracket-free; list values are wrapped in `[` and `]`, hold
//! no inner `]`, and are split on commas.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::patch::KeyPath;
use crate::patch::PatchValue;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Literal syntax errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OverrideError {
    /// Stack override does not match `key(.key)*=value`.
    #[error("invalid key=value pair: {0}")]
    Syntax(String),
    /// Settings literal does not match `section.key[=value]`.
    #[error("invalid config pair: {0}")]
    ConfigSyntax(String),
}

// ============================================================================
// SECTION: Stack Overrides
// ============================================================================

/// Parsed stack override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueOverride {
    /// Destination path inside the stack document.
    pub key_path: KeyPath,
    /// Replacement value.
    pub value: PatchValue,
}

/// Returns true when `token` is a well-formed stack override.
#[must_use]
pub fn validate_key_value(token: &str) -> bool {
    parse_override(token).is_ok()
}

/// Parses a stack override token.
///
/// # Errors
///
/// Returns [`OverrideError::Syntax`] when the token is malformed.
pub fn parse_override(token: &str) -> Result<KeyValueOverride, OverrideError> {
    let syntax = || OverrideError::Syntax(token.to_string());
    let (key, raw_value) = token.split_once('=').ok_or_else(syntax)?;
    if !key.split('.').all(is_key_segment) {
        return Err(syntax());
    }
    let key_path = KeyPath::parse(key).map_err(|_| syntax())?;
    let value = parse_value_literal(raw_value).ok_or_else(syntax)?;
    Ok(KeyValueOverride {
        key_path,
        value,
    })
}

/// Parses the right-hand side of an override.
fn parse_value_literal(raw: &str) -> Option<PatchValue> {
    if let Some(rest) = raw.strip_prefix('[') {
        let inner = rest.strip_suffix(']')?;
        if inner.contains(']') {
            return None;
        }
        if inner.is_empty() {
            return Some(PatchValue::List(Vec::new()));
        }
        let items = inner
            .split(',')
            .map(|item| item.strip_prefix(' ').unwrap_or(item).to_string())
            .collect();
        return Some(PatchValue::List(items));
    }
    if raw.is_empty() || raw.contains(['[', ']']) {
        return None;
    }
    Some(PatchValue::Scalar(raw.to_string()))
}

/// Returns true for non-empty segments of ASCII alphanumerics or underscores.
fn is_key_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

// ============================================================================
// SECTION: Settings Literals
// ============================================================================

/// Settings location in `section.key` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigReference {
    /// Section name as typed.
    pub section: String,
    /// Key name as typed.
    pub key: String,
}

/// Settings write in `section.key=value` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigAssignment {
    /// Destination of the write.
    pub reference: ConfigReference,
    /// Value to store; may be empty.
    pub value: String,
}

/// Parses a `section.key` literal.
///
/// # Errors
///
/// Returns [`OverrideError::ConfigSyntax`] unless the literal has exactly two
/// non-empty dot-separated parts.
pub fn parse_config_reference(raw: &str) -> Result<ConfigReference, OverrideError> {
    let mut parts = raw.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(section), Some(key), None)
            if !section.trim().is_empty() && !key.trim().is_empty() =>
        {
            Ok(ConfigReference {
                section: section.trim().to_string(),
                key: key.trim().to_string(),
            })
        }
        _ => Err(OverrideError::ConfigSyntax(raw.to_string())),
    }
}

/// Parses a `section.key=value` literal. The value is everything after the
/// first `=`.
///
/// # Errors
///
/// Returns [`OverrideError::ConfigSyntax`] when the literal is malformed.
pub fn parse_config_assignment(raw: &str) -> Result<ConfigAssignment, OverrideError> {
    let (target, value) =
        raw.split_once('=').ok_or_else(|| OverrideError::ConfigSyntax(raw.to_string()))?;
    let reference =
        parse_config_reference(target).map_err(|_| OverrideError::ConfigSyntax(raw.to_string()))?;
    Ok(ConfigAssignment {
        reference,
        value: value.to_string(),
    })
}
