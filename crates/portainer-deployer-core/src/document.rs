// crates/portainer-deployer-core/src/document.rs
// ============================================================================
// Module: Stack Documents
// Description: YAML parsing and validation for stack definitions.
// Purpose: Reject malformed stack content before it leaves the machine.
// Dependencies: serde_yaml, thiserror
// ============================================================================

//! ## Overview
//! Stack definitions are YAML compose documents. A submission is valid only
//! when it parses and its root is a mapping.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_yaml::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Stack document validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// Content is not valid YAML.
    #[error("stack is not in a valid yaml format: {0}")]
    Parse(String),
    /// Content parsed but its root is not a mapping.
    #[error("stack is not in a valid yaml format: expected a mapping at the document root")]
    NotMapping,
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parses YAML text into a document tree. Empty text yields `Value::Null`.
///
/// # Errors
///
/// Returns [`DocumentError::Parse`] when the text is not valid YAML.
pub fn parse_document(content: &str) -> Result<Value, DocumentError> {
    if content.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_yaml::from_str::<Value>(content).map_err(|err| DocumentError::Parse(err.to_string()))
}

/// Validates that `content` is a YAML mapping suitable for submission.
///
/// # Errors
///
/// Returns [`DocumentError`] when the text does not parse or is not a mapping.
pub fn validate_stack_content(content: &str) -> Result<(), DocumentError> {
    match parse_document(content)? {
        Value::Mapping(_) => Ok(()),
        _ => Err(DocumentError::NotMapping),
    }
}
