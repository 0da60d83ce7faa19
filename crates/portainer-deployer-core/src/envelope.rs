// crates/portainer-deployer-core/src/envelope.rs
// ============================================================================
// Module: Response Envelope
// Description: Uniform result record for every remote-facing operation.
// Purpose: Carry success or failure to the process boundary in one shape.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every command ends in exactly one [`ResponseEnvelope`]. Only its `status`
//! flag and its `message`/`details` strings matter downstream; HTTP codes are
//! carried for display and tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Code used for transport and unexpected failures.
pub const INTERNAL_ERROR_CODE: u16 = 500;
/// Code used when a requested stack does not exist.
pub const NOT_FOUND_CODE: u16 = 404;

// ============================================================================
// SECTION: Envelope
// ============================================================================

/// Uniform `{message, details, status, code}` result.
///
/// # Invariants
/// - `status` is true only for confirmed success.
/// - `details` falls back to `message` when no detail is supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseEnvelope {
    /// Short human-readable outcome.
    pub message: String,
    /// Longer explanation; equals `message` unless set.
    pub details: String,
    /// True only on confirmed success.
    pub status: bool,
    /// HTTP status code when applicable.
    pub code: Option<u16>,
}

impl ResponseEnvelope {
    /// Builds a success envelope.
    #[must_use]
    pub fn success(message: impl Into<String>, code: Option<u16>) -> Self {
        let message = message.into();
        Self {
            details: message.clone(),
            message,
            status: true,
            code,
        }
    }

    /// Builds a failure envelope with no code and details equal to `message`.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            details: message.clone(),
            message,
            status: false,
            code: None,
        }
    }

    /// Replaces the details; blank details keep the message fallback.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        let details = details.into();
        if !details.trim().is_empty() {
            self.details = details;
        }
        self
    }

    /// Sets the status code.
    #[must_use]
    pub const fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    /// Returns true for confirmed success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status
    }
}
