// crates/portainer-deployer-cli/src/audit.rs
// ============================================================================
// Module: API Call Audit Logging
// Description: Structured audit events for outbound stack API calls.
// Purpose: Emit redacted JSON-line logs without a logging framework.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every call made by [`crate::api_client::StackApiClient`] emits one
//! [`ApiCallEvent`] to the configured [`AuditSink`]. Events never carry the
//! API token or request bodies.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome label for an API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiOutcome {
    /// The envelope reported success.
    Success,
    /// The envelope reported failure.
    Failure,
}

/// TLS verification mode in effect for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsMode {
    /// Certificates are verified.
    Verified,
    /// Verification disabled by the operator over `https`.
    InsecureAcknowledged,
    /// Verification disabled over a plaintext scheme.
    Unverified,
}

/// API call audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct ApiCallEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// HTTP method.
    pub method: &'static str,
    /// Request path without host or query.
    pub path: String,
    /// Target endpoint for deploy calls.
    pub endpoint_id: Option<u64>,
    /// Call outcome.
    pub outcome: ApiOutcome,
    /// Envelope status code when present.
    pub status_code: Option<u16>,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// TLS verification mode.
    pub tls: TlsMode,
}

/// Inputs required to construct an [`ApiCallEvent`].
pub struct ApiCallEventParams {
    /// HTTP method.
    pub method: &'static str,
    /// Request path without host or query.
    pub path: String,
    /// Target endpoint for deploy calls.
    pub endpoint_id: Option<u64>,
    /// Call outcome.
    pub outcome: ApiOutcome,
    /// Envelope status code when present.
    pub status_code: Option<u16>,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// TLS verification mode.
    pub tls: TlsMode,
}

impl ApiCallEvent {
    /// Creates a new API call event stamped with the current time.
    #[must_use]
    pub fn new(params: ApiCallEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "api_call",
            timestamp_ms,
            method: params.method,
            path: params.path,
            endpoint_id: params.endpoint_id,
            outcome: params.outcome,
            status_code: params.status_code,
            error_kind: params.error_kind,
            tls: params.tls,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for API call events.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &ApiCallEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &ApiCallEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &ApiCallEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Audit sink that drops all events.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &ApiCallEvent) {}
}
