// crates/portainer-deployer-cli/src/api_client.rs
// ============================================================================
// Module: Stack API Client
// Description: Blocking HTTP client for the Portainer stack endpoints.
// Purpose: Turn one validated command into one API call and one envelope.
// Dependencies: portainer-deployer-config, portainer-deployer-core, reqwest,
// serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`StackApiClient`] performs exactly one HTTP request per operation and
//! always answers with a [`ResponseEnvelope`]. Failures of any kind are
//! captured as an [`ApiError`] and normalized by [`classify`], the single
//! mapping from errors to envelopes.
//!
//! Human-readable output (stack tables, creation notices) goes to a
//! caller-supplied writer so tests can capture it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use portainer_deployer_config::ConnectionProfile;
use portainer_deployer_core::INTERNAL_ERROR_CODE;
use portainer_deployer_core::NOT_FOUND_CODE;
use portainer_deployer_core::ResponseEnvelope;
use portainer_deployer_core::Stack;
use portainer_deployer_core::generate_stack_name;
use portainer_deployer_core::render_header;
use portainer_deployer_core::render_row;
use portainer_deployer_core::validate_stack_content;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::blocking::multipart::Form;
use reqwest::blocking::multipart::Part;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::audit::ApiCallEvent;
use crate::audit::ApiCallEventParams;
use crate::audit::ApiOutcome;
use crate::audit::AuditSink;
use crate::audit::TlsMode;
use crate::t;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the static API key.
pub const API_KEY_HEADER: &str = "X-API-Key";
/// Collection path for stacks.
const STACKS_PATH: &str = "/api/stacks";
/// Stack type for compose stacks.
const COMPOSE_STACK_TYPE: u8 = 2;
/// Request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Maximum redirects followed before failing.
const MAX_REDIRECTS: usize = 10;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures raised while performing a stack API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server could not be reached.
    #[error("connection failed: {0}")]
    Connect(String),
    /// The request timed out.
    #[error("request timed out: {0}")]
    Timeout(String),
    /// The redirect limit was exceeded.
    #[error("too many redirects: {0}")]
    Redirect(String),
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response.
        message: String,
        /// Details extracted from the response, if any.
        details: Option<String>,
    },
    /// No stack with the requested name exists.
    #[error("stack {0} not found")]
    StackNotFound(String),
    /// Stack content failed local validation.
    #[error("{0}")]
    InvalidStack(String),
    /// The HTTP client could not be configured.
    #[error("{0}")]
    Client(String),
    /// The response body could not be decoded.
    #[error("{0}")]
    Decode(String),
    /// A local file could not be read.
    #[error("{0}")]
    Io(String),
    /// Human-readable output could not be written.
    #[error("{0}")]
    Output(String),
    /// Any other transport failure.
    #[error("{0}")]
    Transport(String),
}

impl ApiError {
    /// Maps a transport error onto the matching variant.
    #[must_use]
    pub fn from_transport(err: &reqwest::Error) -> Self {
        let text = err.to_string();
        if err.is_timeout() {
            Self::Timeout(text)
        } else if err.is_redirect() {
            Self::Redirect(text)
        } else if err.is_connect() {
            Self::Connect(text)
        } else if err.is_decode() {
            Self::Decode(t!("api.error.decode", error = text))
        } else {
            Self::Transport(text)
        }
    }

    /// Returns a stable label for audit events.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Connect(_) => "connect",
            Self::Timeout(_) => "timeout",
            Self::Redirect(_) => "redirect",
            Self::Remote {
                ..
            } => "remote",
            Self::StackNotFound(_) => "not_found",
            Self::InvalidStack(_) => "invalid_stack",
            Self::Client(_) => "client",
            Self::Decode(_) => "decode",
            Self::Io(_) => "io",
            Self::Output(_) => "output",
            Self::Transport(_) => "transport",
        }
    }

    /// Returns true when the failure happened before any request was sent.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::InvalidStack(_) | Self::Io(_))
    }
}

impl From<io::Error> for ApiError {
    fn from(err: io::Error) -> Self {
        Self::Output(t!("api.error.output", error = err))
    }
}

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Normalizes the outcome of an API call into an envelope.
#[must_use]
pub fn classify(result: Result<ResponseEnvelope, ApiError>) -> ResponseEnvelope {
    let err = match result {
        Ok(envelope) => return envelope,
        Err(err) => err,
    };
    match err {
        ApiError::Connect(cause) => ResponseEnvelope::failure(t!("api.error.connection"))
            .with_details(cause)
            .with_code(INTERNAL_ERROR_CODE),
        ApiError::Timeout(cause) => ResponseEnvelope::failure(t!("api.error.timeout"))
            .with_details(cause)
            .with_code(INTERNAL_ERROR_CODE),
        ApiError::Redirect(cause) => ResponseEnvelope::failure(t!("api.error.redirects"))
            .with_details(cause)
            .with_code(INTERNAL_ERROR_CODE),
        ApiError::Remote {
            status,
            message,
            details,
        } => ResponseEnvelope::failure(message)
            .with_details(details.unwrap_or_default())
            .with_code(status),
        ApiError::StackNotFound(name) => {
            ResponseEnvelope::failure(t!("api.error.stack_not_found", name = name))
                .with_code(NOT_FOUND_CODE)
        }
        ApiError::InvalidStack(cause) => ResponseEnvelope::failure(t!("api.error.invalid_stack"))
            .with_details(cause)
            .with_code(INTERNAL_ERROR_CODE),
        other => ResponseEnvelope::failure(other.to_string()).with_code(INTERNAL_ERROR_CODE),
    }
}

/// Structured error body returned by Portainer.
#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    /// Short error message.
    message: Option<String>,
    /// Longer error description.
    details: Option<String>,
}

/// Builds a [`ApiError::Remote`] from a non-2xx status and its body.
#[must_use]
pub fn remote_error(status: StatusCode, body: &str) -> ApiError {
    let structured = serde_json::from_str::<RemoteErrorBody>(body).ok().and_then(|parsed| {
        let message = parsed.message.filter(|message| !message.trim().is_empty())?;
        Some((message, parsed.details))
    });
    let (message, details) = structured.unwrap_or_else(|| {
        let text = body.trim();
        let message = if text.is_empty() {
            status.canonical_reason().map_or_else(
                || t!("api.error.request_failed", status = status.as_u16()),
                str::to_string,
            )
        } else {
            text.to_string()
        };
        (message, None)
    });
    ApiError::Remote {
        status: status.as_u16(),
        message,
        details,
    }
}

// ============================================================================
// SECTION: Stack API
// ============================================================================

/// Stack selection for read operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackSelector {
    /// Every stack, in server order.
    All,
    /// The stack with this identifier.
    ById(u64),
    /// The first stack with this name.
    ByName(String),
}

/// Stack operations exposed to the dispatcher.
pub trait StackApi {
    /// Fetches stacks and writes them as a table to `out`.
    fn get_stack(&self, selector: &StackSelector, out: &mut dyn Write) -> ResponseEnvelope;

    /// Deploys inline compose content to `endpoint_id`.
    fn post_stack_from_string(
        &self,
        content: &str,
        endpoint_id: u64,
        name: Option<&str>,
        out: &mut dyn Write,
    ) -> ResponseEnvelope;

    /// Uploads the compose file at `path` to `endpoint_id`.
    fn post_stack_from_file(
        &self,
        path: &Path,
        endpoint_id: u64,
        name: Option<&str>,
        out: &mut dyn Write,
    ) -> ResponseEnvelope;
}

/// JSON body for string deployments.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StringStackRequest<'a> {
    /// Stack name.
    name: &'a str,
    /// Compose document text.
    stack_file_content: &'a str,
}

// ============================================================================
// SECTION: HTTP Client
// ============================================================================

/// Blocking Portainer client bound to one connection profile.
pub struct StackApiClient {
    /// Connection parameters.
    profile: ConnectionProfile,
    /// Configured HTTP client carrying the API key header.
    client: Client,
    /// Destination for call audit events.
    audit: Arc<dyn AuditSink>,
}

impl StackApiClient {
    /// Builds a client for `profile`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Client`] when the token is not a valid header value
    /// or the HTTP client cannot be built.
    pub fn new(profile: ConnectionProfile, audit: Arc<dyn AuditSink>) -> Result<Self, ApiError> {
        let mut token = HeaderValue::from_str(profile.api_token())
            .map_err(|err| ApiError::Client(t!("api.error.client", error = err)))?;
        token.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, token);
        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .danger_accept_invalid_certs(!profile.verify_tls())
            .build()
            .map_err(|err| ApiError::Client(t!("api.error.client", error = err)))?;
        Ok(Self {
            profile,
            client,
            audit,
        })
    }

    /// Returns the TLS mode reported in audit events.
    fn tls_mode(&self) -> TlsMode {
        if self.profile.verify_tls() {
            TlsMode::Verified
        } else if self.profile.insecure_acknowledged() {
            TlsMode::InsecureAcknowledged
        } else {
            TlsMode::Unverified
        }
    }

    /// Joins `path_and_query` onto the connection base.
    fn url(&self, path_and_query: &str) -> String {
        format!("{}{path_and_query}", self.profile.connection_base())
    }

    /// Builds the deploy URL for `method` and `endpoint_id`.
    fn deploy_url(&self, method: &str, endpoint_id: u64) -> String {
        self.url(&format!(
            "{STACKS_PATH}?type={COMPOSE_STACK_TYPE}&method={method}&endpointId={endpoint_id}"
        ))
    }

    /// Classifies `result` and records an audit event for calls that reached the network.
    fn finish(
        &self,
        method: &'static str,
        path: &str,
        endpoint_id: Option<u64>,
        result: Result<ResponseEnvelope, ApiError>,
    ) -> ResponseEnvelope {
        if result.as_ref().is_err_and(ApiError::is_local) {
            return classify(result);
        }
        let error_kind = result.as_ref().err().map(ApiError::kind);
        let envelope = classify(result);
        let outcome = if envelope.is_success() { ApiOutcome::Success } else { ApiOutcome::Failure };
        self.audit.record(&ApiCallEvent::new(ApiCallEventParams {
            method,
            path: path.to_string(),
            endpoint_id,
            outcome,
            status_code: envelope.code,
            error_kind,
            tls: self.tls_mode(),
        }));
        envelope
    }

    /// Fetches and prints the stacks matched by `selector`.
    fn fetch_stacks(
        &self,
        selector: &StackSelector,
        path: &str,
        out: &mut dyn Write,
    ) -> Result<ResponseEnvelope, ApiError> {
        let response = send(self.client.get(self.url(path)))?;
        let code = response.status().as_u16();
        let stacks = match selector {
            StackSelector::ById(_) => vec![decode::<Stack>(response)?],
            StackSelector::ByName(name) => {
                let found = decode::<Vec<Stack>>(response)?
                    .into_iter()
                    .find(|stack| stack.name == *name)
                    .ok_or_else(|| ApiError::StackNotFound(name.clone()))?;
                vec![found]
            }
            StackSelector::All => decode::<Vec<Stack>>(response)?,
        };
        writeln!(out, "{}", render_header())?;
        for stack in &stacks {
            writeln!(out, "{}", render_row(stack))?;
        }
        Ok(ResponseEnvelope::success(t!("api.get.ok"), Some(code)))
    }

    /// Validates and submits inline content.
    fn submit_string(
        &self,
        content: &str,
        endpoint_id: u64,
        name: Option<&str>,
        out: &mut dyn Write,
    ) -> Result<ResponseEnvelope, ApiError> {
        validate_stack_content(content).map_err(|err| ApiError::InvalidStack(err.to_string()))?;
        let name = name.map_or_else(generate_stack_name, str::to_string);
        let body = StringStackRequest {
            name: &name,
            stack_file_content: content,
        };
        let response =
            send(self.client.post(self.deploy_url("string", endpoint_id)).json(&body))?;
        writeln!(out, "{}", t!("api.post.created", name = name))?;
        Ok(ResponseEnvelope::success(t!("api.post_string.ok"), Some(response.status().as_u16())))
    }

    /// Validates and uploads a compose file.
    fn submit_file(
        &self,
        path: &Path,
        endpoint_id: u64,
        name: Option<&str>,
        out: &mut dyn Write,
    ) -> Result<ResponseEnvelope, ApiError> {
        let name = name.map_or_else(generate_stack_name, str::to_string);
        let content = fs::read_to_string(path).map_err(|err| {
            ApiError::Io(t!("api.error.read_stack", path = path.display(), error = err))
        })?;
        validate_stack_content(&content).map_err(|err| ApiError::InvalidStack(err.to_string()))?;
        let file_name = path
            .file_name()
            .map_or_else(|| "stack.yml".to_string(), |name| name.to_string_lossy().into_owned());
        let form = Form::new()
            .text("Name", name.clone())
            .part("file", Part::bytes(content.into_bytes()).file_name(file_name));
        let response =
            send(self.client.post(self.deploy_url("file", endpoint_id)).multipart(form))?;
        writeln!(out, "{}", t!("api.post.created", name = name))?;
        Ok(ResponseEnvelope::success(
            t!("api.post_file.ok", name = name, path = path.display(), endpoint = endpoint_id),
            Some(response.status().as_u16()),
        ))
    }
}

impl StackApi for StackApiClient {
    fn get_stack(&self, selector: &StackSelector, out: &mut dyn Write) -> ResponseEnvelope {
        let path = match selector {
            StackSelector::ById(id) => format!("{STACKS_PATH}/{id}"),
            StackSelector::All | StackSelector::ByName(_) => STACKS_PATH.to_string(),
        };
        let result = self.fetch_stacks(selector, &path, out);
        self.finish("GET", &path, None, result)
    }

    fn post_stack_from_string(
        &self,
        content: &str,
        endpoint_id: u64,
        name: Option<&str>,
        out: &mut dyn Write,
    ) -> ResponseEnvelope {
        let result = self.submit_string(content, endpoint_id, name, out);
        self.finish("POST", STACKS_PATH, Some(endpoint_id), result)
    }

    fn post_stack_from_file(
        &self,
        path: &Path,
        endpoint_id: u64,
        name: Option<&str>,
        out: &mut dyn Write,
    ) -> ResponseEnvelope {
        let result = self.submit_file(path, endpoint_id, name, out);
        self.finish("POST", STACKS_PATH, Some(endpoint_id), result)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Sends a request and converts non-2xx answers into [`ApiError::Remote`].
fn send(request: reqwest::blocking::RequestBuilder) -> Result<Response, ApiError> {
    let response = request.send().map_err(|err| ApiError::from_transport(&err))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(remote_error(status, &body))
}

/// Decodes a JSON response body.
fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response.json::<T>().map_err(|err| ApiError::Decode(t!("api.error.decode", error = err)))
}
