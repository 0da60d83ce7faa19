// crates/portainer-deployer-cli/src/dispatch.rs
// ============================================================================
// Module: Command Dispatcher
// Description: Validation and execution of parsed subcommands.
// Purpose: Ensure every invocation ends in exactly one response envelope.
// Dependencies: portainer-deployer-config, portainer-deployer-core, thiserror
// ============================================================================

//! ## Overview
//! [`dispatch`] validates a parsed [`Command`] before any network or file
//! I/O, then either edits settings directly (`config`) or connects to the
//! server through an [`ApiConnector`] (`get`, `deploy`).
//!
//! ## Invariants
//! - Override tokens are all validated before the first patch.
//! - The connection profile is loaded before any stack file is patched.
//! - Settings assignments are all validated before the first write.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use portainer_deployer_config::ConfigError;
use portainer_deployer_config::ConfigLocator;
use portainer_deployer_config::ConnectionProfile;
use portainer_deployer_config::PORTAINER_SECTION;
use portainer_deployer_core::KeyValueOverride;
use portainer_deployer_core::PatchError;
use portainer_deployer_core::ResponseEnvelope;
use portainer_deployer_core::apply_patch;
use portainer_deployer_core::parse_config_assignment;
use portainer_deployer_core::parse_config_reference;
use portainer_deployer_core::parse_override;
use thiserror::Error;

use crate::api_client::ApiError;
use crate::api_client::StackApi;
use crate::api_client::StackApiClient;
use crate::api_client::StackSelector;
use crate::api_client::classify;
use crate::audit::AuditSink;
use crate::cli::Command;
use crate::cli::ConfigArgs;
use crate::cli::DeployArgs;
use crate::cli::GetArgs;
use crate::t;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Local failures raised before or instead of an API call.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Neither inline content nor `--path` was supplied.
    #[error("no stack specified")]
    MissingStack,
    /// `--update-keys` was combined with inline content.
    #[error("--update-keys used with inline stack content")]
    UpdateKeysWithInline,
    /// An `--update-keys` token is malformed.
    #[error("invalid override token: {0}")]
    InvalidOverride(String),
    /// A `config` literal is malformed.
    #[error("invalid config pair: {0}")]
    InvalidConfigPair(String),
    /// `config` was invoked without an action.
    #[error("no config action specified")]
    NoConfigAction,
    /// Settings could not be read or written.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The stack file could not be patched.
    #[error(transparent)]
    Patch(#[from] PatchError),
    /// The API client could not be created.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Output could not be written.
    #[error(transparent)]
    Output(#[from] io::Error),
}

impl DispatchError {
    /// Converts the error into a failure envelope.
    #[must_use]
    pub fn into_envelope(self) -> ResponseEnvelope {
        match self {
            Self::MissingStack => ResponseEnvelope::failure(t!("deploy.error.no_stack"))
                .with_details(t!("deploy.error.no_stack_details")),
            Self::UpdateKeysWithInline => {
                ResponseEnvelope::failure(t!("deploy.error.update_keys_inline"))
                    .with_details(t!("deploy.error.update_keys_inline_details"))
            }
            Self::InvalidOverride(token) => {
                ResponseEnvelope::failure(t!("deploy.error.invalid_override", token = token))
            }
            Self::InvalidConfigPair(pair) => {
                ResponseEnvelope::failure(t!("config.error.invalid_pair", pair = pair))
            }
            Self::NoConfigAction => ResponseEnvelope::failure(t!("config.error.no_action")),
            Self::Config(err) => {
                ResponseEnvelope::failure(t!("config.error.failed")).with_details(err.to_string())
            }
            Self::Patch(err) => ResponseEnvelope::failure(t!("deploy.error.patch_failed"))
                .with_details(err.to_string()),
            Self::Api(err) => classify(Err(err)),
            Self::Output(err) => ResponseEnvelope::failure(
                t!("output.write_failed", stream = "output", error = err),
            ),
        }
    }
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Builds a stack API for a connection profile.
pub trait ApiConnector {
    /// Connects using `profile`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the client cannot be created.
    fn connect(&self, profile: ConnectionProfile) -> Result<Box<dyn StackApi>, ApiError>;
}

/// Connector producing [`StackApiClient`] instances.
pub struct HttpConnector {
    /// Sink receiving call audit events.
    audit: Arc<dyn AuditSink>,
}

impl HttpConnector {
    /// Creates a connector that reports to `audit`.
    #[must_use]
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self {
            audit,
        }
    }
}

impl ApiConnector for HttpConnector {
    fn connect(&self, profile: ConnectionProfile) -> Result<Box<dyn StackApi>, ApiError> {
        Ok(Box::new(StackApiClient::new(profile, Arc::clone(&self.audit))?))
    }
}

/// Process-wide inputs resolved once before dispatch.
pub struct DispatchContext {
    /// Locator pointing at the settings file.
    pub locator: ConfigLocator,
    /// Stack content piped on stdin, if any.
    pub piped_stack: Option<String>,
}

/// Output streams for human-readable text.
pub struct Streams<'a> {
    /// Regular output.
    pub out: &'a mut dyn Write,
    /// Warnings.
    pub err: &'a mut dyn Write,
}

// ============================================================================
// SECTION: Dispatch
// ============================================================================

/// Runs `command` and returns its envelope.
pub fn dispatch(
    command: Command,
    context: &DispatchContext,
    connector: &dyn ApiConnector,
    streams: &mut Streams<'_>,
) -> ResponseEnvelope {
    let result = match command {
        Command::Get(args) => run_get(&args, context, connector, streams),
        Command::Deploy(args) => run_deploy(args, context, connector, streams),
        Command::Config(args) => run_config(&args, context, streams),
    };
    result.unwrap_or_else(DispatchError::into_envelope)
}

/// Resolves the `get` selector; `--all` wins over `--id` and `--name`.
#[must_use]
pub fn stack_selector(args: &GetArgs) -> StackSelector {
    if args.all {
        return StackSelector::All;
    }
    match (args.id, &args.name) {
        (Some(id), _) => StackSelector::ById(id),
        (None, Some(name)) => StackSelector::ByName(name.clone()),
        (None, None) => StackSelector::All,
    }
}

/// Loads the connection profile from the located settings file.
fn load_profile(context: &DispatchContext) -> Result<ConnectionProfile, DispatchError> {
    let store = context.locator.settings_store()?;
    Ok(ConnectionProfile::from_store(&store, PORTAINER_SECTION)?)
}

/// Executes `get`.
fn run_get(
    args: &GetArgs,
    context: &DispatchContext,
    connector: &dyn ApiConnector,
    streams: &mut Streams<'_>,
) -> Result<ResponseEnvelope, DispatchError> {
    let selector = stack_selector(args);
    let api = connector.connect(load_profile(context)?)?;
    Ok(api.get_stack(&selector, streams.out))
}

/// Stack source chosen for a deploy.
enum StackSource {
    /// Inline compose content.
    Inline(String),
    /// Compose file with overrides to apply first.
    File(PathBuf, Vec<KeyValueOverride>),
}

/// Validates deploy flags and chooses the stack source.
fn resolve_source(
    args: DeployArgs,
    piped_stack: Option<String>,
    streams: &mut Streams<'_>,
) -> Result<StackSource, DispatchError> {
    let inline = args.stack.or(piped_stack).filter(|content| !content.trim().is_empty());
    if let Some(content) = inline {
        if args.path.is_some() {
            writeln!(streams.err, "{}", t!("deploy.warn.both_sources"))?;
        }
        if !args.update_keys.is_empty() {
            return Err(DispatchError::UpdateKeysWithInline);
        }
        return Ok(StackSource::Inline(content));
    }
    let path = args.path.ok_or(DispatchError::MissingStack)?;
    let overrides = args
        .update_keys
        .iter()
        .map(|token| {
            parse_override(token).map_err(|_| DispatchError::InvalidOverride(token.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(StackSource::File(path, overrides))
}

/// Executes `deploy`.
fn run_deploy(
    args: DeployArgs,
    context: &DispatchContext,
    connector: &dyn ApiConnector,
    streams: &mut Streams<'_>,
) -> Result<ResponseEnvelope, DispatchError> {
    let endpoint_id = args.endpoint;
    let name = args.name.clone();
    let source = resolve_source(args, context.piped_stack.clone(), streams)?;
    let api = connector.connect(load_profile(context)?)?;
    match source {
        StackSource::Inline(content) => {
            Ok(api.post_stack_from_string(&content, endpoint_id, name.as_deref(), streams.out))
        }
        StackSource::File(path, overrides) => {
            for item in &overrides {
                apply_patch(&path, &item.key_path.to_string(), &item.value)?;
            }
            Ok(api.post_stack_from_file(&path, endpoint_id, name.as_deref(), streams.out))
        }
    }
}

/// Executes `config`.
fn run_config(
    args: &ConfigArgs,
    context: &DispatchContext,
    streams: &mut Streams<'_>,
) -> Result<ResponseEnvelope, DispatchError> {
    if let Some(path) = &args.config_path {
        context.locator.update_settings_path(path)?;
        let message = t!("config.path.updated", path = path.display());
        writeln!(streams.out, "{message}")?;
        return Ok(ResponseEnvelope::success(message, None));
    }
    if !args.set.is_empty() {
        let assignments = args
            .set
            .iter()
            .map(|pair| {
                parse_config_assignment(pair)
                    .map_err(|_| DispatchError::InvalidConfigPair(pair.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let store = context.locator.settings_store()?;
        for assignment in &assignments {
            store.set(
                &assignment.reference.section,
                &assignment.reference.key,
                &assignment.value,
            )?;
        }
        writeln!(streams.out, "{}", t!("config.set.updated", pairs = args.set.join(", ")))?;
        return Ok(ResponseEnvelope::success(t!("config.op.ok", operation = "set"), None));
    }
    if let Some(raw) = &args.get {
        let reference = parse_config_reference(raw)
            .map_err(|_| DispatchError::InvalidConfigPair(raw.clone()))?;
        let store = context.locator.settings_store()?;
        let value = store.get(&reference.section, &reference.key)?;
        writeln!(streams.out, "{value}")?;
        return Ok(ResponseEnvelope::success(t!("config.op.ok", operation = "get"), None));
    }
    Err(DispatchError::NoConfigAction)
}
