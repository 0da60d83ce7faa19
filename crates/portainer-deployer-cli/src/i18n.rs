// crates/portainer-deployer-cli/src/i18n.rs
// ============================================================================
// Module: CLI Internationalization Helpers
// Description: Message catalog and translation utilities for the CLI.
// Purpose: Centralize user-facing strings for consistent wording.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! Every user-facing string, including envelope messages, is stored in a
//! small static catalog and rendered through the [`t!`](crate::t) macro.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to the key itself to avoid panics.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"path"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Static catalog entries.
const CATALOG_ITEMS: &[(&str, &str)] = &[
    ("main.version", "portainer-deployer {version}"),
    ("main.error", "error: {message}"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("audit.open_failed", "Failed to open audit log {path}: {error}"),
    ("input.stdin_failed", "Failed to read stack from stdin: {error}"),
    ("api.error.connection", "Connection error."),
    ("api.error.timeout", "Connection timeout."),
    ("api.error.redirects", "Too many redirects."),
    ("api.error.invalid_stack", "Invalid stack"),
    ("api.error.stack_not_found", "Stack {name} not found in the database."),
    ("api.error.client", "Failed to build HTTP client: {error}"),
    ("api.error.decode", "Failed to decode server response: {error}"),
    ("api.error.read_stack", "Failed to read stack file {path}: {error}"),
    ("api.error.output", "Failed to write output: {error}"),
    ("api.error.request_failed", "Request failed with status {status}"),
    ("api.get.ok", "Stack(s) pulled successfully"),
    ("api.post.created", "Stack {name} created successfully."),
    ("api.post_string.ok", "Stack(s) pushed successfully"),
    (
        "api.post_file.ok",
        "Stack {name} from {path} posted successfully under the endpoint {endpoint}.",
    ),
    (
        "deploy.warn.both_sources",
        "Warning: stack content and --path are both set. The stack content is used and the \
         provided path is ignored.",
    ),
    ("deploy.error.no_stack", "No stack argument specified"),
    (
        "deploy.error.no_stack_details",
        "No stack specified. Please pass it as stdin or use the \"--path\" argument.",
    ),
    ("deploy.error.update_keys_inline", "Invalid use of --update-keys"),
    (
        "deploy.error.update_keys_inline_details",
        "You can not use \"--update-keys\" argument with \"stack\" positional argument. It is \
         only available for \"--path\" argument.",
    ),
    ("deploy.error.invalid_override", "Invalid key=value pair in --update-keys argument: {token}"),
    ("deploy.error.patch_failed", "Failed to update stack file"),
    ("config.error.invalid_pair", "Invalid config pair: {pair}"),
    ("config.error.no_action", "No config action specified"),
    ("config.error.failed", "Configuration error"),
    ("config.path.updated", "Config path updated to: {path}"),
    ("config.set.updated", "Config updated for: {pairs}"),
    ("config.op.ok", "Config operation {operation} completed successfully"),
];

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` using the English catalog while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog().get(key).copied().unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }

    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

/// Returns the static English catalog used by the CLI.
pub(crate) fn catalog() -> &'static HashMap<&'static str, &'static str> {
    static CATALOG: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

    CATALOG.get_or_init(|| CATALOG_ITEMS.iter().copied().collect())
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a catalog message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}
