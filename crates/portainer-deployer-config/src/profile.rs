// crates/portainer-deployer-config/src/profile.rs
// ============================================================================
// Module: Connection Profile
// Description: Read-only view over the remote connection settings section.
// Purpose: Build the Portainer connection parameters once per process.
// Dependencies: crate::store
// ============================================================================

//! ## Overview
//! A [`ConnectionProfile`] is derived from a single settings section (by
//! default `PORTAINER`) holding `url`, `port`, `token`, and `ssl`. It is built
//! once and never mutated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use crate::store::ConfigError;
use crate::store::ConfigStore;
use crate::store::normalize_section;
use crate::store::parse_bool;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Settings section holding the remote connection parameters.
pub const PORTAINER_SECTION: &str = "PORTAINER";
/// Key holding the base URL (scheme and host).
pub const URL_KEY: &str = "url";
/// Key holding the API port.
pub const PORT_KEY: &str = "port";
/// Key holding the static API token.
pub const TOKEN_KEY: &str = "token";
/// Key holding the TLS verification flag.
pub const SSL_KEY: &str = "ssl";

// ============================================================================
// SECTION: Profile
// ============================================================================

/// Remote connection parameters.
///
/// # Invariants
/// - `base_url` carries no trailing slash.
/// - The API token is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    /// Scheme and host, e.g. `https://portainer.local`.
    base_url: String,
    /// API port appended to the base URL.
    port: u16,
    /// Static API key sent with every request.
    api_token: String,
    /// Whether TLS certificates are verified.
    verify_tls: bool,
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("base_url", &self.base_url)
            .field("port", &self.port)
            .field("api_token", &"<redacted>")
            .field("verify_tls", &self.verify_tls)
            .finish()
    }
}

impl ConnectionProfile {
    /// Builds a profile from explicit values.
    #[must_use]
    pub fn new(base_url: &str, port: u16, api_token: impl Into<String>, verify_tls: bool) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            port,
            api_token: api_token.into(),
            verify_tls,
        }
    }

    /// Builds a profile from the named section of a settings store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the section or a required key is missing,
    /// the port is not a valid number, or `ssl` is not a boolean literal.
    pub fn from_store(store: &ConfigStore, section: &str) -> Result<Self, ConfigError> {
        let snapshot = store.section_snapshot(section)?;
        Self::from_snapshot(section, &snapshot)
    }

    /// Builds a profile from a section snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required key is missing or malformed.
    pub fn from_snapshot(
        section: &str,
        snapshot: &BTreeMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let section = normalize_section(section);
        let url = required(snapshot, &section, URL_KEY)?;
        if url.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("{section}.{URL_KEY} must not be empty")));
        }
        let raw_port = required(snapshot, &section, PORT_KEY)?;
        let port = raw_port.trim().parse::<u16>().map_err(|_| {
            ConfigError::Invalid(format!("{section}.{PORT_KEY} is not a valid port: {raw_port}"))
        })?;
        let token = required(snapshot, &section, TOKEN_KEY)?;
        let raw_ssl = required(snapshot, &section, SSL_KEY)?;
        let verify_tls = parse_bool(raw_ssl).ok_or_else(|| ConfigError::InvalidBoolean {
            section: section.clone(),
            key: SSL_KEY.to_string(),
            value: raw_ssl.clone(),
        })?;
        Ok(Self::new(url, port, token.clone(), verify_tls))
    }

    /// Returns the base URL without port.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the API port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the API token.
    #[must_use]
    pub fn api_token(&self) -> &str {
        &self.api_token
    }

    /// Returns whether TLS certificates are verified.
    #[must_use]
    pub const fn verify_tls(&self) -> bool {
        self.verify_tls
    }

    /// Returns the `url:port` prefix used for every API path.
    #[must_use]
    pub fn connection_base(&self) -> String {
        format!("{}:{}", self.base_url, self.port)
    }

    /// Returns true when the base URL uses the `https` scheme.
    #[must_use]
    pub fn uses_https(&self) -> bool {
        self.base_url
            .split_once("://")
            .is_some_and(|(scheme, _)| scheme.eq_ignore_ascii_case("https"))
    }

    /// Returns true when the operator disabled verification over `https`.
    #[must_use]
    pub fn insecure_acknowledged(&self) -> bool {
        !self.verify_tls && self.uses_https()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Looks up a required key in a snapshot.
fn required<'a>(
    snapshot: &'a BTreeMap<String, String>,
    section: &str,
    key: &str,
) -> Result<&'a String, ConfigError> {
    snapshot.get(key).ok_or_else(|| ConfigError::MissingKey {
        section: section.to_string(),
        key: key.to_string(),
    })
}
