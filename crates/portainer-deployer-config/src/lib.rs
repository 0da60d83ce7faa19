// crates/portainer-deployer-config/src/lib.rs
// ============================================================================
// Module: Portainer Deployer Config Library
// Description: Sectioned settings storage and connection profile derivation.
// Purpose: Single source of truth for locator and settings file semantics.
// Dependencies: tempfile, thiserror, toml
// ============================================================================

//! ## Overview
//! `portainer-deployer-config` owns every persistent setting the CLI reads or
//! writes. Settings live in TOML files made of named sections holding scalar
//! key/value pairs. A small locator file points at the main settings file,
//! whose `PORTAINER` section describes the remote connection.
//!
//! Files are re-read on every operation; nothing is cached across calls.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod locator;
pub mod profile;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use locator::*;
pub use profile::*;
pub use store::*;
