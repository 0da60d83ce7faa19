// crates/portainer-deployer-core/src/lib.rs
// ============================================================================
// Module: Portainer Deployer Core Library
// Description: Transport-free building blocks of the command-to-API pipeline.
// Purpose: Envelopes, stack document patching, literals, and stack records.
// Dependencies: serde, serde_yaml, sha2, thiserror, time
// ============================================================================

//! ## Overview
//! `portainer-deployer-core` holds everything the CLI needs that does not
//! touch the network:
//! - [`ResponseEnvelope`], the single result shape reported to the process boundary.
//! - [`apply_patch`], dot-notation edits of YAML stack files.
//! - [`parse_override`] and friends, validation of `key=value` literals.
//! - [`generate_stack_name`], digest-based names for unnamed stacks.
//! - [`Stack`] records and their fixed-width table rendering.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod document;
pub mod envelope;
pub mod naming;
pub mod overrides;
pub mod patch;
pub mod stack;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use document::*;
pub use envelope::*;
pub use naming::*;
pub use overrides::*;
pub use patch::*;
pub use stack::*;
