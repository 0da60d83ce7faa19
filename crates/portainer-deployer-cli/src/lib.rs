// crates/portainer-deployer-cli/src/lib.rs
// ============================================================================
// Module: Portainer Deployer CLI Library
// Description: Command surface, dispatcher, and stack API client.
// Purpose: Share the command-to-API pipeline between the binary and tests.
// Dependencies: clap, portainer-deployer-config, portainer-deployer-core, reqwest
// ============================================================================

//! ## Overview
//! The binary entry point (`src/main.rs`) parses flags with [`cli::Cli`],
//! resolves a [`dispatch::DispatchContext`], and hands the command to
//! [`dispatch::dispatch`], which returns the envelope that decides the exit
//! code. Remote calls go through [`api_client::StackApiClient`]; each one is
//! reported to an [`audit::AuditSink`].

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Blocking Portainer stack API client.
pub mod api_client;
/// API call audit events and sinks.
pub mod audit;
/// clap command definitions.
pub mod cli;
/// Validation and execution of parsed commands.
pub mod dispatch;
/// Message catalog and translation helpers.
pub mod i18n;
