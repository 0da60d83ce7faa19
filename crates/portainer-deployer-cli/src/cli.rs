// crates/portainer-deployer-cli/src/cli.rs
// ============================================================================
// Module: Command Surface
// Description: clap definitions for the deployer binary.
// Purpose: Parse flags into typed arguments consumed by the dispatcher.
// Dependencies: clap
// ============================================================================

//! ## Overview
//! Three subcommands are exposed: `get`, `deploy`, and `config`. Flag-level
//! exclusivity (`--id` versus `--name`, the three config actions) is enforced
//! by clap; everything that needs file or token inspection is left to
//! [`crate::dispatch`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "portainer-deployer",
    about = "Manage Portainer stacks with CLI.",
    disable_help_subcommand = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", short = 'v', action = ArgAction::SetTrue, global = true)]
    pub show_version: bool,
    /// Locator file pointing at the settings file (overrides `PORTAINER_DEPLOYER_LOCATOR`).
    #[arg(long, value_name = "PATH", global = true)]
    pub locator: Option<PathBuf>,
    /// Append API call audit events to PATH, or to stderr when PATH is `-`.
    #[arg(long = "audit-log", value_name = "PATH|-", global = true)]
    pub audit_log: Option<String>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Get stack info from Portainer.
    Get(GetArgs),
    /// Deploy a stack to a Portainer endpoint.
    Deploy(DeployArgs),
    /// Read or update the deployer settings.
    Config(ConfigArgs),
}

/// Arguments for `get`.
#[derive(Args, Debug, Clone, Default)]
pub struct GetArgs {
    /// Id of the stack to look for.
    #[arg(long, value_name = "ID", conflicts_with = "name")]
    pub id: Option<u64>,
    /// Name of the stack to look for.
    #[arg(long, short = 'n', value_name = "NAME")]
    pub name: Option<String>,
    /// Get all stacks; overrides `--id` and `--name`.
    #[arg(long, short = 'a', action = ArgAction::SetTrue)]
    pub all: bool,
}

/// Arguments for `deploy`.
#[derive(Args, Debug, Clone, Default)]
pub struct DeployArgs {
    /// Docker Compose content for the stack; read from stdin when piped.
    #[arg(value_name = "STACK")]
    pub stack: Option<String>,
    /// Path to a Docker Compose file; an alternative to inline content.
    #[arg(long, short = 'p', value_name = "FILE")]
    pub path: Option<PathBuf>,
    /// Name for the new stack; generated when omitted.
    #[arg(long, short = 'n', value_name = "NAME")]
    pub name: Option<String>,
    /// Edit the stack file with `a.b.c=value` or `a.b=[x,y]` pairs (only with `--path`).
    #[arg(long = "update-keys", short = 'u', value_name = "KEY=VALUE", num_args = 1..)]
    pub update_keys: Vec<String>,
    /// Endpoint id to deploy the stack into.
    #[arg(long, short = 'e', value_name = "ID", required = true)]
    pub endpoint: u64,
}

/// Arguments for `config`.
#[derive(Args, Debug, Clone, Default)]
#[group(id = "action", multiple = false)]
pub struct ConfigArgs {
    /// Set values, e.g. `--set portainer.url=http://localhost`.
    #[arg(long, short = 's', value_name = "SECTION.KEY=VALUE", num_args = 1..)]
    pub set: Vec<String>,
    /// Get a value, e.g. `--get portainer.port`.
    #[arg(long, short = 'g', value_name = "SECTION.KEY")]
    pub get: Option<String>,
    /// Point the locator at an existing settings file.
    #[arg(long = "config-path", short = 'c', value_name = "PATH")]
    pub config_path: Option<PathBuf>,
}
