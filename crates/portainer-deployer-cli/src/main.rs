// crates/portainer-deployer-cli/src/main.rs
// ============================================================================
// Module: Portainer Deployer CLI Entry Point
// Description: Process boundary for the deployer binary.
// Purpose: Parse flags, dispatch one command, and map its envelope to an exit code.
// Dependencies: clap, portainer-deployer-cli, portainer-deployer-config
// ============================================================================

//! ## Overview
//! The entry point resolves process-wide inputs (locator, audit sink, piped
//! stack content) once, dispatches the parsed command, and exits with
//! success only when the resulting envelope reports success.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::IsTerminal;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::CommandFactory;
use clap::Parser;
use portainer_deployer_cli::audit::AuditSink;
use portainer_deployer_cli::audit::FileAuditSink;
use portainer_deployer_cli::audit::NoopAuditSink;
use portainer_deployer_cli::audit::StderrAuditSink;
use portainer_deployer_cli::cli::Cli;
use portainer_deployer_cli::cli::Command;
use portainer_deployer_cli::dispatch::DispatchContext;
use portainer_deployer_cli::dispatch::HttpConnector;
use portainer_deployer_cli::dispatch::Streams;
use portainer_deployer_cli::dispatch::dispatch;
use portainer_deployer_cli::t;
use portainer_deployer_config::ConfigLocator;
use portainer_deployer_core::ResponseEnvelope;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(envelope) => report(&envelope),
        Err(message) => emit_error(&message, None),
    }
}

/// Executes the parsed command and returns its envelope.
fn run() -> Result<ResponseEnvelope, String> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| output_error(&err))?;
        return Ok(ResponseEnvelope::success(String::new(), None));
    }

    let Some(command) = cli.command else {
        Cli::command().print_help().map_err(|err| output_error(&err))?;
        return Ok(ResponseEnvelope::success(String::new(), None));
    };

    let audit = audit_sink(cli.audit_log.as_deref())?;
    let locator = ConfigLocator::resolve(cli.locator.as_deref()).map_err(|err| err.to_string())?;
    let piped_stack = match &command {
        Command::Deploy(args) if args.stack.is_none() => read_piped_stack()?,
        _ => None,
    };
    let context = DispatchContext {
        locator,
        piped_stack,
    };

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();
    let mut streams = Streams {
        out: &mut out,
        err: &mut err,
    };
    let envelope = dispatch(command, &context, &HttpConnector::new(audit), &mut streams);
    out.flush().map_err(|err| output_error(&err))?;
    Ok(envelope)
}

// ============================================================================
// SECTION: Inputs
// ============================================================================

/// Selects the audit sink from `--audit-log`.
fn audit_sink(target: Option<&str>) -> Result<Arc<dyn AuditSink>, String> {
    match target {
        None => Ok(Arc::new(NoopAuditSink)),
        Some("-") => Ok(Arc::new(StderrAuditSink)),
        Some(path) => FileAuditSink::new(Path::new(path))
            .map(|sink| Arc::new(sink) as Arc<dyn AuditSink>)
            .map_err(|err| t!("audit.open_failed", path = path, error = err)),
    }
}

/// Reads stack content from stdin when it is not a terminal.
fn read_piped_stack() -> Result<Option<String>, String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let mut content = String::new();
    stdin
        .lock()
        .read_to_string(&mut content)
        .map_err(|err| t!("input.stdin_failed", error = err))?;
    Ok(Some(content).filter(|content| !content.trim().is_empty()))
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Maps an envelope to the process exit code.
fn report(envelope: &ResponseEnvelope) -> ExitCode {
    if envelope.is_success() {
        return ExitCode::SUCCESS;
    }
    let details = (envelope.details != envelope.message).then_some(envelope.details.as_str());
    emit_error(&envelope.message, details)
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> io::Result<()> {
    let mut stdout = io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> io::Result<()> {
    let mut stderr = io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(error: &io::Error) -> String {
    t!("output.write_failed", stream = "stdout", error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str, details: Option<&str>) -> ExitCode {
    let _ = write_stderr_line(&t!("main.error", message = message));
    if let Some(details) = details {
        let _ = write_stderr_line(details);
    }
    ExitCode::FAILURE
}
