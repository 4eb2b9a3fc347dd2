// crates/rfc-bridge-cli/src/main.rs
// ============================================================================
// Module: RFC Bridge CLI Entry Point
// Description: Command dispatcher for the rfc-bridge MCP server.
// Purpose: Resolve settings, connect, and serve MCP over stdio or HTTP.
// Dependencies: clap, rfc-bridge-cli, rfc-bridge-config, rfc-bridge-mcp, thiserror, tokio.
// ============================================================================

//! ## Overview
//! The `rfc-bridge` binary connects to the remote system and serves MCP
//! tools. Startup progress and fatal errors go to stderr; stdout carries only
//! protocol traffic (`serve`) or command output (`config`).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use rfc_bridge_cli::startup::config_summary;
use rfc_bridge_cli::startup::connecting_line;
use rfc_bridge_cli::startup::load_settings;
use rfc_bridge_cli::startup::starting_line;
use rfc_bridge_config::config_toml_example;
use rfc_bridge_mcp::McpServer;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Prefix for every stderr line.
const LOG_PREFIX: &str = "[rfc-bridge]";

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "rfc-bridge", version, about = "MCP server for SAP function modules over RFC.")]
struct Cli {
    /// Selected command.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect to SAP and serve MCP requests.
    Serve(ServeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to rfc-bridge.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Destination name; used when `SAP_DEST` is unset.
    #[arg(value_name = "DESTINATION")]
    destination: Option<String>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Resolve the configuration and print a redacted summary.
    Check(ConfigCheckCommand),
    /// Print a sample rfc-bridge.toml.
    Example,
}

/// Configuration for `config check`.
#[derive(Args, Debug)]
struct ConfigCheckCommand {
    /// Optional config file path (defaults to rfc-bridge.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Destination name; used when `SAP_DEST` is unset.
    #[arg(value_name = "DESTINATION")]
    destination: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for operator-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
///
/// The runtime is shut down without waiting for blocking workers, so a stdin
/// reader parked on an open pipe cannot hold the process after a fatal error.
fn main() -> ExitCode {
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => return emit_error(&format!("failed to start runtime: {err}")),
    };
    let code = match runtime.block_on(run()) {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    };
    runtime.shutdown_background();
    code
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Config {
            command,
        } => command_config(command),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let (config, spec) = load_settings(
        command.config.as_deref(),
        command.destination.as_deref(),
        |name| env::var(name).ok(),
    )
    .map_err(|err| CliError::new(format!("SAP connection config error: {err}")))?;
    log_line(&connecting_line(&spec))?;
    let starting = starting_line(&config);

    let server = tokio::task::spawn_blocking(move || McpServer::from_config(&config, spec))
        .await
        .map_err(|err| CliError::new(format!("init join failed: {err}")))?
        .map_err(|err| CliError::new(err.to_string()))?;
    log_line("connected")?;
    log_line(&starting)?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Check(command) => command_config_check(&command),
        ConfigCommand::Example => {
            write_stdout(&config_toml_example())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Executes `config check`.
fn command_config_check(command: &ConfigCheckCommand) -> CliResult<ExitCode> {
    let (config, spec) = load_settings(
        command.config.as_deref(),
        command.destination.as_deref(),
        |name| env::var(name).ok(),
    )
    .map_err(|err| CliError::new(format!("SAP connection config error: {err}")))?;
    for line in config_summary(&config, &spec) {
        write_stdout(&format!("{line}\n"))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes text to stdout.
fn write_stdout(text: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    let write = |err: std::io::Error| CliError::new(format!("failed to write stdout: {err}"));
    stdout.write_all(text.as_bytes()).map_err(write)?;
    stdout.flush().map_err(write)
}

/// Writes one prefixed line to stderr.
fn log_line(message: &str) -> CliResult<()> {
    write_stderr_line(message)
        .map_err(|err| CliError::new(format!("failed to write stderr: {err}")))
}

/// Writes a prefixed line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{LOG_PREFIX} {message}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
