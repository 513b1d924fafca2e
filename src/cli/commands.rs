//! CLI command definitions for execbox.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, info};

use crate::error::DockerError;
use crate::execution::{Container, ContainerConfig, DockerClient};
use crate::session::{self, SessionOutcome};

/// Default image for the sandbox container.
const DEFAULT_IMAGE: &str = "python:3.11-slim";

/// Default interpreter run against the mounted script.
const DEFAULT_INTERPRETER: &str = "python";

/// Default path the script is mounted at inside the container.
const DEFAULT_MOUNT_PATH: &str = "/script.py";

/// Command that keeps the sandbox container alive for exec sessions.
const KEEPALIVE_CMD: [&str; 2] = ["sleep", "infinity"];

/// Seconds to wait for the container to report running.
const READY_TIMEOUT_SECS: u64 = 30;

/// Interactive sandboxed script execution in a disposable Docker container.
#[derive(Parser)]
#[command(name = "execbox")]
#[command(about = "Run a script interactively inside a disposable Docker container")]
#[command(version)]
#[command(
    long_about = "execbox provisions a container with a host script bind-mounted read-only,\nattaches an interactive exec session running an interpreter on it, and bridges\nyour console to the remote process. Type 'exit' to end the session; the\ncontainer is stopped and removed on every exit path.\n\nExample usage:\n  execbox run --script ./test.py --image python:3.11-slim"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Provision a container, run the script interactively, then tear down.
    #[command(alias = "r")]
    Run(RunArgs),
}

/// Arguments for `execbox run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Host path of the script to mount into the container (read-only).
    #[arg(short, long)]
    pub script: PathBuf,

    /// Docker image to provision.
    #[arg(short, long, default_value = DEFAULT_IMAGE, env = "EXECBOX_IMAGE")]
    pub image: String,

    /// Path the script is mounted at inside the container.
    #[arg(long, default_value = DEFAULT_MOUNT_PATH)]
    pub mount_path: String,

    /// Interpreter executed against the mounted script.
    #[arg(long, default_value = DEFAULT_INTERPRETER)]
    pub interpreter: String,

    /// Environment variables for the container (KEY=VALUE, repeatable).
    #[arg(short, long)]
    pub env: Vec<String>,
}

/// Parses CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parses CLI arguments and runs the selected command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Runs the selected command with pre-parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_command(args).await,
    }
}

/// Provisions the container, drives the interactive session, and releases
/// the container on every exit path before surfacing the session result.
async fn run_command(args: RunArgs) -> anyhow::Result<()> {
    let script = resolve_script(&args.script)?;

    let client = DockerClient::new()?;

    let config = ContainerConfig::new(container_name(), &args.image)
        .with_cmd(KEEPALIVE_CMD.iter().map(|s| s.to_string()).collect())
        .with_env(args.env.clone())
        .with_read_only_bind(script.display().to_string(), &args.mount_path);

    let mut container = Container::new(&client, config).await?;
    info!(id = %container.id(), "container created");

    let session_result = attach_and_bridge(&client, &mut container, &args).await;

    // Guaranteed release: stop + remove exactly once, whether the session
    // finished, the attach failed, or the remote process crashed.
    if let Err(e) = container.cleanup(&client).await {
        error!(id = %container.id(), "failed to clean up container: {e}");
    } else {
        info!(id = %container.id(), "container removed");
    }

    match session_result {
        Ok(outcome) => {
            info!(exit_code = ?outcome.exit_code, "session finished");
            Ok(())
        }
        Err(e) => {
            if let Some(DockerError::ContainerNotFound { id }) = e.downcast_ref::<DockerError>() {
                error!(id = %id, "container not found while attaching");
            }
            Err(e)
        }
    }
}

/// Starts the container, attaches the interactive exec, and bridges the
/// console to it until the session ends.
async fn attach_and_bridge(
    client: &DockerClient,
    container: &mut Container,
    args: &RunArgs,
) -> anyhow::Result<SessionOutcome> {
    container.start(client).await?;
    container
        .wait_until_running(client, READY_TIMEOUT_SECS)
        .await?;

    let argv = vec![args.interpreter.clone(), args.mount_path.clone()];
    let exec = client
        .create_interactive_exec(container.id(), &argv)
        .await?;
    info!(exec_id = %exec.id, "interactive session started (type 'exit' to quit)");

    let exec_id = exec.id;
    session::bridge(
        exec.output,
        exec.input,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    let exit_code = client.exec_exit_code(&exec_id).await?;
    Ok(SessionOutcome { exit_code })
}

/// Validates the script path and resolves it to an absolute path, as bind
/// specs require absolute host paths.
fn resolve_script(script: &Path) -> anyhow::Result<PathBuf> {
    script
        .canonicalize()
        .with_context(|| format!("script '{}' not found", script.display()))
}

/// Unique-enough name for this invocation's container.
fn container_name() -> String {
    format!("execbox-{}", Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["execbox", "run", "--script", "/tmp/test.py"]).unwrap();
        let Commands::Run(args) = cli.command;

        assert_eq!(args.script, PathBuf::from("/tmp/test.py"));
        assert_eq!(args.image, DEFAULT_IMAGE);
        assert_eq!(args.mount_path, DEFAULT_MOUNT_PATH);
        assert_eq!(args.interpreter, DEFAULT_INTERPRETER);
        assert!(args.env.is_empty());
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_run_overrides() {
        let cli = Cli::try_parse_from([
            "execbox",
            "run",
            "--script",
            "./main.rb",
            "--image",
            "ruby:3.3",
            "--mount-path",
            "/main.rb",
            "--interpreter",
            "ruby",
            "--env",
            "FOO=bar",
            "--env",
            "BAZ=qux",
            "--log-level",
            "debug",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command;

        assert_eq!(args.image, "ruby:3.3");
        assert_eq!(args.mount_path, "/main.rb");
        assert_eq!(args.interpreter, "ruby");
        assert_eq!(args.env, vec!["FOO=bar", "BAZ=qux"]);
        assert_eq!(cli.log_level, "debug");
    }

    #[test]
    fn test_script_is_required() {
        let result = Cli::try_parse_from(["execbox", "run"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_script_existing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "print('hi')").unwrap();

        let resolved = resolve_script(file.path()).unwrap();
        assert!(resolved.is_absolute());
    }

    #[test]
    fn test_resolve_script_missing_file() {
        let result = resolve_script(Path::new("/nonexistent/execbox-test.py"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_container_name_prefix() {
        assert!(container_name().starts_with("execbox-"));
    }
}
