//! Docker API wrapper using the bollard crate.
//!
//! This module provides a high-level interface to the Docker operations
//! execbox needs: container lifecycle and interactive exec attachment.

use std::pin::Pin;

use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, LogOutput, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::image::CreateImageOptions;
use bollard::models::HostConfig;
use bollard::Docker;
use futures::{Stream, StreamExt};
use tokio::io::AsyncWrite;

use crate::error::DockerError;

/// Configuration for creating a new container.
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Unique name for the container.
    pub name: String,
    /// Docker image to use.
    pub image: String,
    /// Command to run in the container (keeps it alive for exec sessions).
    pub cmd: Option<Vec<String>>,
    /// Environment variables (KEY=VALUE).
    pub env: Vec<String>,
    /// Volume bind specs (`host:container[:mode]` format).
    pub binds: Vec<String>,
}

impl ContainerConfig {
    /// Creates a new container configuration with the given name and image.
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            cmd: None,
            env: Vec::new(),
            binds: Vec::new(),
        }
    }

    /// Sets the command to run in the container.
    pub fn with_cmd(mut self, cmd: Vec<String>) -> Self {
        self.cmd = Some(cmd);
        self
    }

    /// Adds environment variables.
    pub fn with_env(mut self, env: Vec<String>) -> Self {
        self.env = env;
        self
    }

    /// Mounts a host path into the container read-only.
    pub fn with_read_only_bind(
        mut self,
        host_path: impl AsRef<str>,
        container_path: impl AsRef<str>,
    ) -> Self {
        self.binds.push(format!(
            "{}:{}:ro",
            host_path.as_ref(),
            container_path.as_ref()
        ));
        self
    }
}

/// Status of a container as reported by the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerStatusInfo {
    Created,
    Running,
    Paused,
    Restarting,
    Exited { exit_code: i64 },
    Removing,
    Dead,
    Unknown(String),
}

/// An attached interactive exec session inside a running container.
///
/// `output` yields demultiplexed stdout/stderr frames from the remote
/// process; `input` is the write side of its stdin.
pub struct ExecSession {
    /// Exec instance ID, used to inspect the exit code after the session.
    pub id: String,
    /// Byte-oriented output stream of the remote process.
    pub output: Pin<Box<dyn Stream<Item = Result<LogOutput, bollard::errors::Error>> + Send>>,
    /// Write side of the remote process's stdin.
    pub input: Pin<Box<dyn AsyncWrite + Send>>,
}

/// Docker client wrapper for container operations.
pub struct DockerClient {
    docker: Docker,
}

impl DockerClient {
    /// Creates a new Docker client connecting to the local Docker daemon.
    ///
    /// # Errors
    ///
    /// Returns `DockerError::DaemonUnavailable` if the Docker daemon is not accessible.
    pub fn new() -> Result<Self, DockerError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| DockerError::DaemonUnavailable(format!("Failed to connect: {e}")))?;

        Ok(Self { docker })
    }

    /// Creates a new Docker client from an existing bollard Docker instance.
    pub fn from_docker(docker: Docker) -> Self {
        Self { docker }
    }

    /// Creates a new container with the given configuration.
    ///
    /// # Returns
    ///
    /// The container ID on success.
    pub async fn create_container(&self, config: &ContainerConfig) -> Result<String, DockerError> {
        let host_config = HostConfig {
            binds: if config.binds.is_empty() {
                None
            } else {
                Some(config.binds.clone())
            },
            ..Default::default()
        };

        let container_config = Config {
            image: Some(config.image.clone()),
            cmd: config.cmd.clone(),
            env: if config.env.is_empty() {
                None
            } else {
                Some(config.env.clone())
            },
            host_config: Some(host_config),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: config.name.clone(),
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(options), container_config)
            .await
            .map_err(|e| DockerError::RunFailed(format!("Failed to create container: {e}")))?;

        Ok(response.id)
    }

    /// Starts a container by ID.
    pub async fn start_container(&self, id: &str) -> Result<(), DockerError> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| container_error(id, e, "Failed to start container"))?;

        Ok(())
    }

    /// Stops a container by ID.
    ///
    /// Sends SIGTERM and waits up to 10 seconds before sending SIGKILL.
    pub async fn stop_container(&self, id: &str) -> Result<(), DockerError> {
        let options = StopContainerOptions { t: 10 };

        self.docker
            .stop_container(id, Some(options))
            .await
            .map_err(|e| container_error(id, e, "Failed to stop container"))?;

        Ok(())
    }

    /// Removes a container by ID.
    ///
    /// # Arguments
    ///
    /// * `id` - Container ID
    /// * `force` - Force removal even if running
    pub async fn remove_container(&self, id: &str, force: bool) -> Result<(), DockerError> {
        let options = RemoveContainerOptions {
            force,
            v: true, // Remove volumes
            ..Default::default()
        };

        self.docker
            .remove_container(id, Some(options))
            .await
            .map_err(|e| container_error(id, e, "Failed to remove container"))?;

        Ok(())
    }

    /// Gets the status of a container.
    pub async fn container_status(&self, id: &str) -> Result<ContainerStatusInfo, DockerError> {
        let info = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| container_error(id, e, "Failed to inspect container"))?;

        let state = info
            .state
            .ok_or_else(|| DockerError::RunFailed("Container has no state".to_string()))?;

        let status = state.status.map(|s| s.to_string()).unwrap_or_default();

        match status.as_str() {
            "created" => Ok(ContainerStatusInfo::Created),
            "running" => Ok(ContainerStatusInfo::Running),
            "paused" => Ok(ContainerStatusInfo::Paused),
            "restarting" => Ok(ContainerStatusInfo::Restarting),
            "removing" => Ok(ContainerStatusInfo::Removing),
            "exited" => Ok(ContainerStatusInfo::Exited {
                exit_code: state.exit_code.unwrap_or(-1),
            }),
            "dead" => Ok(ContainerStatusInfo::Dead),
            other => Ok(ContainerStatusInfo::Unknown(other.to_string())),
        }
    }

    /// Pulls a Docker image from a registry.
    pub async fn pull_image(&self, image: &str) -> Result<(), DockerError> {
        let options = CreateImageOptions {
            from_image: image,
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);

        while let Some(result) = stream.next().await {
            result.map_err(|e| DockerError::PullFailed {
                image: image.to_string(),
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }

    /// Checks if an image exists locally.
    pub async fn image_exists(&self, image: &str) -> bool {
        self.docker.inspect_image(image).await.is_ok()
    }

    /// Creates and starts an interactive exec session inside a running
    /// container, attached to stdin, stdout, and stderr.
    pub async fn create_interactive_exec(
        &self,
        id: &str,
        argv: &[String],
    ) -> Result<ExecSession, DockerError> {
        let exec_options = CreateExecOptions {
            cmd: Some(argv.to_vec()),
            attach_stdin: Some(true),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            tty: Some(false),
            ..Default::default()
        };

        let exec = self
            .docker
            .create_exec(id, exec_options)
            .await
            .map_err(|e| container_error(id, e, "Failed to create exec"))?;

        let start_result = self
            .docker
            .start_exec(&exec.id, None)
            .await
            .map_err(|e| container_error(id, e, "Failed to start exec"))?;

        match start_result {
            StartExecResults::Attached { output, input } => Ok(ExecSession {
                id: exec.id,
                output,
                input,
            }),
            StartExecResults::Detached => Err(DockerError::ExecDetached),
        }
    }

    /// Gets the exit code of a finished exec instance, if the daemon
    /// reported one.
    pub async fn exec_exit_code(&self, exec_id: &str) -> Result<Option<i64>, DockerError> {
        let info = self
            .docker
            .inspect_exec(exec_id)
            .await
            .map_err(|e| DockerError::RunFailed(format!("Failed to inspect exec: {e}")))?;

        Ok(info.exit_code)
    }
}

/// Maps a bollard error to the explicit not-found kind when the daemon
/// reports a missing container, so callers can check it before proceeding.
fn container_error(id: &str, e: bollard::errors::Error, context: &str) -> DockerError {
    if e.to_string().contains("No such container") {
        DockerError::ContainerNotFound { id: id.to_string() }
    } else {
        DockerError::RunFailed(format!("{context}: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_config_builder() {
        let config = ContainerConfig::new("execbox-test", "python:3.11-slim")
            .with_cmd(vec!["sleep".to_string(), "infinity".to_string()])
            .with_env(vec!["FOO=bar".to_string()])
            .with_read_only_bind("/home/user/test.py", "/script.py");

        assert_eq!(config.name, "execbox-test");
        assert_eq!(config.image, "python:3.11-slim");
        assert_eq!(config.cmd.unwrap(), vec!["sleep", "infinity"]);
        assert_eq!(config.env, vec!["FOO=bar"]);
        assert_eq!(config.binds, vec!["/home/user/test.py:/script.py:ro"]);
    }

    #[test]
    fn test_read_only_bind_mode_suffix() {
        let config = ContainerConfig::new("t", "img")
            .with_read_only_bind("/a", "/b")
            .with_read_only_bind("/c", "/d");

        assert!(config.binds.iter().all(|b| b.ends_with(":ro")));
        assert_eq!(config.binds.len(), 2);
    }

    #[test]
    fn test_container_error_maps_not_found() {
        let err = bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            message: "No such container: abc123".to_string(),
        };
        let mapped = container_error("abc123", err, "Failed to inspect container");
        assert!(matches!(
            mapped,
            DockerError::ContainerNotFound { ref id } if id.as_str() == "abc123"
        ));
    }

    #[test]
    fn test_container_error_passes_through_other_errors() {
        let err = bollard::errors::Error::DockerResponseServerError {
            status_code: 500,
            message: "daemon exploded".to_string(),
        };
        let mapped = container_error("abc123", err, "Failed to stop container");
        assert!(matches!(mapped, DockerError::RunFailed(_)));
        assert!(mapped.to_string().contains("daemon exploded"));
    }

    #[test]
    fn test_container_status_info() {
        let exited = ContainerStatusInfo::Exited { exit_code: 0 };
        assert!(matches!(
            exited,
            ContainerStatusInfo::Exited { exit_code: 0 }
        ));
        assert_ne!(ContainerStatusInfo::Running, ContainerStatusInfo::Created);
    }
}
