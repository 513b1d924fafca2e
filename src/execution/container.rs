//! Container lifecycle management.
//!
//! A `Container` owns the handle returned by the daemon from creation to
//! removal. Cleanup (stop + remove) is the guaranteed-release operation the
//! run command invokes on every exit path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::DockerError;
use crate::execution::docker_client::{ContainerConfig, ContainerStatusInfo, DockerClient};

/// Status of a managed container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerStatus {
    /// Container is created but not started.
    Pending,
    /// Container is running.
    Running,
    /// Container was stopped and removed.
    Completed,
    /// Container failed with an error message.
    Failed(String),
}

impl std::fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerStatus::Pending => write!(f, "pending"),
            ContainerStatus::Running => write!(f, "running"),
            ContainerStatus::Completed => write!(f, "completed"),
            ContainerStatus::Failed(msg) => write!(f, "failed: {}", msg),
        }
    }
}

/// A managed Docker container with lifecycle tracking.
#[derive(Debug)]
pub struct Container {
    id: String,
    status: ContainerStatus,
    config: ContainerConfig,
    created_at: DateTime<Utc>,
}

impl Container {
    /// Creates a new container with the given configuration.
    ///
    /// Pulls the image first if it is not present locally. The container is
    /// created but not started.
    pub async fn new(client: &DockerClient, config: ContainerConfig) -> Result<Self, DockerError> {
        let created_at = Utc::now();

        if !client.image_exists(&config.image).await {
            client.pull_image(&config.image).await?;
        }

        let id = client.create_container(&config).await?;

        Ok(Self {
            id,
            status: ContainerStatus::Pending,
            config,
            created_at,
        })
    }

    /// Starts the container.
    pub async fn start(&mut self, client: &DockerClient) -> Result<(), DockerError> {
        if self.status != ContainerStatus::Pending {
            return Err(DockerError::RunFailed(format!(
                "Cannot start container in {} state",
                self.status
            )));
        }

        match client.start_container(&self.id).await {
            Ok(()) => {
                self.status = ContainerStatus::Running;
                Ok(())
            }
            Err(e) => {
                self.status = ContainerStatus::Failed(format!("Start failed: {}", e));
                Err(e)
            }
        }
    }

    /// Waits until the daemon reports the container as running.
    ///
    /// Polls the container status once per second, up to `timeout_secs`
    /// attempts. A container that exits before reporting running is a
    /// failure, not a wait.
    pub async fn wait_until_running(
        &mut self,
        client: &DockerClient,
        timeout_secs: u64,
    ) -> Result<(), DockerError> {
        for attempt in 1..=timeout_secs.max(1) {
            match client.container_status(&self.id).await? {
                ContainerStatusInfo::Running => {
                    debug!(attempt, id = %self.id, "container is ready");
                    self.status = ContainerStatus::Running;
                    return Ok(());
                }
                ContainerStatusInfo::Exited { exit_code } => {
                    let msg = format!("Exited with code {} before becoming ready", exit_code);
                    self.status = ContainerStatus::Failed(msg.clone());
                    return Err(DockerError::RunFailed(msg));
                }
                other => {
                    debug!(attempt, id = %self.id, status = ?other, "container not ready yet");
                    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                }
            }
        }

        Err(DockerError::NotReady {
            id: self.id.clone(),
            seconds: timeout_secs,
        })
    }

    /// Cleans up the container by stopping and removing it.
    ///
    /// A failed graceful stop is logged and does not abort removal; the
    /// remove is forced so the container is released even if still running.
    pub async fn cleanup(&mut self, client: &DockerClient) -> Result<(), DockerError> {
        if self.status == ContainerStatus::Running {
            if let Err(e) = client.stop_container(&self.id).await {
                warn!(id = %self.id, "failed to stop container gracefully: {e}");
            }
        }

        client.remove_container(&self.id, true).await?;

        if !matches!(self.status, ContainerStatus::Failed(_)) {
            self.status = ContainerStatus::Completed;
        }

        Ok(())
    }

    /// Returns the container ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the current status.
    pub fn status(&self) -> &ContainerStatus {
        &self.status
    }

    /// Returns the container configuration.
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Returns when the container was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Checks if the container is running.
    pub fn is_running(&self) -> bool {
        self.status == ContainerStatus::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_status_display() {
        assert_eq!(format!("{}", ContainerStatus::Pending), "pending");
        assert_eq!(format!("{}", ContainerStatus::Running), "running");
        assert_eq!(format!("{}", ContainerStatus::Completed), "completed");
        assert_eq!(
            format!("{}", ContainerStatus::Failed("error".to_string())),
            "failed: error"
        );
    }

    #[test]
    fn test_container_status_equality() {
        assert_eq!(ContainerStatus::Running, ContainerStatus::Running);
        assert_ne!(ContainerStatus::Running, ContainerStatus::Completed);
        assert_eq!(
            ContainerStatus::Failed("a".to_string()),
            ContainerStatus::Failed("a".to_string())
        );
        assert_ne!(
            ContainerStatus::Failed("a".to_string()),
            ContainerStatus::Failed("b".to_string())
        );
    }
}
