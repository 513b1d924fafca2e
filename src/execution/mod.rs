//! Docker execution layer for interactive sandbox sessions.
//!
//! This module provides the Docker execution layer using the bollard crate
//! for container lifecycle management and interactive exec attachment.
//!
//! # Architecture
//!
//! Container states follow this lifecycle:
//! ```text
//! PENDING → RUNNING → COMPLETED/FAILED → CLEANUP
//! ```
//!
//! # Example
//!
//! ```ignore
//! use execbox::execution::{Container, ContainerConfig, DockerClient};
//!
//! let client = DockerClient::new()?;
//!
//! let config = ContainerConfig::new("execbox-1", "python:3.11-slim")
//!     .with_cmd(vec!["sleep".into(), "infinity".into()])
//!     .with_read_only_bind("/home/user/test.py", "/script.py");
//!
//! let mut container = Container::new(&client, config).await?;
//! container.start(&client).await?;
//! container.wait_until_running(&client, 30).await?;
//! let exec = client.create_interactive_exec(container.id(), &argv).await?;
//! // ... drive the session ...
//! container.cleanup(&client).await?;
//! ```

pub mod container;
pub mod docker_client;

pub use container::{Container, ContainerStatus};
pub use docker_client::{ContainerConfig, ContainerStatusInfo, DockerClient, ExecSession};
