//! Error types for execbox operations.
//!
//! Defines error types for the two subsystems:
//! - Docker container management
//! - Interactive exec sessions

use thiserror::Error;

/// Errors that can occur during Docker operations.
#[derive(Debug, Error)]
pub enum DockerError {
    #[error("Docker daemon not available: {0}")]
    DaemonUnavailable(String),

    #[error("Docker run failed: {0}")]
    RunFailed(String),

    #[error("Container '{id}' not found")]
    ContainerNotFound { id: String },

    #[error("Failed to pull image '{image}': {reason}")]
    PullFailed { image: String, reason: String },

    #[error("Container '{id}' did not report running within {seconds} seconds")]
    NotReady { id: String, seconds: u64 },

    #[error("Exec started detached, expected an attached session")]
    ExecDetached,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while bridging the console to a remote process.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Exec output stream error: {0}")]
    Stream(String),

    #[error("Remote process input closed: {0}")]
    InputClosed(String),

    #[error("Console IO error: {0}")]
    Console(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docker_error_display() {
        let err = DockerError::ContainerNotFound {
            id: "abc123".to_string(),
        };
        assert_eq!(err.to_string(), "Container 'abc123' not found");

        let err = DockerError::NotReady {
            id: "abc123".to_string(),
            seconds: 30,
        };
        assert!(err.to_string().contains("30 seconds"));
    }

    #[test]
    fn test_session_error_display() {
        let err = SessionError::InputClosed("broken pipe".to_string());
        assert_eq!(
            err.to_string(),
            "Remote process input closed: broken pipe"
        );
    }

    #[test]
    fn test_session_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err: SessionError = io.into();
        assert!(matches!(err, SessionError::Console(_)));
    }
}
