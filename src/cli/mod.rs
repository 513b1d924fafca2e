//! Command-line interface for execbox.
//!
//! Provides the `run` command: provision a container, bridge an
//! interactive exec session, and tear the container down.

mod commands;

pub use commands::{parse_cli, run, run_with_cli};
