//! Logging utilities.
//!
//! The engine itself only talks to the `log` facade. This module wires up an
//! `env_logger` backend for binaries and tests that want output.

mod init;

pub use init::{init_logging, LoggingConfig};
