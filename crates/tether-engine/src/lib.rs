//! Tether engine crate.
//!
//! This crate owns two thread-shared native resources and the lifecycle
//! contracts around them:
//! - [`context`]: a rendering context bound to at most one thread at a time,
//!   with deferred destruction
//! - [`ime`]: the input-method composition event pipeline (`poll` / `next`)
//!
//! Native calls are supplied by platform adapters selected once at startup.

pub mod context;
pub mod ime;

pub mod error;
pub mod logging;

pub use error::{Error, ErrorKind, PlatformError, Result};
