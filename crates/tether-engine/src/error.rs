//! Engine error types.

use std::thread::ThreadId;

use thiserror::Error;

use crate::context::GraphicsErrorCode;

/// Failure reported by a platform adapter from a native call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The native call ran and reported failure.
    #[error("{call} failed: {message}")]
    Native {
        call: &'static str,
        message: String,
    },

    /// The adapter does not implement this call on the current platform.
    #[error("{0} is not supported by this platform")]
    Unsupported(&'static str),
}

impl PlatformError {
    pub fn native(call: &'static str, message: impl Into<String>) -> Self {
        Self::Native {
            call,
            message: message.into(),
        }
    }
}

/// Classification of [`Error`] variants.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    /// Operation invalid in the current lifecycle state.
    State,
    /// A native resource could not be allocated.
    Creation,
    /// A caller-supplied argument is unusable.
    InvalidArgument,
    /// A native error code surfaced by destroy-while-current.
    Graphics,
    /// A native call on a live resource failed.
    Platform,
}

/// Engine errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("context is destroyed")]
    Destroyed,

    #[error("from thread {caller:?}: {owner:?} already has the context current")]
    AccessViolation { caller: ThreadId, owner: ThreadId },

    #[error("ime must be created before {operation}")]
    NotCreated { operation: &'static str },

    #[error("native resource creation failed: {0}")]
    Creation(#[source] PlatformError),

    #[error("shared context is destroyed")]
    SharedContextDestroyed,

    #[error("shared context belongs to a different runtime")]
    ForeignSharedContext,

    #[error("graphics error {0} was pending when the context was destroyed")]
    Graphics(GraphicsErrorCode),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Destroyed | Error::AccessViolation { .. } | Error::NotCreated { .. } => {
                ErrorKind::State
            }
            Error::Creation(_) => ErrorKind::Creation,
            Error::SharedContextDestroyed | Error::ForeignSharedContext => {
                ErrorKind::InvalidArgument
            }
            Error::Graphics(_) => ErrorKind::Graphics,
            Error::Platform(_) => ErrorKind::Platform,
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(Error::Destroyed.kind(), ErrorKind::State);
        assert_eq!(
            Error::NotCreated { operation: "poll" }.kind(),
            ErrorKind::State
        );
        assert_eq!(Error::SharedContextDestroyed.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            Error::Creation(PlatformError::Unsupported("create")).kind(),
            ErrorKind::Creation
        );
        assert_eq!(
            Error::from(PlatformError::native("swap_buffers", "lost")).kind(),
            ErrorKind::Platform
        );
    }

    #[test]
    fn platform_error_message_names_the_call() {
        let err = PlatformError::native("make_current", "bad drawable");
        assert_eq!(err.to_string(), "make_current failed: bad drawable");
    }
}
