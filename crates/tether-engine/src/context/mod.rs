//! Thread-affine native rendering contexts.
//!
//! This module is responsible for:
//! - creating contexts through a [`ContextPlatform`], optionally sharing with a parent
//! - enforcing that at most one thread has a context current
//! - tracking which context is current on which thread
//! - deferring destruction until no thread has the context current
//! - reference-counting the native graphics library across contexts

mod ctx;
mod handle;
mod headless;
mod init;
mod library;
mod lifecycle;
mod platform;
mod registry;
mod runtime;

pub use ctx::{Context, ContextId};
pub use handle::{GraphicsErrorCode, NativeHandle, PeerInfo};
pub use headless::{HeadlessCalls, HeadlessPlatform};
pub use init::ContextInit;
pub use library::LibraryBinding;
pub use lifecycle::Lifecycle;
pub use platform::{ContextPlatform, LibraryLoader};
pub use runtime::ContextRuntime;
