use std::thread::ThreadId;

use crate::error::PlatformError;

use super::{GraphicsErrorCode, NativeHandle, PeerInfo};

/// Native context calls supplied by a platform backend.
///
/// Implementations are selected once at startup and shared by every context
/// created from the same [`super::ContextRuntime`]. "Current" always means
/// current on the calling thread.
pub trait ContextPlatform: Send + Sync {
    /// Creates a native context for `peer`, sharing object namespace with
    /// `shared` when given.
    fn create(
        &self,
        peer: &PeerInfo,
        shared: Option<NativeHandle>,
    ) -> Result<NativeHandle, PlatformError>;

    /// Destroys a native context. The context is never current when called.
    fn destroy(&self, peer: &PeerInfo, handle: NativeHandle) -> Result<(), PlatformError>;

    fn make_current(&self, peer: &PeerInfo, handle: NativeHandle) -> Result<(), PlatformError>;

    /// Releases whatever context is current on the calling thread.
    fn release_current_context(&self) -> Result<(), PlatformError>;

    /// Detaches the context from its drawable.
    ///
    /// On platforms where binding to a drawable and binding for rendering are
    /// separate steps this is distinct from releasing current.
    fn release_drawable(&self, handle: NativeHandle) -> Result<(), PlatformError>;

    /// Notifies the context that its drawable moved or resized.
    fn update(&self, handle: NativeHandle);

    fn is_current(&self, handle: NativeHandle) -> Result<bool, PlatformError>;

    /// Best-effort swap interval change for the current context.
    fn set_swap_interval(&self, interval: i32);

    /// Swaps the buffers of whatever context is current.
    fn swap_buffers(&self) -> Result<(), PlatformError>;

    /// Reads and clears the pending native error on the current context.
    fn pending_error(&self) -> Option<GraphicsErrorCode> {
        None
    }

    /// Drops per-thread native state of a thread that has exited.
    fn thread_exited(&self, _thread: ThreadId) {}
}

/// Loads and unloads the native graphics library.
///
/// Calls are paired by [`super::LibraryBinding`]; implementations only see
/// the first load and the last unload.
pub trait LibraryLoader: Send + Sync {
    fn load_library(&self) -> Result<(), PlatformError>;

    fn unload_library(&self);
}
