use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use crate::error::PlatformError;

use super::{ContextPlatform, GraphicsErrorCode, LibraryLoader, NativeHandle, PeerInfo};

/// Native call counters recorded by [`HeadlessPlatform`].
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct HeadlessCalls {
    pub creates: usize,
    pub destroys: usize,
    pub make_currents: usize,
    pub releases: usize,
    pub drawable_releases: usize,
    pub updates: usize,
    pub swaps: usize,
    pub library_loads: usize,
    pub library_unloads: usize,
}

#[derive(Default)]
struct HeadlessState {
    live: HashSet<NativeHandle>,
    current: HashMap<ThreadId, NativeHandle>,
    library_loaded: bool,
    swap_interval: i32,
    pending_error: Option<GraphicsErrorCode>,
    fail_create: Option<String>,
    fail_destroy: Option<String>,
    calls: HeadlessCalls,
}

/// Software context backend.
///
/// Behaves like a driver without a display: handles are allocated from a
/// counter and "current" is tracked per thread. It refuses the calls a real
/// driver would refuse (destroying a context that is still current, making a
/// context current on two threads) so lifecycle bugs surface as errors.
///
/// Also usable as the [`LibraryLoader`].
pub struct HeadlessPlatform {
    next_handle: AtomicU64,
    state: Mutex<HeadlessState>,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            state: Mutex::new(HeadlessState::default()),
        }
    }

    pub fn calls(&self) -> HeadlessCalls {
        self.state.lock().calls
    }

    /// Number of native contexts created and not yet destroyed.
    pub fn live_contexts(&self) -> usize {
        self.state.lock().live.len()
    }

    pub fn library_loaded(&self) -> bool {
        self.state.lock().library_loaded
    }

    /// Handle current on the calling thread.
    pub fn current_handle(&self) -> Option<NativeHandle> {
        self.state.lock().current.get(&thread::current().id()).copied()
    }

    pub fn swap_interval(&self) -> i32 {
        self.state.lock().swap_interval
    }

    /// Makes the next `create` fail with `message`.
    pub fn fail_next_create(&self, message: impl Into<String>) {
        self.state.lock().fail_create = Some(message.into());
    }

    /// Makes the next `destroy` fail with `message`.
    pub fn fail_next_destroy(&self, message: impl Into<String>) {
        self.state.lock().fail_destroy = Some(message.into());
    }

    /// Records a native error, reported by the next `pending_error` read on a
    /// thread with a current context.
    pub fn raise_error(&self, code: GraphicsErrorCode) {
        self.state.lock().pending_error = Some(code);
    }
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextPlatform for HeadlessPlatform {
    fn create(
        &self,
        _peer: &PeerInfo,
        shared: Option<NativeHandle>,
    ) -> Result<NativeHandle, PlatformError> {
        let mut state = self.state.lock();
        state.calls.creates += 1;

        if let Some(message) = state.fail_create.take() {
            return Err(PlatformError::native("create", message));
        }
        if let Some(shared) = shared {
            if !state.live.contains(&shared) {
                return Err(PlatformError::native("create", "shared handle is not live"));
            }
        }

        let handle = NativeHandle::from_raw(self.next_handle.fetch_add(1, Ordering::Relaxed));
        state.live.insert(handle);
        Ok(handle)
    }

    fn destroy(&self, _peer: &PeerInfo, handle: NativeHandle) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.calls.destroys += 1;

        if let Some(message) = state.fail_destroy.take() {
            return Err(PlatformError::native("destroy", message));
        }
        if state.current.values().any(|current| *current == handle) {
            return Err(PlatformError::native("destroy", "context is current"));
        }
        if !state.live.remove(&handle) {
            return Err(PlatformError::native("destroy", "unknown handle"));
        }
        Ok(())
    }

    fn make_current(&self, _peer: &PeerInfo, handle: NativeHandle) -> Result<(), PlatformError> {
        let caller = thread::current().id();
        let mut state = self.state.lock();
        state.calls.make_currents += 1;

        if !state.live.contains(&handle) {
            return Err(PlatformError::native("make_current", "unknown handle"));
        }
        let elsewhere = state
            .current
            .iter()
            .any(|(thread, current)| *current == handle && *thread != caller);
        if elsewhere {
            return Err(PlatformError::native(
                "make_current",
                "context is current on another thread",
            ));
        }

        state.current.insert(caller, handle);
        Ok(())
    }

    fn release_current_context(&self) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.calls.releases += 1;
        state.current.remove(&thread::current().id());
        Ok(())
    }

    fn release_drawable(&self, handle: NativeHandle) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.calls.drawable_releases += 1;
        if !state.live.contains(&handle) {
            return Err(PlatformError::native("release_drawable", "unknown handle"));
        }
        Ok(())
    }

    fn update(&self, _handle: NativeHandle) {
        self.state.lock().calls.updates += 1;
    }

    fn is_current(&self, handle: NativeHandle) -> Result<bool, PlatformError> {
        let state = self.state.lock();
        if !state.live.contains(&handle) {
            return Err(PlatformError::native("is_current", "unknown handle"));
        }
        Ok(state.current.get(&thread::current().id()) == Some(&handle))
    }

    fn set_swap_interval(&self, interval: i32) {
        self.state.lock().swap_interval = interval;
    }

    fn swap_buffers(&self) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        if !state.current.contains_key(&thread::current().id()) {
            return Err(PlatformError::native("swap_buffers", "no current context"));
        }
        state.calls.swaps += 1;
        Ok(())
    }

    fn pending_error(&self) -> Option<GraphicsErrorCode> {
        let mut state = self.state.lock();
        if !state.current.contains_key(&thread::current().id()) {
            return None;
        }
        state.pending_error.take()
    }

    fn thread_exited(&self, thread: ThreadId) {
        self.state.lock().current.remove(&thread);
    }
}

impl LibraryLoader for HeadlessPlatform {
    fn load_library(&self) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.calls.library_loads += 1;
        state.library_loaded = true;
        Ok(())
    }

    fn unload_library(&self) {
        let mut state = self.state.lock();
        state.calls.library_unloads += 1;
        state.library_loaded = false;
    }
}
