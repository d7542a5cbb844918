use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

use parking_lot::{Mutex, MutexGuard};

use crate::error::{Error, Result};

use super::runtime::RuntimeShared;
use super::{ContextInit, ContextPlatform, Lifecycle, NativeHandle, PeerInfo};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique context identifier, used in log output.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    fn next() -> Self {
        ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

pub(crate) struct ContextShared {
    id: ContextId,
    label: Option<String>,
    peer: PeerInfo,
    handle: NativeHandle,
    check_errors_on_destroy: bool,
    lifecycle: Mutex<Lifecycle>,
    runtime: Arc<RuntimeShared>,
}

/// A native rendering context bound to at most one thread at a time.
///
/// `Context` is a cheap handle; clones refer to the same native context.
/// Every operation takes the context's own lock for its full duration, so
/// transitions on one context are serialized.
///
/// Destruction is deferred while another thread has the context current and
/// completes inside that thread's next release. Dropping the last handle of a
/// context that was never destroyed destroys it.
#[derive(Clone)]
pub struct Context {
    shared: Arc<ContextShared>,
}

impl Context {
    pub(crate) fn create(
        runtime: &Arc<RuntimeShared>,
        peer: PeerInfo,
        shared_context: Option<&Context>,
        init: ContextInit,
    ) -> Result<Self> {
        let handle = match shared_context {
            Some(parent) => {
                if !Arc::ptr_eq(&parent.shared.runtime, runtime) {
                    return Err(Error::ForeignSharedContext);
                }
                // Held across the native call so the parent cannot be
                // destroyed while the child is created against it.
                let parent_lifecycle = parent.lock();
                if parent_lifecycle.is_destroyed() {
                    return Err(Error::SharedContextDestroyed);
                }
                create_native(runtime, &peer, Some(parent.shared.handle))?
            }
            // The new context is not visible to any other thread yet.
            None => create_native(runtime, &peer, None)?,
        };

        let context = Context {
            shared: Arc::new(ContextShared {
                id: ContextId::next(),
                label: init.label,
                peer,
                handle,
                check_errors_on_destroy: init.check_errors_on_destroy,
                lifecycle: Mutex::new(Lifecycle::default()),
                runtime: runtime.clone(),
            }),
        };

        match shared_context {
            Some(parent) => log::debug!("{context}: created, sharing with {parent}"),
            None => log::debug!("{context}: created"),
        }

        Ok(context)
    }

    pub fn id(&self) -> ContextId {
        self.shared.id
    }

    pub fn label(&self) -> Option<&str> {
        self.shared.label.as_deref()
    }

    pub fn peer_info(&self) -> PeerInfo {
        self.shared.peer
    }

    /// Snapshot of the lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        *self.lock()
    }

    pub fn is_destroyed(&self) -> bool {
        self.lock().is_destroyed()
    }

    pub fn is_destroy_pending(&self) -> bool {
        self.lock().is_destroy_pending()
    }

    /// Thread that has this context current, if any.
    pub fn owner(&self) -> Option<ThreadId> {
        self.lock().owner()
    }

    /// Makes the context current on the calling thread.
    ///
    /// Fails if the context is destroyed or another thread has it current.
    /// A different context current on this thread is implicitly released.
    pub fn make_current(&self) -> Result<()> {
        let caller = thread::current().id();

        let previous = {
            let mut lifecycle = self.lock();
            lifecycle.check_access(caller)?;
            lifecycle.ensure_live()?;

            self.platform()
                .make_current(&self.shared.peer, self.shared.handle)?;
            lifecycle.set_owner(Some(caller));
            self.shared.runtime.registry.set(caller, self)
        };

        if let Some(previous) = previous.filter(|previous| previous != self) {
            previous.detach_from(caller);
        }

        log::trace!("{self}: current on {caller:?}");
        Ok(())
    }

    /// Queries the platform whether this context is current on the calling
    /// thread.
    pub fn is_current(&self) -> Result<bool> {
        let lifecycle = self.lock();
        lifecycle.ensure_live()?;
        Ok(self.platform().is_current(self.shared.handle)?)
    }

    /// Detaches the context from its drawable without releasing it.
    pub fn release_drawable(&self) -> Result<()> {
        let lifecycle = self.lock();
        lifecycle.ensure_live()?;
        Ok(self.platform().release_drawable(self.shared.handle)?)
    }

    /// Call whenever the drawable is moved or resized.
    pub fn update(&self) -> Result<()> {
        let lifecycle = self.lock();
        lifecycle.ensure_live()?;
        self.platform().update(self.shared.handle);
        Ok(())
    }

    /// Best-effort change of the swap interval, in video frame periods.
    pub fn set_swap_interval(&self, interval: i32) -> Result<()> {
        let lifecycle = self.lock();
        lifecycle.ensure_live()?;
        self.platform().set_swap_interval(interval);
        Ok(())
    }

    /// Requests destruction.
    ///
    /// If the context is current on the calling thread it is released first,
    /// and a native error pending at that point is returned as
    /// [`Error::Graphics`] after destruction completes. If another thread has
    /// it current, destruction completes when that thread releases it.
    /// Destroying a destroyed context is a no-op.
    pub fn destroy(&self) -> Result<()> {
        let mut lifecycle = self.lock();
        self.destroy_locked(&mut lifecycle)
    }

    /// Like [`Context::destroy`], but fails unless the context is current on
    /// the calling thread or on no thread.
    pub fn force_destroy(&self) -> Result<()> {
        let mut lifecycle = self.lock();
        lifecycle.check_access(thread::current().id())?;
        self.destroy_locked(&mut lifecycle)
    }

    fn destroy_locked(&self, lifecycle: &mut Lifecycle) -> Result<()> {
        if !lifecycle.request_destroy() {
            return Ok(());
        }

        let caller = thread::current().id();
        let was_current = lifecycle.owner() == Some(caller);
        let mut pending_error = None;

        if was_current {
            if self.shared.check_errors_on_destroy {
                pending_error = self.platform().pending_error();
            }
            self.release_locked(lifecycle, caller)?;
        }

        check_destroy(&self.shared, lifecycle);

        match pending_error {
            Some(code) => Err(Error::Graphics(code)),
            None => Ok(()),
        }
    }

    /// Releases this context from `caller`, which must be its owner.
    fn release_locked(&self, lifecycle: &mut Lifecycle, caller: ThreadId) -> Result<()> {
        self.platform().release_current_context()?;
        let _entry = self.shared.runtime.registry.clear_if(caller, self);
        lifecycle.set_owner(None);
        log::trace!("{self}: released from {caller:?}");
        Ok(())
    }

    /// Clears ownership after `thread` stopped having this context current,
    /// and completes a pending destroy.
    pub(crate) fn detach_from(&self, thread: ThreadId) {
        let mut lifecycle = self.lock();
        if lifecycle.owner() == Some(thread) {
            lifecycle.set_owner(None);
            check_destroy(&self.shared, &mut lifecycle);
        }
    }

    fn platform(&self) -> &dyn ContextPlatform {
        self.shared.runtime.platform.as_ref()
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.shared.lifecycle.lock()
    }
}

fn create_native(
    runtime: &RuntimeShared,
    peer: &PeerInfo,
    shared: Option<NativeHandle>,
) -> Result<NativeHandle> {
    runtime.library.acquire().map_err(Error::Creation)?;
    match runtime.platform.create(peer, shared) {
        Ok(handle) => Ok(handle),
        Err(err) => {
            runtime.library.release();
            Err(Error::Creation(err))
        }
    }
}

/// Destroys the native context once destroy was requested and no thread has
/// it current. Failures are logged and leave the context pending.
fn check_destroy(shared: &ContextShared, lifecycle: &mut Lifecycle) {
    if !lifecycle.ready_to_destroy() {
        return;
    }

    let platform = shared.runtime.platform.as_ref();
    let result = platform
        .release_drawable(shared.handle)
        .and_then(|()| platform.destroy(&shared.peer, shared.handle));

    match result {
        Ok(()) => {
            *lifecycle = Lifecycle::Destroyed;
            shared.runtime.library.release();
            log::debug!("{shared}: destroyed");
        }
        Err(err) => log::error!("{shared}: error while destroying context: {err}"),
    }
}

impl Drop for ContextShared {
    fn drop(&mut self) {
        let mut lifecycle = *self.lifecycle.get_mut();
        if lifecycle.is_destroyed() {
            return;
        }
        if lifecycle.owner().is_some() {
            log::warn!("{self}: dropped while current, native context leaked");
            return;
        }

        log::warn!("{self}: dropped without destroy");
        lifecycle.request_destroy();
        check_destroy(self, &mut lifecycle);
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for Context {}

impl fmt::Display for ContextShared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "context #{} ({label})", self.id.0),
            None => write!(f, "context #{}", self.id.0),
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.shared, f)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.shared.id)
            .field("label", &self.shared.label)
            .field("handle", &self.shared.handle)
            .finish_non_exhaustive()
    }
}
