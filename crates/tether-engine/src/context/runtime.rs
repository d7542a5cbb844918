use std::sync::Arc;
use std::thread::{self, ThreadId};

use crate::error::Result;

use super::registry::CurrentRegistry;
use super::{
    Context, ContextInit, ContextPlatform, HeadlessPlatform, LibraryBinding, LibraryLoader,
    PeerInfo,
};

pub(crate) struct RuntimeShared {
    pub(crate) platform: Arc<dyn ContextPlatform>,
    pub(crate) library: LibraryBinding,
    pub(crate) registry: CurrentRegistry,
}

/// Factory and process-wide state for contexts.
///
/// A runtime binds one platform backend, the reference-counted library
/// binding, and the record of which context is current on which thread.
/// Create it once at startup and clone it where contexts are needed.
#[derive(Clone)]
pub struct ContextRuntime {
    shared: Arc<RuntimeShared>,
}

impl ContextRuntime {
    pub fn new(platform: Arc<dyn ContextPlatform>, loader: Arc<dyn LibraryLoader>) -> Self {
        Self {
            shared: Arc::new(RuntimeShared {
                platform,
                library: LibraryBinding::new(loader),
                registry: CurrentRegistry::default(),
            }),
        }
    }

    /// Runtime backed by the software [`HeadlessPlatform`].
    pub fn headless(platform: Arc<HeadlessPlatform>) -> Self {
        Self::new(platform.clone(), platform)
    }

    /// Creates a context for `peer`, optionally sharing objects with
    /// `shared_context`.
    pub fn create_context(&self, peer: PeerInfo, shared_context: Option<&Context>) -> Result<Context> {
        self.create_context_with(peer, shared_context, ContextInit::default())
    }

    pub fn create_context_with(
        &self,
        peer: PeerInfo,
        shared_context: Option<&Context>,
        init: ContextInit,
    ) -> Result<Context> {
        Context::create(&self.shared, peer, shared_context, init)
    }

    /// The context current on the calling thread.
    pub fn current_context(&self) -> Option<Context> {
        self.current_context_on(thread::current().id())
    }

    /// The context current on `thread`.
    pub fn current_context_on(&self, thread: ThreadId) -> Option<Context> {
        self.shared.registry.get(thread)
    }

    /// Number of threads that currently have a context current.
    pub fn current_thread_count(&self) -> usize {
        self.shared.registry.len()
    }

    /// Releases the context current on the calling thread, if any.
    ///
    /// A destroy requested while the context was current completes here.
    /// Threads must call this before exiting: a context left current on an
    /// exited thread stays owned by it until [`forget_thread`](Self::forget_thread).
    pub fn release_current_context(&self) -> Result<()> {
        let caller = thread::current().id();
        let Some(current) = self.shared.registry.get(caller) else {
            return Ok(());
        };

        self.shared.platform.release_current_context()?;
        let _entry = self.shared.registry.clear_if(caller, &current);
        current.detach_from(caller);
        Ok(())
    }

    /// Drops the current context of `thread`, which must have exited.
    ///
    /// Clears its registry entry and ownership, and completes a destroy that
    /// was waiting for that thread to release.
    pub fn forget_thread(&self, thread: ThreadId) {
        if thread == thread::current().id() {
            log::warn!("forget_thread called for the running thread {thread:?}; ignored");
            return;
        }
        self.shared.platform.thread_exited(thread);
        if let Some(context) = self.shared.registry.remove(thread) {
            log::debug!("{context}: forgotten by exited thread {thread:?}");
            context.detach_from(thread);
        }
    }

    /// Swaps buffers of whatever context is current on the calling thread.
    pub fn swap_buffers(&self) -> Result<()> {
        Ok(self.shared.platform.swap_buffers()?)
    }

    /// Outstanding references on the native graphics library.
    pub fn library_refs(&self) -> usize {
        self.shared.library.refs()
    }
}
