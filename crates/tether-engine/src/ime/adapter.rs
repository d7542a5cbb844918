use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::PlatformError;

use super::{CompositionEvent, EventQueue, ImeSink};

/// Opaque native window identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct WindowHandle(pub u64);

impl From<winit::window::WindowId> for WindowHandle {
    fn from(id: winit::window::WindowId) -> Self {
        WindowHandle(u64::from(id))
    }
}

/// Opaque native input-method context identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct CompositionHandle(pub u64);

/// What the [`super::CompositionController`] needs from a platform.
pub trait ImeAdapter: Send {
    fn create(&mut self) -> Result<(), PlatformError>;

    fn destroy(&mut self);

    /// Moves every event recorded since the previous call to the back of
    /// `out`. Must not block.
    fn read(&mut self, out: &mut VecDeque<CompositionEvent>);

    fn set_enabled(&mut self, enabled: bool);

    /// While composing, input-method messages are intercepted and recorded
    /// instead of receiving the default system handling.
    fn set_composing(&mut self, composing: bool);
}

/// Native input-method manager calls.
pub trait ImeBackend: Send {
    fn create_composition(
        &mut self,
        window: WindowHandle,
    ) -> Result<CompositionHandle, PlatformError>;

    fn destroy_composition(&mut self, composition: CompositionHandle);

    /// Associates `composition` with `window`, or detaches it with `None`.
    fn set_association(&mut self, window: WindowHandle, composition: Option<CompositionHandle>);

    fn set_composing_flag(&mut self, _composing: bool) {}
}

/// [`ImeAdapter`] over a native [`ImeBackend`] bound to one window.
///
/// The composition context is associated with the window while enabled.
/// Creation enables it. Notifications arrive through the [`ImeSink`]
/// returned by [`NativeImeAdapter::sink`].
pub struct NativeImeAdapter<B> {
    backend: B,
    window: WindowHandle,
    composition: Option<CompositionHandle>,
    enabled: bool,
    sink: ImeSink,
}

impl<B: ImeBackend> NativeImeAdapter<B> {
    pub fn new(backend: B, window: WindowHandle) -> Self {
        Self {
            backend,
            window,
            composition: None,
            enabled: false,
            sink: ImeSink::new(Arc::new(EventQueue::new())),
        }
    }

    /// Producer handle for the window-message thread.
    pub fn sink(&self) -> ImeSink {
        self.sink.clone()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn apply_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        let Some(composition) = self.composition else {
            return;
        };
        self.enabled = enabled;
        let association = enabled.then_some(composition);
        self.backend.set_association(self.window, association);
    }
}

impl<B: ImeBackend> ImeAdapter for NativeImeAdapter<B> {
    fn create(&mut self) -> Result<(), PlatformError> {
        if self.composition.is_some() {
            return Ok(());
        }
        let composition = self.backend.create_composition(self.window)?;
        self.composition = Some(composition);
        self.apply_enabled(true);
        log::debug!("ime composition {composition:?} created for {:?}", self.window);
        Ok(())
    }

    fn destroy(&mut self) {
        self.apply_enabled(false);
        if self.sink.is_composing() {
            self.backend.set_composing_flag(false);
        }
        if let Some(composition) = self.composition.take() {
            self.backend.destroy_composition(composition);
            log::debug!("ime composition {composition:?} destroyed");
        }
        self.sink.reset();
    }

    fn read(&mut self, out: &mut VecDeque<CompositionEvent>) {
        self.sink.queue().drain_into(out);
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.apply_enabled(enabled);
    }

    fn set_composing(&mut self, composing: bool) {
        self.sink.set_composing(composing);
        self.backend.set_composing_flag(composing);
    }
}
