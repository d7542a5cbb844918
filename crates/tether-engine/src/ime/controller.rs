use std::collections::VecDeque;

use parking_lot::{Mutex, MutexGuard};
use state::InitCell;

use crate::error::{Error, Result};

use super::{CompositionEvent, CompositionState, ImeAdapter};

static GLOBAL: InitCell<CompositionController> = InitCell::new();

struct ControllerState {
    adapter: Box<dyn ImeAdapter>,
    created: bool,
    current: CompositionEvent,
    polled: VecDeque<CompositionEvent>,
}

impl ControllerState {
    fn ensure_created(&self, operation: &'static str) -> Result<()> {
        if !self.created {
            return Err(Error::NotCreated { operation });
        }
        Ok(())
    }
}

/// Consumer side of the composition pipeline.
///
/// Events become visible in two steps: [`poll`](Self::poll) moves everything
/// the adapter recorded into the controller, then each [`next`](Self::next)
/// copies the oldest polled event into the single "current event" read by
/// [`string`](Self::string), [`cursor_position`](Self::cursor_position) and
/// [`state`](Self::state).
///
/// All operations share one lock.
pub struct CompositionController {
    state: Mutex<ControllerState>,
}

impl CompositionController {
    pub fn new(adapter: impl ImeAdapter + 'static) -> Self {
        Self {
            state: Mutex::new(ControllerState {
                adapter: Box::new(adapter),
                created: false,
                current: CompositionEvent::default(),
                polled: VecDeque::new(),
            }),
        }
    }

    /// Installs the process-wide controller.
    ///
    /// Only the first installation takes effect; later adapters are dropped
    /// and the existing controller is returned.
    pub fn install_global(adapter: impl ImeAdapter + 'static) -> &'static CompositionController {
        if !GLOBAL.set(Self::new(adapter)) {
            log::warn!("composition controller already installed; keeping the existing one");
        }
        GLOBAL.get()
    }

    pub fn global() -> Option<&'static CompositionController> {
        GLOBAL.try_get()
    }

    /// Creates the native composition binding. The owning window must exist.
    pub fn create(&self) -> Result<()> {
        let mut state = self.lock();
        if state.created {
            return Ok(());
        }
        state.adapter.create().map_err(Error::Creation)?;
        state.created = true;
        state.current.reset();
        log::debug!("composition controller created");
        Ok(())
    }

    pub fn is_created(&self) -> bool {
        self.lock().created
    }

    pub fn destroy(&self) {
        let mut state = self.lock();
        if !state.created {
            return;
        }
        state.created = false;
        state.adapter.destroy();
        state.current.reset();
        state.polled.clear();
        log::debug!("composition controller destroyed");
    }

    /// Collects the events recorded since the previous poll. Never blocks.
    pub fn poll(&self) -> Result<()> {
        let mut state = self.lock();
        state.ensure_created("poll")?;
        let ControllerState { adapter, polled, .. } = &mut *state;
        adapter.read(polled);
        Ok(())
    }

    /// Advances the current event to the oldest polled event.
    ///
    /// Returns `false`, leaving the current event untouched, when nothing is
    /// left.
    pub fn next(&self) -> Result<bool> {
        let mut state = self.lock();
        state.ensure_created("next")?;
        match state.polled.pop_front() {
            Some(event) => {
                state.current = event;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Events polled but not yet consumed by [`next`](Self::next).
    pub fn pending(&self) -> Result<usize> {
        let state = self.lock();
        state.ensure_created("pending")?;
        Ok(state.polled.len())
    }

    pub fn string(&self) -> Result<Option<String>> {
        let state = self.lock();
        state.ensure_created("string")?;
        Ok(state.current.text.clone())
    }

    pub fn cursor_position(&self) -> Result<i32> {
        let state = self.lock();
        state.ensure_created("cursor_position")?;
        Ok(state.current.cursor_position)
    }

    pub fn state(&self) -> Result<CompositionState> {
        let state = self.lock();
        state.ensure_created("state")?;
        Ok(state.current.state)
    }

    /// Copy of the whole current event.
    pub fn current_event(&self) -> Result<CompositionEvent> {
        let state = self.lock();
        state.ensure_created("current_event")?;
        Ok(state.current.clone())
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        let mut state = self.lock();
        state.ensure_created("set_enabled")?;
        state.adapter.set_enabled(enabled);
        Ok(())
    }

    pub fn set_composing(&self, composing: bool) -> Result<()> {
        let mut state = self.lock();
        state.ensure_created("set_composing")?;
        state.adapter.set_composing(composing);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::error::ErrorKind;
    use crate::ime::adapter::tests::{BackendCall, RecordingBackend};
    use crate::ime::{
        CompositionNotification, CompositionUpdate, ImeMessageKind, ImeSink, NativeImeAdapter,
        WindowHandle,
    };

    fn controller() -> (CompositionController, ImeSink, RecordingBackend) {
        let backend = RecordingBackend::default();
        let adapter = NativeImeAdapter::new(backend.clone(), WindowHandle(1));
        let sink = adapter.sink();
        (CompositionController::new(adapter), sink, backend)
    }

    fn created() -> (CompositionController, ImeSink) {
        let (controller, sink, _) = controller();
        controller.create().unwrap();
        (controller, sink)
    }

    fn result_update(text: &str) -> CompositionNotification {
        CompositionNotification::Update(CompositionUpdate {
            result: Some(text.into()),
            ..Default::default()
        })
    }

    // ── create / destroy ──────────────────────────────────────────────────

    #[test]
    fn operations_fail_before_create() {
        let (controller, _, _) = controller();

        assert_eq!(controller.poll().unwrap_err().kind(), ErrorKind::State);
        assert!(matches!(controller.next(), Err(Error::NotCreated { .. })));
        assert!(controller.set_enabled(true).is_err());
        assert!(controller.set_composing(true).is_err());
        assert!(controller.string().is_err());
        assert!(controller.cursor_position().is_err());
        assert!(controller.state().is_err());
    }

    #[test]
    fn operations_fail_again_after_destroy() {
        let (controller, _) = created();
        controller.destroy();
        controller.destroy();

        assert!(!controller.is_created());
        assert!(matches!(
            controller.set_composing(true),
            Err(Error::NotCreated { operation: "set_composing" })
        ));
        assert!(controller.string().is_err());
    }

    #[test]
    fn create_is_idempotent_and_starts_from_none() {
        let (controller, _, backend) = controller();
        controller.create().unwrap();
        controller.create().unwrap();

        let creates = backend
            .calls
            .lock()
            .iter()
            .filter(|call| matches!(call, BackendCall::Create(_)))
            .count();
        assert_eq!(creates, 1);
        assert_eq!(controller.state().unwrap(), CompositionState::None);
        assert_eq!(controller.string().unwrap(), None);
        assert_eq!(controller.cursor_position().unwrap(), 0);
    }

    #[test]
    fn failed_create_leaves_controller_uncreated() {
        let backend = RecordingBackend {
            fail_create: true,
            ..Default::default()
        };
        let controller = CompositionController::new(NativeImeAdapter::new(backend, WindowHandle(1)));

        let err = controller.create().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Creation);
        assert!(!controller.is_created());
    }

    #[test]
    fn settings_reach_the_backend() {
        let (controller, sink, backend) = controller();
        controller.create().unwrap();

        controller.set_composing(true).unwrap();
        controller.set_enabled(false).unwrap();

        assert!(sink.is_composing());
        let calls = backend.calls.lock();
        assert!(calls.contains(&BackendCall::Composing(true)));
        assert_eq!(calls.last(), Some(&BackendCall::Associate(WindowHandle(1), None)));
    }

    #[test]
    fn recreated_controller_does_not_intercept_until_asked() {
        let (controller, sink, backend) = controller();
        controller.create().unwrap();
        controller.set_composing(true).unwrap();
        assert!(sink.handles_message(ImeMessageKind::Composition));

        controller.destroy();
        controller.create().unwrap();

        assert!(!sink.handles_message(ImeMessageKind::Composition));
        assert_eq!(
            backend
                .calls
                .lock()
                .iter()
                .filter(|call| **call == BackendCall::Composing(false))
                .count(),
            1
        );

        controller.set_composing(true).unwrap();
        assert!(sink.handles_message(ImeMessageKind::Composition));
    }

    // ── poll / next ───────────────────────────────────────────────────────

    #[test]
    fn events_are_invisible_until_polled() {
        let (controller, sink) = created();
        sink.dispatch(CompositionNotification::Start);

        assert!(!controller.next().unwrap());
        controller.poll().unwrap();
        assert!(controller.next().unwrap());
        assert_eq!(controller.state().unwrap(), CompositionState::Start);
    }

    #[test]
    fn start_result_end_drains_in_order() {
        let (controller, sink) = created();
        sink.dispatch(CompositionNotification::Start);
        sink.dispatch(result_update("A"));
        sink.dispatch(CompositionNotification::End);
        controller.poll().unwrap();

        assert!(controller.next().unwrap());
        assert_eq!(controller.state().unwrap(), CompositionState::Start);
        assert_eq!(controller.string().unwrap(), None);

        assert!(controller.next().unwrap());
        assert_eq!(controller.state().unwrap(), CompositionState::Result);
        assert_eq!(controller.string().unwrap().as_deref(), Some("A"));

        assert!(controller.next().unwrap());
        assert_eq!(controller.state().unwrap(), CompositionState::End);
        assert_eq!(controller.string().unwrap(), None);
        assert_eq!(controller.cursor_position().unwrap(), 0);

        assert!(!controller.next().unwrap());
    }

    #[test]
    fn result_with_cursor_yields_two_events() {
        let (controller, sink) = created();
        sink.dispatch(CompositionNotification::Update(CompositionUpdate {
            result: Some("A".into()),
            cursor: Some(3),
            compose: None,
        }));
        controller.poll().unwrap();
        assert_eq!(controller.pending().unwrap(), 2);

        controller.next().unwrap();
        assert_eq!(controller.current_event().unwrap(), CompositionEvent::result("A"));

        controller.next().unwrap();
        assert_eq!(controller.state().unwrap(), CompositionState::Compose);
        assert_eq!(controller.cursor_position().unwrap(), 3);
        assert_eq!(controller.string().unwrap(), None);

        assert!(!controller.next().unwrap());
    }

    #[test]
    fn empty_next_keeps_the_current_event() {
        let (controller, sink) = created();
        sink.dispatch(CompositionNotification::Update(CompositionUpdate {
            compose: Some("かな".into()),
            ..Default::default()
        }));
        controller.poll().unwrap();
        controller.next().unwrap();
        let before = controller.current_event().unwrap();

        assert!(!controller.next().unwrap());
        assert_eq!(controller.current_event().unwrap(), before);
    }

    #[test]
    fn each_poll_collects_only_new_events() {
        let (controller, sink) = created();
        sink.dispatch(CompositionNotification::Start);
        controller.poll().unwrap();
        controller.poll().unwrap();
        assert_eq!(controller.pending().unwrap(), 1);

        sink.dispatch(CompositionNotification::End);
        controller.poll().unwrap();
        assert_eq!(controller.pending().unwrap(), 2);

        controller.next().unwrap();
        controller.next().unwrap();
        assert_eq!(controller.state().unwrap(), CompositionState::End);
    }

    #[test]
    fn producer_thread_feeds_consumer() {
        let (controller, sink) = created();
        let producer = thread::spawn(move || {
            sink.dispatch(CompositionNotification::Start);
            for i in 0..10 {
                sink.dispatch(CompositionNotification::Update(CompositionUpdate {
                    cursor: Some(i),
                    ..Default::default()
                }));
            }
            sink.dispatch(CompositionNotification::End);
        });
        producer.join().unwrap();

        controller.poll().unwrap();
        let mut cursors = Vec::new();
        while controller.next().unwrap() {
            if controller.state().unwrap() == CompositionState::Compose {
                cursors.push(controller.cursor_position().unwrap());
            }
        }
        assert_eq!(cursors, (0..10).collect::<Vec<_>>());
        assert_eq!(controller.state().unwrap(), CompositionState::End);
    }

    #[test]
    fn controller_is_shareable_across_threads() {
        let (controller, sink) = created();
        let controller = Arc::new(controller);
        sink.dispatch(CompositionNotification::Start);

        let poller = controller.clone();
        thread::spawn(move || poller.poll().unwrap()).join().unwrap();

        assert!(controller.next().unwrap());
    }

    #[test]
    fn global_controller_is_installed_once() {
        let first = CompositionController::install_global(NativeImeAdapter::new(
            RecordingBackend::default(),
            WindowHandle(1),
        ));
        let second = CompositionController::install_global(NativeImeAdapter::new(
            RecordingBackend::default(),
            WindowHandle(2),
        ));

        assert!(std::ptr::eq(first, second));
        assert!(CompositionController::global().is_some());
    }
}
