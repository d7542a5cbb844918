use std::sync::Arc;

use parking_lot::Mutex;

use super::{CompositionEvent, CompositionState, EventQueue};

/// Input-method message kinds a window procedure may receive.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ImeMessageKind {
    StartComposition,
    EndComposition,
    Composition,
    Notify,
    SetContext,
    Control,
    CompositionFull,
    Select,
    Char,
    Request,
    KeyDown,
    KeyUp,
}

/// Data carried by one composition-update message.
///
/// Each field is `Some` only when the message flagged it and the native
/// lookup succeeded.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct CompositionUpdate {
    pub result: Option<String>,
    pub compose: Option<String>,
    pub cursor: Option<i32>,
}

/// A native composition notification, already decoded.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CompositionNotification {
    Start,
    Update(CompositionUpdate),
    End,
}

#[derive(Debug, Default)]
struct SinkState {
    scratch: CompositionEvent,
    composing: bool,
}

/// Producer side of the composition pipeline.
///
/// Handed to the thread that receives native input-method messages. Each
/// notification is turned into zero or more queued [`CompositionEvent`]s:
///
/// | notification | queued events |
/// |--------------|---------------|
/// | `Start` | `Start` |
/// | `Update` | `Result(text)`, `Compose(text)`, `Compose(cursor)`, each only if present |
/// | `End` | `End` |
///
/// The scratch event accumulates the composition in progress and is reset
/// at start and after end.
#[derive(Debug, Clone)]
pub struct ImeSink {
    queue: Arc<EventQueue>,
    state: Arc<Mutex<SinkState>>,
}

impl ImeSink {
    pub fn new(queue: Arc<EventQueue>) -> Self {
        Self {
            queue,
            state: Arc::new(Mutex::new(SinkState::default())),
        }
    }

    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    /// Whether the window procedure should route `kind` here instead of the
    /// default system handling. Only input-method messages are intercepted,
    /// and only while composing.
    pub fn handles_message(&self, kind: ImeMessageKind) -> bool {
        match kind {
            ImeMessageKind::KeyDown | ImeMessageKind::KeyUp => false,
            _ => self.state.lock().composing,
        }
    }

    pub fn is_composing(&self) -> bool {
        self.state.lock().composing
    }

    pub(crate) fn set_composing(&self, composing: bool) {
        self.state.lock().composing = composing;
    }

    /// Snapshot of the composition in progress.
    pub fn scratch(&self) -> CompositionEvent {
        self.state.lock().scratch.clone()
    }

    /// Records `notification`, returning how many events were queued.
    pub fn dispatch(&self, notification: CompositionNotification) -> usize {
        let mut state = self.state.lock();
        let scratch = &mut state.scratch;

        match notification {
            CompositionNotification::Start => {
                scratch.reset();
                scratch.state = CompositionState::Start;
                self.queue.push(&CompositionEvent::start());
                1
            }
            CompositionNotification::Update(update) => {
                let mut queued = 0;
                if let Some(text) = update.result {
                    self.queue.push(&CompositionEvent::result(text.as_str()));
                    scratch.text = Some(text);
                    scratch.state = CompositionState::Result;
                    queued += 1;
                }
                if let Some(text) = update.compose {
                    self.queue.push(&CompositionEvent::compose(text.as_str()));
                    scratch.text = Some(text);
                    scratch.state = CompositionState::Compose;
                    queued += 1;
                }
                if let Some(position) = update.cursor {
                    self.queue.push(&CompositionEvent::cursor(position));
                    scratch.cursor_position = position;
                    scratch.state = CompositionState::Compose;
                    queued += 1;
                }
                queued
            }
            CompositionNotification::End => {
                self.queue.push(&CompositionEvent::end());
                scratch.reset();
                1
            }
        }
    }

    /// Drops queued events and the scratch event, and stops intercepting.
    pub(crate) fn reset(&self) {
        let mut state = self.state.lock();
        state.scratch.reset();
        state.composing = false;
        self.queue.clear();
    }
}
