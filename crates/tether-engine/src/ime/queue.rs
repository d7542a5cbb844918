use std::collections::VecDeque;

use parking_lot::Mutex;

use super::CompositionEvent;

/// Thread-safe FIFO between the native notification thread and the poller.
///
/// Events are stored as copies; nothing enqueued is mutated afterwards.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Mutex<VecDeque<CompositionEvent>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: &CompositionEvent) {
        self.events.lock().push_back(event.clone());
    }

    /// Moves every queued event to the back of `out`, oldest first.
    pub fn drain_into(&self, out: &mut VecDeque<CompositionEvent>) -> usize {
        let mut events = self.events.lock();
        let moved = events.len();
        out.extend(events.drain(..));
        moved
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::ime::CompositionState;

    #[test]
    fn drain_preserves_insertion_order() {
        let queue = EventQueue::new();
        queue.push(&CompositionEvent::start());
        queue.push(&CompositionEvent::compose("ka"));
        queue.push(&CompositionEvent::end());

        let mut out = VecDeque::new();
        assert_eq!(queue.drain_into(&mut out), 3);
        assert!(queue.is_empty());

        let states: Vec<_> = out.iter().map(|e| e.state).collect();
        assert_eq!(
            states,
            [
                CompositionState::Start,
                CompositionState::Compose,
                CompositionState::End,
            ]
        );
    }

    #[test]
    fn pushed_events_are_copies() {
        let queue = EventQueue::new();
        let mut scratch = CompositionEvent::compose("a");
        queue.push(&scratch);
        scratch.text = Some("changed".into());

        let mut out = VecDeque::new();
        queue.drain_into(&mut out);
        assert_eq!(out[0].text.as_deref(), Some("a"));
    }

    #[test]
    fn concurrent_producers_lose_nothing() {
        let queue = Arc::new(EventQueue::new());
        let producers: Vec<_> = (0..4)
            .map(|_| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        queue.push(&CompositionEvent::cursor(i));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        assert_eq!(queue.len(), 400);
    }
}
