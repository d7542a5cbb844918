use std::collections::HashMap;
use std::thread::ThreadId;

use parking_lot::Mutex;

use super::Context;

/// Which context is current on which thread.
///
/// Entries are written only from the owning thread's call path but may be
/// read from any thread. The lock is a leaf: no context lock is ever taken
/// while it is held.
#[derive(Default)]
pub(crate) struct CurrentRegistry {
    current: Mutex<HashMap<ThreadId, Context>>,
}

impl CurrentRegistry {
    pub fn get(&self, thread: ThreadId) -> Option<Context> {
        self.current.lock().get(&thread).cloned()
    }

    /// Records `context` as current on `thread`, returning the previous entry.
    pub fn set(&self, thread: ThreadId, context: &Context) -> Option<Context> {
        self.current.lock().insert(thread, context.clone())
    }

    /// Removes the entry for `thread` if it still points at `context`.
    pub fn clear_if(&self, thread: ThreadId, context: &Context) -> Option<Context> {
        let mut current = self.current.lock();
        match current.get(&thread) {
            Some(entry) if entry == context => current.remove(&thread),
            _ => None,
        }
    }

    pub fn remove(&self, thread: ThreadId) -> Option<Context> {
        self.current.lock().remove(&thread)
    }

    pub fn len(&self) -> usize {
        self.current.lock().len()
    }
}
