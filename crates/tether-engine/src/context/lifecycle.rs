use std::thread::ThreadId;

use crate::error::{Error, Result};

/// Lifecycle of a [`super::Context`].
///
/// ```text
/// Live { None } --make_current--> Live { Some(t) } --release--> Live { None }
///      |                               |
///   destroy                         destroy (from another thread)
///      v                               v
/// Destroyed <--release/check-- DestroyPending { owner }
/// ```
///
/// A destroy request never leaves `DestroyPending` while a thread still owns
/// the context. `Destroyed` is terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Lifecycle {
    Live { owner: Option<ThreadId> },
    DestroyPending { owner: Option<ThreadId> },
    Destroyed,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Lifecycle::Live { owner: None }
    }
}

impl Lifecycle {
    /// Thread that currently has the context current, if any.
    pub fn owner(&self) -> Option<ThreadId> {
        match *self {
            Lifecycle::Live { owner } | Lifecycle::DestroyPending { owner } => owner,
            Lifecycle::Destroyed => None,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self, Lifecycle::Destroyed)
    }

    pub fn is_destroy_pending(&self) -> bool {
        matches!(self, Lifecycle::DestroyPending { .. })
    }

    /// Succeeds if no thread owns the context or `caller` is the owner.
    pub(crate) fn check_access(&self, caller: ThreadId) -> Result<()> {
        match self.owner() {
            Some(owner) if owner != caller => Err(Error::AccessViolation { caller, owner }),
            _ => Ok(()),
        }
    }

    pub(crate) fn ensure_live(&self) -> Result<()> {
        if self.is_destroyed() {
            return Err(Error::Destroyed);
        }
        Ok(())
    }

    pub(crate) fn set_owner(&mut self, new_owner: Option<ThreadId>) {
        match self {
            Lifecycle::Live { owner } | Lifecycle::DestroyPending { owner } => *owner = new_owner,
            Lifecycle::Destroyed => {}
        }
    }

    /// Moves a live context to `DestroyPending`. Returns `false` once destroyed.
    pub(crate) fn request_destroy(&mut self) -> bool {
        match *self {
            Lifecycle::Live { owner } => {
                *self = Lifecycle::DestroyPending { owner };
                true
            }
            Lifecycle::DestroyPending { .. } => true,
            Lifecycle::Destroyed => false,
        }
    }

    pub(crate) fn ready_to_destroy(&self) -> bool {
        matches!(self, Lifecycle::DestroyPending { owner: None })
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::error::ErrorKind;

    fn other_thread() -> ThreadId {
        thread::spawn(|| thread::current().id()).join().unwrap()
    }

    #[test]
    fn access_is_open_without_owner() {
        let me = thread::current().id();
        assert!(Lifecycle::default().check_access(me).is_ok());
    }

    #[test]
    fn access_is_denied_to_non_owner() {
        let lifecycle = Lifecycle::Live { owner: Some(other_thread()) };
        let err = lifecycle.check_access(thread::current().id()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn destroy_waits_for_owner_to_leave() {
        let me = thread::current().id();
        let mut lifecycle = Lifecycle::Live { owner: Some(me) };

        assert!(lifecycle.request_destroy());
        assert!(lifecycle.is_destroy_pending());
        assert!(!lifecycle.ready_to_destroy());

        lifecycle.set_owner(None);
        assert!(lifecycle.ready_to_destroy());
    }

    #[test]
    fn destroyed_is_terminal() {
        let mut lifecycle = Lifecycle::Destroyed;
        assert!(!lifecycle.request_destroy());
        lifecycle.set_owner(Some(thread::current().id()));
        assert_eq!(lifecycle, Lifecycle::Destroyed);
        assert!(matches!(lifecycle.ensure_live(), Err(Error::Destroyed)));
    }
}
