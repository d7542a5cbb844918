use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::PlatformError;

use super::LibraryLoader;

/// Process-wide reference count on the native graphics library.
///
/// Each live context holds one reference. The library is loaded on the first
/// acquire and unloaded when the last reference is released.
pub struct LibraryBinding {
    loader: Arc<dyn LibraryLoader>,
    refs: Mutex<usize>,
}

impl LibraryBinding {
    pub fn new(loader: Arc<dyn LibraryLoader>) -> Self {
        Self {
            loader,
            refs: Mutex::new(0),
        }
    }

    pub fn acquire(&self) -> Result<(), PlatformError> {
        let mut refs = self.refs.lock();
        if *refs == 0 {
            self.loader.load_library()?;
            log::debug!("graphics library loaded");
        }
        *refs += 1;
        Ok(())
    }

    pub fn release(&self) {
        let mut refs = self.refs.lock();
        match *refs {
            0 => log::warn!("graphics library released more times than acquired"),
            1 => {
                *refs = 0;
                self.loader.unload_library();
                log::debug!("graphics library unloaded");
            }
            _ => *refs -= 1,
        }
    }

    /// Number of outstanding references.
    pub fn refs(&self) -> usize {
        *self.refs.lock()
    }
}
