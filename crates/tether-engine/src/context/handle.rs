use std::fmt;

/// Opaque native context handle produced by a [`super::ContextPlatform`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct NativeHandle(u64);

impl NativeHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Identifies the drawable a context is attached to.
///
/// The value is meaningful only to the platform adapter (a window, a pbuffer,
/// an offscreen surface).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PeerInfo(u64);

impl PeerInfo {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Native graphics error code (never the "no error" value).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct GraphicsErrorCode(pub u32);

impl fmt::Display for GraphicsErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}
