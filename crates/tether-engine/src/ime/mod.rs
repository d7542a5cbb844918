//! Input-method composition event pipeline.
//!
//! Native input-method messages are recorded by an [`ImeSink`] on the
//! window-message thread into a shared [`EventQueue`]. The
//! [`CompositionController`] pulls them in two steps:
//!
//! 1. `poll()` moves everything recorded since the previous poll into the controller
//! 2. `next()` copies the oldest polled event into the current event
//!
//! Platform specifics sit behind [`ImeAdapter`] (what the controller calls)
//! and [`ImeBackend`] (native input-method manager calls).

mod adapter;
mod controller;
mod queue;
mod sink;
mod types;

pub mod platform;

pub use adapter::{
    CompositionHandle, ImeAdapter, ImeBackend, NativeImeAdapter, WindowHandle,
};
pub use controller::CompositionController;
pub use queue::EventQueue;
pub use sink::{CompositionNotification, CompositionUpdate, ImeMessageKind, ImeSink};
pub use types::{CompositionEvent, CompositionState};
