//! Platform IME backends.

pub mod winit;
