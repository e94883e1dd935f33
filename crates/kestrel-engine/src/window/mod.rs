//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, brings up the GPU for the window
//! and drives the rendering core's lifecycle from window events.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
