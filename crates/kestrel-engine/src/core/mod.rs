//! Contracts between the window runtime and applications.
//!
//! [`Engine`] owns the rendering core; the runtime drives its lifecycle and
//! hands it to the [`App`] once per frame through [`FrameCtx`].

mod app;
mod ctx;
mod engine;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
pub use engine::Engine;
