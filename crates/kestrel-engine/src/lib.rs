//! Kestrel engine crate.
//!
//! A batched 2D rendering core (vertex layouts, GPU buffers, a notification
//! bus, per-kind batching and renderers) plus the winit/wgpu runtime that
//! drives it.

pub mod backend;
pub mod batch;
pub mod buffer;
pub mod bus;
pub mod config;
pub mod coords;
pub mod core;
pub mod device;
pub mod items;
pub mod layout;
pub mod logging;
pub mod paint;
pub mod render;
pub mod window;

mod error;

pub use error::{Error, Result};
