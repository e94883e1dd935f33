//! Window surface and wgpu device bring-up.
//!
//! [`Gpu`] owns the instance, adapter and surface of one window. The logical
//! device and queue it creates are shared with [`crate::backend::WgpuDevice`],
//! which issues the batched draws.

mod context;
mod error;
mod frame;
mod init;
mod surface;

pub use context::Gpu;
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use init::GpuInit;
