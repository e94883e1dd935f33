//! Coordinate and geometry types shared by batch items and buffers.
//!
//! Canonical CPU space:
//! - Surface pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! GPU buffers convert to clip space at upload time using the last known
//! [`Viewport`].

mod corner_radii;
mod rect;
mod vec2;
mod viewport;

pub use corner_radii::CornerRadii;
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
