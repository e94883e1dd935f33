//! Color representation shared by batch items and vertex records.

pub mod color;

pub use color::Color;
