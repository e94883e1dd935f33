//! Vertex layout analysis.
//!
//! Vertex records declare their fields once through [`VertexType::FIELDS`];
//! strides, byte offsets and attribute element counts are all derived from
//! that single descriptor so they cannot drift from the GPU-side bindings.

mod analyzer;
mod field;

pub use analyzer::{element_count, field_offset, stride, FieldLayout, VertexLayout};
pub use field::{AttribType, FieldType, VertexField, VertexType};

/// Vertex layout configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("the type '{ty}' of field '{field}' is not allowed in vertex type '{vertex}'")]
    UnsupportedFieldType {
        vertex: &'static str,
        field: String,
        ty: String,
    },

    #[error("vertex type '{vertex}' has no field named '{field}'")]
    FieldNotFound { vertex: &'static str, field: String },

    #[error("vertex type '{vertex}' declares {declared} bytes but is {actual} bytes in memory")]
    StrideMismatch {
        vertex: &'static str,
        declared: u32,
        actual: u32,
    },
}
