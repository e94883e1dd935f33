use core::fmt;

use crate::layout::AttribType;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub struct $name(u32);

        impl $name {
            /// The "no object" handle.
            pub const NULL: $name = $name(0);

            #[inline]
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub const fn is_null(self) -> bool {
                self.0 == 0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

handle!(
    /// Vertex array object: attribute layout plus attached buffers.
    VertexArrayId,
    "vao"
);
handle!(BufferId, "buf");
handle!(ProgramId, "prog");
handle!(TextureId, "tex");

/// Binding slot of a buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferTarget {
    Vertex,
    Index,
}

/// One vertex attribute declaration.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AttribPointer {
    /// Shader location, equal to the field's index in its vertex record.
    pub location: u32,
    pub components: u32,
    pub ty: AttribType,
    pub stride: u32,
    pub offset: u32,
}
