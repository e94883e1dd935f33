use core::fmt;
use core::str::FromStr;

use super::LayoutError;

/// Closed set of field types a vertex record may contain.
///
/// Ordered from least to greatest byte size. Anything outside this list is
/// rejected when a layout is described by name (see [`FieldType::from_str`]).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FieldType {
    U8,
    I8,
    I16,
    U16,
    I32,
    U32,
    F32,
    I64,
    U64,
    F64,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

/// Component type used when binding an attribute pointer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AttribType {
    Float,
}

impl FieldType {
    /// Size of one field of this type, in bytes.
    #[inline]
    pub const fn byte_size(self) -> u32 {
        match self {
            FieldType::U8 | FieldType::I8 => 1,
            FieldType::I16 | FieldType::U16 => 2,
            FieldType::I32 | FieldType::U32 | FieldType::F32 => 4,
            FieldType::I64 | FieldType::U64 | FieldType::F64 => 8,
            FieldType::Vec2 => 4 * 2,
            FieldType::Vec3 => 4 * 3,
            FieldType::Vec4 => 4 * 4,
            FieldType::Mat4 => 4 * 16,
        }
    }

    /// Number of scalar components (a `Vec3` yields 3).
    #[inline]
    pub const fn element_count(self) -> u32 {
        match self {
            FieldType::Vec2 => 2,
            FieldType::Vec3 => 3,
            FieldType::Vec4 => 4,
            FieldType::Mat4 => 16,
            _ => 1,
        }
    }

    /// Attribute component type, if this field can be bound as a single attribute.
    ///
    /// Only float-backed fields have a pointer type; integer, double and matrix
    /// fields cannot be fed to the vertex stage as one attribute.
    #[inline]
    pub const fn pointer_type(self) -> Option<AttribType> {
        match self {
            FieldType::F32 | FieldType::Vec2 | FieldType::Vec3 | FieldType::Vec4 => {
                Some(AttribType::Float)
            }
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            FieldType::U8 => "u8",
            FieldType::I8 => "i8",
            FieldType::I16 => "i16",
            FieldType::U16 => "u16",
            FieldType::I32 => "i32",
            FieldType::U32 => "u32",
            FieldType::F32 => "f32",
            FieldType::I64 => "i64",
            FieldType::U64 => "u64",
            FieldType::F64 => "f64",
            FieldType::Vec2 => "vec2",
            FieldType::Vec3 => "vec3",
            FieldType::Vec4 => "vec4",
            FieldType::Mat4 => "mat4",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldType {
    type Err = LayoutError;

    /// Parses Rust, WGSL and GLSL-ish spellings (`f32`/`float`, `vec3`/`vec3<f32>`/`Vector3`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.trim() {
            "u8" | "byte" => FieldType::U8,
            "i8" | "sbyte" => FieldType::I8,
            "i16" | "short" => FieldType::I16,
            "u16" | "ushort" => FieldType::U16,
            "i32" | "int" => FieldType::I32,
            "u32" | "uint" => FieldType::U32,
            "f32" | "float" => FieldType::F32,
            "i64" | "long" => FieldType::I64,
            "u64" | "ulong" => FieldType::U64,
            "f64" | "double" => FieldType::F64,
            "vec2" | "vec2<f32>" | "vec2f" | "Vector2" => FieldType::Vec2,
            "vec3" | "vec3<f32>" | "vec3f" | "Vector3" => FieldType::Vec3,
            "vec4" | "vec4<f32>" | "vec4f" | "Vector4" => FieldType::Vec4,
            "mat4" | "mat4x4<f32>" | "mat4x4f" | "Matrix4x4" => FieldType::Mat4,
            other => {
                return Err(LayoutError::UnsupportedFieldType {
                    vertex: "<described>",
                    field: String::new(),
                    ty: other.to_string(),
                });
            }
        };
        Ok(ty)
    }
}

/// One declared field of a vertex record.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexField {
    pub name: &'static str,
    pub ty: FieldType,
}

impl VertexField {
    #[inline]
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty }
    }
}

/// Compile-time layout descriptor for a `#[repr(C)]` vertex record.
///
/// `FIELDS` must list the struct's fields in declaration order; the layout
/// analyzer derives stride and offsets from it.
pub trait VertexType: bytemuck::Pod {
    /// Type name used in error messages.
    const NAME: &'static str;

    const FIELDS: &'static [VertexField];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_ordered_least_to_greatest() {
        let all = [
            FieldType::U8,
            FieldType::I8,
            FieldType::I16,
            FieldType::U16,
            FieldType::I32,
            FieldType::U32,
            FieldType::F32,
            FieldType::I64,
            FieldType::U64,
            FieldType::F64,
            FieldType::Vec2,
            FieldType::Vec3,
            FieldType::Vec4,
            FieldType::Mat4,
        ];
        for pair in all.windows(2) {
            assert!(pair[0].byte_size() <= pair[1].byte_size(), "{} > {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn element_counts() {
        assert_eq!(FieldType::F32.element_count(), 1);
        assert_eq!(FieldType::U16.element_count(), 1);
        assert_eq!(FieldType::Vec2.element_count(), 2);
        assert_eq!(FieldType::Vec3.element_count(), 3);
        assert_eq!(FieldType::Vec4.element_count(), 4);
        assert_eq!(FieldType::Mat4.element_count(), 16);
    }

    #[test]
    fn only_float_types_have_pointer_type() {
        assert_eq!(FieldType::Vec4.pointer_type(), Some(AttribType::Float));
        assert_eq!(FieldType::F32.pointer_type(), Some(AttribType::Float));
        assert_eq!(FieldType::F64.pointer_type(), None);
        assert_eq!(FieldType::U32.pointer_type(), None);
        assert_eq!(FieldType::Mat4.pointer_type(), None);
    }

    #[test]
    fn parses_known_spellings() {
        assert_eq!("float".parse::<FieldType>().unwrap(), FieldType::F32);
        assert_eq!("vec3<f32>".parse::<FieldType>().unwrap(), FieldType::Vec3);
        assert_eq!("Vector2".parse::<FieldType>().unwrap(), FieldType::Vec2);
        assert_eq!(" Matrix4x4 ".parse::<FieldType>().unwrap(), FieldType::Mat4);
    }

    #[test]
    fn rejects_types_outside_whitelist() {
        let err = "Quaternion".parse::<FieldType>().unwrap_err();
        assert!(matches!(err, LayoutError::UnsupportedFieldType { ref ty, .. } if ty == "Quaternion"));
    }
}
