use super::{AttribType, FieldType, LayoutError, VertexField, VertexType};

/// Sum of each field's byte size, in declaration order.
pub fn stride(fields: &[VertexField]) -> u32 {
    fields.iter().map(|f| f.ty.byte_size()).sum()
}

/// Cumulative byte size of every field preceding `name`.
pub fn field_offset(vertex: &'static str, fields: &[VertexField], name: &str) -> Result<u32, LayoutError> {
    let mut offset = 0u32;
    for field in fields {
        if field.name == name {
            return Ok(offset);
        }
        offset += field.ty.byte_size();
    }

    Err(LayoutError::FieldNotFound {
        vertex,
        field: name.to_string(),
    })
}

/// Number of scalar components in one field of type `ty`.
#[inline]
pub fn element_count(ty: FieldType) -> u32 {
    ty.element_count()
}

/// Resolved attribute description for one field.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FieldLayout {
    pub name: &'static str,
    pub ty: FieldType,
    pub size: u32,
    pub element_count: u32,
    pub pointer_type: Option<AttribType>,
    pub offset: u32,
}

/// Byte layout of a vertex record, resolved from its [`VertexType::FIELDS`].
///
/// Invariant: offsets are non-decreasing in declaration order and the last
/// field's `offset + size` equals [`stride`](Self::stride).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VertexLayout {
    vertex: &'static str,
    fields: Vec<FieldLayout>,
    stride: u32,
}

impl VertexLayout {
    /// Resolves the layout of `V`.
    pub fn of<V: VertexType>() -> Self {
        Self::from_fields(V::NAME, V::FIELDS)
    }

    pub fn from_fields(vertex: &'static str, fields: &[VertexField]) -> Self {
        let mut offset = 0u32;
        let resolved = fields
            .iter()
            .map(|f| {
                let layout = FieldLayout {
                    name: f.name,
                    ty: f.ty,
                    size: f.ty.byte_size(),
                    element_count: f.ty.element_count(),
                    pointer_type: f.ty.pointer_type(),
                    offset,
                };
                offset += layout.size;
                layout
            })
            .collect();

        Self {
            vertex,
            fields: resolved,
            stride: offset,
        }
    }

    /// Checks the descriptor of `V` against its actual in-memory size.
    ///
    /// A mismatch means `FIELDS` drifted from the struct (or the struct gained padding).
    pub fn validate<V: VertexType>() -> Result<Self, LayoutError> {
        let layout = Self::of::<V>();
        let actual = std::mem::size_of::<V>() as u32;
        if layout.stride != actual {
            return Err(LayoutError::StrideMismatch {
                vertex: V::NAME,
                declared: layout.stride,
                actual,
            });
        }
        Ok(layout)
    }

    #[inline]
    pub fn vertex_name(&self) -> &'static str {
        self.vertex
    }

    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    #[inline]
    pub fn fields(&self) -> &[FieldLayout] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Result<&FieldLayout, LayoutError> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| LayoutError::FieldNotFound {
                vertex: self.vertex,
                field: name.to_string(),
            })
    }

    pub fn offset_of(&self, name: &str) -> Result<u32, LayoutError> {
        self.field(name).map(|f| f.offset)
    }

    /// Attribute component type of `field`, failing for fields that cannot be
    /// bound as a single attribute.
    pub fn pointer_type(&self, field: &FieldLayout) -> Result<AttribType, LayoutError> {
        field.pointer_type.ok_or_else(|| LayoutError::UnsupportedFieldType {
            vertex: self.vertex,
            field: field.name.to_string(),
            ty: field.ty.to_string(),
        })
    }

    /// Number of `f32`s per vertex, if every field is float-backed.
    pub fn floats_per_vertex(&self) -> Option<u32> {
        let all_float = self.fields.iter().all(|f| f.pointer_type == Some(AttribType::Float));
        all_float.then_some(self.stride / 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[VertexField] = &[
        VertexField::new("position", FieldType::Vec3),
        VertexField::new("uv", FieldType::Vec2),
        VertexField::new("color", FieldType::Vec4),
        VertexField::new("weight", FieldType::F32),
    ];

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct Sample {
        position: [f32; 3],
        uv: [f32; 2],
        color: [f32; 4],
        weight: f32,
    }

    impl VertexType for Sample {
        const NAME: &'static str = "Sample";
        const FIELDS: &'static [VertexField] = SAMPLE;
    }

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct Drifted {
        position: [f32; 2],
        extra: f32,
    }

    impl VertexType for Drifted {
        const NAME: &'static str = "Drifted";
        const FIELDS: &'static [VertexField] = &[VertexField::new("position", FieldType::Vec2)];
    }

    // ── stride / offsets ─────────────────────────────────────────────────

    #[test]
    fn stride_is_sum_of_field_sizes() {
        assert_eq!(stride(SAMPLE), 12 + 8 + 16 + 4);
    }

    #[test]
    fn offsets_accumulate_in_declaration_order() {
        assert_eq!(field_offset("Sample", SAMPLE, "position").unwrap(), 0);
        assert_eq!(field_offset("Sample", SAMPLE, "uv").unwrap(), 12);
        assert_eq!(field_offset("Sample", SAMPLE, "color").unwrap(), 20);
        assert_eq!(field_offset("Sample", SAMPLE, "weight").unwrap(), 36);
    }

    #[test]
    fn missing_field_is_reported() {
        let err = field_offset("Sample", SAMPLE, "normal").unwrap_err();
        assert_eq!(err.to_string(), "vertex type 'Sample' has no field named 'normal'");
    }

    #[test]
    fn last_offset_plus_size_equals_stride_for_every_sequence() {
        let whitelist = [
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
        const NAMES: [&str; 3] = ["a", "b", "c"];

        for &a in &whitelist {
            for &b in &whitelist {
                for &c in &whitelist {
                    let fields = [
                        VertexField::new(NAMES[0], a),
                        VertexField::new(NAMES[1], b),
                        VertexField::new(NAMES[2], c),
                    ];
                    let layout = VertexLayout::from_fields("Seq", &fields);
                    let expected = a.byte_size() + b.byte_size() + c.byte_size();

                    assert_eq!(stride(&fields), expected);
                    assert_eq!(layout.stride(), expected);

                    let last = layout.fields().last().unwrap();
                    assert_eq!(last.offset + last.size, layout.stride());
                    assert!(layout.fields().windows(2).all(|w| w[0].offset <= w[1].offset));
                }
            }
        }
    }

    // ── resolved layout ──────────────────────────────────────────────────

    #[test]
    fn resolved_layout_matches_free_functions() {
        let layout = VertexLayout::of::<Sample>();
        for f in SAMPLE {
            assert_eq!(layout.offset_of(f.name).unwrap(), field_offset("Sample", SAMPLE, f.name).unwrap());
            assert_eq!(layout.field(f.name).unwrap().element_count, element_count(f.ty));
        }
        assert_eq!(layout.floats_per_vertex(), Some(10));
    }

    #[test]
    fn validate_accepts_matching_descriptor() {
        assert_eq!(VertexLayout::validate::<Sample>().unwrap().stride(), 40);
    }

    #[test]
    fn validate_rejects_drifted_descriptor() {
        let err = VertexLayout::validate::<Drifted>().unwrap_err();
        assert!(matches!(err, LayoutError::StrideMismatch { declared: 8, actual: 12, .. }));
    }

    #[test]
    fn pointer_type_fails_for_non_float_fields() {
        let fields = [VertexField::new("id", FieldType::U32)];
        let layout = VertexLayout::from_fields("Ids", &fields);
        let err = layout.pointer_type(&layout.fields()[0]).unwrap_err();
        assert!(matches!(err, LayoutError::UnsupportedFieldType { .. }));
        assert_eq!(layout.floats_per_vertex(), None);
    }
}
