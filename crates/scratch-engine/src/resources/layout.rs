use crate::gfx::{GpuError, GpuResult};

/// Scalar type of one vertex attribute component.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ElementType {
    F32,
    U32,
    U8,
}

impl ElementType {
    /// Size of one component in bytes.
    pub const fn size(self) -> u32 {
        match self {
            Self::F32 | Self::U32 => 4,
            Self::U8 => 1,
        }
    }
}

/// Rust types that can be pushed onto a [`VertexBufferLayout`].
pub trait VertexElement {
    const TYPE: ElementType;
    const NORMALIZED: bool;
}

impl VertexElement for f32 {
    const TYPE: ElementType = ElementType::F32;
    const NORMALIZED: bool = false;
}

impl VertexElement for u32 {
    const TYPE: ElementType = ElementType::U32;
    const NORMALIZED: bool = false;
}

impl VertexElement for u8 {
    const TYPE: ElementType = ElementType::U8;
    const NORMALIZED: bool = true;
}

/// One attribute in an interleaved vertex.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexBufferElement {
    pub ty: ElementType,
    pub count: u32,
    pub normalized: bool,
}

impl VertexBufferElement {
    pub const fn size(&self) -> u32 {
        self.ty.size() * self.count
    }

    /// Maps the element onto a `wgpu` vertex format.
    pub fn vertex_format(&self) -> GpuResult<wgpu::VertexFormat> {
        use wgpu::VertexFormat as F;

        let format = match (self.ty, self.count, self.normalized) {
            (ElementType::F32, 1, _) => F::Float32,
            (ElementType::F32, 2, _) => F::Float32x2,
            (ElementType::F32, 3, _) => F::Float32x3,
            (ElementType::F32, 4, _) => F::Float32x4,
            (ElementType::U32, 1, false) => F::Uint32,
            (ElementType::U32, 2, false) => F::Uint32x2,
            (ElementType::U32, 3, false) => F::Uint32x3,
            (ElementType::U32, 4, false) => F::Uint32x4,
            (ElementType::U8, 2, true) => F::Unorm8x2,
            (ElementType::U8, 4, true) => F::Unorm8x4,
            (ElementType::U8, 2, false) => F::Uint8x2,
            (ElementType::U8, 4, false) => F::Uint8x4,
            (ty, count, normalized) => {
                return Err(GpuError::UnsupportedVertexFormat { ty, count, normalized });
            }
        };
        Ok(format)
    }
}

/// Ordered attribute list describing one interleaved vertex buffer.
///
/// Attribute `i` feeds shader location `i`; offsets and the stride follow
/// from push order.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct VertexBufferLayout {
    elements: Vec<VertexBufferElement>,
    stride: u32,
}

impl VertexBufferLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `count` components of `T`.
    pub fn push<T: VertexElement>(&mut self, count: u32) -> &mut Self {
        let element = VertexBufferElement {
            ty: T::TYPE,
            count,
            normalized: T::NORMALIZED,
        };
        self.stride += element.size();
        self.elements.push(element);
        self
    }

    pub fn elements(&self) -> &[VertexBufferElement] {
        &self.elements
    }

    /// Bytes per vertex.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Yields `(shader_location, byte_offset, element)` for every attribute.
    pub fn attributes(&self) -> impl Iterator<Item = (u32, u32, &VertexBufferElement)> {
        self.elements.iter().enumerate().scan(0u32, |offset, (i, e)| {
            let at = *offset;
            *offset += e.size();
            Some((i as u32, at, e))
        })
    }

    /// Checks that every attribute has a GPU vertex format.
    pub fn validate(&self) -> GpuResult<()> {
        self.elements.iter().try_for_each(|e| e.vertex_format().map(|_| ()))
    }

    /// Builds the `wgpu` attribute list for this layout.
    pub fn to_wgpu_attributes(&self) -> GpuResult<Vec<wgpu::VertexAttribute>> {
        self.attributes()
            .map(|(location, offset, e)| {
                Ok(wgpu::VertexAttribute {
                    format: e.vertex_format()?,
                    offset: offset as u64,
                    shader_location: location,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_texcoord_stride_is_four_floats() {
        let mut layout = VertexBufferLayout::new();
        layout.push::<f32>(2).push::<f32>(2);
        assert_eq!(layout.stride(), 4 * std::mem::size_of::<f32>() as u32);
        assert_eq!(layout.elements().len(), 2);
    }

    #[test]
    fn offsets_accumulate_in_push_order() {
        let mut layout = VertexBufferLayout::new();
        layout.push::<f32>(3).push::<u8>(4).push::<f32>(2);

        let attrs: Vec<_> = layout.attributes().map(|(loc, off, _)| (loc, off)).collect();
        assert_eq!(attrs, vec![(0, 0), (1, 12), (2, 16)]);
        assert_eq!(layout.stride(), 24);
    }

    #[test]
    fn wgpu_attributes_match_elements() {
        let mut layout = VertexBufferLayout::new();
        layout.push::<f32>(2).push::<f32>(2);

        let attrs = layout.to_wgpu_attributes().unwrap();
        assert_eq!(attrs[0].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(attrs[1].offset, 8);
        assert_eq!(attrs[1].shader_location, 1);
    }

    #[test]
    fn three_normalized_bytes_have_no_format() {
        let mut layout = VertexBufferLayout::new();
        layout.push::<u8>(3);
        assert!(matches!(
            layout.validate(),
            Err(GpuError::UnsupportedVertexFormat { count: 3, .. })
        ));
    }
}
