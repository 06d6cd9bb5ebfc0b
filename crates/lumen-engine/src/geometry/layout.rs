/// Primitive assembly mode for a vertex buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Topology {
    Points,
    Lines,
    LineStrip,
    LineLoop,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// Interleaved `f32` vertex layout.
///
/// Offsets are fixed per attribute so a shader can rely on locations alone:
///
///  location 0  position  [f32; 3]  offset 0
///  location 1  normal    [f32; 3]  offset 3
///  location 2  uv        [f32; 2]  offset 6
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VertexLayout {
    Position,
    PositionNormalUv,
}

/// One attribute inside an interleaved vertex.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttribute {
    pub location: u32,
    /// Offset from the start of the vertex, in floats.
    pub offset: usize,
    pub components: usize,
}

const POSITION: VertexAttribute = VertexAttribute { location: 0, offset: 0, components: 3 };
const NORMAL: VertexAttribute = VertexAttribute { location: 1, offset: 3, components: 3 };
const UV: VertexAttribute = VertexAttribute { location: 2, offset: 6, components: 2 };

impl VertexLayout {
    /// Floats per vertex.
    #[inline]
    pub const fn stride(self) -> usize {
        match self {
            VertexLayout::Position => 3,
            VertexLayout::PositionNormalUv => 8,
        }
    }

    /// Bytes per vertex.
    #[inline]
    pub const fn stride_bytes(self) -> u64 {
        (self.stride() * std::mem::size_of::<f32>()) as u64
    }

    pub fn attributes(self) -> &'static [VertexAttribute] {
        match self {
            VertexLayout::Position => &[POSITION],
            VertexLayout::PositionNormalUv => &[POSITION, NORMAL, UV],
        }
    }

    /// Returns `true` if every location in `required` is supplied by this layout.
    pub fn provides(self, required: &[u32]) -> bool {
        required
            .iter()
            .all(|loc| self.attributes().iter().any(|a| a.location == *loc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_match_attribute_span() {
        for layout in [VertexLayout::Position, VertexLayout::PositionNormalUv] {
            let last = layout.attributes().last().copied().unwrap();
            assert_eq!(last.offset + last.components, layout.stride());
        }
    }

    #[test]
    fn stride_bytes() {
        assert_eq!(VertexLayout::Position.stride_bytes(), 12);
        assert_eq!(VertexLayout::PositionNormalUv.stride_bytes(), 32);
    }

    #[test]
    fn provides_checks_locations() {
        assert!(VertexLayout::PositionNormalUv.provides(&[0, 1, 2]));
        assert!(VertexLayout::Position.provides(&[0]));
        assert!(!VertexLayout::Position.provides(&[0, 1]));
        assert!(!VertexLayout::Position.provides(&[2]));
        assert!(VertexLayout::Position.provides(&[]));
    }
}
