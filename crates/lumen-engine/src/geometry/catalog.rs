use std::fmt;
use std::str::FromStr;

use super::{Topology, VertexLayout};

/// Named shapes the catalog can build.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum GeometryKind {
    Triangles,
    TriangleStrip,
    TriangleFan,
    Lines,
    LineStrip,
    LineLoop,
    Points,
    Cube,
}

impl GeometryKind {
    pub const ALL: [GeometryKind; 8] = [
        GeometryKind::Triangles,
        GeometryKind::TriangleStrip,
        GeometryKind::TriangleFan,
        GeometryKind::Lines,
        GeometryKind::LineStrip,
        GeometryKind::LineLoop,
        GeometryKind::Points,
        GeometryKind::Cube,
    ];

    /// Command key used by shape-selection input.
    pub const fn name(self) -> &'static str {
        match self {
            GeometryKind::Triangles => "triangles",
            GeometryKind::TriangleStrip => "triangle_strip",
            GeometryKind::TriangleFan => "triangle_fan",
            GeometryKind::Lines => "lines",
            GeometryKind::LineStrip => "line_strip",
            GeometryKind::LineLoop => "line_loop",
            GeometryKind::Points => "points",
            GeometryKind::Cube => "cube",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a shape key is not in the catalog.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[error("unknown shape '{0}'")]
pub struct UnknownShape(pub String);

impl FromStr for GeometryKind {
    type Err = UnknownShape;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GeometryKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| UnknownShape(s.to_owned()))
    }
}

/// CPU-side vertex data for one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub kind: GeometryKind,
    pub vertices: Vec<f32>,
    pub layout: VertexLayout,
    pub topology: Topology,
    pub vertex_count: u32,
}

impl Geometry {
    /// Builds the vertex data for `kind`.
    pub fn build(kind: GeometryKind) -> Self {
        match kind {
            GeometryKind::Triangles => flat(kind, Topology::Triangles, &[TL, BL, BR, TL, BR, TR]),
            GeometryKind::TriangleStrip => flat(kind, Topology::TriangleStrip, &[BL, TL, BR, TR]),
            GeometryKind::TriangleFan => triangle_fan(),
            GeometryKind::Lines => {
                flat(kind, Topology::Lines, &[BL, TL, TL, TR, TR, BR, BR, BL])
            }
            GeometryKind::LineStrip => flat(kind, Topology::LineStrip, &[BL, TL, TR, BR, BL]),
            GeometryKind::LineLoop => flat(kind, Topology::LineLoop, &[BL, TL, TR, BR]),
            GeometryKind::Points => flat(kind, Topology::Points, &[BL, TL, TR, BR]),
            GeometryKind::Cube => cube(),
        }
    }
}

// Quad corners in the z = 0 plane.
const TL: [f32; 3] = [-0.5, 0.5, 0.0];
const TR: [f32; 3] = [0.5, 0.5, 0.0];
const BL: [f32; 3] = [-0.5, -0.5, 0.0];
const BR: [f32; 3] = [0.5, -0.5, 0.0];

/// Last sampled angle of the fan, in whole degrees.
const FAN_LAST_DEGREE: u32 = 280;

fn flat(kind: GeometryKind, topology: Topology, corners: &[[f32; 3]]) -> Geometry {
    Geometry {
        kind,
        vertices: corners.iter().flatten().copied().collect(),
        layout: VertexLayout::Position,
        topology,
        vertex_count: corners.len() as u32,
    }
}

fn triangle_fan() -> Geometry {
    let mut vertices = vec![0.0, 0.0, 0.0];
    for degree in 0..=FAN_LAST_DEGREE {
        let angle = (degree as f32).to_radians();
        vertices.extend_from_slice(&[angle.cos(), angle.sin(), 0.0]);
    }

    Geometry {
        kind: GeometryKind::TriangleFan,
        vertex_count: (vertices.len() / 3) as u32,
        vertices,
        layout: VertexLayout::Position,
        topology: Topology::TriangleFan,
    }
}

/// Unit cube centred on the origin; outward normals, counter-clockwise faces.
fn cube() -> Geometry {
    // (normal, u axis, v axis) with u × v = normal.
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ];
    // (u sign, v sign, tex u, tex v); texture v grows downwards.
    const CORNERS: [(f32, f32, f32, f32); 4] = [
        (-1.0, -1.0, 0.0, 1.0),
        (1.0, -1.0, 1.0, 1.0),
        (1.0, 1.0, 1.0, 0.0),
        (-1.0, 1.0, 0.0, 0.0),
    ];
    const TRIANGLES: [usize; 6] = [0, 1, 2, 0, 2, 3];

    let layout = VertexLayout::PositionNormalUv;
    let mut vertices = Vec::with_capacity(36 * layout.stride());

    for (n, u, v) in FACES {
        for corner in TRIANGLES {
            let (su, sv, tu, tv) = CORNERS[corner];
            for axis in 0..3 {
                vertices.push(0.5 * (n[axis] + su * u[axis] + sv * v[axis]));
            }
            vertices.extend_from_slice(&n);
            vertices.extend_from_slice(&[tu, tv]);
        }
    }

    Geometry {
        kind: GeometryKind::Cube,
        vertex_count: (vertices.len() / layout.stride()) as u32,
        vertices,
        layout,
        topology: Topology::Triangles,
    }
}
