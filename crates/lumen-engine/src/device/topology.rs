use crate::geometry::Topology;

/// wgpu primitive used to draw a catalog topology.
pub fn primitive_topology(topology: Topology) -> wgpu::PrimitiveTopology {
    match topology {
        Topology::Points => wgpu::PrimitiveTopology::PointList,
        Topology::Lines => wgpu::PrimitiveTopology::LineList,
        Topology::LineStrip | Topology::LineLoop => wgpu::PrimitiveTopology::LineStrip,
        Topology::Triangles | Topology::TriangleFan => wgpu::PrimitiveTopology::TriangleList,
        Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

/// Strip pipelines need an index format once any indexed draw uses them.
pub fn strip_index_format(topology: Topology) -> Option<wgpu::IndexFormat> {
    match primitive_topology(topology) {
        wgpu::PrimitiveTopology::LineStrip | wgpu::PrimitiveTopology::TriangleStrip => {
            Some(wgpu::IndexFormat::Uint32)
        }
        _ => None,
    }
}

/// Index list emulating topologies wgpu lacks.
///
/// - line loop: strip through every vertex and back to the first
/// - triangle fan: `[0, i, i + 1]` for each outer edge
///
/// `None` means the topology draws its vertices directly.
pub fn expand_indices(topology: Topology, vertex_count: u32) -> Option<Vec<u32>> {
    match topology {
        Topology::LineLoop if vertex_count >= 2 => {
            Some((0..vertex_count).chain(std::iter::once(0)).collect())
        }
        Topology::TriangleFan if vertex_count >= 3 => Some(
            (1..vertex_count - 1)
                .flat_map(|i| [0, i, i + 1])
                .collect(),
        ),
        Topology::LineLoop | Topology::TriangleFan => Some(Vec::new()),
        _ => None,
    }
}
