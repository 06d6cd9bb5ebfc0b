use crate::device::{BufferId, GraphicsDevice, ProgramId, TextureId};
use crate::error::RenderError;
use crate::geometry::{Geometry, Topology, VertexLayout};
use crate::observe::StatusSink;
use crate::shader::{link_program, CompileDiagnostic};
use crate::texture::DecodedImage;

/// A linked program living on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProgram {
    pub id: ProgramId,
    pub label: String,
    /// Vertex input locations the program reads.
    pub vertex_inputs: Vec<u32>,
}

impl ShaderProgram {
    /// `true` if a buffer with `layout` feeds every input this program reads.
    pub fn accepts(&self, layout: VertexLayout) -> bool {
        layout.provides(&self.vertex_inputs)
    }
}

/// Interleaved vertex data living on the device.
///
/// Not `Clone`: a buffer is released by value, once.
#[derive(Debug, PartialEq, Eq)]
pub struct VertexBuffer {
    id: BufferId,
    layout: VertexLayout,
    topology: Topology,
    vertex_count: u32,
}

impl VertexBuffer {
    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn layout(&self) -> VertexLayout {
        self.layout
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

/// A device texture and whether it has received its pixels.
///
/// `ready` only ever goes from `false` to `true`.
#[derive(Debug, PartialEq, Eq)]
pub struct Texture {
    id: TextureId,
    ready: bool,
}

impl Texture {
    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Creates and updates device resources on behalf of the renderer.
pub struct ResourceManager<'a, D: GraphicsDevice + ?Sized> {
    device: &'a mut D,
}

impl<'a, D: GraphicsDevice + ?Sized> ResourceManager<'a, D> {
    pub fn new(device: &'a mut D) -> Self {
        Self { device }
    }

    /// Compiles, links and creates a program.
    ///
    /// On failure, whether in the link checks or on the device, the message
    /// goes to `sink` as a diagnostic and to the error log.
    pub fn compile_program(
        &mut self,
        label: &str,
        vertex_source: &str,
        fragment_source: &str,
        sink: &mut dyn StatusSink,
    ) -> Result<ShaderProgram, CompileDiagnostic> {
        let created = link_program(label, vertex_source, fragment_source).and_then(|linked| {
            match self.device.create_program(&linked) {
                Ok(id) => Ok(ShaderProgram {
                    id,
                    label: linked.label,
                    vertex_inputs: linked.vertex_inputs,
                }),
                Err(error) => Err(CompileDiagnostic {
                    label: linked.label,
                    error,
                }),
            }
        });

        match &created {
            Ok(program) => log::debug!("program '{label}' linked as {:?}", program.id),
            Err(diagnostic) => {
                log::error!("{diagnostic}");
                sink.publish_diagnostic(&diagnostic.to_string());
            }
        }
        created
    }

    /// Uploads `vertices` once.
    ///
    /// Rejects data whose length is not a whole number of vertices.
    pub fn upload_buffer(
        &mut self,
        vertices: &[f32],
        layout: VertexLayout,
        topology: Topology,
    ) -> Result<VertexBuffer, RenderError> {
        let stride = layout.stride();
        if vertices.len() % stride != 0 {
            return Err(RenderError::Geometry(format!(
                "{} floats is not a multiple of the {layout:?} stride ({stride})",
                vertices.len()
            )));
        }
        let vertex_count = u32::try_from(vertices.len() / stride)
            .map_err(|_| RenderError::Geometry("too many vertices".to_owned()))?;

        let id = self.device.create_vertex_buffer(vertices, layout, topology);
        Ok(VertexBuffer {
            id,
            layout,
            topology,
            vertex_count,
        })
    }

    pub fn upload_geometry(&mut self, geometry: &Geometry) -> Result<VertexBuffer, RenderError> {
        self.upload_buffer(&geometry.vertices, geometry.layout, geometry.topology)
    }

    /// Frees the device memory behind `buffer`.
    pub fn release_buffer(&mut self, buffer: VertexBuffer) {
        self.device.destroy_vertex_buffer(buffer.id);
    }

    /// Creates an empty texture with `ready == false`.
    pub fn create_texture(&mut self) -> Texture {
        Texture {
            id: self.device.create_texture(),
            ready: false,
        }
    }

    /// Uploads decoded pixels and marks the texture ready.
    ///
    /// A ready texture is never written again. If the device refuses the
    /// image the texture stays not ready and the error is returned.
    pub fn complete_texture_upload(
        &mut self,
        texture: &mut Texture,
        image: &DecodedImage,
    ) -> Result<(), RenderError> {
        if texture.ready {
            log::warn!("texture {:?} is already ready; ignoring upload", texture.id);
            return Ok(());
        }
        self.device.write_texture(texture.id, image)?;
        texture.ready = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessDevice;
    use crate::geometry::GeometryKind;
    use crate::observe::MemorySink;
    use crate::shader::FLAT;

    #[test]
    fn compile_program_creates_device_program() {
        let mut device = HeadlessDevice::new(64, 64);
        let mut sink = MemorySink::new();
        let program = ResourceManager::new(&mut device)
            .compile_program(FLAT.label, FLAT.vertex, FLAT.fragment, &mut sink)
            .unwrap();

        assert_eq!(device.program_label(program.id), Some("flat"));
        assert!(program.accepts(VertexLayout::Position));
        assert!(sink.diagnostics.is_empty());
    }

    #[test]
    fn compile_failure_publishes_diagnostic_and_creates_nothing() {
        let mut device = HeadlessDevice::new(64, 64);
        let mut sink = MemorySink::new();
        let diag = ResourceManager::new(&mut device)
            .compile_program("bad", "not wgsl at all", FLAT.fragment, &mut sink)
            .unwrap_err();

        assert_eq!(device.program_count(), 0);
        assert_eq!(sink.diagnostics, vec![diag.to_string()]);
    }

    #[test]
    fn upload_counts_vertices_by_stride() {
        let mut device = HeadlessDevice::new(64, 64);
        let cube = Geometry::build(GeometryKind::Cube);
        let buffer = ResourceManager::new(&mut device).upload_geometry(&cube).unwrap();

        assert_eq!(buffer.vertex_count(), 36);
        assert_eq!(buffer.layout(), VertexLayout::PositionNormalUv);
        assert_eq!(device.buffer(buffer.id()).unwrap().vertices.len(), 36 * 8);
    }

    #[test]
    fn ragged_vertex_data_is_rejected() {
        let mut device = HeadlessDevice::new(64, 64);
        let err = ResourceManager::new(&mut device)
            .upload_buffer(&[0.0; 7], VertexLayout::Position, Topology::Points)
            .unwrap_err();

        assert!(matches!(err, RenderError::Geometry(_)));
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn release_frees_device_buffer() {
        let mut device = HeadlessDevice::new(64, 64);
        let mut resources = ResourceManager::new(&mut device);
        let buffer = resources
            .upload_buffer(&[0.0; 9], VertexLayout::Position, Topology::Triangles)
            .unwrap();
        let id = buffer.id();
        resources.release_buffer(buffer);

        assert_eq!(device.live_buffers(), 0);
        assert_eq!(device.released_buffers(), &[id]);
    }

    #[test]
    fn texture_becomes_ready_exactly_once() {
        let mut device = HeadlessDevice::new(64, 64);
        let mut resources = ResourceManager::new(&mut device);
        let mut texture = resources.create_texture();
        assert!(!texture.is_ready());

        resources
            .complete_texture_upload(&mut texture, &DecodedImage::solid([1, 1, 1, 1]))
            .unwrap();
        assert!(texture.is_ready());
        resources
            .complete_texture_upload(&mut texture, &DecodedImage::solid([2, 2, 2, 2]))
            .unwrap();
        assert!(texture.is_ready());

        assert_eq!(device.texture_writes(), 1);
        assert_eq!(device.texture_image(texture.id()).unwrap().pixels, vec![1, 1, 1, 1]);
    }

    #[test]
    fn device_rejection_is_a_diagnostic() {
        let mut device = HeadlessDevice::new(64, 64);
        device.reject_program(FLAT.label);
        let mut sink = MemorySink::new();
        let diag = ResourceManager::new(&mut device)
            .compile_program(FLAT.label, FLAT.vertex, FLAT.fragment, &mut sink)
            .unwrap_err();

        assert_eq!(diag.label, "flat");
        assert!(matches!(diag.error, RenderError::ProgramLink { .. }));
        assert_eq!(device.program_count(), 0);
        assert_eq!(sink.diagnostics, vec![diag.to_string()]);
    }

    #[test]
    fn oversized_texture_stays_not_ready() {
        let mut device = HeadlessDevice::new(64, 64).with_max_texture_side(4);
        let mut resources = ResourceManager::new(&mut device);
        let mut texture = resources.create_texture();

        let image = DecodedImage::from_rgba8(8, 2, vec![0; 8 * 2 * 4]).unwrap();
        let err = resources.complete_texture_upload(&mut texture, &image).unwrap_err();

        assert!(matches!(err, RenderError::TextureTooLarge { width: 8, height: 2, max: 4 }));
        assert!(!texture.is_ready());
        assert_eq!(device.texture_writes(), 0);
    }
}
