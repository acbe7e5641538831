//! GPU buffers for the scene's meshes and per-frame instance data.

use bytemuck::Pod;
use tracing::debug;
use wgpu::util::DeviceExt;

use snowfall_terrain::SnowTerrain;
use snowfall_vegetation::MeshData;

/// An indexed mesh resident on the GPU.
pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl MeshBuffer {
    /// Bind vertex and index buffers to slot 0 of a render pass.
    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    }

    /// Draw the mesh `instances` times.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, instances: u32) {
        render_pass.draw_indexed(0..self.index_count, 0, 0..instances);
    }
}

/// A growable instance (or dynamic vertex) buffer rewritten every frame.
///
/// The buffer is only reallocated when the data outgrows it; otherwise the
/// contents are replaced in place through the queue.
pub struct GpuBatch {
    label: String,
    usage: wgpu::BufferUsages,
    buffer: wgpu::Buffer,
    capacity: u64,
    len: u32,
}

impl GpuBatch {
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Number of elements written by the last update.
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Capacity in bytes.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Replace the contents with `data`, growing the buffer if needed.
    pub fn write<T: Pod>(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[T]) {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let needed = bytes.len() as u64;

        if needed > self.capacity {
            let capacity = needed.next_power_of_two().max(wgpu::COPY_BUFFER_ALIGNMENT);
            debug!(
                label = %self.label,
                old = self.capacity,
                new = capacity,
                "Growing GPU batch"
            );
            self.buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&self.label),
                size: capacity,
                usage: self.usage,
                mapped_at_creation: false,
            });
            self.capacity = capacity;
        }

        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
        self.len = data.len() as u32;
    }
}

/// Creates the scene's GPU buffers on one device.
pub struct BufferAllocator<'a> {
    device: &'a wgpu::Device,
}

impl<'a> BufferAllocator<'a> {
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self { device }
    }

    /// Upload a procedural or loaded mesh.
    pub fn create_mesh(&self, label: &str, mesh: &MeshData) -> MeshBuffer {
        self.create_indexed(label, bytemuck::cast_slice(&mesh.vertices), &mesh.indices)
    }

    /// Upload the terrain grid. The vertex buffer stays writable so the snow
    /// attribute can be refreshed with [`update_terrain`](Self::update_terrain).
    pub fn create_terrain(&self, terrain: &SnowTerrain) -> MeshBuffer {
        self.create_indexed(
            "terrain",
            bytemuck::cast_slice(terrain.vertices()),
            terrain.indices(),
        )
    }

    pub fn update_terrain(&self, queue: &wgpu::Queue, buffer: &MeshBuffer, terrain: &SnowTerrain) {
        queue.write_buffer(
            &buffer.vertex_buffer,
            0,
            bytemuck::cast_slice(terrain.vertices()),
        );
    }

    fn create_indexed(&self, label: &str, vertices: &[u8], indices: &[u32]) -> MeshBuffer {
        MeshBuffer {
            vertex_buffer: self.create_vertex_buffer(&format!("{label}-vertices"), vertices),
            index_buffer: self.create_index_buffer(&format!("{label}-indices"), indices),
            index_count: indices.len() as u32,
        }
    }

    pub fn create_vertex_buffer(&self, label: &str, data: &[u8]) -> wgpu::Buffer {
        self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: data,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        })
    }

    pub fn create_index_buffer(&self, label: &str, data: &[u32]) -> wgpu::Buffer {
        self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(data),
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        })
    }

    /// Instance batch initialised with `data` (which may be empty).
    pub fn create_batch<T: Pod>(&self, label: &str, data: &[T]) -> GpuBatch {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let capacity = (bytes.len() as u64).max(wgpu::COPY_BUFFER_ALIGNMENT);
        let usage = wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST;

        let buffer = if bytes.is_empty() {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: capacity,
                usage,
                mapped_at_creation: false,
            })
        } else {
            self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytes,
                usage,
            })
        };

        GpuBatch {
            label: label.to_owned(),
            usage,
            buffer,
            capacity,
            len: data.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snowfall_particles::ParticleInstance;
    use snowfall_terrain::TerrainSettings;
    use snowfall_vegetation::mesh;

    fn create_test_device() -> Option<(wgpu::Device, wgpu::Queue)> {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });

            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::default(),
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .ok()?;

            adapter
                .request_device(&wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                    experimental_features: Default::default(),
                    ..Default::default()
                })
                .await
                .ok()
        })
    }

    #[test]
    fn test_mesh_upload_keeps_index_count() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let allocator = BufferAllocator::new(&device);
        let tree = mesh::branching_tree();

        let buffer = allocator.create_mesh("tree", &tree);

        assert_eq!(buffer.index_count as usize, tree.indices.len());
    }

    #[test]
    fn test_terrain_upload() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let allocator = BufferAllocator::new(&device);
        let terrain = SnowTerrain::new(TerrainSettings {
            resolution: 8,
            ..Default::default()
        });

        let buffer = allocator.create_terrain(&terrain);
        allocator.update_terrain(&queue, &buffer, &terrain);

        assert_eq!(buffer.index_count, 7 * 7 * 6);
        assert_eq!(buffer.vertex_buffer.size(), 64 * 36);
    }

    #[test]
    fn test_empty_batch_is_allocatable() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let allocator = BufferAllocator::new(&device);

        let batch = allocator.create_batch::<ParticleInstance>("particles", &[]);

        assert!(batch.is_empty());
        assert_eq!(batch.capacity(), wgpu::COPY_BUFFER_ALIGNMENT);
    }

    #[test]
    fn test_batch_grows_on_demand() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let allocator = BufferAllocator::new(&device);
        let mut batch = allocator.create_batch::<ParticleInstance>("particles", &[]);

        let instances = vec![<ParticleInstance as bytemuck::Zeroable>::zeroed(); 10];
        batch.write(&device, &queue, &instances);
        assert_eq!(batch.len(), 10);
        assert!(batch.capacity() >= 480);

        let capacity = batch.capacity();
        batch.write(&device, &queue, &instances[..3]);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.capacity(), capacity);
    }
}
