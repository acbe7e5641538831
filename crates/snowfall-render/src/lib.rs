//! GPU-facing boundary of the scene: vertex layouts, buffer uploads and the
//! uniform values each simulation component feeds its shaders.
//!
//! Nothing here owns a window or a surface; callers bring their own
//! `wgpu::Device` and `wgpu::Queue`.

pub mod buffer;
pub mod layout;
pub mod uniforms;

pub use buffer::{BufferAllocator, GpuBatch, MeshBuffer};
pub use layout::{
    MESH_VERTEX_LAYOUT, PARTICLE_INSTANCE_LAYOUT, TERRAIN_VERTEX_LAYOUT, TREE_INSTANCE_LAYOUT,
};
pub use uniforms::{UniformRecorder, UniformSink, UniformSource, UniformValue, mode_index};
