//! Canonical vertex buffer layouts for every buffer the scene uploads.
//!
//! Pipelines reference these constants instead of spelling out attributes
//! themselves, so a change to a Pod struct only has to be mirrored here.
//!
//! | Buffer            | Step     | Locations | Stride |
//! |-------------------|----------|-----------|--------|
//! | terrain vertex    | vertex   | 0–3       | 36     |
//! | mesh vertex       | vertex   | 0–1       | 24     |
//! | particle instance | instance | 0–2       | 48     |
//! | tree instance     | instance | 4–8       | 80     |

use std::mem;

use wgpu::{VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

use snowfall_particles::ParticleInstance;
use snowfall_terrain::TerrainVertex;
use snowfall_vegetation::{MeshVertex, TreeInstanceRaw};

pub const TERRAIN_VERTEX_ATTRIBUTES: [VertexAttribute; 4] = [
    // position
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: 0,
        shader_location: 0,
    },
    // normal
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: 12,
        shader_location: 1,
    },
    // uv
    VertexAttribute {
        format: VertexFormat::Float32x2,
        offset: 24,
        shader_location: 2,
    },
    // snow depth
    VertexAttribute {
        format: VertexFormat::Float32,
        offset: 32,
        shader_location: 3,
    },
];

pub const TERRAIN_VERTEX_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: mem::size_of::<TerrainVertex>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &TERRAIN_VERTEX_ATTRIBUTES,
};

pub const MESH_VERTEX_ATTRIBUTES: [VertexAttribute; 2] = [
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: 0,
        shader_location: 0,
    },
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: 12,
        shader_location: 1,
    },
];

pub const MESH_VERTEX_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: mem::size_of::<MeshVertex>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &MESH_VERTEX_ATTRIBUTES,
};

/// Billboard corners come from the vertex index, so particles only need
/// per-instance data.
pub const PARTICLE_INSTANCE_ATTRIBUTES: [VertexAttribute; 3] = [
    // position xyz + size
    VertexAttribute {
        format: VertexFormat::Float32x4,
        offset: 0,
        shader_location: 0,
    },
    // rgba
    VertexAttribute {
        format: VertexFormat::Float32x4,
        offset: 16,
        shader_location: 1,
    },
    // rotation
    VertexAttribute {
        format: VertexFormat::Float32,
        offset: 32,
        shader_location: 2,
    },
];

pub const PARTICLE_INSTANCE_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: mem::size_of::<ParticleInstance>() as u64,
    step_mode: VertexStepMode::Instance,
    attributes: &PARTICLE_INSTANCE_ATTRIBUTES,
};

/// First shader location used by tree instance data; the mesh vertex owns
/// the locations below it.
pub const TREE_INSTANCE_FIRST_LOCATION: u32 = 4;

pub const TREE_INSTANCE_ATTRIBUTES: [VertexAttribute; 5] = [
    VertexAttribute {
        format: VertexFormat::Float32x4,
        offset: 0,
        shader_location: 4,
    },
    VertexAttribute {
        format: VertexFormat::Float32x4,
        offset: 16,
        shader_location: 5,
    },
    VertexAttribute {
        format: VertexFormat::Float32x4,
        offset: 32,
        shader_location: 6,
    },
    VertexAttribute {
        format: VertexFormat::Float32x4,
        offset: 48,
        shader_location: 7,
    },
    // seed
    VertexAttribute {
        format: VertexFormat::Float32,
        offset: 64,
        shader_location: 8,
    },
];

pub const TREE_INSTANCE_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: mem::size_of::<TreeInstanceRaw>() as u64,
    step_mode: VertexStepMode::Instance,
    attributes: &TREE_INSTANCE_ATTRIBUTES,
};

// ---------------------------------------------------------------------------
// Compile-time validation
// ---------------------------------------------------------------------------

const _: () = assert!(
    mem::size_of::<TerrainVertex>() == 36,
    "TerrainVertex size changed, update TERRAIN_VERTEX_LAYOUT"
);
const _: () = assert!(TERRAIN_VERTEX_ATTRIBUTES[3].offset + 4 == 36);

const _: () = assert!(mem::size_of::<MeshVertex>() == 24);

const _: () = assert!(
    mem::size_of::<ParticleInstance>() == 48,
    "ParticleInstance size changed, update PARTICLE_INSTANCE_LAYOUT"
);
const _: () = assert!(PARTICLE_INSTANCE_ATTRIBUTES[2].offset + 4 <= 48);

const _: () = assert!(
    mem::size_of::<TreeInstanceRaw>() == 80,
    "TreeInstanceRaw size changed, update TREE_INSTANCE_LAYOUT"
);
const _: () = assert!(TREE_INSTANCE_ATTRIBUTES[0].shader_location == TREE_INSTANCE_FIRST_LOCATION);
const _: () = assert!(
    MESH_VERTEX_ATTRIBUTES[1].shader_location < TREE_INSTANCE_FIRST_LOCATION,
    "Mesh vertex attributes overlap tree instance locations"
);
