//! Particle value type and its packed render form.

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

/// Which parameter set a particle was last spawned from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    #[default]
    Snow,
    Rain,
}

/// One slot of the precipitation pool.
///
/// A slot is active while `life > 0`; anything else is a free slot waiting to
/// be respawned in place.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    /// RGBA; alpha fades out as the particle nears the ground.
    pub color: Vec4,
    pub size: f32,
    /// Remaining life in seconds.
    pub life: f32,
    pub rotation: f32,
    pub rotation_speed: f32,
    /// Scales gravity and damps the amount of snow deposited on landing.
    pub weight: f32,
    pub kind: ParticleKind,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            color: Vec4::ONE,
            size: 1.0,
            life: 0.0,
            rotation: 0.0,
            rotation_speed: 0.0,
            weight: 1.0,
            kind: ParticleKind::Snow,
        }
    }
}

impl Particle {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.life > 0.0
    }

    /// Pack for the billboard instance buffer.
    pub fn to_instance(&self) -> ParticleInstance {
        ParticleInstance {
            position: self.position.to_array(),
            size: self.size,
            color: self.color.to_array(),
            rotation: self.rotation,
            _padding: [0.0; 3],
        }
    }
}

/// Per-instance data for one camera-facing particle quad.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 4],
    pub rotation: f32,
    pub _padding: [f32; 3],
}

const _: () = assert!(std::mem::size_of::<ParticleInstance>() == 48);
