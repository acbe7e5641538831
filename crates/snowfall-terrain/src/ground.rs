//! The ground contract shared by everything that stands on, or falls onto, the terrain.

use glam::{Vec2, Vec3};

/// Best-effort height lookup. Never fails: points off the surface report `0.0`.
pub trait HeightOracle {
    /// Surface height at `(x, z)`, including any snow on top.
    fn height_at(&self, x: f32, z: f32) -> f32;

    /// Physical extent `(width, depth)` of the surface, centred on the origin.
    fn footprint(&self) -> Vec2;

    /// Snow depth at `(x, z)`. Surfaces without a snow layer report `0.0`.
    fn snow_depth_at(&self, _x: f32, _z: f32) -> f32 {
        0.0
    }
}

/// Accepts deposited snow. Deposits that miss the surface are dropped silently.
pub trait SnowSink {
    fn add_snow(&mut self, position: Vec3, amount: f32);
}

/// A surface that can both be queried and snowed on.
pub trait GroundSurface: HeightOracle + SnowSink {}

impl<T: HeightOracle + SnowSink> GroundSurface for T {}

/// A constant-height plane that records every deposit it receives.
///
/// Useful wherever a real height field would only add noise, e.g. when
/// exercising particle integration in isolation.
#[derive(Debug, Clone, Default)]
pub struct FlatGround {
    pub height: f32,
    pub size: Vec2,
    pub deposits: Vec<(Vec3, f32)>,
}

impl FlatGround {
    pub fn new(height: f32, size: Vec2) -> Self {
        Self {
            height,
            size,
            deposits: Vec::new(),
        }
    }

    /// Sum of all deposited amounts.
    pub fn deposited(&self) -> f32 {
        self.deposits.iter().map(|&(_, amount)| amount).sum()
    }
}

impl HeightOracle for FlatGround {
    fn height_at(&self, _x: f32, _z: f32) -> f32 {
        self.height
    }

    fn footprint(&self) -> Vec2 {
        self.size
    }
}

impl SnowSink for FlatGround {
    fn add_snow(&mut self, position: Vec3, amount: f32) {
        self.deposits.push((position, amount));
    }
}
