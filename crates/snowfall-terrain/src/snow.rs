//! Snow layer state: per-vertex snow depth and melt timers over a noise height field.

use glam::{Vec2, Vec3};
use tracing::debug;

use crate::ground::{HeightOracle, SnowSink};
use crate::heightmap::{HeightmapParams, HeightmapSampler};
use crate::mesh::{TerrainVertex, build_grid};

/// Fraction of a deposit shared with each neighbouring cell, before distance falloff.
pub const NEIGHBOUR_SHARE: f32 = 0.3;

/// Neighbours are protected from melting for this fraction of the patch lifetime.
pub const NEIGHBOUR_LIFETIME_FACTOR: f32 = 0.5;

/// Construction parameters for [`SnowTerrain`].
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainSettings {
    /// Extent along x in world units.
    pub width: f32,
    /// Extent along z in world units.
    pub depth: f32,
    /// Vertices per side. Values below 2 are raised to 2.
    pub resolution: usize,
    /// Multiplier applied to world coordinates before sampling noise.
    pub noise_scale: f32,
    /// Peak base height; 0 produces a flat plane at y = 0.
    pub height_scale: f32,
    pub seed: u32,
    /// Upper bound for snow depth at any vertex.
    pub max_snow_depth: f32,
    /// Depth lost per second once a cell's melt timer has run out.
    pub melt_speed: f32,
    /// Dormancy granted to the directly hit cell on every deposit, in seconds.
    pub patch_lifetime: f32,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            width: 50.0,
            depth: 50.0,
            resolution: 100,
            noise_scale: 0.1,
            height_scale: 3.0,
            seed: 0,
            max_snow_depth: 0.5,
            melt_speed: 0.05,
            patch_lifetime: 10.0,
        }
    }
}

/// Snapshot of a single grid vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnowCell {
    pub base_height: f32,
    pub snow_depth: f32,
    pub melt_timer: f32,
}

/// A height-field terrain that accumulates and melts snow.
///
/// Deposits spread into the surrounding 3×3 block and start a dormancy
/// window during which the snow is protected from melting. Every query is
/// best-effort: coordinates off the grid read as height 0 and deposits there
/// are ignored.
pub struct SnowTerrain {
    width: f32,
    depth: f32,
    resolution: usize,
    max_snow_depth: f32,
    melt_speed: f32,
    patch_lifetime: f32,
    base_height: Vec<f32>,
    snow_depth: Vec<f32>,
    melt_timer: Vec<f32>,
    vertices: Vec<TerrainVertex>,
    indices: Vec<u32>,
}

impl SnowTerrain {
    pub fn new(settings: TerrainSettings) -> Self {
        let resolution = settings.resolution.max(2);
        let last = (resolution - 1) as f32;
        let step_x = settings.width / last;
        let step_z = settings.depth / last;

        let sampler = HeightmapSampler::new(HeightmapParams {
            seed: settings.seed,
            ..Default::default()
        });

        let mut base_height = Vec::with_capacity(resolution * resolution);
        for z in 0..resolution {
            for x in 0..resolution {
                let world_x = -settings.width / 2.0 + x as f32 * step_x;
                let world_z = -settings.depth / 2.0 + z as f32 * step_z;
                let n = sampler.sample(
                    (world_x * settings.noise_scale) as f64,
                    (world_z * settings.noise_scale) as f64,
                );
                base_height.push(n as f32 * settings.height_scale);
            }
        }

        let (vertices, indices) =
            build_grid(settings.width, settings.depth, resolution, &base_height);

        debug!(
            width = settings.width,
            depth = settings.depth,
            resolution,
            triangles = indices.len() / 3,
            "generated terrain height field"
        );

        Self {
            width: settings.width,
            depth: settings.depth,
            resolution,
            max_snow_depth: settings.max_snow_depth.max(0.0),
            melt_speed: settings.melt_speed.max(0.0),
            patch_lifetime: settings.patch_lifetime.max(0.0),
            snow_depth: vec![0.0; base_height.len()],
            melt_timer: vec![0.0; base_height.len()],
            base_height,
            vertices,
            indices,
        }
    }

    /// Map a world position to the nearest grid vertex, or `None` off the grid.
    pub fn cell_index_at(&self, x: f32, z: f32) -> Option<(usize, usize)> {
        let last = (self.resolution - 1) as f32;
        let gx = ((x + self.width / 2.0) / self.width * last).round();
        let gz = ((z + self.depth / 2.0) / self.depth * last).round();

        // NaN fails both comparisons and falls through to `None`.
        if gx >= 0.0 && gx <= last && gz >= 0.0 && gz <= last {
            Some((gx as usize, gz as usize))
        } else {
            None
        }
    }

    fn index(&self, ix: usize, iz: usize) -> usize {
        iz * self.resolution + ix
    }

    /// Advance dormancy and melting by `dt` seconds, then refresh the vertex
    /// array's snow attribute.
    ///
    /// A cell whose timer is still running only counts down this tick; melting
    /// starts on the first tick after the timer reaches zero.
    pub fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        let melt = self.melt_speed * dt;

        for (depth, timer) in self.snow_depth.iter_mut().zip(self.melt_timer.iter_mut()) {
            if *timer > 0.0 {
                *timer = (*timer - dt).max(0.0);
            } else if *depth > 0.0 {
                *depth = (*depth - melt).max(0.0);
            }
        }

        for (vertex, &depth) in self.vertices.iter_mut().zip(&self.snow_depth) {
            vertex.snow_depth = depth;
        }
    }

    /// Deposit `amount` of snow at the vertex nearest `position`.
    ///
    /// The hit vertex receives the full amount and a melt timer of at least
    /// `patch_lifetime`. Each of the eight neighbours receives
    /// `amount * 0.3 / (1 + distance)` and a timer of at least half the patch
    /// lifetime. Timers only ever latch upwards.
    pub fn add_snow(&mut self, position: Vec3, amount: f32) {
        let Some((cx, cz)) = self.cell_index_at(position.x, position.z) else {
            return;
        };
        let amount = amount.max(0.0);

        let centre = self.index(cx, cz);
        self.deposit(centre, amount, self.patch_lifetime);

        let neighbour_lifetime = self.patch_lifetime * NEIGHBOUR_LIFETIME_FACTOR;
        for dz in -1i32..=1 {
            for dx in -1i32..=1 {
                if dx == 0 && dz == 0 {
                    continue;
                }
                let nx = cx as i32 + dx;
                let nz = cz as i32 + dz;
                if nx < 0 || nz < 0 || nx >= self.resolution as i32 || nz >= self.resolution as i32
                {
                    continue;
                }

                let distance = ((dx * dx + dz * dz) as f32).sqrt();
                let share = amount * NEIGHBOUR_SHARE / (1.0 + distance);
                let idx = self.index(nx as usize, nz as usize);
                self.deposit(idx, share, neighbour_lifetime);
            }
        }
    }

    fn deposit(&mut self, idx: usize, amount: f32, lifetime: f32) {
        self.snow_depth[idx] = (self.snow_depth[idx] + amount).min(self.max_snow_depth);
        self.melt_timer[idx] = self.melt_timer[idx].max(lifetime);
    }

    /// Base height plus snow at the nearest vertex; `0.0` off the grid.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        match self.cell_index_at(x, z) {
            Some((ix, iz)) => {
                let idx = self.index(ix, iz);
                self.base_height[idx] + self.snow_depth[idx]
            }
            None => 0.0,
        }
    }

    /// Snow depth at the nearest vertex; `0.0` off the grid.
    pub fn snow_depth_at(&self, x: f32, z: f32) -> f32 {
        self.cell_index_at(x, z)
            .map_or(0.0, |(ix, iz)| self.snow_depth[self.index(ix, iz)])
    }

    /// Approximate snow volume: sum of depths times the area one vertex stands for.
    pub fn total_snow_volume(&self) -> f32 {
        let cells = (self.resolution - 1) as f32;
        let cell_area = (self.width / cells) * (self.depth / cells);
        self.snow_depth.iter().map(|d| d * cell_area).sum()
    }

    /// Number of vertices carrying any snow.
    pub fn covered_cells(&self) -> usize {
        self.snow_depth.iter().filter(|&&d| d > 0.0).count()
    }

    /// Deepest snow anywhere on the grid.
    pub fn max_depth(&self) -> f32 {
        self.snow_depth.iter().copied().fold(0.0, f32::max)
    }

    pub fn cell(&self, ix: usize, iz: usize) -> Option<SnowCell> {
        if ix >= self.resolution || iz >= self.resolution {
            return None;
        }
        let idx = self.index(ix, iz);
        Some(SnowCell {
            base_height: self.base_height[idx],
            snow_depth: self.snow_depth[idx],
            melt_timer: self.melt_timer[idx],
        })
    }

    /// Overwrite one vertex's snow state. Depth is clamped to `[0, max]`, the
    /// timer to `>= 0`. Out-of-range indices are ignored.
    pub fn set_cell_snow(&mut self, ix: usize, iz: usize, depth: f32, melt_timer: f32) {
        if ix >= self.resolution || iz >= self.resolution {
            return;
        }
        let idx = self.index(ix, iz);
        self.snow_depth[idx] = depth.clamp(0.0, self.max_snow_depth);
        self.melt_timer[idx] = melt_timer.max(0.0);
    }

    pub fn set_melt_speed(&mut self, speed: f32) {
        self.melt_speed = speed.max(0.0);
    }

    pub fn melt_speed(&self) -> f32 {
        self.melt_speed
    }

    pub fn max_snow_depth(&self) -> f32 {
        self.max_snow_depth
    }

    pub fn patch_lifetime(&self) -> f32 {
        self.patch_lifetime
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Vertex array for upload. The snow attribute reflects the last [`update`](Self::update).
    pub fn vertices(&self) -> &[TerrainVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

impl HeightOracle for SnowTerrain {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        SnowTerrain::height_at(self, x, z)
    }

    fn footprint(&self) -> Vec2 {
        Vec2::new(self.width, self.depth)
    }

    fn snow_depth_at(&self, x: f32, z: f32) -> f32 {
        SnowTerrain::snow_depth_at(self, x, z)
    }
}

impl SnowSink for SnowTerrain {
    fn add_snow(&mut self, position: Vec3, amount: f32) {
        SnowTerrain::add_snow(self, position, amount);
    }
}
