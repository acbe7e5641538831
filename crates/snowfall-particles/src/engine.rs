//! Fixed-capacity precipitation pool.
//!
//! Slots are never allocated or freed after construction: a dead particle is
//! simply a slot with `life <= 0`, and spawning rewrites such a slot in place.
//! A rotating cursor remembers where the last free slot was found so that a
//! steady spawn rate does not rescan the whole pool every time.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use snowfall_terrain::GroundSurface;

use crate::mode::PrecipitationMode;
use crate::particle::{Particle, ParticleInstance};

/// Downward acceleration before per-particle weight, in units/s².
pub const GRAVITY: f32 = 9.8;

/// Particles start fading once they are this close to the ground.
pub const GROUND_FADE_DISTANCE: f32 = 0.5;

/// Snow deposited on landing is `size * DEPOSIT_FACTOR / (1 + weight)`.
pub const DEPOSIT_FACTOR: f32 = 0.02;

const LANDING_CLEARANCE: f32 = 0.01;
const GUST_AMPLITUDE_Z: f32 = 0.5;

/// Ground the engine can query and deposit snow onto. Shared with whoever
/// else owns the terrain (the scene, the renderer).
pub type SharedGround = Rc<RefCell<dyn GroundSurface>>;

/// Box above the camera in which particles are spawned.
///
/// `width` and `depth` are centred on the origin; `height` is the spawn
/// altitude. Particles further than `width`/`depth` from the camera on x/z
/// are culled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EmissionVolume {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl Default for EmissionVolume {
    fn default() -> Self {
        Self {
            width: 40.0,
            height: 30.0,
            depth: 40.0,
        }
    }
}

impl EmissionVolume {
    fn sample(&self, rng: &mut impl Rng) -> Vec3 {
        Vec3::new(
            symmetric(rng, self.width),
            self.height,
            symmetric(rng, self.depth),
        )
    }

    fn contains_horizontally(&self, offset: Vec3) -> bool {
        offset.x.abs() <= self.width && offset.z.abs() <= self.depth
    }
}

fn symmetric(rng: &mut impl Rng, extent: f32) -> f32 {
    if extent > 0.0 {
        rng.random_range(-extent / 2.0..extent / 2.0)
    } else {
        0.0
    }
}

/// Construction parameters for [`PrecipitationEngine`].
#[derive(Clone, Debug, PartialEq)]
pub struct PrecipitationSettings {
    /// Pool capacity. Zero is allowed and yields an engine that never spawns.
    pub max_particles: usize,
    pub emission: EmissionVolume,
    /// Constant wind acceleration.
    pub wind: Vec3,
    /// Amplitude of the sinusoidal gusts layered on top of `wind`.
    pub wind_strength: f32,
    pub mode: PrecipitationMode,
    pub intensity: f32,
    pub particles_per_second: f32,
    pub seed: u64,
}

impl Default for PrecipitationSettings {
    fn default() -> Self {
        Self {
            max_particles: 5000,
            emission: EmissionVolume::default(),
            wind: Vec3::ZERO,
            wind_strength: 0.5,
            mode: PrecipitationMode::Snow,
            intensity: 1.0,
            particles_per_second: 500.0,
            seed: 0,
        }
    }
}

/// Falling snow and rain over an optional ground surface.
pub struct PrecipitationEngine {
    pub(crate) particles: Vec<Particle>,
    pub(crate) cursor: usize,
    rng: ChaCha8Rng,
    emission: EmissionVolume,
    wind: Vec3,
    wind_strength: f32,
    mode: PrecipitationMode,
    intensity: f32,
    particles_per_second: f32,
    clock: f32,
    paused: bool,
    terrain: Option<SharedGround>,
}

impl PrecipitationEngine {
    /// Build a full pool with every slot spawned and lives staggered over
    /// `[0, 1)` seconds so the first burst does not land all at once.
    pub fn new(settings: PrecipitationSettings) -> Self {
        let mut engine = Self {
            particles: vec![Particle::default(); settings.max_particles],
            cursor: 0,
            rng: ChaCha8Rng::seed_from_u64(settings.seed),
            emission: settings.emission,
            wind: settings.wind,
            wind_strength: settings.wind_strength,
            mode: settings.mode,
            intensity: settings.intensity.max(0.0),
            particles_per_second: settings.particles_per_second.max(0.0),
            clock: 0.0,
            paused: false,
            terrain: None,
        };

        for slot in 0..engine.particles.len() {
            engine.respawn(slot);
            engine.particles[slot].life = engine.rng.random::<f32>();
        }

        debug!(
            capacity = engine.particles.len(),
            mode = %engine.mode,
            "Precipitation pool initialised"
        );
        engine
    }

    /// Attach (or replace) the ground particles fall onto.
    pub fn attach_terrain(&mut self, ground: SharedGround) {
        self.terrain = Some(ground);
    }

    pub fn detach_terrain(&mut self) {
        self.terrain = None;
    }

    pub fn has_terrain(&self) -> bool {
        self.terrain.is_some()
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// Spawns `floor(dt * rate * intensity)` particles into free slots, at
    /// most one pool's worth per call, then integrates every active particle. Landing snow is deposited onto the
    /// attached ground; without one the ground is the plane `y = 0`. Particles
    /// that drift further than the emission extent from `camera` are culled.
    /// Does nothing while paused.
    pub fn update(&mut self, dt: f32, camera: Vec3) {
        if self.paused {
            return;
        }
        self.clock += dt;

        let to_spawn = self.spawn_count(dt);
        for _ in 0..to_spawn {
            let slot = self.first_unused_slot();
            self.respawn(slot);
        }

        let t = self.clock;
        let wind = self.wind;
        let gust = self.wind_strength;
        let deposits = self.mode.accumulates();
        let emission = self.emission;
        let mut ground = self.terrain.as_ref().map(|g| g.borrow_mut());

        for p in self.particles.iter_mut().filter(|p| p.is_active()) {
            p.life -= dt;
            if p.life <= 0.0 {
                continue;
            }

            p.velocity.y -= GRAVITY * p.weight * dt;
            p.velocity += wind * dt;
            p.velocity.x += gust * (t * 2.0 + p.position.y * 0.1).sin() * dt;
            p.velocity.z += gust * (t * 1.5 + p.position.x * 0.1).cos() * dt * GUST_AMPLITUDE_Z;
            p.position += p.velocity * dt;
            p.rotation += p.rotation_speed * dt;

            let ground_y = ground
                .as_deref()
                .map_or(0.0, |g| g.height_at(p.position.x, p.position.z));

            if p.position.y < ground_y + GROUND_FADE_DISTANCE {
                p.color.w = ((p.position.y - ground_y) / GROUND_FADE_DISTANCE).clamp(0.0, 1.0);

                if p.position.y <= ground_y {
                    if deposits {
                        if let Some(g) = ground.as_deref_mut() {
                            let amount = p.size * DEPOSIT_FACTOR / (1.0 + p.weight);
                            g.add_snow(Vec3::new(p.position.x, ground_y, p.position.z), amount);
                            p.position.y = ground_y + LANDING_CLEARANCE;
                        }
                    }
                    p.life = 0.0;
                }
            }

            if !emission.contains_horizontally(p.position - camera) {
                p.life = 0.0;
            }
        }

        trace!(spawned = to_spawn, active = self.active_count(), "Precipitation step");
    }

    /// Particles to spawn this tick, capped at the pool size.
    fn spawn_count(&self, dt: f32) -> usize {
        let requested = (dt * self.particles_per_second * self.intensity).floor();
        if requested >= 1.0 {
            requested.min(self.particles.len() as f32) as usize
        } else {
            0
        }
    }

    /// Spawn one particle at an explicit position and velocity, bypassing the
    /// emission volume. Returns the slot used, or `None` for an empty pool.
    pub fn emit(&mut self, position: Vec3, velocity: Vec3) -> Option<usize> {
        if self.particles.is_empty() {
            return None;
        }
        let slot = self.first_unused_slot();
        self.respawn(slot);
        let p = &mut self.particles[slot];
        p.position = position;
        p.velocity = velocity;
        Some(slot)
    }

    /// Find a free slot, scanning from the cursor and wrapping once. When the
    /// pool is full, slot 0 is reused.
    pub(crate) fn first_unused_slot(&mut self) -> usize {
        let len = self.particles.len();
        let start = self.cursor.min(len);
        let found = (start..len)
            .chain(0..start)
            .find(|&i| !self.particles[i].is_active());

        match found {
            Some(i) => {
                self.cursor = i;
                i
            }
            None => {
                self.cursor = 0;
                0
            }
        }
    }

    pub(crate) fn respawn(&mut self, slot: usize) {
        let position = self.emission.sample(&mut self.rng);
        let params = self.mode.params(&mut self.rng);
        self.particles[slot] = params.spawn(&mut self.rng, position);
    }

    /// Indices of active particles sorted far-to-near from `camera`, for
    /// back-to-front alpha blending.
    pub fn draw_order(&self, camera: Vec3) -> Vec<usize> {
        let mut by_distance: Vec<(f32, usize)> = self
            .particles
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_active())
            .map(|(i, p)| (p.position.distance_squared(camera), i))
            .collect();
        by_distance.sort_by(|a, b| b.0.total_cmp(&a.0));
        by_distance.into_iter().map(|(_, i)| i).collect()
    }

    /// Instance data for every active particle, in draw order.
    pub fn billboard_instances(&self, camera: Vec3) -> Vec<ParticleInstance> {
        self.draw_order(camera)
            .into_iter()
            .map(|i| self.particles[i].to_instance())
            .collect()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    pub fn active_count(&self) -> usize {
        self.particles.iter().filter(|p| p.is_active()).count()
    }

    pub fn set_wind(&mut self, wind: Vec3) {
        self.wind = wind;
    }

    /// Nudge the constant wind by `delta`.
    pub fn add_wind(&mut self, delta: Vec3) {
        self.wind += delta;
    }

    pub fn wind(&self) -> Vec3 {
        self.wind
    }

    pub fn set_wind_strength(&mut self, strength: f32) {
        self.wind_strength = strength;
    }

    pub fn wind_strength(&self) -> f32 {
        self.wind_strength
    }

    /// Emission dimensions; negative values are clamped to zero.
    pub fn set_emission_area(&mut self, width: f32, height: f32, depth: f32) {
        self.emission = EmissionVolume {
            width: width.max(0.0),
            height,
            depth: depth.max(0.0),
        };
    }

    pub fn emission_volume(&self) -> EmissionVolume {
        self.emission
    }

    /// Takes effect on the next respawn; live particles keep their kind.
    pub fn set_mode(&mut self, mode: PrecipitationMode) {
        if mode != self.mode {
            debug!(from = %self.mode, to = %mode, "Precipitation mode changed");
        }
        self.mode = mode;
    }

    pub fn mode(&self) -> PrecipitationMode {
        self.mode
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.max(0.0);
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_particles_per_second(&mut self, rate: f32) {
        self.particles_per_second = rate.max(0.0);
    }

    pub fn particles_per_second(&self) -> f32 {
        self.particles_per_second
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Simulation time accumulated while running, in seconds.
    pub fn elapsed(&self) -> f32 {
        self.clock
    }
}
