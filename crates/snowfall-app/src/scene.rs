//! The assembled winter scene: terrain, precipitation and vegetation wired
//! together and stepped in a fixed order.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use glam::Vec3;
use tracing::info;

use snowfall_config::Config;
use snowfall_particles::{
    EmissionVolume, ParseModeError, PrecipitationEngine, PrecipitationMode, PrecipitationSettings,
};
use snowfall_render::{UniformSink, UniformSource};
use snowfall_terrain::{SnowTerrain, TerrainSettings};
use snowfall_vegetation::{
    ObjMeshSource, TreeInstanceRaw, VegetationInstancer, VegetationSettings,
};

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("invalid precipitation mode: {0}")]
    Mode(#[from] ParseModeError),
}

/// Snapshot of the numbers worth reporting about a running scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneStats {
    pub active_particles: usize,
    pub snow_volume: f32,
    pub covered_cells: usize,
    pub mode: PrecipitationMode,
    pub intensity: f32,
    pub paused: bool,
}

/// Sky cloud density for the current weather, in `[0, 1]`.
///
/// Starts from `intensity / 3` (at least 0.05), thickened for snow and
/// thinned for mixed weather and rain.
pub fn cloud_coverage(intensity: f32, mode: PrecipitationMode) -> f32 {
    let base = (intensity / 3.0).clamp(0.05, 1.0);
    let factor = match mode {
        PrecipitationMode::Snow => 1.2,
        PrecipitationMode::Mix => 0.9,
        PrecipitationMode::Rain => 0.6,
    };
    (base * factor).clamp(0.0, 1.0)
}

pub struct WinterScene {
    terrain: Rc<RefCell<SnowTerrain>>,
    precipitation: PrecipitationEngine,
    vegetation: VegetationInstancer,
    camera: Vec3,
}

impl WinterScene {
    /// Build every component from `config`, attach the terrain to the
    /// precipitation engine and scatter the vegetation once.
    pub fn from_config(config: &Config) -> Result<Self, SceneError> {
        let p = &config.precipitation;
        let t = &config.terrain;
        let v = &config.vegetation;
        let mode: PrecipitationMode = p.mode.parse()?;

        let terrain = Rc::new(RefCell::new(SnowTerrain::new(TerrainSettings {
            width: t.width,
            depth: t.depth,
            resolution: t.resolution,
            noise_scale: t.noise_scale,
            height_scale: t.height_scale,
            seed: t.seed,
            max_snow_depth: t.max_snow_depth,
            melt_speed: t.melt_speed,
            patch_lifetime: t.patch_lifetime,
        })));

        let mut precipitation = PrecipitationEngine::new(PrecipitationSettings {
            max_particles: p.max_particles,
            emission: EmissionVolume {
                width: p.emission[0],
                height: p.emission[1],
                depth: p.emission[2],
            },
            wind: Vec3::from_array(p.wind),
            wind_strength: p.wind_strength,
            mode,
            intensity: p.intensity,
            particles_per_second: p.particles_per_second,
            seed: p.seed,
        });
        precipitation.attach_terrain(terrain.clone());

        let mut vegetation = VegetationInstancer::new(VegetationSettings {
            seed: v.seed,
            hide_threshold: v.hide_threshold,
        });
        vegetation.load_tree_model(&ObjMeshSource, &v.tree_model);
        vegetation.generate(&*terrain.borrow(), v.grass_count, v.tree_count);

        info!(
            particles = precipitation.capacity(),
            %mode,
            grass = vegetation.grass().len(),
            trees = vegetation.trees().len(),
            "Winter scene ready"
        );

        Ok(Self {
            terrain,
            precipitation,
            vegetation,
            camera: Vec3::from_array(config.simulation.camera),
        })
    }

    /// Advance by `dt`: melt the snow layer, then move the precipitation
    /// (which may deposit fresh snow).
    pub fn step(&mut self, dt: f32) {
        self.terrain.borrow_mut().update(dt);
        self.precipitation.update(dt, self.camera);
    }

    pub fn stats(&self) -> SceneStats {
        let terrain = self.terrain.borrow();
        SceneStats {
            active_particles: self.precipitation.active_count(),
            snow_volume: terrain.total_snow_volume(),
            covered_cells: terrain.covered_cells(),
            mode: self.precipitation.mode(),
            intensity: self.precipitation.intensity(),
            paused: self.precipitation.is_paused(),
        }
    }

    pub fn cloud_coverage(&self) -> f32 {
        cloud_coverage(self.precipitation.intensity(), self.precipitation.mode())
    }

    /// Deepest snow relative to the layer's maximum, in `[0, 1]`.
    pub fn snow_cover(&self) -> f32 {
        let terrain = self.terrain.borrow();
        if terrain.max_snow_depth() > 0.0 {
            (terrain.max_depth() / terrain.max_snow_depth()).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Snow cap instances sized by the current snow cover.
    pub fn snow_caps(&self) -> Vec<TreeInstanceRaw> {
        self.vegetation.snow_cap_instances(self.snow_cover())
    }

    /// Grass that is still poking out of the snow.
    pub fn visible_grass(&self) -> Vec<Vec3> {
        self.vegetation.visible_grass(&*self.terrain.borrow())
    }

    pub fn terrain(&self) -> Ref<'_, SnowTerrain> {
        self.terrain.borrow()
    }

    pub fn terrain_mut(&self) -> RefMut<'_, SnowTerrain> {
        self.terrain.borrow_mut()
    }

    pub fn precipitation(&self) -> &PrecipitationEngine {
        &self.precipitation
    }

    pub fn precipitation_mut(&mut self) -> &mut PrecipitationEngine {
        &mut self.precipitation
    }

    pub fn vegetation(&self) -> &VegetationInstancer {
        &self.vegetation
    }

    pub fn camera(&self) -> Vec3 {
        self.camera
    }

    pub fn set_camera(&mut self, camera: Vec3) {
        self.camera = camera;
    }
}

impl UniformSource for WinterScene {
    fn push_uniforms(&self, sink: &mut dyn UniformSink) {
        self.precipitation.push_uniforms(sink);
        self.terrain.borrow().push_uniforms(sink);
        self.vegetation.push_uniforms(sink);
        sink.set_f32("cloudCoverage", self.cloud_coverage());
    }
}
