//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level scene configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Falling snow and rain.
    pub precipitation: PrecipitationConfig,
    /// Height field and snow layer.
    pub terrain: TerrainConfig,
    /// Grass and trees.
    pub vegetation: VegetationConfig,
    /// Headless simulation loop.
    pub simulation: SimulationConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Precipitation engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PrecipitationConfig {
    /// Particle pool capacity.
    pub max_particles: usize,
    /// Emission box `[width, height, depth]`; height is the spawn altitude.
    pub emission: [f32; 3],
    /// Constant wind acceleration.
    pub wind: [f32; 3],
    /// Amplitude of the wind gusts.
    pub wind_strength: f32,
    /// One of `snow`, `rain`, `mix`.
    pub mode: String,
    /// Spawn rate multiplier.
    pub intensity: f32,
    /// Base spawn rate before intensity.
    pub particles_per_second: f32,
    pub seed: u64,
}

impl Default for PrecipitationConfig {
    fn default() -> Self {
        Self {
            max_particles: 5000,
            emission: [40.0, 25.0, 40.0],
            wind: [1.0, 0.0, 0.0],
            wind_strength: 1.5,
            mode: "snow".to_string(),
            intensity: 1.0,
            particles_per_second: 500.0,
            seed: 0x5eed,
        }
    }
}

/// Terrain configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    pub width: f32,
    pub depth: f32,
    /// Vertices per side.
    pub resolution: usize,
    /// World-to-noise coordinate scale.
    pub noise_scale: f32,
    /// Peak ground height.
    pub height_scale: f32,
    /// Upper bound for snow depth.
    pub max_snow_depth: f32,
    /// Depth lost per second once a patch goes stale.
    pub melt_speed: f32,
    /// Seconds a fresh deposit is protected from melting.
    pub patch_lifetime: f32,
    pub seed: u32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: 50.0,
            depth: 50.0,
            resolution: 100,
            noise_scale: 0.1,
            height_scale: 3.0,
            max_snow_depth: 0.5,
            melt_speed: 0.05,
            patch_lifetime: 10.0,
            seed: 0,
        }
    }
}

/// Vegetation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VegetationConfig {
    pub grass_count: usize,
    pub tree_count: usize,
    /// Grass is hidden under snow deeper than this.
    pub hide_threshold: f32,
    /// Tree model files tried in order before falling back to the procedural tree.
    pub tree_model: Vec<PathBuf>,
    pub seed: u64,
}

impl Default for VegetationConfig {
    fn default() -> Self {
        Self {
            grass_count: 1200,
            tree_count: 180,
            hide_threshold: 0.2,
            tree_model: vec![
                PathBuf::from("assets/tree.obj"),
                PathBuf::from("tree.obj"),
                PathBuf::from("../assets/tree.obj"),
            ],
            seed: 7,
        }
    }
}

/// Headless simulation loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed simulation timestep in seconds.
    pub fixed_dt: f32,
    /// Number of frames to run.
    pub frames: u64,
    /// Observer position used for particle culling.
    pub camera: [f32; 3],
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            frames: 600,
            camera: [0.0, 5.0, 15.0],
        }
    }
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log scene statistics while running.
    pub show_stats: bool,
    /// Frames between two statistics lines.
    pub stats_interval: u64,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            show_stats: true,
            stats_interval: 60,
        }
    }
}

/// Per-user configuration directory, e.g. `~/.config/snowfall` on Linux.
///
/// Falls back to the working directory when the platform has no config dir.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("snowfall"))
        .unwrap_or_else(|| PathBuf::from("."))
}

// --- Load / Save ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        let path = config_dir.join(CONFIG_FILE);
        std::fs::write(&path, serialized).map_err(|source| ConfigError::Write { path, source })
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
