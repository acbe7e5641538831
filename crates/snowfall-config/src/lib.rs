//! Configuration for the snowfall scene.
//!
//! Settings persist to disk as a RON file, every field has a default so
//! partial files stay valid, and command-line flags override what was loaded.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, PrecipitationConfig, SimulationConfig, TerrainConfig, VegetationConfig,
    default_config_dir,
};
pub use error::ConfigError;
