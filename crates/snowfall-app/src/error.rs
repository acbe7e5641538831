use snowfall_config::ConfigError;

use crate::controls::ScriptError;
use crate::scene::SceneError;

/// Everything that can stop the simulator before or during start-up.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("scene setup failed: {0}")]
    Scene(#[from] SceneError),

    #[error("bad key script: {0}")]
    Script(#[from] ScriptError),

    #[error("fixed timestep must be positive and finite, got {0}")]
    InvalidTimestep(f32),
}
