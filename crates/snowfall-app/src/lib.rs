//! Headless winter scene: the assembled simulation, weather controls and the
//! fixed-timestep loop that drives them.

pub mod controls;
pub mod error;
pub mod game_loop;
pub mod scene;
pub mod stats;

pub use controls::{
    KeyLatch, ScriptError, ScriptedPress, WeatherAction, WeatherController, parse_script,
};
pub use error::AppError;
pub use game_loop::{DEFAULT_DT, FixedStep, MAX_FRAME_TIME};
pub use scene::{SceneError, SceneStats, WinterScene, cloud_coverage};
pub use stats::FrameStats;
