//! One-line status summary for the title bar or the log.

use std::fmt;

use crate::scene::SceneStats;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStats {
    pub active_particles: usize,
    pub snow_volume: f32,
    pub fps: f32,
}

impl FrameStats {
    /// `frame_time` is the duration of the last frame in seconds.
    pub fn new(scene: &SceneStats, frame_time: f32) -> Self {
        Self {
            active_particles: scene.active_particles,
            snow_volume: scene.snow_volume,
            fps: if frame_time > 0.0 { 1.0 / frame_time } else { 0.0 },
        }
    }
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Snowfall3D - Part:{} Vol:{}m3 FPS:{}",
            self.active_particles, self.snow_volume as i32, self.fps as i32
        )
    }
}
