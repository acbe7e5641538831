//! Fixed-timestep loop.
//!
//! Simulation advances in constant `dt` steps drawn from an accumulator, so
//! the outcome of a run depends only on the sequence of frame times fed in.
//! Rendering happens once per frame with the leftover fraction as `alpha`.

use tracing::warn;

/// Default simulation timestep: 60 Hz.
pub const DEFAULT_DT: f64 = 1.0 / 60.0;

/// Longest frame time accepted before clamping; past this the simulation
/// slows down instead of queuing dozens of catch-up steps.
pub const MAX_FRAME_TIME: f64 = 0.25;

pub struct FixedStep {
    dt: f64,
    accumulator: f64,
    total_sim_time: f64,
    frame_count: u64,
    update_count: u64,
}

impl FixedStep {
    /// Returns `None` unless `dt` is finite and positive.
    pub fn new(dt: f64) -> Option<Self> {
        (dt.is_finite() && dt > 0.0).then_some(Self {
            dt,
            accumulator: 0.0,
            total_sim_time: 0.0,
            frame_count: 0,
            update_count: 0,
        })
    }

    /// Runs one frame of `frame_time` seconds.
    ///
    /// - `update_fn(dt, total_sim_time)` is called zero or more times.
    /// - `render_fn(alpha)` is called exactly once with `alpha` in `[0, 1)`.
    pub fn tick(
        &mut self,
        frame_time: f64,
        mut update_fn: impl FnMut(f64, f64),
        mut render_fn: impl FnMut(f64),
    ) {
        let mut frame_time = frame_time.max(0.0);
        if frame_time > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_time * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            frame_time = MAX_FRAME_TIME;
        }

        self.accumulator += frame_time;

        while self.accumulator >= self.dt {
            update_fn(self.dt, self.total_sim_time);
            self.total_sim_time += self.dt;
            self.accumulator -= self.dt;
            self.update_count += 1;
        }

        render_fn(self.alpha());
        self.frame_count += 1;
    }

    /// Interpolation factor between the last two simulation states.
    pub fn alpha(&self) -> f64 {
        if self.accumulator > 0.0 {
            self.accumulator / self.dt
        } else {
            0.0
        }
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    pub fn total_sim_time(&self) -> f64 {
        self.total_sim_time
    }
}

impl Default for FixedStep {
    fn default() -> Self {
        Self {
            dt: DEFAULT_DT,
            accumulator: 0.0,
            total_sim_time: 0.0,
            frame_count: 0,
            update_count: 0,
        }
    }
}
