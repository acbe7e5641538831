//! Command-line argument parsing for the snowfall simulator.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Snowfall command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "snowfall", about = "Headless winter scene simulator")]
pub struct CliArgs {
    /// Number of frames to simulate.
    #[arg(long)]
    pub frames: Option<u64>,

    /// Precipitation mode (snow, rain, mix).
    #[arg(long)]
    pub mode: Option<String>,

    /// Precipitation intensity multiplier.
    #[arg(long)]
    pub intensity: Option<f32>,

    /// Particle pool capacity.
    #[arg(long)]
    pub max_particles: Option<usize>,

    /// Base spawn rate in particles per second.
    #[arg(long)]
    pub rate: Option<f32>,

    /// Seed shared by terrain, precipitation and vegetation.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Scripted key press, `KEY@FRAME` (repeatable), e.g. `--press R@120`.
    #[arg(long = "press", value_name = "KEY@FRAME")]
    pub presses: Vec<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(frames) = args.frames {
            self.simulation.frames = frames;
        }
        if let Some(ref mode) = args.mode {
            self.precipitation.mode = mode.clone();
        }
        if let Some(intensity) = args.intensity {
            self.precipitation.intensity = intensity;
        }
        if let Some(max) = args.max_particles {
            self.precipitation.max_particles = max;
        }
        if let Some(rate) = args.rate {
            self.precipitation.particles_per_second = rate;
        }
        if let Some(seed) = args.seed {
            self.precipitation.seed = seed;
            self.terrain.seed = seed as u32;
            self.vegetation.seed = seed;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
