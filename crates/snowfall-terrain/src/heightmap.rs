//! Multi-octave value-noise heightmap sampler.
//!
//! Composites a small number of value-noise octaves into a normalised height
//! in roughly `[-1, 1]`. The terrain scales the result into world units.

use noise::{NoiseFn, Value};

/// Configuration for the fractal value noise used to shape the base terrain.
#[derive(Clone, Debug)]
pub struct HeightmapParams {
    /// Seed for deterministic generation.
    pub seed: u32,
    /// Number of octaves to composite. Default: 4.
    pub octaves: u32,
    /// Frequency multiplier between successive octaves. Default: 2.0.
    pub lacunarity: f64,
    /// Amplitude multiplier between successive octaves. Default: 0.5.
    pub persistence: f64,
    /// Frequency of the first octave, applied on top of the caller's coordinate scale.
    pub base_frequency: f64,
}

impl Default for HeightmapParams {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            base_frequency: 1.0,
        }
    }
}

/// Samples normalised fractal value noise.
///
/// Each octave doubles in frequency and halves in amplitude; the sum is divided
/// by the total amplitude so the output range does not depend on the octave count.
pub struct HeightmapSampler {
    noise: Value,
    params: HeightmapParams,
}

impl HeightmapSampler {
    pub fn new(params: HeightmapParams) -> Self {
        let noise = Value::new(params.seed);
        Self { noise, params }
    }

    /// Sample the normalised height at `(x, z)`.
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.params.base_frequency;
        let mut amplitude = 1.0;
        let mut amplitude_sum = 0.0;

        for _ in 0..self.params.octaves {
            total += self.noise.get([x * frequency, z * frequency]) * amplitude;
            amplitude_sum += amplitude;

            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }

        if amplitude_sum > 0.0 {
            total / amplitude_sum
        } else {
            0.0
        }
    }

    pub fn params(&self) -> &HeightmapParams {
        &self.params
    }
}
