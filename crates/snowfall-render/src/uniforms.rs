//! Named shader parameters published by each simulation component.

use std::collections::BTreeMap;

use glam::{Vec3, Vec4};

use snowfall_particles::{PrecipitationEngine, PrecipitationMode};
use snowfall_terrain::SnowTerrain;
use snowfall_vegetation::VegetationInstancer;

pub const TRUNK_COLOR: Vec3 = Vec3::new(0.45, 0.32, 0.20);
pub const FOLIAGE_COLOR: Vec3 = Vec3::new(0.12, 0.5, 0.17);
/// Normalised tree height at which bark starts blending into foliage.
pub const FOLIAGE_START: f32 = 0.6;
pub const FOLIAGE_BLEND: f32 = 0.6;

/// Receiver for named uniform values, e.g. a shader program or a recorder.
pub trait UniformSink {
    fn set_f32(&mut self, name: &str, value: f32);
    fn set_vec3(&mut self, name: &str, value: Vec3);
    fn set_vec4(&mut self, name: &str, value: Vec4);
    fn set_u32(&mut self, name: &str, value: u32);
}

/// A component that knows which shader parameters it drives.
pub trait UniformSource {
    fn push_uniforms(&self, sink: &mut dyn UniformSink);
}

/// Shader-side encoding of [`PrecipitationMode`].
pub fn mode_index(mode: PrecipitationMode) -> u32 {
    match mode {
        PrecipitationMode::Snow => 0,
        PrecipitationMode::Rain => 1,
        PrecipitationMode::Mix => 2,
    }
}

impl UniformSource for PrecipitationEngine {
    fn push_uniforms(&self, sink: &mut dyn UniformSink) {
        sink.set_vec3("windDir", self.wind());
        sink.set_f32("windStrength", self.wind_strength());
        sink.set_f32("intensity", self.intensity());
        sink.set_u32("precipitationMode", mode_index(self.mode()));
    }
}

impl UniformSource for SnowTerrain {
    fn push_uniforms(&self, sink: &mut dyn UniformSink) {
        sink.set_f32("maxSnowDepth", self.max_snow_depth());
        sink.set_f32("meltSpeed", self.melt_speed());
    }
}

impl UniformSource for VegetationInstancer {
    fn push_uniforms(&self, sink: &mut dyn UniformSink) {
        sink.set_f32("hideThreshold", self.hide_threshold());
        sink.set_vec3("trunkColor", TRUNK_COLOR);
        sink.set_vec3("foliageColor", FOLIAGE_COLOR);
        sink.set_f32("foliageStart", FOLIAGE_START);
        sink.set_f32("foliageBlend", FOLIAGE_BLEND);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    F32(f32),
    Vec3(Vec3),
    Vec4(Vec4),
    U32(u32),
}

/// Sink that keeps the last value written under each name.
#[derive(Clone, Debug, Default)]
pub struct UniformRecorder {
    values: BTreeMap<String, UniformValue>,
}

impl UniformRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.values.get(name).copied()
    }

    pub fn f32(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            UniformValue::F32(v) => Some(v),
            _ => None,
        }
    }

    pub fn vec3(&self, name: &str) -> Option<Vec3> {
        match self.get(name)? {
            UniformValue::Vec3(v) => Some(v),
            _ => None,
        }
    }

    pub fn u32(&self, name: &str) -> Option<u32> {
        match self.get(name)? {
            UniformValue::U32(v) => Some(v),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    fn insert(&mut self, name: &str, value: UniformValue) {
        self.values.insert(name.to_owned(), value);
    }
}

impl UniformSink for UniformRecorder {
    fn set_f32(&mut self, name: &str, value: f32) {
        self.insert(name, UniformValue::F32(value));
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.insert(name, UniformValue::Vec3(value));
    }

    fn set_vec4(&mut self, name: &str, value: Vec4) {
        self.insert(name, UniformValue::Vec4(value));
    }

    fn set_u32(&mut self, name: &str, value: u32) {
        self.insert(name, UniformValue::U32(value));
    }
}
