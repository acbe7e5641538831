//! Precipitation engine: a fixed-capacity particle pool of snow and rain that
//! falls under gravity and wind and deposits snow onto the ground it hits.

mod engine;
mod mode;
mod particle;


pub use engine::{
    DEPOSIT_FACTOR, EmissionVolume, GRAVITY, GROUND_FADE_DISTANCE, PrecipitationEngine,
    PrecipitationSettings, SharedGround,
};
pub use mode::{MIX_SNOW_PROBABILITY, ParseModeError, PrecipitationMode};
pub use particle::{Particle, ParticleInstance, ParticleKind};
