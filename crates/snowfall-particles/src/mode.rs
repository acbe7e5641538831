//! Precipitation modes and the parameter table each one spawns particles from.

use std::fmt;
use std::str::FromStr;

use glam::{Vec3, Vec4};
use rand::Rng;

use crate::particle::{Particle, ParticleKind};

/// Probability that a particle spawned in [`PrecipitationMode::Mix`] is snow.
pub const MIX_SNOW_PROBABILITY: f64 = 0.6;

/// What falls from the sky.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PrecipitationMode {
    #[default]
    Snow,
    Rain,
    /// Each spawn is independently snow or rain.
    Mix,
}

impl PrecipitationMode {
    /// Next mode in the control cycle: Snow → Mix → Rain → Snow.
    pub fn next(self) -> Self {
        match self {
            Self::Snow => Self::Mix,
            Self::Mix => Self::Rain,
            Self::Rain => Self::Snow,
        }
    }

    /// Whether particles landing in this mode leave snow behind.
    pub fn accumulates(self) -> bool {
        matches!(self, Self::Snow | Self::Mix)
    }

    /// Pick the parameter set for one spawn.
    pub(crate) fn params(self, rng: &mut impl Rng) -> &'static ModeParams {
        match self {
            Self::Snow => &SNOW,
            Self::Rain => &RAIN,
            Self::Mix => {
                if rng.random_bool(MIX_SNOW_PROBABILITY) {
                    &SNOW
                } else {
                    &RAIN
                }
            }
        }
    }
}

impl fmt::Display for PrecipitationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Snow => "Snow",
            Self::Rain => "Rain",
            Self::Mix => "Mix",
        })
    }
}

/// Error returned when a mode name is not one of `snow`, `rain` or `mix`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown precipitation mode '{0}' (expected snow, rain or mix)")]
pub struct ParseModeError(pub String);

impl FromStr for PrecipitationMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snow" => Ok(Self::Snow),
            "rain" => Ok(Self::Rain),
            "mix" => Ok(Self::Mix),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// Respawn parameters for one kind of precipitation.
#[derive(Debug)]
pub(crate) struct ModeParams {
    pub kind: ParticleKind,
    /// Initial vertical velocity range, half-open.
    pub fall_speed: (f32, f32),
    pub rgb: [f32; 3],
    /// Alpha range, inclusive.
    pub alpha: (f32, f32),
    pub size_scale: f32,
    pub life_scale: f32,
    pub spins: bool,
}

const BASE_SIZE: (f32, f32) = (0.05, 0.2);
const BASE_LIFE: (f32, f32) = (8.0, 15.0);
const WEIGHT: (f32, f32) = (0.5, 1.5);
const SPIN: (f32, f32) = (-2.0, 2.0);

pub(crate) const SNOW: ModeParams = ModeParams {
    kind: ParticleKind::Snow,
    fall_speed: (-0.8, -0.6),
    rgb: [1.0, 1.0, 1.0],
    alpha: (0.7, 1.0),
    size_scale: 1.0,
    life_scale: 1.0,
    spins: true,
};

pub(crate) const RAIN: ModeParams = ModeParams {
    kind: ParticleKind::Rain,
    fall_speed: (-8.0, -6.0),
    rgb: [0.7, 0.8, 0.95],
    alpha: (0.9, 0.9),
    size_scale: 0.4,
    life_scale: 0.4,
    spins: false,
};

impl ModeParams {
    /// Produce a fresh particle at `position`.
    pub fn spawn(&self, rng: &mut impl Rng, position: Vec3) -> Particle {
        let fall = rng.random_range(self.fall_speed.0..self.fall_speed.1);
        let alpha = rng.random_range(self.alpha.0..=self.alpha.1);
        let size = rng.random_range(BASE_SIZE.0..BASE_SIZE.1) * self.size_scale;
        let life = rng.random_range(BASE_LIFE.0..BASE_LIFE.1) * self.life_scale;
        let rotation_speed = if self.spins {
            rng.random_range(SPIN.0..SPIN.1)
        } else {
            0.0
        };
        let weight = rng.random_range(WEIGHT.0..WEIGHT.1);

        Particle {
            position,
            velocity: Vec3::new(0.0, fall, 0.0),
            color: Vec4::new(self.rgb[0], self.rgb[1], self.rgb[2], alpha),
            size,
            life,
            rotation: 0.0,
            rotation_speed,
            weight,
            kind: self.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_parse_modes() {
        assert_eq!("snow".parse::<PrecipitationMode>(), Ok(PrecipitationMode::Snow));
        assert_eq!(" Rain ".parse::<PrecipitationMode>(), Ok(PrecipitationMode::Rain));
        assert_eq!("MIX".parse::<PrecipitationMode>(), Ok(PrecipitationMode::Mix));
    }

    #[test]
    fn test_parse_unknown_mode_fails() {
        let err = "hail".parse::<PrecipitationMode>().unwrap_err();
        assert_eq!(err, ParseModeError("hail".to_string()));
        assert!(err.to_string().contains("hail"));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for mode in [
            PrecipitationMode::Snow,
            PrecipitationMode::Rain,
            PrecipitationMode::Mix,
        ] {
            assert_eq!(mode.to_string().parse::<PrecipitationMode>(), Ok(mode));
        }
    }

    #[test]
    fn test_cycle_visits_every_mode() {
        let start = PrecipitationMode::Snow;
        assert_eq!(start.next(), PrecipitationMode::Mix);
        assert_eq!(start.next().next(), PrecipitationMode::Rain);
        assert_eq!(start.next().next().next(), start);
    }

    #[test]
    fn test_only_rain_does_not_accumulate() {
        assert!(PrecipitationMode::Snow.accumulates());
        assert!(PrecipitationMode::Mix.accumulates());
        assert!(!PrecipitationMode::Rain.accumulates());
    }

    #[test]
    fn test_rain_spawn_ranges() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..1_000 {
            let p = RAIN.spawn(&mut rng, Vec3::ZERO);
            assert!((-8.0..-6.0).contains(&p.velocity.y), "vy {}", p.velocity.y);
            assert!((3.2..6.0).contains(&p.life), "life {}", p.life);
            assert!((0.02..0.08).contains(&p.size), "size {}", p.size);
            assert_eq!(p.rotation_speed, 0.0);
            assert_eq!(p.color, Vec4::new(0.7, 0.8, 0.95, 0.9));
            assert_eq!(p.kind, ParticleKind::Rain);
        }
    }

    #[test]
    fn test_snow_spawn_ranges() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for _ in 0..1_000 {
            let p = SNOW.spawn(&mut rng, Vec3::ZERO);
            assert!((-2.0..-0.5).contains(&p.velocity.y), "vy {}", p.velocity.y);
            assert!((8.0..15.0).contains(&p.life), "life {}", p.life);
            assert!((0.7..=1.0).contains(&p.color.w));
            assert!((-2.0..2.0).contains(&p.rotation_speed));
            assert!((0.5..1.5).contains(&p.weight));
            assert_eq!(p.kind, ParticleKind::Snow);
        }
    }
}
