//! Weather controls: key bindings, edge-triggered key tracking and the
//! controller that applies actions to a [`WinterScene`].

use std::collections::BTreeSet;
use std::num::ParseIntError;
use std::str::FromStr;

use glam::Vec3;
use tracing::info;

use crate::scene::WinterScene;

pub const MIN_INTENSITY: f32 = 0.05;
pub const MAX_INTENSITY: f32 = 10.0;
pub const MIN_RATE: f32 = 10.0;
pub const MAX_RATE: f32 = 5000.0;
/// Ceiling for the doubling shortcut, above the regular [`MAX_RATE`].
pub const MAX_BURST_RATE: f32 = 20_000.0;
pub const MAX_MELT_SPEED: f32 = 5.0;

/// Something the user can do to the weather while the scene runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WeatherAction {
    TogglePause,
    CycleMode,
    IntensityDown,
    IntensityUp,
    WindLeft,
    WindRight,
    RateUp,
    RateDown,
    RateDouble,
    RateHalve,
    MeltFaster,
    MeltSlower,
    ToggleStats,
}

impl WeatherAction {
    pub const ALL: [WeatherAction; 13] = [
        WeatherAction::TogglePause,
        WeatherAction::CycleMode,
        WeatherAction::IntensityDown,
        WeatherAction::IntensityUp,
        WeatherAction::WindLeft,
        WeatherAction::WindRight,
        WeatherAction::RateUp,
        WeatherAction::RateDown,
        WeatherAction::RateDouble,
        WeatherAction::RateHalve,
        WeatherAction::MeltFaster,
        WeatherAction::MeltSlower,
        WeatherAction::ToggleStats,
    ];

    /// Default binding for a key, case-insensitive.
    pub fn for_key(key: char) -> Option<Self> {
        let action = match key.to_ascii_uppercase() {
            'P' => Self::TogglePause,
            'R' => Self::CycleMode,
            '[' => Self::IntensityDown,
            ']' => Self::IntensityUp,
            'J' => Self::WindLeft,
            'L' => Self::WindRight,
            'I' => Self::RateUp,
            'K' => Self::RateDown,
            'Z' => Self::RateDouble,
            'X' => Self::RateHalve,
            'M' => Self::MeltFaster,
            'N' => Self::MeltSlower,
            'H' => Self::ToggleStats,
            _ => return None,
        };
        Some(action)
    }

    pub fn key(self) -> char {
        match self {
            Self::TogglePause => 'P',
            Self::CycleMode => 'R',
            Self::IntensityDown => '[',
            Self::IntensityUp => ']',
            Self::WindLeft => 'J',
            Self::WindRight => 'L',
            Self::RateUp => 'I',
            Self::RateDown => 'K',
            Self::RateDouble => 'Z',
            Self::RateHalve => 'X',
            Self::MeltFaster => 'M',
            Self::MeltSlower => 'N',
            Self::ToggleStats => 'H',
        }
    }
}

/// Turns held keys into one-shot presses.
///
/// Feed every key transition to [`process`](Self::process), read
/// [`actions`](Self::actions) once per frame, then call
/// [`clear_transients`](Self::clear_transients).
#[derive(Debug, Clone, Default)]
pub struct KeyLatch {
    held: BTreeSet<char>,
    just_pressed: BTreeSet<char>,
}

impl KeyLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// A press only registers on the transition from up to down.
    pub fn process(&mut self, key: char, pressed: bool) {
        let key = key.to_ascii_uppercase();
        if pressed {
            if self.held.insert(key) {
                self.just_pressed.insert(key);
            }
        } else {
            self.held.remove(&key);
        }
    }

    pub fn is_held(&self, key: char) -> bool {
        self.held.contains(&key.to_ascii_uppercase())
    }

    pub fn just_pressed(&self, key: char) -> bool {
        self.just_pressed.contains(&key.to_ascii_uppercase())
    }

    /// Actions bound to the keys pressed this frame.
    pub fn actions(&self) -> Vec<WeatherAction> {
        self.just_pressed
            .iter()
            .filter_map(|&key| WeatherAction::for_key(key))
            .collect()
    }

    pub fn clear_transients(&mut self) {
        self.just_pressed.clear();
    }
}

/// Applies [`WeatherAction`]s to the scene it is handed.
#[derive(Debug, Clone)]
pub struct WeatherController {
    show_stats: bool,
}

impl Default for WeatherController {
    fn default() -> Self {
        Self::new(true)
    }
}

impl WeatherController {
    pub fn new(show_stats: bool) -> Self {
        Self { show_stats }
    }

    pub fn show_stats(&self) -> bool {
        self.show_stats
    }

    pub fn apply(&mut self, action: WeatherAction, scene: &mut WinterScene) {
        let engine = scene.precipitation_mut();
        match action {
            WeatherAction::TogglePause => {
                let paused = engine.toggle_pause();
                info!(paused, "Precipitation pause toggled");
            }
            WeatherAction::CycleMode => {
                let mode = engine.mode().next();
                engine.set_mode(mode);
                info!(%mode, "Precipitation mode");
            }
            WeatherAction::IntensityDown | WeatherAction::IntensityUp => {
                let intensity = if action == WeatherAction::IntensityUp {
                    (engine.intensity() * 1.3).min(MAX_INTENSITY)
                } else {
                    (engine.intensity() * 0.7).max(MIN_INTENSITY)
                };
                engine.set_intensity(intensity);
                info!(intensity, "Precipitation intensity");
            }
            WeatherAction::WindLeft | WeatherAction::WindRight => {
                let dx = if action == WeatherAction::WindRight { 1.0 } else { -1.0 };
                engine.add_wind(Vec3::new(dx, 0.0, 0.0));
                let wind = engine.wind();
                info!(wind.x = wind.x, "Wind");
            }
            WeatherAction::RateUp
            | WeatherAction::RateDown
            | WeatherAction::RateDouble
            | WeatherAction::RateHalve => {
                let current = engine.particles_per_second();
                let rate = match action {
                    WeatherAction::RateUp => (current * 1.5).min(MAX_RATE),
                    WeatherAction::RateDown => (current * 0.6).max(MIN_RATE),
                    WeatherAction::RateDouble => (current * 2.0).min(MAX_BURST_RATE),
                    _ => (current * 0.5).max(MIN_RATE),
                };
                engine.set_particles_per_second(rate);
                info!(rate, "Particles per second");
            }
            WeatherAction::MeltFaster | WeatherAction::MeltSlower => {
                let mut terrain = scene.terrain_mut();
                let speed = if action == WeatherAction::MeltFaster {
                    (terrain.melt_speed() * 1.5).min(MAX_MELT_SPEED)
                } else {
                    (terrain.melt_speed() * 0.6).max(0.0)
                };
                terrain.set_melt_speed(speed);
                info!(speed, "Melt speed");
            }
            WeatherAction::ToggleStats => {
                self.show_stats = !self.show_stats;
                info!(show = self.show_stats, "Stats display toggled");
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("expected KEY@FRAME, got '{0}'")]
    MissingFrame(String),
    #[error("no weather action bound to '{0}'")]
    UnknownKey(String),
    #[error("invalid frame in '{input}'")]
    InvalidFrame {
        input: String,
        #[source]
        source: ParseIntError,
    },
}

/// A key press scheduled for a given frame, written `KEY@FRAME`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScriptedPress {
    pub frame: u64,
    pub action: WeatherAction,
}

impl FromStr for ScriptedPress {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, frame) = s
            .trim()
            .rsplit_once('@')
            .ok_or_else(|| ScriptError::MissingFrame(s.to_owned()))?;

        let mut chars = key.chars();
        let action = match (chars.next(), chars.next()) {
            (Some(c), None) => WeatherAction::for_key(c),
            _ => None,
        }
        .ok_or_else(|| ScriptError::UnknownKey(key.to_owned()))?;

        let frame = frame.parse().map_err(|source| ScriptError::InvalidFrame {
            input: s.to_owned(),
            source,
        })?;

        Ok(Self { frame, action })
    }
}

/// Parse `KEY@FRAME` strings and order them by frame.
pub fn parse_script<S: AsRef<str>>(presses: &[S]) -> Result<Vec<ScriptedPress>, ScriptError> {
    let mut script = presses
        .iter()
        .map(|s| s.as_ref().parse())
        .collect::<Result<Vec<ScriptedPress>, _>>()?;
    script.sort_by_key(|press| press.frame);
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use snowfall_config::Config;
    use snowfall_particles::PrecipitationMode;

    fn scene() -> WinterScene {
        let mut config = Config::default();
        config.precipitation.max_particles = 64;
        config.terrain.resolution = 8;
        config.vegetation.grass_count = 4;
        config.vegetation.tree_count = 2;
        config.vegetation.tree_model.clear();
        WinterScene::from_config(&config).unwrap()
    }

    #[test]
    fn test_every_action_has_a_key() {
        for action in WeatherAction::ALL {
            assert_eq!(WeatherAction::for_key(action.key()), Some(action));
        }
        assert_eq!(WeatherAction::for_key('r'), Some(WeatherAction::CycleMode));
        assert_eq!(WeatherAction::for_key('q'), None);
    }

    #[test]
    fn test_latch_fires_once_per_press() {
        let mut latch = KeyLatch::new();
        latch.process('p', true);
        assert!(latch.just_pressed('P'));
        assert_eq!(latch.actions(), vec![WeatherAction::TogglePause]);
        latch.clear_transients();

        // Still held: no new press.
        latch.process('P', true);
        assert!(latch.is_held('p'));
        assert!(latch.actions().is_empty());

        latch.process('P', false);
        latch.process('P', true);
        assert_eq!(latch.actions(), vec![WeatherAction::TogglePause]);
    }

    #[test]
    fn test_unbound_keys_produce_no_actions() {
        let mut latch = KeyLatch::new();
        latch.process('W', true);
        assert!(latch.just_pressed('w'));
        assert!(latch.actions().is_empty());
    }

    #[test]
    fn test_pause_and_mode_cycle() {
        let mut scene = scene();
        let mut controller = WeatherController::default();

        controller.apply(WeatherAction::TogglePause, &mut scene);
        assert!(scene.precipitation().is_paused());
        controller.apply(WeatherAction::TogglePause, &mut scene);
        assert!(!scene.precipitation().is_paused());

        controller.apply(WeatherAction::CycleMode, &mut scene);
        assert_eq!(scene.precipitation().mode(), PrecipitationMode::Rain);
        controller.apply(WeatherAction::CycleMode, &mut scene);
        assert_eq!(scene.precipitation().mode(), PrecipitationMode::Mix);
        controller.apply(WeatherAction::CycleMode, &mut scene);
        assert_eq!(scene.precipitation().mode(), PrecipitationMode::Snow);
    }

    #[test]
    fn test_intensity_is_clamped() {
        let mut scene = scene();
        let mut controller = WeatherController::default();

        for _ in 0..40 {
            controller.apply(WeatherAction::IntensityUp, &mut scene);
        }
        assert_eq!(scene.precipitation().intensity(), MAX_INTENSITY);

        for _ in 0..60 {
            controller.apply(WeatherAction::IntensityDown, &mut scene);
        }
        assert_eq!(scene.precipitation().intensity(), MIN_INTENSITY);
    }

    #[test]
    fn test_wind_steps_along_x() {
        let mut scene = scene();
        let mut controller = WeatherController::default();
        let before = scene.precipitation().wind();

        controller.apply(WeatherAction::WindRight, &mut scene);
        controller.apply(WeatherAction::WindRight, &mut scene);
        controller.apply(WeatherAction::WindLeft, &mut scene);

        assert_eq!(scene.precipitation().wind(), before + Vec3::X);
    }

    #[test]
    fn test_rate_limits() {
        let mut scene = scene();
        let mut controller = WeatherController::default();

        for _ in 0..20 {
            controller.apply(WeatherAction::RateUp, &mut scene);
        }
        assert_eq!(scene.precipitation().particles_per_second(), MAX_RATE);

        for _ in 0..20 {
            controller.apply(WeatherAction::RateDouble, &mut scene);
        }
        assert_eq!(scene.precipitation().particles_per_second(), MAX_BURST_RATE);

        for _ in 0..40 {
            controller.apply(WeatherAction::RateHalve, &mut scene);
        }
        assert_eq!(scene.precipitation().particles_per_second(), MIN_RATE);

        controller.apply(WeatherAction::RateDown, &mut scene);
        assert_eq!(scene.precipitation().particles_per_second(), MIN_RATE);
    }

    #[test]
    fn test_melt_speed_limits() {
        let mut scene = scene();
        let mut controller = WeatherController::default();

        controller.apply(WeatherAction::MeltFaster, &mut scene);
        assert!((scene.terrain().melt_speed() - 0.075).abs() < 1e-6);

        for _ in 0..30 {
            controller.apply(WeatherAction::MeltFaster, &mut scene);
        }
        assert_eq!(scene.terrain().melt_speed(), MAX_MELT_SPEED);

        for _ in 0..400 {
            controller.apply(WeatherAction::MeltSlower, &mut scene);
        }
        assert!(scene.terrain().melt_speed() >= 0.0);
        assert!(scene.terrain().melt_speed() < 1e-6);
    }

    #[test]
    fn test_toggle_stats() {
        let mut scene = scene();
        let mut controller = WeatherController::new(false);
        controller.apply(WeatherAction::ToggleStats, &mut scene);
        assert!(controller.show_stats());
    }

    #[test]
    fn test_scripted_press_parsing() {
        let press: ScriptedPress = "r@120".parse().unwrap();
        assert_eq!(press.frame, 120);
        assert_eq!(press.action, WeatherAction::CycleMode);

        let bracket: ScriptedPress = "]@3".parse().unwrap();
        assert_eq!(bracket.action, WeatherAction::IntensityUp);

        assert!(matches!(
            "R".parse::<ScriptedPress>(),
            Err(ScriptError::MissingFrame(_))
        ));
        assert!(matches!(
            "Q@5".parse::<ScriptedPress>(),
            Err(ScriptError::UnknownKey(_))
        ));
        assert!(matches!(
            "PP@5".parse::<ScriptedPress>(),
            Err(ScriptError::UnknownKey(_))
        ));
        assert!(matches!(
            "P@soon".parse::<ScriptedPress>(),
            Err(ScriptError::InvalidFrame { .. })
        ));
    }

    #[test]
    fn test_script_is_sorted_by_frame() {
        let script = parse_script(&["H@30", "P@10", "R@20"]).unwrap();
        let frames: Vec<u64> = script.iter().map(|p| p.frame).collect();
        assert_eq!(frames, vec![10, 20, 30]);
        assert!(parse_script(&["P@1", "bogus"]).is_err());
    }
}
