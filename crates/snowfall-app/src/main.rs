//! `snowfall`: runs the winter scene headless for a fixed number of frames.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI
//! flags. Weather changes can be scripted with `--press KEY@FRAME`.

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing::{debug, error, info};

use snowfall_app::{
    AppError, FixedStep, FrameStats, KeyLatch, WeatherController, WinterScene, parse_script,
};
use snowfall_config::{CliArgs, Config, default_config_dir};
use snowfall_render::{UniformRecorder, UniformSource};

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("snowfall: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<(), AppError> {
    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);

    let mut config = Config::load_or_create(&config_dir)?;
    config.apply_cli_overrides(args);

    let log_dir = config_dir.join("logs");
    snowfall_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    let script = parse_script(&args.presses)?;
    let dt = config.simulation.fixed_dt;
    let mut fixed_step = FixedStep::new(f64::from(dt)).ok_or(AppError::InvalidTimestep(dt))?;

    let mut scene = WinterScene::from_config(&config)?;
    let mut controller = WeatherController::new(config.debug.show_stats);
    let mut latch = KeyLatch::new();
    let mut uniforms = UniformRecorder::new();

    let frames = config.simulation.frames;
    let stats_interval = config.debug.stats_interval.max(1);
    let mut pending = script.into_iter().peekable();
    let mut frame_time = 0.0;

    info!(frames, dt, presses = args.presses.len(), "Simulation started");

    for frame in 0..frames {
        let started = Instant::now();

        let mut pressed = Vec::new();
        while let Some(press) = pending.next_if(|p| p.frame <= frame) {
            pressed.push(press.action.key());
        }
        for &key in &pressed {
            latch.process(key, true);
        }
        for action in latch.actions() {
            controller.apply(action, &mut scene);
        }
        latch.clear_transients();
        for &key in &pressed {
            latch.process(key, false);
        }

        fixed_step.tick(
            f64::from(dt),
            |step_dt, _| scene.step(step_dt as f32),
            |_| {},
        );
        scene.push_uniforms(&mut uniforms);

        frame_time = started.elapsed().as_secs_f32();
        if controller.show_stats() && (frame + 1) % stats_interval == 0 {
            let stats = scene.stats();
            info!(
                frame = frame + 1,
                covered = stats.covered_cells,
                mode = %stats.mode,
                intensity = stats.intensity,
                paused = stats.paused,
                "{}",
                FrameStats::new(&stats, frame_time)
            );
        }
    }

    debug!(uniforms = uniforms.len(), "Shader parameters published");

    let stats = scene.stats();
    info!(
        updates = fixed_step.update_count(),
        sim_time = fixed_step.total_sim_time(),
        "Simulation finished"
    );
    println!("{}", FrameStats::new(&stats, frame_time));
    println!(
        "mode: {}  intensity: {:.2}  covered cells: {}  visible grass: {}  snow caps: {}",
        stats.mode,
        stats.intensity,
        stats.covered_cells,
        scene.visible_grass().len(),
        scene.snow_caps().len()
    );
    Ok(())
}
