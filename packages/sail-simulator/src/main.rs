//! main.rs — Headless simulator runner
//!
//! Loads `[boat]`, `[environment]` and `[physics]` from a TOML file (falling
//! back to the bundled config.toml), then steps the simulation with either a
//! fixed rudder or a simple proportional heading-hold controller fed from
//! `agent_state()`. The per-step JSON-lines log is opt-in via `--log`.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use sail_simulator::presets::{self, EnvironmentPreset};
use sail_simulator::{FoilLibrary, SimConfig, Simulation, StateLog, Vec2};

/// Proportional gain for `--target-heading` (degrees of rudder per degree of error)
const HEADING_GAIN: f64 = 0.25;
const MAX_RUDDER: f64 = 30.0;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "sail-sim", about = "Fixed-step 2D sailboat dynamics simulator")]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    /// Replace the config's [environment] with a built-in preset
    #[arg(long, value_enum)]
    preset: Option<EnvironmentPreset>,
    /// Directory holding `<foil>.csv` tables (default: analytic flat plate)
    #[arg(long)]
    foils: Option<String>,
    /// Number of steps to run
    #[arg(short = 'n', long, default_value = "600")]
    steps: u64,
    /// RNG seed for wind perturbation and gusts
    #[arg(long, default_value = "0")]
    seed: u64,
    /// Sail angle magnitude (degrees)
    #[arg(long, default_value = "30")]
    sail: i32,
    /// Fixed rudder angle (degrees), ignored with --target-heading
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    rudder: i32,
    /// Steer toward this heading with a proportional controller
    #[arg(long)]
    target_heading: Option<f64>,
    /// Initial heading (degrees, 0 = East, CCW positive)
    #[arg(long, default_value = "0")]
    heading: f64,
    /// Initial position
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    x: f64,
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    y: f64,
    /// Write one JSON line per step to this path
    #[arg(long)]
    log: Option<String>,
    /// Print agent state every N steps (0 = only at the end)
    #[arg(long, default_value = "0")]
    report_every: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sail_simulator=info,sail_sim=info".into()),
        )
        .init();

    let args = Args::parse();

    let config_str = match std::fs::read_to_string(&args.config) {
        Ok(s) => s,
        Err(e) => {
            warn!("Config {} unreadable ({e}), using bundled defaults", args.config);
            include_str!("../config.toml").to_string()
        }
    };
    let mut cfg: SimConfig = toml::from_str(&config_str)
        .with_context(|| format!("invalid config {}", args.config))?;
    if let Some(preset) = args.preset {
        cfg.environment = preset.to_config();
    }

    let foils = match &args.foils {
        Some(dir) => {
            let names = [
                cfg.boat.sail_foil.as_str(),
                cfg.boat.rudder_foil.as_str(),
                cfg.boat.keel_foil.as_str(),
            ];
            FoilLibrary::load_dir(dir, &names).with_context(|| format!("loading foils from {dir}"))?
        }
        None => presets::flat_plate_library(),
    };

    info!(
        "⛵ sail-sim starting — boat `{}`, environment `{}`, {} steps, seed {}",
        cfg.boat.name, cfg.environment.name, args.steps, args.seed
    );

    let mut sim = Simulation::seeded(cfg, &foils, args.heading, Vec2::new(args.x, args.y), args.seed)?;
    if let Some(path) = &args.log {
        sim = sim.with_state_log(StateLog::create(path)?);
        info!("📝 State log → {path}");
    }

    for i in 0..args.steps {
        let rudder = match args.target_heading {
            Some(target) => heading_hold(sim.agent_state().heading, target),
            None => args.rudder,
        };
        sim.step(args.sail, rudder);

        if args.report_every > 0 && (i + 1) % args.report_every == 0 {
            println!("{}", serde_json::to_string(&sim.agent_state())?);
        }
    }

    let snap = sim.state();
    info!(
        "🏁 t={:.1}s pos=({:.1}, {:.1}) speed={:.2} m/s heading={:.1}° wind={:.2} m/s{}",
        snap.time_s,
        snap.boat.position.x,
        snap.boat.position.y,
        snap.boat.speed(),
        snap.boat.heading,
        snap.wind.speed,
        if snap.gust.is_active() { " (gust)" } else { "" },
    );
    if sim.safeguard_hits() > 0 {
        warn!("Numerical safeguards fired on {} of {} steps", sim.safeguard_hits(), sim.steps());
    }
    if let Some(log) = sim.state_log() {
        if log.write_failures() > 0 {
            warn!("State log: {} records failed to write", log.write_failures());
        }
    }

    println!("{}", serde_json::to_string_pretty(&snap)?);
    Ok(())
}

/// Rudder command steering `heading` toward `target`.
/// Positive rudder turns clockwise, so a target to port needs negative rudder.
fn heading_hold(heading: f64, target: f64) -> i32 {
    let error = sail_simulator::sail_types::angle_diff(heading, target);
    (error * HEADING_GAIN).clamp(-MAX_RUDDER, MAX_RUDDER).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_hold_turns_toward_target() {
        // Target 20° CCW of heading → negative rudder (CCW turn)
        assert_eq!(heading_hold(0.0, 20.0), -5);
        assert_eq!(heading_hold(20.0, 0.0), 5);
        assert_eq!(heading_hold(350.0, 10.0), -5);
        assert_eq!(heading_hold(0.0, 180.0), -30);
        assert_eq!(heading_hold(90.0, 90.0), 0);
    }

    #[test]
    fn test_bundled_config_parses() {
        let cfg: SimConfig = toml::from_str(include_str!("../config.toml")).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.boat.sail_foil, presets::FLAT_PLATE);
    }
}
