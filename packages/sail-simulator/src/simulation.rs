//! simulation.rs — Per-step force composition and integration
//!
//! One `Simulation` owns one Environment and one Boat. Each `step()`:
//!
//!   1. advances the environment one fixed tick
//!   2. apparent wind = true wind − boat velocity (speed-capped)
//!   3. resolves the sail side (always leeward) and computes the sail force,
//!      split into drive along the heading + scaled lateral slip
//!   4. apparent water velocity = boat velocity − current (speed-capped);
//!      the hull, keel and rudder see its negative as oncoming flow
//!   5. keel force + yaw torque (lever = keel_distance_from_com)
//!   6. rudder force + yaw torque (lever = length − com_length, aft)
//!   7. hull drag + rotational damping
//!   8. sums, zeroes non-finite terms, limits each impulse so it cannot
//!      overshoot its relative flow, clamps yaw acceleration, integrates
//!
//! Randomness comes only from the generator handed to `new`, so the same seed
//! and command sequence always replay the same trajectory.

use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use sail_types::{angle_diff, AgentState, BoatState, ForceBreakdown, SimSnapshot, StepRecord, Vec2};

use crate::boat::Boat;
use crate::config::{BoatConfig, EnvironmentConfig, PhysicsConfig};
use crate::environment::Environment;
use crate::error::{Result, SimError};
use crate::foil::{FoilLibrary, FoilTable};
use crate::forces::{self, Fluid};
use crate::state_log::StateLog;

/// Consecutive safeguard-hit steps before a warning is raised
const SAFEGUARD_STREAK_WARN: u32 = 50;

/// Everything a Simulation needs besides foils, pose and randomness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub boat: BoatConfig,
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub physics: PhysicsConfig,
}

impl SimConfig {
    pub fn validate(&self) -> Result<()> {
        self.boat.validate()?;
        self.environment.validate()?;
        self.physics.validate()
    }
}

pub struct Simulation<R = StdRng> {
    boat_config: BoatConfig,
    physics: PhysicsConfig,
    sail_foil: Arc<FoilTable>,
    rudder_foil: Arc<FoilTable>,
    keel_foil: Arc<FoilTable>,

    environment: Environment,
    boat: Boat,
    rng: R,
    state_log: Option<StateLog>,

    steps: u64,
    /// -1 = sail to port, +1 = sail to starboard
    sail_side: f64,
    sail_command: i32,
    rudder_command: i32,
    /// Apparent wind from the latest step, world frame
    felt_wind: Vec2,
    last_forces: ForceBreakdown,
    safeguard_hits: u64,
    safeguard_streak: u32,
}

impl Simulation<StdRng> {
    /// Convenience constructor with a seeded `StdRng`
    pub fn seeded(
        config: SimConfig,
        foils: &FoilLibrary,
        initial_heading: f64,
        initial_position: Vec2,
        seed: u64,
    ) -> Result<Self> {
        Self::new(config, foils, initial_heading, initial_position, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Simulation<R> {
    pub fn new(
        config: SimConfig,
        foils: &FoilLibrary,
        initial_heading: f64,
        initial_position: Vec2,
        rng: R,
    ) -> Result<Self> {
        config.validate()?;
        if !initial_heading.is_finite() {
            return Err(SimError::config("initial_heading", "must be finite"));
        }
        if !initial_position.is_finite() {
            return Err(SimError::config("initial_position", "must be finite"));
        }

        let SimConfig { boat: boat_config, environment, physics } = config;
        let sail_foil = foils.require("sail_foil", &boat_config.sail_foil)?;
        let rudder_foil = foils.require("rudder_foil", &boat_config.rudder_foil)?;
        let keel_foil = foils.require("keel_foil", &boat_config.keel_foil)?;

        info!(
            "⛵ Simulation: boat `{}` ({} kg) in `{}`, dt={}s, heading {:.0}°",
            boat_config.name, boat_config.mass, environment.name, physics.time_delta, initial_heading
        );

        let environment = Environment::new(environment);
        let boat = Boat::new(
            BoatState::at_rest(initial_position, initial_heading),
            boat_config.mass,
            boat_config.max_angular_speed,
        );
        let felt_wind = environment.wind().vector();

        Ok(Self {
            boat_config,
            physics,
            sail_foil,
            rudder_foil,
            keel_foil,
            environment,
            boat,
            rng,
            state_log: None,
            steps: 0,
            sail_side: 1.0,
            sail_command: 0,
            rudder_command: 0,
            felt_wind,
            last_forces: ForceBreakdown::default(),
            safeguard_hits: 0,
            safeguard_streak: 0,
        })
    }

    /// Attach the optional per-step JSON-lines log
    pub fn with_state_log(mut self, log: StateLog) -> Self {
        self.state_log = Some(log);
        self
    }

    fn air(&self) -> Fluid {
        Fluid { density: self.physics.air_density, scale: self.physics.air_force_scale }
    }

    fn water(&self) -> Fluid {
        Fluid { density: self.physics.water_density, scale: self.physics.water_force_scale }
    }

    /// Like `step`, for callers holding floating-point commands.
    /// Non-integral or non-finite angles are rejected and nothing changes.
    pub fn try_step(&mut self, sail_angle: f64, rudder_angle: f64) -> Result<ForceBreakdown> {
        let sail = integral_degrees("sail_angle", sail_angle)?;
        let rudder = integral_degrees("rudder_angle", rudder_angle)?;
        Ok(self.step(sail, rudder))
    }

    /// Advance one fixed timestep.
    ///
    /// `sail_angle` is a magnitude: the side is picked from the apparent wind.
    /// `rudder_angle` is the signed deflection (positive yaws clockwise).
    pub fn step(&mut self, sail_angle: i32, rudder_angle: i32) -> ForceBreakdown {
        let dt = self.physics.time_delta;
        let max_rel = self.physics.max_relative_speed;
        let (air, water) = (self.air(), self.water());
        let cfg = &self.boat_config;
        let mut f = ForceBreakdown::default();

        // 1. Environment tick
        let (wind, current) = self.environment.advance(dt, &mut self.rng);
        let state = *self.boat.state();
        let heading = state.heading;

        // 2. Apparent wind
        let (apparent_wind, clamped) =
            forces::sanitize_relative_velocity(wind.vector() - state.velocity, max_rel);
        f.wind_speed_clamped = clamped;

        // 3. Sail: leeward side, then lift/drag, then drive + slip
        if apparent_wind.normalized().is_some() {
            let relative = angle_diff(apparent_wind.direction_deg(), heading);
            self.sail_side = forces::resolve_sail_side(relative, self.sail_side, self.physics.sail_side_deadband);
        }
        let signed_sail = self.sail_side * f64::from(sail_angle).abs();
        let sail = forces::sail_force(apparent_wind, heading, signed_sail, &self.sail_foil, cfg.sail_area, air);
        let (drive, slip) = forces::split_drive_and_slip(sail.force, heading, self.physics.slip_force_coeff);
        f.sail = sail.force;
        f.sail_drive = drive;
        f.sail_slip = slip;
        f.sail_aoa = sail.angle_of_attack;

        // 4. Apparent water
        let (apparent_water, clamped) =
            forces::sanitize_relative_velocity(state.velocity - current.vector(), max_rel);
        f.water_speed_clamped = clamped;
        let water_flow = -apparent_water;

        // 5. Keel
        let (keel, keel_torque) = forces::keel_force(
            water_flow, heading, &self.keel_foil, cfg.keel_area, cfg.keel_distance_from_com, water,
        );
        f.keel = keel.force;
        f.keel_aoa = keel.angle_of_attack;

        // 6. Rudder
        let lever_arm = cfg.rudder_lever_arm();
        let rudder_deflection = f64::from(rudder_angle);
        let (rudder, rudder_torque) = forces::rudder_force(
            water_flow, heading, rudder_deflection, &self.rudder_foil, cfg.rudder_area, lever_arm, water,
        );
        f.rudder = rudder.force;
        f.rudder_aoa = rudder.angle_of_attack;

        // 7. Hull
        f.hull = forces::hull_resistance(water_flow, cfg.hull_area, cfg.hull_friction_coefficient, water);
        let damping = forces::rotational_damping(
            state.angular_velocity, lever_arm, cfg.hull_area, cfg.hull_rotation_resistance, water,
        );

        // 8. Net force / torque with non-finite terms dropped. Sail and water
        //    impulses are each limited against the flow they act on.
        let (aero, aero_dropped) = finite_sum(&[drive, slip]);
        let (hydro, hydro_dropped) = finite_sum(&[f.keel, f.rudder, f.hull]);
        f.non_finite_zeroed = aero_dropped || hydro_dropped;

        let ratio = self.physics.impulse_limit_ratio;
        let per_step = dt / cfg.mass;
        let (air_dv, air_limited) = forces::limit_impulse(aero.scale(per_step), -apparent_wind, ratio);
        let (water_dv, water_limited) = forces::limit_impulse(hydro.scale(per_step), apparent_water, ratio);
        f.impulse_limited = air_limited || water_limited;
        let total = if f.impulse_limited { (air_dv + water_dv).scale(1.0 / per_step) } else { aero + hydro };

        let torques = [rudder_torque, keel_torque, damping];
        if torques.iter().any(|t| !t.is_finite()) {
            f.non_finite_zeroed = true;
        }
        [f.rudder_torque, f.keel_torque, f.damping_torque] =
            torques.map(|t| if t.is_finite() { t } else { 0.0 });
        f.net_torque = f.rudder_torque + f.keel_torque + f.damping_torque;
        f.total = total;

        f.angular_accel_raw = (f.net_torque / cfg.moment_of_inertia).to_degrees();
        self.boat.apply_force(total);
        f.angular_accel = self.boat.apply_angular_acceleration(f.angular_accel_raw);
        f.angular_accel_clamped = f.angular_accel != f.angular_accel_raw;

        // 9. Commanded angles become part of the state
        self.boat.set_sail_angle(signed_sail);
        self.boat.set_rudder_angle(rudder_deflection);
        self.boat.integrate(dt);

        self.sail_command = sail_angle;
        self.rudder_command = rudder_angle;
        self.felt_wind = apparent_wind;
        self.last_forces = f;
        self.track_safeguards(&f);

        debug!(
            "step {} | aoa sail={:.1}° keel={:.1}° rudder={:.1}° | F=({:.2}, {:.2}) τ={:.3} α={:.1}",
            self.steps, f.sail_aoa, f.keel_aoa, f.rudder_aoa, f.total.x, f.total.y, f.net_torque, f.angular_accel
        );

        if self.state_log.is_some() {
            let record = StepRecord {
                step: self.steps,
                time_s: self.time_s_after(self.steps + 1),
                sail_command: sail_angle,
                rudder_command: rudder_angle,
                state: self.snapshot(self.steps + 1),
                forces: f,
            };
            if let Some(log) = self.state_log.as_mut() {
                log.append(&record);
            }
        }
        self.steps += 1;
        f
    }

    fn track_safeguards(&mut self, f: &ForceBreakdown) {
        if !f.any_safeguard() {
            self.safeguard_streak = 0;
            return;
        }
        self.safeguard_hits += 1;
        self.safeguard_streak += 1;
        debug!(
            "Safeguard at step {}: accel_clamp={} wind_clamp={} water_clamp={} non_finite={} impulse={}",
            self.steps, f.angular_accel_clamped, f.wind_speed_clamped, f.water_speed_clamped, f.non_finite_zeroed,
            f.impulse_limited
        );
        if self.safeguard_streak == SAFEGUARD_STREAK_WARN {
            warn!(
                "⚠ Safeguards fired {} steps in a row (step {}): physical configuration looks unstable",
                SAFEGUARD_STREAK_WARN, self.steps
            );
        }
    }

    fn time_s_after(&self, steps: u64) -> f64 {
        steps as f64 * self.physics.time_delta
    }

    fn snapshot(&self, steps: u64) -> SimSnapshot {
        let wind = self.environment.wind();
        let current = self.environment.current();
        let boat = *self.boat.state();
        SimSnapshot {
            step: steps,
            time_s: self.time_s_after(steps),
            wind,
            wind_vector: wind.vector(),
            gust: self.environment.gust(),
            current,
            current_vector: current.vector(),
            boat,
            boat_course: boat.course(),
            sail_command: self.sail_command,
            rudder_command: self.rudder_command,
        }
    }

    // ── Read-only views ───────────────────────────────────────────────────────

    /// Full state: environment, boat and last commands
    pub fn state(&self) -> SimSnapshot {
        self.snapshot(self.steps)
    }

    /// Reduced view for control algorithms: heading, felt wind, position
    pub fn agent_state(&self) -> AgentState {
        let boat = self.boat.state();
        AgentState {
            heading: boat.heading,
            wind_speed: self.felt_wind.norm(),
            wind_direction: angle_diff(self.felt_wind.direction_deg(), boat.heading),
            position: boat.position,
        }
    }

    pub fn boat_state(&self) -> &BoatState { self.boat.state() }

    pub fn last_forces(&self) -> &ForceBreakdown { &self.last_forces }

    pub fn environment(&self) -> &Environment { &self.environment }

    pub fn boat_config(&self) -> &BoatConfig { &self.boat_config }

    pub fn physics(&self) -> &PhysicsConfig { &self.physics }

    pub fn steps(&self) -> u64 { self.steps }

    /// Steps on which at least one numerical safeguard fired
    pub fn safeguard_hits(&self) -> u64 { self.safeguard_hits }

    pub fn state_log(&self) -> Option<&StateLog> { self.state_log.as_ref() }
}

/// Sum of the finite terms, and whether any term had to be dropped
fn finite_sum(terms: &[Vec2]) -> (Vec2, bool) {
    terms.iter().fold((Vec2::zero(), false), |(acc, dropped), t| {
        if t.is_finite() { (acc + *t, dropped) } else { (acc, true) }
    })
}

fn integral_degrees(field: &str, value: f64) -> Result<i32> {
    if !value.is_finite() {
        return Err(SimError::InvalidInput(format!("{field} must be finite, got {value}")));
    }
    if value.fract() != 0.0 {
        return Err(SimError::InvalidInput(format!("{field} must be whole degrees, got {value}")));
    }
    if value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return Err(SimError::InvalidInput(format!("{field} out of range: {value}")));
    }
    Ok(value as i32)
}
