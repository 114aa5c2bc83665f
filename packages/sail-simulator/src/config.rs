//! config.rs — Static boat, environment and physics-tuning parameters
//!
//! All three structs are immutable for a Simulation's lifetime. They are plain
//! serde types so any front-end can parse them; `from_toml` / `from_json` are
//! provided for the runner and tests. Every constructor path goes through
//! `validate()`, so a Simulation never sees an out-of-range value.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{Result, SimError};

// ── Boat ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoatConfig {
    /// Informational only
    #[serde(default)]
    pub name: String,
    /// Hull length (m)
    pub length: f64,
    /// Displacement (kg)
    pub mass: f64,
    /// Distance from the bow to the centre of mass (m)
    pub com_length: f64,
    /// Sail planform area (m²)
    pub sail_area: f64,
    pub sail_foil: String,
    /// Rudder blade area (m²)
    pub rudder_area: f64,
    pub rudder_foil: String,
    /// Keel geometry (m); span and chord are informational, area drives forces
    pub keel_span: f64,
    pub keel_chord: f64,
    /// Keel lateral area (m²). Zero disables the keel.
    pub keel_area: f64,
    /// Signed keel offset along the hull (m, forward of CoM positive)
    pub keel_distance_from_com: f64,
    pub keel_foil: String,
    /// Wetted hull frontal area (m²)
    pub hull_area: f64,
    pub hull_friction_coefficient: f64,
    pub hull_rotation_resistance: f64,
    /// Yaw moment of inertia (kg·m²)
    pub moment_of_inertia: f64,
    /// Yaw rate limit (deg/s)
    #[serde(default = "default_max_angular_speed")]
    pub max_angular_speed: f64,
}

fn default_max_angular_speed() -> f64 { 90.0 }

impl BoatConfig {
    /// Distance from the CoM back to the rudder post (m)
    pub fn rudder_lever_arm(&self) -> f64 {
        self.length - self.com_length
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let cfg: Self = parse_toml("boat", raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let cfg: Self = parse_json("boat", raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        positive("length", self.length)?;
        positive("mass", self.mass)?;
        positive("moment_of_inertia", self.moment_of_inertia)?;
        positive("max_angular_speed", self.max_angular_speed)?;
        non_negative("com_length", self.com_length)?;
        if self.com_length > self.length {
            return Err(SimError::config("com_length", "must not exceed the hull length"));
        }
        non_negative("sail_area", self.sail_area)?;
        non_negative("rudder_area", self.rudder_area)?;
        non_negative("keel_span", self.keel_span)?;
        non_negative("keel_chord", self.keel_chord)?;
        non_negative("keel_area", self.keel_area)?;
        finite("keel_distance_from_com", self.keel_distance_from_com)?;
        non_negative("hull_area", self.hull_area)?;
        non_negative("hull_friction_coefficient", self.hull_friction_coefficient)?;
        non_negative("hull_rotation_resistance", self.hull_rotation_resistance)?;
        named("sail_foil", &self.sail_foil)?;
        named("rudder_foil", &self.rudder_foil)?;
        named("keel_foil", &self.keel_foil)?;
        Ok(())
    }
}

// ── Environment ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Informational only
    #[serde(default)]
    pub name: String,
    /// Normal wind speed bounds (m/s)
    pub wind_min_speed: f64,
    pub wind_max_speed: f64,
    /// Max per-tick change, percent of the previous speed
    pub wind_max_delta_percent: f64,
    /// Direction the wind blows FROM (degrees)
    pub wind_direction: f64,
    /// Per-tick probability of a gust starting, [0, 1]
    pub wind_gust_probability: f64,
    /// Gust duration bounds (s)
    pub wind_gust_min_duration: f64,
    pub wind_gust_max_duration: f64,
    /// Gust speed bounds (m/s)
    pub wind_gust_min_speed: f64,
    pub wind_gust_max_speed: f64,
    pub wind_gust_max_delta_percent: f64,
    /// Water current (m/s, direction it flows TO)
    pub current_speed: f64,
    pub current_direction: f64,
}

impl EnvironmentConfig {
    pub fn from_toml(raw: &str) -> Result<Self> {
        let cfg: Self = parse_toml("environment", raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let cfg: Self = parse_json("environment", raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        ordered_bounds("wind_min_speed", self.wind_min_speed, "wind_max_speed", self.wind_max_speed)?;
        non_negative("wind_max_delta_percent", self.wind_max_delta_percent)?;
        finite("wind_direction", self.wind_direction)?;
        let p = self.wind_gust_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(SimError::config("wind_gust_probability", format!("must be within [0, 1], got {p}")));
        }
        ordered_bounds(
            "wind_gust_min_duration", self.wind_gust_min_duration,
            "wind_gust_max_duration", self.wind_gust_max_duration,
        )?;
        ordered_bounds(
            "wind_gust_min_speed", self.wind_gust_min_speed,
            "wind_gust_max_speed", self.wind_gust_max_speed,
        )?;
        non_negative("wind_gust_max_delta_percent", self.wind_gust_max_delta_percent)?;
        non_negative("current_speed", self.current_speed)?;
        finite("current_direction", self.current_direction)?;
        Ok(())
    }
}

// ── Physics tuning ────────────────────────────────────────────────────────────

/// Integrator and numerical-conditioning knobs.
///
/// The two force scales and the slip coefficient are empirical stability
/// parameters, not physical constants. Both scales should converge to 1.0
/// once the hydrodynamic model is balanced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fixed integration step (s)
    pub time_delta: f64,
    /// kg/m³
    pub air_density: f64,
    pub water_density: f64,
    /// Multiplier on every aerodynamic force
    pub air_force_scale: f64,
    /// Multiplier on every hydrodynamic force
    pub water_force_scale: f64,
    /// Fraction of the lateral sail force that reaches the hull as leeway push
    pub slip_force_coeff: f64,
    /// Ceiling on apparent wind/water speed fed into force formulas (m/s)
    pub max_relative_speed: f64,
    /// Half-width of the band around dead-downwind / head-to-wind in which
    /// the sail keeps its previous side (degrees)
    pub sail_side_deadband: f64,
    /// Largest per-step velocity change, as a fraction of the relative flow
    /// speed, that sail or water forces may apply before being cut back
    pub impulse_limit_ratio: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            time_delta: 0.1,
            air_density: 1.225,
            water_density: 1029.0,
            air_force_scale: 10.0,
            water_force_scale: 1.0,
            slip_force_coeff: 0.25,
            max_relative_speed: 50.0,
            sail_side_deadband: 5.0,
            impulse_limit_ratio: 0.5,
        }
    }
}

impl PhysicsConfig {
    pub fn from_toml(raw: &str) -> Result<Self> {
        let cfg: Self = parse_toml("physics", raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        positive("time_delta", self.time_delta)?;
        positive("air_density", self.air_density)?;
        positive("water_density", self.water_density)?;
        non_negative("air_force_scale", self.air_force_scale)?;
        non_negative("water_force_scale", self.water_force_scale)?;
        non_negative("slip_force_coeff", self.slip_force_coeff)?;
        positive("max_relative_speed", self.max_relative_speed)?;
        non_negative("sail_side_deadband", self.sail_side_deadband)?;
        if self.sail_side_deadband >= 90.0 {
            return Err(SimError::config("sail_side_deadband", "must be below 90 degrees"));
        }
        positive("impulse_limit_ratio", self.impulse_limit_ratio)?;
        if self.impulse_limit_ratio > 1.0 {
            return Err(SimError::config("impulse_limit_ratio", "must not exceed 1"));
        }
        Ok(())
    }
}

// ── Validation helpers ────────────────────────────────────────────────────────

fn parse_toml<T: DeserializeOwned>(what: &str, raw: &str) -> Result<T> {
    toml::from_str(raw).map_err(|e| SimError::config(what, e.to_string()))
}

fn parse_json<T: DeserializeOwned>(what: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| SimError::config(what, e.to_string()))
}

fn finite(field: &str, v: f64) -> Result<()> {
    if v.is_finite() { Ok(()) } else { Err(SimError::config(field, format!("must be finite, got {v}"))) }
}

fn non_negative(field: &str, v: f64) -> Result<()> {
    finite(field, v)?;
    if v < 0.0 {
        return Err(SimError::config(field, format!("must be ≥ 0, got {v}")));
    }
    Ok(())
}

fn positive(field: &str, v: f64) -> Result<()> {
    finite(field, v)?;
    if v <= 0.0 {
        return Err(SimError::config(field, format!("must be > 0, got {v}")));
    }
    Ok(())
}

fn ordered_bounds(min_field: &str, min: f64, max_field: &str, max: f64) -> Result<()> {
    non_negative(min_field, min)?;
    non_negative(max_field, max)?;
    if min > max {
        return Err(SimError::config(min_field, format!("must not exceed `{max_field}` ({min} > {max})")));
    }
    Ok(())
}

fn named(field: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SimError::config(field, "must name a foil"));
    }
    Ok(())
}
