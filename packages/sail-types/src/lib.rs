//! # sail-types
//!
//! Shared data structures for the sailboat playground simulator.
//!
//! These types are used by:
//! - `sail-simulator`: the physics core produces and consumes them every step
//! - state-log consumers (trajectory viewers, controller test harnesses): every
//!   JSON line written by the simulator deserializes into a [`StepRecord`]
//!
//! ## Coordinate Conventions
//!
//! - **World frame**: 2D Cartesian, X = East, Y = North, meters
//! - **Angles**: degrees, trigonometric convention (0° = East, 90° = North,
//!   positive rotation counter-clockwise)
//! - **Wind direction**: "blows from" — a 90° wind comes from the North
//! - **Current direction**: "flows to" — a 90° current carries water North
//!
//! Headings are always kept in [0, 360). Never subtract two angles directly:
//! use [`angle_diff`] so that 359° vs 1° is a 2° arc, not 358°.

use serde::{Deserialize, Serialize};

// ── Angle helpers ─────────────────────────────────────────────────────────────

/// Wrap any angle into [0, 360)
pub fn wrap_360(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360.0
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Wrap any angle into [-180, 180)
pub fn wrap_180(deg: f64) -> f64 {
    let wrapped = wrap_360(deg + 180.0) - 180.0;
    if wrapped >= 180.0 { wrapped - 360.0 } else { wrapped }
}

/// Shortest signed arc from `from` to `to`, degrees in [-180, 180).
///
/// Positive = `to` lies counter-clockwise of `from`.
pub fn angle_diff(to: f64, from: f64) -> f64 {
    wrap_180(to - from)
}

// ── 2D Vector ─────────────────────────────────────────────────────────────────

/// 2D vector in the world frame (meters, m/s or newtons depending on use)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,  // East
    pub y: f64,  // North
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self { Self { x, y } }
    pub const fn zero() -> Self { Self { x: 0.0, y: 0.0 } }

    /// Vector of length `magnitude` pointing toward `angle_deg`
    pub fn from_polar(magnitude: f64, angle_deg: f64) -> Self {
        let rad = angle_deg.to_radians();
        Self::new(magnitude * rad.cos(), magnitude * rad.sin())
    }

    /// Unit vector pointing toward `angle_deg`
    pub fn unit(angle_deg: f64) -> Self { Self::from_polar(1.0, angle_deg) }

    pub fn norm(&self) -> f64 { self.x.hypot(self.y) }

    pub fn dot(&self, other: &Vec2) -> f64 { self.x * other.x + self.y * other.y }

    /// Z component of the 3D cross product (self × other).
    /// For a lever arm and a force this is the yaw torque, CCW positive.
    pub fn cross(&self, other: &Vec2) -> f64 { self.x * other.y - self.y * other.x }

    pub fn scale(&self, s: f64) -> Vec2 { Vec2::new(self.x * s, self.y * s) }

    /// Rotated 90° counter-clockwise
    pub fn perp_ccw(&self) -> Vec2 { Vec2::new(-self.y, self.x) }

    /// Direction this vector points toward, degrees in [0, 360).
    /// The zero vector reports 0°.
    pub fn direction_deg(&self) -> f64 {
        wrap_360(self.y.atan2(self.x).to_degrees())
    }

    pub fn normalized(&self) -> Option<Vec2> {
        let n = self.norm();
        if n < 1e-12 || !n.is_finite() { None } else { Some(self.scale(1.0 / n)) }
    }

    pub fn is_finite(&self) -> bool { self.x.is_finite() && self.y.is_finite() }

    /// Component of `self` along the unit vector `axis`, as a vector
    pub fn project_on_unit(&self, axis: &Vec2) -> Vec2 { axis.scale(self.dot(axis)) }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;
    fn add(self, o: Vec2) -> Vec2 { Vec2::new(self.x + o.x, self.y + o.y) }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, o: Vec2) { self.x += o.x; self.y += o.y; }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, o: Vec2) -> Vec2 { Vec2::new(self.x - o.x, self.y - o.y) }
}

impl std::ops::Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 { Vec2::new(-self.x, -self.y) }
}

impl std::ops::Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, s: f64) -> Vec2 { self.scale(s) }
}

// ── Boat kinematic state ──────────────────────────────────────────────────────

/// Full kinematic/dynamic state of the vessel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoatState {
    /// CoM position in the world frame (meters)
    pub position: Vec2,
    /// Velocity over ground (m/s)
    pub velocity: Vec2,
    /// Hull heading, degrees in [0, 360)
    pub heading: f64,
    /// Yaw rate, deg/s (CCW positive)
    pub angular_velocity: f64,
    /// Signed sail angle relative to the hull centreline, degrees
    pub sail_angle: f64,
    /// Rudder deflection relative to the hull centreline, degrees
    pub rudder_angle: f64,
}

impl BoatState {
    pub fn at_rest(position: Vec2, heading: f64) -> Self {
        Self {
            position,
            velocity: Vec2::zero(),
            heading: wrap_360(heading),
            angular_velocity: 0.0,
            sail_angle: 0.0,
            rudder_angle: 0.0,
        }
    }

    /// Unit vector along the hull, bow direction
    pub fn forward(&self) -> Vec2 { Vec2::unit(self.heading) }

    /// Speed over ground (m/s)
    pub fn speed(&self) -> f64 { self.velocity.norm() }

    /// Course over ground, degrees in [0, 360)
    pub fn course(&self) -> f64 { self.velocity.direction_deg() }
}

// ── Environment snapshot ──────────────────────────────────────────────────────

/// Stochastic gust process phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GustState {
    /// Normal wind: bounded by wind_min/max_speed
    Calm,
    /// Gust episode in progress; `remaining_s` counts down by the timestep
    Gust { remaining_s: f64 },
}

impl GustState {
    pub fn is_active(&self) -> bool { matches!(self, GustState::Gust { .. }) }
}

/// One tick of true wind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindSample {
    /// True wind speed (m/s), always ≥ 0
    pub speed: f64,
    /// Direction the wind blows FROM, degrees
    pub direction: f64,
    /// Whether this speed was drawn under the gust bounds
    pub gusting: bool,
}

impl WindSample {
    /// True wind velocity vector — points opposite the "blows from" direction
    pub fn vector(&self) -> Vec2 {
        Vec2::from_polar(self.speed, self.direction + 180.0)
    }
}

/// Constant water current.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentVector {
    /// Current speed (m/s), ≥ 0
    pub speed: f64,
    /// Direction the water flows TO, degrees
    pub direction: f64,
}

impl CurrentVector {
    pub fn vector(&self) -> Vec2 { Vec2::from_polar(self.speed, self.direction) }
}

// ── Simulation views ──────────────────────────────────────────────────────────

/// Full simulation snapshot (the `state` view).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimSnapshot {
    /// Completed steps
    pub step: u64,
    /// Simulated seconds since start
    pub time_s: f64,
    pub wind: WindSample,
    /// True wind velocity vector (m/s)
    pub wind_vector: Vec2,
    pub gust: GustState,
    pub current: CurrentVector,
    /// Current velocity vector (m/s)
    pub current_vector: Vec2,
    pub boat: BoatState,
    /// Course over ground, degrees
    pub boat_course: f64,
    /// Last sail command as received (magnitude/target, degrees)
    pub sail_command: i32,
    /// Last rudder command as received, degrees
    pub rudder_command: i32,
}

/// Reduced view a control algorithm may legitimately consume.
///
/// Wind is "felt" wind: apparent wind in the boat's frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// Hull heading, degrees in [0, 360)
    pub heading: f64,
    /// Apparent wind speed (m/s)
    pub wind_speed: f64,
    /// Direction the apparent wind moves toward, relative to the heading,
    /// degrees in [-180, 180). Positive = blowing toward port.
    pub wind_direction: f64,
    pub position: Vec2,
}

// ── Force breakdown (state log payload) ───────────────────────────────────────

/// Every force and torque computed during one step, plus safeguard flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ForceBreakdown {
    /// Raw aerodynamic force on the sail (N)
    pub sail: Vec2,
    /// Sail force component along the heading (N)
    pub sail_drive: Vec2,
    /// Lateral sail force after the slip coefficient (N)
    pub sail_slip: Vec2,
    pub keel: Vec2,
    pub rudder: Vec2,
    pub hull: Vec2,
    /// Net force handed to the integrator (N)
    pub total: Vec2,
    /// Angles of attack seen by each foil, degrees
    pub sail_aoa: f64,
    pub keel_aoa: f64,
    pub rudder_aoa: f64,
    /// Yaw torques (N·m, CCW positive)
    pub rudder_torque: f64,
    pub keel_torque: f64,
    pub damping_torque: f64,
    pub net_torque: f64,
    /// Angular acceleration before / after the ±720 deg/s² clamp
    pub angular_accel_raw: f64,
    pub angular_accel: f64,
    /// Safeguards that fired this step
    pub angular_accel_clamped: bool,
    pub wind_speed_clamped: bool,
    pub water_speed_clamped: bool,
    pub non_finite_zeroed: bool,
    /// Sail or hydrodynamic impulse shortened to keep it from overshooting
    /// the relative flow it acts on
    #[serde(default)]
    pub impulse_limited: bool,
}

impl ForceBreakdown {
    /// True when any numerical safeguard altered this step
    pub fn any_safeguard(&self) -> bool {
        self.angular_accel_clamped
            || self.wind_speed_clamped
            || self.water_speed_clamped
            || self.non_finite_zeroed
            || self.impulse_limited
    }
}

/// One line of the append-only state log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Index of the step this record describes (0-based)
    pub step: u64,
    pub time_s: f64,
    pub sail_command: i32,
    pub rudder_command: i32,
    pub state: SimSnapshot,
    pub forces: ForceBreakdown,
}

impl StepRecord {
    /// Serialize as a single JSON line (no trailing newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}
