//! boat.rs — Vessel kinematics and fixed-step integration
//!
//! Forces and angular accelerations are accumulated through `apply_force` /
//! `apply_angular_acceleration`, then consumed by one `integrate(dt)` call:
//!
//!   v  += (F / m)·dt
//!   p  += v·dt
//!   ω  += α·dt          (α clamped to ±720 deg/s², ω to ±max_angular_speed)
//!   ψ  += ω·dt          (wrapped into [0, 360))
//!
//! Semi-implicit Euler: the updated velocity moves the position.

use sail_types::{wrap_360, BoatState, Vec2};

/// Stability limit on yaw acceleration (deg/s²)
pub const MAX_ANGULAR_ACCELERATION: f64 = 720.0;

#[derive(Debug, Clone)]
pub struct Boat {
    state: BoatState,
    mass: f64,
    max_angular_speed: f64,
    pending_force: Vec2,
    pending_angular_accel: f64,
}

impl Boat {
    pub fn new(state: BoatState, mass: f64, max_angular_speed: f64) -> Self {
        Self {
            state,
            mass,
            max_angular_speed,
            pending_force: Vec2::zero(),
            pending_angular_accel: 0.0,
        }
    }

    pub fn state(&self) -> &BoatState { &self.state }

    /// Add a world-frame force (N) to be integrated on the next step
    pub fn apply_force(&mut self, force: Vec2) {
        self.pending_force += force;
    }

    /// Set the yaw acceleration (deg/s²) for the next step.
    /// Returns the value actually stored after the stability clamp.
    pub fn apply_angular_acceleration(&mut self, accel: f64) -> f64 {
        let total = self.pending_angular_accel + accel;
        self.pending_angular_accel = clamp_angular_acceleration(total);
        self.pending_angular_accel
    }

    pub fn integrate(&mut self, dt: f64) {
        let s = &mut self.state;

        s.velocity += self.pending_force.scale(dt / self.mass);
        s.position += s.velocity.scale(dt);

        s.angular_velocity = (s.angular_velocity + self.pending_angular_accel * dt)
            .clamp(-self.max_angular_speed, self.max_angular_speed);
        s.heading = wrap_360(s.heading + s.angular_velocity * dt);

        self.pending_force = Vec2::zero();
        self.pending_angular_accel = 0.0;
    }

    pub fn set_sail_angle(&mut self, deg: f64) { self.state.sail_angle = deg; }

    pub fn set_rudder_angle(&mut self, deg: f64) { self.state.rudder_angle = deg; }
}

/// Clamp to ±MAX_ANGULAR_ACCELERATION; NaN collapses to zero
pub fn clamp_angular_acceleration(accel: f64) -> f64 {
    if accel.is_nan() {
        return 0.0;
    }
    accel.clamp(-MAX_ANGULAR_ACCELERATION, MAX_ANGULAR_ACCELERATION)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boat_at(heading: f64) -> Boat {
        Boat::new(BoatState::at_rest(Vec2::zero(), heading), 30.0, 90.0)
    }

    #[test]
    fn test_force_integration_is_semi_implicit() {
        let mut boat = boat_at(0.0);
        boat.apply_force(Vec2::new(30.0, 0.0)); // 1 m/s²
        boat.integrate(0.5);
        assert_eq!(boat.state().velocity, Vec2::new(0.5, 0.0));
        assert_eq!(boat.state().position, Vec2::new(0.25, 0.0));

        // Pending force consumed: coasting on the next step
        boat.integrate(0.5);
        assert_eq!(boat.state().velocity, Vec2::new(0.5, 0.0));
        assert_eq!(boat.state().position, Vec2::new(0.5, 0.0));
    }

    #[test]
    fn test_forces_accumulate() {
        let mut boat = boat_at(0.0);
        boat.apply_force(Vec2::new(15.0, 0.0));
        boat.apply_force(Vec2::new(15.0, 30.0));
        boat.integrate(1.0);
        assert_eq!(boat.state().velocity, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_angular_acceleration_clamped() {
        let mut boat = boat_at(0.0);
        assert_eq!(boat.apply_angular_acceleration(10_000.0), MAX_ANGULAR_ACCELERATION);
        boat.integrate(0.1);
        assert!((boat.state().angular_velocity - 72.0).abs() < 1e-9);

        assert_eq!(clamp_angular_acceleration(-1e9), -MAX_ANGULAR_ACCELERATION);
        assert_eq!(clamp_angular_acceleration(f64::NAN), 0.0);
        assert_eq!(clamp_angular_acceleration(12.5), 12.5);
    }

    #[test]
    fn test_angular_speed_limited() {
        let mut boat = boat_at(0.0);
        for _ in 0..10 {
            boat.apply_angular_acceleration(720.0);
            boat.integrate(0.1);
        }
        assert_eq!(boat.state().angular_velocity, 90.0);
    }

    #[test]
    fn test_heading_wraps_across_zero() {
        let mut boat = boat_at(355.0);
        boat.apply_angular_acceleration(500.0);
        boat.integrate(0.1); // ω = 50, ψ = 360 → 0
        assert!(boat.state().heading >= 0.0 && boat.state().heading < 360.0);
        assert!(sail_types::angle_diff(boat.state().heading, 0.0).abs() < 1e-9);

        let mut boat = boat_at(2.0);
        boat.apply_angular_acceleration(-400.0);
        boat.integrate(0.1); // ω = -40, ψ = -2 → 358
        assert!((boat.state().heading - 358.0).abs() < 1e-9);
    }

    #[test]
    fn test_heading_always_in_range() {
        let mut boat = boat_at(180.0);
        for i in 0..2_000 {
            let accel = if (i / 50) % 2 == 0 { 720.0 } else { -720.0 };
            boat.apply_angular_acceleration(accel);
            boat.integrate(0.1);
            let h = boat.state().heading;
            assert!((0.0..360.0).contains(&h), "heading {h} at step {i}");
        }
    }
}
