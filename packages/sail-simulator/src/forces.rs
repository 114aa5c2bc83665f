//! forces.rs — Pure force and torque functions for every lifting surface
//!
//! Nothing here holds state: each function maps (flow, geometry, foil, fluid)
//! to a force or torque. The orchestrator composes them.
//!
//! Foil convention, shared by sail, keel and rudder:
//! - `flow` is the fluid velocity as seen by the foil (m/s, world frame)
//! - angle of attack = shortest arc from the chord line to the flow direction
//! - drag acts along the flow, lift along the flow rotated 90° CCW, scaled
//!   by the signed lift coefficient
//!
//! Torques are yaw torques about the centre of mass, CCW positive, computed as
//! lever × force where the lever points from the CoM to the foil.

use sail_types::{angle_diff, Vec2};

use crate::foil::{Coefficients, FoilTable};

/// Fluid properties plus the numerical-conditioning scale for that side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fluid {
    /// kg/m³
    pub density: f64,
    /// Multiplier applied to every force computed in this fluid
    pub scale: f64,
}

impl Fluid {
    /// scale · ½ρv²
    pub fn dynamic_pressure(&self, speed: f64) -> f64 {
        self.scale * 0.5 * self.density * speed * speed
    }
}

/// Force on one foil plus the local-frame angle it was computed at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoilForce {
    pub force: Vec2,
    /// Angle of attack, degrees in [-180, 180)
    pub angle_of_attack: f64,
    pub coefficients: Coefficients,
}

impl FoilForce {
    fn none() -> Self {
        Self {
            force: Vec2::zero(),
            angle_of_attack: 0.0,
            coefficients: Coefficients { cl: 0.0, cd: 0.0 },
        }
    }
}

/// Generic lift + drag on a foil whose chord line points at `chord_deg`
pub fn foil_force(flow: Vec2, chord_deg: f64, foil: &FoilTable, area: f64, fluid: Fluid) -> FoilForce {
    let Some(flow_dir) = flow.normalized() else {
        return FoilForce::none();
    };
    let angle_of_attack = angle_diff(flow.direction_deg(), chord_deg);
    let coefficients = foil.coefficients(angle_of_attack);
    let q_area = fluid.dynamic_pressure(flow.norm()) * area;

    let drag = flow_dir.scale(q_area * coefficients.cd);
    let lift = flow_dir.perp_ccw().scale(q_area * coefficients.cl);

    FoilForce { force: drag + lift, angle_of_attack, coefficients }
}

// ── Sail ──────────────────────────────────────────────────────────────────────

/// Aerodynamic force on the sail.
/// `sail_angle` is the signed angle of the sail relative to the hull.
pub fn sail_force(
    apparent_wind: Vec2,
    heading: f64,
    sail_angle: f64,
    foil: &FoilTable,
    area: f64,
    air: Fluid,
) -> FoilForce {
    foil_force(apparent_wind, heading + sail_angle, foil, area, air)
}

/// Split the sail force into drive along the heading and the lateral
/// remainder scaled by `slip_coeff` (the part the hull lets through as leeway).
pub fn split_drive_and_slip(sail: Vec2, heading: f64, slip_coeff: f64) -> (Vec2, Vec2) {
    let forward = Vec2::unit(heading);
    let drive = sail.project_on_unit(&forward);
    let slip = (sail - drive).scale(slip_coeff);
    (drive, slip)
}

/// Which side the sail deploys on: -1 (port) or +1 (starboard).
///
/// `relative_wind` is the direction the apparent wind moves toward, relative
/// to the heading. Wind moving toward port (positive) puts the sail to port.
/// Within `deadband` of dead downwind (0°) or head-to-wind (±180°) the sign
/// is ambiguous and `previous` is kept. The caller's command never picks the
/// side, not even there: a signed or zero sail command inside the band still
/// leaves the sail where it was, so a controller cannot flip it by accident.
pub fn resolve_sail_side(relative_wind: f64, previous: f64, deadband: f64) -> f64 {
    let r = relative_wind.abs();
    if r < deadband || r > 180.0 - deadband {
        previous
    } else if relative_wind >= 0.0 {
        -1.0
    } else {
        1.0
    }
}

// ── Keel & rudder ─────────────────────────────────────────────────────────────

/// Keel: chord fixed along the hull; lever is signed (forward of CoM positive).
/// Returns the foil force and its yaw torque.
pub fn keel_force(
    water_flow: Vec2,
    heading: f64,
    foil: &FoilTable,
    area: f64,
    distance_from_com: f64,
    water: Fluid,
) -> (FoilForce, f64) {
    if area <= 0.0 {
        return (FoilForce::none(), 0.0);
    }
    let f = foil_force(water_flow, heading, foil, area, water);
    let lever = Vec2::unit(heading).scale(distance_from_com);
    (f, lever.cross(&f.force))
}

/// Rudder: chord at heading + deflection, mounted `lever_arm` metres aft of
/// the CoM. Returns the foil force and its yaw torque.
pub fn rudder_force(
    water_flow: Vec2,
    heading: f64,
    rudder_angle: f64,
    foil: &FoilTable,
    area: f64,
    lever_arm: f64,
    water: Fluid,
) -> (FoilForce, f64) {
    let f = foil_force(water_flow, heading + rudder_angle, foil, area, water);
    let lever = Vec2::unit(heading).scale(-lever_arm);
    (f, lever.cross(&f.force))
}

// ── Hull ──────────────────────────────────────────────────────────────────────

/// Empirical hull drag, along the water flow (i.e. opposing motion through
/// the water): scale·½ρ|flow|²·hull_area·friction
pub fn hull_resistance(water_flow: Vec2, hull_area: f64, friction: f64, water: Fluid) -> Vec2 {
    match water_flow.normalized() {
        Some(dir) => dir.scale(water.dynamic_pressure(water_flow.norm()) * hull_area * friction),
        None => Vec2::zero(),
    }
}

/// Yaw damping from the water the stern sweeps through while turning.
/// `angular_velocity` in deg/s; returns N·m opposing the rotation.
pub fn rotational_damping(
    angular_velocity: f64,
    lever_arm: f64,
    hull_area: f64,
    rotation_resistance: f64,
    water: Fluid,
) -> f64 {
    let omega = angular_velocity.to_radians();
    if omega == 0.0 || !omega.is_finite() {
        return 0.0;
    }
    let tangential = omega.abs() * lever_arm;
    let force = water.dynamic_pressure(tangential) * hull_area * rotation_resistance;
    -omega.signum() * force * lever_arm
}

// ── Safeguards ────────────────────────────────────────────────────────────────

/// Clamp an apparent-flow vector to `max_speed`.
/// Non-finite vectors collapse to zero. Returns (vector, was_clamped).
pub fn sanitize_relative_velocity(v: Vec2, max_speed: f64) -> (Vec2, bool) {
    let n = v.norm();
    if !n.is_finite() {
        return (Vec2::zero(), true);
    }
    if n > max_speed {
        return (v.scale(max_speed / n), true);
    }
    (v, false)
}

/// Shorten a per-step velocity change so it cannot overshoot the relative
/// velocity (boat minus fluid) that produced it. Returns (dv, was_limited).
///
/// Changes up to `ratio`·|relative| pass untouched. Larger ones are cut back
/// to the point of closest approach to zero relative velocity, so the flow can
/// neither reverse nor grow within one step.
pub fn limit_impulse(dv: Vec2, relative: Vec2, ratio: f64) -> (Vec2, bool) {
    let m2 = dv.dot(&dv);
    if m2.sqrt() <= ratio * relative.norm() {
        return (dv, false);
    }
    let s = (-relative.dot(&dv) / m2).clamp(0.0, 1.0);
    (dv.scale(s), true)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AIR: Fluid = Fluid { density: 1.225, scale: 1.0 };
    const WATER: Fluid = Fluid { density: 1029.0, scale: 1.0 };

    fn plate() -> FoilTable { FoilTable::flat_plate("flat_plate") }

    fn close(a: f64, b: f64) -> bool { (a - b).abs() < 1e-9 }

    #[test]
    fn test_zero_flow_gives_zero_force() {
        let f = foil_force(Vec2::zero(), 37.0, &plate(), 1.0, AIR);
        assert_eq!(f.force, Vec2::zero());
        assert_eq!(hull_resistance(Vec2::zero(), 0.2, 0.01, WATER), Vec2::zero());
        assert_eq!(rotational_damping(0.0, 1.0, 0.2, 0.05, WATER), 0.0);
    }

    #[test]
    fn test_aligned_flow_is_pure_drag() {
        let flow = Vec2::new(5.0, 0.0);
        let f = foil_force(flow, 0.0, &plate(), 2.0, AIR);
        let q = 0.5 * 1.225 * 25.0 * 2.0;
        assert!(close(f.angle_of_attack, 0.0));
        assert!(close(f.force.x, q * 0.02));
        assert!(f.force.y.abs() < 1e-9);
    }

    #[test]
    fn test_lift_pushes_toward_flow_crossing_side() {
        // Flow heading 20° CCW of the chord crosses the plate toward +y
        let flow = Vec2::from_polar(4.0, 20.0);
        let f = foil_force(flow, 0.0, &plate(), 1.0, WATER);
        assert!(close(f.angle_of_attack, 20.0));
        assert!(f.force.y > 0.0);

        let flow = Vec2::from_polar(4.0, -20.0);
        let f = foil_force(flow, 0.0, &plate(), 1.0, WATER);
        assert!(f.force.y < 0.0);
    }

    #[test]
    fn test_scale_factor_multiplies_force() {
        let flow = Vec2::from_polar(3.0, 30.0);
        let base = foil_force(flow, 0.0, &plate(), 1.0, AIR).force;
        let scaled = foil_force(flow, 0.0, &plate(), 1.0, Fluid { scale: 10.0, ..AIR }).force;
        assert!(close(scaled.x, base.x * 10.0));
        assert!(close(scaled.y, base.y * 10.0));
    }

    #[test]
    fn test_sail_drives_boat_on_beam_reach() {
        // Heading East, wind from the North (moving South)
        let apparent = Vec2::new(0.0, -5.0);
        let side = resolve_sail_side(angle_diff(apparent.direction_deg(), 0.0), 1.0, 5.0);
        assert_eq!(side, 1.0); // wind moving to starboard → sail out to starboard
        let f = sail_force(apparent, 0.0, side * 30.0, &plate(), 1.0, AIR);
        let (drive, slip) = split_drive_and_slip(f.force, 0.0, 0.25);
        assert!(drive.x > 0.0, "drive {drive:?}");
        assert!(close(slip.y, f.force.y * 0.25));
        assert!(slip.x.abs() < 1e-9);
    }

    #[test]
    fn test_sail_side_resolution() {
        assert_eq!(resolve_sail_side(90.0, 1.0, 5.0), -1.0);
        assert_eq!(resolve_sail_side(-90.0, -1.0, 5.0), 1.0);
        // Dead downwind and head-to-wind keep the previous side
        assert_eq!(resolve_sail_side(0.0, -1.0, 5.0), -1.0);
        assert_eq!(resolve_sail_side(3.0, 1.0, 5.0), 1.0);
        assert_eq!(resolve_sail_side(-180.0, 1.0, 5.0), 1.0);
        assert_eq!(resolve_sail_side(178.0, -1.0, 5.0), -1.0);
    }

    #[test]
    fn test_rudder_deflection_turns_boat() {
        // Moving East through still water: flow comes from the bow
        let flow = Vec2::new(-3.0, 0.0);
        let (_, torque_pos) = rudder_force(flow, 0.0, 10.0, &plate(), 0.05, 1.0, WATER);
        let (_, torque_neg) = rudder_force(flow, 0.0, -10.0, &plate(), 0.05, 1.0, WATER);
        let (_, torque_zero) = rudder_force(flow, 0.0, 0.0, &plate(), 0.05, 1.0, WATER);
        assert!(torque_pos < 0.0, "positive deflection should yaw clockwise");
        assert!(torque_neg > 0.0);
        assert!(close(torque_pos, -torque_neg));
        assert!(torque_zero.abs() < 1e-9);
    }

    #[test]
    fn test_keel_resists_leeway() {
        // Heading East, sliding North: flow seen by the keel moves South
        let flow = Vec2::new(-2.0, -0.3);
        let (f, _) = keel_force(flow, 0.0, &plate(), 0.1, 0.0, WATER);
        assert!(f.force.y < 0.0, "keel should push back against leeway: {:?}", f.force);
    }

    #[test]
    fn test_keel_torque_uses_signed_lever() {
        let flow = Vec2::new(-2.0, -0.3);
        let (f, fwd) = keel_force(flow, 0.0, &plate(), 0.1, 0.2, WATER);
        let (_, aft) = keel_force(flow, 0.0, &plate(), 0.1, -0.2, WATER);
        assert!(close(fwd, 0.2 * f.force.y));
        assert!(close(fwd, -aft));
        let (none, t) = keel_force(flow, 0.0, &plate(), 0.0, 0.2, WATER);
        assert_eq!(none.force, Vec2::zero());
        assert_eq!(t, 0.0);
    }

    #[test]
    fn test_hull_resistance_follows_flow() {
        let flow = Vec2::new(-2.0, 0.0);
        let f = hull_resistance(flow, 0.2, 0.01, WATER);
        assert!(close(f.x, -(0.5 * 1029.0 * 4.0 * 0.2 * 0.01)));
        assert!(f.y.abs() < 1e-12);
    }

    #[test]
    fn test_rotational_damping_opposes_rotation() {
        assert!(rotational_damping(45.0, 1.0, 0.2, 0.05, WATER) < 0.0);
        assert!(rotational_damping(-45.0, 1.0, 0.2, 0.05, WATER) > 0.0);
    }

    #[test]
    fn test_sanitize_clamps_magnitude() {
        let (v, clamped) = sanitize_relative_velocity(Vec2::new(300.0, 400.0), 50.0);
        assert!(clamped);
        assert!(close(v.norm(), 50.0));
        assert!(close(v.direction_deg(), Vec2::new(3.0, 4.0).direction_deg()));

        let (v, clamped) = sanitize_relative_velocity(Vec2::new(1.0, 1.0), 50.0);
        assert!(!clamped);
        assert_eq!(v, Vec2::new(1.0, 1.0));

        let (v, clamped) = sanitize_relative_velocity(Vec2::new(f64::NAN, 0.0), 50.0);
        assert!(clamped);
        assert_eq!(v, Vec2::zero());
    }

    #[test]
    fn test_impulse_limit_stops_at_zero_relative_flow() {
        // Boat 4 m/s through the water, drag would push it to -6 m/s relative
        let relative = Vec2::new(4.0, 0.0);
        let (dv, limited) = limit_impulse(Vec2::new(-10.0, 0.0), relative, 0.5);
        assert!(limited);
        assert!(close(dv.x, -4.0));
        assert!((relative + dv).norm() < 1e-12);

        // Small changes pass untouched
        let (dv, limited) = limit_impulse(Vec2::new(-1.5, 0.5), relative, 0.5);
        assert!(!limited);
        assert_eq!(dv, Vec2::new(-1.5, 0.5));
    }

    #[test]
    fn test_impulse_limit_never_grows_relative_flow() {
        let relative = Vec2::new(3.0, -1.0);
        for i in 0..72 {
            let dv = Vec2::from_polar(10.0, f64::from(i) * 5.0);
            let (limited_dv, _) = limit_impulse(dv, relative, 0.5);
            assert!((relative + limited_dv).norm() <= relative.norm() + 1e-9, "grew at {}°", i * 5);
        }
        // Nothing to act on: the change is dropped entirely
        let (dv, limited) = limit_impulse(Vec2::new(1.0, 0.0), Vec2::zero(), 0.5);
        assert!(limited);
        assert_eq!(dv.norm(), 0.0);
    }
}
