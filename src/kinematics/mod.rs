/**
 * Vessel Kinematics Model
 *
 * Dead reckoning of a single surface vessel over a spherical earth:
 * 1. Resolve the commanded speed (gear dependent)
 * 2. Turn by a tenth of the rudder angle per step
 * 3. Move along the course for `speed * dt` meters
 * 4. Flip the reported heading while in reverse gear
 */

pub mod geo;

use crate::frame::{ControlCommand, Gear};
use geo::{add_cyclic, ddmm_to_decimal, decimal_to_ddmm, destination, wrap360};

/// Raw throttle to km/h (60 km/h ceiling at full scale).
pub const THROTTLE_TO_KMH: f64 = 0.6;
/// km/h to m/s.
pub const KMH_TO_MPS: f64 = 0.277778;

/// Position, heading and speed of the simulated vessel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VesselState {
    /// Latitude as `DDMM.mmmm`.
    pub latitude_ddmm: f64,
    /// Longitude as `DDDMM.mmmm`.
    pub longitude_ddmm: f64,
    /// Always within `[0, 360)`.
    pub heading_deg: f64,
    /// Never negative.
    pub speed_mps: f64,
}

impl VesselState {
    pub fn new(latitude_ddmm: f64, longitude_ddmm: f64, heading_deg: f64, speed_mps: f64) -> Self {
        Self {
            latitude_ddmm,
            longitude_ddmm,
            heading_deg: wrap360(heading_deg),
            speed_mps: speed_mps.max(0.0),
        }
    }

    pub fn latitude_deg(&self) -> f64 {
        ddmm_to_decimal(self.latitude_ddmm)
    }

    pub fn longitude_deg(&self) -> f64 {
        ddmm_to_decimal(self.longitude_ddmm)
    }
}

impl Default for VesselState {
    fn default() -> Self {
        Self::new(4454.5453, 3716.1331, 0.0, 0.0)
    }
}

/// Speed in m/s resulting from a command.
///
/// Neutral always yields zero. Negative throttle is clamped to zero, going
/// astern is requested through [`Gear::Reverse`] only.
pub fn effective_speed(cmd: &ControlCommand) -> f64 {
    match cmd.gear {
        Gear::Neutral => 0.0,
        Gear::Drive | Gear::Reverse => {
            (cmd.speed_command as f64 * THROTTLE_TO_KMH * KMH_TO_MPS).max(0.0)
        }
    }
}

/// Heading after applying the rudder, `rudder_angle` being in tenths of a degree.
/// The turn direction is mirrored in reverse gear.
pub fn turn(heading_deg: f64, cmd: &ControlCommand) -> f64 {
    let delta = cmd.rudder_angle as f64 / 10.0;
    match cmd.gear {
        Gear::Reverse => add_cyclic(heading_deg, -delta),
        _ => add_cyclic(heading_deg, delta),
    }
}

/// Computes the state reached from `state` after `dt_seconds` under `cmd`.
pub fn advance(state: &VesselState, cmd: &ControlCommand, dt_seconds: f64) -> VesselState {
    let speed = effective_speed(cmd);
    let heading = turn(state.heading_deg, cmd);

    //astern the hull moves opposite to the bow
    let course = match cmd.gear {
        Gear::Reverse => add_cyclic(heading, 180.0),
        _ => heading,
    };

    let lat = state.latitude_deg().to_radians();
    let lon = state.longitude_deg().to_radians();
    //NaN, infinite or negative steps do not move the vessel
    let dt = if dt_seconds.is_finite() { dt_seconds.max(0.0) } else { 0.0 };
    let distance = speed * dt;

    let (new_lat, new_lon) = destination(lat, lon, course.to_radians(), distance);

    //the reported heading gets the same 180 flip once the position step is done
    let final_heading = course;

    VesselState {
        latitude_ddmm: decimal_to_ddmm(new_lat.to_degrees()),
        longitude_ddmm: decimal_to_ddmm(new_lon.to_degrees()),
        heading_deg: final_heading,
        speed_mps: speed,
    }
}

/// Sole owner of the mutable vessel state.
#[derive(Debug, Clone)]
pub struct VesselModel {
    state: VesselState,
    steps: u64,
}

impl VesselModel {
    pub fn new(initial: VesselState) -> Self {
        Self { state: initial, steps: 0 }
    }

    pub fn state(&self) -> &VesselState {
        &self.state
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Advances the owned state in place and returns it.
    pub fn step(&mut self, cmd: &ControlCommand, dt_seconds: f64) -> &VesselState {
        self.state = advance(&self.state, cmd, dt_seconds);
        self.steps += 1;
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::geo::EARTH_RADIUS_M;

    fn start() -> VesselState {
        VesselState::new(4454.5453, 3716.1331, 0.0, 0.0)
    }

    #[test]
    fn test_drive_north_scenario() {
        let cmd = ControlCommand::new(0, 10, Gear::Drive);
        let s0 = start();
        let s1 = advance(&s0, &cmd, 0.1);

        assert!((s1.speed_mps - 10.0 * 0.6 * 0.277778).abs() < 1e-12);
        assert!((s1.speed_mps - 1.6667).abs() < 1e-4);
        assert_eq!(s1.heading_deg, 0.0);

        let north_m = (s1.latitude_deg() - s0.latitude_deg()).to_radians() * EARTH_RADIUS_M;
        assert!((north_m - 0.16667).abs() < 1e-4, "moved {} m", north_m);
        assert!((s1.longitude_ddmm - s0.longitude_ddmm).abs() < 1e-9);
    }

    #[test]
    fn test_zero_motion_is_idempotent() {
        let cmd = ControlCommand::new(0, 0, Gear::Drive);
        let s0 = VesselState::new(4454.5453, 3716.1331, 123.4, 0.0);
        for dt in [0.0, 0.1, 1.0, 3600.0] {
            let s1 = advance(&s0, &cmd, dt);
            assert_eq!(s1.heading_deg, s0.heading_deg);
            assert!((s1.latitude_ddmm - s0.latitude_ddmm).abs() < 1e-8);
            assert!((s1.longitude_ddmm - s0.longitude_ddmm).abs() < 1e-8);
        }
    }

    #[test]
    fn test_neutral_zeroes_speed() {
        for speed in [-128i8, -1, 1, 50, 127] {
            let cmd = ControlCommand::new(0, speed, Gear::Neutral);
            assert_eq!(advance(&start(), &cmd, 0.1).speed_mps, 0.0);
        }
    }

    #[test]
    fn test_negative_throttle_clamped() {
        let cmd = ControlCommand::new(0, -50, Gear::Drive);
        let s1 = advance(&start(), &cmd, 1.0);
        assert_eq!(s1.speed_mps, 0.0);
        assert!((s1.latitude_ddmm - start().latitude_ddmm).abs() < 1e-8);
    }

    #[test]
    fn test_reverse_flips_heading() {
        let cmd = ControlCommand::new(0, 0, Gear::Reverse);
        let s1 = advance(&start(), &cmd, 0.1);
        assert_eq!(s1.heading_deg, 180.0);
    }

    #[test]
    fn test_reverse_moves_astern() {
        let cmd = ControlCommand::new(0, 10, Gear::Reverse);
        let s0 = start();
        let s1 = advance(&s0, &cmd, 1.0);
        //heading 0, so the position step runs due south
        assert!(s1.latitude_ddmm < s0.latitude_ddmm);
        assert!((s1.longitude_ddmm - s0.longitude_ddmm).abs() < 1e-9);
    }

    #[test]
    fn test_rudder_turns_heading() {
        let s0 = VesselState::new(4454.5453, 3716.1331, 355.0, 0.0);

        //100 tenths = 10 degrees per step
        let drive = ControlCommand::new(100, 0, Gear::Drive);
        assert!((advance(&s0, &drive, 0.1).heading_deg - 5.0).abs() < 1e-9);

        //reverse mirrors the delta before the 180 flip
        let reverse = ControlCommand::new(100, 0, Gear::Reverse);
        assert!((advance(&s0, &reverse, 0.1).heading_deg - 165.0).abs() < 1e-9);
    }

    #[test]
    fn test_heading_stays_in_range() {
        let mut model = VesselModel::new(start());
        let cmd = ControlCommand::new(-128, 127, Gear::Drive);
        for _ in 0..1000 {
            let h = model.step(&cmd, 0.1).heading_deg;
            assert!((0.0..360.0).contains(&h));
        }
        assert_eq!(model.steps(), 1000);
    }

    #[test]
    fn test_non_finite_dt_keeps_position() {
        let cmd = ControlCommand::new(0, 100, Gear::Drive);
        let s0 = start();
        for dt in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN, -1.0] {
            let s1 = advance(&s0, &cmd, dt);
            assert!(s1.latitude_ddmm.is_finite() && s1.longitude_ddmm.is_finite());
            assert!((s1.latitude_ddmm - s0.latitude_ddmm).abs() < 1e-8, "dt {}", dt);
            assert!((s1.longitude_ddmm - s0.longitude_ddmm).abs() < 1e-8, "dt {}", dt);
        }
    }

    #[test]
    fn test_state_constructor_normalizes() {
        let s = VesselState::new(0.0, 0.0, -90.0, -3.0);
        assert_eq!(s.heading_deg, 270.0);
        assert_eq!(s.speed_mps, 0.0);
    }
}
