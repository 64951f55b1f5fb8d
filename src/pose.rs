//! # Poses and waypoints
//!
//! All positions are in meters and yaw angles in degrees, the units used by the Crazyflie position setpoint.
//! The [Pose] given when opening a [Drone](crate::Drone) defines the local frame: relative [Waypoint]s are
//! offset by it before being sent.

use serde::{Deserialize, Serialize};

/// # Position and heading
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    /// X position (meters)
    pub x: f32,
    /// Y position (meters)
    pub y: f32,
    /// Z position (meters)
    pub z: f32,
    /// Yaw angle (degrees)
    pub yaw: f32,
}

impl Pose {
    /// Create a pose from a position and a yaw angle in degrees
    pub fn new(x: f32, y: f32, z: f32, yaw: f32) -> Self {
        Self { x, y, z, yaw }
    }

    /// Yaw angle in radians, as expected by the `kalman.initialYaw` parameter
    pub fn yaw_radians(&self) -> f32 {
        self.yaw.to_radians()
    }

    /// Translate a waypoint expressed in this pose's frame to the world frame.
    ///
    /// Only the position is offset, the yaw does not rotate the waypoint.
    pub fn offset(&self, waypoint: Waypoint) -> Waypoint {
        Waypoint::new(waypoint.x + self.x, waypoint.y + self.y, waypoint.z + self.z)
    }
}

/// # Target position
///
/// Serialized as a `[x, y, z]` array so that flight plans stay compact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Waypoint {
    /// X position (meters)
    pub x: f32,
    /// Y position (meters)
    pub y: f32,
    /// Z position (meters)
    pub z: f32,
}

impl Waypoint {
    /// Create a waypoint
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for Waypoint {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Waypoint> for [f32; 3] {
    fn from(waypoint: Waypoint) -> Self {
        [waypoint.x, waypoint.y, waypoint.z]
    }
}

impl From<(f32, f32, f32)> for Waypoint {
    fn from((x, y, z): (f32, f32, f32)) -> Self {
        Self { x, y, z }
    }
}

/// Reference frame of a commanded position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Frame {
    /// Offset by the initial pose of the drone
    #[default]
    Relative,
    /// Sent to the Crazyflie untouched. Only use it when the positioning system frame is known.
    Absolute,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_adds_the_initial_position() {
        let initial = Pose::new(1.0, -2.0, 0.5, 90.0);
        let target = initial.offset(Waypoint::new(0.5, 0.5, 0.2));

        assert_eq!(target, Waypoint::new(1.5, -1.5, 0.7));
    }

    #[test]
    fn yaw_is_converted_to_radians() {
        let pose = Pose::new(0.0, 0.0, 0.0, 180.0);

        assert!((pose.yaw_radians() - std::f32::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn waypoint_deserializes_from_array() {
        let waypoints: Vec<Waypoint> = serde_json::from_str("[[0.0, 1.0, 0.5], [-0.2, 0, 0.3]]").unwrap();

        assert_eq!(waypoints, vec![Waypoint::new(0.0, 1.0, 0.5), Waypoint::new(-0.2, 0.0, 0.3)]);
    }
}
