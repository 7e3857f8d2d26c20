/// Poses, per-frame context and small vector helpers shared by the pipeline
use bevy::math::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position and orientation of a surface hit or of the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Local +Z axis, the viewing direction for camera poses.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::from_position(Vec3::ZERO)
    }
}

/// Tracking quality reported by the environment-tracking subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    #[default]
    Tracking,
    Limited,
    NotTracking,
}

impl TrackingState {
    pub fn is_tracking(&self) -> bool {
        matches!(self, Self::Tracking)
    }

    /// Status line shown to the user; empty while tracking is healthy.
    pub fn status_text(&self) -> &'static str {
        match self {
            Self::Tracking => "",
            Self::Limited | Self::NotTracking => "Tracking Lost!",
        }
    }
}

/// Everything the core reads from the engine for one display frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameContext {
    pub camera: Pose,
    pub tracking: TrackingState,
}

impl FrameContext {
    pub fn new(camera: Pose, tracking: TrackingState) -> Self {
        Self { camera, tracking }
    }
}

/// Rotation whose +Z axis points along `forward`, keeping `up` as close to +Y as possible.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let Some(f) = forward.try_normalize() else {
        return Quat::IDENTITY;
    };
    let Some(right) = up.cross(f).try_normalize() else {
        // forward is parallel to up
        return Quat::from_rotation_arc(Vec3::Z, f);
    };
    let true_up = f.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, true_up, f))
}

/// Remove the component of `v` along the unit vector `up`.
pub fn horizontal(v: Vec3, up: Vec3) -> Vec3 {
    v - up * v.dot(up)
}

/// Unsigned angle between two vectors in degrees, 0 when either is zero.
pub fn angle_degrees(a: Vec3, b: Vec3) -> f32 {
    let denom = a.length() * b.length();
    if denom <= f32::EPSILON {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_look_rotation_points_forward() {
        let dir = Vec3::new(1.0, 0.0, 1.0).normalize();
        let rotation = look_rotation(dir, Vec3::Y);
        let forward = rotation * Vec3::Z;

        assert_relative_eq!(forward.x, dir.x, epsilon = 1e-5);
        assert_relative_eq!(forward.y, dir.y, epsilon = 1e-5);
        assert_relative_eq!(forward.z, dir.z, epsilon = 1e-5);

        // up stays vertical for a level forward direction
        let up = rotation * Vec3::Y;
        assert_relative_eq!(up.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_look_rotation_degenerate_inputs() {
        assert_eq!(look_rotation(Vec3::ZERO, Vec3::Y), Quat::IDENTITY);

        let down = look_rotation(-Vec3::Y, Vec3::Y) * Vec3::Z;
        assert_relative_eq!(down.y, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_horizontal_drops_vertical_component() {
        let v = horizontal(Vec3::new(1.0, 5.0, -2.0), Vec3::Y);
        assert_eq!(v, Vec3::new(1.0, 0.0, -2.0));
    }

    #[test]
    fn test_angle_degrees() {
        assert_relative_eq!(angle_degrees(Vec3::X, Vec3::Z), 90.0, epsilon = 1e-4);
        assert_relative_eq!(angle_degrees(Vec3::X, -Vec3::X), 180.0, epsilon = 1e-4);
        assert_eq!(angle_degrees(Vec3::ZERO, Vec3::X), 0.0);
    }

    #[test]
    fn test_tracking_status_text() {
        assert_eq!(TrackingState::Tracking.status_text(), "");
        assert_eq!(TrackingState::NotTracking.status_text(), "Tracking Lost!");
        assert!(!TrackingState::Limited.is_tracking());
    }
}
