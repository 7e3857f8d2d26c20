/// Three-point plane calibration and plane/world coordinate conversion
use bevy::math::{Vec2, Vec3};
use constants::capture::DEPTH_FILTER_THRESHOLD;
use constants::coordinate_system::WORLD_UP;
use constants::placement::{MIN_EDGE_LENGTH, PLACEMENT_POINT_COUNT};
use tracing::debug;

use crate::error::CalibrationError;
use crate::geometry::{angle_degrees, horizontal};

/// Builds a [`PlaneFrame`] from three successively committed world positions.
///
/// The first point becomes the origin. The second and third are levelled to
/// the origin's height along the up axis, and the third is additionally
/// snapped onto the line through the origin perpendicular to the width edge,
/// so the resulting frame is always level and right-angled.
#[derive(Debug, Clone)]
pub struct PlaneCalibrator {
    up: Vec3,
    points: Vec<Vec3>,
}

impl Default for PlaneCalibrator {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaneCalibrator {
    /// Calibrator levelling against the tracked world's up axis.
    pub fn new() -> Self {
        Self::with_up_axis(WORLD_UP)
    }

    /// Calibrator levelling against an arbitrary up axis. A zero axis falls back to the world up.
    pub fn with_up_axis(up: Vec3) -> Self {
        Self {
            up: up.try_normalize().unwrap_or(WORLD_UP),
            points: Vec::with_capacity(PLACEMENT_POINT_COUNT),
        }
    }

    pub fn up_axis(&self) -> Vec3 {
        self.up
    }

    /// Number of points committed so far (0..=3).
    pub fn placed_count(&self) -> usize {
        self.points.len()
    }

    pub fn is_complete(&self) -> bool {
        self.points.len() == PLACEMENT_POINT_COUNT
    }

    pub fn origin(&self) -> Option<Vec3> {
        self.points.first().copied()
    }

    /// Stored (post-levelling, post-projection) positions in commit order.
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// The finished frame, once all three points are committed.
    pub fn frame(&self) -> Option<PlaneFrame> {
        match self.points.as_slice() {
            [origin, width, height] => Some(PlaneFrame {
                origin: *origin,
                width_edge: *width - *origin,
                height_edge: *height - *origin,
                up: self.up,
            }),
            _ => None,
        }
    }

    /// Commit the next tapped position.
    ///
    /// Returns the finished frame after the third commit. A rejected commit
    /// leaves the calibrator unchanged so the same point can be re-tapped.
    pub fn commit_point(&mut self, position: Vec3) -> Result<Option<PlaneFrame>, CalibrationError> {
        if !position.is_finite() {
            return Err(CalibrationError::NonFinite(position.to_array()));
        }

        let stored = match self.points.as_slice() {
            [] => position,
            [origin] => {
                let placed = self.level(position, *origin);
                let length = (placed - *origin).length();
                if length < MIN_EDGE_LENGTH {
                    return Err(CalibrationError::DegenerateWidth { length });
                }
                placed
            }
            [origin, width] => {
                let placed = self.level(position, *origin);
                let axis = (*width - *origin).normalize();
                let raw = placed - *origin;
                let parallel = axis * raw.dot(axis);
                let perpendicular = raw - parallel;
                let length = perpendicular.length();
                if length < MIN_EDGE_LENGTH {
                    return Err(CalibrationError::DegenerateHeight { length });
                }
                *origin + perpendicular
            }
            _ => return Err(CalibrationError::AlreadyComplete),
        };

        self.points.push(stored);
        debug!(
            "Committed calibration point {} at {:?} (tapped {:?})",
            self.points.len() - 1,
            stored,
            position
        );
        Ok(self.frame())
    }

    // Force the vertical component to match the origin's.
    fn level(&self, position: Vec3, origin: Vec3) -> Vec3 {
        position - self.up * (position - origin).dot(self.up)
    }
}

/// Calibrated plane: an origin and two orthogonal, non-normalized edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneFrame {
    origin: Vec3,
    width_edge: Vec3,
    height_edge: Vec3,
    up: Vec3,
}

impl PlaneFrame {
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn width_edge(&self) -> Vec3 {
        self.width_edge
    }

    pub fn height_edge(&self) -> Vec3 {
        self.height_edge
    }

    pub fn up_axis(&self) -> Vec3 {
        self.up
    }

    /// Fourth corner completing the quadrilateral spanned by the two edges.
    pub fn far_corner(&self) -> Vec3 {
        self.origin + self.width_edge + self.height_edge
    }

    /// Unit normal of the plane, oriented towards the up axis whatever the tap order.
    pub fn normal(&self) -> Vec3 {
        let normal = self.width_edge.cross(self.height_edge).normalize();
        if normal.dot(self.up) < 0.0 {
            -normal
        } else {
            normal
        }
    }

    /// World position to (width, height) plane coordinates in metres.
    pub fn world_to_plane(&self, world: Vec3) -> Vec2 {
        let from_origin = world - self.origin;
        Vec2::new(
            from_origin.dot(self.width_edge) / self.width_edge.length(),
            from_origin.dot(self.height_edge) / self.height_edge.length(),
        )
    }

    pub fn world_to_plane_batch(&self, world: &[Vec3]) -> Vec<Vec2> {
        world.iter().map(|&p| self.world_to_plane(p)).collect()
    }

    /// Plane coordinates back to a world position on the plane.
    pub fn plane_to_world(&self, plane: Vec2) -> Vec3 {
        self.origin + self.width_edge.normalize() * plane.x + self.height_edge.normalize() * plane.y
    }

    pub fn plane_to_world_batch(&self, plane: &[Vec2]) -> Vec<Vec3> {
        plane.iter().map(|&p| self.plane_to_world(p)).collect()
    }

    /// Signed perpendicular distance from the plane, positive along [`Self::normal`].
    pub fn signed_distance(&self, world: Vec3) -> f32 {
        (world - self.origin).dot(self.normal())
    }

    /// (width, height, depth) coordinates of a world point relative to the plane.
    pub fn project_point(&self, world: Vec3) -> Vec3 {
        self.world_to_plane(world)
            .extend(self.signed_distance(world))
    }

    /// Project points into plane space. With `filter` set, only points more
    /// than the depth threshold above the plane are kept.
    pub fn project_points(&self, world: &[Vec3], filter: bool) -> Vec<Vec3> {
        world
            .iter()
            .map(|&p| self.project_point(p))
            .filter(|projected| !filter || projected.z > DEPTH_FILTER_THRESHOLD)
            .collect()
    }

    /// Bearing of the camera relative to the width axis, in degrees within [0, 360).
    ///
    /// Both axes and the forward direction are flattened to the horizontal
    /// plane; the height axis decides which half of the circle the angle
    /// falls on.
    pub fn current_angle(&self, camera_forward: Vec3) -> f32 {
        let forward = horizontal(camera_forward, self.up);
        let width = horizontal(self.width_edge, self.up);
        let height = horizontal(self.height_edge, self.up);

        let angle_width = angle_degrees(width, forward);
        let angle_height = angle_degrees(height, forward);
        let angle = if angle_height < 90.0 {
            angle_width
        } else {
            360.0 - angle_width
        };
        angle % 360.0
    }
}
