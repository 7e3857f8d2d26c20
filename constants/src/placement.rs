use bevy::math::Vec2;

/// Number of tapped points that define the calibration plane
pub const PLACEMENT_POINT_COUNT: usize = 3;

/// Viewport-relative point queried first every frame
pub const SCREEN_CENTER: Vec2 = Vec2::new(0.5, 0.5);

/// Offsets tried around the screen centre when the centre ray misses.
/// The x offset is the outer loop, the y offset the inner one.
pub const FALLBACK_SHIFTS: [f32; 4] = [-0.02, 0.02, -0.05, 0.05];

/// Shortest edge accepted while calibrating (metres); shorter edges are degenerate
pub const MIN_EDGE_LENGTH: f32 = 1.0e-3;
