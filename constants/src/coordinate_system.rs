use bevy::math::Vec3;

/// Vertical axis of the tracked world (Y-up, as reported by the tracking subsystem)
pub const WORLD_UP: Vec3 = Vec3::Y;

/// Survey (LAS/LAZ, Z-up) to tracked world (Y-up) transformation matrix, row-major
/// Default: -90° X rotation (Z→Y, -Y→Z, X→X)
pub const SURVEY_TO_WORLD: [[f64; 3]; 3] = [
    [1.0, 0.0, 0.0],  // X = X
    [0.0, 0.0, 1.0],  // Y = Z
    [0.0, -1.0, 0.0], // Z = -Y
];

/// Convert a survey coordinate into the tracked world frame.
pub fn survey_to_world(x: f64, y: f64, z: f64) -> Vec3 {
    let input = [x, y, z];
    let mut output = [0.0; 3];

    for (row, out) in SURVEY_TO_WORLD.iter().zip(output.iter_mut()) {
        *out = row.iter().zip(input.iter()).map(|(m, v)| m * v).sum();
    }

    Vec3::new(output[0] as f32, output[1] as f32, output[2] as f32)
}
