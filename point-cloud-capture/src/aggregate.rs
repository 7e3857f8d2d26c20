/// Grid quantization and deduplication of point sets
use bevy::math::Vec3;
use std::collections::HashSet;

use crate::error::AggregateError;

/// Snap a value to the nearest multiple of `target`, halves rounding away from zero.
pub fn round_to_target(value: f32, target: f32) -> f32 {
    (value / target).round() * target
}

/// Snap every coordinate to a `resolution` grid and drop repeated cells.
///
/// The first occurrence of each snapped point is kept, in input order.
pub fn aggregate(points: &[Vec3], resolution: f32) -> Result<Vec<Vec3>, AggregateError> {
    if !(resolution.is_finite() && resolution > 0.0) {
        return Err(AggregateError::InvalidResolution(resolution));
    }

    let mut seen = HashSet::with_capacity(points.len());
    let mut result = Vec::new();

    for point in points {
        // adding +0.0 folds -0.0 into 0.0 so both hash to the same cell
        let snapped = Vec3::new(
            round_to_target(point.x, resolution),
            round_to_target(point.y, resolution),
            round_to_target(point.z, resolution),
        ) + Vec3::ZERO;

        let key = [snapped.x.to_bits(), snapped.y.to_bits(), snapped.z.to_bits()];
        if seen.insert(key) {
            result.push(snapped);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scattered() -> Vec<Vec3> {
        (0..200)
            .map(|i| {
                let t = i as f32 * 0.37;
                Vec3::new(t.sin() * 1.3, (t * 0.5).cos() * 0.7, t * 0.011 - 1.0)
            })
            .collect()
    }

    #[test]
    fn test_round_to_target() {
        assert_relative_eq!(round_to_target(0.12, 0.05), 0.1, epsilon = 1e-6);
        assert_relative_eq!(round_to_target(0.13, 0.05), 0.15, epsilon = 1e-6);
        assert_relative_eq!(round_to_target(-0.13, 0.05), -0.15, epsilon = 1e-6);
        // halves round away from zero
        assert_eq!(round_to_target(2.5, 1.0), 3.0);
        assert_eq!(round_to_target(-2.5, 1.0), -3.0);
    }

    #[test]
    fn test_merges_points_in_same_cell() {
        let points = vec![
            Vec3::new(0.01, 0.02, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-0.02, 0.0, 0.01),
            Vec3::new(0.98, 1.04, 1.0),
        ];

        let result = aggregate(&points, 0.1).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0], Vec3::ZERO);
        assert_relative_eq!(result[1].x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_negative_zero_shares_cell_with_zero() {
        let result = aggregate(&[Vec3::new(-0.01, 0.0, 0.0), Vec3::new(0.01, 0.0, 0.0)], 0.5).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_preserves_first_occurrence_order() {
        let points = vec![Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO, Vec3::new(3.1, 0.0, 0.0)];
        let result = aggregate(&points, 1.0).unwrap();
        assert_eq!(result, vec![Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO]);
    }

    #[test]
    fn test_idempotent() {
        for resolution in [0.01, 0.05, 0.3, 1.0] {
            let once = aggregate(&scattered(), resolution).unwrap();
            let twice = aggregate(&once, resolution).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_output_has_no_duplicates() {
        let result = aggregate(&scattered(), 0.2).unwrap();
        for (i, a) in result.iter().enumerate() {
            for b in &result[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[], 0.1).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_invalid_resolution() {
        for resolution in [0.0, -0.5, f32::NAN, f32::INFINITY] {
            assert!(aggregate(&[Vec3::ONE], resolution).is_err());
        }
    }
}
