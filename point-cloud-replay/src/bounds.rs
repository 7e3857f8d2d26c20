/// Axis-aligned bounds of replayed points
use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointBounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl PointBounds {
    /// Empty bounds; any update replaces them.
    pub fn new() -> Self {
        Self {
            min: [f32::INFINITY; 3],
            max: [f32::NEG_INFINITY; 3],
        }
    }

    pub fn update(&mut self, point: Vec3) {
        self.min = Vec3::from_array(self.min).min(point).to_array();
        self.max = Vec3::from_array(self.max).max(point).to_array();
    }

    pub fn merge(mut self, other: Self) -> Self {
        self.min = Vec3::from_array(self.min)
            .min(Vec3::from_array(other.min))
            .to_array();
        self.max = Vec3::from_array(self.max)
            .max(Vec3::from_array(other.max))
            .to_array();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0]
    }

    /// Extent along each axis, zero when empty.
    pub fn dimensions(&self) -> [f32; 3] {
        if self.is_empty() {
            return [0.0; 3];
        }
        (Vec3::from_array(self.max) - Vec3::from_array(self.min)).to_array()
    }
}

impl Default for PointBounds {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_and_merge() {
        let mut a = PointBounds::new();
        assert!(a.is_empty());
        assert_eq!(a.dimensions(), [0.0; 3]);

        a.update(Vec3::new(1.0, -1.0, 0.0));
        a.update(Vec3::new(2.0, 3.0, -4.0));
        assert_eq!(a.min, [1.0, -1.0, -4.0]);
        assert_eq!(a.max, [2.0, 3.0, 0.0]);

        let mut b = PointBounds::new();
        b.update(Vec3::new(-5.0, 0.0, 0.0));
        let merged = a.merge(b);
        assert_eq!(merged.min, [-5.0, -1.0, -4.0]);
        assert_eq!(merged.dimensions(), [7.0, 4.0, 4.0]);

        // merging with empty bounds changes nothing
        assert_eq!(merged.merge(PointBounds::new()), merged);
    }
}
