/// Capture tunables with JSON overrides
use bevy::math::Vec3;
use constants::capture::{
    CONFIDENCE_THRESHOLD, DEFAULT_AGGREGATE_RESOLUTION, FLUSH_THRESHOLD, MAX_BATCH_POINTS,
    READY_POINT_COUNT,
};
use constants::coordinate_system::WORLD_UP;
use constants::wire::MAX_POINTS_PER_DATAGRAM;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::SettingsError;

/// Coordinates carried by transmitted batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSpace {
    /// (width, height, depth) relative to the calibrated plane.
    #[default]
    Plane,
    /// Raw tracked-world positions.
    World,
}

/// Tunables for one capture session. Fields missing from a JSON file keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Points at or below this confidence are discarded.
    pub confidence_threshold: f32,
    /// Buffered count raising the accumulator's ready signal.
    pub ready_point_count: usize,
    /// Pending count at which a batch is sent.
    pub flush_threshold: usize,
    /// Most points carried by one batch; the rest wait for the next tick.
    pub max_batch_points: usize,
    /// Grid resolution for plane-space aggregation (metres).
    pub aggregate_resolution: f32,
    /// Vertical axis the calibration plane is levelled against.
    pub up_axis: [f32; 3],
    /// Coordinates written into transmitted batches.
    pub coordinate_space: CoordinateSpace,
    /// Initial state of the feature point visualization.
    pub visualize_points: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: CONFIDENCE_THRESHOLD,
            ready_point_count: READY_POINT_COUNT,
            flush_threshold: FLUSH_THRESHOLD,
            max_batch_points: MAX_BATCH_POINTS,
            aggregate_resolution: DEFAULT_AGGREGATE_RESOLUTION,
            up_axis: WORLD_UP.to_array(),
            coordinate_space: CoordinateSpace::Plane,
            visualize_points: true,
        }
    }
}

impl CaptureSettings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn up(&self) -> Vec3 {
        Vec3::from_array(self.up_axis)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.confidence_threshold.is_finite() {
            return Err(SettingsError::Invalid {
                field: "confidence_threshold",
                reason: "must be finite".to_string(),
            });
        }
        if self.flush_threshold == 0 {
            return Err(SettingsError::Invalid {
                field: "flush_threshold",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_batch_points < self.flush_threshold {
            return Err(SettingsError::Invalid {
                field: "max_batch_points",
                reason: format!(
                    "{} is below flush_threshold {}",
                    self.max_batch_points, self.flush_threshold
                ),
            });
        }
        if self.max_batch_points > MAX_POINTS_PER_DATAGRAM {
            return Err(SettingsError::Invalid {
                field: "max_batch_points",
                reason: format!(
                    "{} exceeds the {} points one datagram can carry",
                    self.max_batch_points, MAX_POINTS_PER_DATAGRAM
                ),
            });
        }
        if !(self.aggregate_resolution.is_finite() && self.aggregate_resolution > 0.0) {
            return Err(SettingsError::Invalid {
                field: "aggregate_resolution",
                reason: format!("{} is not a positive length", self.aggregate_resolution),
            });
        }
        if !self.up().is_finite() || self.up().length_squared() <= f32::EPSILON {
            return Err(SettingsError::Invalid {
                field: "up_axis",
                reason: "must be a non-zero vector".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_constants() {
        let settings = CaptureSettings::default();
        assert_eq!(settings.confidence_threshold, 0.4);
        assert_eq!(settings.ready_point_count, 500);
        assert_eq!(settings.flush_threshold, 5000);
        assert_eq!(settings.max_batch_points, 5000);
        assert_eq!(settings.up(), Vec3::Y);
        assert_eq!(settings.coordinate_space, CoordinateSpace::Plane);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "flush_threshold": 100, "max_batch_points": 250, "coordinate_space": "world" }"#;
        let settings = CaptureSettings::from_json(json).unwrap();
        assert_eq!(settings.flush_threshold, 100);
        assert_eq!(settings.max_batch_points, 250);
        assert_eq!(settings.ready_point_count, 500);
        assert_eq!(settings.coordinate_space, CoordinateSpace::World);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(CaptureSettings::from_json(r#"{ "flush_threshold": 0 }"#).is_err());
        assert!(CaptureSettings::from_json(r#"{ "max_batch_points": 10 }"#).is_err());
        assert!(CaptureSettings::from_json(r#"{ "aggregate_resolution": -1.0 }"#).is_err());
        assert!(CaptureSettings::from_json(r#"{ "up_axis": [0.0, 0.0, 0.0] }"#).is_err());
        assert!(CaptureSettings::from_json("not json").is_err());
    }

    #[test]
    fn test_batch_size_capped_to_one_datagram() {
        assert_eq!(MAX_POINTS_PER_DATAGRAM, 5458);
        let largest = r#"{ "max_batch_points": 5458 }"#;
        assert!(CaptureSettings::from_json(largest).is_ok());

        let err = CaptureSettings::from_json(r#"{ "max_batch_points": 6000 }"#).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Invalid {
                field: "max_batch_points",
                ..
            }
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "up_axis": [0.0, 0.0, 1.0], "visualize_points": false }}"#).unwrap();

        let settings = CaptureSettings::load(file.path()).unwrap();
        assert_eq!(settings.up(), Vec3::Z);
        assert!(!settings.visualize_points);
    }
}
