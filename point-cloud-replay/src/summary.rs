/// Replay summary written next to the transmitted batches.
use point_cloud_capture::{CaptureStats, CoordinateSpace, PlaneFrame};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::bounds::PointBounds;

/// Calibrated plane in world coordinates.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlaneInfo {
    pub origin: [f32; 3],
    pub width_edge: [f32; 3],
    pub height_edge: [f32; 3],
}

impl From<&PlaneFrame> for PlaneInfo {
    fn from(frame: &PlaneFrame) -> Self {
        Self {
            origin: frame.origin().to_array(),
            width_edge: frame.width_edge().to_array(),
            height_edge: frame.height_edge().to_array(),
        }
    }
}

/// One transmitted batch as written by the file transport.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BatchInfo {
    pub file: String,
    pub timestamp_ms: i64,
    pub point_count: usize,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ReplaySummary {
    pub plane: PlaneInfo,
    pub points_read: usize,
    pub batches: Vec<BatchInfo>,
    pub points_sent: usize,
    /// Points left buffered below the flush threshold when the capture ended.
    pub points_unsent: usize,
    pub coordinate_space: CoordinateSpace,
    pub aggregate_resolution: f32,
    /// Sent points remaining after plane-space aggregation.
    pub aggregated_points: usize,
    /// Plane-space (width, height, depth) bounds of the sent points.
    pub bounds: PointBounds,
    pub stats: CaptureStats,
}

impl ReplaySummary {
    pub fn write(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        println!("Summary saved: {}", path.display());
        Ok(())
    }
}
