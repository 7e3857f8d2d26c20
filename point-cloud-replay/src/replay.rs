/// Replays a recorded capture through calibration and batch streaming.
use bevy::math::{Vec2, Vec3};
use indicatif::{ProgressBar, ProgressStyle};
use point_cloud_capture::{
    CaptureSession, CaptureSettings, CoordinateSpace, FeatureFrame, FileTransport, FrameContext,
    PlacementOutcome, PlaneFrame, Pose, QueuedFeatureSource, SurfaceLocator, aggregate, decode,
};
use rayon::prelude::*;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::bounds::PointBounds;
use crate::summary::{BatchInfo, PlaneInfo, ReplaySummary};

type ReplaySession = CaptureSession<ScriptedLocator, QueuedFeatureSource, FileTransport>;

/// Surface locator that hits wherever the script currently points.
#[derive(Debug, Default)]
pub struct ScriptedLocator {
    target: Option<Vec3>,
}

impl SurfaceLocator for ScriptedLocator {
    fn raycast(&mut self, _viewport: Vec2) -> Vec<Pose> {
        self.target.map(Pose::from_position).into_iter().collect()
    }
}

#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Origin, width and height taps in world coordinates.
    pub calibration: [Vec3; 3],
    /// Points delivered per simulated frame.
    pub frame_size: usize,
    /// Confidence reported for every replayed point.
    pub confidence: f32,
    pub settings: CaptureSettings,
    pub output_dir: PathBuf,
}

pub struct Replay {
    config: ReplayConfig,
}

impl Replay {
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }

    /// Run the full capture over `points` (world coordinates) and summarise it.
    pub fn run(&self, points: &[Vec3]) -> Result<ReplaySummary, Box<dyn std::error::Error>> {
        let batch_dir = self.config.output_dir.join("batches");
        let transport = FileTransport::new(&batch_dir)?;
        let mut session = CaptureSession::new(
            ScriptedLocator::default(),
            QueuedFeatureSource::new(),
            transport,
            self.config.settings.clone(),
        )?;

        let frame = self.calibrate(&mut session)?;
        self.stream(&mut session, points)?;

        let summary = self.summarize(&session, &frame, points.len())?;
        summary.write(&self.config.output_dir.join("summary.json"))?;
        Ok(summary)
    }

    fn calibrate(
        &self,
        session: &mut ReplaySession,
    ) -> Result<PlaneFrame, Box<dyn std::error::Error>> {
        for (index, &tap) in self.config.calibration.iter().enumerate() {
            session.locator_mut().target = Some(tap);
            session.request_place();
            match session.tick(&FrameContext::default()).placement {
                Some(PlacementOutcome::Placed { .. }) => {}
                Some(PlacementOutcome::Completed(frame)) => return Ok(frame),
                Some(PlacementOutcome::Rejected(err)) => {
                    return Err(format!("calibration point {} rejected: {}", index, err).into());
                }
                other => {
                    return Err(
                        format!("calibration point {} not placed: {:?}", index, other).into(),
                    );
                }
            }
        }
        Err("calibration did not complete".into())
    }

    fn stream(
        &self,
        session: &mut ReplaySession,
        points: &[Vec3],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let frame_size = self.config.frame_size.max(1);

        let pb = ProgressBar::new(points.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.green/blue}] {pos}/{len} points ({percent}%) {msg}")?
                .progress_chars("▉▊▋▌▍▎▏ "),
        );
        pb.set_message("Streaming feature frames");

        let ctx = FrameContext::default();
        for chunk in points.chunks(frame_size) {
            session
                .source_mut()
                .push(FeatureFrame::uniform(chunk.to_vec(), self.config.confidence));
            let report = session.tick(&ctx);
            if report.transmit_failed {
                warn!("Batch lost while streaming");
            }
            pb.inc(chunk.len() as u64);
        }

        // One batch per tick: keep ticking until the backlog is below the threshold.
        while session.pending_points() >= session.settings().flush_threshold {
            session.tick(&ctx);
        }
        pb.finish_with_message("Capture streamed");
        Ok(())
    }

    fn summarize(
        &self,
        session: &ReplaySession,
        frame: &PlaneFrame,
        points_read: usize,
    ) -> Result<ReplaySummary, Box<dyn std::error::Error>> {
        let transport = session.transport();
        let paths: Vec<PathBuf> = (0..transport.written())
            .map(|index| transport.batch_path(index))
            .collect();

        let mut encoded = Vec::with_capacity(paths.len());
        for path in &paths {
            encoded.push(fs::read(path)?);
        }
        let batches = encoded
            .par_iter()
            .map(|bytes| decode(bytes))
            .collect::<Result<Vec<_>, _>>()?;

        let batch_info = paths
            .iter()
            .zip(&batches)
            .map(|(path, batch)| BatchInfo {
                file: path
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string(),
                timestamp_ms: batch.timestamp_ms,
                point_count: batch.points.len(),
            })
            .collect();

        let sent: Vec<Vec3> = batches.into_iter().flat_map(|batch| batch.points).collect();
        let plane_points: Vec<Vec3> = match self.config.settings.coordinate_space {
            CoordinateSpace::Plane => sent,
            CoordinateSpace::World => sent.par_iter().map(|&p| frame.project_point(p)).collect(),
        };

        let bounds = plane_points
            .par_chunks(25_000)
            .map(|chunk| {
                let mut local_bounds = PointBounds::new();
                for &point in chunk {
                    local_bounds.update(point);
                }
                local_bounds
            })
            .reduce_with(PointBounds::merge)
            .unwrap_or_default();

        let resolution = self.config.settings.aggregate_resolution;
        let aggregated = aggregate(&plane_points, resolution)?;
        info!(
            "Aggregated {} sent points to {} cells at {} m",
            plane_points.len(),
            aggregated.len(),
            resolution
        );

        Ok(ReplaySummary {
            plane: PlaneInfo::from(frame),
            points_read,
            batches: batch_info,
            points_sent: plane_points.len(),
            points_unsent: session.pending_points(),
            coordinate_space: self.config.settings.coordinate_space,
            aggregate_resolution: resolution,
            aggregated_points: aggregated.len(),
            bounds,
            stats: session.stats(),
        })
    }
}
