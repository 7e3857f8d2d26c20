//! Per-frame orchestration of calibration, accumulation and streaming.
//!
//! ## Tick order
//!
//! ```text
//! tick(FrameContext)
//!   ├─ tracking status
//!   ├─ until placed: acquire pose ─> drain place command ─> commit
//!   └─ once placed:  poll feature frame ─> accept ─> (≥ threshold) drain ─> encode ─> publish
//! ```
//!
//! Each tick performs at most one pose search, one append and one
//! transmission. Nothing blocks and nothing is retried: a failed publish
//! loses its batch.

use bevy::math::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::accumulator::FeatureAccumulator;
use crate::aggregate::aggregate;
use crate::error::{AggregateError, SettingsError};
use crate::geometry::{FrameContext, Pose, TrackingState, look_rotation};
use crate::placement::{PlacementController, PlacementOutcome, PlacementStage, SurfaceLocator};
use crate::plane::{PlaneCalibrator, PlaneFrame};
use crate::settings::{CaptureSettings, CoordinateSpace};
use crate::source::FeatureSource;
use crate::transport::Transport;
use crate::wire;

/// Rendering collaborator receiving the feature point visualization toggle.
pub trait VisualizationSink {
    fn set_point_visualization(&mut self, enabled: bool);
}

/// Running totals for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureStats {
    pub frames_received: usize,
    pub points_accepted: usize,
    pub batches_sent: usize,
    pub points_sent: usize,
    pub transmit_failures: usize,
    pub points_lost: usize,
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    /// Candidate placement pose, while placement is running.
    pub indicator: Option<Pose>,
    /// Outcome of the place command consumed this tick, if any.
    pub placement: Option<PlacementOutcome>,
    /// Points appended to the buffer.
    pub accepted: usize,
    /// The accumulator's ready signal was raised.
    pub ready: bool,
    /// Points in the batch handed to the transport.
    pub transmitted: Option<usize>,
    /// The transport reported a failure for this tick's batch.
    pub transmit_failed: bool,
}

pub struct CaptureSession<L, S, T> {
    locator: L,
    source: S,
    transport: T,
    settings: CaptureSettings,
    placement: PlacementController,
    accumulator: FeatureAccumulator,
    place_requested: bool,
    gate_open: bool,
    camera: Pose,
    tracking: TrackingState,
    visualize: bool,
    visualizer: Option<Box<dyn VisualizationSink>>,
    stats: CaptureStats,
}

impl<L, S, T> CaptureSession<L, S, T>
where
    L: SurfaceLocator,
    S: FeatureSource,
    T: Transport,
{
    /// Build a session around its collaborators. Settings are validated first.
    pub fn new(
        locator: L,
        source: S,
        transport: T,
        settings: CaptureSettings,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        let calibrator = PlaneCalibrator::with_up_axis(settings.up());
        let accumulator =
            FeatureAccumulator::new(settings.confidence_threshold, settings.ready_point_count);
        let visualize = settings.visualize_points;

        Ok(Self {
            locator,
            source,
            transport,
            settings,
            placement: PlacementController::new(calibrator),
            accumulator,
            place_requested: false,
            gate_open: false,
            camera: Pose::default(),
            tracking: TrackingState::default(),
            visualize,
            visualizer: None,
            stats: CaptureStats::default(),
        })
    }

    /// Attach the rendering collaborator; it immediately receives the current toggle.
    pub fn with_visualizer(mut self, mut visualizer: Box<dyn VisualizationSink>) -> Self {
        visualizer.set_point_visualization(self.visualize);
        self.visualizer = Some(visualizer);
        self
    }

    /// Queue a place command for the next tick. Repeated requests before
    /// that tick collapse into one.
    pub fn request_place(&mut self) {
        self.place_requested = true;
    }

    /// Open the capture gate. Returns false, leaving it closed, while the
    /// plane is not yet calibrated.
    pub fn placement_finished(&mut self) -> bool {
        if self.placement.frame().is_none() {
            warn!("Placement finished signalled before calibration completed");
            return false;
        }
        if !self.gate_open {
            info!("Placement finished, feature capture enabled");
        }
        self.gate_open = true;
        true
    }

    /// Forward the feature point visualization toggle to the renderer.
    pub fn set_visualization(&mut self, enabled: bool) {
        self.visualize = enabled;
        if let Some(visualizer) = self.visualizer.as_mut() {
            visualizer.set_point_visualization(enabled);
        }
    }

    pub fn tick(&mut self, frame: &FrameContext) -> TickReport {
        let mut report = TickReport::default();
        self.camera = frame.camera;
        self.update_tracking(frame.tracking);

        if !self.placement.is_done() {
            report.indicator = self
                .placement
                .acquire_pose(&mut self.locator, &self.camera);

            if std::mem::take(&mut self.place_requested) {
                let outcome = self.placement.place();
                if matches!(outcome, PlacementOutcome::Completed(_)) {
                    self.placement_finished();
                }
                report.placement = Some(outcome);
            }
        } else if std::mem::take(&mut self.place_requested) {
            report.placement = Some(PlacementOutcome::Ignored);
        }

        if !self.gate_open {
            return report;
        }

        if let Some(features) = self.source.poll_frame() {
            let before = self.accumulator.len();
            report.ready = self
                .accumulator
                .accept(&features.positions, &features.confidences);
            report.accepted = self.accumulator.len() - before;
            self.stats.frames_received += 1;
            self.stats.points_accepted += report.accepted;
            if report.ready {
                debug!("Feature buffer ready with {} points", self.accumulator.len());
            }
        }

        if self.accumulator.len() >= self.settings.flush_threshold {
            self.transmit(&mut report);
        }

        report
    }

    fn transmit(&mut self, report: &mut TickReport) {
        let batch = self.accumulator.drain_batch(self.settings.max_batch_points);
        let points = match (self.settings.coordinate_space, self.placement.frame()) {
            (CoordinateSpace::Plane, Some(frame)) => {
                batch.iter().map(|&p| frame.project_point(p)).collect()
            }
            _ => batch,
        };
        let bytes = wire::encode(&points);

        match self.transport.publish(&bytes) {
            Ok(()) => {
                self.stats.batches_sent += 1;
                self.stats.points_sent += points.len();
                report.transmitted = Some(points.len());
                info!(
                    "Sent batch of {} points ({} bytes), {} still buffered",
                    points.len(),
                    bytes.len(),
                    self.accumulator.len()
                );
            }
            Err(err) => {
                self.stats.transmit_failures += 1;
                self.stats.points_lost += points.len();
                report.transmit_failed = true;
                warn!("Failed to send batch of {} points: {}", points.len(), err);
            }
        }
    }

    fn update_tracking(&mut self, tracking: TrackingState) {
        if tracking != self.tracking {
            if tracking.is_tracking() {
                info!("Tracking restored");
            } else {
                warn!("Tracking degraded: {:?}", tracking);
            }
        }
        self.tracking = tracking;
    }

    pub fn stage(&self) -> PlacementStage {
        self.placement.stage()
    }

    pub fn placement(&self) -> &PlacementController {
        &self.placement
    }

    pub fn frame(&self) -> Option<PlaneFrame> {
        self.placement.frame()
    }

    pub fn indicator(&self) -> Option<Pose> {
        self.placement.indicator()
    }

    pub fn markers(&self) -> &[Vec3] {
        self.placement.markers()
    }

    pub fn is_gate_open(&self) -> bool {
        self.gate_open
    }

    pub fn is_visualizing(&self) -> bool {
        self.visualize
    }

    pub fn tracking(&self) -> TrackingState {
        self.tracking
    }

    pub fn status_text(&self) -> &'static str {
        self.tracking.status_text()
    }

    /// Buffered points awaiting transmission.
    pub fn pending_points(&self) -> usize {
        self.accumulator.len()
    }

    /// Last camera pose, rotated to look along its forward with the session's up axis.
    pub fn camera_pose(&self) -> Pose {
        Pose::new(
            self.camera.position,
            look_rotation(self.camera.forward(), self.settings.up()),
        )
    }

    /// Camera position in plane coordinates.
    pub fn camera_plane_coordinates(&self) -> Option<Vec2> {
        self.frame()
            .map(|frame| frame.world_to_plane(self.camera.position))
    }

    /// Camera bearing relative to the width axis, in degrees.
    pub fn current_angle(&self) -> Option<f32> {
        self.frame()
            .map(|frame| frame.current_angle(self.camera.forward()))
    }

    /// Buffered points in plane space, snapped to the aggregation grid.
    pub fn aggregate_pending(&self) -> Result<Vec<Vec3>, AggregateError> {
        let Some(frame) = self.frame() else {
            return Ok(Vec::new());
        };
        let projected = frame.project_points(self.accumulator.points(), false);
        aggregate(&projected, self.settings.aggregate_resolution)
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    pub fn locator_mut(&mut self) -> &mut L {
        &mut self.locator
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
