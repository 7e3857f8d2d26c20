//! Planar calibration and feature point streaming.
//!
//! A user taps three points on a tracked surface; those points define a
//! levelled, right-angled coordinate plane. Once the plane exists, feature
//! points observed by the tracking subsystem are confidence-filtered,
//! buffered and streamed to a remote consumer in fixed binary batches.
//!
//! ## Per-frame flow
//!
//! ```text
//! SurfaceLocator ──> PlacementController ──> PlaneCalibrator ──> PlaneFrame
//!                                                                   │ (gate)
//! FeatureSource ──> FeatureAccumulator ──(threshold)──> encode ──> Transport
//! ```
//!
//! [`CaptureSession`] owns the three collaborators and advances everything
//! from a single [`CaptureSession::tick`] per display frame.

pub mod accumulator;
pub mod aggregate;
pub mod error;
pub mod geometry;
pub mod placement;
pub mod plane;
pub mod session;
pub mod settings;
pub mod source;
pub mod transport;
pub mod wire;

pub use accumulator::FeatureAccumulator;
pub use aggregate::{aggregate, round_to_target};
pub use error::{AggregateError, CalibrationError, DecodeError, SettingsError, TransportError};
pub use geometry::{FrameContext, Pose, TrackingState};
pub use placement::{PlacementController, PlacementOutcome, PlacementStage, SurfaceLocator};
pub use plane::{PlaneCalibrator, PlaneFrame};
pub use session::{CaptureSession, CaptureStats, TickReport, VisualizationSink};
pub use settings::{CaptureSettings, CoordinateSpace};
pub use source::{FeatureFrame, FeatureSource, QueuedFeatureSource};
pub use transport::{FileTransport, MemoryTransport, Transport, UdpTransport};
pub use wire::{FeatureBatch, decode, encode, encode_at};
