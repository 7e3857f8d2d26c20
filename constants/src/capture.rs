/// Feature points at or below this confidence are discarded on arrival
pub const CONFIDENCE_THRESHOLD: f32 = 0.4;

/// Buffered point count that raises the accumulator's ready signal
pub const READY_POINT_COUNT: usize = 500;

/// Pending point count at which a batch is encoded and transmitted
pub const FLUSH_THRESHOLD: usize = 5000;

/// Upper bound on the number of points carried by one transmitted batch
pub const MAX_BATCH_POINTS: usize = FLUSH_THRESHOLD;

/// Minimum height above the calibration plane, along its up-facing normal, kept by filtered projections (metres)
pub const DEPTH_FILTER_THRESHOLD: f32 = 0.2;

/// Default grid resolution used when aggregating plane-space points (metres)
pub const DEFAULT_AGGREGATE_RESOLUTION: f32 = 0.05;
