/// Error types for calibration, aggregation, wire decoding, transport and settings
use thiserror::Error;

/// Reasons a placement commit is rejected by the calibrator.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CalibrationError {
    #[error("calibration already complete")]
    AlreadyComplete,

    #[error("width edge too short ({length:.4} m), place the second point further from the origin")]
    DegenerateWidth { length: f32 },

    #[error(
        "height edge too short after levelling ({length:.4} m), place the third point away from the width edge"
    )]
    DegenerateHeight { length: f32 },

    #[error("non-finite placement position {0:?}")]
    NonFinite([f32; 3]),
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum AggregateError {
    #[error("aggregation resolution must be positive and finite, got {0}")]
    InvalidResolution(f32),
}

/// Wire decoding failures on the consumer side.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("buffer of {0} bytes is shorter than the 9 byte header")]
    TooShort(usize),

    #[error("unknown message type {0}")]
    UnknownMessageType(u8),

    #[error("payload of {0} bytes is not a whole number of points")]
    TrailingBytes(usize),
}

/// Transport failures; the affected batch is not retried.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("batch of {len} bytes exceeds the {max} byte datagram limit")]
    Oversized { len: usize, max: usize },

    #[error("transport closed")]
    Closed,
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
