/// Message identifier of a feature point batch, the only message this link carries
pub const MESSAGE_TYPE_FEATURE_BATCH: u8 = 1;

/// Size of the little-endian i64 Unix epoch millisecond timestamp
pub const TIMESTAMP_LEN: usize = 8;

/// Timestamp plus message type byte
pub const HEADER_LEN: usize = TIMESTAMP_LEN + 1;

/// Three little-endian f32 coordinates per point
pub const POINT_STRIDE: usize = 12;

/// Largest payload a single UDP datagram can carry
pub const MAX_DATAGRAM_LEN: usize = 65_507;

/// Most points whose encoded batch still fits one UDP datagram
pub const MAX_POINTS_PER_DATAGRAM: usize = (MAX_DATAGRAM_LEN - HEADER_LEN) / POINT_STRIDE;
