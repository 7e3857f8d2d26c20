/// Binary framing of feature point batches.
///
/// ```text
/// ┌───────────────────────┬─────────┬──────────┬──────────┬──────────┬─────
/// │ timestamp ms (i64 LE) │ type u8 │ x f32 LE │ y f32 LE │ z f32 LE │ ...
/// └───────────────────────┴─────────┴──────────┴──────────┴──────────┴─────
/// ```
///
/// There is no length prefix; the point count is the payload length divided by 12.
use bevy::math::Vec3;
use constants::wire::{HEADER_LEN, MESSAGE_TYPE_FEATURE_BATCH, POINT_STRIDE, TIMESTAMP_LEN};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::DecodeError;

/// A decoded batch as seen by the remote consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBatch {
    pub timestamp_ms: i64,
    pub points: Vec<Vec3>,
}

/// Milliseconds since the Unix epoch; negative if the clock is before 1970.
pub fn now_millis() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_millis() as i64,
        Err(before) => -(before.duration().as_millis() as i64),
    }
}

/// Encode a batch stamped with the current time.
pub fn encode(points: &[Vec3]) -> Vec<u8> {
    encode_at(points, now_millis())
}

/// Encode a batch with an explicit timestamp.
pub fn encode_at(points: &[Vec3], timestamp_ms: i64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(encoded_len(points.len()));
    bytes.extend_from_slice(&timestamp_ms.to_le_bytes());
    bytes.push(MESSAGE_TYPE_FEATURE_BATCH);
    for point in points {
        bytes.extend_from_slice(&point.x.to_le_bytes());
        bytes.extend_from_slice(&point.y.to_le_bytes());
        bytes.extend_from_slice(&point.z.to_le_bytes());
    }
    bytes
}

/// Size in bytes of an encoded batch of `point_count` points.
pub fn encoded_len(point_count: usize) -> usize {
    HEADER_LEN + POINT_STRIDE * point_count
}

pub fn decode(bytes: &[u8]) -> Result<FeatureBatch, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::TooShort(bytes.len()));
    }

    let (timestamp, rest) = bytes.split_at(TIMESTAMP_LEN);
    let mut timestamp_bytes = [0u8; TIMESTAMP_LEN];
    timestamp_bytes.copy_from_slice(timestamp);

    let message_type = rest[0];
    if message_type != MESSAGE_TYPE_FEATURE_BATCH {
        return Err(DecodeError::UnknownMessageType(message_type));
    }

    let payload = &rest[1..];
    if payload.len() % POINT_STRIDE != 0 {
        return Err(DecodeError::TrailingBytes(payload.len()));
    }

    let points = payload
        .chunks_exact(POINT_STRIDE)
        .map(|chunk| {
            let coord = |i: usize| {
                f32::from_le_bytes([chunk[i], chunk[i + 1], chunk[i + 2], chunk[i + 3]])
            };
            Vec3::new(coord(0), coord(4), coord(8))
        })
        .collect();

    Ok(FeatureBatch {
        timestamp_ms: i64::from_le_bytes(timestamp_bytes),
        points,
    })
}
