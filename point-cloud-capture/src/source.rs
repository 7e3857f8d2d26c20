/// Feature point sources polled once per tick
use bevy::math::Vec3;
use crossbeam_channel::{Receiver, TryRecvError};
use std::collections::VecDeque;

/// One delivery of newly observed points with their per-point confidences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureFrame {
    pub positions: Vec<Vec3>,
    pub confidences: Vec<f32>,
}

impl FeatureFrame {
    pub fn new(positions: Vec<Vec3>, confidences: Vec<f32>) -> Self {
        Self {
            positions,
            confidences,
        }
    }

    /// Every point reported with the same confidence.
    pub fn uniform(positions: Vec<Vec3>, confidence: f32) -> Self {
        let confidences = vec![confidence; positions.len()];
        Self {
            positions,
            confidences,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Environment-tracking subsystem delivering feature points.
pub trait FeatureSource {
    /// Next pending delivery, if any. Must not block.
    fn poll_frame(&mut self) -> Option<FeatureFrame>;
}

impl<S: FeatureSource + ?Sized> FeatureSource for Box<S> {
    fn poll_frame(&mut self) -> Option<FeatureFrame> {
        (**self).poll_frame()
    }
}

/// Deliveries queued by the embedding application, handed out oldest first.
#[derive(Debug, Default)]
pub struct QueuedFeatureSource {
    frames: VecDeque<FeatureFrame>,
}

impl QueuedFeatureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: FeatureFrame) {
        self.frames.push_back(frame);
    }

    pub fn pending(&self) -> usize {
        self.frames.len()
    }
}

impl FeatureSource for QueuedFeatureSource {
    fn poll_frame(&mut self) -> Option<FeatureFrame> {
        self.frames.pop_front()
    }
}

/// Deliveries produced on another thread.
impl FeatureSource for Receiver<FeatureFrame> {
    fn poll_frame(&mut self) -> Option<FeatureFrame> {
        match self.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}
