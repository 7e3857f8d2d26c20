/// Confidence-filtered feature point buffer
use bevy::math::Vec3;
use constants::capture::{CONFIDENCE_THRESHOLD, READY_POINT_COUNT};
use tracing::trace;

/// Buffers accepted feature points until the owner drains them.
///
/// Points at or below the confidence threshold are the only ones ever
/// discarded; everything else stays buffered, in arrival order, until a
/// [`FeatureAccumulator::flush`] or [`FeatureAccumulator::drain_batch`].
#[derive(Debug, Clone)]
pub struct FeatureAccumulator {
    points: Vec<Vec3>,
    confidence_threshold: f32,
    ready_count: usize,
    ready: bool,
}

impl Default for FeatureAccumulator {
    fn default() -> Self {
        Self::new(CONFIDENCE_THRESHOLD, READY_POINT_COUNT)
    }
}

impl FeatureAccumulator {
    pub fn new(confidence_threshold: f32, ready_count: usize) -> Self {
        Self {
            points: Vec::new(),
            confidence_threshold,
            ready_count,
            ready: false,
        }
    }

    /// Append every point whose confidence exceeds the threshold.
    ///
    /// Returns true when this call raised the ready signal, i.e. the buffer
    /// (including earlier accumulation) reached the ready count. Only the
    /// common prefix of the two slices is examined.
    pub fn accept(&mut self, points: &[Vec3], confidences: &[f32]) -> bool {
        let before = self.points.len();
        let threshold = self.confidence_threshold;
        self.points.extend(
            points
                .iter()
                .zip(confidences)
                .filter(|&(_, &confidence)| confidence > threshold)
                .map(|(&point, _)| point),
        );
        trace!(
            "Accepted {} of {} feature points ({} buffered)",
            self.points.len() - before,
            points.len().min(confidences.len()),
            self.points.len()
        );

        let raised = !self.ready && self.points.len() >= self.ready_count;
        if raised {
            self.ready = true;
        }
        raised
    }

    /// Whether the ready signal is up; it stays up until the next drain.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Take every buffered point, leaving the buffer empty.
    pub fn flush(&mut self) -> Vec<Vec3> {
        self.ready = false;
        std::mem::take(&mut self.points)
    }

    /// Take at most `max_points` of the oldest buffered points.
    pub fn drain_batch(&mut self, max_points: usize) -> Vec<Vec3> {
        if max_points >= self.points.len() {
            return self.flush();
        }
        let batch: Vec<Vec3> = self.points.drain(..max_points).collect();
        self.ready = self.points.len() >= self.ready_count;
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(n: usize) -> Vec<Vec3> {
        (0..n).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect()
    }

    #[test]
    fn test_filters_by_confidence() {
        let mut acc = FeatureAccumulator::default();
        let pts = points(4);

        acc.accept(&pts, &[0.1, 0.4, 0.41, 0.9]);

        assert_eq!(acc.points(), &[pts[2], pts[3]]);
    }

    #[test]
    fn test_ready_signal_threshold() {
        let mut acc = FeatureAccumulator::default();
        assert!(!acc.accept(&points(499), &vec![0.5; 499]));
        assert!(!acc.is_ready());

        let mut acc = FeatureAccumulator::default();
        assert!(acc.accept(&points(500), &vec![0.5; 500]));
        assert!(acc.is_ready());
    }

    #[test]
    fn test_ready_counts_prior_accumulation() {
        let mut acc = FeatureAccumulator::default();
        assert!(!acc.accept(&points(499), &vec![0.5; 499]));
        assert!(acc.accept(&points(1), &[0.5]));
        // already raised, not raised again
        assert!(!acc.accept(&points(10), &vec![0.5; 10]));
        assert!(acc.is_ready());
    }

    #[test]
    fn test_low_confidence_points_do_not_count_towards_ready() {
        let mut acc = FeatureAccumulator::default();
        let mut confidences = vec![0.5; 500];
        confidences[0] = 0.2;
        assert!(!acc.accept(&points(500), &confidences));
        assert_eq!(acc.len(), 499);
    }

    #[test]
    fn test_flush_twice_returns_empty() {
        let mut acc = FeatureAccumulator::default();
        acc.accept(&points(600), &vec![0.9; 600]);

        assert_eq!(acc.flush().len(), 600);
        assert!(!acc.is_ready());
        assert!(acc.flush().is_empty());
    }

    #[test]
    fn test_drain_batch_keeps_remainder_in_order() {
        let mut acc = FeatureAccumulator::default();
        let pts = points(1200);
        acc.accept(&pts, &vec![0.9; 1200]);

        let first = acc.drain_batch(1000);
        assert_eq!(first, pts[..1000]);
        assert_eq!(acc.points(), &pts[1000..]);
        assert!(!acc.is_ready());

        let rest = acc.drain_batch(1000);
        assert_eq!(rest, pts[1000..]);
        assert!(acc.is_empty());
    }

    #[test]
    fn test_mismatched_lengths_use_common_prefix() {
        let mut acc = FeatureAccumulator::default();
        acc.accept(&points(5), &[0.9, 0.9]);
        assert_eq!(acc.len(), 2);
    }
}
