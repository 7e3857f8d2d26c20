/// Three-tap placement flow driving the plane calibrator
use bevy::math::{Vec2, Vec3};
use constants::placement::{FALLBACK_SHIFTS, SCREEN_CENTER};
use tracing::{info, trace, warn};

use crate::error::CalibrationError;
use crate::geometry::{Pose, look_rotation};
use crate::plane::{PlaneCalibrator, PlaneFrame};

/// Raycasts against the tracked real-world surface.
pub trait SurfaceLocator {
    /// Candidate hits for the ray through a viewport point (both axes in 0..1),
    /// nearest first. Empty when nothing tracked is hit.
    fn raycast(&mut self, viewport: Vec2) -> Vec<Pose>;
}

impl<L: SurfaceLocator + ?Sized> SurfaceLocator for Box<L> {
    fn raycast(&mut self, viewport: Vec2) -> Vec<Pose> {
        (**self).raycast(viewport)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementStage {
    AwaitingPoint0,
    AwaitingPoint1,
    AwaitingPoint2,
    Done,
}

impl PlacementStage {
    fn from_count(placed: usize) -> Self {
        match placed {
            0 => Self::AwaitingPoint0,
            1 => Self::AwaitingPoint1,
            2 => Self::AwaitingPoint2,
            _ => Self::Done,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Result of consuming one place command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementOutcome {
    /// Placement already finished; the command has no effect.
    Ignored,
    /// No valid pose this frame; the command is dropped.
    NoPose,
    /// The calibrator refused the point; the stage is unchanged.
    Rejected(CalibrationError),
    /// A point was committed and more are needed.
    Placed { index: usize, position: Vec3 },
    /// The third point was committed.
    Completed(PlaneFrame),
}

/// Viewport points searched in order: the centre, then 16 shifted points.
pub fn search_pattern() -> impl Iterator<Item = Vec2> {
    std::iter::once(SCREEN_CENTER).chain(FALLBACK_SHIFTS.into_iter().flat_map(|dx| {
        FALLBACK_SHIFTS
            .into_iter()
            .map(move |dy| SCREEN_CENTER + Vec2::new(dx, dy))
    }))
}

/// Tracks the candidate placement pose and commits taps into the calibrator.
#[derive(Debug, Clone)]
pub struct PlacementController {
    calibrator: PlaneCalibrator,
    pending_pose: Option<Pose>,
    markers: Vec<Vec3>,
}

impl Default for PlacementController {
    fn default() -> Self {
        Self::new(PlaneCalibrator::new())
    }
}

impl PlacementController {
    pub fn new(calibrator: PlaneCalibrator) -> Self {
        Self {
            calibrator,
            pending_pose: None,
            markers: Vec::new(),
        }
    }

    pub fn stage(&self) -> PlacementStage {
        PlacementStage::from_count(self.calibrator.placed_count())
    }

    pub fn is_done(&self) -> bool {
        self.stage().is_done()
    }

    pub fn calibrator(&self) -> &PlaneCalibrator {
        &self.calibrator
    }

    pub fn frame(&self) -> Option<PlaneFrame> {
        self.calibrator.frame()
    }

    /// Latest valid candidate pose, refreshed by [`Self::acquire_pose`].
    pub fn pending_pose(&self) -> Option<Pose> {
        self.pending_pose
    }

    /// Pose of the target indicator; hidden (None) without a pose or once done.
    pub fn indicator(&self) -> Option<Pose> {
        if self.is_done() {
            return None;
        }
        self.pending_pose
    }

    /// Positions where placement markers stand: one per committed point, plus
    /// the far corner once the plane is complete.
    pub fn markers(&self) -> &[Vec3] {
        &self.markers
    }

    /// Search the viewport for a surface hit and refresh the pending pose.
    ///
    /// The pose takes the first candidate's position and faces along the
    /// camera's forward direction.
    pub fn acquire_pose<L: SurfaceLocator + ?Sized>(
        &mut self,
        locator: &mut L,
        camera: &Pose,
    ) -> Option<Pose> {
        if self.is_done() {
            self.pending_pose = None;
            return None;
        }

        let hit = search_pattern().find_map(|viewport| locator.raycast(viewport).into_iter().next());

        self.pending_pose = hit.map(|hit| {
            Pose::new(
                hit.position,
                look_rotation(camera.forward(), self.calibrator.up_axis()),
            )
        });
        if self.pending_pose.is_none() {
            trace!("No placement pose available this frame");
        }
        self.pending_pose
    }

    /// Consume one place command against the current pending pose.
    pub fn place(&mut self) -> PlacementOutcome {
        if self.is_done() {
            return PlacementOutcome::Ignored;
        }
        let Some(pose) = self.pending_pose else {
            trace!("Place command dropped, no valid pose");
            return PlacementOutcome::NoPose;
        };

        let index = self.calibrator.placed_count();
        match self.calibrator.commit_point(pose.position) {
            Err(err) => {
                warn!("Placement point {} rejected: {}", index, err);
                PlacementOutcome::Rejected(err)
            }
            Ok(Some(frame)) => {
                self.markers.push(self.calibrator.points()[index]);
                self.markers.push(frame.far_corner());
                self.pending_pose = None;
                info!(
                    "Plane calibrated: origin {:?}, width {:?}, height {:?}",
                    frame.origin(),
                    frame.width_edge(),
                    frame.height_edge()
                );
                PlacementOutcome::Completed(frame)
            }
            Ok(None) => {
                let position = self.calibrator.points()[index];
                self.markers.push(position);
                info!("Placement point {} committed at {:?}", index, position);
                PlacementOutcome::Placed { index, position }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Hits only at listed viewport points, remembering every query.
    struct GridLocator {
        hits: Vec<(Vec2, Vec3)>,
        queries: Vec<Vec2>,
    }

    impl GridLocator {
        fn new(hits: Vec<(Vec2, Vec3)>) -> Self {
            Self {
                hits,
                queries: Vec::new(),
            }
        }
    }

    impl SurfaceLocator for GridLocator {
        fn raycast(&mut self, viewport: Vec2) -> Vec<Pose> {
            self.queries.push(viewport);
            self.hits
                .iter()
                .filter(|(at, _)| at.distance(viewport) < 1e-6)
                .map(|&(_, position)| Pose::from_position(position))
                .collect()
        }
    }

    /// Always hits at a movable target.
    struct TargetLocator(Vec3);

    impl SurfaceLocator for TargetLocator {
        fn raycast(&mut self, _viewport: Vec2) -> Vec<Pose> {
            vec![Pose::from_position(self.0), Pose::from_position(self.0 + Vec3::Y)]
        }
    }

    fn camera() -> Pose {
        Pose::new(Vec3::new(0.0, 1.5, 0.0), look_rotation(Vec3::new(0.0, -0.5, 1.0), Vec3::Y))
    }

    #[test]
    fn test_search_pattern_order() {
        let pattern: Vec<Vec2> = search_pattern().collect();

        assert_eq!(pattern.len(), 17);
        assert_eq!(pattern[0], Vec2::new(0.5, 0.5));
        assert_relative_eq!(pattern[1].x, 0.48, epsilon = 1e-6);
        assert_relative_eq!(pattern[1].y, 0.48, epsilon = 1e-6);
        assert_relative_eq!(pattern[2].y, 0.52, epsilon = 1e-6);
        assert_relative_eq!(pattern[4].y, 0.55, epsilon = 1e-6);
        assert_relative_eq!(pattern[5].x, 0.52, epsilon = 1e-6);
        assert_relative_eq!(pattern[16].x, 0.55, epsilon = 1e-6);
        assert_relative_eq!(pattern[16].y, 0.55, epsilon = 1e-6);
    }

    #[test]
    fn test_centre_hit_stops_search() {
        let mut locator = GridLocator::new(vec![(SCREEN_CENTER, Vec3::new(1.0, 0.0, 2.0))]);
        let mut controller = PlacementController::default();

        let pose = controller.acquire_pose(&mut locator, &camera()).unwrap();

        assert_eq!(pose.position, Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(locator.queries.len(), 1);
        // faces along the camera's view direction
        let expected = camera().forward();
        assert_relative_eq!(pose.forward().x, expected.x, epsilon = 1e-5);
        assert_relative_eq!(pose.forward().y, expected.y, epsilon = 1e-5);
        assert_relative_eq!(pose.forward().z, expected.z, epsilon = 1e-5);
    }

    #[test]
    fn test_fallback_stops_at_first_hit() {
        let fallback = SCREEN_CENTER + Vec2::new(0.02, -0.05);
        let later = SCREEN_CENTER + Vec2::new(0.05, 0.05);
        let mut locator = GridLocator::new(vec![(later, Vec3::ONE), (fallback, Vec3::X)]);
        let mut controller = PlacementController::default();

        let pose = controller.acquire_pose(&mut locator, &camera()).unwrap();

        assert_eq!(pose.position, Vec3::X);
        // centre, the four x = -0.02 points, then x = +0.02 up to dy = -0.05
        assert_eq!(locator.queries.len(), 1 + 4 + 3);
    }

    #[test]
    fn test_no_pose_hides_indicator_and_drops_command() {
        let mut locator = GridLocator::new(Vec::new());
        let mut controller = PlacementController::default();

        assert!(controller.acquire_pose(&mut locator, &camera()).is_none());
        assert_eq!(locator.queries.len(), 17);
        assert!(controller.indicator().is_none());
        assert_eq!(controller.place(), PlacementOutcome::NoPose);
        assert_eq!(controller.stage(), PlacementStage::AwaitingPoint0);
    }

    #[test]
    fn test_three_taps_complete_the_plane() {
        let mut locator = TargetLocator(Vec3::new(0.0, 0.1, 0.0));
        let mut controller = PlacementController::default();
        let cam = camera();

        controller.acquire_pose(&mut locator, &cam);
        assert!(controller.indicator().is_some());
        assert_eq!(
            controller.place(),
            PlacementOutcome::Placed {
                index: 0,
                position: Vec3::new(0.0, 0.1, 0.0)
            }
        );
        assert_eq!(controller.stage(), PlacementStage::AwaitingPoint1);

        locator.0 = Vec3::new(2.0, 0.3, 0.0);
        controller.acquire_pose(&mut locator, &cam);
        assert!(matches!(controller.place(), PlacementOutcome::Placed { index: 1, .. }));
        assert_eq!(controller.stage(), PlacementStage::AwaitingPoint2);

        locator.0 = Vec3::new(0.5, 0.0, 1.5);
        controller.acquire_pose(&mut locator, &cam);
        let PlacementOutcome::Completed(frame) = controller.place() else {
            panic!("expected completion");
        };

        assert_eq!(controller.stage(), PlacementStage::Done);
        assert!(controller.indicator().is_none());
        assert_eq!(controller.markers().len(), 4);
        assert_eq!(controller.markers()[3], frame.far_corner());
        assert_relative_eq!(frame.width_edge().x, 2.0, epsilon = 1e-6);
        assert_relative_eq!(frame.height_edge().z, 1.5, epsilon = 1e-6);
        assert_relative_eq!(frame.height_edge().x, 0.0, epsilon = 1e-6);

        // further taps are ignored and no more poses are searched
        assert_eq!(controller.place(), PlacementOutcome::Ignored);
        assert!(controller.acquire_pose(&mut locator, &cam).is_none());
    }

    #[test]
    fn test_rejected_point_keeps_stage() {
        let mut locator = TargetLocator(Vec3::ZERO);
        let mut controller = PlacementController::default();
        let cam = camera();

        controller.acquire_pose(&mut locator, &cam);
        controller.place();
        controller.acquire_pose(&mut locator, &cam);

        assert!(matches!(
            controller.place(),
            PlacementOutcome::Rejected(CalibrationError::DegenerateWidth { .. })
        ));
        assert_eq!(controller.stage(), PlacementStage::AwaitingPoint1);
        assert_eq!(controller.markers().len(), 1);
    }
}
