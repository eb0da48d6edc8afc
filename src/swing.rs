//! Golf swing phase detection from wrist position relative to the hips.
//!
//! The hips define a box `[x_min - margin, x_max + margin]`. A swing starts
//! with both hands low inside the box (address), moves to one side of it
//! (backswing) and ends when both hands cross to the opposite side.

use tracing::{debug, trace};

use crate::config::SwingConfig;
use crate::pose::{BodyPart, NamedKeypoints};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SwingPhase {
    #[default]
    None,
    Address,
    BackswingLeft,
    BackswingRight,
}

impl SwingPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SwingPhase::None => "none",
            SwingPhase::Address => "address",
            SwingPhase::BackswingLeft => "backswing_left",
            SwingPhase::BackswingRight => "backswing_right",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwingEvent {
    SwingStart,
    Backswing,
    SwingEnd,
}

/// Hip box and wrist positions for one frame, in pixels.
struct SwingGeometry {
    x_min: f64,
    x_max: f64,
    y_avg: f64,
    wrists: [(f64, f64); 2],
}

impl SwingGeometry {
    fn from_keypoints(landmarks: &NamedKeypoints) -> Option<Self> {
        let (lhx, lhy) = landmarks.get(BodyPart::LeftHip)?;
        let (rhx, rhy) = landmarks.get(BodyPart::RightHip)?;
        let left_wrist = landmarks.get(BodyPart::LeftWrist)?;
        let right_wrist = landmarks.get(BodyPart::RightWrist)?;
        Some(Self {
            x_min: lhx.min(rhx),
            x_max: lhx.max(rhx),
            y_avg: (lhy + rhy) / 2.0,
            wrists: [left_wrist, right_wrist],
        })
    }

    fn wrists_low(&self, margin: f64) -> bool {
        self.wrists.iter().all(|&(_, y)| y > self.y_avg - margin)
    }

    fn wrists_inside(&self, margin: f64) -> bool {
        self.wrists
            .iter()
            .all(|&(x, _)| x >= self.x_min - margin && x <= self.x_max + margin)
    }

    fn wrists_left(&self, margin: f64) -> bool {
        self.wrists.iter().all(|&(x, _)| x < self.x_min - margin)
    }

    fn wrists_right(&self, margin: f64) -> bool {
        self.wrists.iter().all(|&(x, _)| x > self.x_max + margin)
    }
}

pub struct SwingPhaseDetector {
    /// Jitter allowance around the hip box, in pixels
    margin: f64,
    phase: SwingPhase,
}

impl SwingPhaseDetector {
    pub fn new(config: &SwingConfig) -> Self {
        Self {
            margin: config.margin_px,
            phase: SwingPhase::None,
        }
    }

    /// Evaluate one frame against `phase` without touching detector state.
    ///
    /// Returns the emitted event (if any) and the phase to continue from.
    /// After `SwingEnd` the phase is back to `None`.
    pub fn observe(
        &self,
        landmarks: &NamedKeypoints,
        phase: SwingPhase,
    ) -> (Option<SwingEvent>, SwingPhase) {
        let Some(geo) = SwingGeometry::from_keypoints(landmarks) else {
            return (None, phase);
        };
        let m = self.margin;

        trace!(
            phase = phase.name(),
            x_min = geo.x_min,
            x_max = geo.x_max,
            lw = geo.wrists[0].0,
            rw = geo.wrists[1].0,
            "swing frame"
        );

        match phase {
            SwingPhase::None if geo.wrists_low(m) && geo.wrists_inside(m) => {
                (Some(SwingEvent::SwingStart), SwingPhase::Address)
            }
            SwingPhase::Address if geo.wrists_left(m) => {
                (Some(SwingEvent::Backswing), SwingPhase::BackswingLeft)
            }
            SwingPhase::Address if geo.wrists_right(m) => {
                (Some(SwingEvent::Backswing), SwingPhase::BackswingRight)
            }
            SwingPhase::BackswingLeft if geo.wrists_right(m) => {
                (Some(SwingEvent::SwingEnd), SwingPhase::None)
            }
            SwingPhase::BackswingRight if geo.wrists_left(m) => {
                (Some(SwingEvent::SwingEnd), SwingPhase::None)
            }
            _ => (None, phase),
        }
    }

    /// Advance the stored phase by one frame.
    pub fn step(&mut self, landmarks: &NamedKeypoints) -> Option<SwingEvent> {
        let (event, next) = self.observe(landmarks, self.phase);
        if next != self.phase {
            debug!(from = self.phase.name(), to = next.name(), ?event, "swing phase");
        }
        self.phase = next;
        event
    }

    #[cfg(test)]
    pub fn phase(&self) -> SwingPhase {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = SwingPhase::None;
    }
}

impl Default for SwingPhaseDetector {
    fn default() -> Self {
        Self::new(&SwingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hips at x = 100 and 140, y = 300.
    fn frame(left_wrist: (f64, f64), right_wrist: (f64, f64)) -> NamedKeypoints {
        NamedKeypoints::new()
            .with(BodyPart::LeftHip, 100.0, 300.0)
            .with(BodyPart::RightHip, 140.0, 300.0)
            .with(BodyPart::LeftWrist, left_wrist.0, left_wrist.1)
            .with(BodyPart::RightWrist, right_wrist.0, right_wrist.1)
    }

    fn hands_at(x: f64, y: f64) -> NamedKeypoints {
        frame((x, y), (x, y))
    }

    #[test]
    fn test_left_swing_cycle() {
        let mut detector = SwingPhaseDetector::default();

        assert_eq!(detector.step(&hands_at(120.0, 300.0)), Some(SwingEvent::SwingStart));
        assert_eq!(detector.phase(), SwingPhase::Address);

        assert_eq!(detector.step(&hands_at(50.0, 200.0)), Some(SwingEvent::Backswing));
        assert_eq!(detector.phase(), SwingPhase::BackswingLeft);

        assert_eq!(detector.step(&hands_at(200.0, 200.0)), Some(SwingEvent::SwingEnd));
        assert_eq!(detector.phase(), SwingPhase::None);
    }

    #[test]
    fn test_right_swing_cycle() {
        let detector = SwingPhaseDetector::default();
        let (event, phase) = detector.observe(&hands_at(120.0, 320.0), SwingPhase::None);
        assert_eq!((event, phase), (Some(SwingEvent::SwingStart), SwingPhase::Address));
        let (event, phase) = detector.observe(&hands_at(200.0, 250.0), phase);
        assert_eq!((event, phase), (Some(SwingEvent::Backswing), SwingPhase::BackswingRight));
        let (event, phase) = detector.observe(&hands_at(40.0, 250.0), phase);
        assert_eq!((event, phase), (Some(SwingEvent::SwingEnd), SwingPhase::None));
    }

    #[test]
    fn test_raised_hands_do_not_address() {
        let detector = SwingPhaseDetector::default();
        let (event, phase) = detector.observe(&hands_at(120.0, 100.0), SwingPhase::None);
        assert_eq!(event, None);
        assert_eq!(phase, SwingPhase::None);
    }

    #[test]
    fn test_address_box_edges_are_inclusive() {
        let detector = SwingPhaseDetector::default();
        let (event, _) = detector.observe(&frame((90.0, 300.0), (150.0, 300.0)), SwingPhase::None);
        assert_eq!(event, Some(SwingEvent::SwingStart));
        let (event, _) = detector.observe(&frame((89.0, 300.0), (150.0, 300.0)), SwingPhase::None);
        assert_eq!(event, None);
    }

    #[test]
    fn test_one_wrist_out_is_not_a_backswing() {
        let detector = SwingPhaseDetector::default();
        let (event, phase) =
            detector.observe(&frame((50.0, 250.0), (120.0, 300.0)), SwingPhase::Address);
        assert_eq!(event, None);
        assert_eq!(phase, SwingPhase::Address);
    }

    #[test]
    fn test_backswing_requires_clearing_margin() {
        let detector = SwingPhaseDetector::default();
        let (event, _) = detector.observe(&hands_at(90.0, 250.0), SwingPhase::Address);
        assert_eq!(event, None);
        let (event, _) = detector.observe(&hands_at(89.0, 250.0), SwingPhase::Address);
        assert_eq!(event, Some(SwingEvent::Backswing));
    }

    #[test]
    fn test_returning_to_same_side_does_not_end() {
        let detector = SwingPhaseDetector::default();
        let (event, phase) = detector.observe(&hands_at(40.0, 250.0), SwingPhase::BackswingLeft);
        assert_eq!(event, None);
        assert_eq!(phase, SwingPhase::BackswingLeft);
        let (event, phase) = detector.observe(&hands_at(120.0, 300.0), SwingPhase::BackswingLeft);
        assert_eq!(event, None);
        assert_eq!(phase, SwingPhase::BackswingLeft);
    }

    #[test]
    fn test_missing_landmarks_keep_phase() {
        let detector = SwingPhaseDetector::default();
        let partial = NamedKeypoints::new().with(BodyPart::LeftHip, 100.0, 300.0);
        assert_eq!(detector.observe(&partial, SwingPhase::Address), (None, SwingPhase::Address));
    }

    #[test]
    fn test_reset_returns_to_none() {
        let mut detector = SwingPhaseDetector::default();
        detector.step(&hands_at(120.0, 300.0));
        detector.reset();
        assert_eq!(detector.phase(), SwingPhase::None);
    }
}
