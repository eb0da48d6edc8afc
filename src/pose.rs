//! Pose data handed over by the landmark estimator.
//!
//! Coordinates are normalized to [0, 1] of the (rotated) frame. The swing
//! detector works in pixel space, see [`PoseSample::to_pixels`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body parts the kiosk reads out of the estimator's 33-point skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Nose,
    LeftEye,
    RightEye,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
}

#[cfg(any(test, feature = "camera"))]
impl BodyPart {
    pub const ALL: [BodyPart; 11] = [
        BodyPart::Nose,
        BodyPart::LeftEye,
        BodyPart::RightEye,
        BodyPart::LeftShoulder,
        BodyPart::RightShoulder,
        BodyPart::LeftElbow,
        BodyPart::RightElbow,
        BodyPart::LeftWrist,
        BodyPart::RightWrist,
        BodyPart::LeftHip,
        BodyPart::RightHip,
    ];

    /// Index in the BlazePose 33-landmark layout.
    pub fn landmark_index(self) -> usize {
        match self {
            BodyPart::Nose => 0,
            BodyPart::LeftEye => 2,
            BodyPart::RightEye => 5,
            BodyPart::LeftShoulder => 11,
            BodyPart::RightShoulder => 12,
            BodyPart::LeftElbow => 13,
            BodyPart::RightElbow => 14,
            BodyPart::LeftWrist => 15,
            BodyPart::RightWrist => 16,
            BodyPart::LeftHip => 23,
            BodyPart::RightHip => 24,
        }
    }
}

/// One estimated landmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    /// Estimator confidence in [0, 1]
    #[serde(default = "full_visibility")]
    pub visibility: f64,
}

fn full_visibility() -> f64 {
    1.0
}

impl Keypoint {
    pub fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self { x, y, visibility }
    }
}

/// Keypoints of the one person found in a frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseSample {
    points: BTreeMap<BodyPart, Keypoint>,
}

impl PoseSample {
    #[cfg(any(test, feature = "camera"))]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with(mut self, part: BodyPart, keypoint: Keypoint) -> Self {
        self.points.insert(part, keypoint);
        self
    }

    #[cfg(any(test, feature = "camera"))]
    pub fn insert(&mut self, part: BodyPart, keypoint: Keypoint) {
        self.points.insert(part, keypoint);
    }

    pub fn get(&self, part: BodyPart) -> Option<&Keypoint> {
        self.points.get(&part)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Midpoint of the two hips, the tracker's identity anchor.
    pub fn hip_center(&self) -> Option<(f64, f64)> {
        let left = self.get(BodyPart::LeftHip)?;
        let right = self.get(BodyPart::RightHip)?;
        Some(((left.x + right.x) / 2.0, (left.y + right.y) / 2.0))
    }

    /// Denormalize every point into a `width` x `height` pixel frame.
    pub fn to_pixels(&self, width: f64, height: f64) -> NamedKeypoints {
        let points = self
            .points
            .iter()
            .map(|(part, kp)| (*part, (kp.x * width, kp.y * height)))
            .collect();
        NamedKeypoints { points }
    }
}

/// Pixel-space positions keyed by body part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedKeypoints {
    points: BTreeMap<BodyPart, (f64, f64)>,
}

impl NamedKeypoints {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with(mut self, part: BodyPart, x: f64, y: f64) -> Self {
        self.points.insert(part, (x, y));
        self
    }

    pub fn get(&self, part: BodyPart) -> Option<(f64, f64)> {
        self.points.get(&part).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hip_center_is_midpoint() {
        let sample = PoseSample::new()
            .with(BodyPart::LeftHip, Keypoint::new(0.4, 0.6, 0.9))
            .with(BodyPart::RightHip, Keypoint::new(0.6, 0.7, 0.9));
        let (cx, cy) = sample.hip_center().unwrap();
        assert!((cx - 0.5).abs() < 1e-12);
        assert!((cy - 0.65).abs() < 1e-12);
    }

    #[test]
    fn test_hip_center_requires_both_hips() {
        let sample = PoseSample::new().with(BodyPart::LeftHip, Keypoint::new(0.4, 0.6, 0.9));
        assert!(sample.hip_center().is_none());
    }

    #[test]
    fn test_to_pixels_scales_by_frame() {
        let sample = PoseSample::new().with(BodyPart::LeftWrist, Keypoint::new(0.5, 0.25, 1.0));
        let px = sample.to_pixels(720.0, 1280.0);
        assert_eq!(px.get(BodyPart::LeftWrist), Some((360.0, 320.0)));
        assert_eq!(px.get(BodyPart::RightWrist), None);
    }

    #[test]
    fn test_sample_deserializes_from_named_map() {
        let json = r#"{"left_wrist": {"x": 0.1, "y": 0.2, "visibility": 0.8}, "nose": {"x": 0.5, "y": 0.1}}"#;
        let sample: PoseSample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.len(), 2);
        assert_eq!(sample.get(BodyPart::LeftWrist), Some(&Keypoint::new(0.1, 0.2, 0.8)));
        assert_eq!(sample.get(BodyPart::Nose).unwrap().visibility, 1.0);
    }

    #[test]
    fn test_landmark_indices_are_distinct() {
        let mut seen: Vec<usize> = BodyPart::ALL.iter().map(|p| p.landmark_index()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), BodyPart::ALL.len());
        assert!(seen.iter().all(|&i| i < 33));
    }
}
