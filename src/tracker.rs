//! Single-target identity tracking.
//!
//! Keeps the hip-center of "the" person in front of the kiosk and refuses
//! bodies that suddenly appear far away from it. Misses (no person, or a
//! rejected body) accumulate; once they exceed `max_miss_frames` the identity
//! is dropped and the next sample is adopted unconditionally.

use tracing::{debug, info};

use crate::config::TrackerConfig;
use crate::pose::PoseSample;

/// Outcome of one tracker update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackingStatus {
    /// Committed hip-center of the tracked person
    Tracked((f64, f64)),
    Lost,
}

impl TrackingStatus {
    pub fn is_lost(&self) -> bool {
        matches!(self, TrackingStatus::Lost)
    }
}

/// Tracked person's last-known hip-center. `center` is `None` iff no identity
/// is committed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetIdentity {
    pub center: Option<(f64, f64)>,
    pub miss_count: u32,
}

pub struct TargetTracker {
    identity: TargetIdentity,
    max_center_distance: f64,
    max_miss_frames: u32,
    /// Whether the last update's sample belonged to the tracked person
    accepted_last: bool,
}

impl TargetTracker {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            identity: TargetIdentity::default(),
            max_center_distance: config.max_center_distance,
            max_miss_frames: config.max_miss_frames,
            accepted_last: false,
        }
    }

    pub fn update(&mut self, sample: Option<&PoseSample>) -> TrackingStatus {
        self.accepted_last = false;

        // A sample without both hips carries no identity evidence.
        let Some(candidate) = sample.and_then(PoseSample::hip_center) else {
            self.miss();
            return TrackingStatus::Lost;
        };

        let Some(center) = self.identity.center else {
            info!(x = candidate.0, y = candidate.1, "target acquired");
            self.commit(candidate);
            return TrackingStatus::Tracked(candidate);
        };

        let distance = ((candidate.0 - center.0).powi(2) + (candidate.1 - center.1).powi(2)).sqrt();
        if distance < self.max_center_distance {
            self.commit(candidate);
            return TrackingStatus::Tracked(candidate);
        }

        debug!(distance, miss_count = self.identity.miss_count, "rejecting distant body");
        self.miss();
        match self.identity.center {
            Some(previous) => TrackingStatus::Tracked(previous),
            None => TrackingStatus::Lost,
        }
    }

    /// True when the sample passed to the last `update` is the tracked person.
    pub fn accepted_last(&self) -> bool {
        self.accepted_last
    }

    #[cfg(test)]
    pub fn identity(&self) -> &TargetIdentity {
        &self.identity
    }

    fn commit(&mut self, center: (f64, f64)) {
        self.identity.center = Some(center);
        self.identity.miss_count = 0;
        self.accepted_last = true;
    }

    fn miss(&mut self) {
        self.identity.miss_count = self.identity.miss_count.saturating_add(1);
        if self.identity.miss_count > self.max_miss_frames {
            if self.identity.center.is_some() {
                info!(misses = self.identity.miss_count, "target lost");
            }
            self.identity = TargetIdentity::default();
        }
    }
}

impl Default for TargetTracker {
    fn default() -> Self {
        Self::new(&TrackerConfig::default())
    }
}
