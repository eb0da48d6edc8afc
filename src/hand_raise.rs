//! Debounced "hand raised" signal.
//!
//! Each frame contributes one boolean (a wrist above the eye line with all four
//! landmarks confidently visible). The signal is on while at least
//! `min_consistent` of the last `window` observations are positive.

use std::collections::VecDeque;

use tracing::trace;

use crate::config::HandRaiseConfig;
use crate::pose::{BodyPart, PoseSample};
use crate::tracker::TrackingStatus;

/// Last few raw observations, oldest first.
#[derive(Debug, Clone)]
pub struct HandRaiseWindow {
    history: VecDeque<bool>,
    capacity: usize,
}

impl HandRaiseWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, observation: bool) {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(observation);
    }

    pub fn positives(&self) -> usize {
        self.history.iter().filter(|&&raised| raised).count()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

pub struct HandRaiseDetector {
    window: HandRaiseWindow,
    visibility_threshold: f64,
    min_consistent: usize,
}

impl HandRaiseDetector {
    pub fn new(config: &HandRaiseConfig) -> Self {
        Self {
            window: HandRaiseWindow::new(config.window),
            visibility_threshold: config.visibility_threshold,
            min_consistent: config.min_consistent,
        }
    }

    /// Record this frame and return the debounced signal.
    pub fn observe(&mut self, sample: Option<&PoseSample>, tracking: TrackingStatus) -> bool {
        let raised = match sample {
            Some(sample) if !tracking.is_lost() => self.wrist_above_eyes(sample),
            _ => false,
        };
        self.push(raised)
    }

    /// Push a raw observation and return the debounced signal.
    pub fn push(&mut self, raised: bool) -> bool {
        self.window.push(raised);
        trace!(raised, positives = self.window.positives(), "hand raise vote");
        self.is_raised()
    }

    pub fn is_raised(&self) -> bool {
        self.window.positives() >= self.min_consistent
    }

    #[cfg(test)]
    pub fn window(&self) -> &HandRaiseWindow {
        &self.window
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }

    fn wrist_above_eyes(&self, sample: &PoseSample) -> bool {
        let visible = |part: BodyPart| {
            sample
                .get(part)
                .filter(|kp| kp.visibility > self.visibility_threshold)
                .copied()
        };
        let (Some(lw), Some(rw), Some(le), Some(re)) = (
            visible(BodyPart::LeftWrist),
            visible(BodyPart::RightWrist),
            visible(BodyPart::LeftEye),
            visible(BodyPart::RightEye),
        ) else {
            return false;
        };

        // Image y grows downward.
        let eye_level = (le.y + re.y) / 2.0;
        lw.y < eye_level || rw.y < eye_level
    }
}

impl Default for HandRaiseDetector {
    fn default() -> Self {
        Self::new(&HandRaiseConfig::default())
    }
}
