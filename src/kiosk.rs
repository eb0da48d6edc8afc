//! Per-tick orchestration: tracker → detector for the current session state →
//! session transitions → feedback commands.

use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, info};

use crate::config::Config;
use crate::feedback::{Command, MediaClip, Overlay, Panel, VoiceCue};
use crate::hand_raise::HandRaiseDetector;
use crate::pose::PoseSample;
use crate::session::{DetectorReset, SessionEvent, SessionState, SessionStateMachine};
use crate::swing::{SwingEvent, SwingPhaseDetector};
use crate::tracker::{TargetTracker, TrackingStatus};

/// What the frame source delivered this tick.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameInput {
    /// Capture had nothing new; only timeouts are evaluated.
    NoNewFrame,
    /// Estimator output; `None` when nobody was found.
    Frame(Option<PoseSample>),
}

/// Picks the score card shown after a swing.
pub struct ResultSelector<R: Rng> {
    rng: R,
}

impl<R: Rng> ResultSelector<R> {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn pick(&mut self) -> u8 {
        self.rng.gen_range(Self::MIN..=Self::MAX)
    }
}

/// Detectors whose history belongs to one session cycle.
pub struct Detectors {
    pub hand_raise: HandRaiseDetector,
    pub swing: SwingPhaseDetector,
}

impl DetectorReset for Detectors {
    fn reset_detectors(&mut self) {
        self.hand_raise.reset();
        self.swing.reset();
    }
}

pub struct Kiosk<R: Rng> {
    tracker: TargetTracker,
    detectors: Detectors,
    session: SessionStateMachine,
    selector: ResultSelector<R>,
    frame_size: (f64, f64),
    detecting_timeout: Duration,
    result_timeout: Duration,
    /// Poster video is due on the next Idle tick
    poster_pending: bool,
}

impl<R: Rng> Kiosk<R> {
    pub fn new(config: &Config, rng: R, now: Instant) -> Self {
        Self {
            tracker: TargetTracker::new(&config.tracker),
            detectors: Detectors {
                hand_raise: HandRaiseDetector::new(&config.hand_raise),
                swing: SwingPhaseDetector::new(&config.swing),
            },
            session: SessionStateMachine::new(now),
            selector: ResultSelector::new(rng),
            frame_size: (config.frame_width as f64, config.frame_height as f64),
            detecting_timeout: config.session.detecting_timeout(),
            result_timeout: config.session.result_timeout(),
            poster_pending: true,
        }
    }

    /// Overlays shown before the first tick.
    pub fn startup_commands(&self) -> Vec<Command> {
        idle_overlays()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Use the capture's real pixel size for swing geometry. Until called,
    /// the configured frame size applies.
    pub fn set_frame_size(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.frame_size = (width as f64, height as f64);
        }
    }

    #[cfg(test)]
    pub fn tracker(&self) -> &TargetTracker {
        &self.tracker
    }

    #[cfg(test)]
    pub fn detectors(&self) -> &Detectors {
        &self.detectors
    }

    /// Run one tick and return the commands to dispatch, in order.
    pub fn tick(&mut self, input: FrameInput, now: Instant) -> Vec<Command> {
        let mut commands = Vec::new();

        match self.session.state() {
            SessionState::Idle => {
                if self.poster_pending {
                    commands.push(Command::PlayMedia(MediaClip::Poster));
                    self.poster_pending = false;
                }
                if let FrameInput::Frame(sample) = input {
                    self.idle_frame(sample.as_ref(), now, &mut commands);
                }
            }
            SessionState::Detecting => {
                if self.session.check_timeout(self.detecting_timeout, now) {
                    self.time_out(now, &mut commands);
                } else if let FrameInput::Frame(sample) = input {
                    self.detecting_frame(sample.as_ref(), now, &mut commands);
                }
            }
            SessionState::Result => {
                if let FrameInput::Frame(sample) = &input {
                    self.tracker.update(sample.as_ref());
                }
                if self.session.check_timeout(self.result_timeout, now) {
                    self.time_out(now, &mut commands);
                }
            }
        }

        commands
    }

    /// Update the tracker; the sample is passed on only if it is the tracked
    /// person.
    fn track<'a>(
        &mut self,
        sample: Option<&'a PoseSample>,
    ) -> (Option<&'a PoseSample>, TrackingStatus) {
        let status = self.tracker.update(sample);
        let accepted = sample.filter(|_| self.tracker.accepted_last());
        (accepted, status)
    }

    fn idle_frame(&mut self, sample: Option<&PoseSample>, now: Instant, commands: &mut Vec<Command>) {
        let (accepted, status) = self.track(sample);
        if !self.detectors.hand_raise.observe(accepted, status) {
            return;
        }

        if self
            .session
            .handle_event(SessionEvent::HandRaised, now, &mut self.detectors)
            .is_some()
        {
            commands.push(Command::PlayVoice(VoiceCue::Detecting));
            commands.push(Command::overlay(Panel::Bottom, Overlay::Address));
            commands.push(Command::overlay(Panel::Top, Overlay::Address));
        }
    }

    fn detecting_frame(
        &mut self,
        sample: Option<&PoseSample>,
        now: Instant,
        commands: &mut Vec<Command>,
    ) {
        let (accepted, status) = self.track(sample);
        let Some(sample) = accepted.filter(|_| !status.is_lost()) else {
            return;
        };

        let (width, height) = self.frame_size;
        let landmarks = sample.to_pixels(width, height);
        let Some(event) = self.detectors.swing.step(&landmarks) else {
            return;
        };

        match event {
            SwingEvent::SwingStart => {
                commands.push(Command::PlayVoice(VoiceCue::Address));
                commands.push(Command::overlay(Panel::Bottom, Overlay::Swing));
                commands.push(Command::overlay(Panel::Top, Overlay::Swing));
            }
            SwingEvent::Backswing => {
                commands.push(Command::PlayVoice(VoiceCue::Backswing));
            }
            SwingEvent::SwingEnd => {
                commands.push(Command::PlayVoice(VoiceCue::End));
                self.session
                    .handle_event(SessionEvent::SwingDone, now, &mut self.detectors);
                let score = self.selector.pick();
                info!(score, "swing complete");
                commands.push(Command::overlay(Panel::Top, Overlay::ResultN(score)));
                commands.push(Command::overlay(Panel::Bottom, Overlay::Result));
                self.detectors.swing.reset();
                commands.push(Command::PlayMedia(MediaClip::Algorithm));
                self.poster_pending = true;
            }
        }
    }

    fn time_out(&mut self, now: Instant, commands: &mut Vec<Command>) {
        if let Some(transition) =
            self.session
                .handle_event(SessionEvent::Timeout, now, &mut self.detectors)
        {
            debug!(from = transition.from.name(), "timed out");
            commands.extend(idle_overlays());
        }
    }
}

fn idle_overlays() -> Vec<Command> {
    vec![
        Command::overlay(Panel::Bottom, Overlay::Detecting),
        Command::overlay(Panel::Top, Overlay::Idle),
    ]
}
