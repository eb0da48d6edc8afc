//! Commands the kiosk core emits for the screen, the video player and the voice.

use tracing::{info, warn};

use crate::media::MediaController;
use crate::overlay::OverlayPanels;
use crate::voice::VoicePlayer;

/// Screen region an overlay image is drawn into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Panel {
    Top,
    Bottom,
}

impl Panel {
    pub fn name(&self) -> &'static str {
        match self {
            Panel::Top => "top",
            Panel::Bottom => "bottom",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Overlay {
    Address,
    Swing,
    Detecting,
    Idle,
    Result,
    /// Score card `1..=6`
    ResultN(u8),
}

impl Overlay {
    /// Asset name, e.g. `ADDRESS` or `RESULT_3`.
    pub fn asset_name(&self) -> String {
        match self {
            Overlay::Address => "ADDRESS".to_string(),
            Overlay::Swing => "SWING".to_string(),
            Overlay::Detecting => "DETECTING".to_string(),
            Overlay::Idle => "IDLE".to_string(),
            Overlay::Result => "RESULT".to_string(),
            Overlay::ResultN(n) => format!("RESULT_{n}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaClip {
    Poster,
    Algorithm,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceCue {
    Detecting,
    Address,
    Backswing,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    ShowOverlay { panel: Panel, overlay: Overlay },
    PlayMedia(MediaClip),
    PlayVoice(VoiceCue),
}

impl Command {
    pub fn overlay(panel: Panel, overlay: Overlay) -> Self {
        Command::ShowOverlay { panel, overlay }
    }
}

/// Receives commands. Fire-and-forget: implementations handle their own
/// failures.
pub trait FeedbackSink {
    fn dispatch(&mut self, command: &Command);
}

/// Logs every command; used for replays and dry runs.
#[derive(Default)]
pub struct LogSink;

impl FeedbackSink for LogSink {
    fn dispatch(&mut self, command: &Command) {
        info!(?command, "feedback");
    }
}

/// Routes commands to the real collaborators.
pub struct KioskOutputs {
    pub overlays: OverlayPanels,
    pub media: Option<MediaController>,
    pub voice: VoicePlayer,
}

impl FeedbackSink for KioskOutputs {
    fn dispatch(&mut self, command: &Command) {
        let result = match *command {
            Command::ShowOverlay { panel, overlay } => self.overlays.show(panel, overlay),
            Command::PlayMedia(clip) => match self.media.as_mut() {
                Some(media) => media.play(clip),
                None => Ok(()),
            },
            Command::PlayVoice(cue) => self.voice.play(cue),
        };

        if let Err(e) = result {
            warn!(?command, error = %e, "feedback command failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_names() {
        assert_eq!(Overlay::Address.asset_name(), "ADDRESS");
        assert_eq!(Overlay::Detecting.asset_name(), "DETECTING");
        assert_eq!(Overlay::ResultN(4).asset_name(), "RESULT_4");
    }

    #[test]
    fn test_outputs_swallow_failures() {
        let dir = tempfile::tempdir().unwrap();
        let mut outputs = KioskOutputs {
            overlays: OverlayPanels::new(dir.path()),
            media: None,
            voice: VoicePlayer::new(&crate::config::VoiceConfig {
                command: dir.path().join("no-such-tts").display().to_string(),
                ..Default::default()
            }),
        };

        outputs.dispatch(&Command::overlay(Panel::Top, Overlay::Swing));
        outputs.dispatch(&Command::PlayMedia(MediaClip::Poster));
        outputs.dispatch(&Command::PlayVoice(VoiceCue::End));
        assert_eq!(outputs.overlays.current(Panel::Top), None);
    }
}
