use std::process::{Child, Command, Stdio};

use tracing::{debug, warn};

use crate::config::VoiceConfig;
use crate::error::{FeedbackError, FeedbackResult};
use crate::feedback::VoiceCue;

/// Speaks prompts through an external text-to-speech command
/// (`<command> -v <voice> <text>`). Playback runs detached; finished
/// processes are reaped on the next prompt.
pub struct VoicePlayer {
    command: String,
    voice: String,
    detecting: String,
    address: String,
    backswing: String,
    end: String,
    speaking: Vec<Child>,
}

impl VoicePlayer {
    pub fn new(config: &VoiceConfig) -> Self {
        Self {
            command: config.command.clone(),
            voice: config.voice.clone(),
            detecting: config.detecting.clone(),
            address: config.address.clone(),
            backswing: config.backswing.clone(),
            end: config.end.clone(),
            speaking: Vec::new(),
        }
    }

    pub fn line(&self, cue: VoiceCue) -> &str {
        match cue {
            VoiceCue::Detecting => &self.detecting,
            VoiceCue::Address => &self.address,
            VoiceCue::Backswing => &self.backswing,
            VoiceCue::End => &self.end,
        }
    }

    pub fn play(&mut self, cue: VoiceCue) -> FeedbackResult<()> {
        self.reap();
        let text = self.line(cue);
        let child = Command::new(&self.command)
            .arg("-v")
            .arg(&self.voice)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| FeedbackError::Spawn {
                program: self.command.clone(),
                source,
            })?;
        debug!(?cue, pid = child.id(), "voice prompt");
        self.speaking.push(child);
        Ok(())
    }

    /// Collect prompts that have finished speaking.
    pub fn reap(&mut self) {
        self.speaking.retain_mut(|child| match child.try_wait() {
            Ok(Some(_)) => false,
            Ok(None) => true,
            Err(e) => {
                warn!(pid = child.id(), error = %e, "lost track of voice prompt");
                false
            }
        });
    }

    #[cfg(test)]
    fn speaking(&self) -> usize {
        self.speaking.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_cue_has_its_line() {
        let player = VoicePlayer::new(&VoiceConfig {
            detecting: "d".into(),
            address: "a".into(),
            backswing: "b".into(),
            end: "e".into(),
            ..Default::default()
        });
        assert_eq!(player.line(VoiceCue::Detecting), "d");
        assert_eq!(player.line(VoiceCue::Address), "a");
        assert_eq!(player.line(VoiceCue::Backswing), "b");
        assert_eq!(player.line(VoiceCue::End), "e");
    }

    #[test]
    fn test_missing_command_is_spawn_error() {
        let mut player = VoicePlayer::new(&VoiceConfig {
            command: "/nonexistent/tts-binary".into(),
            ..Default::default()
        });
        let err = player.play(VoiceCue::Backswing).unwrap_err();
        assert!(matches!(err, FeedbackError::Spawn { .. }));
    }

    /// Children of this process that exited but were never waited on.
    #[cfg(target_os = "linux")]
    fn zombie_children() -> usize {
        let me = std::process::id().to_string();
        std::fs::read_dir("/proc")
            .unwrap()
            .filter_map(|entry| std::fs::read_to_string(entry.ok()?.path().join("stat")).ok())
            .filter(|stat| {
                // pid (comm) state ppid ...
                let Some((_, rest)) = stat.rsplit_once(')') else {
                    return false;
                };
                let mut fields = rest.split_whitespace();
                fields.next() == Some("Z") && fields.next() == Some(me.as_str())
            })
            .count()
    }

    #[test]
    fn test_finished_prompts_are_reaped() {
        let mut player = VoicePlayer::new(&VoiceConfig {
            command: "/bin/true".into(),
            ..Default::default()
        });
        for cue in [VoiceCue::Detecting, VoiceCue::Address, VoiceCue::Backswing, VoiceCue::End] {
            player.play(cue).unwrap();
        }
        std::thread::sleep(std::time::Duration::from_millis(500));

        player.play(VoiceCue::End).unwrap();
        assert!(player.speaking() <= 1);

        std::thread::sleep(std::time::Duration::from_millis(500));
        player.reap();
        assert_eq!(player.speaking(), 0);
        #[cfg(target_os = "linux")]
        assert_eq!(zombie_children(), 0);
    }
}
