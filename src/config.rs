use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub camera_id: i32,
    pub model_path: String,
    /// Mean torso visibility below this counts as "no person"
    pub min_detection_confidence: f64,
    /// Frame size after the 90° rotation, used to denormalize keypoints
    pub frame_width: u32,
    pub frame_height: u32,
    pub tick_interval_ms: u64,
    pub tracker: TrackerConfig,
    pub hand_raise: HandRaiseConfig,
    pub swing: SwingConfig,
    pub session: SessionConfig,
    pub overlay: OverlayConfig,
    pub media: MediaConfig,
    pub voice: VoiceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_id: 0,
            model_path: "models/blazepose.onnx".to_string(),
            min_detection_confidence: 0.7,
            frame_width: 720,
            frame_height: 1280,
            tick_interval_ms: 30,
            tracker: TrackerConfig::default(),
            hand_raise: HandRaiseConfig::default(),
            swing: SwingConfig::default(),
            session: SessionConfig::default(),
            overlay: OverlayConfig::default(),
            media: MediaConfig::default(),
            voice: VoiceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Hip-center jump (normalized units) beyond which a body is someone else
    pub max_center_distance: f64,
    pub max_miss_frames: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_center_distance: 0.2,
            max_miss_frames: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandRaiseConfig {
    pub visibility_threshold: f64,
    pub window: usize,
    pub min_consistent: usize,
}

impl Default for HandRaiseConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: 0.7,
            window: 7,
            min_consistent: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwingConfig {
    pub margin_px: f64,
}

impl Default for SwingConfig {
    fn default() -> Self {
        Self { margin_px: 10.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub detecting_timeout_secs: f64,
    pub result_timeout_secs: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            detecting_timeout_secs: 30.0,
            result_timeout_secs: 5.0,
        }
    }
}

impl SessionConfig {
    pub fn detecting_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.detecting_timeout_secs)
    }

    pub fn result_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.result_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub assets_dir: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            assets_dir: "assets".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Spawn the player ourselves; otherwise attach to one already listening
    pub launch: bool,
    pub vlc_path: String,
    pub host: String,
    pub port: u16,
    pub connect_timeout_ms: u64,
    /// How long a launched player may take to open its control port
    pub startup_timeout_ms: u64,
    pub poster_video: String,
    pub algorithm_video: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            launch: true,
            vlc_path: "/Applications/VLC.app/Contents/MacOS/VLC".to_string(),
            host: "localhost".to_string(),
            port: 4212,
            connect_timeout_ms: 200,
            startup_timeout_ms: 5000,
            poster_video: "videos/video_poster.mp4".to_string(),
            algorithm_video: "videos/video_algorithm.mp4".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub command: String,
    pub voice: String,
    pub detecting: String,
    pub address: String,
    pub backswing: String,
    pub end: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            command: "/usr/bin/say".to_string(),
            voice: "Yuna".to_string(),
            detecting: "어드레스를 취해주세요".to_string(),
            address: "스윙을 시작해주세요".to_string(),
            backswing: "백스윙".to_string(),
            end: "스윙 끝, 결과를 출력합니다.".to_string(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), content)
            .with_context(|| format!("writing config {}", path.as_ref().display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.frame_width > 0 && self.frame_height > 0, "frame size must be non-zero");
        ensure!(self.tick_interval_ms > 0, "tick_interval_ms must be positive");
        ensure!(
            self.tracker.max_center_distance > 0.0,
            "tracker.max_center_distance must be positive"
        );
        ensure!(self.hand_raise.window > 0, "hand_raise.window must be non-zero");
        ensure!(
            self.hand_raise.min_consistent <= self.hand_raise.window,
            "hand_raise.min_consistent ({}) exceeds window ({})",
            self.hand_raise.min_consistent,
            self.hand_raise.window
        );
        ensure!(self.swing.margin_px >= 0.0, "swing.margin_px must not be negative");
        ensure!(
            self.session.detecting_timeout_secs > 0.0 && self.session.result_timeout_secs > 0.0,
            "session timeouts must be positive"
        );
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_kiosk_constants() {
        let config = Config::default();
        assert_eq!(config.tracker.max_miss_frames, 10);
        assert_eq!(config.tracker.max_center_distance, 0.2);
        assert_eq!(config.hand_raise.window, 7);
        assert_eq!(config.hand_raise.min_consistent, 5);
        assert_eq!(config.swing.margin_px, 10.0);
        assert_eq!(config.session.detecting_timeout(), Duration::from_secs(30));
        assert_eq!(config.session.result_timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kiosk.toml");
        let mut config = Config::default();
        config.camera_id = 2;
        config.media.port = 9999;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kiosk.toml");
        fs::write(&path, "camera_id = 1\n\n[session]\nresult_timeout_secs = 8.0\n").unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.camera_id, 1);
        assert_eq!(loaded.session.result_timeout_secs, 8.0);
        assert_eq!(loaded.session.detecting_timeout_secs, 30.0);
        assert_eq!(loaded.hand_raise, HandRaiseConfig::default());
    }

    #[test]
    fn test_rejects_unreachable_vote() {
        let mut config = Config::default();
        config.hand_raise.min_consistent = 8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_timeout() {
        let mut config = Config::default();
        config.session.result_timeout_secs = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(dir.path().join("absent.toml")).is_err());
    }
}
