//! Frame sources feeding the tick loop.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::kiosk::FrameInput;
use crate::pose::PoseSample;

pub trait PoseSource {
    /// Next tick's input, or `None` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<FrameInput>>;

    /// Pixel size of the last frame delivered, when the source knows it.
    fn frame_size(&self) -> Option<(u32, u32)> {
        None
    }
}

/// One line of a replay file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReplayLine {
    Marker(ReplayMarker),
    Person(Option<PoseSample>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ReplayMarker {
    Stale,
}

/// Replays recorded estimator output, one JSON value per line:
/// `null` (nobody in frame), `"stale"` (no new frame) or a map of
/// body-part name to `{"x", "y", "visibility"}`.
pub struct ReplaySource<R: BufRead> {
    lines: Lines<R>,
    line_no: usize,
}

impl ReplaySource<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("opening replay {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> PoseSource for ReplaySource<R> {
    fn next_frame(&mut self) -> Result<Option<FrameInput>> {
        for line in self.lines.by_ref() {
            self.line_no += 1;
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let parsed: ReplayLine = serde_json::from_str(line)
                .with_context(|| format!("replay line {}", self.line_no))?;
            let input = match parsed {
                ReplayLine::Marker(ReplayMarker::Stale) => FrameInput::NoNewFrame,
                ReplayLine::Person(sample) => FrameInput::Frame(sample),
            };
            return Ok(Some(input));
        }
        Ok(None)
    }
}

#[cfg(feature = "camera")]
pub use live::CameraSource;

#[cfg(feature = "camera")]
mod live {
    use anyhow::Result;
    use opencv::prelude::*;
    use tracing::{info, warn};

    use super::PoseSource;
    use crate::camera::Camera;
    use crate::config::Config;
    use crate::inference::PoseDetector;
    use crate::kiosk::FrameInput;

    /// Live capture through the camera and the on-device estimator.
    pub struct CameraSource {
        camera: Camera,
        detector: PoseDetector,
        frame_size: Option<(u32, u32)>,
    }

    impl CameraSource {
        pub fn new(config: &Config) -> Result<Self> {
            Ok(Self {
                camera: Camera::new(config.camera_id)?,
                detector: PoseDetector::new(&config.model_path, config.min_detection_confidence)?,
                frame_size: None,
            })
        }
    }

    impl PoseSource for CameraSource {
        fn next_frame(&mut self) -> Result<Option<FrameInput>> {
            let Some(frame) = self.camera.read_frame()? else {
                return Ok(Some(FrameInput::NoNewFrame));
            };
            let size = (frame.cols().max(0) as u32, frame.rows().max(0) as u32);
            if self.frame_size != Some(size) {
                info!(width = size.0, height = size.1, "capture size");
                self.frame_size = Some(size);
            }
            match self.detector.detect(&frame) {
                Ok(sample) => Ok(Some(FrameInput::Frame(sample))),
                Err(e) => {
                    warn!(error = %e, "pose estimation failed");
                    Ok(Some(FrameInput::Frame(None)))
                }
            }
        }

        fn frame_size(&self) -> Option<(u32, u32)> {
            self.frame_size
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::BodyPart;
    use std::io::Cursor;

    #[test]
    fn test_replay_parses_each_kind() {
        let data = r#"null

"stale"
{"left_hip": {"x": 0.4, "y": 0.6, "visibility": 0.9}, "right_hip": {"x": 0.5, "y": 0.6}}
"#;
        let mut source = ReplaySource::new(Cursor::new(data));

        assert_eq!(source.next_frame().unwrap(), Some(FrameInput::Frame(None)));
        assert_eq!(source.next_frame().unwrap(), Some(FrameInput::NoNewFrame));
        match source.next_frame().unwrap() {
            Some(FrameInput::Frame(Some(sample))) => {
                assert_eq!(sample.len(), 2);
                assert!(sample.get(BodyPart::RightHip).is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(source.next_frame().unwrap(), None);
    }

    #[test]
    fn test_replay_reports_bad_line_number() {
        let mut source = ReplaySource::new(Cursor::new("null\n{\"left_knee\": 3}\n"));
        source.next_frame().unwrap();
        let err = source.next_frame().unwrap_err();
        assert!(format!("{err:#}").contains("replay line 2"));
    }

    #[test]
    fn test_replay_open_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        std::fs::write(&path, "null\nnull\n").unwrap();
        let mut source = ReplaySource::open(&path).unwrap();
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_replay_has_no_frame_size() {
        let source = ReplaySource::new(Cursor::new("null\n"));
        assert_eq!(source.frame_size(), None);
    }
}
