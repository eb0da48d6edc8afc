use opencv::{
    core::{self, Mat},
    prelude::*,
    videoio::{VideoCapture, VideoCaptureAPIs},
};
use anyhow::Result;
use tracing::info;

/// Webcam mounted sideways; frames come out rotated to portrait.
pub struct Camera {
    capture: VideoCapture,
}

impl Camera {
    pub fn new(device_id: i32) -> Result<Self> {
        let capture = VideoCapture::new(device_id, VideoCaptureAPIs::CAP_ANY as i32)?;

        if !capture.is_opened()? {
            anyhow::bail!("Failed to open camera {device_id}");
        }
        info!(device_id, "camera opened");

        Ok(Self { capture })
    }

    /// Grab the next frame, rotated 90° clockwise. `None` when the driver had
    /// nothing new.
    pub fn read_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            return Ok(None);
        }

        let mut rotated = Mat::default();
        core::rotate(&frame, &mut rotated, core::ROTATE_90_CLOCKWISE)?;
        Ok(Some(rotated))
    }
}
