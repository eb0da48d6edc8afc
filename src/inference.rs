use anyhow::{anyhow, Result};
use opencv::{core, core::Mat, imgproc, prelude::*};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{Tensor, ValueType};
use tracing::{debug, info};

use crate::pose::{BodyPart, Keypoint, PoseSample};

const LANDMARK_COUNT: usize = 33;

/// Landmarks whose visibility decides whether anyone is in frame.
const TORSO: [BodyPart; 4] = [
    BodyPart::LeftShoulder,
    BodyPart::RightShoulder,
    BodyPart::LeftHip,
    BodyPart::RightHip,
];

/// BlazePose-style estimator: RGB frame in, 33 normalized landmarks out.
pub struct PoseDetector {
    session: Session,
    input_width: i32,
    input_height: i32,
    min_detection_confidence: f64,
}

impl PoseDetector {
    pub fn new(model_path: &str, min_detection_confidence: f64) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path)?;

        let (input_width, input_height) = Self::get_input_dimensions(&session)?;
        info!(model_path, input_width, input_height, "pose model loaded");

        Ok(Self {
            session,
            input_width,
            input_height,
            min_detection_confidence,
        })
    }

    fn get_input_dimensions(session: &Session) -> Result<(i32, i32)> {
        let input = session
            .inputs
            .first()
            .ok_or_else(|| anyhow!("No input names found"))?;

        match &input.input_type {
            ValueType::Tensor { dimensions, .. } if dimensions.len() >= 4 => {
                Ok((dimensions[3] as i32, dimensions[2] as i32))
            }
            _ => Ok((256, 256)),
        }
    }

    /// Estimate the pose in `frame`. `None` when nobody is confidently there.
    pub fn detect(&self, frame: &Mat) -> Result<Option<PoseSample>> {
        let input = self.preprocess(frame)?;
        let outputs = self.session.run(ort::inputs![input]?)?;
        let output = outputs
            .values()
            .next()
            .ok_or_else(|| anyhow!("No output found"))?;
        let tensor = output.try_extract_tensor::<f32>()?;
        let shape = tensor.shape().to_vec();

        if shape.len() < 3 || shape[1] < LANDMARK_COUNT || shape[2] < 2 {
            anyhow::bail!("unexpected landmark tensor shape {shape:?}");
        }

        let value = |i: usize, k: usize| -> f64 {
            tensor
                .get([0, i, k].as_slice())
                .copied()
                .unwrap_or(0.0) as f64
        };

        let mut sample = PoseSample::new();
        for part in BodyPart::ALL {
            let i = part.landmark_index();
            let visibility = if shape[2] > 3 { value(i, 3) } else { 1.0 };
            sample.insert(part, Keypoint::new(value(i, 0), value(i, 1), visibility));
        }

        let torso = TORSO
            .iter()
            .filter_map(|&p| sample.get(p))
            .map(|kp| kp.visibility)
            .sum::<f64>()
            / TORSO.len() as f64;
        debug!(torso, "pose confidence");

        Ok((torso >= self.min_detection_confidence).then_some(sample))
    }

    fn preprocess(&self, frame: &Mat) -> Result<Tensor<f32>> {
        let mut rgb = Mat::default();
        imgproc::cvt_color(frame, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

        let mut resized = Mat::default();
        imgproc::resize(
            &rgb,
            &mut resized,
            core::Size::new(self.input_width, self.input_height),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )?;

        let mut float_img = Mat::default();
        resized.convert_to(&mut float_img, core::CV_32FC3, 1.0 / 255.0, 0.0)?;

        let h = self.input_height as usize;
        let w = self.input_width as usize;

        let mut data = vec![0.0f32; 3 * h * w];

        for y in 0..h {
            for x in 0..w {
                let pixel = float_img.at_2d::<core::Vec3f>(y as i32, x as i32)?;
                let idx = y * w + x;
                data[idx] = pixel[0];
                data[h * w + idx] = pixel[1];
                data[2 * h * w + idx] = pixel[2];
            }
        }

        Ok(Tensor::from_array(([1usize, 3, h, w], data))?)
    }
}
