use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::detection::domain::detection_error::DetectionError;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::infrastructure::detection_pool::DetectorFactory;
use crate::shared::frame::Frame;
use crate::shared::geometry::DetectionRegion;

/// Sensitivity knobs for the SeetaFace cascade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    pub min_face_size: u32,
    pub score_threshold: f64,
    pub pyramid_scale_factor: f32,
    pub slide_window_step: u32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            min_face_size: 40,
            score_threshold: 2.0,
            pyramid_scale_factor: 0.8,
            slide_window_step: 4,
        }
    }
}

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// Frames are converted to luma and uprighted per their orientation tag
/// before detection, so returned regions are in visual orientation.
pub struct RustfaceDetector {
    model: rustface::Model,
    settings: DetectorSettings,
}

impl RustfaceDetector {
    pub fn from_bytes(model: &[u8], settings: DetectorSettings) -> Result<Self, DetectionError> {
        let model = rustface::read_model(Cursor::new(model)).map_err(DetectionError::ModelParse)?;
        Ok(Self { model, settings })
    }

    pub fn from_path(path: &Path, settings: DetectorSettings) -> Result<Self, DetectionError> {
        let bytes = fs::read(path).map_err(|e| DetectionError::ModelRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_bytes(&bytes, settings)
    }

    pub fn settings(&self) -> &DetectorSettings {
        &self.settings
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectionRegion>, DetectionError> {
        if frame.is_empty() {
            return Err(DetectionError::EmptyFrame {
                index: frame.index(),
            });
        }

        let gray = frame.upright_luma();
        let (width, height) = gray.dimensions();

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.settings.min_face_size);
        detector.set_score_thresh(self.settings.score_threshold);
        detector.set_pyramid_scale_factor(self.settings.pyramid_scale_factor);
        detector.set_slide_window_step(
            self.settings.slide_window_step,
            self.settings.slide_window_step,
        );

        let faces = detector.detect(&rustface::ImageData::new(gray.as_raw(), width, height));

        Ok(faces
            .iter()
            .filter_map(|face| {
                let bbox = face.bbox();
                clip_to_image(
                    bbox.x(),
                    bbox.y(),
                    bbox.width(),
                    bbox.height(),
                    width,
                    height,
                )
            })
            .collect())
    }
}

/// Normalizes a pixel box, cut to the image. Bounding-box regression can
/// push boxes past the edge; boxes left with no area are dropped.
fn clip_to_image(
    x: i32,
    y: i32,
    w: u32,
    h: u32,
    image_w: u32,
    image_h: u32,
) -> Option<DetectionRegion> {
    let x0 = f64::from(x).max(0.0);
    let y0 = f64::from(y).max(0.0);
    let x1 = (f64::from(x) + f64::from(w)).min(f64::from(image_w));
    let y1 = (f64::from(y) + f64::from(h)).min(f64::from(image_h));
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(DetectionRegion::from_pixels(
        x0,
        y0,
        x1 - x0,
        y1 - y0,
        image_w,
        image_h,
    ))
}

/// Builds one detector per pool worker from a shared copy of the model bytes.
pub fn factory(model: Arc<Vec<u8>>, settings: DetectorSettings) -> DetectorFactory {
    Arc::new(
        move |_worker: usize| -> Result<Box<dyn FaceDetector>, DetectionError> {
            let detector = RustfaceDetector::from_bytes(&model, settings)?;
            Ok(Box::new(detector))
        },
    )
}
