use crate::detection::domain::detection_error::DetectionError;
use crate::shared::frame::Frame;
use crate::shared::geometry::DetectionRegion;

/// Domain interface for single-shot face detection.
///
/// Regions are normalized to the frame's upright orientation, best first.
/// Implementations may keep per-sequence state, hence `&mut self`. They are
/// built on the thread that uses them, so `Send` is not required.
pub trait FaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectionRegion>, DetectionError>;
}
