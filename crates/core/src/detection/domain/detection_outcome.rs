use crate::detection::domain::detection_error::{DetectionError, DetectionErrorKind};
use crate::shared::geometry::DetectionRegion;

/// Result of one detection cycle as seen by the control bridge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DetectionOutcome {
    Found(DetectionRegion),
    NotFound,
    Error(DetectionErrorKind),
}

impl DetectionOutcome {
    /// Keeps the first region only; errors are logged here and not retried.
    pub fn from_result(result: Result<Vec<DetectionRegion>, DetectionError>) -> Self {
        match result {
            Ok(regions) => regions
                .into_iter()
                .next()
                .map_or(DetectionOutcome::NotFound, DetectionOutcome::Found),
            Err(e) => {
                log::warn!("Face detection failed: {e}");
                DetectionOutcome::Error(e.kind())
            }
        }
    }

    pub fn region(&self) -> Option<&DetectionRegion> {
        match self {
            DetectionOutcome::Found(region) => Some(region),
            _ => None,
        }
    }
}
