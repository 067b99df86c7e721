use thiserror::Error;

use crate::capture::domain::capture_error::CaptureError;
use crate::detection::domain::detection_error::DetectionError;
use crate::detection::infrastructure::model_resolver::ModelResolveError;
use crate::pipeline::pipeline_config::ConfigError;

/// Fatal errors surfaced while building or starting the pipeline.
///
/// Per-frame failures never end up here; they become detection outcomes.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Model(#[from] ModelResolveError),
}
