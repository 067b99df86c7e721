use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("no front-facing camera available")]
    NoFrontCamera,
    #[error("failed to open camera {camera}: {message}")]
    Open { camera: String, message: String },
    #[error("capture device lost: {0}")]
    DeviceLost(String),
    #[error("failed to read frame: {0}")]
    Frame(String),
    #[error("no images found in {0}")]
    EmptySequence(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to spawn capture thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("capture thread exited before the device was opened")]
    WorkerExited,
}
