use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("failed to read detector model {path}: {source}")]
    ModelRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse detector model: {0}")]
    ModelParse(#[source] std::io::Error),
    #[error("frame {index} has no pixel data")]
    EmptyFrame { index: u64 },
    #[error("failed to spawn detection worker {worker}: {source}")]
    Spawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("detection worker {0} exited before it was ready")]
    WorkerExited(usize),
    #[error("detection backend failed: {0}")]
    Backend(String),
}

/// Coarse error category carried by a failed detection outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionErrorKind {
    Model,
    EmptyFrame,
    Worker,
    Backend,
    Panicked,
}

impl DetectionError {
    pub fn kind(&self) -> DetectionErrorKind {
        match self {
            DetectionError::ModelRead { .. } | DetectionError::ModelParse(_) => {
                DetectionErrorKind::Model
            }
            DetectionError::EmptyFrame { .. } => DetectionErrorKind::EmptyFrame,
            DetectionError::Spawn { .. } | DetectionError::WorkerExited(_) => {
                DetectionErrorKind::Worker
            }
            DetectionError::Backend(_) => DetectionErrorKind::Backend,
        }
    }
}
