use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use crate::capture::domain::capture_device::{CaptureBackend, CaptureDevice, CapturedBuffer};
use crate::capture::domain::capture_error::CaptureError;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::orientation::Orientation;

/// Replays a directory of still images as a looping camera feed.
///
/// Files are sorted by name and decoded when the device opens. Useful for
/// running the pipeline without a camera.
pub struct ImageSequenceBackend {
    dir: PathBuf,
    paths: Vec<PathBuf>,
    interval: Duration,
}

impl ImageSequenceBackend {
    pub fn new(dir: &Path, fps: f64) -> Result<Self, CaptureError> {
        let paths = list_images(dir)?;
        if paths.is_empty() {
            return Err(CaptureError::EmptySequence(dir.to_path_buf()));
        }
        let interval = if fps > 0.0 {
            Duration::from_secs_f64(1.0 / fps)
        } else {
            Duration::ZERO
        };
        Ok(Self {
            dir: dir.to_path_buf(),
            paths,
            interval,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, CaptureError> {
    let io_err = |source| CaptureError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        if path.is_file() && is_image {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn decode(path: &Path) -> Result<CapturedBuffer, CaptureError> {
    let img = image::open(path)
        .map_err(|source| CaptureError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    let (width, height) = img.dimensions();
    Ok(CapturedBuffer::from_rgba(img.into_raw(), width, height))
}

impl CaptureBackend for ImageSequenceBackend {
    fn open(&self) -> Result<Box<dyn CaptureDevice>, CaptureError> {
        let frames = self
            .paths
            .iter()
            .map(|p| decode(p))
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("Decoded {} image(s) from {}", frames.len(), self.dir.display());
        Ok(Box::new(ImageSequenceDevice {
            frames,
            position: 0,
            interval: self.interval,
            last: None,
        }))
    }

    /// Image files are stored upright.
    fn orientation(&self) -> Orientation {
        Orientation::Up
    }

    fn describe(&self) -> String {
        format!("{} ({} images)", self.dir.display(), self.paths.len())
    }
}

struct ImageSequenceDevice {
    frames: Vec<CapturedBuffer>,
    position: usize,
    interval: Duration,
    last: Option<Instant>,
}

impl CaptureDevice for ImageSequenceDevice {
    fn next_frame(&mut self) -> Result<Option<CapturedBuffer>, CaptureError> {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }
        }
        self.last = Some(Instant::now());

        let frame = self.frames[self.position].clone();
        self.position = (self.position + 1) % self.frames.len();
        Ok(Some(frame))
    }
}
