use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;

use crate::capture::domain::capture_device::{CaptureBackend, CaptureDevice, CapturedBuffer};
use crate::capture::domain::capture_error::CaptureError;
use crate::shared::orientation::Orientation;

/// Consecutive read failures after which the camera is considered gone.
const MAX_CONSECUTIVE_FAILURES: u32 = 30;

const FRONT_CAMERA_HINTS: &[&str] = &["front", "facetime", "user", "integrated"];

/// Native camera capture through nokhwa.
pub struct NokhwaBackend {
    index: Option<u32>,
    width: u32,
    height: u32,
}

impl NokhwaBackend {
    /// `index` pins a camera; otherwise the front-facing one is picked.
    pub fn new(index: Option<u32>, width: u32, height: u32) -> Self {
        Self {
            index,
            width,
            height,
        }
    }

    fn pick_camera(&self) -> Result<(CameraIndex, String), CaptureError> {
        let cameras = nokhwa::query(ApiBackend::Auto).map_err(|e| {
            log::warn!("Failed to enumerate cameras: {e:?}");
            CaptureError::NoFrontCamera
        })?;
        if cameras.is_empty() {
            return Err(CaptureError::NoFrontCamera);
        }

        let chosen = match self.index {
            Some(i) => cameras
                .iter()
                .find(|c| *c.index() == CameraIndex::Index(i))
                .ok_or(CaptureError::NoFrontCamera)?,
            None => cameras
                .iter()
                .find(|c| {
                    let name = c.human_name().to_lowercase();
                    FRONT_CAMERA_HINTS.iter().any(|hint| name.contains(hint))
                })
                .unwrap_or(&cameras[0]),
        };
        Ok((chosen.index().clone(), chosen.human_name()))
    }
}

impl CaptureBackend for NokhwaBackend {
    fn open(&self) -> Result<Box<dyn CaptureDevice>, CaptureError> {
        let (index, name) = self.pick_camera()?;
        let open_err = |e: nokhwa::NokhwaError| CaptureError::Open {
            camera: name.clone(),
            message: e.to_string(),
        };

        let requested = RequestedFormat::new::<RgbAFormat>(RequestedFormatType::HighestResolution(
            Resolution::new(self.width, self.height),
        ));
        let mut camera = Camera::new(index, requested).map_err(open_err)?;
        camera.open_stream().map_err(open_err)?;

        log::info!(
            "Camera opened: {} ({}x{})",
            name,
            camera.resolution().width(),
            camera.resolution().height()
        );
        Ok(Box::new(NokhwaDevice {
            camera,
            failures: 0,
        }))
    }

    /// Webcams deliver upright frames; they are mirrored so the player
    /// sees a selfie view.
    fn orientation(&self) -> Orientation {
        Orientation::UpMirrored
    }

    fn describe(&self) -> String {
        match self.index {
            Some(i) => format!("camera #{i}"),
            None => "front camera".to_string(),
        }
    }
}

struct NokhwaDevice {
    camera: Camera,
    failures: u32,
}

impl NokhwaDevice {
    fn fail(&mut self, message: String) -> CaptureError {
        self.failures += 1;
        if self.failures >= MAX_CONSECUTIVE_FAILURES {
            CaptureError::DeviceLost(message)
        } else {
            CaptureError::Frame(message)
        }
    }
}

impl CaptureDevice for NokhwaDevice {
    fn next_frame(&mut self) -> Result<Option<CapturedBuffer>, CaptureError> {
        let buffer = match self.camera.frame() {
            Ok(buffer) => buffer,
            Err(e) => return Err(self.fail(e.to_string())),
        };
        let image = match buffer.decode_image::<RgbAFormat>() {
            Ok(image) => image,
            Err(e) => return Err(self.fail(e.to_string())),
        };
        self.failures = 0;

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(None);
        }
        Ok(Some(CapturedBuffer::from_rgba(image.into_raw(), width, height)))
    }
}

impl Drop for NokhwaDevice {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            log::warn!("Failed to stop camera stream: {e}");
        }
    }
}
