use crate::capture::domain::capture_error::CaptureError;
use crate::shared::frame::{rgba_to_bgra, BGRA_CHANNELS};
use crate::shared::orientation::Orientation;

/// One BGRA image straight off the sensor, before it is tagged and indexed.
#[derive(Clone, Debug, PartialEq)]
pub struct CapturedBuffer {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl CapturedBuffer {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * BGRA_CHANNELS,
            "data length must equal width * height * 4"
        );
        Self {
            data,
            width,
            height,
        }
    }

    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self::new(rgba_to_bgra(data), width, height)
    }
}

/// An open capture session.
///
/// Lives on the frame-source thread for its whole life, so it need not be
/// `Send`.
pub trait CaptureDevice {
    /// Blocks until the next frame is available.
    ///
    /// `Ok(None)` means the callback fired without an image buffer; the frame
    /// is skipped. [`CaptureError::DeviceLost`] ends the capture loop; any
    /// other error skips one frame.
    fn next_frame(&mut self) -> Result<Option<CapturedBuffer>, CaptureError>;
}

/// Opens capture sessions. Called on the frame-source thread.
pub trait CaptureBackend: Send + Sync {
    fn open(&self) -> Result<Box<dyn CaptureDevice>, CaptureError>;

    /// How this backend's buffers map onto the visual orientation.
    fn orientation(&self) -> Orientation;

    /// Human-readable name for logs.
    fn describe(&self) -> String;
}
