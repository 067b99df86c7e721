use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::capture::domain::capture_device::{CaptureBackend, CaptureDevice, CapturedBuffer};
use crate::capture::domain::capture_error::CaptureError;
use crate::shared::frame::BGRA_CHANNELS;
use crate::shared::orientation::Orientation;

/// What a scripted device yields for one capture callback.
#[derive(Clone, Debug)]
pub enum ScriptedFrame {
    Image(CapturedBuffer),
    /// Callback without an image buffer.
    Missing,
    /// Unrecoverable device failure.
    Lost,
}

/// In-memory capture backend that replays a fixed script.
///
/// After the script runs out the device idles (yielding nothing) unless
/// `repeat` is set. Every step waits `interval` to mimic a camera cadence.
pub struct ScriptedBackend {
    script: Vec<ScriptedFrame>,
    interval: Duration,
    repeat: bool,
    available: bool,
    orientation: Orientation,
    opened: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<ScriptedFrame>, interval: Duration) -> Self {
        Self {
            script,
            interval,
            repeat: false,
            available: true,
            orientation: Orientation::Up,
            opened: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Solid grey frames of the given size, looping forever.
    pub fn looping_blank(width: u32, height: u32, interval: Duration) -> Self {
        let data = vec![128u8; width as usize * height as usize * BGRA_CHANNELS];
        let frame = ScriptedFrame::Image(CapturedBuffer::new(data, width, height));
        Self::new(vec![frame], interval).repeating()
    }

    /// A backend whose device can never be opened.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(Vec::new(), Duration::ZERO)
        }
    }

    pub fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }

    /// Tags delivered frames as if the sensor were mounted this way.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// How many times `open` succeeded.
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl CaptureBackend for ScriptedBackend {
    fn open(&self) -> Result<Box<dyn CaptureDevice>, CaptureError> {
        if !self.available {
            return Err(CaptureError::NoFrontCamera);
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedDevice {
            script: self.script.clone(),
            position: 0,
            interval: self.interval,
            repeat: self.repeat,
        }))
    }

    fn orientation(&self) -> Orientation {
        self.orientation
    }

    fn describe(&self) -> String {
        format!("scripted ({} steps)", self.script.len())
    }
}

struct ScriptedDevice {
    script: Vec<ScriptedFrame>,
    position: usize,
    interval: Duration,
    repeat: bool,
}

impl CaptureDevice for ScriptedDevice {
    fn next_frame(&mut self) -> Result<Option<CapturedBuffer>, CaptureError> {
        thread::sleep(self.interval.max(Duration::from_millis(1)));

        if self.position >= self.script.len() {
            if !self.repeat || self.script.is_empty() {
                return Ok(None);
            }
            self.position = 0;
        }

        let step = self.script[self.position].clone();
        self.position += 1;
        match step {
            ScriptedFrame::Image(buffer) => Ok(Some(buffer)),
            ScriptedFrame::Missing => Ok(None),
            ScriptedFrame::Lost => Err(CaptureError::DeviceLost("scripted".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer() -> CapturedBuffer {
        CapturedBuffer::new(vec![0u8; 4], 1, 1)
    }

    #[test]
    fn test_replays_script_then_idles() {
        let backend = ScriptedBackend::new(
            vec![ScriptedFrame::Image(buffer()), ScriptedFrame::Missing],
            Duration::ZERO,
        );
        let mut device = backend.open().unwrap();

        assert_eq!(device.next_frame().unwrap(), Some(buffer()));
        assert_eq!(device.next_frame().unwrap(), None);
        assert_eq!(device.next_frame().unwrap(), None);
        assert_eq!(backend.open_count(), 1);
    }

    #[test]
    fn test_repeating_script_wraps() {
        let backend =
            ScriptedBackend::new(vec![ScriptedFrame::Image(buffer())], Duration::ZERO).repeating();
        let mut device = backend.open().unwrap();

        for _ in 0..3 {
            assert!(device.next_frame().unwrap().is_some());
        }
    }

    #[test]
    fn test_looping_blank_fills_bgra_buffer() {
        let backend = ScriptedBackend::looping_blank(3, 2, Duration::ZERO);
        let frame = backend.open().unwrap().next_frame().unwrap().unwrap();

        assert_eq!((frame.width, frame.height), (3, 2));
        assert_eq!(frame.data.len(), 3 * 2 * BGRA_CHANNELS);
        assert_eq!(backend.orientation(), Orientation::Up);
    }

    #[test]
    fn test_lost_step_reports_device_lost() {
        let backend = ScriptedBackend::new(vec![ScriptedFrame::Lost], Duration::ZERO);
        let mut device = backend.open().unwrap();
        assert!(matches!(
            device.next_frame(),
            Err(CaptureError::DeviceLost(_))
        ));
    }

    #[test]
    fn test_unavailable_backend_fails_to_open() {
        let backend = ScriptedBackend::unavailable();
        assert!(matches!(backend.open(), Err(CaptureError::NoFrontCamera)));
        assert_eq!(backend.open_count(), 0);
    }
}
