use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::capture::domain::capture_device::{CaptureBackend, CaptureDevice};
use crate::capture::domain::capture_error::CaptureError;
use crate::shared::frame::Frame;
use crate::shared::orientation::Orientation;

/// Receives every captured frame, on the frame-source thread.
pub type FrameSink = Arc<dyn Fn(Frame) + Send + Sync>;

/// Continuous camera capture on a dedicated thread.
///
/// Frames are tagged with the fixed orientation chosen at construction and a
/// sequence index that keeps increasing across restarts.
pub struct FrameSource {
    backend: Arc<dyn CaptureBackend>,
    orientation: Orientation,
    running: Arc<AtomicBool>,
    next_index: Arc<AtomicU64>,
    worker: Option<JoinHandle<()>>,
}

impl FrameSource {
    pub fn new(backend: Arc<dyn CaptureBackend>, orientation: Orientation) -> Self {
        Self {
            backend,
            orientation,
            running: Arc::new(AtomicBool::new(false)),
            next_index: Arc::new(AtomicU64::new(0)),
            worker: None,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// False once stopped, or after the device was lost.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Opens the device and starts delivering frames to `sink`.
    ///
    /// No-op while already running. Open failures are configuration errors
    /// and are returned as-is.
    pub fn start(&mut self, sink: FrameSink) -> Result<(), CaptureError> {
        if self.is_running() {
            return Ok(());
        }
        // Reap a worker that exited on its own (device lost).
        self.join_worker();

        self.running.store(true, Ordering::Release);
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), CaptureError>>(1);

        let backend = Arc::clone(&self.backend);
        let running = Arc::clone(&self.running);
        let next_index = Arc::clone(&self.next_index);
        let orientation = self.orientation;

        let spawned = thread::Builder::new()
            .name("frame-source".to_string())
            .spawn(move || {
                let mut device = match backend.open() {
                    Ok(device) => {
                        let _ = ready_tx.send(Ok(()));
                        device
                    }
                    Err(e) => {
                        running.store(false, Ordering::Release);
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                capture_loop(device.as_mut(), &running, &next_index, orientation, &sink);
            });
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.running.store(false, Ordering::Release);
                return Err(CaptureError::Spawn(e));
            }
        };

        let ready = ready_rx.recv().unwrap_or(Err(CaptureError::WorkerExited));
        self.worker = Some(handle);
        match ready {
            Ok(()) => {
                log::info!("Capture started: {}", self.backend.describe());
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::Release);
                self.join_worker();
                Err(e)
            }
        }
    }

    /// Stops capture and waits for the capture thread.
    ///
    /// No frame is delivered once this returns. Safe to call when stopped.
    pub fn stop(&mut self) {
        let was_running = self.running.swap(false, Ordering::AcqRel);
        self.join_worker();
        if was_running {
            log::info!("Capture stopped");
        }
    }

    fn join_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::error!("Frame source thread panicked");
            }
        }
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn capture_loop(
    device: &mut dyn CaptureDevice,
    running: &AtomicBool,
    next_index: &AtomicU64,
    orientation: Orientation,
    sink: &FrameSink,
) {
    while running.load(Ordering::Acquire) {
        match device.next_frame() {
            Ok(Some(buffer)) => {
                if !running.load(Ordering::Acquire) {
                    break;
                }
                let index = next_index.fetch_add(1, Ordering::Relaxed);
                sink(Frame::new(
                    buffer.data,
                    buffer.width,
                    buffer.height,
                    orientation,
                    index,
                ));
            }
            Ok(None) => log::trace!("Capture callback had no image buffer; frame skipped"),
            Err(CaptureError::DeviceLost(reason)) => {
                log::error!("Capture device lost: {reason}");
                running.store(false, Ordering::Release);
                break;
            }
            Err(e) => log::warn!("Frame skipped: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::domain::capture_device::CapturedBuffer;
    use crate::capture::infrastructure::scripted_backend::{ScriptedBackend, ScriptedFrame};
    use std::sync::Mutex;
    use std::time::Duration;

    fn collecting_sink() -> (FrameSink, Arc<Mutex<Vec<Frame>>>) {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let store = Arc::clone(&frames);
        let sink: FrameSink = Arc::new(move |frame| store.lock().unwrap().push(frame));
        (sink, frames)
    }

    fn wait_for(frames: &Mutex<Vec<Frame>>, count: usize) {
        for _ in 0..1000 {
            if frames.lock().unwrap().len() >= count {
                return;
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("timed out waiting for {count} frames");
    }

    fn buffer() -> CapturedBuffer {
        CapturedBuffer::new(vec![0u8; 16], 2, 2)
    }

    #[test]
    fn test_delivers_tagged_frames_off_the_caller_thread() {
        let backend = Arc::new(ScriptedBackend::looping_blank(2, 2, Duration::from_millis(1)));
        let mut source = FrameSource::new(backend, Orientation::LeftMirrored);
        let caller = thread::current().id();
        let threads = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&threads);
        let (inner, frames) = collecting_sink();
        let sink: FrameSink = Arc::new(move |frame| {
            seen.lock().unwrap().push(thread::current().id());
            inner(frame);
        });

        source.start(sink).unwrap();
        wait_for(&frames, 3);
        source.stop();

        let frames = frames.lock().unwrap();
        assert!(frames.iter().all(|f| f.orientation() == Orientation::LeftMirrored));
        let indices: Vec<u64> = frames.iter().map(Frame::index).collect();
        assert!(indices.windows(2).all(|w| w[1] == w[0] + 1));
        assert!(threads.lock().unwrap().iter().all(|id| *id != caller));
    }

    #[test]
    fn test_start_is_idempotent() {
        let backend = Arc::new(ScriptedBackend::looping_blank(2, 2, Duration::from_millis(1)));
        let mut source = FrameSource::new(backend.clone(), Orientation::Up);
        let (sink, _frames) = collecting_sink();

        source.start(sink.clone()).unwrap();
        source.start(sink).unwrap();

        assert!(source.is_running());
        assert_eq!(backend.open_count(), 1);
    }

    #[test]
    fn test_unavailable_camera_is_fatal() {
        let mut source = FrameSource::new(Arc::new(ScriptedBackend::unavailable()), Orientation::Up);
        let (sink, _frames) = collecting_sink();

        let result = source.start(sink);

        assert!(matches!(result, Err(CaptureError::NoFrontCamera)));
        assert!(!source.is_running());
    }

    #[test]
    fn test_stop_prevents_further_deliveries() {
        let backend = Arc::new(ScriptedBackend::looping_blank(2, 2, Duration::from_millis(1)));
        let mut source = FrameSource::new(backend, Orientation::Up);
        let (sink, frames) = collecting_sink();

        source.start(sink).unwrap();
        wait_for(&frames, 2);
        source.stop();
        let delivered = frames.lock().unwrap().len();
        thread::sleep(Duration::from_millis(30));

        assert_eq!(frames.lock().unwrap().len(), delivered);
        assert!(!source.is_running());
    }

    #[test]
    fn test_stop_when_stopped_is_safe() {
        let backend = Arc::new(ScriptedBackend::looping_blank(2, 2, Duration::from_millis(1)));
        let mut source = FrameSource::new(backend, Orientation::Up);
        source.stop();
        source.stop();
        assert!(!source.is_running());
    }

    #[test]
    fn test_missing_buffers_are_skipped() {
        let script = vec![
            ScriptedFrame::Missing,
            ScriptedFrame::Image(buffer()),
            ScriptedFrame::Missing,
            ScriptedFrame::Image(buffer()),
        ];
        let backend = Arc::new(ScriptedBackend::new(script, Duration::ZERO));
        let mut source = FrameSource::new(backend, Orientation::Up);
        let (sink, frames) = collecting_sink();

        source.start(sink).unwrap();
        wait_for(&frames, 2);
        thread::sleep(Duration::from_millis(20));
        source.stop();

        let indices: Vec<u64> = frames.lock().unwrap().iter().map(Frame::index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_device_lost_ends_capture_and_allows_restart() {
        let script = vec![ScriptedFrame::Image(buffer()), ScriptedFrame::Lost];
        let backend = Arc::new(ScriptedBackend::new(script, Duration::ZERO));
        let mut source = FrameSource::new(backend.clone(), Orientation::Up);
        let (sink, frames) = collecting_sink();

        source.start(sink.clone()).unwrap();
        for _ in 0..500 {
            if !source.is_running() {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
        assert!(!source.is_running());

        source.start(sink).unwrap();
        wait_for(&frames, 2);
        source.stop();

        assert_eq!(backend.open_count(), 2);
        let indices: Vec<u64> = frames.lock().unwrap().iter().map(Frame::index).collect();
        assert_eq!(&indices[..2], &[0, 1]);
    }
}
