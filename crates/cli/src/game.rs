use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use faceflap_core::control::domain::face_indicator::FaceIndicator;
use faceflap_core::control::infrastructure::control_signal::ControlSignal;
use faceflap_core::pipeline::face_control_pipeline::FaceControlPipeline;
use faceflap_core::shared::geometry::Rect;
use faceflap_core::shared::main_queue::MainQueue;

/// Indicator for a terminal: remembers the box and logs it on redraw.
#[derive(Default)]
pub struct LogIndicator {
    current: Option<Rect>,
    dirty: bool,
    redraws: u64,
}

impl LogIndicator {
    pub fn current(&self) -> Option<Rect> {
        self.current
    }

    pub fn redraws(&self) -> u64 {
        self.redraws
    }
}

impl FaceIndicator for LogIndicator {
    fn set_bounding_box(&mut self, rect: Rect) {
        self.dirty |= self.current != Some(rect);
        self.current = Some(rect);
    }

    fn clear(&mut self) {
        self.dirty |= self.current.is_some();
        self.current = None;
    }

    fn request_redraw(&mut self) {
        self.redraws += 1;
        if !self.dirty {
            return;
        }
        self.dirty = false;
        match self.current {
            Some(r) => log::debug!(
                "Face box: x={:.1} y={:.1} w={:.1} h={:.1}",
                r.x,
                r.y,
                r.width,
                r.height
            ),
            None => log::debug!("Face box cleared"),
        }
    }
}

/// Fixed-rate main loop standing in for the game's frame updates.
pub struct HeadlessGame {
    queue: MainQueue<dyn FaceIndicator>,
    indicator: LogIndicator,
    signal: Arc<ControlSignal>,
    tick_interval: Duration,
    report_every: u64,
}

impl HeadlessGame {
    pub fn new(
        queue: MainQueue<dyn FaceIndicator>,
        signal: Arc<ControlSignal>,
        tick_rate: f64,
    ) -> Self {
        let rate = if tick_rate > 0.0 { tick_rate } else { 60.0 };
        Self {
            queue,
            indicator: LogIndicator::default(),
            signal,
            tick_interval: Duration::from_secs_f64(1.0 / rate),
            report_every: rate.round().max(1.0) as u64,
        }
    }

    /// One game tick: apply pending indicator work, then read the control.
    pub fn tick(&mut self) -> Option<f64> {
        self.queue.run_pending(&mut self.indicator);
        self.signal.read()
    }

    /// Ticks until `ticks` have elapsed (0 = unbounded), capture stops, or
    /// `interrupted` is raised.
    pub fn run(
        &mut self,
        pipeline: &FaceControlPipeline,
        ticks: u64,
        interrupted: &AtomicBool,
    ) -> u64 {
        self.run_while(ticks, || {
            if interrupted.load(Ordering::SeqCst) {
                log::info!("Interrupted; stopping");
                return false;
            }
            if !pipeline.is_running() {
                log::warn!("Capture stopped; ending game loop");
                return false;
            }
            true
        })
    }

    /// Ticks until `ticks` have elapsed (0 = unbounded) or `keep_going`
    /// returns false after a tick.
    fn run_while(&mut self, ticks: u64, mut keep_going: impl FnMut() -> bool) -> u64 {
        let mut count = 0;
        while ticks == 0 || count < ticks {
            let started = Instant::now();
            let target = self.tick();
            count += 1;

            if count % self.report_every == 0 {
                match target {
                    Some(y) => log::info!("Tick {count}: bird target y={y:.1}"),
                    None => log::info!("Tick {count}: no face yet"),
                }
            }
            if !keep_going() {
                break;
            }

            if let Some(rest) = self.tick_interval.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
        // Flush whatever the detectors posted during the last tick.
        self.queue.run_pending(&mut self.indicator);
        count
    }

    pub fn indicator(&self) -> &LogIndicator {
        &self.indicator
    }
}
