use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::detection::domain::detection_error::{DetectionError, DetectionErrorKind};
use crate::detection::domain::detection_outcome::DetectionOutcome;
use crate::detection::domain::face_detector::FaceDetector;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::frame::Frame;

/// Builds the detector for worker `n`. Runs on that worker's thread.
pub type DetectorFactory =
    Arc<dyn Fn(usize) -> Result<Box<dyn FaceDetector>, DetectionError> + Send + Sync>;

/// Called once with the outcome of a submitted frame, on a worker thread.
pub type Completion = Box<dyn FnOnce(DetectionOutcome) + Send>;

/// Whether a frame reached a detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Submission {
    Dispatched,
    /// Every worker was busy; the frame was discarded.
    Dropped,
}

struct Job {
    frame: Frame,
    completion: Completion,
}

/// Fixed set of detection threads, each owning its own detector.
///
/// Jobs are handed over through a zero-capacity channel: a frame is accepted
/// only if a worker is idle at that instant, so nothing ever queues behind a
/// slow detection. With more than one worker, completions may arrive out of
/// submission order.
pub struct DetectionPool {
    job_tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl DetectionPool {
    /// Spawns `workers` threads and waits until every detector is built.
    ///
    /// The first construction error is returned and the pool is torn down.
    pub fn new(
        workers: usize,
        factory: DetectorFactory,
        logger: Arc<dyn PipelineLogger>,
    ) -> Result<Self, DetectionError> {
        let count = workers.max(1);
        let (job_tx, job_rx) = crossbeam_channel::bounded::<Job>(0);
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), DetectionError>>(count);

        let mut pool = Self {
            job_tx: Some(job_tx),
            workers: Vec::with_capacity(count),
        };

        for id in 0..count {
            let factory = Arc::clone(&factory);
            let jobs = job_rx.clone();
            let ready = ready_tx.clone();
            let logger = Arc::clone(&logger);
            let handle = thread::Builder::new()
                .name(format!("face-detect-{id}"))
                .spawn(move || {
                    let detector = match factory(id) {
                        Ok(detector) => {
                            let _ = ready.send(Ok(()));
                            detector
                        }
                        Err(e) => {
                            let _ = ready.send(Err(e));
                            return;
                        }
                    };
                    drop(ready);
                    run_worker(id, detector, jobs, logger.as_ref());
                })
                .map_err(|e| DetectionError::Spawn {
                    worker: id,
                    source: e,
                })?;
            pool.workers.push(handle);
        }
        drop(ready_tx);

        for id in 0..count {
            match ready_rx.recv() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(e),
                Err(_) => return Err(DetectionError::WorkerExited(id)),
            }
        }

        log::info!("Started {count} face detection worker(s)");
        Ok(pool)
    }

    /// Hands `frame` to an idle worker, or drops it if none is idle.
    pub fn submit<F>(&self, frame: Frame, completion: F) -> Submission
    where
        F: FnOnce(DetectionOutcome) + Send + 'static,
    {
        let Some(tx) = &self.job_tx else {
            return Submission::Dropped;
        };
        let job = Job {
            frame,
            completion: Box::new(completion),
        };
        match tx.try_send(job) {
            Ok(()) => Submission::Dispatched,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                Submission::Dropped
            }
        }
    }

    pub fn workers(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for DetectionPool {
    fn drop(&mut self) {
        // Closing the job channel lets each worker finish its current frame.
        self.job_tx.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("Detection worker thread panicked");
            }
        }
    }
}

fn run_worker(
    id: usize,
    mut detector: Box<dyn FaceDetector>,
    jobs: Receiver<Job>,
    logger: &dyn PipelineLogger,
) {
    for Job { frame, completion } in jobs {
        let index = frame.index();
        let started = Instant::now();

        let result = panic::catch_unwind(AssertUnwindSafe(|| detector.detect(&frame)));
        drop(frame);

        let outcome = match result {
            Ok(result) => DetectionOutcome::from_result(result),
            Err(_) => {
                log::error!("Detector on worker {id} panicked on frame {index}");
                DetectionOutcome::Error(DetectionErrorKind::Panicked)
            }
        };

        logger.timing("detect", started.elapsed().as_secs_f64() * 1000.0);
        logger.outcome(&outcome);
        log::trace!("Worker {id} finished frame {index}: {outcome:?}");

        completion(outcome);
    }
}
