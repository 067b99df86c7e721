use std::sync::Arc;

use crate::capture::domain::capture_device::CaptureBackend;
use crate::capture::domain::frame_source::{FrameSink, FrameSource};
use crate::control::domain::control_bridge::ControlBridge;
use crate::control::domain::face_indicator::FaceIndicator;
use crate::control::domain::game_state::GameState;
use crate::detection::infrastructure::detection_pool::{DetectionPool, DetectorFactory, Submission};
use crate::mapping::domain::preview_geometry::PreviewGeometry;
use crate::pipeline::pipeline_config::PipelineConfig;
use crate::pipeline::pipeline_error::PipelineError;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::frame::Frame;
use crate::shared::main_queue::MainHandle;

/// The collaborators a pipeline is wired from.
pub struct PipelineParts {
    pub backend: Arc<dyn CaptureBackend>,
    pub detectors: DetectorFactory,
    pub game: Arc<dyn GameState>,
    pub indicator: MainHandle<dyn FaceIndicator>,
    pub logger: Arc<dyn PipelineLogger>,
}

/// Camera to game control, end to end.
///
/// Frames flow from the [`FrameSource`] thread into the [`DetectionPool`];
/// each completion goes through the [`ControlBridge`], which writes the game
/// state and posts indicator updates to the main thread.
pub struct FaceControlPipeline {
    source: FrameSource,
    pool: Arc<DetectionPool>,
    bridge: Arc<ControlBridge>,
    logger: Arc<dyn PipelineLogger>,
}

impl FaceControlPipeline {
    /// Validates `config` and builds every stage. Detectors are ready on return.
    pub fn new(config: &PipelineConfig, parts: PipelineParts) -> Result<Self, PipelineError> {
        let orientation = config.frame_orientation(parts.backend.as_ref());
        let geometry: Arc<dyn PreviewGeometry> = Arc::new(config.preview_geometry(orientation));
        Self::with_geometry(config, geometry, parts)
    }

    /// Like [`new`](Self::new), with an explicit preview layout.
    pub fn with_geometry(
        config: &PipelineConfig,
        geometry: Arc<dyn PreviewGeometry>,
        parts: PipelineParts,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let PipelineParts {
            backend,
            detectors,
            game,
            indicator,
            logger,
        } = parts;

        let orientation = config.frame_orientation(backend.as_ref());
        log::debug!("Capturing from {} ({orientation})", backend.describe());

        let pool = DetectionPool::new(config.detection_workers, detectors, Arc::clone(&logger))?;
        let bridge = ControlBridge::new(geometry, game, indicator, config.completion_order);
        bridge.deactivate();

        Ok(Self {
            source: FrameSource::new(backend, orientation),
            pool: Arc::new(pool),
            bridge: Arc::new(bridge),
            logger,
        })
    }

    /// Starts capture. No-op while running.
    ///
    /// A camera that cannot be opened is returned as an error and the
    /// pipeline stays stopped.
    pub fn start(&mut self) -> Result<(), PipelineError> {
        if self.source.is_running() {
            return Ok(());
        }
        self.bridge.activate();

        let pool = Arc::clone(&self.pool);
        let bridge = Arc::clone(&self.bridge);
        let logger = Arc::clone(&self.logger);
        let sink: FrameSink = Arc::new(move |frame: Frame| {
            let index = frame.index();
            logger.frame_captured(index);
            let bridge = Arc::clone(&bridge);
            let submission = pool.submit(frame, move |outcome| {
                bridge.apply(index, &outcome);
            });
            if submission == Submission::Dropped {
                logger.frame_dropped(index);
            }
        });

        if let Err(e) = self.source.start(sink) {
            self.bridge.deactivate();
            return Err(e.into());
        }
        log::info!(
            "Face control started ({} detection worker(s))",
            self.pool.workers()
        );
        Ok(())
    }

    /// Stops capture. Detections still in flight finish but are discarded.
    pub fn stop(&mut self) {
        self.source.stop();
        self.bridge.deactivate();
    }

    /// False after [`stop`](Self::stop) or once the camera was lost.
    pub fn is_running(&self) -> bool {
        self.source.is_running()
    }

    pub fn geometry(&self) -> &Arc<dyn PreviewGeometry> {
        self.bridge.geometry()
    }

    pub fn workers(&self) -> usize {
        self.pool.workers()
    }
}

impl Drop for FaceControlPipeline {
    fn drop(&mut self) {
        self.stop();
    }
}
