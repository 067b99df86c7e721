use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::control::domain::face_indicator::FaceIndicator;
use crate::control::domain::game_state::GameState;
use crate::control::domain::redraw_guard::RedrawGuard;
use crate::detection::domain::detection_outcome::DetectionOutcome;
use crate::mapping::domain::coordinate_mapper::map_region;
use crate::mapping::domain::preview_geometry::PreviewGeometry;
use crate::shared::main_queue::MainHandle;

/// Which result wins when detections overlap and finish out of order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionOrder {
    /// Whatever finishes last is applied.
    #[default]
    LatestCompleted,
    /// Results for frames older than the newest applied frame are discarded.
    LatestSubmitted,
}

/// What [`ControlBridge::apply`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BridgeAction {
    Published(f64),
    Cleared,
    Discarded,
}

/// Turns detection outcomes into game control and indicator updates.
///
/// Runs on detection worker threads. Game State is written directly (it is
/// atomic); every indicator call is posted to the main thread.
pub struct ControlBridge {
    geometry: Arc<dyn PreviewGeometry>,
    game: Arc<dyn GameState>,
    indicator: MainHandle<dyn FaceIndicator>,
    order: CompletionOrder,
    active: AtomicBool,
    /// `index + 1` of the newest applied frame; 0 before the first one.
    newest_applied: AtomicU64,
}

impl ControlBridge {
    pub fn new(
        geometry: Arc<dyn PreviewGeometry>,
        game: Arc<dyn GameState>,
        indicator: MainHandle<dyn FaceIndicator>,
        order: CompletionOrder,
    ) -> Self {
        Self {
            geometry,
            game,
            indicator,
            order,
            active: AtomicBool::new(true),
            newest_applied: AtomicU64::new(0),
        }
    }

    pub fn activate(&self) {
        self.active.store(true, Ordering::Release);
    }

    /// Late completions arriving after this are discarded.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn geometry(&self) -> &Arc<dyn PreviewGeometry> {
        &self.geometry
    }

    /// Applies the outcome of detecting frame `frame_index`.
    pub fn apply(&self, frame_index: u64, outcome: &DetectionOutcome) -> BridgeAction {
        let _redraw = RedrawGuard::new(&self.indicator);

        if !self.is_active() {
            log::debug!("Discarding result for frame {frame_index}: pipeline stopped");
            return BridgeAction::Discarded;
        }
        if self.is_stale(frame_index) {
            log::debug!("Discarding result for frame {frame_index}: newer frame applied");
            return BridgeAction::Discarded;
        }

        // Errors clear the indicator the same way an empty frame does.
        let Some(region) = outcome.region() else {
            self.indicator.dispatch(|indicator| indicator.clear());
            return BridgeAction::Cleared;
        };

        let view = map_region(region, self.geometry.as_ref());
        let signal = view.vertical_midpoint();
        self.game.set_vertical_position(signal);

        let rect = view.rect();
        self.indicator
            .dispatch(move |indicator| indicator.set_bounding_box(rect));
        BridgeAction::Published(signal)
    }

    fn is_stale(&self, frame_index: u64) -> bool {
        match self.order {
            CompletionOrder::LatestCompleted => false,
            CompletionOrder::LatestSubmitted => {
                let key = frame_index.saturating_add(1);
                self.newest_applied.fetch_max(key, Ordering::AcqRel) > key
            }
        }
    }
}
