use crate::control::domain::face_indicator::FaceIndicator;
use crate::shared::main_queue::MainHandle;

/// Schedules an indicator redraw on the main thread when dropped.
///
/// Holding one for the duration of a detection callback guarantees the redraw
/// is posted on every exit path, after anything the callback posted itself.
pub struct RedrawGuard<'a> {
    main: &'a MainHandle<dyn FaceIndicator>,
}

impl<'a> RedrawGuard<'a> {
    pub fn new(main: &'a MainHandle<dyn FaceIndicator>) -> Self {
        Self { main }
    }
}

impl Drop for RedrawGuard<'_> {
    fn drop(&mut self) {
        if !self.main.dispatch(|indicator| indicator.request_redraw()) {
            log::debug!("Main queue gone; redraw skipped");
        }
    }
}
