use crate::shared::geometry::Rect;

/// Overlay that outlines the detected face on top of the camera preview.
///
/// Only ever called on the main thread; other threads reach it through a
/// [`MainQueue`](crate::shared::main_queue::MainQueue).
pub trait FaceIndicator {
    fn set_bounding_box(&mut self, rect: Rect);

    fn clear(&mut self);

    fn request_redraw(&mut self);
}
