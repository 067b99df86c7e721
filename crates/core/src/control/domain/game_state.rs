/// The game-side consumer of the control signal.
///
/// Written from detection worker threads and read by the game tick on the
/// main thread, so implementations must be internally synchronized.
pub trait GameState: Send + Sync {
    /// Sets the vertical position, in view points, that the bird steers toward.
    fn set_vertical_position(&self, y: f64);

    /// Restart gesture: forget the current position.
    fn reset(&self);
}
