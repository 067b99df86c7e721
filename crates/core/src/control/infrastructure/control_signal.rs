use std::sync::atomic::{AtomicU64, Ordering};

use crate::control::domain::game_state::GameState;

const CLEARED: u64 = u64::MAX;

/// Lock-free holder for the bird's target height.
///
/// Detection workers publish into it; the game tick reads it. Only the most
/// recent value is kept. A NaN publish is stored as cleared.
pub struct ControlSignal {
    bits: AtomicU64,
}

impl ControlSignal {
    pub fn new() -> Self {
        Self {
            bits: AtomicU64::new(CLEARED),
        }
    }

    /// The live value, or `None` if nothing has been published since the last reset.
    pub fn read(&self) -> Option<f64> {
        match self.bits.load(Ordering::Acquire) {
            CLEARED => None,
            bits => Some(f64::from_bits(bits)),
        }
    }

    pub fn is_cleared(&self) -> bool {
        self.read().is_none()
    }
}

impl Default for ControlSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState for ControlSignal {
    fn set_vertical_position(&self, y: f64) {
        let bits = if y.is_nan() { CLEARED } else { y.to_bits() };
        self.bits.store(bits, Ordering::Release);
    }

    fn reset(&self) {
        self.bits.store(CLEARED, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_starts_cleared() {
        assert!(ControlSignal::new().is_cleared());
    }

    #[test]
    fn test_latest_value_wins() {
        let signal = ControlSignal::new();
        signal.set_vertical_position(120.0);
        signal.set_vertical_position(-4.5);
        assert_eq!(signal.read(), Some(-4.5));
    }

    #[test]
    fn test_reset_clears() {
        let signal = ControlSignal::new();
        signal.set_vertical_position(0.45);
        signal.reset();
        assert_eq!(signal.read(), None);
    }

    #[test]
    fn test_nan_is_stored_as_cleared() {
        let signal = ControlSignal::new();
        signal.set_vertical_position(1.0);
        signal.set_vertical_position(f64::NAN);
        assert!(signal.is_cleared());
    }

    #[test]
    fn test_concurrent_writers_leave_one_written_value() {
        let signal = Arc::new(ControlSignal::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let signal = Arc::clone(&signal);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        signal.set_vertical_position(f64::from(i));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let value = signal.read().unwrap();
        assert!((0..8).any(|i| f64::from(i) == value));
    }
}
