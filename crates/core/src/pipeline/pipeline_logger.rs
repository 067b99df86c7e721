use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use crate::detection::domain::detection_outcome::DetectionOutcome;

/// Cross-cutting logger for pipeline events.
///
/// Called concurrently from the frame-source thread and every detection
/// worker, so all methods take `&self`.
pub trait PipelineLogger: Send + Sync {
    /// A frame left the capture device.
    fn frame_captured(&self, index: u64);

    /// A frame was discarded because every detector was busy.
    fn frame_dropped(&self, index: u64);

    /// Record how long a named pipeline stage took for one frame.
    fn timing(&self, stage: &str, duration_ms: f64);

    /// Record the result of one detection.
    fn outcome(&self, outcome: &DetectionOutcome);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn frame_captured(&self, _index: u64) {}
    fn frame_dropped(&self, _index: u64) {}
    fn timing(&self, _stage: &str, _duration_ms: f64) {}
    fn outcome(&self, _outcome: &DetectionOutcome) {}
}

/// Running totals for one stage.
#[derive(Default, Clone, Copy)]
struct StageTiming {
    runs: u64,
    total_ms: f64,
}

#[derive(Default)]
struct Stats {
    timings: HashMap<String, StageTiming>,
    captured: u64,
    dropped: u64,
    found: u64,
    not_found: u64,
    errors: u64,
}

/// Tracks per-stage timing and frame counters; logs a summary on request.
pub struct StatsPipelineLogger {
    stats: Mutex<Stats>,
    start_time: Instant,
}

impl StatsPipelineLogger {
    pub fn new() -> Self {
        Self {
            stats: Mutex::new(Stats::default()),
            start_time: Instant::now(),
        }
    }

    fn with_stats<R>(&self, f: impl FnOnce(&mut Stats) -> R) -> R {
        let mut stats = self
            .stats
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut stats)
    }

    /// Returns the formatted summary string, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        self.with_stats(|stats| {
            if stats.captured == 0 && stats.timings.is_empty() {
                return None;
            }

            let elapsed_s = self.start_time.elapsed().as_secs_f64();
            let mut lines = vec![format!(
                "Pipeline summary ({} frames captured, {:.1}s total):",
                stats.captured, elapsed_s
            )];

            let mut stages: Vec<_> = stats.timings.keys().collect();
            stages.sort();
            for stage in stages {
                let StageTiming { runs, total_ms } = stats.timings[stage];
                let avg_ms = if runs == 0 {
                    0.0
                } else {
                    total_ms / runs as f64
                };
                lines.push(format!(
                    "  {stage:12}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({runs} runs)"
                ));
            }

            lines.push(format!(
                "  faces: {} found, {} not found, {} errors",
                stats.found, stats.not_found, stats.errors
            ));
            lines.push(format!("  dropped frames: {}", stats.dropped));

            let detected = stats.found + stats.not_found + stats.errors;
            if detected > 0 && elapsed_s > 0.0 {
                lines.push(format!(
                    "  Detection rate: {:.1} fps",
                    detected as f64 / elapsed_s
                ));
            }

            Some(lines.join("\n"))
        })
    }

    /// `(runs, total_ms)` recorded for a stage.
    pub fn timings_for(&self, stage: &str) -> Option<(u64, f64)> {
        self.with_stats(|stats| stats.timings.get(stage).map(|t| (t.runs, t.total_ms)))
    }

    /// `(captured, dropped, found, not_found, errors)`
    pub fn counters(&self) -> (u64, u64, u64, u64, u64) {
        self.with_stats(|s| (s.captured, s.dropped, s.found, s.not_found, s.errors))
    }
}

impl Default for StatsPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for StatsPipelineLogger {
    fn frame_captured(&self, _index: u64) {
        self.with_stats(|s| s.captured += 1);
    }

    fn frame_dropped(&self, index: u64) {
        log::trace!("Dropped frame {index}: detectors busy");
        self.with_stats(|s| s.dropped += 1);
    }

    fn timing(&self, stage: &str, duration_ms: f64) {
        self.with_stats(|s| {
            let entry = s.timings.entry(stage.to_string()).or_default();
            entry.runs += 1;
            entry.total_ms += duration_ms;
        });
    }

    fn outcome(&self, outcome: &DetectionOutcome) {
        self.with_stats(|s| match outcome {
            DetectionOutcome::Found(_) => s.found += 1,
            DetectionOutcome::NotFound => s.not_found += 1,
            DetectionOutcome::Error(_) => s.errors += 1,
        });
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection_error::DetectionErrorKind;
    use crate::shared::geometry::{DetectionRegion, Rect};

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let logger = NullPipelineLogger;
        logger.frame_captured(1);
        logger.frame_dropped(2);
        logger.timing("detect", 5.0);
        logger.outcome(&DetectionOutcome::NotFound);
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let logger = StatsPipelineLogger::new();
        logger.timing("detect", 20.0);
        logger.timing("detect", 30.0);

        let (runs, total_ms) = logger.timings_for("detect").unwrap();
        assert_eq!(runs, 2);
        assert!((total_ms - 50.0).abs() < f64::EPSILON);
        assert!(logger.timings_for("blur").is_none());
    }

    #[test]
    fn test_long_runs_keep_running_totals() {
        let logger = StatsPipelineLogger::new();
        for _ in 0..100_000 {
            logger.timing("detect", 0.5);
        }

        let (runs, total_ms) = logger.timings_for("detect").unwrap();
        assert_eq!(runs, 100_000);
        assert!((total_ms - 50_000.0).abs() < 1e-6);
        assert!(logger
            .summary_string()
            .unwrap()
            .contains("avg    0.5ms"));
    }

    #[test]
    fn test_outcomes_are_counted() {
        let logger = StatsPipelineLogger::new();
        let region = DetectionRegion::new(Rect::new(0.0, 0.0, 0.1, 0.1));
        logger.outcome(&DetectionOutcome::Found(region));
        logger.outcome(&DetectionOutcome::NotFound);
        logger.outcome(&DetectionOutcome::NotFound);
        logger.outcome(&DetectionOutcome::Error(DetectionErrorKind::Backend));

        let (_, _, found, not_found, errors) = logger.counters();
        assert_eq!((found, not_found, errors), (1, 2, 1));
    }

    #[test]
    fn test_frame_counters() {
        let logger = StatsPipelineLogger::new();
        logger.frame_captured(0);
        logger.frame_captured(1);
        logger.frame_dropped(1);

        let (captured, dropped, ..) = logger.counters();
        assert_eq!((captured, dropped), (2, 1));
    }

    #[test]
    fn test_summary_includes_timing_and_counters() {
        let logger = StatsPipelineLogger::new();
        logger.frame_captured(0);
        logger.timing("detect", 12.0);
        logger.outcome(&DetectionOutcome::NotFound);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Pipeline summary"));
        assert!(summary.contains("detect"));
        assert!(summary.contains("1 not found"));
        assert!(summary.contains("dropped frames: 0"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        let logger = StatsPipelineLogger::default();
        assert!(logger.summary_string().is_none());
    }

    #[test]
    fn test_logger_is_shareable_across_threads() {
        let logger = std::sync::Arc::new(StatsPipelineLogger::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let logger = std::sync::Arc::clone(&logger);
                std::thread::spawn(move || logger.frame_captured(i))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(logger.counters().0, 4);
    }
}
