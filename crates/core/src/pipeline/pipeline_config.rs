use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::domain::capture_device::CaptureBackend;
use crate::control::domain::control_bridge::CompletionOrder;
use crate::detection::infrastructure::rustface_detector::DetectorSettings;
use crate::mapping::domain::preview_geometry::AspectFillGeometry;
use crate::shared::constants::{
    DEFAULT_CAPTURE_HEIGHT, DEFAULT_CAPTURE_WIDTH, DEFAULT_DETECTION_WORKERS, DEFAULT_VIEW_HEIGHT,
    DEFAULT_VIEW_WIDTH,
};
use crate::shared::geometry::Rect;
use crate::shared::orientation::Orientation;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("could not determine config directory")]
    NoConfigDir,
}

/// The view the preview fills, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub width: f64,
    pub height: f64,
    /// Flip x on top of the frame orientation. Mirrored orientations already
    /// mirror the frame, so this is normally off.
    pub mirrored: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEW_WIDTH,
            height: DEFAULT_VIEW_HEIGHT,
            mirrored: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Pin a camera by index instead of picking the front-facing one.
    pub index: Option<u32>,
    pub width: u32,
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: None,
            width: DEFAULT_CAPTURE_WIDTH,
            height: DEFAULT_CAPTURE_HEIGHT,
        }
    }
}

/// Tunables for the face control pipeline, persisted as JSON.
///
/// Missing keys fall back to their defaults, so a partial file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// How many frames may be in detection at once.
    pub detection_workers: usize,
    pub completion_order: CompletionOrder,
    /// Overrides the orientation the capture backend reports.
    pub orientation: Option<Orientation>,
    pub view: ViewConfig,
    pub camera: CameraConfig,
    pub detector: DetectorSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detection_workers: DEFAULT_DETECTION_WORKERS,
            completion_order: CompletionOrder::default(),
            orientation: None,
            view: ViewConfig::default(),
            camera: CameraConfig::default(),
            detector: DetectorSettings::default(),
        }
    }
}

impl PipelineConfig {
    /// `<config dir>/FaceFlap/config.json`.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|d| d.join("FaceFlap").join("config.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Reads and validates a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the user config, falling back to defaults if it is missing or broken.
    pub fn load_or_default() -> Self {
        let path = match Self::config_path() {
            Ok(path) => path,
            Err(e) => {
                log::warn!("{e}; using default config");
                return Self::default();
            }
        };
        if !path.exists() {
            log::debug!("No config at {}; using defaults", path.display());
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{e}; using default config");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| write_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        fs::write(path, json).map_err(write_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid =
            |msg: &str| -> Result<(), ConfigError> { Err(ConfigError::Invalid(msg.to_string())) };

        if self.detection_workers == 0 {
            return invalid("detection_workers must be at least 1");
        }
        if !(self.view.width.is_finite() && self.view.width > 0.0)
            || !(self.view.height.is_finite() && self.view.height > 0.0)
        {
            return invalid("view width and height must be positive");
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return invalid("camera width and height must be positive");
        }

        let d = &self.detector;
        if d.min_face_size < 20 {
            return invalid("detector.min_face_size must be at least 20");
        }
        if !(d.score_threshold.is_finite() && d.score_threshold > 0.0) {
            return invalid("detector.score_threshold must be positive");
        }
        if !(0.01..=0.99).contains(&d.pyramid_scale_factor) {
            return invalid("detector.pyramid_scale_factor must be within 0.01..=0.99");
        }
        if d.slide_window_step == 0 {
            return invalid("detector.slide_window_step must be at least 1");
        }
        Ok(())
    }

    /// The configured override, else what `backend` reports.
    pub fn frame_orientation(&self, backend: &dyn CaptureBackend) -> Orientation {
        self.orientation.unwrap_or_else(|| backend.orientation())
    }

    /// Aspect-fill layout of the uprighted capture frame inside the view.
    pub fn preview_geometry(&self, orientation: Orientation) -> AspectFillGeometry {
        let (width, height) =
            orientation.upright_dimensions(self.camera.width, self.camera.height);
        AspectFillGeometry::new(
            width,
            height,
            Rect::new(0.0, 0.0, self.view.width, self.view.height),
            self.view.mirrored,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::infrastructure::scripted_backend::ScriptedBackend;
    use crate::mapping::domain::preview_geometry::PreviewGeometry;
    use crate::shared::geometry::Point;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detection_workers, 2);
        assert_eq!(config.orientation, None);
        assert_eq!(config.completion_order, CompletionOrder::LatestCompleted);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "detection_workers": 4, "completion_order": "latest-submitted", "view": { "width": 320.0 } }"#,
        )
        .unwrap();

        let config = PipelineConfig::load(&path).unwrap();

        assert_eq!(config.detection_workers, 4);
        assert_eq!(config.completion_order, CompletionOrder::LatestSubmitted);
        assert_relative_eq!(config.view.width, 320.0);
        assert_relative_eq!(config.view.height, DEFAULT_VIEW_HEIGHT);
        assert_eq!(config.detector, DetectorSettings::default());
    }

    #[test]
    fn test_save_then_load_preserves_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = PipelineConfig::default();
        config.orientation = Some(Orientation::Right);
        config.camera.index = Some(1);

        config.save(&path).unwrap();

        assert_eq!(PipelineConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let result = PipelineConfig::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            PipelineConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_unknown_orientation_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "orientation": "sideways" }"#).unwrap();
        assert!(matches!(
            PipelineConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[rstest]
    #[case::zero_workers(|c: &mut PipelineConfig| c.detection_workers = 0)]
    #[case::zero_view(|c: &mut PipelineConfig| c.view.height = 0.0)]
    #[case::nan_view(|c: &mut PipelineConfig| c.view.width = f64::NAN)]
    #[case::zero_camera(|c: &mut PipelineConfig| c.camera.width = 0)]
    #[case::tiny_faces(|c: &mut PipelineConfig| c.detector.min_face_size = 10)]
    #[case::zero_threshold(|c: &mut PipelineConfig| c.detector.score_threshold = 0.0)]
    #[case::negative_threshold(|c: &mut PipelineConfig| c.detector.score_threshold = -1.0)]
    #[case::bad_pyramid(|c: &mut PipelineConfig| c.detector.pyramid_scale_factor = 1.0)]
    #[case::zero_step(|c: &mut PipelineConfig| c.detector.slide_window_step = 0)]
    fn test_validate_rejects(#[case] tweak: fn(&mut PipelineConfig)) {
        let mut config = PipelineConfig::default();
        tweak(&mut config);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_values_fail_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "detection_workers": 0 }"#).unwrap();
        assert!(matches!(
            PipelineConfig::load(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_orientation_defaults_to_backend() {
        let backend = ScriptedBackend::new(Vec::new(), Duration::ZERO)
            .with_orientation(Orientation::LeftMirrored);
        let mut config = PipelineConfig::default();

        assert_eq!(config.frame_orientation(&backend), Orientation::LeftMirrored);

        config.orientation = Some(Orientation::Up);
        assert_eq!(config.frame_orientation(&backend), Orientation::Up);
    }

    #[test]
    fn test_preview_geometry_uses_upright_frame() {
        // 1280x720 landscape sensor, portrait upright: 720x1280 into 360x640.
        let mut config = PipelineConfig::default();
        config.view.width = 360.0;
        config.view.height = 640.0;

        let geometry = config.preview_geometry(Orientation::LeftMirrored);
        let corner = geometry.view_point(Point::new(1.0, 1.0));

        assert_relative_eq!(corner.x, 360.0);
        assert_relative_eq!(corner.y, 640.0);
        assert_eq!(geometry.bounds(), Rect::new(0.0, 0.0, 360.0, 640.0));
    }
}
