mod game;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use faceflap_core::capture::domain::capture_device::CaptureBackend;
use faceflap_core::capture::infrastructure::image_sequence_backend::ImageSequenceBackend;
use faceflap_core::control::domain::control_bridge::CompletionOrder;
use faceflap_core::control::domain::face_indicator::FaceIndicator;
use faceflap_core::control::infrastructure::control_signal::ControlSignal;
use faceflap_core::detection::infrastructure::detection_pool::DetectorFactory;
use faceflap_core::detection::infrastructure::model_resolver;
use faceflap_core::detection::infrastructure::rustface_detector;
use faceflap_core::pipeline::face_control_pipeline::{FaceControlPipeline, PipelineParts};
use faceflap_core::pipeline::pipeline_config::PipelineConfig;
use faceflap_core::pipeline::pipeline_logger::{PipelineLogger, StatsPipelineLogger};
use faceflap_core::shared::constants::{BUNDLED_MODEL_DIR, SEETA_MODEL_NAME, SEETA_MODEL_URL};
use faceflap_core::shared::main_queue::MainQueue;
use faceflap_core::shared::orientation::Orientation;

use crate::game::HeadlessGame;

/// Steer a game with your face: camera in, control signal out.
#[derive(Parser)]
#[command(name = "faceflap")]
struct Cli {
    /// Config file (defaults to the user config, if any).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replay a directory of images instead of opening a camera.
    #[arg(long)]
    images: Option<PathBuf>,

    /// Replay rate for --images.
    #[arg(long, default_value = "15")]
    fps: f64,

    /// Camera index to open instead of the front-facing one.
    #[arg(long)]
    camera_index: Option<u32>,

    /// Concurrent detections.
    #[arg(long)]
    workers: Option<usize>,

    /// Overlapping results: latest-completed or latest-submitted.
    #[arg(long)]
    completion_order: Option<String>,

    /// Override the capture source's frame orientation, e.g. up, left-mirrored.
    #[arg(long)]
    orientation: Option<String>,

    /// Stop after this many game ticks (0 = run until capture stops or Ctrl-C).
    #[arg(long, default_value = "0")]
    ticks: u64,

    /// Game ticks per second.
    #[arg(long, default_value = "60")]
    tick_rate: f64,

    /// Use this SeetaFace model file instead of the bundled or cached one.
    #[arg(long)]
    model: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    let config = build_config(&cli)?;
    let backend = build_backend(&cli, &config)?;
    let detectors = build_detectors(&cli, &config)?;

    let queue: MainQueue<dyn FaceIndicator> = MainQueue::new();
    let signal = Arc::new(ControlSignal::new());
    let stats = Arc::new(StatsPipelineLogger::new());
    let logger: Arc<dyn PipelineLogger> = stats.clone();

    let mut pipeline = FaceControlPipeline::new(
        &config,
        PipelineParts {
            backend,
            detectors,
            game: signal.clone(),
            indicator: queue.handle(),
            logger,
        },
    )?;
    pipeline.start()?;

    let mut game = HeadlessGame::new(queue, signal, cli.tick_rate);
    let ticks = game.run(&pipeline, cli.ticks, &interrupted);
    pipeline.stop();

    log::info!("Ran {ticks} game tick(s)");
    stats.summary();
    Ok(())
}

fn build_config(cli: &Cli) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::load_or_default(),
    };

    if let Some(workers) = cli.workers {
        config.detection_workers = workers;
    }
    if let Some(order) = &cli.completion_order {
        config.completion_order = parse_completion_order(order)?;
    }
    if let Some(orientation) = &cli.orientation {
        config.orientation = Some(parse_orientation(orientation)?);
    }
    if cli.camera_index.is_some() {
        config.camera.index = cli.camera_index;
    }
    config.validate()?;
    Ok(config)
}

fn build_backend(
    cli: &Cli,
    config: &PipelineConfig,
) -> Result<Arc<dyn CaptureBackend>, Box<dyn std::error::Error>> {
    if let Some(dir) = &cli.images {
        let backend = ImageSequenceBackend::new(dir, cli.fps)?;
        log::info!("Replaying {} image(s) from {}", backend.len(), dir.display());
        return Ok(Arc::new(backend));
    }
    open_camera(config)
}

#[cfg(feature = "camera")]
fn open_camera(
    config: &PipelineConfig,
) -> Result<Arc<dyn CaptureBackend>, Box<dyn std::error::Error>> {
    use faceflap_core::capture::infrastructure::nokhwa_backend::NokhwaBackend;

    Ok(Arc::new(NokhwaBackend::new(
        config.camera.index,
        config.camera.width,
        config.camera.height,
    )))
}

#[cfg(not(feature = "camera"))]
fn open_camera(
    _config: &PipelineConfig,
) -> Result<Arc<dyn CaptureBackend>, Box<dyn std::error::Error>> {
    Err("built without camera support; pass --images <dir> or rebuild with --features camera".into())
}

fn build_detectors(
    cli: &Cli,
    config: &PipelineConfig,
) -> Result<DetectorFactory, Box<dyn std::error::Error>> {
    let model_path = match &cli.model {
        Some(path) => path.clone(),
        None => {
            log::info!("Resolving model: {SEETA_MODEL_NAME}");
            let path = model_resolver::resolve(
                SEETA_MODEL_NAME,
                SEETA_MODEL_URL,
                Some(Path::new(BUNDLED_MODEL_DIR)),
                Some(Box::new(download_progress)),
            )?;
            eprintln!();
            path
        }
    };
    let bytes = fs::read(&model_path)
        .map_err(|e| format!("Failed to read model {}: {e}", model_path.display()))?;
    Ok(rustface_detector::factory(Arc::new(bytes), config.detector))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(dir) = &cli.images {
        if !dir.is_dir() {
            return Err(format!("Image directory not found: {}", dir.display()).into());
        }
        if !(cli.fps.is_finite() && cli.fps > 0.0) {
            return Err(format!("FPS must be positive, got {}", cli.fps).into());
        }
    }
    if !(cli.tick_rate.is_finite() && cli.tick_rate > 0.0) {
        return Err(format!("Tick rate must be positive, got {}", cli.tick_rate).into());
    }
    if let Some(path) = &cli.model {
        if !path.exists() {
            return Err(format!("Model file not found: {}", path.display()).into());
        }
    }
    Ok(())
}

fn parse_completion_order(value: &str) -> Result<CompletionOrder, Box<dyn std::error::Error>> {
    match value {
        "latest-completed" => Ok(CompletionOrder::LatestCompleted),
        "latest-submitted" => Ok(CompletionOrder::LatestSubmitted),
        other => Err(format!(
            "Completion order must be 'latest-completed' or 'latest-submitted', got '{other}'"
        )
        .into()),
    }
}

fn parse_orientation(value: &str) -> Result<Orientation, Box<dyn std::error::Error>> {
    Orientation::ALL
        .iter()
        .copied()
        .find(|o| o.to_string() == value)
        .ok_or_else(|| {
            let names: Vec<String> = Orientation::ALL.iter().map(|o| o.to_string()).collect();
            format!(
                "Orientation must be one of: {}, got '{value}'",
                names.join(", ")
            )
            .into()
        })
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}
