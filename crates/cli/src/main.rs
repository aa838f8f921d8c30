use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;

use facemesh_core::detection::domain::landmark_detector::{
    DetectError, LandmarkDetector, LandmarkDetectorFactory,
};
use facemesh_core::detection::infrastructure::replay_landmark_detector::{
    Recording, ReplayLandmarkDetector,
};
use facemesh_core::extension::facemesh_extension::Facemesh2Scratch;
use facemesh_core::extension::reporter::reporter_text;
use facemesh_core::feed::domain::setup_notifier::{LogSetupNotifier, SetupNotifier};
use facemesh_core::shared::config::ExtensionConfig;
use facemesh_core::shared::constants::DEFAULT_SOURCE_FPS;
use facemesh_core::video::domain::frame_source::{FrameSource, SourceError};
use facemesh_core::video::infrastructure::blank_frame_source::BlankFrameSource;
use facemesh_core::video::infrastructure::image_frame_source::ImageFrameSource;
use facemesh_core::video::infrastructure::local_video_provider::LocalVideoProvider;

const MODEL_TIMEOUT: Duration = Duration::from_secs(30);
const STAGE_WIDTH: u32 = 480;
const STAGE_HEIGHT: u32 = 360;

/// Replays recorded face-mesh detections through the Facemesh2Scratch blocks.
#[derive(Parser)]
#[command(name = "facemesh2scratch")]
struct Cli {
    /// Recording: JSON array of batches, one per frame.
    recording: PathBuf,

    /// Config file (defaults to the platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Locale for messages: en, ja, ja-Hira.
    #[arg(long)]
    locale: Option<String>,

    /// "set ratio to" value applied before playback.
    #[arg(long)]
    ratio: Option<String>,

    /// "turn video" value: off, on, on-mirrored.
    #[arg(long, default_value = "on-mirrored")]
    video: String,

    /// "Label once every" value in seconds.
    #[arg(long)]
    interval: Option<String>,

    /// Person number to report.
    #[arg(long, default_value = "1")]
    person: String,

    /// Keypoint number to report (1-468).
    #[arg(long, default_value = "1")]
    keypoint: String,

    /// Playback frame rate.
    #[arg(long, default_value_t = DEFAULT_SOURCE_FPS)]
    fps: u32,

    /// Still image to present as the camera instead of blank frames.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Skip the setup acknowledgment prompt.
    #[arg(long, short = 'y')]
    yes: bool,
}

/// Prints the setup warning and waits for Enter.
struct StdinSetupNotifier;

impl SetupNotifier for StdinSetupNotifier {
    fn acknowledge(&self, message: &str) {
        eprint!("{message} [Enter] ");
        let _ = io::stderr().flush();
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
    }
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
    let config = load_config(&cli)?;

    let recording = Arc::new(Recording::load(&cli.recording)?);
    log::info!(
        "Loaded {} frames from {}",
        recording.len(),
        cli.recording.display()
    );

    let provider = Arc::new(build_provider(&cli, recording.len()));
    let factory = replay_factory(recording.clone());
    let notifier: Arc<dyn SetupNotifier> = if cli.yes {
        Arc::new(LogSetupNotifier)
    } else {
        Arc::new(StdinSetupNotifier)
    };

    let extension = Facemesh2Scratch::new(&config, provider, factory, notifier);
    if let Some(ratio) = &cli.ratio {
        extension.set_ratio(ratio);
    }
    if let Some(interval) = &cli.interval {
        extension.set_interval(interval);
    }
    extension.video_toggle(&cli.video);

    if extension.video_state().is_on() {
        if let Some(handle) = extension.last_start() {
            handle.wait_source_ready(MODEL_TIMEOUT)?;
            handle.wait_model_ready(MODEL_TIMEOUT)?;
        }
    }

    play(&extension, &cli, recording.len());
    extension.shutdown();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<ExtensionConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => ExtensionConfig::load(path)?,
        None => match ExtensionConfig::default_path() {
            Ok(path) => ExtensionConfig::load_or_default(&path),
            Err(_) => ExtensionConfig::default(),
        },
    };
    if let Some(locale) = &cli.locale {
        config.locale = locale.clone();
    }
    Ok(config)
}

fn build_provider(cli: &Cli, frames: usize) -> LocalVideoProvider {
    let fps = cli.fps;
    let image = cli.image.clone();
    LocalVideoProvider::new(Box::new(move || -> Result<Box<dyn FrameSource>, SourceError> {
        let source: Box<dyn FrameSource> = match &image {
            Some(path) => Box::new(open_image(path, fps, frames)?),
            None => Box::new(BlankFrameSource::new(
                STAGE_WIDTH,
                STAGE_HEIGHT,
                Some(fps),
                Some(frames),
            )),
        };
        Ok(source)
    }))
}

fn open_image(path: &Path, fps: u32, frames: usize) -> Result<ImageFrameSource, SourceError> {
    log::info!("Using {} as camera", path.display());
    ImageFrameSource::open(path, Some(fps), Some(frames))
}

fn replay_factory(recording: Arc<Recording>) -> Arc<dyn LandmarkDetectorFactory> {
    Arc::new(move || {
        Ok::<_, DetectError>(
            Box::new(ReplayLandmarkDetector::new(recording.clone())) as Box<dyn LandmarkDetector>
        )
    })
}

/// Samples the reporters once per frame period for the length of the
/// recording, then once more after it has ended.
fn play(extension: &Facemesh2Scratch, cli: &Cli, frames: usize) {
    let period = Duration::from_secs_f64(1.0 / cli.fps.max(1) as f64);
    println!("tick\tpeople\tx\ty");
    for tick in 0..=frames {
        thread::sleep(period);
        println!(
            "{tick}\t{}\t{}\t{}",
            extension.get_people_count(),
            reporter_text(extension.get_x(&cli.person, &cli.keypoint)),
            reporter_text(extension.get_y(&cli.person, &cli.keypoint)),
        );
    }
}
