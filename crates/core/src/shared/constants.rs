/// Half of the host stage width. Model-space x is mapped around this.
pub const DEFAULT_HALF_WIDTH: f64 = 240.0;
/// Half of the host stage height.
pub const DEFAULT_HALF_HEIGHT: f64 = 180.0;

pub const DEFAULT_RATIO: f64 = 0.75;

/// Landmarks per face in the full face-mesh topology.
pub const KEYPOINT_COUNT: usize = 468;

/// Values offered by the "Label once every" menu, in seconds.
pub const INTERVAL_CHOICES: &[&str] = &["0.1", "0.2", "0.5", "1.0"];
/// Values offered by the "set ratio to" menu.
pub const RATIO_CHOICES: &[&str] = &["0.5", "0.75", "1", "1.5", "2.0"];

pub const CONFIG_DIR_NAME: &str = "Facemesh2Scratch";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Frame pacing for synthetic sources (~30 fps).
pub const DEFAULT_SOURCE_FPS: u32 = 30;
