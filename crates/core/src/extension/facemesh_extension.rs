use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::detection::domain::face_mesh::DetectionBatch;
use crate::detection::domain::landmark_detector::LandmarkDetectorFactory;
use crate::detection::infrastructure::interval_detector::DetectionInterval;
use crate::feed::detection_feed::{DetectionFeed, FeedOptions, StartHandle};
use crate::feed::domain::setup_notifier::SetupNotifier;
use crate::feed::domain::video_state::VideoState;
use crate::query::arguments::{parse_decimal, parse_ordinal};
use crate::query::face_query::FaceQuery;
use crate::query::view_transform::ViewTransform;
use crate::shared::config::ExtensionConfig;
use crate::shared::messages::Locale;
use crate::tracking::face_store::FaceStore;
use crate::video::domain::video_provider::VideoProvider;

/// The block surface exposed to the host.
///
/// Reporters (`get_x`, `get_y`, `get_people_count`) never fail: anything
/// without data reports `None`. Commands log and ignore arguments they
/// cannot parse.
///
/// Construction enables video and starts detection right away, mirrored
/// according to the host's current flag.
pub struct Facemesh2Scratch {
    provider: Arc<dyn VideoProvider>,
    feed: DetectionFeed,
    query: FaceQuery,
    locale: Locale,
    last_start: Mutex<Option<StartHandle>>,
}

impl Facemesh2Scratch {
    pub fn new(
        config: &ExtensionConfig,
        provider: Arc<dyn VideoProvider>,
        factory: Arc<dyn LandmarkDetectorFactory>,
        notifier: Arc<dyn SetupNotifier>,
    ) -> Self {
        let locale = Locale::from_tag(&config.locale);
        let options = FeedOptions {
            setup_message: locale.please_wait().to_string(),
            interval: DetectionInterval::new(Duration::from_millis(config.detection_interval_ms)),
        };
        let feed = DetectionFeed::new(factory, notifier, options);

        let store = FaceStore::new();
        let writer = store.clone();
        feed.on_detection_batch(Arc::new(move |batch: DetectionBatch| writer.reconcile(batch)));

        let mirrored = provider.mirror();
        let query = FaceQuery::new(
            store,
            ViewTransform {
                scale: config.default_ratio,
                mirrored,
                half_width: config.half_width,
                half_height: config.half_height,
            },
        );

        let extension = Self {
            provider,
            feed,
            query,
            locale,
            last_start: Mutex::new(None),
        };
        extension.start_feed(mirrored);
        extension
    }

    /// "x of person no: [PERSON_NUMBER], keypoint no: [KEYPOINT]"
    pub fn get_x(&self, person_number: &str, keypoint: &str) -> Option<f64> {
        self.query
            .x(parse_ordinal(person_number)?, parse_ordinal(keypoint)?)
    }

    /// "y of person no: [PERSON_NUMBER], keypoint no: [KEYPOINT]"
    pub fn get_y(&self, person_number: &str, keypoint: &str) -> Option<f64> {
        self.query
            .y(parse_ordinal(person_number)?, parse_ordinal(keypoint)?)
    }

    pub fn get_people_count(&self) -> usize {
        self.query.people_count()
    }

    /// "turn video [VIDEO_STATE]": `off`, `on` or `on-mirrored`.
    ///
    /// Turning video on while a session is running only changes mirroring;
    /// otherwise video is enabled and detection set up again.
    pub fn video_toggle(&self, video_state: &str) {
        let state = match video_state.parse::<VideoState>() {
            Ok(state) => state,
            Err(e) => {
                log::warn!("Ignoring video toggle: {e}");
                return;
            }
        };

        if !state.is_on() {
            self.provider.disable_video();
            self.feed.stop();
            return;
        }

        let mirrored = state.is_mirrored();
        if self.feed.is_running() {
            self.feed.set_mirrored(mirrored);
        } else {
            self.start_feed(mirrored);
        }
        self.provider.set_mirror(mirrored);
        self.query.set_mirrored(mirrored);
    }

    /// "set ratio to [RATIO]"
    pub fn set_ratio(&self, ratio: &str) {
        self.query.set_ratio(ratio);
    }

    /// "Label once every [INTERVAL] seconds". Negative, unparseable or
    /// out-of-range intervals are ignored.
    pub fn set_interval(&self, seconds: &str) {
        let interval = parse_decimal(seconds)
            .filter(|s| *s >= 0.0)
            .and_then(|s| Duration::try_from_secs_f64(s).ok());
        match interval {
            Some(interval) => self.feed.set_interval(interval),
            None => log::warn!("Ignoring interval {seconds:?}: not a usable number of seconds"),
        }
    }

    /// Whether detection is setting up or consuming frames.
    pub fn is_running(&self) -> bool {
        self.feed.is_running()
    }

    pub fn video_state(&self) -> VideoState {
        self.feed.state()
    }

    pub fn transform(&self) -> ViewTransform {
        self.query.transform()
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Handle of the most recent feed start, for callers that need to wait
    /// for video or the model to come up.
    pub fn last_start(&self) -> Option<StartHandle> {
        self.last_start
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stops detection and releases the video device.
    pub fn shutdown(&self) {
        self.feed.stop();
        self.provider.disable_video();
    }

    fn start_feed(&self, mirrored: bool) {
        let handle = self.feed.start(self.provider.clone(), mirrored);
        *self
            .last_start
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_mesh::{Keypoint, RawFace};
    use crate::detection::domain::landmark_detector::{DetectError, LandmarkDetector};
    use crate::detection::infrastructure::replay_landmark_detector::Recording;
    use crate::feed::domain::setup_notifier::RecordingSetupNotifier;
    use crate::shared::constants::INTERVAL_CHOICES;
    use crate::shared::frame::Frame;
    use crate::video::domain::frame_source::{FrameSource, SourceError};
    use crate::video::infrastructure::blank_frame_source::BlankFrameSource;
    use crate::video::infrastructure::local_video_provider::LocalVideoProvider;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Instant;

    const WAIT: Duration = Duration::from_secs(5);

    fn face(x: f64, y: f64) -> RawFace {
        vec![Keypoint::new(x, y, 0.0), Keypoint::new(x + 10.0, y + 10.0, 0.0)]
    }

    struct Harness {
        extension: Facemesh2Scratch,
        provider: Arc<LocalVideoProvider>,
        notifier: Arc<RecordingSetupNotifier>,
    }

    /// Replays a recording by frame index, then keeps reporting its last
    /// batch so the camera can run for as long as a test needs.
    struct HoldLastDetector {
        recording: Arc<Recording>,
    }

    impl LandmarkDetector for HoldLastDetector {
        fn predict(&mut self, frame: &Frame) -> Result<DetectionBatch, DetectError> {
            let batches = self.recording.batches();
            let index = frame.index().min(batches.len().saturating_sub(1));
            Ok(batches.get(index).cloned().unwrap_or_default())
        }
    }

    fn hold_last(recording: &Arc<Recording>) -> Box<dyn LandmarkDetector> {
        Box::new(HoldLastDetector {
            recording: recording.clone(),
        })
    }

    fn harness(batches: Vec<DetectionBatch>, config: ExtensionConfig) -> Harness {
        let recording = Arc::new(Recording::new(batches));
        let factory: Arc<dyn LandmarkDetectorFactory> =
            Arc::new(move || Ok::<_, DetectError>(hold_last(&recording)));
        harness_with(factory, config)
    }

    fn harness_with(factory: Arc<dyn LandmarkDetectorFactory>, config: ExtensionConfig) -> Harness {
        let provider = Arc::new(LocalVideoProvider::new(Box::new(|| {
            let source: Box<dyn FrameSource> =
                Box::new(BlankFrameSource::new(2, 2, Some(200), None));
            Ok::<_, SourceError>(source)
        })));
        let notifier = Arc::new(RecordingSetupNotifier::new());
        let extension = Facemesh2Scratch::new(&config, provider.clone(), factory, notifier.clone());
        Harness {
            extension,
            provider,
            notifier,
        }
    }

    fn wait_until(condition: impl Fn() -> bool) {
        let deadline = Instant::now() + WAIT;
        while !condition() {
            assert!(Instant::now() < deadline, "condition not met in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn settle(h: &Harness) {
        let handle = h.extension.last_start().unwrap();
        handle.wait_model_ready(WAIT).unwrap();
    }

    #[test]
    fn test_construction_starts_video_with_warning() {
        let h = harness(vec![vec![face(100.0, 40.0)]], ExtensionConfig::default());

        assert_eq!(h.notifier.messages(), vec![Locale::En.please_wait()]);
        assert_eq!(h.extension.video_state(), VideoState::OnMirrored);
        settle(&h);
        assert_eq!(h.provider.acquisitions(), 1);
    }

    #[test]
    fn test_warning_uses_configured_locale() {
        let config = ExtensionConfig {
            locale: "ja-Hira".to_string(),
            ..ExtensionConfig::default()
        };
        let h = harness(vec![], config);

        assert_eq!(h.extension.locale(), Locale::JaHira);
        assert_eq!(h.notifier.messages(), vec![Locale::JaHira.please_wait()]);
    }

    #[test]
    fn test_two_faces_then_one() {
        let h = harness(
            vec![
                vec![face(100.0, 40.0), face(300.0, 60.0)],
                vec![face(120.0, 50.0)],
            ],
            ExtensionConfig::default(),
        );
        settle(&h);

        wait_until(|| h.extension.get_people_count() == 1);

        assert_eq!(h.extension.get_x("2", "1"), None);
        assert_relative_eq!(h.extension.get_x("1", "1").unwrap(), 240.0 - 120.0 * 0.75);
        assert_relative_eq!(h.extension.get_y("1", "2").unwrap(), 180.0 - 60.0 * 0.75);
    }

    #[test]
    fn test_ratio_and_mirroring() {
        let h = harness(vec![vec![face(100.0, 40.0)]], ExtensionConfig::default());
        settle(&h);
        wait_until(|| h.extension.get_people_count() == 1);

        h.extension.set_ratio("0.5");
        assert_relative_eq!(h.extension.get_x("1", "1").unwrap(), 190.0);
        let y = h.extension.get_y("1", "1").unwrap();

        h.extension.video_toggle("on");
        assert!(!h.provider.mirror());
        assert_relative_eq!(h.extension.get_x("1", "1").unwrap(), -190.0);
        assert_relative_eq!(h.extension.get_y("1", "1").unwrap(), y);

        h.extension.video_toggle("on-mirrored");
        assert!(h.provider.mirror());
        assert_relative_eq!(h.extension.get_x("1", "1").unwrap(), 190.0);
    }

    #[test]
    fn test_toggle_while_on_does_not_restart() {
        let h = harness(vec![vec![face(1.0, 1.0)]], ExtensionConfig::default());
        settle(&h);

        h.extension.video_toggle("on");
        h.extension.video_toggle("on-mirrored");

        assert_eq!(h.notifier.messages().len(), 1);
        assert_eq!(h.extension.video_state(), VideoState::OnMirrored);
    }

    #[test]
    fn test_off_keeps_faces_and_on_resumes() {
        let h = harness(vec![vec![face(100.0, 40.0)]], ExtensionConfig::default());
        settle(&h);
        wait_until(|| h.extension.get_people_count() == 1);

        h.extension.video_toggle("off");

        assert_eq!(h.extension.video_state(), VideoState::Off);
        assert!(!h.provider.is_enabled());
        assert_eq!(h.extension.get_people_count(), 1);

        h.extension.video_toggle("on");

        assert_eq!(h.extension.get_people_count(), 1);
        assert_eq!(h.extension.video_state(), VideoState::On);
        assert_eq!(h.notifier.messages().len(), 2);
        settle(&h);
        assert_eq!(h.provider.acquisitions(), 2);
    }

    #[test]
    fn test_unknown_toggle_is_ignored() {
        let h = harness(vec![], ExtensionConfig::default());

        h.extension.video_toggle("sideways");

        assert_eq!(h.extension.video_state(), VideoState::OnMirrored);
    }

    #[test]
    fn test_no_data_before_any_detection() {
        let h = harness(vec![], ExtensionConfig::default());

        assert_eq!(h.extension.get_people_count(), 0);
        assert_eq!(h.extension.get_x("1", "1"), None);
        assert_eq!(h.extension.get_y("1", "1"), None);
    }

    #[test]
    fn test_unparseable_arguments_are_no_data() {
        let h = harness(vec![vec![face(100.0, 40.0)]], ExtensionConfig::default());
        settle(&h);
        wait_until(|| h.extension.get_people_count() == 1);

        assert_eq!(h.extension.get_x("first", "1"), None);
        assert_eq!(h.extension.get_y("1", ""), None);
        assert!(h.extension.get_x(" 1", "1.0").is_some());
    }

    #[test]
    fn test_bad_ratio_keeps_previous_scale() {
        let h = harness(vec![], ExtensionConfig::default());

        h.extension.set_ratio("2.0");
        h.extension.set_ratio("big");

        assert_relative_eq!(h.extension.transform().scale, 2.0);
    }

    #[test]
    fn test_config_controls_transform() {
        let config = ExtensionConfig {
            half_width: 320.0,
            half_height: 240.0,
            default_ratio: 1.0,
            ..ExtensionConfig::default()
        };
        let h = harness(vec![vec![face(20.0, 40.0)]], config);
        settle(&h);
        wait_until(|| h.extension.get_people_count() == 1);

        assert_relative_eq!(h.extension.get_x("1", "1").unwrap(), 300.0);
        assert_relative_eq!(h.extension.get_y("1", "1").unwrap(), 200.0);
    }

    #[test]
    fn test_set_interval_validation() {
        let h = harness(vec![], ExtensionConfig::default());

        h.extension.set_interval("0.5");
        assert_eq!(h.extension.feed.interval(), Duration::from_millis(500));

        h.extension.set_interval("-1");
        h.extension.set_interval("soon");
        h.extension.set_interval("1e300");
        h.extension.set_interval("inf");
        assert_eq!(h.extension.feed.interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_every_interval_menu_value_applies() {
        let h = harness(vec![], ExtensionConfig::default());
        for seconds in INTERVAL_CHOICES {
            h.extension.set_interval(seconds);
            let expected = Duration::from_secs_f64(seconds.parse().unwrap());
            assert_eq!(h.extension.feed.interval(), expected);
        }
    }

    #[test]
    fn test_on_restarts_after_failed_setup() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let recording = Arc::new(Recording::new(vec![vec![face(100.0, 40.0)]]));
        let factory: Arc<dyn LandmarkDetectorFactory> = Arc::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err::<Box<dyn LandmarkDetector>, DetectError>("model missing".into());
            }
            Ok(hold_last(&recording))
        });
        let h = harness_with(factory, ExtensionConfig::default());
        let first = h.extension.last_start().unwrap();
        assert!(first.wait_model_ready(WAIT).is_err());
        wait_until(|| !h.extension.is_running());

        h.extension.video_toggle("on");

        settle(&h);
        wait_until(|| h.extension.get_people_count() == 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(h.notifier.messages().len(), 2);
        assert_eq!(h.extension.video_state(), VideoState::On);
    }

    #[test]
    fn test_shutdown_releases_video() {
        let h = harness(vec![vec![face(1.0, 1.0)]], ExtensionConfig::default());
        settle(&h);

        h.extension.shutdown();

        assert_eq!(h.extension.video_state(), VideoState::Off);
        assert!(!h.provider.is_enabled());
    }
}
