use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use thiserror::Error;

use crate::detection::domain::face_mesh::DetectionBatch;
use crate::detection::domain::landmark_detector::{
    DetectError, LandmarkDetector, LandmarkDetectorFactory,
};
use crate::detection::infrastructure::interval_detector::{DetectionInterval, IntervalDetector};
use crate::feed::domain::setup_notifier::SetupNotifier;
use crate::feed::domain::video_state::VideoState;
use crate::shared::messages::Locale;
use crate::video::domain::frame_source::{pull, SharedFrameSource, SourceError, SourceSlot};
use crate::video::domain::video_provider::VideoProvider;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("video unavailable: {0}")]
    VideoUnavailable(#[source] SourceError),
    #[error("landmark detector unavailable: {0}")]
    DetectorUnavailable(#[source] DetectError),
    #[error("session was superseded by a newer start or stop")]
    Superseded,
    #[error("feed setup ended before completing")]
    SetupFailed,
    #[error("timed out waiting for feed setup")]
    Timeout,
}

/// Receives every detection batch of the current session, in order.
///
/// Runs on the feed's dispatcher thread while the session is pinned, so it
/// must not call back into the feed.
pub type BatchHandler = Arc<dyn Fn(DetectionBatch) + Send + Sync>;

#[derive(Clone)]
pub struct FeedOptions {
    /// Text passed to the [`SetupNotifier`] before each setup.
    pub setup_message: String,
    pub interval: DetectionInterval,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            setup_message: Locale::default().please_wait().to_string(),
            interval: DetectionInterval::default(),
        }
    }
}

/// Resolves as a started session progresses.
///
/// Clones share the readiness signals; each signal is delivered to one waiter.
#[derive(Clone)]
pub struct StartHandle {
    session: u64,
    source_ready: Receiver<Result<(), FeedError>>,
    model_ready: Receiver<Result<(), FeedError>>,
}

impl StartHandle {
    pub fn session(&self) -> u64 {
        self.session
    }

    /// Waits until the frame source is attached. The model may still be
    /// loading at this point.
    pub fn wait_source_ready(&self, timeout: Duration) -> Result<(), FeedError> {
        wait_for(&self.source_ready, timeout)
    }

    /// Waits until the detector is built and frames are being consumed.
    pub fn wait_model_ready(&self, timeout: Duration) -> Result<(), FeedError> {
        wait_for(&self.model_ready, timeout)
    }
}

fn wait_for(rx: &Receiver<Result<(), FeedError>>, timeout: Duration) -> Result<(), FeedError> {
    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(FeedError::Timeout),
        Err(RecvTimeoutError::Disconnected) => Err(FeedError::SetupFailed),
    }
}

struct PostedBatch {
    session: u64,
    batch: DetectionBatch,
}

#[derive(Clone)]
struct ActiveSession {
    slot: SourceSlot,
    cancelled: Arc<AtomicBool>,
}

impl ActiveSession {
    fn invalidate(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.slot.detach();
    }
}

#[derive(Default)]
struct Current {
    generation: u64,
    session: Option<ActiveSession>,
    state: VideoState,
}

#[derive(Default)]
struct FeedShared {
    current: Mutex<Current>,
    handler: Mutex<Option<BatchHandler>>,
}

impl FeedShared {
    fn lock(&self) -> MutexGuard<'_, Current> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, session: u64) -> bool {
        self.lock().generation == session
    }

    /// Attaches `source` only if no start/stop has happened since `session`
    /// began; checked and applied under the same lock as `stop`.
    fn attach_if_current(&self, session: u64, slot: &SourceSlot, source: SharedFrameSource) -> bool {
        let current = self.lock();
        if current.generation != session {
            return false;
        }
        slot.attach(source);
        true
    }

    /// Clears `session` once its thread has exited, so a later start is not
    /// mistaken for a mirroring change. No-op if it was already superseded.
    fn finish(&self, session: u64) {
        let mut current = self.lock();
        if current.generation != session {
            return;
        }
        if let Some(active) = current.session.take() {
            active.invalidate();
            log::info!("Detection session {session} ended");
        }
    }

    fn handler(&self) -> Option<BatchHandler> {
        self.handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Bridges a host video source and a landmark detector, republishing each
/// prediction to the registered [`BatchHandler`].
///
/// Layout: `setup thread → producer loop → channel → dispatcher → handler`
///
/// Each `start` creates a fresh session and invalidates the previous one.
/// Batches carry their session number; the single dispatcher thread only
/// delivers batches from the current session, so a superseded producer can
/// never write after a newer start or a stop (last start wins).
pub struct DetectionFeed {
    factory: Arc<dyn LandmarkDetectorFactory>,
    notifier: Arc<dyn SetupNotifier>,
    options: FeedOptions,
    shared: Arc<FeedShared>,
    batch_tx: Sender<PostedBatch>,
}

impl DetectionFeed {
    pub fn new(
        factory: Arc<dyn LandmarkDetectorFactory>,
        notifier: Arc<dyn SetupNotifier>,
        options: FeedOptions,
    ) -> Self {
        let shared = Arc::new(FeedShared::default());
        let (batch_tx, batch_rx) = crossbeam_channel::unbounded::<PostedBatch>();
        spawn_dispatcher(shared.clone(), batch_rx);
        Self {
            factory,
            notifier,
            options,
            shared,
            batch_tx,
        }
    }

    /// Registers the downstream callback, replacing any previous one.
    pub fn on_detection_batch(&self, handler: BatchHandler) {
        *self
            .shared
            .handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    /// Starts a new session against `provider`.
    ///
    /// Blocks on the setup acknowledgment, then returns immediately; the
    /// source acquisition and model load continue on a background thread.
    pub fn start(&self, provider: Arc<dyn VideoProvider>, mirrored: bool) -> StartHandle {
        self.notifier.acknowledge(&self.options.setup_message);

        let session = ActiveSession {
            slot: SourceSlot::default(),
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        let id = {
            let mut current = self.shared.lock();
            if let Some(previous) = current.session.take() {
                previous.invalidate();
            }
            current.generation += 1;
            current.session = Some(session.clone());
            current.state = VideoState::from_mirror(mirrored);
            current.generation
        };
        log::info!("Starting detection session {id}");

        let (source_tx, source_ready) = crossbeam_channel::bounded(1);
        let (model_tx, model_ready) = crossbeam_channel::bounded(1);
        let context = SessionContext {
            id,
            shared: self.shared.clone(),
            session,
            provider,
            factory: self.factory.clone(),
            interval: self.options.interval.clone(),
            batch_tx: self.batch_tx.clone(),
            source_tx,
            model_tx,
        };
        thread::spawn(move || context.run());

        StartHandle {
            session: id,
            source_ready,
            model_ready,
        }
    }

    /// Detaches the producer from its source. Safe at any time, including
    /// while a start is still setting up. The face list is left as is.
    pub fn stop(&self) {
        let mut current = self.shared.lock();
        if let Some(session) = current.session.take() {
            session.invalidate();
            log::info!("Stopped detection session {}", current.generation);
        }
        current.generation += 1;
        current.state = VideoState::Off;
    }

    pub fn state(&self) -> VideoState {
        self.shared.lock().state
    }

    /// Records the host's mirroring without touching the session.
    pub fn set_mirrored(&self, mirrored: bool) {
        let mut current = self.shared.lock();
        if current.state.is_on() {
            current.state = VideoState::from_mirror(mirrored);
        }
    }

    /// Whether a session is setting up or consuming frames. Turns false
    /// once setup fails or the source ends, even though the state stays on.
    pub fn is_running(&self) -> bool {
        self.shared.lock().session.is_some()
    }

    pub fn set_interval(&self, interval: Duration) {
        self.options.interval.set(interval);
    }

    pub fn interval(&self) -> Duration {
        self.options.interval.get()
    }
}

impl Drop for DetectionFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_dispatcher(shared: Arc<FeedShared>, batch_rx: Receiver<PostedBatch>) {
    thread::spawn(move || {
        for posted in batch_rx {
            let current = shared.lock();
            if current.generation != posted.session {
                log::debug!("Dropping stale batch from session {}", posted.session);
                continue;
            }
            if let Some(handler) = shared.handler() {
                handler(posted.batch);
            }
            drop(current);
        }
    });
}

/// Everything a session's background thread needs.
struct SessionContext {
    id: u64,
    shared: Arc<FeedShared>,
    session: ActiveSession,
    provider: Arc<dyn VideoProvider>,
    factory: Arc<dyn LandmarkDetectorFactory>,
    interval: DetectionInterval,
    batch_tx: Sender<PostedBatch>,
    source_tx: Sender<Result<(), FeedError>>,
    model_tx: Sender<Result<(), FeedError>>,
}

impl SessionContext {
    fn run(self) {
        if let Some(detector) = self.set_up() {
            self.produce(detector);
        }
        self.shared.finish(self.id);
    }

    /// Acquires the source and builds the detector, reporting each step on
    /// the readiness channels. `None` when the session cannot go on.
    fn set_up(&self) -> Option<Box<dyn LandmarkDetector>> {
        let source = match self.provider.enable_video() {
            Ok(source) => source,
            Err(e) => {
                log::warn!("Session {}: video unavailable: {e}", self.id);
                let _ = self.source_tx.send(Err(FeedError::VideoUnavailable(e)));
                return None;
            }
        };
        if !self
            .shared
            .attach_if_current(self.id, &self.session.slot, source)
        {
            log::debug!("Session {} superseded before attaching", self.id);
            let _ = self.source_tx.send(Err(FeedError::Superseded));
            return None;
        }
        let _ = self.source_tx.send(Ok(()));

        let detector = match self.factory.create() {
            Ok(detector) => detector,
            Err(e) => {
                log::warn!("Session {}: landmark detector unavailable: {e}", self.id);
                let _ = self.model_tx.send(Err(FeedError::DetectorUnavailable(e)));
                return None;
            }
        };
        if !self.shared.is_current(self.id) {
            log::debug!("Session {} superseded while loading model", self.id);
            let _ = self.model_tx.send(Err(FeedError::Superseded));
            return None;
        }
        log::info!("Model loaded!");
        let _ = self.model_tx.send(Ok(()));

        Some(Box::new(IntervalDetector::new(
            detector,
            self.interval.clone(),
        )))
    }

    /// Pulls frames until the slot is detached, the session is cancelled,
    /// the source ends or the dispatcher is gone.
    fn produce(&self, mut detector: Box<dyn LandmarkDetector>) {
        while !self.session.cancelled.load(Ordering::SeqCst) {
            let Some(source) = self.session.slot.get() else {
                break;
            };
            let frame = match pull(&source) {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => {
                    log::warn!("Session {}: frame source failed: {e}", self.id);
                    break;
                }
                None => {
                    log::debug!("Session {}: frame source ended", self.id);
                    break;
                }
            };
            match detector.predict(&frame) {
                Ok(batch) => {
                    let posted = PostedBatch {
                        session: self.id,
                        batch,
                    };
                    if self.batch_tx.send(posted).is_err() {
                        break;
                    }
                }
                Err(e) => log::debug!("Session {}: prediction failed: {e}", self.id),
            }
        }
    }
}
