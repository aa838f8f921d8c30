use std::sync::Mutex;

/// Tells the user that model setup is about to make the environment
/// unresponsive.
///
/// `acknowledge` is called synchronously from `DetectionFeed::start` and
/// may block until the user confirms. Setup proceeds once it returns.
pub trait SetupNotifier: Send + Sync {
    fn acknowledge(&self, message: &str);
}

/// Non-blocking notifier for hosts without modal dialogs: logs and returns.
pub struct LogSetupNotifier;

impl SetupNotifier for LogSetupNotifier {
    fn acknowledge(&self, message: &str) {
        log::warn!("{message}");
    }
}

/// Keeps every message it was shown. Used by tests and headless runs.
#[derive(Default)]
pub struct RecordingSetupNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingSetupNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl SetupNotifier for RecordingSetupNotifier {
    fn acknowledge(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}
