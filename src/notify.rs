//! Desktop notification sink.
//!
//! The session controller only asks for a [`Notice`]; this module turns that
//! into an OS notification. Delivery is fire-and-forget: failures are logged
//! through `tracing` and otherwise ignored. Notifications still in flight are
//! waited for (bounded) before the process exits.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::NotifyError;
use crate::session::Notice;

/// How long exit waits for notifications that are still being shown
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

pub trait Notifier {
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError>;

    /// Wait up to `timeout` for notifications still in flight.
    fn flush(&self, _timeout: Duration) {}
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        (**self).notify(title, message)
    }

    fn flush(&self, timeout: Duration) {
        (**self).flush(timeout)
    }
}

type SendFn = dyn Fn(&str, &str) -> Result<(), NotifyError> + Send + Sync;

/// Shows notifications via the platform notification service.
///
/// Each notification is sent from its own worker thread so a slow
/// notification daemon never stalls the countdown. Workers are tracked and
/// flushed on drop, so the last notification of a session is not cut off by
/// process exit.
pub struct DesktopNotifier {
    send: Arc<SendFn>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self::with_sender(show_desktop)
    }

    /// Use a custom delivery function in place of the OS service
    pub fn with_sender<F>(send: F) -> Self
    where
        F: Fn(&str, &str) -> Result<(), NotifyError> + Send + Sync + 'static,
    {
        Self {
            send: Arc::new(send),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Number of workers that have not finished yet
    pub fn in_flight(&self) -> usize {
        self.pending
            .lock()
            .map(|p| p.iter().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

fn show_desktop(title: &str, message: &str) -> Result<(), NotifyError> {
    notify_rust::Notification::new()
        .summary(title)
        .body(message)
        .appname("pom")
        .show()
        .map(|_| ())
        .map_err(|err| NotifyError::Delivery(err.to_string()))
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        let title = title.to_string();
        let message = message.to_string();
        let send = Arc::clone(&self.send);

        let handle = thread::Builder::new()
            .name("pom-notify".into())
            .spawn(move || {
                if let Err(err) = send(&title, &message) {
                    warn!(%err, "notification was not issued");
                }
            })?;

        if let Ok(mut pending) = self.pending.lock() {
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        }
        Ok(())
    }

    fn flush(&self, timeout: Duration) {
        let handles = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => return,
        };

        let deadline = Instant::now() + timeout;
        while handles.iter().any(|h| !h.is_finished()) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }

        let mut abandoned = 0;
        for handle in handles {
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                abandoned += 1;
            }
        }
        if abandoned > 0 {
            warn!(abandoned, "notifications still pending at exit");
        }
    }
}

impl Drop for DesktopNotifier {
    fn drop(&mut self) {
        self.flush(FLUSH_TIMEOUT);
    }
}

/// Used when notifications are switched off
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        debug!(title, message, "notification suppressed");
        Ok(())
    }
}

/// Collects notifications in memory; optionally fails every call.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Delivery("recording notifier set to fail".into()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((title.to_string(), message.to_string()));
        }
        Ok(())
    }
}

/// Hand a notice to the notifier. Never fails: errors are logged and dropped.
pub fn deliver<N: Notifier + ?Sized>(notifier: &N, notice: Notice) {
    match notifier.notify(notice.title(), notice.message()) {
        Ok(()) => debug!(?notice, "notification dispatched"),
        Err(err) => warn!(%err, ?notice, "notification was not issued"),
    }
}
