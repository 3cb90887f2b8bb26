use core::{
    future::Future,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};
use tokio::{
    sync::Mutex,
    time::{self, Instant},
};

/// Default quiescence window between vote counter edits.
pub const QUIESCENCE: Duration = Duration::from_secs(2);

/// Coalesces bursts of display refreshes into at most one edit per window.
pub struct Throttle {
    window: Duration,
    /// Set while a refresh is scheduled but has not yet snapshotted the state.
    pending: AtomicBool,
    /// Time of the last successful edit. Held for the whole refresh so that two
    /// refreshes never edit concurrently.
    last_edit: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self { window, pending: AtomicBool::new(false), last_edit: Mutex::new(None) }
    }

    /// Claims the pending slot. Returns `false` if a refresh is already scheduled,
    /// in which case that refresh will pick up the latest state.
    pub fn request(&self) -> bool {
        self.pending.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_ok()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Waits out the quiescence window and the spacing from the previous edit, then
    /// runs `edit`. The closure reports whether the edit reached the platform.
    pub async fn settle<F, Fut>(&self, edit: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool>,
    {
        time::sleep(self.window).await;

        let mut last_edit = self.last_edit.lock().await;
        if let Some(previous) = *last_edit {
            let elapsed = previous.elapsed();
            if elapsed < self.window {
                time::sleep(self.window - elapsed).await;
            }
        }

        // Votes landing after this point schedule a fresh refresh.
        self.pending.store(false, Ordering::Release);
        if edit().await {
            *last_edit = Some(Instant::now());
        }
    }
}
