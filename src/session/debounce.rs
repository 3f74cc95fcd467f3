use std::{sync::Mutex, time::Duration};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_SAVE_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Runs a job once `delay` has passed with no newer `schedule` call.
/// At most one job is pending; scheduling again cancels the previous one.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<CancellationToken>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn schedule<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let token = CancellationToken::new();
        {
            let mut guard = self.pending.lock().unwrap_or_else(|p| p.into_inner());
            if let Some(previous) = guard.replace(token.clone()) {
                previous.cancel();
            }
        }

        let delay = self.delay;
        tauri::async_runtime::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = tauri::async_runtime::spawn_blocking(job).await;
                }
            }
        });
    }

    /// Drops the pending job, if any, without running it.
    pub fn cancel(&self) {
        let mut guard = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(token) = guard.take() {
            token.cancel();
        }
    }
}
