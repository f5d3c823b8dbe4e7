//! Background reclamation scaffolding shared by the window strategies.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::trace;

/// A periodic background task with a graceful stop.
///
/// Runs `sweep` every `interval` until stopped. [`Sweeper::stop`] signals the
/// task and waits for it to exit, so no sweep runs after `stop` returns. If
/// the owning strategy is dropped without stopping, the signal channel closes
/// and the task exits on its own.
pub(crate) struct Sweeper {
    shutdown: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Sweeper {
    /// Spawn the sweep loop on the current Tokio runtime.
    ///
    /// The first sweep fires one full `interval` after spawning, never
    /// immediately.
    pub(crate) fn spawn<F>(interval: Duration, sweep: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let (shutdown, mut signal) = watch::channel(false);
        let start = tokio::time::Instant::now() + interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => sweep(),
                    changed = signal.changed() => {
                        if changed.is_err() || *signal.borrow() {
                            trace!("sweeper exiting");
                            break;
                        }
                    }
                }
            }
        });

        Self {
            shutdown,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Signal the sweep loop, then wait for it to acknowledge by exiting.
    pub(crate) async fn stop(&self) {
        let _ = self.shutdown.send(true);
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}
