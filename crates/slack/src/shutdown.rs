use std::{sync::Arc, time::Duration};

use tokio::{sync::watch, task::JoinHandle};
use tracing::info;

/// Process-wide stop request, observed by the server's main loop.
#[derive(Clone, Debug)]
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(false);
        Self { sender: Arc::new(sender) }
    }

    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// Triggers after `delay`, leaving time for the farewell to go out.
    pub fn schedule(&self, delay: Duration) -> JoinHandle<()> {
        let signal = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            info!(
                event_name = "bot.shutdown.triggered",
                delay_ms = delay.as_millis() as u64,
                "shutdown delay elapsed"
            );
            signal.trigger();
        })
    }

    /// Resolves once the signal has been triggered.
    pub async fn triggered(&self) {
        if self.is_triggered() {
            return;
        }
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = receiver.wait_for(|stopped| *stopped).await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::ShutdownSignal;

    #[tokio::test(start_paused = true)]
    async fn scheduled_shutdown_fires_after_delay() {
        let signal = ShutdownSignal::new();
        let started = tokio::time::Instant::now();

        let _timer = signal.schedule(Duration::from_secs(3));
        assert!(!signal.is_triggered());

        signal.triggered().await;

        assert!(signal.is_triggered());
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn clones_share_the_same_signal() {
        let signal = ShutdownSignal::new();
        let observer = signal.clone();

        signal.trigger();

        observer.triggered().await;
        assert!(observer.is_triggered());
    }
}
