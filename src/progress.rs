use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

pub const PROGRESS_MESSAGES: [&str; 5] = [
    "Defining contours...",
    "Sampling textures...",
    "Distilling aesthetic...",
    "Synthesizing light...",
    "Finalizing render...",
];

pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

/// Message for a rotation index; wraps around.
pub fn progress_message(index: usize) -> &'static str {
    PROGRESS_MESSAGES[index % PROGRESS_MESSAGES.len()]
}

/// Periodic tick source for rotating progress text.
///
/// The first tick arrives one period after `start`. Cancelling or dropping
/// the ticker stops the background task.
pub struct ProgressTicker {
    handle: JoinHandle<()>,
    ticks: mpsc::Receiver<()>,
}

impl ProgressTicker {
    pub fn start(period: Duration) -> Self {
        let (tx, ticks) = mpsc::channel(1);
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });
        log::trace!("Progress ticker started ({:?})", period);
        Self { handle, ticks }
    }

    /// Waits for the next tick. `None` once the ticker is cancelled.
    pub async fn tick(&mut self) -> Option<()> {
        self.ticks.recv().await
    }

    pub fn cancel(&mut self) {
        if !self.handle.is_finished() {
            self.handle.abort();
            log::trace!("Progress ticker cancelled");
        }
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_wrap() {
        assert_eq!(progress_message(0), "Defining contours...");
        assert_eq!(progress_message(4), "Finalizing render...");
        assert_eq!(progress_message(5), "Defining contours...");
        assert_eq!(progress_message(7), "Distilling aesthetic...");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_every_period() {
        let started = Instant::now();
        let mut ticker = ProgressTicker::start(PROGRESS_INTERVAL);
        ticker.tick().await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(2));
        ticker.tick().await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks() {
        let mut ticker = ProgressTicker::start(PROGRESS_INTERVAL);
        ticker.tick().await.unwrap();
        ticker.cancel();
        assert_eq!(ticker.tick().await, None);
    }
}
