//! Synthetic progress for image generation.
//!
//! Image generation is a single request/response call with no incremental
//! output, so the UI shows a simulated progress value: it climbs on a fixed
//! timer, capped at [`PROGRESS_CAP`] until the response actually arrives,
//! then jumps to 100. The timer task is owned by the simulator and aborted
//! on drop, so every exit path of the operation that created it tears the
//! timer down.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Ceiling for simulated progress while the request is in flight.
pub const PROGRESS_CAP: u8 = 90;

/// Increment applied on each tick.
const PROGRESS_STEP: u8 = 7;

/// Drives a watch channel with simulated progress on a fixed timer.
///
/// Dropping the simulator aborts the timer task. Call [`complete`] on the
/// success path to jump the value to 100 before dropping.
///
/// [`complete`]: ProgressSimulator::complete
#[derive(Debug)]
pub struct ProgressSimulator {
    tx: watch::Sender<u8>,
    task: JoinHandle<()>,
}

impl ProgressSimulator {
    /// Starts the timer, resetting the channel to 0.
    pub fn start(tx: watch::Sender<u8>, tick: Duration) -> Self {
        let _ = tx.send(0);
        let timer_tx = tx.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.tick().await; // first tick fires immediately
            loop {
                interval.tick().await;
                timer_tx.send_modify(|v| *v = v.saturating_add(PROGRESS_STEP).min(PROGRESS_CAP));
            }
        });
        Self { tx, task }
    }

    /// Stops the timer and jumps the value to 100.
    pub fn complete(self) {
        self.task.abort();
        let _ = self.tx.send(100);
    }
}

impl Drop for ProgressSimulator {
    fn drop(&mut self) {
        self.task.abort();
    }
}
