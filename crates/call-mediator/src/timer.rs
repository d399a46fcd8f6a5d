//! A cancellable one-shot timer backed by a `tokio::task`, standing in for
//! the scheduler-job handle the original player state machine held
//! (`sched_->delete_job`). Aborting the task guarantees the fire event is
//! never delivered after cancellation (§5's at-most-once delivery
//! requirement for the play-start watchdog).

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::worker::WorkerEvent;

pub struct Timer {
    handle: JoinHandle<()>,
}

impl Timer {
    /// Spawn a timer that, after `duration`, enqueues `event` back onto the
    /// worker's own channel. Dropping the returned sender half is not
    /// required; `cancel` is the only way this is meant to be torn down.
    pub fn start(duration: Duration, sender: mpsc::Sender<WorkerEvent>, event: WorkerEvent) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            // A closed/full channel here means the worker already shut down
            // or moved on; either way there's nothing left to deliver to.
            let _ = sender.send(event).await;
        });
        Timer { handle }
    }

    /// Cancel the timer. Safe to call even if it already fired.
    pub fn cancel(self) {
        self.handle.abort();
    }
}
