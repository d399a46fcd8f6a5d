//! The mediator's worker: a single `tokio::task` serializing every request,
//! backend event, DTMF tone and timer fire through one bounded queue (§4.1,
//! §5). This is the async-actor collapse of the original's dedicated OS
//! thread draining a blocking `WorkerT` queue — ordering and
//! at-most-one-event-processed-at-a-time still hold, just via a single task
//! instead of a single thread.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::{CallbackEvent, DtmfTone, Request};
use crate::backend::{BackendEvent, BackendHandle};
use crate::call::session::CallSession;
use crate::call::sm::{self as call_sm, CallEffect};
use crate::config::MediatorConfig;
use crate::timer::Timer;

/// Everything that can land in the worker's queue.
#[derive(Debug)]
pub enum WorkerEvent {
    Request(Request),
    Backend(BackendEvent),
    Dtmf(DtmfTone),
    /// The play-start watchdog fired for this `req_id`.
    PlayTimeout { req_id: u32 },
    /// Sent by [`crate::Mediator::shutdown`] as the last message on the
    /// queue; everything submitted before it is still drained and processed
    /// first (FIFO), matching §4.1's "drains the queue" shutdown contract.
    Shutdown,
}

/// Where the worker delivers [`CallbackEvent`]s. Implemented by the facade;
/// mocked directly in tests that want to inspect delivery without going
/// through a full [`crate::Mediator`].
pub trait CallbackSink: Send + Sync {
    fn notify(&self, event: CallbackEvent);
}

pub struct Worker {
    session: CallSession,
    backend: Arc<dyn BackendHandle>,
    callback: Arc<dyn CallbackSink>,
    config: MediatorConfig,
    sender: mpsc::Sender<WorkerEvent>,
    player_timer: Option<Timer>,
}

impl Worker {
    /// Spawn the worker task and return the sender half of its queue plus
    /// the task's `JoinHandle`, so a caller can later await a clean
    /// shutdown. The queue's bound is `config.queue_capacity`; callers use
    /// [`mpsc::Sender::try_send`] so a saturated queue surfaces as a
    /// synchronous rejection rather than a blocked caller.
    pub fn spawn(
        config: MediatorConfig,
        backend: Arc<dyn BackendHandle>,
        callback: Arc<dyn CallbackSink>,
    ) -> (mpsc::Sender<WorkerEvent>, tokio::task::JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let worker = Worker {
            session: CallSession::default(),
            backend,
            callback,
            config,
            sender: sender.clone(),
            player_timer: None,
        };
        let handle = tokio::spawn(worker.run(receiver));
        (sender, handle)
    }

    async fn run(mut self, mut receiver: mpsc::Receiver<WorkerEvent>) {
        tracing::debug!("worker started");

        while let Some(event) = receiver.recv().await {
            if matches!(event, WorkerEvent::Shutdown) {
                break;
            }
            let effects = self.step(event);
            self.apply(effects);
        }

        if let Some(timer) = self.player_timer.take() {
            timer.cancel();
        }
        tracing::debug!("worker shutting down");
    }

    fn step(&mut self, event: WorkerEvent) -> Vec<CallEffect> {
        match event {
            WorkerEvent::Request(req) => {
                tracing::debug!(req_id = req.req_id(), "handling client request");
                call_sm::handle_request(&mut self.session, self.backend.as_ref(), req)
            }
            WorkerEvent::Backend(ev) => {
                tracing::debug!(?ev, "handling backend event");
                call_sm::handle_backend_event(&mut self.session, self.backend.as_ref(), self.config.data_port, ev)
            }
            WorkerEvent::Dtmf(tone) => {
                tracing::debug!(?tone, "handling dtmf tone");
                call_sm::handle_dtmf(&self.session, tone)
            }
            WorkerEvent::PlayTimeout { req_id } => {
                tracing::debug!(req_id, "play-start watchdog fired");
                call_sm::handle_play_timeout(&mut self.session, req_id)
            }
            WorkerEvent::Shutdown => unreachable!("Shutdown is intercepted by run() before step() is called"),
        }
    }

    fn apply(&mut self, effects: Vec<CallEffect>) {
        for effect in effects {
            match effect {
                CallEffect::Emit(event) => self.callback.notify(event),
                CallEffect::StartPlayerTimer { req_id } => {
                    if let Some(old) = self.player_timer.take() {
                        old.cancel();
                    }
                    self.player_timer = Some(Timer::start(
                        self.config.play_timeout,
                        self.sender.clone(),
                        WorkerEvent::PlayTimeout { req_id },
                    ));
                }
                CallEffect::CancelPlayerTimer => {
                    if let Some(timer) = self.player_timer.take() {
                        timer.cancel();
                    }
                }
            }
        }
    }
}
