//! The public facade: accepts client requests and backend callbacks from any
//! thread, hands them to the worker, and owns the one-shot callback
//! registration (§5: "the facade holds a lock only to guard `is_inited`
//! reads and ensure `register_callback` is one-shot").

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::{CallbackEvent, DtmfTone, Request, Response};
use crate::backend::{BackendEvent, BackendHandle};
use crate::config::MediatorConfig;
use crate::error::{MediatorError, MediatorResult};
use crate::worker::{CallbackSink, Worker, WorkerEvent};

/// Bridges a client-supplied callback into [`CallbackSink`], the shape the
/// worker expects.
struct ClientCallback<F>(F);

impl<F> CallbackSink for ClientCallback<F>
where
    F: Fn(CallbackEvent) + Send + Sync,
{
    fn notify(&self, event: CallbackEvent) {
        (self.0)(event)
    }
}

/// The call-control mediator. Construct with [`crate::MediatorBuilder`],
/// register exactly one callback, then `start()` before submitting any
/// request.
pub struct Mediator {
    config: MediatorConfig,
    backend: Arc<dyn BackendHandle>,
    callback: Mutex<Option<Arc<dyn CallbackSink>>>,
    sender: Mutex<Option<mpsc::Sender<WorkerEvent>>>,
    worker_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Mediator {
    pub fn new(config: MediatorConfig, backend: Arc<dyn BackendHandle>) -> Self {
        Self {
            config,
            backend,
            callback: Mutex::new(None),
            sender: Mutex::new(None),
            worker_handle: Mutex::new(None),
        }
    }

    /// Register the sink that receives every [`CallbackEvent`]. May be
    /// called exactly once.
    pub fn register_callback(&self, callback: Arc<dyn CallbackSink>) -> MediatorResult<()> {
        let mut guard = self.callback.lock().unwrap();
        if guard.is_some() {
            return Err(MediatorError::CallbackAlreadyRegistered);
        }
        *guard = Some(callback);
        Ok(())
    }

    /// Convenience over [`Mediator::register_callback`] for a plain closure.
    pub fn register_callback_fn<F>(&self, callback: F) -> MediatorResult<()>
    where
        F: Fn(CallbackEvent) + Send + Sync + 'static,
    {
        self.register_callback(Arc::new(ClientCallback(callback)))
    }

    /// Spawn the worker task. Idempotent: a second call is a no-op.
    pub fn start(&self) -> MediatorResult<()> {
        let mut sender_guard = self.sender.lock().unwrap();
        if sender_guard.is_some() {
            return Ok(());
        }

        let callback = self
            .callback
            .lock()
            .unwrap()
            .clone()
            .ok_or(MediatorError::CallbackNotRegistered)?;

        let (sender, handle) = Worker::spawn(self.config.clone(), self.backend.clone(), callback);
        *sender_guard = Some(sender);
        *self.worker_handle.lock().unwrap() = Some(handle);
        tracing::info!("mediator started");
        Ok(())
    }

    /// Gracefully stop the worker: close off new submissions, let it drain
    /// whatever is already queued, then await its task (§4.1: "on shutdown
    /// it drains the queue, signals the thread, joins"). A no-op if the
    /// mediator was never started or has already been shut down.
    pub async fn shutdown(&self) {
        let sender = self.sender.lock().unwrap().take();
        let Some(sender) = sender else { return };

        // `send` (not `try_send`) waits for room so `Shutdown` lands behind
        // everything already queued, preserving FIFO drain order.
        let _ = sender.send(WorkerEvent::Shutdown).await;
        drop(sender);

        if let Some(handle) = self.worker_handle.lock().unwrap().take() {
            let _ = handle.await;
        }
        tracing::info!("mediator shut down");
    }

    /// Submit a client request. Never blocks: a saturated worker queue is
    /// answered with a synchronous [`Response::Reject`] through the
    /// registered callback rather than backpressuring the caller (§4.1).
    pub fn submit(&self, request: Request) -> MediatorResult<()> {
        let req_id = request.req_id();
        let sender = self.sender_or_err()?;

        if let Err(err) = sender.try_send(WorkerEvent::Request(request)) {
            self.reject_overloaded(req_id);
            tracing::warn!(req_id, ?err, "worker queue saturated, request rejected");
        }
        Ok(())
    }

    /// Feed a backend event into the worker. Dropped (and logged) if the
    /// queue is saturated; there is no client request to answer for a
    /// backend-originated event, so there is nothing to reject.
    pub fn on_backend_event(&self, event: BackendEvent) -> MediatorResult<()> {
        let sender = self.sender_or_err()?;
        if sender.try_send(WorkerEvent::Backend(event)).is_err() {
            tracing::error!("worker queue saturated, dropping backend event");
        }
        Ok(())
    }

    /// Feed a detected DTMF tone into the worker.
    pub fn on_dtmf_tone(&self, tone: DtmfTone) -> MediatorResult<()> {
        let sender = self.sender_or_err()?;
        if sender.try_send(WorkerEvent::Dtmf(tone)).is_err() {
            tracing::error!("worker queue saturated, dropping dtmf tone");
        }
        Ok(())
    }

    /// Whether `start()` has spawned the worker yet. Guarded by the same
    /// lock that serializes `start()` itself (§5: "the facade holds a lock
    /// only to guard `is_inited` reads against init").
    pub fn is_inited(&self) -> bool {
        self.sender.lock().unwrap().is_some()
    }

    fn sender_or_err(&self) -> MediatorResult<mpsc::Sender<WorkerEvent>> {
        self.sender
            .lock()
            .unwrap()
            .clone()
            .ok_or(MediatorError::WorkerShutDown)
    }

    fn reject_overloaded(&self, req_id: u32) {
        if let Some(callback) = self.callback.lock().unwrap().as_ref() {
            callback.notify(CallbackEvent::Response(Response::Reject {
                req_id,
                code: 0,
                descr: "mediator is overloaded".to_string(),
            }));
        }
    }
}
