//! A call-control mediator sitting between an application and a Skype-style
//! voice backend: it turns the backend's asynchronous, job-id-correlated
//! event stream into a small request/response/notification protocol an
//! application can drive without tracking backend wire details itself.
//!
//! The mediator core is two cooperating, pure state machines ([`call`] and
//! [`player`]) driven by a single-task [`worker`] so every transition is
//! exhaustively unit-testable without touching an async runtime or a real
//! backend. [`Mediator`] (in [`facade`]) is the thread-safe entry point
//! applications actually construct.

pub mod api;
pub mod backend;
pub mod call;
pub mod config;
pub mod dtmf;
pub mod error;
pub mod facade;
pub mod party;
pub mod player;
pub mod timer;
pub mod worker;

pub use api::{CallId, CallbackEvent, DtmfTone, FailedReason, Notification, ReqId, Request, Response};
pub use backend::{BackendCommand, BackendEvent, BackendHandle, CallStatus, ConnStatus, UserStatus};
pub use config::{MediatorBuilder, MediatorConfig};
pub use error::{MediatorError, MediatorResult};
pub use facade::Mediator;
pub use worker::CallbackSink;
