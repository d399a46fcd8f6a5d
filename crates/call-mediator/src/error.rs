//! Crate-level error type for mediator construction and configuration
//! failures.
//!
//! This is distinct from the client-visible Reject/Error/Failed/
//! ConnectionLost vocabulary in [`crate::api`], which is protocol data, not
//! a Rust `Result::Err` — the mediator never fails a client request with a
//! Rust error, it answers it with a [`crate::api::Response`]. `MediatorError`
//! covers the smaller surface of things that can go wrong building or
//! wiring up the mediator itself.

use thiserror::Error;

pub type MediatorResult<T> = Result<T, MediatorError>;

#[derive(Error, Debug, Clone)]
pub enum MediatorError {
    #[error("invalid configuration: {field} - {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("callback sink already registered")]
    CallbackAlreadyRegistered,

    #[error("mediator worker has shut down")]
    WorkerShutDown,

    #[error("start() called before register_callback()")]
    CallbackNotRegistered,
}

impl MediatorError {
    pub fn invalid_configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Group errors for metrics/logging, matching the workspace's
    /// `ClientError::category()` convention.
    pub fn category(&self) -> &'static str {
        match self {
            MediatorError::InvalidConfiguration { .. } => "configuration",
            MediatorError::CallbackAlreadyRegistered => "lifecycle",
            MediatorError::WorkerShutDown => "lifecycle",
            MediatorError::CallbackNotRegistered => "lifecycle",
        }
    }
}
