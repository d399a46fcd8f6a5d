//! Mediator configuration, built with a fluent builder mirroring the
//! workspace's `client-core::client::builder::ClientBuilder` style.

use std::time::Duration;

use crate::error::{MediatorError, MediatorResult};

/// Default watchdog for "play started" (§4.3, `WAIT_PLAY_START`).
const DEFAULT_PLAY_TIMEOUT: Duration = Duration::from_secs(2);

/// Bound on the worker's event queue (§4.1); a full queue causes `submit`
/// callers to receive a synchronous [`crate::api::Response::Reject`] rather
/// than block.
const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Immutable configuration for a [`crate::Mediator`] instance.
#[derive(Debug, Clone)]
pub struct MediatorConfig {
    /// RTP/media port announced to the backend once a call reaches
    /// CONNECTED (§4.2). `0` means "do not announce a port".
    pub data_port: u16,
    /// How long the Player SM waits for PLAYING after a play-file command
    /// is accepted before giving up (§4.3).
    pub play_timeout: Duration,
    /// Capacity of the worker's bounded event queue (§4.1, §5).
    pub queue_capacity: usize,
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            data_port: 0,
            play_timeout: DEFAULT_PLAY_TIMEOUT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Fluent builder for [`MediatorConfig`].
#[derive(Debug, Clone, Default)]
pub struct MediatorBuilder {
    config: MediatorConfig,
}

impl MediatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_port(mut self, port: u16) -> Self {
        self.config.data_port = port;
        self
    }

    pub fn play_timeout(mut self, timeout: Duration) -> Self {
        self.config.play_timeout = timeout;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Validate and produce the final [`MediatorConfig`].
    pub fn build(self) -> MediatorResult<MediatorConfig> {
        if self.config.queue_capacity == 0 {
            return Err(MediatorError::invalid_configuration(
                "queue_capacity",
                "must be at least 1",
            ));
        }
        if self.config.play_timeout.is_zero() {
            return Err(MediatorError::invalid_configuration(
                "play_timeout",
                "must be greater than zero",
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = MediatorBuilder::new().build().unwrap();
        assert_eq!(config.data_port, 0);
        assert_eq!(config.play_timeout, DEFAULT_PLAY_TIMEOUT);
    }

    #[test]
    fn rejects_zero_queue_capacity() {
        let err = MediatorBuilder::new().queue_capacity(0).build().unwrap_err();
        assert_eq!(err.category(), "configuration");
    }

    #[test]
    fn rejects_zero_play_timeout() {
        let err = MediatorBuilder::new()
            .play_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert_eq!(err.category(), "configuration");
    }

    #[test]
    fn builder_overrides_apply() {
        let config = MediatorBuilder::new()
            .data_port(5004)
            .play_timeout(Duration::from_secs(5))
            .queue_capacity(32)
            .build()
            .unwrap();
        assert_eq!(config.data_port, 5004);
        assert_eq!(config.play_timeout, Duration::from_secs(5));
        assert_eq!(config.queue_capacity, 32);
    }
}
