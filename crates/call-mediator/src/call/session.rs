//! Call state machine states and per-call session data (§4.2).

use std::fmt;

use crate::backend::{ConnStatus, UserStatus};
use crate::player::session::PlayerSession;

/// State of the single call the mediator can have active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// Backend link not yet ready; no request can be serviced.
    Unknown,
    /// Ready, no call in progress.
    Idle,
    WaitingInitiateCallResponse,
    WaitingConnection,
    Connected,
    /// Drop requested while CONNECTED.
    CanceledInC,
    /// Drop requested while WAITING_CONNECTION.
    CanceledInWc,
}

/// Renders the original `Dialer::state_e` names (`StrHelper::to_string`,
/// `examples/original_source/str_helper.cpp:41-47`) rather than the Rust
/// enum's CamelCase spelling, so client-visible text (e.g. a `Reject`
/// descr) matches the upstream wording.
impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CallState::Unknown => "UNKNOWN",
            CallState::Idle => "IDLE",
            CallState::WaitingInitiateCallResponse => "WAITING_INITIATE_CALL_RESPONSE",
            CallState::WaitingConnection => "WAITING_CONNECTION",
            CallState::Connected => "CONNECTED",
            CallState::CanceledInC => "CANCELED_IN_C",
            CallState::CanceledInWc => "CANCELED_IN_WC",
        };
        f.write_str(s)
    }
}

/// All mutable state belonging to the mediator's one call slot, plus the
/// backend readiness signals that gate the UNKNOWN -> IDLE transition.
#[derive(Debug, Clone)]
pub struct CallSession {
    pub state: CallState,
    /// `req_id` of the single request currently being serviced, `0` if
    /// none (§5, at most one outstanding request at a time).
    pub current_req_id: u32,
    pub call_id: u32,
    pub conn_status: ConnStatus,
    pub user_status: UserStatus,
    /// Set at most once per call by a `CallPstnStatusEvent` (§4.2 invariant).
    pub pstn_status: Option<(u32, String)>,
    /// Set at most once per call by a `CallFailureReasonEvent`.
    pub failure_reason: Option<(u32, String)>,
    pub player: PlayerSession,
}

impl Default for CallSession {
    fn default() -> Self {
        Self {
            state: CallState::Unknown,
            current_req_id: 0,
            call_id: 0,
            conn_status: ConnStatus::None,
            user_status: UserStatus::None,
            pstn_status: None,
            failure_reason: None,
            player: PlayerSession::default(),
        }
    }
}

impl CallSession {
    /// Readiness the backend must report for UNKNOWN -> IDLE (§4.2): the
    /// connection is up and the user's presence is any "logged in" value.
    pub fn backend_ready(&self) -> bool {
        self.conn_status == ConnStatus::Online
            && matches!(
                self.user_status,
                UserStatus::Online | UserStatus::Away | UserStatus::Dnd | UserStatus::Invisible | UserStatus::Na
            )
    }

    /// Loss condition that drops IDLE back to UNKNOWN (§4.2).
    pub fn backend_lost(&self) -> bool {
        matches!(self.conn_status, ConnStatus::Offline | ConnStatus::Connecting)
            || self.user_status == UserStatus::Offline
    }

    /// Reset everything about the current call, returning to IDLE; the
    /// backend readiness signals (`conn_status`/`user_status`) survive.
    pub fn cleanup(&mut self) {
        self.state = CallState::Idle;
        self.call_id = 0;
        self.current_req_id = 0;
        self.pstn_status = None;
        self.failure_reason = None;
    }
}
