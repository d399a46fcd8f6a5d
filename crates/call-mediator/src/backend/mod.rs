//! The backend adapter boundary (§4.4).
//!
//! The mediator core never talks to the Skype-style backend process
//! directly; it depends on the [`BackendHandle`] trait, which the actual
//! adapter implementation (wire encoding, process management, reconnects)
//! sits behind. Commands are fire-and-forget from the core's point of view:
//! the backend acknowledges receipt synchronously (`true`/`false` for
//! "accepted for delivery"), and the substantive answer to a command always
//! arrives later as a typed [`BackendEvent`] echoing the command's `req_id`.

pub mod mock;

/// Connection status of the mediator's link to the backend process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnStatus {
    None,
    Offline,
    Connecting,
    Online,
}

/// Presence status of the backend-authenticated user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    None,
    Online,
    Offline,
    Away,
    Dnd,
    Invisible,
    Na,
    /// Any other presence value the backend may report; readiness gating
    /// treats it like `None` (not ready).
    Other,
}

/// Lifecycle status of a single call, as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Unknown,
    Routing,
    EarlyMedia,
    Ringing,
    Inprogress,
    VmRecording,
    VmSent,
    VmFailed,
    Cancelled,
    Finished,
    None,
    Failed,
    Missed,
    Refused,
    Busy,
}

/// A command the mediator issues to the backend. Each carries (or, for
/// `AlterCallSetOutputPort`, omits) a caller-chosen `req_id` that the
/// backend echoes verbatim on its eventual command-response event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    Call { party: String, req_id: u32 },
    SetCallStatus {
        call_id: u32,
        status: CallStatus,
        req_id: u32,
    },
    AlterCallSetInputFile {
        call_id: u32,
        path: String,
        req_id: u32,
    },
    AlterCallSetInputSoundcard { call_id: u32, req_id: u32 },
    AlterCallSetOutputFile {
        call_id: u32,
        path: String,
        req_id: u32,
    },
    /// No command-response is expected for this one; it is fire-and-forget
    /// (§4.2, issued once on reaching CONNECTED when `data_port != 0`).
    AlterCallSetOutputPort { call_id: u32, port: u16 },
}

/// A typed event the backend emits, either a response to a command (`req_id
/// != 0`, matching the originating command) or an unsolicited notification
/// (`req_id == 0`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    ConnStatus { status: ConnStatus },
    UserStatus { status: UserStatus },
    CurrentUserHandle { handle: String },
    UserOnlineStatus,
    CallEvent,
    CallStatus {
        call_id: u32,
        status: CallStatus,
        req_id: u32,
    },
    CallPstnStatus {
        call_id: u32,
        code: u32,
        descr: String,
    },
    CallDuration { call_id: u32, seconds: u32 },
    VoicemailDuration { call_id: u32, seconds: u32 },
    CallFailureReason { call_id: u32, reason: u32 },
    CallVaaInputStatus { call_id: u32, status: u32 },
    AlterCallSetInputFile { req_id: u32 },
    AlterCallSetOutputFile { req_id: u32 },
    Chat,
    ChatMember,
    Error {
        req_id: u32,
        code: u32,
        descr: String,
    },
    /// The raw backend line, preserved only for logging.
    Unknown { raw: String },
}

impl BackendEvent {
    /// `req_id` this event echoes, if it is a command response. `0` for
    /// unsolicited notifications (§4.4).
    pub fn req_id(&self) -> u32 {
        match self {
            BackendEvent::CallStatus { req_id, .. }
            | BackendEvent::AlterCallSetInputFile { req_id }
            | BackendEvent::AlterCallSetOutputFile { req_id }
            | BackendEvent::Error { req_id, .. } => *req_id,
            _ => 0,
        }
    }
}

/// The typed boundary to the backend process. The core depends on this
/// trait abstractly; it never owns a concrete adapter (§9, "avoid cycles in
/// ownership").
pub trait BackendHandle: Send + Sync {
    /// Returns `false` if the command could not even be handed to the
    /// backend (e.g. the connection is down); the mediator surfaces that as
    /// an `Error` response and does not retry (§7).
    fn issue(&self, command: BackendCommand) -> bool;
}
