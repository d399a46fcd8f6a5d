//! Public request/response/notification vocabulary exchanged between a client
//! of the mediator and the mediator core.
//!
//! Every request carries a caller-chosen, non-zero `req_id` that the matching
//! response echoes back (§6 of the design). Notifications instead carry the
//! `call_id` of the call they concern, since they are not answers to a
//! specific request.

use std::fmt;

/// Caller-chosen, non-zero correlation id for a single outstanding request.
///
/// The client may reuse ids across sessions but never while one request with
/// that id is still outstanding; the mediator treats the value opaquely
/// beyond using it for correlation.
pub type ReqId = u32;

/// Backend-assigned call identifier. Zero means "no call".
pub type CallId = u32;

/// A DTMF tone detected in the audio path of a connected call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DtmfTone {
    Tone0,
    Tone1,
    Tone2,
    Tone3,
    Tone4,
    Tone5,
    Tone6,
    Tone7,
    Tone8,
    Tone9,
    ToneA,
    ToneB,
    ToneC,
    ToneD,
    ToneStar,
    ToneHash,
}

/// Why a call never reached [`crate::Notification::Connected`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedReason {
    Failed,
    Refused,
    Busy,
}

/// A request a client issues to the mediator.
///
/// Every variant carries the `req_id` that the eventual terminal response
/// will echo (§8 property 1, "exactly-one-response").
#[derive(Debug, Clone)]
pub enum Request {
    /// Initiate an outbound call to `party` (a phone number or symbolic
    /// handle, see [`crate::party`]).
    InitiateCall { req_id: ReqId, party: String },
    /// Terminate the single active call.
    Drop { req_id: ReqId, call_id: CallId },
    /// Play an audio file into a connected call.
    PlayFile {
        req_id: ReqId,
        call_id: CallId,
        filename: String,
    },
    /// Stop a playback started by [`Request::PlayFile`].
    PlayFileStop { req_id: ReqId, call_id: CallId },
    /// Record the far side of a connected call to a file.
    RecordFile {
        req_id: ReqId,
        call_id: CallId,
        filename: String,
    },
}

impl Request {
    /// The `req_id` this request expects its terminal response to echo.
    pub fn req_id(&self) -> ReqId {
        match self {
            Request::InitiateCall { req_id, .. }
            | Request::Drop { req_id, .. }
            | Request::PlayFile { req_id, .. }
            | Request::PlayFileStop { req_id, .. }
            | Request::RecordFile { req_id, .. } => *req_id,
        }
    }
}

/// A response answering exactly one prior [`Request`], echoing its `req_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    InitiateCall { req_id: ReqId, call_id: CallId },
    Drop { req_id: ReqId },
    PlayFile { req_id: ReqId },
    PlayFileStop { req_id: ReqId },
    RecordFile { req_id: ReqId },
    /// Asynchronous failure while servicing an accepted request (backend
    /// refused, play-start timeout, backend I/O failed).
    Error {
        req_id: ReqId,
        code: u32,
        descr: String,
    },
    /// Synchronous refusal of a request that violated a precondition (busy,
    /// wrong state, invalid party, another request already in flight).
    Reject {
        req_id: ReqId,
        code: u32,
        descr: String,
    },
}

impl Response {
    pub fn req_id(&self) -> ReqId {
        match self {
            Response::InitiateCall { req_id, .. }
            | Response::Drop { req_id, .. }
            | Response::PlayFile { req_id, .. }
            | Response::PlayFileStop { req_id, .. }
            | Response::RecordFile { req_id, .. }
            | Response::Error { req_id, .. }
            | Response::Reject { req_id, .. } => *req_id,
        }
    }
}

/// An unsolicited event concerning the call identified by `call_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Dialing { call_id: CallId },
    Ringing { call_id: CallId },
    Connected { call_id: CallId },
    CallDuration { call_id: CallId, seconds: u32 },
    DtmfTone { call_id: CallId, tone: DtmfTone },
    /// The call never reached [`Notification::Connected`].
    Failed {
        call_id: CallId,
        reason: FailedReason,
        descr: String,
    },
    /// The call was connected and dropped without a client-issued
    /// [`Request::Drop`].
    ConnectionLost { call_id: CallId, descr: String },
}

/// Everything the mediator can hand back to a client: an answer to a
/// specific request, or an unsolicited notification about a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackEvent {
    Response(Response),
    Notification(Notification),
}

impl fmt::Display for FailedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailedReason::Failed => "failed",
            FailedReason::Refused => "refused",
            FailedReason::Busy => "busy",
        };
        f.write_str(s)
    }
}
