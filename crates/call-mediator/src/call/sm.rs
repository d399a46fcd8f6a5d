//! Call state machine transitions, grounded on `dialer.cpp`'s
//! `handle_in_state_*` / `handle_in_w_ical` / `handle_in_w_conn` /
//! `handle_in_connected` / `handle_in_w_drpr(_2)` / `switch_to_ready_if_possible`
//! / `switch_to_idle_and_cleanup` family.
//!
//! As in `crate::player::sm`, transitions are pure except for the backend
//! command issuance that the original performs inline and branches on
//! (`sio_->call(...)`, `sio_->set_call_status(...)`, ...); everything else
//! a transition produces comes back as a [`CallEffect`] for the worker to
//! act on.

use crate::api::{CallbackEvent, DtmfTone, FailedReason, Notification, Request, Response};
use crate::backend::{BackendCommand, BackendEvent, BackendHandle, CallStatus};
use crate::call::session::{CallSession, CallState};
use crate::player::sm::{self as player_sm, PlayerEffect};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEffect {
    Emit(CallbackEvent),
    StartPlayerTimer { req_id: u32 },
    CancelPlayerTimer,
}

impl From<PlayerEffect> for CallEffect {
    fn from(effect: PlayerEffect) -> Self {
        match effect {
            PlayerEffect::Emit(event) => CallEffect::Emit(event),
            PlayerEffect::StartTimer { req_id } => CallEffect::StartPlayerTimer { req_id },
            PlayerEffect::CancelTimer => CallEffect::CancelPlayerTimer,
        }
    }
}

fn from_player(effects: Vec<PlayerEffect>) -> Vec<CallEffect> {
    effects.into_iter().map(CallEffect::from).collect()
}

fn reject(req_id: u32, descr: impl Into<String>) -> CallEffect {
    CallEffect::Emit(CallbackEvent::Response(Response::Reject {
        req_id,
        code: 0,
        descr: descr.into(),
    }))
}

fn error_code(req_id: u32, code: u32, descr: impl Into<String>) -> CallEffect {
    CallEffect::Emit(CallbackEvent::Response(Response::Error {
        req_id,
        code,
        descr: descr.into(),
    }))
}

fn error(req_id: u32, descr: impl Into<String>) -> CallEffect {
    error_code(req_id, 0, descr)
}

fn respond(response: Response) -> CallEffect {
    CallEffect::Emit(CallbackEvent::Response(response))
}

fn notify(notification: Notification) -> CallEffect {
    CallEffect::Emit(CallbackEvent::Notification(notification))
}

fn wrong_state(req_id: u32, state: CallState) -> CallEffect {
    reject(req_id, format!("cannot process in state {state}"))
}

/// `true` if `req_id` belongs to a command response the session isn't
/// expecting (a notification, or a response to a command that already
/// timed out / was superseded) — the caller should drop the event.
fn ignore_non_expected_response(session: &CallSession, req_id: u32) -> bool {
    if req_id == 0 {
        return true;
    }
    req_id != session.current_req_id
}

/// `true` if this event is itself a command response (nonzero `req_id`),
/// used where the immediate echo of a just-issued command must be skipped
/// in favor of the unsolicited status update that follows it.
fn ignore_response(req_id: u32) -> bool {
    req_id != 0
}

/// Entry point for a client request (§4.2): readiness gating, per-request
/// state checks, then dispatch.
pub fn handle_request(session: &mut CallSession, backend: &dyn BackendHandle, req: Request) -> Vec<CallEffect> {
    let req_id = req.req_id();

    if session.current_req_id != 0 {
        return vec![reject(
            req_id,
            format!(
                "cannot process request id {req_id}, currently processing request {}",
                session.current_req_id
            ),
        )];
    }

    match req {
        Request::InitiateCall { req_id, party } => initiate_call(session, backend, req_id, party),
        Request::Drop { req_id, call_id } => drop_call(session, backend, req_id, call_id),
        Request::PlayFile { req_id, call_id, filename } => play_file(session, backend, req_id, call_id, filename),
        Request::PlayFileStop { req_id, call_id } => play_file_stop(session, backend, req_id, call_id),
        Request::RecordFile { req_id, call_id, filename } => record_file(session, backend, req_id, call_id, filename),
    }
}

fn initiate_call(session: &mut CallSession, backend: &dyn BackendHandle, req_id: u32, raw_party: String) -> Vec<CallEffect> {
    if session.state != CallState::Idle {
        return vec![wrong_state(req_id, session.state)];
    }

    let party = match crate::party::transform_party(&raw_party) {
        Some(party) => party,
        None => return vec![error(req_id, format!("invalid number format: {raw_party}"))],
    };

    if !backend.issue(BackendCommand::Call { party, req_id }) {
        return vec![error(req_id, "voip io failed")];
    }

    session.current_req_id = req_id;
    session.state = CallState::WaitingInitiateCallResponse;
    vec![]
}

fn drop_call(session: &mut CallSession, backend: &dyn BackendHandle, req_id: u32, call_id: u32) -> Vec<CallEffect> {
    if !matches!(session.state, CallState::WaitingConnection | CallState::Connected) {
        return vec![wrong_state(req_id, session.state)];
    }
    debug_assert_eq!(call_id, session.call_id, "Drop request for a call_id that isn't the active call");

    if !backend.issue(BackendCommand::SetCallStatus {
        call_id: session.call_id,
        status: CallStatus::Finished,
        req_id,
    }) {
        return vec![error(req_id, "voip io failed")];
    }

    session.current_req_id = req_id;
    session.state = if session.state == CallState::WaitingConnection {
        CallState::CanceledInWc
    } else {
        CallState::CanceledInC
    };
    vec![]
}

fn play_file(
    session: &mut CallSession,
    backend: &dyn BackendHandle,
    req_id: u32,
    call_id: u32,
    filename: String,
) -> Vec<CallEffect> {
    if session.state != CallState::Connected {
        return vec![wrong_state(req_id, session.state)];
    }
    if session.player.state != crate::player::session::PlayerState::Idle {
        return vec![reject(req_id, "a playback is already in progress")];
    }
    debug_assert_eq!(call_id, session.call_id);

    from_player(player_sm::play_file(&mut session.player, backend, req_id, call_id, filename))
}

fn play_file_stop(session: &mut CallSession, backend: &dyn BackendHandle, req_id: u32, call_id: u32) -> Vec<CallEffect> {
    if session.state != CallState::Connected {
        return vec![wrong_state(req_id, session.state)];
    }
    // Only the player states `player_sm::stop` handles without panicking may
    // reach it; `WaitPlayResp`/`CanceledInP` are themselves mid-command and
    // a second stop there is admissible client input (e.g. PlayFile
    // immediately followed by PlayFileStop), not a programmer error, so it
    // gets a Reject rather than hitting the player SM's own assertions.
    match session.player.state {
        crate::player::session::PlayerState::WaitPlayStart
        | crate::player::session::PlayerState::Playing
        | crate::player::session::PlayerState::PlayingAlreadyStopped => {}
        crate::player::session::PlayerState::Idle => return vec![reject(req_id, "no playback in progress")],
        crate::player::session::PlayerState::WaitPlayResp => {
            return vec![reject(req_id, "playback hasn't started yet")];
        }
        crate::player::session::PlayerState::CanceledInP => {
            return vec![reject(req_id, "stop already in progress")];
        }
    }
    debug_assert_eq!(call_id, session.call_id);

    from_player(player_sm::stop(&mut session.player, backend, req_id, call_id))
}

fn record_file(
    session: &mut CallSession,
    backend: &dyn BackendHandle,
    req_id: u32,
    call_id: u32,
    filename: String,
) -> Vec<CallEffect> {
    if session.state != CallState::Connected {
        return vec![wrong_state(req_id, session.state)];
    }
    debug_assert_eq!(call_id, session.call_id);

    if !backend.issue(BackendCommand::AlterCallSetOutputFile {
        call_id,
        path: filename.clone(),
        req_id,
    }) {
        return vec![error(req_id, format!("failed output input file: {filename}"))];
    }

    vec![respond(Response::RecordFile { req_id })]
}

/// The play-start watchdog fired. Ignored if the timer it came from was
/// already superseded (a new playback started, or the call moved on) —
/// cancellation is best-effort against the race between the timer firing
/// and the worker processing its cancellation.
pub fn handle_play_timeout(session: &mut CallSession, req_id: u32) -> Vec<CallEffect> {
    if session.state == CallState::Connected && session.player.req_id == req_id {
        from_player(player_sm::on_play_failed(&mut session.player, req_id))
    } else {
        vec![]
    }
}

/// A DTMF tone detected by the backend's tone detector while a call is
/// connected. Silently dropped in every other state (no player to hear it).
pub fn handle_dtmf(session: &CallSession, tone: DtmfTone) -> Vec<CallEffect> {
    if session.state == CallState::Connected {
        vec![notify(Notification::DtmfTone {
            call_id: session.call_id,
            tone,
        })]
    } else {
        vec![]
    }
}

/// Dispatch a backend event per the current call state (§4.2 transition
/// tables).
pub fn handle_backend_event(
    session: &mut CallSession,
    backend: &dyn BackendHandle,
    data_port: u16,
    event: BackendEvent,
) -> Vec<CallEffect> {
    match session.state {
        CallState::Unknown | CallState::Idle => readiness_event(session, event),
        CallState::WaitingInitiateCallResponse => handle_in_w_ical(session, event),
        CallState::WaitingConnection => handle_in_w_conn(session, backend, data_port, event),
        CallState::Connected => handle_in_connected(session, event),
        CallState::CanceledInC => handle_in_w_drpr(session, event, true),
        CallState::CanceledInWc => handle_in_w_drpr(session, event, false),
    }
}

fn readiness_event(session: &mut CallSession, event: BackendEvent) -> Vec<CallEffect> {
    match event {
        BackendEvent::ConnStatus { status } => session.conn_status = status,
        BackendEvent::UserStatus { status } => session.user_status = status,
        _ => return vec![],
    }
    switch_to_ready_if_possible(session);
    vec![]
}

fn switch_to_ready_if_possible(session: &mut CallSession) {
    match session.state {
        CallState::Unknown if session.backend_ready() => session.state = CallState::Idle,
        CallState::Idle if session.backend_lost() => session.state = CallState::Unknown,
        _ => {}
    }
}

fn switch_to_idle_and_cleanup(session: &mut CallSession) -> Vec<CallEffect> {
    let effects = from_player(player_sm::on_loss(&mut session.player));
    session.cleanup();
    effects
}

/// Note: conn/user status events past IDLE aren't tracked by the original
/// (a standing TODO there, not a Rust-side omission) — carried over as-is.
fn handle_in_w_ical(session: &mut CallSession, event: BackendEvent) -> Vec<CallEffect> {
    match event {
        BackendEvent::ConnStatus { .. } | BackendEvent::UserStatus { .. } => vec![],
        BackendEvent::CallStatus { call_id, req_id, .. } => {
            if ignore_non_expected_response(session, req_id) {
                return vec![];
            }
            let effects = vec![respond(Response::InitiateCall {
                req_id: session.current_req_id,
                call_id,
            })];
            session.current_req_id = 0;
            session.call_id = call_id;
            session.state = CallState::WaitingConnection;
            effects
        }
        BackendEvent::Error { req_id, code, descr } => {
            if ignore_non_expected_response(session, req_id) {
                return vec![];
            }
            let effects = vec![error_code(session.current_req_id, code, descr)];
            session.current_req_id = 0;
            session.state = CallState::Idle;
            effects
        }
        BackendEvent::CurrentUserHandle { .. }
        | BackendEvent::UserOnlineStatus
        | BackendEvent::VoicemailDuration { .. }
        | BackendEvent::Chat
        | BackendEvent::ChatMember
        | BackendEvent::Unknown { .. } => vec![],
        other @ (BackendEvent::CallEvent
        | BackendEvent::CallDuration { .. }
        | BackendEvent::CallPstnStatus { .. }
        | BackendEvent::CallFailureReason { .. }
        | BackendEvent::CallVaaInputStatus { .. }
        | BackendEvent::AlterCallSetInputFile { .. }
        | BackendEvent::AlterCallSetOutputFile { .. }) => {
            panic!("unexpected backend event {other:?} while waiting for initiate-call response")
        }
    }
}

fn handle_in_w_conn(
    session: &mut CallSession,
    backend: &dyn BackendHandle,
    data_port: u16,
    event: BackendEvent,
) -> Vec<CallEffect> {
    match event {
        BackendEvent::ConnStatus { .. } | BackendEvent::UserStatus { .. } => vec![],
        BackendEvent::CallPstnStatus { code, descr, .. } => {
            on_call_pstn_status(session, code, descr);
            vec![]
        }
        BackendEvent::CallFailureReason { reason, .. } => {
            on_call_failure_reason(session, reason);
            vec![]
        }
        BackendEvent::CallStatus { call_id, status, .. } => w_conn_call_status(session, backend, data_port, call_id, status),
        BackendEvent::Error { descr, .. } => {
            let mut effects = vec![notify(Notification::Failed {
                call_id: session.call_id,
                reason: FailedReason::Failed,
                descr: format!("ERROR: {descr}"),
            })];
            effects.extend(switch_to_idle_and_cleanup(session));
            effects
        }
        BackendEvent::CurrentUserHandle { .. }
        | BackendEvent::UserOnlineStatus
        | BackendEvent::VoicemailDuration { .. }
        | BackendEvent::Chat
        | BackendEvent::ChatMember
        | BackendEvent::Unknown { .. } => vec![],
        other @ (BackendEvent::CallEvent
        | BackendEvent::CallDuration { .. }
        | BackendEvent::CallVaaInputStatus { .. }
        | BackendEvent::AlterCallSetInputFile { .. }
        | BackendEvent::AlterCallSetOutputFile { .. }) => {
            panic!("unexpected backend event {other:?} while waiting for connection")
        }
    }
}

fn w_conn_call_status(
    session: &mut CallSession,
    backend: &dyn BackendHandle,
    data_port: u16,
    call_id: u32,
    status: CallStatus,
) -> Vec<CallEffect> {
    let failed = |session: &mut CallSession, reason: FailedReason, descr: &str| {
        let mut effects = vec![notify(Notification::Failed {
            call_id,
            reason,
            descr: descr.to_string(),
        })];
        effects.extend(switch_to_idle_and_cleanup(session));
        effects
    };

    match status {
        CallStatus::Cancelled => failed(session, FailedReason::Failed, "cancelled by user"),
        CallStatus::Finished => {
            let descr = pstn_descr(session, "cancelled by user");
            failed(session, FailedReason::Failed, &descr)
        }
        CallStatus::Routing => vec![notify(Notification::Dialing { call_id })],
        CallStatus::Ringing => vec![notify(Notification::Ringing { call_id })],
        CallStatus::VmRecording => {
            session.state = CallState::Connected;
            vec![notify(Notification::Connected { call_id })]
        }
        CallStatus::Inprogress => {
            session.state = CallState::Connected;
            let effects = vec![notify(Notification::Connected { call_id })];
            if data_port != 0 && !backend.issue(BackendCommand::AlterCallSetOutputPort { call_id, port: data_port }) {
                tracing::error!(call_id, data_port, "failed to redirect input data to port");
            }
            effects
        }
        CallStatus::None => failed(session, FailedReason::Failed, "call ended unexpectedly"),
        CallStatus::Failed | CallStatus::VmFailed => failed(session, FailedReason::Failed, "call failed"),
        CallStatus::Missed => failed(session, FailedReason::Refused, "call was missed"),
        CallStatus::Busy => failed(session, FailedReason::Busy, "number is busy"),
        CallStatus::Refused => failed(session, FailedReason::Refused, "call was refused"),
        other => {
            tracing::warn!(call_id, ?other, "unhandled call status while waiting for connection");
            vec![]
        }
    }
}

fn handle_in_connected(session: &mut CallSession, event: BackendEvent) -> Vec<CallEffect> {
    let mut effects = match &event {
        BackendEvent::ConnStatus { .. } | BackendEvent::UserStatus { .. } => vec![],
        BackendEvent::CallEvent => vec![],
        BackendEvent::CallDuration { call_id, seconds } => vec![notify(Notification::CallDuration {
            call_id: *call_id,
            seconds: *seconds,
        })],
        BackendEvent::VoicemailDuration { .. } => vec![],
        BackendEvent::CallPstnStatus { code, descr, .. } => {
            on_call_pstn_status(session, *code, descr.clone());
            vec![]
        }
        BackendEvent::CallFailureReason { reason, .. } => {
            on_call_failure_reason(session, *reason);
            vec![]
        }
        BackendEvent::CallStatus { call_id, status, .. } => connected_call_status(session, *call_id, *status),
        BackendEvent::Error { req_id, descr, .. } if *req_id == 0 => {
            let mut e = vec![notify(Notification::ConnectionLost {
                call_id: session.call_id,
                descr: descr.clone(),
            })];
            e.extend(switch_to_idle_and_cleanup(session));
            e
        }
        _ => vec![],
    };

    effects.extend(from_player(forward_to_player(&mut session.player, &event)));
    effects
}

fn connected_call_status(session: &mut CallSession, call_id: u32, status: CallStatus) -> Vec<CallEffect> {
    let lost = |session: &mut CallSession, descr: &str| {
        let mut effects = vec![notify(Notification::ConnectionLost {
            call_id,
            descr: descr.to_string(),
        })];
        effects.extend(switch_to_idle_and_cleanup(session));
        effects
    };

    match status {
        CallStatus::Cancelled => lost(session, "cancelled by user"),
        CallStatus::Finished => {
            let descr = pstn_descr(session, "cancelled by user");
            lost(session, &descr)
        }
        CallStatus::None => lost(session, "call ended unexpectedly"),
        CallStatus::Failed => lost(session, "call failed"),
        CallStatus::Routing
        | CallStatus::Ringing
        | CallStatus::Inprogress
        | CallStatus::Busy
        | CallStatus::Refused
        | CallStatus::Missed => {
            panic!("unexpected call status {status:?} while connected (call {call_id})")
        }
        other => {
            tracing::warn!(call_id, ?other, "unhandled call status while connected");
            vec![]
        }
    }
}

fn forward_to_player(player: &mut crate::player::session::PlayerSession, event: &BackendEvent) -> Vec<PlayerEffect> {
    match event {
        BackendEvent::CallVaaInputStatus { status, .. } => {
            if *status != 0 {
                player_sm::on_play_start(player)
            } else {
                player_sm::on_play_stop(player)
            }
        }
        BackendEvent::AlterCallSetInputFile { req_id } if *req_id != 0 => player_sm::on_play_file_response(player, *req_id),
        BackendEvent::Error { req_id, .. } if *req_id != 0 => player_sm::on_error_response(player, *req_id),
        _ => vec![],
    }
}

fn handle_in_w_drpr(session: &mut CallSession, event: BackendEvent, canceled_in_c: bool) -> Vec<CallEffect> {
    match event {
        BackendEvent::ConnStatus { .. } | BackendEvent::UserStatus { .. } => vec![],
        BackendEvent::CallEvent | BackendEvent::CallDuration { .. } | BackendEvent::CallVaaInputStatus { .. } => vec![],
        BackendEvent::CallPstnStatus { code, descr, .. } => {
            on_call_pstn_status(session, code, descr);
            vec![]
        }
        BackendEvent::CallFailureReason { reason, .. } => {
            on_call_failure_reason(session, reason);
            vec![]
        }
        BackendEvent::CallStatus { status, req_id, .. } => {
            if ignore_response(req_id) {
                return vec![];
            }
            if canceled_in_c {
                w_drpr_call_status(session, status)
            } else {
                w_drpr2_call_status(session, status)
            }
        }
        BackendEvent::Error { code, descr, .. } => {
            let mut effects = vec![notify(Notification::ConnectionLost {
                call_id: session.call_id,
                descr: format!("ERROR: {code}, {descr}"),
            })];
            effects.extend(switch_to_idle_and_cleanup(session));
            effects
        }
        _ => vec![],
    }
}

fn w_drpr_call_status(session: &mut CallSession, status: CallStatus) -> Vec<CallEffect> {
    match status {
        CallStatus::Finished | CallStatus::VmSent => {
            let req_id = session.current_req_id;
            let mut effects = vec![respond(Response::Drop { req_id })];
            effects.extend(switch_to_idle_and_cleanup(session));
            effects
        }
        other => panic!("unexpected call status {other:?} waiting for drop response"),
    }
}

fn w_drpr2_call_status(session: &mut CallSession, status: CallStatus) -> Vec<CallEffect> {
    match status {
        CallStatus::Cancelled => {
            let req_id = session.current_req_id;
            let mut effects = vec![respond(Response::Drop { req_id })];
            effects.extend(switch_to_idle_and_cleanup(session));
            effects
        }
        CallStatus::Inprogress | CallStatus::EarlyMedia | CallStatus::Routing | CallStatus::Ringing => {
            // the call was connecting anyway; the drop will still land shortly
            vec![]
        }
        other => panic!("unexpected call status {other:?} waiting for drop response before connection"),
    }
}

fn pstn_descr(session: &CallSession, fallback: &str) -> String {
    match &session.pstn_status {
        Some((code, msg)) => format!("PSTN: {code}, {msg}"),
        None => fallback.to_string(),
    }
}

fn on_call_pstn_status(session: &mut CallSession, code: u32, descr: String) {
    debug_assert!(session.pstn_status.is_none(), "PSTN status must be set at most once per call");
    session.pstn_status = Some((code, descr));
}

fn on_call_failure_reason(session: &mut CallSession, reason: u32) {
    debug_assert!(
        session.failure_reason.is_none(),
        "failure reason must be set at most once per call"
    );
    session.failure_reason = Some((reason, decode_failure_reason(reason).to_string()));
}

/// Human-readable text for a backend failure-reason code.
fn decode_failure_reason(code: u32) -> &'static str {
    const TABLE: [&str; 15] = [
        "",
        "Miscellaneous error",
        "User or phone number does not exist. Check that a prefix is entered for the phone number, either in the form 003725555555 or +3725555555; the form 3725555555 is incorrect.",
        "User is offline",
        "No proxy found",
        "Session terminated.",
        "No common codec found.",
        "Sound I/O error.",
        "Problem with remote sound device.",
        "Call blocked by recipient.",
        "Recipient not a friend.",
        "Current user not authorized by recipient.",
        "Sound recording error.",
        "Failure to call a commercial contact.",
        "Conference call has been dropped by the host. Note that this does not normally indicate abnormal call termination. Call being dropped for all the participants when the conference host leaves the call is expected behaviour.",
    ];
    TABLE.get(code as usize).copied().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::call::session::CallSession;

    fn connected(backend: &MockBackend) -> CallSession {
        let mut session = CallSession::default();
        session.state = CallState::Idle;
        let effects = initiate_call(&mut session, backend, 1, "+15551234".into());
        assert!(effects.is_empty());
        let effects = handle_backend_event(
            &mut session,
            backend,
            0,
            BackendEvent::CallStatus {
                call_id: 42,
                status: CallStatus::Routing,
                req_id: 1,
            },
        );
        assert_eq!(
            effects,
            vec![respond(Response::InitiateCall { req_id: 1, call_id: 42 })]
        );
        assert_eq!(session.state, CallState::WaitingConnection);

        let effects = handle_backend_event(
            &mut session,
            backend,
            0,
            BackendEvent::CallStatus {
                call_id: 42,
                status: CallStatus::Inprogress,
                req_id: 0,
            },
        );
        assert_eq!(effects, vec![notify(Notification::Connected { call_id: 42 })]);
        assert_eq!(session.state, CallState::Connected);
        session
    }

    #[test]
    fn successful_call_sequence_reaches_connected() {
        let backend = MockBackend::new();
        let session = connected(&backend);
        assert_eq!(session.call_id, 42);
        assert_eq!(
            backend.issued(),
            vec![BackendCommand::Call {
                party: "0015551234".into(),
                req_id: 1
            }]
        );
    }

    #[test]
    fn invalid_party_is_rejected_with_error_not_reject() {
        let backend = MockBackend::new();
        let mut session = CallSession::default();
        session.state = CallState::Idle;
        let effects = handle_request(
            &mut session,
            &backend,
            Request::InitiateCall {
                req_id: 1,
                party: "not-a-valid-party!".into(),
            },
        );
        assert_eq!(
            effects,
            vec![error(1, "invalid number format: not-a-valid-party!")]
        );
        assert_eq!(session.state, CallState::Idle);
        assert!(backend.issued().is_empty());
    }

    #[test]
    fn busy_call_status_emits_failed_and_returns_to_idle() {
        let backend = MockBackend::new();
        let mut session = CallSession::default();
        session.state = CallState::Idle;
        initiate_call(&mut session, &backend, 1, "+15551234".into());
        handle_backend_event(
            &mut session,
            &backend,
            0,
            BackendEvent::CallStatus {
                call_id: 42,
                status: CallStatus::Routing,
                req_id: 1,
            },
        );

        let effects = handle_backend_event(
            &mut session,
            &backend,
            0,
            BackendEvent::CallStatus {
                call_id: 42,
                status: CallStatus::Busy,
                req_id: 0,
            },
        );
        assert_eq!(
            effects,
            vec![notify(Notification::Failed {
                call_id: 42,
                reason: FailedReason::Busy,
                descr: "number is busy".into()
            })]
        );
        assert_eq!(session.state, CallState::Idle);
        assert_eq!(session.call_id, 0);
    }

    #[test]
    fn drop_while_connected_confirms_after_finished_status() {
        let backend = MockBackend::new();
        let mut session = connected(&backend);

        let effects = handle_request(&mut session, &backend, Request::Drop { req_id: 2, call_id: 42 });
        assert!(effects.is_empty());
        assert_eq!(session.state, CallState::CanceledInC);

        // the immediate echo of the set_call_status command carries a req_id and must be ignored
        let effects = handle_backend_event(
            &mut session,
            &backend,
            0,
            BackendEvent::CallStatus {
                call_id: 42,
                status: CallStatus::Inprogress,
                req_id: 2,
            },
        );
        assert!(effects.is_empty());
        assert_eq!(session.state, CallState::CanceledInC);

        let effects = handle_backend_event(
            &mut session,
            &backend,
            0,
            BackendEvent::CallStatus {
                call_id: 42,
                status: CallStatus::Finished,
                req_id: 0,
            },
        );
        assert_eq!(effects, vec![respond(Response::Drop { req_id: 2 })]);
        assert_eq!(session.state, CallState::Idle);
    }

    #[test]
    fn connection_lost_reports_pstn_status_once_available() {
        let backend = MockBackend::new();
        let mut session = connected(&backend);

        handle_backend_event(
            &mut session,
            &backend,
            0,
            BackendEvent::CallPstnStatus {
                call_id: 42,
                code: 3,
                descr: "busy".into(),
            },
        );

        let effects = handle_backend_event(
            &mut session,
            &backend,
            0,
            BackendEvent::CallStatus {
                call_id: 42,
                status: CallStatus::Finished,
                req_id: 0,
            },
        );
        assert_eq!(
            effects,
            vec![notify(Notification::ConnectionLost {
                call_id: 42,
                descr: "PSTN: 3, busy".into()
            })]
        );
    }

    #[test]
    fn request_while_request_in_flight_is_rejected() {
        let backend = MockBackend::new();
        let mut session = CallSession::default();
        session.state = CallState::Idle;
        initiate_call(&mut session, &backend, 1, "+15551234".into());

        let effects = handle_request(
            &mut session,
            &backend,
            Request::InitiateCall {
                req_id: 2,
                party: "+15555678".into(),
            },
        );
        assert_eq!(
            effects,
            vec![reject(2, "cannot process request id 2, currently processing request 1")]
        );
    }

    #[test]
    fn record_file_responds_synchronously_and_ignores_the_later_echo() {
        let backend = MockBackend::new();
        let mut session = connected(&backend);

        let effects = handle_request(
            &mut session,
            &backend,
            Request::RecordFile {
                req_id: 8,
                call_id: 42,
                filename: "farside.wav".into(),
            },
        );
        assert_eq!(effects, vec![respond(Response::RecordFile { req_id: 8 })]);
        assert_eq!(
            backend.last_issued(),
            Some(BackendCommand::AlterCallSetOutputFile {
                call_id: 42,
                path: "farside.wav".into(),
                req_id: 8,
            })
        );
        // no outstanding request is tracked for RecordFile: a second request
        // is accepted immediately rather than rejected as "busy".
        assert_eq!(session.current_req_id, 0);

        // the backend's later echo of the command is simply ignored, not
        // correlated to anything (§4.2: "fire-and-forget at this layer").
        let effects = handle_backend_event(
            &mut session,
            &backend,
            0,
            BackendEvent::AlterCallSetOutputFile { req_id: 8 },
        );
        assert!(effects.is_empty());
        assert_eq!(session.state, CallState::Connected);
    }

    #[test]
    fn dtmf_tone_only_forwarded_while_connected() {
        let backend = MockBackend::new();
        let session = connected(&backend);
        let effects = handle_dtmf(&session, DtmfTone::ToneStar);
        assert_eq!(
            effects,
            vec![notify(Notification::DtmfTone {
                call_id: 42,
                tone: DtmfTone::ToneStar
            })]
        );

        let idle_session = CallSession::default();
        assert!(handle_dtmf(&idle_session, DtmfTone::ToneStar).is_empty());
    }

    #[test]
    fn wrong_state_reject_uses_upstream_screaming_snake_name() {
        let backend = MockBackend::new();
        let mut session = CallSession::default();
        session.state = CallState::Idle;
        initiate_call(&mut session, &backend, 1, "+15551234".into());
        handle_backend_event(
            &mut session,
            &backend,
            0,
            BackendEvent::CallStatus { call_id: 42, status: CallStatus::Routing, req_id: 1 },
        );
        assert_eq!(session.state, CallState::WaitingConnection);
        assert_eq!(session.current_req_id, 0);

        let effects = handle_request(
            &mut session,
            &backend,
            Request::InitiateCall { req_id: 3, party: "alice".into() },
        );
        assert_eq!(effects, vec![reject(3, "cannot process in state WAITING_CONNECTION")]);
    }

    #[test]
    fn play_file_stop_while_waiting_for_play_response_is_rejected_not_panicking() {
        let backend = MockBackend::new();
        let mut session = connected(&backend);

        let effects = handle_request(
            &mut session,
            &backend,
            Request::PlayFile { req_id: 5, call_id: 42, filename: "a.wav".into() },
        );
        assert!(effects.is_empty());
        assert_eq!(session.player.state, crate::player::session::PlayerState::WaitPlayResp);

        let effects = handle_request(&mut session, &backend, Request::PlayFileStop { req_id: 6, call_id: 42 });
        assert_eq!(effects, vec![reject(6, "playback hasn't started yet")]);
        // the in-flight PlayFile is untouched: it can still complete normally.
        assert_eq!(session.player.state, crate::player::session::PlayerState::WaitPlayResp);
    }

    #[test]
    fn play_file_stop_while_stop_already_in_progress_is_rejected_not_panicking() {
        let backend = MockBackend::new();
        let mut session = connected(&backend);

        handle_request(
            &mut session,
            &backend,
            Request::PlayFile { req_id: 5, call_id: 42, filename: "a.wav".into() },
        );
        from_player(player_sm::on_play_file_response(&mut session.player, 5));
        from_player(player_sm::on_play_start(&mut session.player));
        handle_request(&mut session, &backend, Request::PlayFileStop { req_id: 6, call_id: 42 });
        assert_eq!(session.player.state, crate::player::session::PlayerState::CanceledInP);

        let effects = handle_request(&mut session, &backend, Request::PlayFileStop { req_id: 7, call_id: 42 });
        assert_eq!(effects, vec![reject(7, "stop already in progress")]);
        assert_eq!(session.player.state, crate::player::session::PlayerState::CanceledInP);
    }
}
