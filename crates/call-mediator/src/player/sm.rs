//! Player state machine transitions, grounded on `player_sm.cpp`.
//!
//! Every entry point takes the current [`PlayerSession`] plus whatever
//! triggered the transition and returns the [`PlayerEffect`]s the caller
//! (the worker, in `crate::worker`) must carry out: issuing a backend
//! command, emitting a callback event to the client, or starting/cancelling
//! the play-start watchdog timer. The state machine itself performs no I/O,
//! which is what makes it exhaustively unit-testable.

use crate::api::{CallbackEvent, Response};
use crate::backend::{BackendCommand, BackendHandle};
use crate::player::session::{PlayerSession, PlayerState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEffect {
    Emit(CallbackEvent),
    /// (Re)start the play-start watchdog for this `req_id`, replacing any
    /// timer already running for the player.
    StartTimer { req_id: u32 },
    /// Cancel the play-start watchdog; a no-op if none is running.
    CancelTimer,
}

fn error_response(req_id: u32, descr: &str) -> PlayerEffect {
    PlayerEffect::Emit(CallbackEvent::Response(Response::Error {
        req_id,
        code: 0,
        descr: descr.to_string(),
    }))
}

/// Begin playing `filename` into `call_id`. Only valid from `Idle`. Issues
/// the input-file command synchronously; on delivery failure the player
/// stays `Idle` and the caller gets an `Error` response immediately (§7).
pub fn play_file(
    session: &mut PlayerSession,
    backend: &dyn BackendHandle,
    req_id: u32,
    call_id: u32,
    filename: String,
) -> Vec<PlayerEffect> {
    assert_eq!(session.state, PlayerState::Idle, "play_file: unexpected player state");

    let accepted = backend.issue(BackendCommand::AlterCallSetInputFile {
        call_id,
        path: filename.clone(),
        req_id,
    });

    if !accepted {
        return vec![error_response(req_id, &format!("failed setting input file: {filename}"))];
    }

    session.req_id = req_id;
    session.state = PlayerState::WaitPlayResp;
    vec![]
}

/// Stop a playback. Meaningful from `WaitPlayStart`, `PlayingAlreadyStopped`
/// and `Playing`; a no-op from `Idle`.
pub fn stop(session: &mut PlayerSession, backend: &dyn BackendHandle, req_id: u32, call_id: u32) -> Vec<PlayerEffect> {
    match session.state {
        PlayerState::Idle => vec![],

        PlayerState::WaitPlayStart => {
            session.req_id = 0;
            session.state = PlayerState::Idle;
            vec![
                PlayerEffect::CancelTimer,
                PlayerEffect::Emit(CallbackEvent::Response(Response::PlayFileStop { req_id })),
            ]
        }

        PlayerState::PlayingAlreadyStopped => {
            session.req_id = 0;
            session.state = PlayerState::Idle;
            vec![PlayerEffect::Emit(CallbackEvent::Response(Response::PlayFileStop {
                req_id,
            }))]
        }

        PlayerState::Playing => {
            let accepted = backend.issue(BackendCommand::AlterCallSetInputSoundcard { call_id, req_id });
            if !accepted {
                return vec![error_response(req_id, "failed setting input soundcard")];
            }
            session.req_id = req_id;
            session.state = PlayerState::CanceledInP;
            vec![]
        }

        PlayerState::WaitPlayResp | PlayerState::CanceledInP => {
            panic!("stop: unexpected player state {:?}", session.state)
        }
    }
}

/// The owning call was dropped or lost; unwind the player unconditionally
/// without emitting a response of its own (the call-level notification
/// already covers it).
pub fn on_loss(session: &mut PlayerSession) -> Vec<PlayerEffect> {
    let effects = match session.state {
        PlayerState::Idle => vec![],
        PlayerState::WaitPlayStart => vec![PlayerEffect::CancelTimer],
        _ => vec![],
    };
    session.req_id = 0;
    session.state = PlayerState::Idle;
    effects
}

/// The backend accepted (or rejected) the input-file command that started
/// playback.
pub fn on_play_file_response(session: &mut PlayerSession, req_id: u32) -> Vec<PlayerEffect> {
    assert_eq!(
        session.state,
        PlayerState::WaitPlayResp,
        "on_play_file_response: unexpected player state"
    );

    session.req_id = req_id;
    session.state = PlayerState::WaitPlayStart;
    vec![PlayerEffect::StartTimer { req_id }]
}

/// The backend rejected the input-file command outright.
pub fn on_error_response(session: &PlayerSession, _req_id: u32) -> Vec<PlayerEffect> {
    assert_eq!(
        session.state,
        PlayerState::WaitPlayResp,
        "on_error_response: unexpected player state"
    );
    vec![]
}

/// Playback audibly started (`CallVaaInputStatusEvent` with a nonzero
/// status).
pub fn on_play_start(session: &mut PlayerSession) -> Vec<PlayerEffect> {
    assert_eq!(
        session.state,
        PlayerState::WaitPlayStart,
        "on_play_start: unexpected player state"
    );

    let req_id = session.req_id;
    session.req_id = 0;
    session.state = PlayerState::Playing;
    vec![
        PlayerEffect::CancelTimer,
        PlayerEffect::Emit(CallbackEvent::Response(Response::PlayFile { req_id })),
    ]
}

/// Playback audibly stopped (`CallVaaInputStatusEvent` with a zero status).
pub fn on_play_stop(session: &mut PlayerSession) -> Vec<PlayerEffect> {
    match session.state {
        PlayerState::Playing => {
            session.req_id = 0;
            session.state = PlayerState::PlayingAlreadyStopped;
            vec![]
        }
        PlayerState::CanceledInP => {
            let req_id = session.req_id;
            session.req_id = 0;
            session.state = PlayerState::Idle;
            vec![PlayerEffect::Emit(CallbackEvent::Response(Response::PlayFileStop { req_id }))]
        }
        other => panic!("on_play_stop: unexpected player state {:?}", other),
    }
}

/// The play-start watchdog fired: the backend never reported playback had
/// audibly started.
pub fn on_play_failed(session: &mut PlayerSession, req_id: u32) -> Vec<PlayerEffect> {
    assert_eq!(
        session.state,
        PlayerState::WaitPlayStart,
        "on_play_failed: unexpected player state"
    );

    session.req_id = 0;
    session.state = PlayerState::Idle;
    vec![error_response(req_id, "play failed")]
}
